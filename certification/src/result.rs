//! Certification result service — validates the provider's encrypted result.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use agegate_crypto::{derive_keys, open};
use agegate_types::{OutcomeData, VerificationKind, VerificationOutcome};

use crate::directory::AccountDirectory;
use crate::error::CertificationError;
use crate::gate::{AdultGate, GateDecision};
use crate::registry::CryptoTokenRegistry;

/// The result body inside the provider's `enc_data`, field names per its
/// contract.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResultBody {
    pub birthdate: String,
    #[serde(rename = "mobileno", default, skip_serializing_if = "Option::is_none")]
    pub mobile_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "requestno", default, skip_serializing_if = "Option::is_none")]
    pub request_no: Option<String>,
}

/// Decrypts and validates the provider's result, derives age, applies the
/// adult gate, and chains the id-recovery lookup when asked to.
pub struct CertificationResultService<D: AccountDirectory> {
    registry: Arc<CryptoTokenRegistry>,
    gate: AdultGate,
    directory: D,
}

impl<D: AccountDirectory> CertificationResultService<D> {
    pub fn new(registry: Arc<CryptoTokenRegistry>, gate: AdultGate, directory: D) -> Self {
        Self {
            registry,
            gate,
            directory,
        }
    }

    /// Validate one returned result.
    ///
    /// The key material registered for `token_version_id` is consumed here:
    /// replaying the same result fails with `UnknownToken`. Integrity is
    /// checked before any decryption or parsing.
    pub fn certification_result(
        &self,
        kind: VerificationKind,
        token_version_id: &str,
        enc_data: &str,
        integrity_value: &str,
        today: NaiveDate,
    ) -> Result<VerificationOutcome, CertificationError> {
        let token = self
            .registry
            .take(token_version_id)
            .ok_or_else(|| CertificationError::UnknownToken(token_version_id.to_string()))?;

        let keys = derive_keys(
            &token.request_timestamp,
            &token.request_nonce,
            &token.token_version_id,
        );
        let plain = open(enc_data, integrity_value, &keys)?;
        let body: ResultBody = serde_json::from_slice(&plain)
            .map_err(|e| CertificationError::Malformed(e.to_string()))?;

        let decision = self.gate.evaluate(&body.birthdate, today)?;
        let age = match decision {
            GateDecision::Adult { age } => age,
            GateDecision::Underage { age } => {
                return Err(CertificationError::Underage { age });
            }
        };

        let found_ids = match (kind, &body.mobile_number) {
            (VerificationKind::IdRecovery, Some(mobile)) => {
                let ids = self.directory.find_by_mobile(mobile)?;
                Some(ids)
            }
            _ => None,
        };

        debug!(%kind, token_version_id, age, "certification result accepted");

        Ok(VerificationOutcome::success(OutcomeData {
            birthdate: Some(body.birthdate),
            mobile_number: body.mobile_number,
            name: body.name,
            found_ids,
        }))
    }
}
