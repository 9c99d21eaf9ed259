//! The postMessage envelope relayed to the opener window.

use agegate_certification::CertificationError;
use agegate_types::{OutcomeData, Timestamp, VerificationOutcome};
use serde::{Deserialize, Serialize};

/// Non-zero envelope codes for the failure classes the opener can act on.
pub mod codes {
    /// Verified, adult. The only success code.
    pub const SUCCESS: i32 = 0;
    /// Verified identity but under the adult age threshold.
    pub const UNDERAGE: i32 = 4019;
    /// Result integrity tag did not match the ciphertext.
    pub const INTEGRITY: i32 = 4301;
    /// Result ciphertext could not be decrypted.
    pub const DECRYPT: i32 = 4302;
    /// Token version id unknown or already consumed.
    pub const UNKNOWN_TOKEN: i32 = 4303;
    /// Result body did not parse.
    pub const MALFORMED: i32 = 4304;
    /// Bearer token or provider transport failure.
    pub const UPSTREAM: i32 = 5002;
}

/// What gets posted to `window.opener`: `{code, message?, data?, timestamp}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeEnvelope {
    pub code: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<OutcomeData>,
    /// Unix seconds at which the relay composed the envelope.
    pub timestamp: String,
}

impl OutcomeEnvelope {
    pub fn success(data: OutcomeData, now: Timestamp) -> Self {
        Self {
            code: codes::SUCCESS,
            message: None,
            data: Some(data),
            timestamp: now.as_secs().to_string(),
        }
    }

    pub fn failure(code: i32, message: impl Into<String>, now: Timestamp) -> Self {
        Self {
            code,
            message: Some(message.into()),
            data: None,
            timestamp: now.as_secs().to_string(),
        }
    }

    /// Wrap a settled outcome, stamping the relay's clock.
    pub fn from_outcome(outcome: VerificationOutcome, now: Timestamp) -> Self {
        Self {
            code: outcome.code,
            message: outcome.message,
            data: outcome.data,
            timestamp: now.as_secs().to_string(),
        }
    }

    /// Map a result-service error to its envelope code.
    pub fn from_error(error: &CertificationError, now: Timestamp) -> Self {
        let code = match error {
            CertificationError::Underage { .. } => codes::UNDERAGE,
            CertificationError::Integrity => codes::INTEGRITY,
            CertificationError::Decrypt(_) => codes::DECRYPT,
            CertificationError::UnknownToken(_) => codes::UNKNOWN_TOKEN,
            CertificationError::Malformed(_) => codes::MALFORMED,
            CertificationError::Token(_)
            | CertificationError::Request(_)
            | CertificationError::Directory(_) => codes::UPSTREAM,
        };
        Self::failure(code, error.to_string(), now)
    }

    /// The envelope as the opener-side message channel will see it.
    pub fn to_outcome(&self) -> VerificationOutcome {
        VerificationOutcome {
            code: self.code,
            message: self.message.clone(),
            data: self.data.clone(),
        }
    }
}
