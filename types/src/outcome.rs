//! Verification outcome envelope posted back to the opener window.

use serde::{Deserialize, Serialize};

/// Result code meaning the identity provider verified the user.
pub const OUTCOME_SUCCESS: i32 = 0;

/// Identity data carried by a successful verification.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeData {
    /// Birthdate as reported by the provider, `YYYYMMDD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthdate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Account identifiers matched during an id-recovery flow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub found_ids: Option<Vec<String>>,
}

/// The final decision of one verification session.
///
/// Produced once per session and immutable after creation. `code == 0`
/// is the sole success discriminator; everything else is a provider or
/// business failure carrying the provider's message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub code: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<OutcomeData>,
}

impl VerificationOutcome {
    pub fn success(data: OutcomeData) -> Self {
        Self {
            code: OUTCOME_SUCCESS,
            message: None,
            data: Some(data),
        }
    }

    pub fn failure(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: Some(message.into()),
            data: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == OUTCOME_SUCCESS
    }
}
