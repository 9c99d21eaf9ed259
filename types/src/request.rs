//! Verification request value types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which user flow triggered the verification.
///
/// The kind travels with the request to the identity provider as the
/// receive-data tag, and back through the return relay so the result
/// handler knows whether to chain an account-identifier lookup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationKind {
    /// Age verification during account signup.
    #[default]
    Signup,
    /// "Find my ID" — verified mobile number resolves to account identifiers.
    IdRecovery,
    /// Identity re-check before a password reset.
    PasswordReset,
}

impl VerificationKind {
    /// Tag embedded in the encrypted request's receive-data field.
    pub fn tag(&self) -> &'static str {
        match self {
            VerificationKind::Signup => "signup",
            VerificationKind::IdRecovery => "id_recovery",
            VerificationKind::PasswordReset => "password_reset",
        }
    }
}

impl fmt::Display for VerificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A single user-initiated verification attempt.
///
/// Immutable once created; discarded when the session ends.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRequest {
    pub kind: VerificationKind,
    /// Where the identity provider redirects the popup after completion.
    pub return_url: String,
}

impl VerificationRequest {
    pub fn new(kind: VerificationKind, return_url: impl Into<String>) -> Self {
        Self {
            kind,
            return_url: return_url.into(),
        }
    }
}
