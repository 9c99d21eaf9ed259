//! Fundamental types for the agegate verification flow.
//!
//! This crate defines the value types shared across every other crate in the
//! workspace: verification requests, the encrypted payload triple exchanged
//! with the identity provider, outcome envelopes, origins, and timestamps.

pub mod origin;
pub mod outcome;
pub mod payload;
pub mod request;
pub mod time;

pub use origin::Origin;
pub use outcome::{OutcomeData, VerificationOutcome, OUTCOME_SUCCESS};
pub use payload::{CryptoToken, EncryptedPayload};
pub use request::{VerificationKind, VerificationRequest};
pub use time::Timestamp;
