//! Return relay — the page loaded inside the popup after the identity
//! provider redirects back.
//!
//! The relay forwards the provider's encrypted result to the certification
//! result service, wraps the verdict in the postMessage envelope, posts it
//! to the opener at the opener's exact origin (never `"*"`), and instructs
//! the popup to close itself. A detached opener fails silently — the
//! opener-side liveness monitor is the fallback that reports abandonment.

pub mod envelope;
pub mod params;
pub mod service;

pub use envelope::{codes, OutcomeEnvelope};
pub use params::ReturnParams;
pub use service::{OpenerWindow, RelayDecision, ReturnRelay};
