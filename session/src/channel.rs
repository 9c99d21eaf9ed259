//! Cross-window message channel — the trust boundary for completion events.

use agegate_types::{Origin, VerificationOutcome};
use tracing::debug;

/// A `message` event received on the opener window.
#[derive(Clone, Debug)]
pub struct WindowMessage {
    pub origin: Origin,
    /// Raw `event.data`, expected to be an outcome-envelope JSON string.
    pub data: String,
}

/// What the channel made of an incoming event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Screened {
    /// Trusted origin, well-formed outcome.
    Trusted(VerificationOutcome),
    /// Origin not in the allowlist — dropped with no state change.
    UntrustedOrigin,
    /// Trusted origin but data that does not parse; dropped as noise.
    Malformed,
}

/// Screens `message` events against the fixed origin allowlist.
///
/// The allowlist is the sole access-control boundary against forged
/// completion messages; matching is exact (`Origin` equality), never prefix
/// or substring.
#[derive(Clone, Debug)]
pub struct MessageChannel {
    allowed_origins: Vec<Origin>,
}

impl MessageChannel {
    pub fn new(allowed_origins: Vec<Origin>) -> Self {
        Self { allowed_origins }
    }

    pub fn screen(&self, message: &WindowMessage) -> Screened {
        if !self.allowed_origins.contains(&message.origin) {
            debug!(origin = %message.origin, "dropping message from untrusted origin");
            return Screened::UntrustedOrigin;
        }

        match serde_json::from_str::<VerificationOutcome>(&message.data) {
            Ok(outcome) => Screened::Trusted(outcome),
            Err(e) => {
                debug!(origin = %message.origin, "dropping malformed message: {e}");
                Screened::Malformed
            }
        }
    }
}
