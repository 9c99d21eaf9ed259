//! Session tuning knobs.

use crate::browser::PopupSpec;

/// Configuration for one verification session.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub popup: PopupSpec,
    /// Popup liveness poll interval in milliseconds.
    pub poll_interval_ms: u64,
    /// Maximum wait in `AwaitingOutcome` before the session is failed.
    pub deadline_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            popup: PopupSpec::default(),
            poll_interval_ms: 500,
            deadline_secs: 600,
        }
    }
}
