//! Relay service: result validation, opener post, self-close.

use chrono::NaiveDate;
use tracing::{debug, warn};

use agegate_certification::{AccountDirectory, CertificationResultService};
use agegate_types::{Origin, Timestamp};

use crate::envelope::OutcomeEnvelope;
use crate::params::ReturnParams;

/// The relay's view of `window.opener`, abstracted for testing.
///
/// Returns false when the message could not be delivered (opener detached
/// or already navigated away).
pub trait OpenerWindow {
    fn post_message(&self, payload_json: &str, target_origin: &Origin) -> bool;
}

/// What the relay page should do after handling the return.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelayDecision {
    pub envelope: OutcomeEnvelope,
    /// Whether the envelope reached the opener.
    pub delivered: bool,
    /// The relay always closes its own window afterwards.
    pub close_window: bool,
}

/// Handles the provider's return redirect inside the popup.
pub struct ReturnRelay<D: AccountDirectory> {
    results: CertificationResultService<D>,
    /// Exact origin of the opener page; the only postMessage target.
    opener_origin: Origin,
}

impl<D: AccountDirectory> ReturnRelay<D> {
    pub fn new(results: CertificationResultService<D>, opener_origin: Origin) -> Self {
        Self {
            results,
            opener_origin,
        }
    }

    /// Validate the returned result and relay the verdict to the opener.
    ///
    /// Every certification failure still produces an envelope — the opener
    /// needs the non-zero code to settle its session as `Failed` rather
    /// than waiting for the liveness monitor.
    pub fn handle_return(
        &self,
        params: &ReturnParams,
        opener: &dyn OpenerWindow,
        today: NaiveDate,
        now: Timestamp,
    ) -> RelayDecision {
        let envelope = match self.results.certification_result(
            params.kind,
            &params.token_version_id,
            &params.enc_data,
            &params.integrity_value,
            today,
        ) {
            Ok(outcome) => OutcomeEnvelope::from_outcome(outcome, now),
            Err(e) => {
                warn!(token_version_id = %params.token_version_id, "certification result failed: {e}");
                OutcomeEnvelope::from_error(&e, now)
            }
        };

        let payload = serde_json::to_string(&envelope)
            .expect("outcome envelope always serializes");
        let delivered = opener.post_message(&payload, &self.opener_origin);
        if !delivered {
            // No opener to tell: the opener side detects this as
            // abandonment when the popup closes.
            debug!("opener unavailable, dropping relay message");
        }

        RelayDecision {
            envelope,
            delivered,
            close_window: true,
        }
    }
}

