//! Popup orchestrator — the verification session state machine.
//!
//! `Idle → Requesting → PopupOpening → FormSubmitted → AwaitingOutcome`
//! and from there exactly one of `Verified`, `Failed`, `Cancelled`, each
//! followed by the idempotent cleanup into `Closed`.

use std::time::Duration;

use agegate_types::{EncryptedPayload, Timestamp};
use tokio::sync::mpsc;
use tracing::debug;

use crate::browser::{FormSink, IdpFormPost, PopupOpener, PopupWindow};
use crate::channel::{MessageChannel, Screened, WindowMessage};
use crate::config::SessionConfig;
use crate::error::SessionError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Requesting,
    PopupOpening,
    FormSubmitted,
    AwaitingOutcome,
    Verified,
    Failed,
    Cancelled,
    Closed,
}

impl SessionPhase {
    /// Terminal means no further event may mutate the session.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionPhase::Verified
                | SessionPhase::Failed
                | SessionPhase::Cancelled
                | SessionPhase::Closed
        )
    }
}

/// How the session ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionResolution {
    Verified(agegate_types::VerificationOutcome),
    Failed(SessionError),
    /// Popup closed by the user before any trusted message arrived.
    Cancelled,
}

/// One verification attempt, owned by the orchestrator.
///
/// All popup/listener/poll state lives here — never in module-level
/// variables — so concurrent sessions in different tabs cannot cross-talk.
pub struct VerificationSession {
    phase: SessionPhase,
    popup: Option<Box<dyn PopupWindow>>,
    listener_registered: bool,
    poll_active: bool,
    started_at: Timestamp,
    resolution: Option<SessionResolution>,
    cleanups_run: u32,
}

impl VerificationSession {
    pub fn new(now: Timestamp) -> Self {
        Self {
            phase: SessionPhase::Idle,
            popup: None,
            listener_registered: false,
            poll_active: false,
            started_at: now,
            resolution: None,
            cleanups_run: 0,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn resolution(&self) -> Option<&SessionResolution> {
        self.resolution.as_ref()
    }

    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    pub fn listener_registered(&self) -> bool {
        self.listener_registered
    }

    pub fn poll_active(&self) -> bool {
        self.poll_active
    }

    /// How many times cleanup actually ran. Must end up at exactly 1.
    pub fn cleanups_run(&self) -> u32 {
        self.cleanups_run
    }

    fn expect_phase(&self, expected: SessionPhase) -> Result<(), SessionError> {
        if self.phase != expected {
            return Err(SessionError::Phase(format!("{:?}", self.phase)));
        }
        Ok(())
    }

    /// `Idle → Requesting`, triggered by the user action.
    pub fn begin_request(&mut self) -> Result<(), SessionError> {
        self.expect_phase(SessionPhase::Idle)?;
        self.phase = SessionPhase::Requesting;
        Ok(())
    }

    /// Certification request failed — report immediately, no retry.
    pub fn fail_request(&mut self, reason: impl Into<String>) {
        if self.phase == SessionPhase::Requesting {
            self.resolve(SessionResolution::Failed(SessionError::Request(
                reason.into(),
            )));
        }
    }

    /// `Requesting → PopupOpening`; a blocked popup fails the session.
    pub fn open_popup(
        &mut self,
        opener: &dyn PopupOpener,
        name: &str,
        features: &str,
    ) -> Result<(), SessionError> {
        self.expect_phase(SessionPhase::Requesting)?;
        match opener.open(name, features) {
            Some(popup) => {
                self.popup = Some(popup);
                self.phase = SessionPhase::PopupOpening;
                Ok(())
            }
            None => {
                self.resolve(SessionResolution::Failed(SessionError::PopupBlocked));
                Err(SessionError::PopupBlocked)
            }
        }
    }

    /// `PopupOpening → FormSubmitted`: POST the triple into the popup.
    pub fn submit_form(
        &mut self,
        sink: &dyn FormSink,
        form: &IdpFormPost,
    ) -> Result<(), SessionError> {
        self.expect_phase(SessionPhase::PopupOpening)?;
        if sink.submit(form) {
            self.phase = SessionPhase::FormSubmitted;
            Ok(())
        } else {
            self.resolve(SessionResolution::Failed(SessionError::FormSubmit));
            Err(SessionError::FormSubmit)
        }
    }

    /// `FormSubmitted → AwaitingOutcome`: message listener and liveness
    /// poll both armed.
    pub fn await_outcome(&mut self) -> Result<(), SessionError> {
        self.expect_phase(SessionPhase::FormSubmitted)?;
        self.listener_registered = true;
        self.poll_active = true;
        self.phase = SessionPhase::AwaitingOutcome;
        Ok(())
    }

    /// Message-channel arm of the race.
    ///
    /// Untrusted origins and malformed data are dropped without any state
    /// change — the session keeps waiting. Returns the resolution if this
    /// event settled the session.
    pub fn on_message(
        &mut self,
        channel: &MessageChannel,
        message: &WindowMessage,
    ) -> Option<&SessionResolution> {
        if self.phase != SessionPhase::AwaitingOutcome {
            return None;
        }
        match channel.screen(message) {
            Screened::Trusted(outcome) => {
                if outcome.is_success() {
                    self.resolve(SessionResolution::Verified(outcome));
                } else {
                    self.resolve(SessionResolution::Failed(SessionError::Rejected {
                        code: outcome.code,
                        message: outcome.message.unwrap_or_default(),
                    }));
                }
                self.resolution.as_ref()
            }
            Screened::UntrustedOrigin | Screened::Malformed => None,
        }
    }

    /// Liveness-monitor arm: one poll of the popup handle.
    ///
    /// A tick that arrives after the session settled is a no-op — a stale
    /// timer must never override a just-arrived result.
    pub fn on_poll_tick(&mut self) -> Option<&SessionResolution> {
        if self.phase != SessionPhase::AwaitingOutcome {
            return None;
        }
        let closed = self.popup.as_ref().is_some_and(|p| p.is_closed());
        if closed {
            debug!("popup closed before a result arrived, cancelling session");
            self.resolve(SessionResolution::Cancelled);
            return self.resolution.as_ref();
        }
        None
    }

    /// Deadline arm: maximum wait in `AwaitingOutcome` exceeded.
    pub fn on_deadline(&mut self) -> Option<&SessionResolution> {
        if self.phase != SessionPhase::AwaitingOutcome {
            return None;
        }
        self.resolve(SessionResolution::Failed(SessionError::TimedOut));
        self.resolution.as_ref()
    }

    /// Settle the session. First caller wins; the shared phase guard in the
    /// event arms means this runs at most once.
    fn resolve(&mut self, resolution: SessionResolution) {
        debug_assert!(!self.phase.is_terminal(), "resolve on settled session");
        self.phase = match &resolution {
            SessionResolution::Verified(_) => SessionPhase::Verified,
            SessionResolution::Failed(_) => SessionPhase::Failed,
            SessionResolution::Cancelled => SessionPhase::Cancelled,
        };
        self.resolution = Some(resolution);
        self.finish();
    }

    /// Terminal state → `Closed`: unregister the listener, stop the poll,
    /// release (and close) the popup handle. Idempotent; runs the actual
    /// cleanup exactly once no matter which race arm fired or how often
    /// this is called.
    pub fn finish(&mut self) {
        if !self.phase.is_terminal() || self.phase == SessionPhase::Closed {
            return;
        }
        self.listener_registered = false;
        self.poll_active = false;
        if let Some(popup) = self.popup.take() {
            popup.close();
        }
        self.cleanups_run += 1;
        self.phase = SessionPhase::Closed;
        debug!("session closed");
    }
}

/// Opens and tracks the verification popup and drives the state machine up
/// to the awaiting race.
pub struct PopupOrchestrator {
    channel: MessageChannel,
    config: SessionConfig,
    /// The identity provider's certification form endpoint.
    form_url: String,
}

impl PopupOrchestrator {
    pub fn new(channel: MessageChannel, config: SessionConfig, form_url: impl Into<String>) -> Self {
        Self {
            channel,
            config,
            form_url: form_url.into(),
        }
    }

    pub fn channel(&self) -> &MessageChannel {
        &self.channel
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Run the flow from `Idle` through `AwaitingOutcome` for an
    /// already-fetched payload triple.
    ///
    /// On popup-block or form failure the returned session is already
    /// settled and cleaned up; the error is also returned for immediate
    /// reporting.
    pub fn launch(
        &self,
        payload: &EncryptedPayload,
        opener: &dyn PopupOpener,
        sink: &dyn FormSink,
        screen: (u32, u32),
        now: Timestamp,
    ) -> (VerificationSession, Result<(), SessionError>) {
        let mut session = VerificationSession::new(now);
        let result = self.launch_inner(&mut session, payload, opener, sink, screen);
        (session, result)
    }

    fn launch_inner(
        &self,
        session: &mut VerificationSession,
        payload: &EncryptedPayload,
        opener: &dyn PopupOpener,
        sink: &dyn FormSink,
        screen: (u32, u32),
    ) -> Result<(), SessionError> {
        session.begin_request()?;

        let spec = &self.config.popup;
        session.open_popup(opener, &spec.name, &spec.features(screen.0, screen.1))?;

        let form = IdpFormPost::certification(
            &self.form_url,
            &spec.name,
            &payload.token_version_id,
            &payload.enc_data,
            &payload.integrity_value,
        );
        session.submit_form(sink, &form)?;
        session.await_outcome()
    }

    /// Drive a launched session to resolution with this orchestrator's
    /// configured poll interval and deadline.
    pub async fn drive(
        &self,
        session: VerificationSession,
        messages: mpsc::Receiver<WindowMessage>,
    ) -> VerificationSession {
        crate::driver::drive(
            session,
            messages,
            &self.channel,
            Duration::from_millis(self.config.poll_interval_ms),
            Duration::from_secs(self.config.deadline_secs),
        )
        .await
    }

    /// Deliver a `message` event to a session through this orchestrator's
    /// channel.
    pub fn deliver_message<'s>(
        &self,
        session: &'s mut VerificationSession,
        message: &WindowMessage,
    ) -> Option<&'s SessionResolution> {
        session.on_message(&self.channel, message)
    }
}

