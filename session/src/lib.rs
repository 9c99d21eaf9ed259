//! Client-side verification session.
//!
//! Drives the popup flow end to end: open a named popup, submit the hidden
//! form carrying the encrypted payload triple, then wait for exactly one of
//! three race arms — a trusted completion message, a popup-closed poll tick,
//! or the session deadline. Whichever arm wins, cleanup (listener removal,
//! poll stop, popup release) runs exactly once.
//!
//! Browser surfaces are traits so the machine runs the same against a real
//! window bridge or the deterministic doubles in `agegate-nullables`.

pub mod browser;
pub mod channel;
pub mod config;
pub mod driver;
pub mod error;
pub mod orchestrator;

pub use browser::{FormSink, IdpFormPost, PopupOpener, PopupSpec, PopupWindow};
pub use channel::{MessageChannel, Screened, WindowMessage};
pub use config::SessionConfig;
pub use driver::drive;
pub use error::SessionError;
pub use orchestrator::{PopupOrchestrator, SessionPhase, SessionResolution, VerificationSession};
