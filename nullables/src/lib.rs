//! Nullable infrastructure for deterministic testing.
//!
//! All external dependencies of the verification flow — clock, popup
//! windows, the opener bridge, the identity provider — are abstracted
//! behind traits in their owning crates. This crate provides test-friendly
//! implementations that:
//! - Return deterministic, scriptable values
//! - Record what was done to them for assertions
//! - Never touch the network or a real browser window
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod idp;
pub mod opener;
pub mod popup;

pub use clock::NullClock;
pub use idp::{NullDirectory, NullIdpApi, NullTokenTransport};
pub use opener::RecordingOpener;
pub use popup::{NullOpener, NullPopup, RecordingFormSink};
