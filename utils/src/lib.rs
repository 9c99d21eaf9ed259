//! Shared utilities: tracing setup and request-identifier helpers.

pub mod logging;
pub mod request_id;

pub use logging::init_tracing;
pub use request_id::{fresh_nonce, request_timestamp};
