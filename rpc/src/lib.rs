//! HTTP surface for the verification flow.
//!
//! Two endpoints drive the whole handshake: `/verification/request` mints
//! the encrypted payload triple for the popup form, `/verification/result`
//! validates what the identity provider sent back. Business rejections
//! (under-age, provider refusal codes) ride the outcome envelope with a
//! non-zero code; transport and crypto failures map to HTTP status codes.

pub mod config;
pub mod error;
pub mod handlers;
pub mod server;

pub use config::GatewayConfig;
pub use error::RpcError;
pub use handlers::AppState;
pub use server::{router, serve};
