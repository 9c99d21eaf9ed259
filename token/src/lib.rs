//! Access token acquisition for the identity provider.
//!
//! The provider exchanges service credentials for a bearer token via the
//! client-credentials grant. Tokens are reusable until expiry, so the
//! provider caches the last token and refreshes it proactively once the
//! remaining lifetime drops under a configurable margin.
//!
//! The HTTP call sits behind the [`TokenTransport`] trait so tests can
//! script responses without a network (see `agegate-nullables`).

pub mod error;
pub mod provider;
pub mod transport;

pub use error::TokenError;
pub use provider::AccessTokenProvider;
pub use transport::{HttpTokenTransport, IdpCredentials, TokenResponse, TokenTransport};
