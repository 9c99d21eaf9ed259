//! Certification services for the identity-provider handshake.
//!
//! Request side: mint a crypto token at the identity provider, derive
//! symmetric material, encrypt and sign the verification request, and hand
//! the opaque triple to the browser.
//!
//! Result side: consume the registered key material exactly once, verify
//! and decrypt the provider's result, compute the user's age, and apply the
//! adult gate.

pub mod age;
pub mod directory;
pub mod error;
pub mod gate;
pub mod idp;
pub mod registry;
pub mod request;
pub mod result;

pub use directory::AccountDirectory;
pub use error::CertificationError;
pub use gate::{AdultGate, GateDecision, ADULT_AGE};
pub use idp::{CryptoTokenGrant, CryptoTokenRequest, HttpIdpApi, IdpApi};
pub use registry::CryptoTokenRegistry;
pub use request::CertificationRequestService;
pub use result::CertificationResultService;
