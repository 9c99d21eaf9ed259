//! Payload crypto engine for the identity-provider handshake.
//!
//! Both sides of the handshake derive the same symmetric material from the
//! request timestamp, nonce, and token-version id, so nothing random enters
//! the key path. Encryption is AES-128-CBC with a detached HMAC-SHA256
//! integrity tag; the tag is always checked before a ciphertext is trusted.
//!
//! Everything here is a pure function over supplied inputs — no I/O, no
//! logging of key material.

pub mod engine;
pub mod error;

pub use engine::{decrypt, derive_keys, encrypt, open, sign, verify, DerivedKeys};
pub use error::CryptoError;
