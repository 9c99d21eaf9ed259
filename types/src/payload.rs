//! The opaque payload triple exchanged with the identity provider.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The single-use triple handed to the browser for the popup form POST.
///
/// Server-generated; lifetime is one popup flow. A fresh `token_version_id`
/// is minted per verification request — the triple is never reused.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedPayload {
    /// Correlation identifier minted by the identity provider.
    pub token_version_id: String,
    /// Base64 AES ciphertext of the request body.
    pub enc_data: String,
    /// Base64 HMAC tag over `enc_data`.
    pub integrity_value: String,
}

// Ciphertext stays out of logs; Debug shows only the correlation id.
impl fmt::Debug for EncryptedPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptedPayload")
            .field("token_version_id", &self.token_version_id)
            .field("enc_data", &"<redacted>")
            .field("integrity_value", &"<redacted>")
            .finish()
    }
}

/// Server-held key-material source for one verification request.
///
/// Registered when the request is encrypted, consumed (removed) exactly once
/// when the result comes back. The key derivation inputs live here so the
/// result path can re-derive the same key/iv/hmac material.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CryptoToken {
    pub token_version_id: String,
    /// `YYYYMMDDHHMMSS` timestamp sent with the crypto-token request.
    pub request_timestamp: String,
    /// Per-request nonce sent with the crypto-token request.
    pub request_nonce: String,
    /// Site/product code assigned by the identity provider.
    pub site_code: String,
}
