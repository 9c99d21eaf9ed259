use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("integrity check failed: HMAC tag does not match ciphertext")]
    Integrity,

    #[error("decryption failed: {0}")]
    Decrypt(String),

    #[error("malformed base64 input: {0}")]
    Encoding(String),
}
