use agegate_crypto::CryptoError;
use agegate_token::TokenError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CertificationError {
    #[error("token error: {0}")]
    Token(#[from] TokenError),

    #[error("certification request rejected by identity provider: {0}")]
    Request(String),

    #[error("unknown or already-used token version id: {0}")]
    UnknownToken(String),

    #[error("result integrity check failed")]
    Integrity,

    #[error("result decryption failed: {0}")]
    Decrypt(String),

    #[error("malformed result body: {0}")]
    Malformed(String),

    #[error("verification rejected: age {age} is under the adult threshold")]
    Underage { age: u32 },

    #[error("account directory lookup failed: {0}")]
    Directory(String),
}

impl From<CryptoError> for CertificationError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::Integrity => CertificationError::Integrity,
            CryptoError::Decrypt(msg) | CryptoError::Encoding(msg) => {
                CertificationError::Decrypt(msg)
            }
        }
    }
}
