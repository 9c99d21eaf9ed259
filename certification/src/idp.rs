//! Crypto-token endpoint of the identity provider.

use serde::{Deserialize, Serialize};

use crate::error::CertificationError;

/// Inputs sent when asking the provider to mint a crypto token.
#[derive(Clone, Debug, Serialize)]
pub struct CryptoTokenRequest {
    /// `YYYYMMDDHHMMSS`, also the first key-derivation input.
    #[serde(rename = "req_dtim")]
    pub request_timestamp: String,
    /// Fresh per-request nonce, the second key-derivation input.
    #[serde(rename = "req_no")]
    pub request_nonce: String,
    /// Symmetric encryption mode; the provider only supports "1" (AES-CBC).
    #[serde(rename = "enc_mode")]
    pub enc_mode: String,
}

impl CryptoTokenRequest {
    pub fn new(request_timestamp: impl Into<String>, request_nonce: impl Into<String>) -> Self {
        Self {
            request_timestamp: request_timestamp.into(),
            request_nonce: request_nonce.into(),
            enc_mode: "1".into(),
        }
    }
}

/// What the provider mints: a fresh correlation id plus our site code.
#[derive(Clone, Debug, Deserialize)]
pub struct CryptoTokenGrant {
    pub token_version_id: String,
    pub site_code: String,
}

/// The provider's crypto-token API, abstracted for testing.
pub trait IdpApi {
    fn issue_crypto_token(
        &self,
        bearer: &str,
        request: &CryptoTokenRequest,
    ) -> impl std::future::Future<Output = Result<CryptoTokenGrant, CertificationError>> + Send;
}

/// Real implementation over HTTPS.
pub struct HttpIdpApi {
    http: reqwest::Client,
    crypto_token_url: String,
}

impl HttpIdpApi {
    pub fn new(crypto_token_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            crypto_token_url: crypto_token_url.into(),
        }
    }
}

impl IdpApi for HttpIdpApi {
    async fn issue_crypto_token(
        &self,
        bearer: &str,
        request: &CryptoTokenRequest,
    ) -> Result<CryptoTokenGrant, CertificationError> {
        let response = self
            .http
            .post(&self.crypto_token_url)
            .header("Authorization", bearer)
            .json(request)
            .send()
            .await
            .map_err(|e| CertificationError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CertificationError::Request(format!(
                "crypto token endpoint returned {status}"
            )));
        }

        response
            .json::<CryptoTokenGrant>()
            .await
            .map_err(|e| CertificationError::Request(format!("malformed grant: {e}")))
    }
}
