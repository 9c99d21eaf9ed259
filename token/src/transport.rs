//! Token endpoint transport trait and its HTTP implementation.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::Deserialize;

use crate::error::TokenError;

/// Service credentials issued by the identity provider.
#[derive(Clone)]
pub struct IdpCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl IdpCredentials {
    /// `Basic` authorization header value for the token endpoint.
    pub fn basic_auth(&self) -> String {
        let pair = format!("{}:{}", self.client_id, self.client_secret);
        format!("Basic {}", BASE64.encode(pair))
    }
}

// Credentials never reach logs.
impl std::fmt::Debug for IdpCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdpCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Successful token endpoint response.
#[derive(Clone, Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Remaining lifetime in seconds.
    pub expires_in: u64,
}

/// The one network call this crate makes, abstracted for testing.
pub trait TokenTransport {
    fn fetch_token(
        &self,
    ) -> impl std::future::Future<Output = Result<TokenResponse, TokenError>> + Send;
}

/// Real transport: client-credentials POST to the identity provider.
pub struct HttpTokenTransport {
    http: reqwest::Client,
    token_url: String,
    credentials: IdpCredentials,
}

impl HttpTokenTransport {
    pub fn new(token_url: impl Into<String>, credentials: IdpCredentials) -> Self {
        Self {
            http: reqwest::Client::new(),
            token_url: token_url.into(),
            credentials,
        }
    }
}

impl TokenTransport for HttpTokenTransport {
    async fn fetch_token(&self) -> Result<TokenResponse, TokenError> {
        let response = self
            .http
            .post(&self.token_url)
            .header("Authorization", self.credentials.basic_auth())
            .form(&[("grant_type", "client_credentials"), ("scope", "default")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TokenError::Acquisition(format!(
                "token endpoint returned {status}"
            )));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| TokenError::Acquisition(format!("malformed token response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_auth_encodes_credential_pair() {
        let creds = IdpCredentials {
            client_id: "client".into(),
            client_secret: "secret".into(),
        };
        assert_eq!(creds.basic_auth(), format!("Basic {}", BASE64.encode("client:secret")));
    }

    #[test]
    fn debug_redacts_secret() {
        let creds = IdpCredentials {
            client_id: "client".into(),
            client_secret: "secret".into(),
        };
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("client"));
        assert!(!rendered.contains("secret\""));
        assert!(rendered.contains("<redacted>"));
    }
}
