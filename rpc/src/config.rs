//! Gateway configuration with TOML file support.

use serde::{Deserialize, Serialize};

use crate::RpcError;

/// Configuration for the verification gateway.
///
/// Can be loaded from a TOML file via [`GatewayConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Identity provider OAuth token endpoint.
    #[serde(default = "default_idp_token_url")]
    pub idp_token_url: String,

    /// Identity provider crypto-token issuance endpoint.
    #[serde(default = "default_idp_crypto_token_url")]
    pub idp_crypto_token_url: String,

    /// Identity provider verification form endpoint (popup target).
    #[serde(default = "default_idp_form_url")]
    pub idp_form_url: String,

    /// OAuth client id issued by the identity provider.
    #[serde(default)]
    pub client_id: String,

    /// OAuth client secret issued by the identity provider.
    #[serde(default)]
    pub client_secret: String,

    /// URL the identity provider redirects the popup back to.
    #[serde(default = "default_return_url")]
    pub return_url: String,

    /// Origins allowed to receive relayed outcome messages.
    ///
    /// Compared by exact match after trailing-slash trimming; an empty list
    /// means the relay can never deliver.
    #[serde(default)]
    pub allowed_origins: Vec<String>,

    /// Port the HTTP server listens on.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Seconds before expiry at which a cached access token is refreshed.
    #[serde(default = "default_token_refresh_margin_secs")]
    pub token_refresh_margin_secs: u64,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_idp_token_url() -> String {
    "https://svc.niceapi.co.kr/digital/niceid/oauth/oauth/token".to_string()
}

fn default_idp_crypto_token_url() -> String {
    "https://svc.niceapi.co.kr/digital/niceid/api/v1.0/common/crypto/token".to_string()
}

fn default_idp_form_url() -> String {
    "https://nice.checkplus.co.kr/CheckPlusSafeModel/service.cb".to_string()
}

fn default_return_url() -> String {
    "http://localhost:7080/verification/return".to_string()
}

fn default_listen_port() -> u16 {
    7080
}

fn default_token_refresh_margin_secs() -> u64 {
    60
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl GatewayConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, RpcError> {
        let content = std::fs::read_to_string(path).map_err(|e| RpcError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, RpcError> {
        toml::from_str(s).map_err(|e| RpcError::Config(e.to_string()))
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            idp_token_url: default_idp_token_url(),
            idp_crypto_token_url: default_idp_crypto_token_url(),
            idp_form_url: default_idp_form_url(),
            client_id: String::new(),
            client_secret: String::new(),
            return_url: default_return_url(),
            allowed_origins: Vec::new(),
            listen_port: default_listen_port(),
            token_refresh_margin_secs: default_token_refresh_margin_secs(),
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = GatewayConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.listen_port, 7080);
        assert_eq!(config.token_refresh_margin_secs, 60);
        assert_eq!(config.log_format, "human");
        assert!(config.allowed_origins.is_empty());
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            listen_port = 9999
            client_id = "abc"
            allowed_origins = ["https://example.com"]
        "#;
        let config = GatewayConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.listen_port, 9999);
        assert_eq!(config.client_id, "abc");
        assert_eq!(config.allowed_origins, vec!["https://example.com"]);
        assert_eq!(config.log_level, "info"); // default
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = GatewayConfig::from_toml_file("/nonexistent/agegate.toml");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, RpcError::Config(_)));
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("agegate.toml");
        std::fs::write(&path, "listen_port = 7171\n").expect("write");
        let config =
            GatewayConfig::from_toml_file(path.to_str().expect("utf8 path")).expect("parse");
        assert_eq!(config.listen_port, 7171);
    }
}
