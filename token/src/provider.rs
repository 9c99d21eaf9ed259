//! TTL-cached access token provider.

use std::sync::Mutex;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use agegate_types::Timestamp;
use tracing::debug;

use crate::error::TokenError;
use crate::transport::TokenTransport;

#[derive(Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Timestamp,
}

/// Exchanges service credentials for a bearer token, caching the result.
///
/// One provider per credential set. A cached token is reused until its
/// remaining lifetime drops under `refresh_margin_secs`, at which point the
/// next caller fetches a fresh one.
pub struct AccessTokenProvider<T: TokenTransport> {
    transport: T,
    client_id: String,
    refresh_margin_secs: u64,
    cache: Mutex<Option<CachedToken>>,
}

impl<T: TokenTransport> AccessTokenProvider<T> {
    pub fn new(transport: T, client_id: impl Into<String>, refresh_margin_secs: u64) -> Self {
        Self {
            transport,
            client_id: client_id.into(),
            refresh_margin_secs,
            cache: Mutex::new(None),
        }
    }

    /// Get a bearer token valid at `now`, from cache or the token endpoint.
    pub async fn access_token(&self, now: Timestamp) -> Result<String, TokenError> {
        if let Some(cached) = self.cached_if_fresh(now) {
            return Ok(cached);
        }

        let response = self.transport.fetch_token().await?;
        let expires_at = Timestamp::new(now.as_secs().saturating_add(response.expires_in));
        debug!(expires_in = response.expires_in, "fetched fresh access token");

        let mut cache = self.cache.lock().expect("token cache poisoned");
        *cache = Some(CachedToken {
            access_token: response.access_token.clone(),
            expires_at,
        });
        Ok(response.access_token)
    }

    /// Composite bearer header the identity provider's API expects:
    /// `bearer base64(access_token:current_unix_secs:client_id)`.
    pub async fn bearer_header(&self, now: Timestamp) -> Result<String, TokenError> {
        let token = self.access_token(now).await?;
        let composite = format!("{}:{}:{}", token, now.as_secs(), self.client_id);
        Ok(format!("bearer {}", BASE64.encode(composite)))
    }

    fn cached_if_fresh(&self, now: Timestamp) -> Option<String> {
        let cache = self.cache.lock().expect("token cache poisoned");
        let cached = cache.as_ref()?;
        let remaining = cached.expires_at.as_secs().saturating_sub(now.as_secs());
        if remaining > self.refresh_margin_secs {
            Some(cached.access_token.clone())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TokenResponse;
    use agegate_nullables::NullClock;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Scripted transport: counts calls, hands out sequentially numbered tokens.
    struct ScriptedTransport {
        calls: AtomicU32,
        expires_in: u64,
        fail: bool,
    }

    impl ScriptedTransport {
        fn new(expires_in: u64) -> Self {
            Self {
                calls: AtomicU32::new(0),
                expires_in,
                fail: false,
            }
        }
    }

    impl TokenTransport for ScriptedTransport {
        async fn fetch_token(&self) -> Result<TokenResponse, TokenError> {
            if self.fail {
                return Err(TokenError::Acquisition("credentials rejected".into()));
            }
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(TokenResponse {
                access_token: format!("token-{n}"),
                expires_in: self.expires_in,
            })
        }
    }

    #[tokio::test]
    async fn token_is_cached_until_margin() {
        let clock = NullClock::new(1000);
        let provider = AccessTokenProvider::new(ScriptedTransport::new(3600), "client", 60);

        assert_eq!(provider.access_token(clock.now()).await.unwrap(), "token-0");
        // Well within lifetime: cache hit.
        clock.advance(1000);
        assert_eq!(provider.access_token(clock.now()).await.unwrap(), "token-0");
        assert_eq!(provider.transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn refresh_inside_margin() {
        let clock = NullClock::new(1000);
        let provider = AccessTokenProvider::new(ScriptedTransport::new(3600), "client", 60);

        assert_eq!(provider.access_token(clock.now()).await.unwrap(), "token-0");
        // 30s of lifetime left — inside the 60s margin, refetch.
        clock.advance(3600 - 30);
        assert_eq!(provider.access_token(clock.now()).await.unwrap(), "token-1");
        assert_eq!(provider.transport.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn acquisition_failure_propagates() {
        let mut transport = ScriptedTransport::new(3600);
        transport.fail = true;
        let provider = AccessTokenProvider::new(transport, "client", 60);

        let err = provider.access_token(Timestamp::new(0)).await.unwrap_err();
        assert!(matches!(err, TokenError::Acquisition(_)));
    }

    #[tokio::test]
    async fn bearer_header_is_composite_base64() {
        let provider = AccessTokenProvider::new(ScriptedTransport::new(3600), "client-9", 60);
        let header = provider.bearer_header(Timestamp::new(500)).await.unwrap();

        let encoded = header.strip_prefix("bearer ").unwrap();
        let decoded = String::from_utf8(BASE64.decode(encoded).unwrap()).unwrap();
        assert_eq!(decoded, "token-0:500:client-9");
    }
}
