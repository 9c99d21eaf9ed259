//! Nullable identity-provider transports and account directory.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use agegate_certification::{
    AccountDirectory, CertificationError, CryptoTokenGrant, CryptoTokenRequest, IdpApi,
};
use agegate_token::{TokenError, TokenResponse, TokenTransport};

/// Token endpoint double: hands out sequentially numbered tokens, or fails
/// every call when scripted to.
pub struct NullTokenTransport {
    calls: AtomicU32,
    expires_in: u64,
    fail: bool,
}

impl NullTokenTransport {
    pub fn new(expires_in: u64) -> Self {
        Self {
            calls: AtomicU32::new(0),
            expires_in,
            fail: false,
        }
    }

    /// A transport whose every call fails with a credential error.
    pub fn failing() -> Self {
        Self {
            calls: AtomicU32::new(0),
            expires_in: 0,
            fail: true,
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TokenTransport for NullTokenTransport {
    async fn fetch_token(&self) -> Result<TokenResponse, TokenError> {
        if self.fail {
            return Err(TokenError::Acquisition("credentials rejected".into()));
        }
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(TokenResponse {
            access_token: format!("null-token-{n}"),
            expires_in: self.expires_in,
        })
    }
}

/// Crypto-token endpoint double: mints sequential grants and records every
/// request it saw.
pub struct NullIdpApi {
    site_code: String,
    counter: AtomicU32,
    reject: bool,
    requests: Mutex<Vec<CryptoTokenRequest>>,
}

impl NullIdpApi {
    pub fn new(site_code: impl Into<String>) -> Self {
        Self {
            site_code: site_code.into(),
            counter: AtomicU32::new(0),
            reject: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// An endpoint that rejects every request.
    pub fn rejecting() -> Self {
        Self {
            site_code: String::new(),
            counter: AtomicU32::new(0),
            reject: true,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every crypto-token request this double received.
    pub fn requests(&self) -> Vec<CryptoTokenRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl IdpApi for NullIdpApi {
    async fn issue_crypto_token(
        &self,
        _bearer: &str,
        request: &CryptoTokenRequest,
    ) -> Result<CryptoTokenGrant, CertificationError> {
        if self.reject {
            return Err(CertificationError::Request("provider rejected".into()));
        }
        self.requests.lock().unwrap().push(request.clone());
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(CryptoTokenGrant {
            token_version_id: format!("tv-null-{n:04}"),
            site_code: self.site_code.clone(),
        })
    }
}

/// In-memory account directory keyed by mobile number.
#[derive(Default)]
pub struct NullDirectory {
    accounts: HashMap<String, Vec<String>>,
}

impl NullDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(mut self, mobile: impl Into<String>, id: impl Into<String>) -> Self {
        self.accounts.entry(mobile.into()).or_default().push(id.into());
        self
    }
}

impl AccountDirectory for NullDirectory {
    fn find_by_mobile(&self, mobile_number: &str) -> Result<Vec<String>, CertificationError> {
        Ok(self.accounts.get(mobile_number).cloned().unwrap_or_default())
    }
}
