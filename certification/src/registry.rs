//! Single-use registry of server-held key material.

use std::collections::HashMap;
use std::sync::Mutex;

use agegate_types::CryptoToken;

use crate::error::CertificationError;

/// Holds the key-derivation inputs for in-flight verification requests,
/// keyed by token version id.
///
/// Entries are consumed by [`take`](Self::take): a second take for the same
/// id fails, which is what enforces the payload-never-reused invariant on
/// the result path.
#[derive(Default)]
pub struct CryptoTokenRegistry {
    inner: Mutex<HashMap<String, CryptoToken>>,
}

impl CryptoTokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the material for a freshly issued token version id.
    pub fn register(&self, token: CryptoToken) -> Result<(), CertificationError> {
        let mut inner = self.inner.lock().expect("token registry poisoned");
        if inner.contains_key(&token.token_version_id) {
            return Err(CertificationError::Request(format!(
                "token version id {} already in flight",
                token.token_version_id
            )));
        }
        inner.insert(token.token_version_id.clone(), token);
        Ok(())
    }

    /// Remove and return the material for `token_version_id`.
    pub fn take(&self, token_version_id: &str) -> Option<CryptoToken> {
        self.inner
            .lock()
            .expect("token registry poisoned")
            .remove(token_version_id)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("token registry poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
