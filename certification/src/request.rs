//! Certification request service — builds the encrypted payload triple.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use agegate_crypto::{derive_keys, encrypt, sign};
use agegate_token::{AccessTokenProvider, TokenTransport};
use agegate_types::{CryptoToken, EncryptedPayload, Timestamp, VerificationRequest};
use agegate_utils::{fresh_nonce, request_timestamp};

use crate::error::CertificationError;
use crate::idp::{CryptoTokenRequest, IdpApi};
use crate::registry::CryptoTokenRegistry;

/// The request body encrypted into `enc_data`, field names per the
/// provider's contract.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlainRequestBody {
    #[serde(rename = "requestno")]
    pub request_no: String,
    #[serde(rename = "returnurl")]
    pub return_url: String,
    #[serde(rename = "sitecode")]
    pub site_code: String,
    #[serde(rename = "methodtype")]
    pub method_type: String,
    #[serde(rename = "popupyn")]
    pub popup_yn: String,
    #[serde(rename = "receivedata")]
    pub receive_data: String,
}

/// Asks the identity provider to mint a one-time verification token triple.
pub struct CertificationRequestService<T: TokenTransport, A: IdpApi> {
    tokens: AccessTokenProvider<T>,
    idp: A,
    registry: Arc<CryptoTokenRegistry>,
}

impl<T: TokenTransport, A: IdpApi> CertificationRequestService<T, A> {
    pub fn new(tokens: AccessTokenProvider<T>, idp: A, registry: Arc<CryptoTokenRegistry>) -> Self {
        Self {
            tokens,
            idp,
            registry,
        }
    }

    /// Produce the opaque single-use triple for one verification request.
    ///
    /// Provider rejections surface as [`CertificationError::Request`] —
    /// user-visible "verification unavailable", never a silent retry loop.
    pub async fn request_certification(
        &self,
        request: &VerificationRequest,
        now: Timestamp,
    ) -> Result<EncryptedPayload, CertificationError> {
        let bearer = self.tokens.bearer_header(now).await?;

        let timestamp = request_timestamp();
        let nonce = fresh_nonce();
        let grant = self
            .idp
            .issue_crypto_token(&bearer, &CryptoTokenRequest::new(&timestamp, &nonce))
            .await
            .map_err(|e| {
                warn!(kind = %request.kind, "crypto token request failed: {e}");
                e
            })?;

        let keys = derive_keys(&timestamp, &nonce, &grant.token_version_id);

        let body = PlainRequestBody {
            request_no: nonce.clone(),
            return_url: request.return_url.clone(),
            site_code: grant.site_code.clone(),
            method_type: "post".into(),
            popup_yn: "Y".into(),
            receive_data: request.kind.tag().into(),
        };
        let plain =
            serde_json::to_vec(&body).map_err(|e| CertificationError::Malformed(e.to_string()))?;

        let enc_data = encrypt(&plain, &keys);
        let integrity_value = sign(&enc_data, &keys);

        self.registry.register(CryptoToken {
            token_version_id: grant.token_version_id.clone(),
            request_timestamp: timestamp,
            request_nonce: nonce,
            site_code: grant.site_code,
        })?;

        debug!(
            kind = %request.kind,
            token_version_id = %grant.token_version_id,
            "certification request prepared"
        );

        Ok(EncryptedPayload {
            token_version_id: grant.token_version_id,
            enc_data,
            integrity_value,
        })
    }
}
