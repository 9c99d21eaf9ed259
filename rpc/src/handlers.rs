//! HTTP request handlers for the verification gateway.

use std::sync::Arc;

use axum::extract::{Form, Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use agegate_certification::directory::NoDirectory;
use agegate_certification::{
    AccountDirectory, AdultGate, CertificationRequestService, CertificationResultService,
    CryptoTokenRegistry, HttpIdpApi, IdpApi,
};
use agegate_relay::{OutcomeEnvelope, ReturnParams};
use agegate_token::{
    AccessTokenProvider, HttpTokenTransport, IdpCredentials, TokenTransport,
};
use agegate_types::{Origin, Timestamp, VerificationKind, VerificationRequest};

use crate::config::GatewayConfig;
use crate::error::{certification_status, RpcError};

/// Shared handler state, generic over the identity-provider transports and
/// the account directory so tests can run entirely in memory.
pub struct AppState<T: TokenTransport, A: IdpApi, D: AccountDirectory> {
    pub requests: CertificationRequestService<T, A>,
    pub results: CertificationResultService<D>,
    /// Popup form target at the identity provider.
    pub form_url: String,
    /// Default return URL when the caller does not supply one.
    pub return_url: String,
    /// Exact origin the return page is allowed to postMessage to.
    pub opener_origin: Origin,
}

impl<T: TokenTransport, A: IdpApi, D: AccountDirectory> std::fmt::Debug for AppState<T, A, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("form_url", &self.form_url)
            .field("return_url", &self.return_url)
            .field("opener_origin", &self.opener_origin)
            .finish_non_exhaustive()
    }
}

impl AppState<HttpTokenTransport, HttpIdpApi, NoDirectory> {
    /// Wire up the production state from configuration.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, RpcError> {
        let opener_origin = config
            .allowed_origins
            .first()
            .map(|o| Origin::new(o.clone()))
            .ok_or_else(|| RpcError::Config("allowed_origins must not be empty".into()))?;

        let registry = Arc::new(CryptoTokenRegistry::new());
        let credentials = IdpCredentials {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
        };
        let tokens = AccessTokenProvider::new(
            HttpTokenTransport::new(config.idp_token_url.clone(), credentials),
            config.client_id.clone(),
            config.token_refresh_margin_secs,
        );
        let requests = CertificationRequestService::new(
            tokens,
            HttpIdpApi::new(config.idp_crypto_token_url.clone()),
            Arc::clone(&registry),
        );
        let results =
            CertificationResultService::new(registry, AdultGate::default(), NoDirectory);

        Ok(Self {
            requests,
            results,
            form_url: config.idp_form_url.clone(),
            return_url: config.return_url.clone(),
            opener_origin,
        })
    }
}

// ── Request ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CertificationApiRequest {
    #[serde(default)]
    pub kind: VerificationKind,
    /// Overrides the configured return URL (tests, staging flows).
    #[serde(default)]
    pub return_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CertificationApiResponse {
    pub token_version_id: String,
    pub enc_data: String,
    pub integrity_value: String,
    /// Where the browser should POST the triple.
    pub form_url: String,
}

/// `POST /verification/request` — mint the encrypted payload triple the
/// browser submits into the popup form.
pub async fn verification_request<T, A, D>(
    State(state): State<Arc<AppState<T, A, D>>>,
    Json(body): Json<CertificationApiRequest>,
) -> Result<Json<CertificationApiResponse>, RpcError>
where
    T: TokenTransport + Send + Sync,
    A: IdpApi + Send + Sync,
    D: AccountDirectory,
{
    let return_url = body
        .return_url
        .unwrap_or_else(|| state.return_url.clone());
    let request = VerificationRequest::new(body.kind, return_url);

    let payload = state
        .requests
        .request_certification(&request, Timestamp::now())
        .await?;

    info!(kind = %request.kind, token_version_id = %payload.token_version_id,
        "verification request issued");

    Ok(Json(CertificationApiResponse {
        token_version_id: payload.token_version_id,
        enc_data: payload.enc_data,
        integrity_value: payload.integrity_value,
        form_url: state.form_url.clone(),
    }))
}

// ── Result ───────────────────────────────────────────────────────────────

/// `POST /verification/result` — validate a returned result and report the
/// verdict as an outcome envelope.
///
/// Business rejections (under-age) still answer 200 with a non-zero code;
/// tampered or replayed results are 400; provider trouble is 502.
pub async fn verification_result<T, A, D>(
    State(state): State<Arc<AppState<T, A, D>>>,
    Json(params): Json<ReturnParams>,
) -> (StatusCode, Json<OutcomeEnvelope>)
where
    T: TokenTransport + Send + Sync,
    A: IdpApi + Send + Sync,
    D: AccountDirectory,
{
    let now = Timestamp::now();
    let today = chrono::Local::now().date_naive();
    match state.results.certification_result(
        params.kind,
        &params.token_version_id,
        &params.enc_data,
        &params.integrity_value,
        today,
    ) {
        Ok(outcome) => (
            StatusCode::OK,
            Json(OutcomeEnvelope::from_outcome(outcome, now)),
        ),
        Err(e) => (
            certification_status(&e),
            Json(OutcomeEnvelope::from_error(&e, now)),
        ),
    }
}

// ── Return relay page ────────────────────────────────────────────────────

/// `POST /verification/return` — the page the identity provider redirects
/// the popup to. Validates the result server-side and renders a page that
/// posts the envelope to the opener and closes itself.
///
/// Always 200: the popup must render something for the user regardless of
/// the verdict, and the opener learns the failure from the envelope code.
pub async fn verification_return<T, A, D>(
    State(state): State<Arc<AppState<T, A, D>>>,
    Form(params): Form<ReturnParams>,
) -> Html<String>
where
    T: TokenTransport + Send + Sync,
    A: IdpApi + Send + Sync,
    D: AccountDirectory,
{
    render_return(&state, params)
}

/// `GET /verification/return` — some provider configurations redirect with
/// query parameters instead of a form POST; same page either way.
pub async fn verification_return_query<T, A, D>(
    State(state): State<Arc<AppState<T, A, D>>>,
    Query(params): Query<ReturnParams>,
) -> Html<String>
where
    T: TokenTransport + Send + Sync,
    A: IdpApi + Send + Sync,
    D: AccountDirectory,
{
    render_return(&state, params)
}

fn render_return<T, A, D>(state: &AppState<T, A, D>, params: ReturnParams) -> Html<String>
where
    T: TokenTransport,
    A: IdpApi,
    D: AccountDirectory,
{
    let now = Timestamp::now();
    let today = chrono::Local::now().date_naive();
    let envelope = match state.results.certification_result(
        params.kind,
        &params.token_version_id,
        &params.enc_data,
        &params.integrity_value,
        today,
    ) {
        Ok(outcome) => OutcomeEnvelope::from_outcome(outcome, now),
        Err(e) => OutcomeEnvelope::from_error(&e, now),
    };

    Html(relay_page(&envelope, &state.opener_origin))
}

/// Render the self-closing relay page with the envelope inlined.
fn relay_page(envelope: &OutcomeEnvelope, opener_origin: &Origin) -> String {
    let payload = serde_json::to_string(envelope)
        .expect("outcome envelope always serializes")
        .replace('<', "\\u003c");
    let target = serde_json::to_string(opener_origin.as_str())
        .expect("origin string always serializes");

    format!(
        r#"<!doctype html>
<html>
<head><meta charset="utf-8"><title>Verification</title></head>
<body>
<script>
  var payload = {payload};
  var target = {target};
  if (window.opener) {{
    window.opener.postMessage(payload, target);
  }}
  window.close();
</script>
</body>
</html>
"#
    )
}

// ── Health ───────────────────────────────────────────────────────────────

/// `GET /health` — liveness probe.
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use agegate_crypto::{derive_keys, encrypt, sign};
    use agegate_nullables::{NullDirectory, NullIdpApi, NullTokenTransport};
    use agegate_relay::codes;

    type TestState = Arc<AppState<NullTokenTransport, NullIdpApi, NullDirectory>>;

    fn test_state(directory: NullDirectory) -> (TestState, Arc<CryptoTokenRegistry>) {
        let registry = Arc::new(CryptoTokenRegistry::new());
        let tokens = AccessTokenProvider::new(NullTokenTransport::new(3600), "client", 60);
        let requests = CertificationRequestService::new(
            tokens,
            NullIdpApi::new("S777"),
            Arc::clone(&registry),
        );
        let results = CertificationResultService::new(
            Arc::clone(&registry),
            AdultGate::default(),
            directory,
        );
        let state = Arc::new(AppState {
            requests,
            results,
            form_url: "https://idp.example.com/form".into(),
            return_url: "https://gateway.example.com/verification/return".into(),
            opener_origin: Origin::from("https://app.example.com"),
        });
        (state, registry)
    }

    /// Forge a provider result for a token already in the registry. The
    /// token is read out and re-registered so the result side can still
    /// consume it.
    fn forge_result(
        registry: &CryptoTokenRegistry,
        token_version_id: &str,
        body: serde_json::Value,
    ) -> (String, String) {
        let token = registry.take(token_version_id).expect("token registered");
        let keys = derive_keys(
            &token.request_timestamp,
            &token.request_nonce,
            &token.token_version_id,
        );
        registry.register(token).expect("re-register");
        let enc = encrypt(&serde_json::to_vec(&body).unwrap(), &keys);
        let tag = sign(&enc, &keys);
        (enc, tag)
    }

    async fn issue(state: &TestState) -> CertificationApiResponse {
        let Json(response) = verification_request(
            State(Arc::clone(state)),
            Json(CertificationApiRequest {
                kind: VerificationKind::Signup,
                return_url: None,
            }),
        )
        .await
        .expect("request succeeds");
        response
    }

    fn adult_body() -> serde_json::Value {
        serde_json::json!({
            "birthdate": "19900315",
            "mobileno": "01012345678",
            "name": "Hong Gildong",
        })
    }

    #[tokio::test]
    async fn request_returns_payload_and_form_url() {
        let (state, _registry) = test_state(NullDirectory::new());
        let response = issue(&state).await;

        assert_eq!(response.token_version_id, "tv-null-0000");
        assert_eq!(response.form_url, "https://idp.example.com/form");
        assert!(!response.enc_data.is_empty());
        assert!(!response.integrity_value.is_empty());
    }

    #[tokio::test]
    async fn request_then_result_round_trip() {
        let (state, registry) = test_state(NullDirectory::new());
        let issued = issue(&state).await;
        let (enc, tag) = forge_result(&registry, &issued.token_version_id, adult_body());

        let (status, Json(envelope)) = verification_result(
            State(Arc::clone(&state)),
            Json(ReturnParams {
                kind: VerificationKind::Signup,
                token_version_id: issued.token_version_id,
                enc_data: enc,
                integrity_value: tag,
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(envelope.code, codes::SUCCESS);
        assert_eq!(
            envelope.data.unwrap().birthdate.as_deref(),
            Some("19900315")
        );
    }

    #[tokio::test]
    async fn tampered_result_is_bad_request() {
        let (state, registry) = test_state(NullDirectory::new());
        let issued = issue(&state).await;
        let (enc, _tag) = forge_result(&registry, &issued.token_version_id, adult_body());

        let (status, Json(envelope)) = verification_result(
            State(Arc::clone(&state)),
            Json(ReturnParams {
                kind: VerificationKind::Signup,
                token_version_id: issued.token_version_id,
                enc_data: enc,
                integrity_value: "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=".into(),
            }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(envelope.code, codes::INTEGRITY);
    }

    #[tokio::test]
    async fn underage_result_rides_200_with_code() {
        let (state, registry) = test_state(NullDirectory::new());
        let issued = issue(&state).await;
        let body = serde_json::json!({ "birthdate": "20100101" });
        let (enc, tag) = forge_result(&registry, &issued.token_version_id, body);

        let (status, Json(envelope)) = verification_result(
            State(Arc::clone(&state)),
            Json(ReturnParams {
                kind: VerificationKind::Signup,
                token_version_id: issued.token_version_id,
                enc_data: enc,
                integrity_value: tag,
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(envelope.code, codes::UNDERAGE);
        assert!(envelope.data.is_none());
    }

    #[tokio::test]
    async fn unknown_token_is_bad_request() {
        let (state, _registry) = test_state(NullDirectory::new());

        let (status, Json(envelope)) = verification_result(
            State(state),
            Json(ReturnParams {
                kind: VerificationKind::Signup,
                token_version_id: "tv-never-issued".into(),
                enc_data: "AAAA".into(),
                integrity_value: "BBBB".into(),
            }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(envelope.code, codes::UNKNOWN_TOKEN);
    }

    #[tokio::test]
    async fn id_recovery_result_attaches_found_ids() {
        let directory = NullDirectory::new().with_account("01012345678", "alice");
        let (state, registry) = test_state(directory);
        let issued = issue(&state).await;
        let (enc, tag) = forge_result(&registry, &issued.token_version_id, adult_body());

        let (status, Json(envelope)) = verification_result(
            State(Arc::clone(&state)),
            Json(ReturnParams {
                kind: VerificationKind::IdRecovery,
                token_version_id: issued.token_version_id,
                enc_data: enc,
                integrity_value: tag,
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            envelope.data.unwrap().found_ids,
            Some(vec!["alice".to_string()])
        );
    }

    #[tokio::test]
    async fn return_page_embeds_envelope_and_target_origin() {
        let (state, registry) = test_state(NullDirectory::new());
        let issued = issue(&state).await;
        let (enc, tag) = forge_result(&registry, &issued.token_version_id, adult_body());

        let Html(page) = verification_return(
            State(Arc::clone(&state)),
            Form(ReturnParams {
                kind: VerificationKind::Signup,
                token_version_id: issued.token_version_id,
                enc_data: enc,
                integrity_value: tag,
            }),
        )
        .await;

        assert!(page.contains("\"code\":0"));
        assert!(page.contains("https://app.example.com"));
        assert!(page.contains("postMessage"));
        assert!(page.contains("window.close()"));
    }

    #[tokio::test]
    async fn return_page_never_fails_on_bad_input() {
        let (state, _registry) = test_state(NullDirectory::new());

        let Html(page) = verification_return(
            State(state),
            Form(ReturnParams {
                kind: VerificationKind::Signup,
                token_version_id: "tv-never-issued".into(),
                enc_data: "AAAA".into(),
                integrity_value: "BBBB".into(),
            }),
        )
        .await;

        assert!(page.contains(&codes::UNKNOWN_TOKEN.to_string()));
        assert!(page.contains("window.close()"));
    }

    #[tokio::test]
    async fn get_return_renders_the_same_page() {
        let (state, registry) = test_state(NullDirectory::new());
        let issued = issue(&state).await;
        let (enc, tag) = forge_result(&registry, &issued.token_version_id, adult_body());

        let Html(page) = verification_return_query(
            State(Arc::clone(&state)),
            Query(ReturnParams {
                kind: VerificationKind::Signup,
                token_version_id: issued.token_version_id,
                enc_data: enc,
                integrity_value: tag,
            }),
        )
        .await;

        assert!(page.contains("\"code\":0"));
    }

    #[tokio::test]
    async fn provider_rejection_maps_upstream() {
        let registry = Arc::new(CryptoTokenRegistry::new());
        let tokens = AccessTokenProvider::new(NullTokenTransport::new(3600), "client", 60);
        let requests = CertificationRequestService::new(
            tokens,
            NullIdpApi::rejecting(),
            Arc::clone(&registry),
        );
        let results = CertificationResultService::new(
            registry,
            AdultGate::default(),
            NullDirectory::new(),
        );
        let state = Arc::new(AppState {
            requests,
            results,
            form_url: "https://idp.example.com/form".into(),
            return_url: "https://gateway.example.com/verification/return".into(),
            opener_origin: Origin::from("https://app.example.com"),
        });

        let err = verification_request(
            State(state),
            Json(CertificationApiRequest {
                kind: VerificationKind::Signup,
                return_url: None,
            }),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            RpcError::Certification(agegate_certification::CertificationError::Request(_))
        ));
    }

    #[test]
    fn from_config_requires_an_allowed_origin() {
        let config = GatewayConfig::default();
        let err = AppState::from_config(&config).unwrap_err();
        assert!(matches!(err, RpcError::Config(_)));
    }
}
