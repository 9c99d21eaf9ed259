//! Axum-based verification gateway server.

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use agegate_certification::{AccountDirectory, IdpApi};
use agegate_token::TokenTransport;

use crate::config::GatewayConfig;
use crate::error::RpcError;
use crate::handlers::{self, AppState};

/// Build the gateway router over the given state.
///
/// Browser-facing routes are CORS-restricted to the configured origins;
/// the return route is hit by a top-level provider redirect and needs no
/// CORS at all.
pub fn router<T, A, D>(state: Arc<AppState<T, A, D>>, allowed_origins: &[String]) -> Router
where
    T: TokenTransport + Send + Sync + 'static,
    A: IdpApi + Send + Sync + 'static,
    D: AccountDirectory + 'static,
{
    Router::new()
        .route("/health", get(handlers::health))
        .route("/verification/request", post(handlers::verification_request))
        .route("/verification/result", post(handlers::verification_result))
        .route(
            "/verification/return",
            get(handlers::verification_return_query).post(handlers::verification_return),
        )
        .layer(cors_layer(allowed_origins))
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring unparseable allowed origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}

/// Bind and serve until shutdown.
pub async fn serve<T, A, D>(
    config: &GatewayConfig,
    state: Arc<AppState<T, A, D>>,
) -> Result<(), RpcError>
where
    T: TokenTransport + Send + Sync + 'static,
    A: IdpApi + Send + Sync + 'static,
    D: AccountDirectory + 'static,
{
    let app = router(state, &config.allowed_origins);

    let addr = format!("0.0.0.0:{}", config.listen_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| RpcError::Server(e.to_string()))?;
    info!("verification gateway listening on {addr}");

    axum::serve(listener, app)
        .await
        .map_err(|e| RpcError::Server(e.to_string()))?;
    Ok(())
}
