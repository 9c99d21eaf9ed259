//! Gateway error types and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use agegate_certification::CertificationError;
use agegate_relay::OutcomeEnvelope;
use agegate_types::Timestamp;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Certification(#[from] CertificationError),

    #[error("server error: {0}")]
    Server(String),
}

/// HTTP status for a certification failure.
///
/// Client-supplied garbage (bad token id, tampered tag, undecryptable or
/// unparseable result) is a 400; provider and directory trouble is a 502.
/// `Underage` is a business verdict, not a protocol failure, and never
/// reaches this mapping as an error response.
pub(crate) fn certification_status(error: &CertificationError) -> StatusCode {
    match error {
        CertificationError::Underage { .. } => StatusCode::OK,
        CertificationError::UnknownToken(_)
        | CertificationError::Integrity
        | CertificationError::Decrypt(_)
        | CertificationError::Malformed(_) => StatusCode::BAD_REQUEST,
        CertificationError::Token(_)
        | CertificationError::Request(_)
        | CertificationError::Directory(_) => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let now = Timestamp::now();
        let (status, envelope) = match &self {
            RpcError::Certification(e) => {
                (certification_status(e), OutcomeEnvelope::from_error(e, now))
            }
            RpcError::Config(msg) | RpcError::Server(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                OutcomeEnvelope::failure(
                    agegate_relay::codes::UPSTREAM,
                    msg.clone(),
                    now,
                ),
            ),
        };
        (status, Json(envelope)).into_response()
    }
}
