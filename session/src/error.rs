use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("popup blocked by the browser")]
    PopupBlocked,

    #[error("verification request failed: {0}")]
    Request(String),

    #[error("form submission into the popup failed")]
    FormSubmit,

    #[error("verification timed out waiting for an outcome")]
    TimedOut,

    #[error("verification rejected by provider (code {code}): {message}")]
    Rejected { code: i32, message: String },

    #[error("session is in phase {0}, operation not allowed")]
    Phase(String),
}
