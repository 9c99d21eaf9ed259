use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token acquisition failed: {0}")]
    Acquisition(String),

    #[error("token endpoint transport error: {0}")]
    Transport(#[from] reqwest::Error),
}
