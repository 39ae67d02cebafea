use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Missing URL")]
    MissingInput,

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("URL host '{0}' is not an allowed source domain")]
    InvalidDomain(String),

    #[error("page rendering failed: {0}")]
    RenderFailure(String),

    #[error("image download failed: {0}")]
    DownloadFailure(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ExtractError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ExtractError::MissingInput
            | ExtractError::InvalidUrl(_)
            | ExtractError::InvalidDomain(_) => StatusCode::BAD_REQUEST,
            ExtractError::RenderFailure(_)
            | ExtractError::DownloadFailure(_)
            | ExtractError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to hand back to an HTTP client. Upstream failure details
    /// stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            ExtractError::RenderFailure(_) => "Failed to extract images".to_string(),
            ExtractError::DownloadFailure(_) => "Failed to download image".to_string(),
            other => other.to_string(),
        }
    }
}
