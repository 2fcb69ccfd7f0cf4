use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("provider unreachable: {0}")]
    Unreachable(String),

    #[error("request to provider failed: {0}")]
    RequestFailed(String),

    #[error("invalid response from provider: {0}")]
    InvalidResponse(String),

    #[error("provider rejected request ({code}): {message}")]
    Rejected { code: u32, message: String },

    #[error("no answer from caller within {0:?}")]
    Timeout(Duration),

    #[error("provider configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::Unreachable(format!("request timed out: {e}"))
        } else if e.is_connect() {
            ProviderError::Unreachable(format!("connection failed: {e}"))
        } else if e.is_decode() {
            ProviderError::InvalidResponse(e.to_string())
        } else {
            ProviderError::RequestFailed(e.to_string())
        }
    }
}
