//! Directions error types

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while requesting directions
#[derive(Debug, Error)]
pub enum DirectionsError {
    #[error("API error {status}: {message}")]
    ApiError { status: String, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Missing API key: {0}")]
    MissingApiKey(String),
}

impl DirectionsError {
    /// Check if this is a quota or rate limit rejection
    pub fn is_quota(&self) -> bool {
        matches!(self, DirectionsError::ApiError { status, .. } if status == "OVER_QUERY_LIMIT" || status == "429")
    }
}
