//! Directions provider module
//!
//! The routing algorithm itself is an external service; this module only
//! defines the request/response contract and an HTTP client for it.

use std::sync::Arc;

use tracing::debug;

pub mod client;
mod error;
mod google;
mod types;

pub use client::DirectionsProvider;
pub use error::DirectionsError;
pub use google::GoogleDirectionsClient;
pub use types::{DirectionsRequest, DirectionsResponse, Route, RouteSegment};

use crate::config::DirectionsConfig;

/// Create a directions provider based on the provider named in config
///
/// Supports "google".
pub fn create_provider(config: &DirectionsConfig) -> Result<Arc<dyn DirectionsProvider>, DirectionsError> {
    debug!(provider = %config.provider, "create_provider: called");
    match config.provider.as_str() {
        "google" => Ok(Arc::new(GoogleDirectionsClient::from_config(config)?)),
        other => {
            debug!(provider = %other, "create_provider: unknown provider");
            Err(DirectionsError::InvalidResponse(format!(
                "Unknown directions provider: '{}'. Supported: google",
                other
            )))
        }
    }
}
