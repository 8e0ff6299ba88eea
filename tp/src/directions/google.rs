//! Google Directions API client implementation
//!
//! Implements the DirectionsProvider trait for the Directions JSON web
//! service. Requests are not retried; a failed leg is recomputed the next
//! time an edit touches it.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{DirectionsError, DirectionsProvider, DirectionsRequest, DirectionsResponse, Route, RouteSegment};
use crate::config::DirectionsConfig;
use crate::domain::TransportMode;

/// Google Directions API client
pub struct GoogleDirectionsClient {
    api_key: String,
    base_url: String,
    http: Client,
    timeout: Duration,
}

impl GoogleDirectionsClient {
    /// Create a new client from configuration
    ///
    /// Reads the API key from the environment variable named in config.
    pub fn from_config(config: &DirectionsConfig) -> Result<Self, DirectionsError> {
        debug!(base_url = %config.base_url, "from_config: called");
        let api_key = config
            .get_api_key()
            .map_err(|e| DirectionsError::MissingApiKey(e.to_string()))?;

        let timeout = config.timeout();
        let http = Client::builder().timeout(timeout).build().map_err(DirectionsError::Network)?;

        Ok(Self {
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            timeout,
        })
    }

    /// Build the query parameters for a request
    fn build_query(&self, request: &DirectionsRequest) -> Vec<(&'static str, String)> {
        debug!(mode = %request.mode, "build_query: called");
        let mut query = vec![
            ("origin", request.origin.to_string()),
            ("destination", request.destination.to_string()),
            ("mode", request.mode.as_api_param().to_string()),
        ];
        if request.mode == TransportMode::Transit
            && let Some(departure) = request.departure_time
        {
            debug!(%departure, "build_query: adding transit departure time");
            query.push(("departure_time", departure.timestamp().max(0).to_string()));
        }
        query.push(("key", self.api_key.clone()));
        query
    }
}

/// Convert the API payload into the provider-neutral response
fn parse_response(api_response: GoogleResponse) -> Result<DirectionsResponse, DirectionsError> {
    debug!(status = %api_response.status, routes = api_response.routes.len(), "parse_response: called");
    match api_response.status.as_str() {
        "OK" => Ok(DirectionsResponse {
            routes: api_response
                .routes
                .into_iter()
                .map(|route| Route {
                    segments: route
                        .legs
                        .into_iter()
                        .map(|leg| RouteSegment {
                            duration_secs: leg.duration.map(|d| d.value).unwrap_or(0),
                        })
                        .collect(),
                })
                .collect(),
        }),
        "ZERO_RESULTS" | "NOT_FOUND" => Ok(DirectionsResponse::default()),
        status => Err(DirectionsError::ApiError {
            status: status.to_string(),
            message: api_response.error_message.unwrap_or_default(),
        }),
    }
}

#[async_trait]
impl DirectionsProvider for GoogleDirectionsClient {
    fn name(&self) -> &str {
        "google"
    }

    async fn route(&self, request: DirectionsRequest) -> Result<DirectionsResponse, DirectionsError> {
        debug!(origin = %request.origin, destination = %request.destination, "route: called");
        let url = format!("{}/maps/api/directions/json", self.base_url);
        let query = self.build_query(&request);

        let response = self.http.get(url).query(&query).send().await.map_err(|e| {
            if e.is_timeout() {
                DirectionsError::Timeout(self.timeout)
            } else {
                DirectionsError::Network(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            debug!(%status, "route: HTTP error");
            let text = response.text().await.unwrap_or_default();
            return Err(DirectionsError::ApiError {
                status: status.as_u16().to_string(),
                message: text,
            });
        }

        let api_response: GoogleResponse = response.json().await?;
        parse_response(api_response)
    }
}

// Google API response types

#[derive(Debug, Deserialize)]
struct GoogleResponse {
    status: String,
    #[serde(default)]
    routes: Vec<GoogleRoute>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleRoute {
    #[serde(default)]
    legs: Vec<GoogleLeg>,
}

#[derive(Debug, Deserialize)]
struct GoogleLeg {
    duration: Option<GoogleValue>,
}

#[derive(Debug, Deserialize)]
struct GoogleValue {
    value: u64,
}
