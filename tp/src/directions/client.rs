//! DirectionsProvider trait definition

use async_trait::async_trait;

use super::{DirectionsError, DirectionsRequest, DirectionsResponse};

/// Stateless travel-time provider - each call is independent
///
/// An empty route list is a valid answer meaning "no route between these
/// points"; errors are reserved for failed requests.
#[async_trait]
pub trait DirectionsProvider: Send + Sync {
    /// Short provider name for logs
    fn name(&self) -> &str;

    /// Request routes from origin to destination
    async fn route(&self, request: DirectionsRequest) -> Result<DirectionsResponse, DirectionsError>;
}
