//! Directions request and response types

use chrono::{DateTime, Utc};

use crate::domain::{LatLng, TransportMode};

/// A single directions query
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionsRequest {
    pub origin: LatLng,
    pub destination: LatLng,
    pub mode: TransportMode,
    /// Departure hint, only sent for transit
    pub departure_time: Option<DateTime<Utc>>,
}

/// One segment of a route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSegment {
    pub duration_secs: u64,
}

/// One candidate route, made of one or more segments
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Route {
    pub segments: Vec<RouteSegment>,
}

/// Ordered list of routes returned by the provider
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DirectionsResponse {
    pub routes: Vec<Route>,
}

impl DirectionsResponse {
    pub fn single(duration_secs: u64) -> Self {
        Self {
            routes: vec![Route {
                segments: vec![RouteSegment { duration_secs }],
            }],
        }
    }

    /// Duration of the first segment of the first route
    pub fn first_duration_secs(&self) -> Option<u64> {
        self.routes.first()?.segments.first().map(|s| s.duration_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_duration() {
        assert_eq!(DirectionsResponse::single(600).first_duration_secs(), Some(600));
        assert_eq!(DirectionsResponse::default().first_duration_secs(), None);

        let no_segments = DirectionsResponse {
            routes: vec![Route::default()],
        };
        assert_eq!(no_segments.first_duration_secs(), None);
    }

    #[test]
    fn test_only_first_route_counts() {
        let response = DirectionsResponse {
            routes: vec![
                Route {
                    segments: vec![RouteSegment { duration_secs: 900 }, RouteSegment { duration_secs: 60 }],
                },
                Route {
                    segments: vec![RouteSegment { duration_secs: 300 }],
                },
            ],
        };
        assert_eq!(response.first_duration_secs(), Some(900));
    }
}
