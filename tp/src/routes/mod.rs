//! Leg travel-time annotation
//!
//! The cache holds one entry per adjacent pair of occurrences per day; the
//! annotator fills it from the directions provider.

mod annotator;
mod cache;

pub use annotator::{RouteAnnotator, compute_leg, transit_departure};
pub use cache::{LegDuration, LegKey, RouteCache, RouteLeg, UNAVAILABLE_WIRE};
