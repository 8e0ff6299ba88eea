//! TripPlan - multi-day itinerary scheduling with travel-time annotation
//!
//! Candidate places are collected into named lists. Scheduling a candidate
//! onto a day clones it into an occurrence with its own identity; the legs
//! between consecutive occurrences are annotated asynchronously with travel
//! times from a directions provider and saved alongside the itinerary.
//!
//! # Modules
//!
//! - [`domain`] - Places, trips, occurrences and their identifiers
//! - [`itinerary`] - Per-day schedules and the [`ScheduleEditor`]
//! - [`routes`] - Leg cache and the asynchronous [`RouteAnnotator`]
//! - [`directions`] - Directions provider trait and Google client
//! - [`persistence`] - Saving and loading sessions in the document store
//! - [`session`] - Load/edit/save lifecycle of one trip
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod directions;
pub mod domain;
pub mod itinerary;
pub mod persistence;
pub mod routes;
pub mod session;

pub use config::Config;
pub use itinerary::{ContainerId, EditError, ItineraryStore, ScheduleEditor};
pub use routes::{LegDuration, RouteAnnotator, RouteCache};
pub use session::{PlanningSession, SessionError, SessionState};
