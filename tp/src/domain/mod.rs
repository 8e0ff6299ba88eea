//! Domain types for tripplan
//!
//! Candidate places live in named lists owned by a trip. Scheduling a
//! candidate onto a day clones it into a [`ScheduledOccurrence`] with its own
//! [`OccurrenceId`], so one place can appear on several days (or several
//! times on one day) without identifier collisions.

mod id;
mod mode;
mod occurrence;
mod place;

pub mod hhmm;

pub use id::{OccurrenceId, PlaceId};
pub use mode::TransportMode;
pub use occurrence::{ScheduledOccurrence, TimeConflict, TimeField};
pub use place::{CandidatePlace, LatLng, PlaceCatalog, PlaceDetails, PlaceList, Trip};
