//! The itinerary: trip days, their ordered occurrences, and the editor
//! operating on them

mod container;
mod editor;
mod store;

pub use container::ContainerId;
pub use editor::{CandidateStatus, EditError, ScheduleEditor};
pub use store::ItineraryStore;
