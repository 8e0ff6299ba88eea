//! Persistence of trip sessions in the document store

mod adapter;
mod error;
mod import;
mod records;

pub use adapter::{DocumentStore, LoadedTrip, build_batch, build_records, load, record_id, save};
pub use error::PersistError;
pub use import::{TripFixture, import};
pub use records::{ITINERARIES, ItineraryRecord, PLACE_LISTS, PLACES, PersistedPlace, PlaceListRecord, TRIPS};
