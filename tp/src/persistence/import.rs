//! Seeding a trip and its candidate lists from a YAML fixture
//!
//! ```yaml
//! trip:
//!   id: kansai
//!   name: Kansai
//!   startDate: 2025-06-01
//!   endDate: 2025-06-03
//!   userId: u1
//! lists:
//!   - id: sights
//!     title: Sights
//!     places:
//!       - id: fushimi-inari
//!         title: Fushimi Inari
//!         latitude: 34.9671
//!         longitude: 135.7727
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use super::adapter::DocumentStore;
use super::error::PersistError;
use super::records::PlaceListRecord;
use crate::domain::{PlaceList, Trip};
use docstore::WriteBatch;

/// A trip with its candidate lists, as written by hand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripFixture {
    pub trip: Trip,
    #[serde(default)]
    pub lists: Vec<PlaceList>,
}

impl TripFixture {
    pub fn from_yaml(content: &str) -> Result<Self, PersistError> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "from_file: called");
        let content = std::fs::read_to_string(path).map_err(docstore::StoreError::from)?;
        Self::from_yaml(&content)
    }

    /// Stamp every list and place with the trip's owner and its position
    fn batch(&self) -> Result<WriteBatch, PersistError> {
        let user_id = &self.trip.user_id;
        let trip_id = &self.trip.id;

        let mut batch = WriteBatch::new();
        batch.set(&self.trip)?;
        for (list_position, list) in self.lists.iter().enumerate() {
            batch.set(&PlaceListRecord::from_list(list, list_position as u32, user_id, trip_id))?;
            for (position, place) in list.places.iter().enumerate() {
                let mut place = place.clone();
                place.user_id = user_id.clone();
                place.trip_id = trip_id.clone();
                place.position = position as u32;
                place.details.place_list_id = list.id.clone();
                batch.set(&place)?;
            }
        }
        Ok(batch)
    }
}

/// Write the trip, its lists and their places in one batch
pub fn import<S: DocumentStore + ?Sized>(store: &mut S, fixture: &TripFixture) -> Result<usize, PersistError> {
    debug!(trip = %fixture.trip.id, lists = fixture.lists.len(), "import: called");
    let written = store.commit(fixture.batch()?)?;
    info!(trip = %fixture.trip.id, written, "import: complete");
    Ok(written)
}
