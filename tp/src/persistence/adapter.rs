//! Saving and loading a trip's itinerary
//!
//! A save writes one record per non-empty day and deletes the records of
//! days that are now empty, all in a single atomic batch. A load rebuilds
//! the itinerary and its leg cache from those records.

use chrono::NaiveDate;
use docstore::{Filter, Store, StoreError, WriteBatch};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use super::error::PersistError;
use super::records::{ITINERARIES, ItineraryRecord, PLACE_LISTS, PLACES, PersistedPlace, PlaceListRecord, TRIPS};
use crate::domain::{CandidatePlace, OccurrenceId, PlaceCatalog, ScheduledOccurrence, TransportMode, Trip};
use crate::itinerary::ItineraryStore;
use crate::routes::{LegDuration, LegKey, RouteCache, RouteLeg};

/// The document-store operations the adapter needs
pub trait DocumentStore {
    fn list_raw(&self, collection: &str, filters: &[Filter]) -> Result<Vec<Value>, StoreError>;

    fn commit(&mut self, batch: WriteBatch) -> Result<usize, StoreError>;
}

impl DocumentStore for Store {
    fn list_raw(&self, collection: &str, filters: &[Filter]) -> Result<Vec<Value>, StoreError> {
        Store::list_raw(self, collection, filters)
    }

    fn commit(&mut self, batch: WriteBatch) -> Result<usize, StoreError> {
        Store::commit(self, batch)
    }
}

/// Everything a planning session needs, as read from the store
#[derive(Debug, Clone)]
pub struct LoadedTrip {
    pub trip: Trip,
    pub catalog: PlaceCatalog,
    pub itinerary: ItineraryStore,
    pub routes: RouteCache,
}

/// ID of the itinerary record for one day
pub fn record_id(user_id: &str, trip_id: &str, date: NaiveDate) -> String {
    format!("{}_{}_{}", user_id, trip_id, date)
}

/// Snapshot every non-empty day into a record
///
/// Each occurrence after the first carries the mode and duration of the leg
/// ending at it. A leg still computing keeps its mode with a null duration.
pub fn build_records(user_id: &str, trip_id: &str, itinerary: &ItineraryStore, routes: &RouteCache) -> Vec<ItineraryRecord> {
    itinerary
        .days()
        .filter(|(_, day)| !day.is_empty())
        .map(|(date, day)| {
            let places = day
                .iter()
                .enumerate()
                .map(|(index, occ)| {
                    let leg = index
                        .checked_sub(1)
                        .and_then(|prev| routes.get(date, &LegKey::new(day[prev].id().clone(), occ.id().clone())));
                    PersistedPlace {
                        id: occ.id().to_string(),
                        original_place_id: occ.origin_id().clone(),
                        details: occ.details().clone(),
                        arrived_time: occ.arrival(),
                        left_time: occ.departure(),
                        transport_duration: leg.and_then(|l| l.duration).map(LegDuration::to_wire),
                        transport_mode: leg.map(|l| l.mode),
                    }
                })
                .collect();
            ItineraryRecord {
                id: record_id(user_id, trip_id, date),
                date,
                user_id: user_id.to_string(),
                trip_id: trip_id.to_string(),
                places,
            }
        })
        .collect()
}

/// Build the save batch: set non-empty days, delete empty ones
pub fn build_batch(
    user_id: &str,
    trip_id: &str,
    itinerary: &ItineraryStore,
    routes: &RouteCache,
) -> Result<WriteBatch, PersistError> {
    let mut batch = WriteBatch::new();
    for record in build_records(user_id, trip_id, itinerary, routes) {
        batch.set(&record)?;
    }
    for (date, day) in itinerary.days() {
        if day.is_empty() {
            batch.delete::<ItineraryRecord>(&record_id(user_id, trip_id, date));
        }
    }
    Ok(batch)
}

/// Write the itinerary in one atomic batch
///
/// On failure nothing is written.
pub fn save<S: DocumentStore + ?Sized>(
    store: &mut S,
    user_id: &str,
    trip_id: &str,
    itinerary: &ItineraryStore,
    routes: &RouteCache,
) -> Result<usize, PersistError> {
    debug!(%user_id, %trip_id, "save: called");
    let batch = build_batch(user_id, trip_id, itinerary, routes)?;
    let ops = batch.len();
    let written = store.commit(batch)?;
    info!(%user_id, %trip_id, ops, "save: committed");
    Ok(written)
}

fn list_records<S, R>(store: &S, collection: &str, filters: &[Filter]) -> Result<Vec<R>, PersistError>
where
    S: DocumentStore + ?Sized,
    R: DeserializeOwned,
{
    let mut records = Vec::new();
    for value in store.list_raw(collection, filters)? {
        match serde_json::from_value(value) {
            Ok(record) => records.push(record),
            Err(e) => warn!(%collection, error = %e, "list_records: skipping malformed document"),
        }
    }
    Ok(records)
}

/// Load a trip, its catalog, its itinerary and the persisted leg cache
pub fn load<S: DocumentStore + ?Sized>(
    store: &S,
    user_id: &str,
    trip_id: &str,
    default_mode: TransportMode,
) -> Result<LoadedTrip, PersistError> {
    debug!(%user_id, %trip_id, "load: called");
    let owned = [Filter::eq("userId", user_id), Filter::eq("tripId", trip_id)];

    let trip: Trip = list_records::<_, Trip>(store, TRIPS, &[Filter::eq("id", trip_id), Filter::eq("userId", user_id)])?
        .into_iter()
        .next()
        .ok_or_else(|| PersistError::TripNotFound {
            user_id: user_id.to_string(),
            trip_id: trip_id.to_string(),
        })?;

    let catalog = load_catalog(store, &owned)?;

    let mut itinerary = ItineraryStore::new(trip.days());
    let mut routes = RouteCache::new();
    let mut records: Vec<ItineraryRecord> = list_records(store, ITINERARIES, &owned)?;
    records.sort_by_key(|record| record.date);
    for record in records {
        if !trip.contains(record.date) {
            warn!(date = %record.date, id = %record.id, "load: record outside trip range, ignoring");
            continue;
        }
        restore_day(&mut itinerary, &mut routes, record, default_mode);
    }

    info!(
        %trip_id,
        occurrences = itinerary.total_occurrences(),
        legs = routes.len(),
        candidates = catalog.candidate_count(),
        "load: complete"
    );
    Ok(LoadedTrip {
        trip,
        catalog,
        itinerary,
        routes,
    })
}

/// Rebuild the catalog in import order
///
/// The store returns documents by ID, so lists and places are sorted by
/// their stored positions.
fn load_catalog<S: DocumentStore + ?Sized>(store: &S, owned: &[Filter]) -> Result<PlaceCatalog, PersistError> {
    let mut records: Vec<PlaceListRecord> = list_records(store, PLACE_LISTS, owned)?;
    records.sort_by_key(|record| record.position);
    let mut lists: Vec<_> = records.into_iter().map(PlaceListRecord::into_list).collect();
    let positions: HashMap<String, usize> = lists.iter().enumerate().map(|(i, list)| (list.id.clone(), i)).collect();

    let places: Vec<CandidatePlace> = list_records(store, PLACES, owned)?;
    for place in places {
        match positions.get(place.list_id()) {
            Some(&index) => lists[index].places.push(place),
            None => warn!(place = %place.id, list = %place.list_id(), "load_catalog: place in unknown list, skipping"),
        }
    }
    for list in &mut lists {
        list.places.sort_by_key(|place| place.position);
    }
    Ok(PlaceCatalog::new(lists))
}

/// Restore one day's occurrences and the legs between them
///
/// A skipped place breaks the chain: the next place's persisted leg started
/// at the skipped one, so it is not attached to anything.
fn restore_day(itinerary: &mut ItineraryStore, routes: &mut RouteCache, record: ItineraryRecord, default_mode: TransportMode) {
    let date = record.date;
    let mut prev: Option<OccurrenceId> = None;

    for place in record.places {
        let Some(id) = OccurrenceId::parse(&place.id, &place.original_place_id) else {
            warn!(%date, id = %place.id, origin = %place.original_place_id, "restore_day: malformed occurrence id, skipping");
            prev = None;
            continue;
        };
        let occurrence = match ScheduledOccurrence::restore(id.clone(), place.details, place.arrived_time, place.left_time) {
            Ok(occurrence) => occurrence,
            Err(e) => {
                warn!(%date, %id, error = %e, "restore_day: inconsistent times, skipping");
                prev = None;
                continue;
            }
        };
        if !itinerary.restore(date, occurrence) {
            warn!(%date, %id, "restore_day: duplicate or out-of-range occurrence, skipping");
            prev = None;
            continue;
        }

        if let Some(prev) = prev.take() {
            let duration = place.transport_duration.map(LegDuration::from_wire);
            if duration.is_some() || place.transport_mode.is_some() {
                let leg = RouteLeg {
                    mode: place.transport_mode.unwrap_or(default_mode),
                    duration,
                };
                routes.insert(date, LegKey::new(prev, id.clone()), leg);
            }
        }
        prev = Some(id);
    }
}
