//! ScheduleEditor - the editing surface over one trip's itinerary
//!
//! Every operation either applies completely or returns an [`EditError`]
//! with the itinerary untouched. Successful operations mark the session
//! dirty and re-request the legs whose adjacency they changed.

use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::container::ContainerId;
use super::store::ItineraryStore;
use crate::domain::{
    CandidatePlace, OccurrenceId, PlaceCatalog, PlaceId, ScheduledOccurrence, TimeConflict, TimeField, TransportMode,
    Trip,
};
use crate::routes::{LegKey, RouteAnnotator, RouteCache, RouteLeg};

/// Rejected editor operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditError {
    #[error("Cannot move into list '{0}': candidate lists are read-only")]
    DestinationIsList(String),

    #[error("Unknown candidate list '{0}'")]
    UnknownList(String),

    #[error("Date {0} is outside the trip")]
    DateOutOfRange(NaiveDate),

    #[error("Index {index} is out of range for {container} (length {len})")]
    IndexOutOfRange {
        container: ContainerId,
        index: usize,
        len: usize,
    },

    #[error("No occurrence '{id}' on {date}")]
    UnknownOccurrence { date: NaiveDate, id: String },

    #[error("'{from}' is not immediately followed by '{to}' on {date}")]
    NotAdjacent { date: NaiveDate, from: String, to: String },

    #[error(transparent)]
    TimeOrder(#[from] TimeConflict),
}

/// A candidate together with whether it is already on the itinerary
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateStatus<'a> {
    pub candidate: &'a CandidatePlace,
    pub scheduled: bool,
}

/// Owns the itinerary and route cache for one session
pub struct ScheduleEditor {
    trip: Trip,
    catalog: PlaceCatalog,
    store: ItineraryStore,
    annotator: RouteAnnotator,
    default_mode: TransportMode,
    dirty: bool,
}

impl ScheduleEditor {
    pub fn new(
        trip: Trip,
        catalog: PlaceCatalog,
        store: ItineraryStore,
        annotator: RouteAnnotator,
        default_mode: TransportMode,
    ) -> Self {
        debug!(trip = %trip.id, days = store.dates().count(), "ScheduleEditor::new: called");
        Self {
            trip,
            catalog,
            store,
            annotator,
            default_mode,
            dirty: false,
        }
    }

    pub fn trip(&self) -> &Trip {
        &self.trip
    }

    pub fn catalog(&self) -> &PlaceCatalog {
        &self.catalog
    }

    pub fn itinerary(&self) -> &ItineraryStore {
        &self.store
    }

    pub fn routes(&self) -> &RouteCache {
        self.annotator.cache()
    }

    pub fn default_mode(&self) -> TransportMode {
        self.default_mode
    }

    pub fn day(&self, date: NaiveDate) -> Option<&[ScheduledOccurrence]> {
        self.store.day(date)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Move a candidate or an existing occurrence onto a day
    ///
    /// Candidates are cloned into a new occurrence and stay in their list.
    /// Occurrences are repositioned unchanged. `dest_index` is the final
    /// position in the destination day, clamped to its length. Returns the
    /// ID of the moved occurrence.
    pub fn move_item(
        &mut self,
        source: &ContainerId,
        source_index: usize,
        dest: &ContainerId,
        dest_index: usize,
    ) -> Result<OccurrenceId, EditError> {
        debug!(%source, source_index, %dest, dest_index, "move_item: called");
        let result = self.try_move(source, source_index, dest, dest_index);
        if let Err(e) = &result {
            warn!(error = %e, "move_item: rejected");
        }
        result
    }

    fn try_move(
        &mut self,
        source: &ContainerId,
        source_index: usize,
        dest: &ContainerId,
        dest_index: usize,
    ) -> Result<OccurrenceId, EditError> {
        let dest_date = match dest {
            ContainerId::List(list_id) => return Err(EditError::DestinationIsList(list_id.clone())),
            ContainerId::Day(date) => self.check_day(*date)?,
        };

        match source {
            ContainerId::List(list_id) => {
                let list = self
                    .catalog
                    .list(list_id)
                    .ok_or_else(|| EditError::UnknownList(list_id.clone()))?;
                let candidate = list.places.get(source_index).ok_or(EditError::IndexOutOfRange {
                    container: source.clone(),
                    index: source_index,
                    len: list.places.len(),
                })?;

                let id = self.store.mint_occurrence_id(&candidate.id);
                let occurrence = ScheduledOccurrence::from_candidate(id.clone(), candidate);
                let position = self.store.insert(dest_date, dest_index, occurrence);
                info!(%id, date = %dest_date, ?position, "move_item: scheduled candidate");

                self.recompute_touching(dest_date, &id);
                self.dirty = true;
                Ok(id)
            }
            ContainerId::Day(source_date) => {
                let source_date = self.check_day(*source_date)?;
                let len = self.store.day_len(source_date);
                let out_of_range = EditError::IndexOutOfRange {
                    container: source.clone(),
                    index: source_index,
                    len,
                };
                let id = self
                    .store
                    .day(source_date)
                    .and_then(|day| day.get(source_index))
                    .map(|occ| occ.id().clone())
                    .ok_or(out_of_range.clone())?;

                let gap = match self.store.neighbours(source_date, &id) {
                    (Some(prev), Some(next)) => Some(LegKey::new(prev, next)),
                    _ => None,
                };
                let occurrence = self.store.remove(source_date, source_index).ok_or(out_of_range)?;
                let position = self.store.insert(dest_date, dest_index, occurrence);
                info!(%id, from = %source_date, to = %dest_date, ?position, "move_item: repositioned occurrence");

                // No-op when the item landed back between the same pair
                if let Some(gap) = gap {
                    self.recompute(source_date, gap, None);
                }
                self.recompute_touching(dest_date, &id);
                self.dirty = true;
                Ok(id)
            }
        }
    }

    /// Remove an occurrence; the candidate it came from is unaffected
    pub fn remove_from_day(&mut self, date: NaiveDate, id: &OccurrenceId) -> Result<ScheduledOccurrence, EditError> {
        debug!(%date, %id, "remove_from_day: called");
        let index = self.find(date, id).inspect_err(|e| warn!(error = %e, "remove_from_day: rejected"))?;

        let gap = match self.store.neighbours(date, id) {
            (Some(prev), Some(next)) => Some(LegKey::new(prev, next)),
            _ => None,
        };
        let removed = self
            .store
            .remove(date, index)
            .ok_or_else(|| EditError::UnknownOccurrence {
                date,
                id: id.to_string(),
            })?;
        info!(%id, %date, "remove_from_day: removed");

        if let Some(gap) = gap {
            self.recompute(date, gap, None);
        }
        self.dirty = true;
        Ok(removed)
    }

    /// Set or clear an arrival or departure time
    ///
    /// Rejected without mutation if it would leave departure at or before
    /// arrival.
    pub fn set_time(
        &mut self,
        date: NaiveDate,
        id: &OccurrenceId,
        field: TimeField,
        value: Option<NaiveTime>,
    ) -> Result<(), EditError> {
        debug!(%date, %id, %field, ?value, "set_time: called");
        self.find(date, id).inspect_err(|e| warn!(error = %e, "set_time: rejected"))?;

        let occurrence = self.store.get_mut(date, id).ok_or_else(|| EditError::UnknownOccurrence {
            date,
            id: id.to_string(),
        })?;
        occurrence.set_time(field, value).map_err(|conflict| {
            warn!(error = %conflict, "set_time: rejected");
            EditError::from(conflict)
        })?;

        self.recompute_touching(date, id);
        self.dirty = true;
        Ok(())
    }

    /// Change the transport mode of the leg `from → to` and recompute it
    pub fn set_mode(
        &mut self,
        date: NaiveDate,
        from: &OccurrenceId,
        to: &OccurrenceId,
        mode: TransportMode,
    ) -> Result<(), EditError> {
        debug!(%date, %from, %to, %mode, "set_mode: called");
        self.check_day(date).inspect_err(|e| warn!(error = %e, "set_mode: rejected"))?;

        let key = LegKey::new(from.clone(), to.clone());
        if !self.store.is_adjacent(date, &key) {
            let e = EditError::NotAdjacent {
                date,
                from: from.to_string(),
                to: to.to_string(),
            };
            warn!(error = %e, "set_mode: rejected");
            return Err(e);
        }

        self.recompute(date, key, Some(mode));
        self.dirty = true;
        Ok(())
    }

    /// Whether any occurrence anywhere was cloned from this candidate
    pub fn is_scheduled(&self, place_id: &PlaceId) -> bool {
        self.store.contains_origin(place_id)
    }

    /// Candidates of one list with their scheduled flag
    pub fn candidates(&self, list_id: &str) -> Option<Vec<CandidateStatus<'_>>> {
        let list = self.catalog.list(list_id)?;
        Some(
            list.places
                .iter()
                .map(|candidate| CandidateStatus {
                    candidate,
                    scheduled: self.is_scheduled(&candidate.id),
                })
                .collect(),
        )
    }

    /// Cached leg `from → to`, if that pair is currently adjacent
    pub fn leg(&self, date: NaiveDate, from: &OccurrenceId, to: &OccurrenceId) -> Option<&RouteLeg> {
        let key = LegKey::new(from.clone(), to.clone());
        if !self.store.is_adjacent(date, &key) {
            return None;
        }
        self.annotator.cache().get(date, &key)
    }

    /// Every leg in the current order of a day, with its cached state if any
    pub fn legs_for_day(&self, date: NaiveDate) -> Vec<(LegKey, Option<RouteLeg>)> {
        let Some(day) = self.store.day(date) else {
            return Vec::new();
        };
        day.windows(2)
            .map(|pair| {
                let key = LegKey::new(pair[0].id().clone(), pair[1].id().clone());
                let leg = self.annotator.cache().get(date, &key).copied();
                (key, leg)
            })
            .collect()
    }

    /// Apply finished leg computations without waiting
    pub fn drain_routes(&mut self) -> usize {
        self.annotator.drain()
    }

    /// Wait for every outstanding leg computation
    pub async fn settle_routes(&mut self) -> usize {
        self.annotator.settle().await
    }

    pub fn routes_in_flight(&self) -> usize {
        self.annotator.in_flight()
    }

    /// Re-request legs that were still computing when the session was saved
    pub fn resume_pending_legs(&mut self) -> usize {
        let mut pending = Vec::new();
        for date in self.store.dates() {
            for key in self.store.adjacent_keys(date) {
                if self.annotator.cache().get(date, &key).is_some_and(RouteLeg::is_computing) {
                    pending.push((date, key));
                }
            }
        }
        let count = pending.len();
        for (date, key) in pending {
            self.recompute(date, key, None);
        }
        if count > 0 {
            info!(count, "resume_pending_legs: re-requested");
        }
        count
    }

    /// Drop cached legs whose pair is no longer adjacent
    pub(crate) fn prune_routes(&mut self) -> usize {
        let pruned = self.annotator.cache_mut().prune(&self.store);
        if pruned > 0 {
            debug!(pruned, "prune_routes: dropped stale legs");
        }
        pruned
    }

    fn check_day(&self, date: NaiveDate) -> Result<NaiveDate, EditError> {
        if self.store.has_day(date) {
            Ok(date)
        } else {
            Err(EditError::DateOutOfRange(date))
        }
    }

    fn find(&self, date: NaiveDate, id: &OccurrenceId) -> Result<usize, EditError> {
        self.check_day(date)?;
        self.store.position(date, id).ok_or_else(|| EditError::UnknownOccurrence {
            date,
            id: id.to_string(),
        })
    }

    /// Re-request the legs into and out of `id`
    fn recompute_touching(&mut self, date: NaiveDate, id: &OccurrenceId) {
        let (prev, next) = self.store.neighbours(date, id);
        if let Some(prev) = prev {
            self.recompute(date, LegKey::new(prev, id.clone()), None);
        }
        if let Some(next) = next {
            self.recompute(date, LegKey::new(id.clone(), next), None);
        }
    }

    /// Issue a computation for `key` if it is a current adjacency
    ///
    /// Without an explicit mode the leg keeps its cached mode, falling back
    /// to the configured default.
    fn recompute(&mut self, date: NaiveDate, key: LegKey, mode: Option<TransportMode>) {
        if !self.store.is_adjacent(date, &key) {
            debug!(%date, %key, "recompute: pair no longer adjacent, skipping");
            return;
        }
        let mode = mode
            .or_else(|| self.annotator.cache().get(date, &key).map(|leg| leg.mode))
            .unwrap_or(self.default_mode);
        let (Some(origin), Some(destination)) = (self.store.get(date, &key.from), self.store.get(date, &key.to)) else {
            return;
        };
        self.annotator.request(date, origin, destination, mode);
    }
}
