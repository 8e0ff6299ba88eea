//! ItineraryStore - ordered occurrences per trip day

use chrono::{NaiveDate, Utc};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

use crate::domain::{OccurrenceId, PlaceId, ScheduledOccurrence};
use crate::routes::LegKey;

/// Mapping from each trip day to its ordered schedule
///
/// The set of days is fixed at construction; an empty day is valid.
#[derive(Debug, Clone, Default)]
pub struct ItineraryStore {
    days: BTreeMap<NaiveDate, Vec<ScheduledOccurrence>>,
    last_stamp: i64,
}

impl ItineraryStore {
    pub fn new(days: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            days: days.into_iter().map(|date| (date, Vec::new())).collect(),
            last_stamp: 0,
        }
    }

    pub fn has_day(&self, date: NaiveDate) -> bool {
        self.days.contains_key(&date)
    }

    pub fn day(&self, date: NaiveDate) -> Option<&[ScheduledOccurrence]> {
        self.days.get(&date).map(Vec::as_slice)
    }

    pub fn day_len(&self, date: NaiveDate) -> usize {
        self.days.get(&date).map_or(0, Vec::len)
    }

    /// Trip days in calendar order
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.days.keys().copied()
    }

    pub fn days(&self) -> impl Iterator<Item = (NaiveDate, &[ScheduledOccurrence])> {
        self.days.iter().map(|(date, day)| (*date, day.as_slice()))
    }

    pub fn total_occurrences(&self) -> usize {
        self.days.values().map(Vec::len).sum()
    }

    pub fn position(&self, date: NaiveDate, id: &OccurrenceId) -> Option<usize> {
        self.days.get(&date)?.iter().position(|occ| occ.id() == id)
    }

    pub fn get(&self, date: NaiveDate, id: &OccurrenceId) -> Option<&ScheduledOccurrence> {
        self.days.get(&date)?.iter().find(|occ| occ.id() == id)
    }

    pub(crate) fn get_mut(&mut self, date: NaiveDate, id: &OccurrenceId) -> Option<&mut ScheduledOccurrence> {
        self.days.get_mut(&date)?.iter_mut().find(|occ| occ.id() == id)
    }

    /// Find which day holds an occurrence
    pub fn locate(&self, id: &OccurrenceId) -> Option<(NaiveDate, usize)> {
        self.days
            .iter()
            .find_map(|(date, day)| day.iter().position(|occ| occ.id() == id).map(|index| (*date, index)))
    }

    /// Whether any occurrence on any day was cloned from `origin`
    pub fn contains_origin(&self, origin: &PlaceId) -> bool {
        self.days.values().flatten().any(|occ| occ.origin_id() == origin)
    }

    /// Resolve a rendered occurrence ID against the occurrences of one day
    pub fn resolve_id(&self, date: NaiveDate, raw: &str) -> Option<OccurrenceId> {
        self.days
            .get(&date)?
            .iter()
            .map(ScheduledOccurrence::id)
            .find(|id| id.to_string() == raw)
            .cloned()
    }

    /// Previous and next occurrence IDs around `id`
    pub fn neighbours(&self, date: NaiveDate, id: &OccurrenceId) -> (Option<OccurrenceId>, Option<OccurrenceId>) {
        let Some(day) = self.days.get(&date) else {
            return (None, None);
        };
        let Some(index) = day.iter().position(|occ| occ.id() == id) else {
            return (None, None);
        };
        let prev = index.checked_sub(1).map(|i| day[i].id().clone());
        let next = day.get(index + 1).map(|occ| occ.id().clone());
        (prev, next)
    }

    /// Whether `key.from` is immediately followed by `key.to` on `date`
    pub fn is_adjacent(&self, date: NaiveDate, key: &LegKey) -> bool {
        self.days
            .get(&date)
            .is_some_and(|day| day.windows(2).any(|pair| pair[0].id() == &key.from && pair[1].id() == &key.to))
    }

    /// Keys of every leg in the current order of `date`
    pub fn adjacent_keys(&self, date: NaiveDate) -> HashSet<LegKey> {
        self.days
            .get(&date)
            .map(|day| {
                day.windows(2)
                    .map(|pair| LegKey::new(pair[0].id().clone(), pair[1].id().clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Mint a fresh occurrence ID for a clone of `origin`
    ///
    /// Stamps are Unix milliseconds, bumped past the last stamp handed out or
    /// loaded so two clones in the same millisecond never collide.
    pub(crate) fn mint_occurrence_id(&mut self, origin: &PlaceId) -> OccurrenceId {
        let stamp = Utc::now().timestamp_millis().max(self.last_stamp.saturating_add(1));
        self.last_stamp = stamp;
        debug!(%origin, stamp, "mint_occurrence_id: called");
        OccurrenceId::new(origin.clone(), stamp)
    }

    /// Insert at `index`, clamped to the day length; returns the final position
    pub(crate) fn insert(&mut self, date: NaiveDate, index: usize, occurrence: ScheduledOccurrence) -> Option<usize> {
        let day = self.days.get_mut(&date)?;
        let position = index.min(day.len());
        day.insert(position, occurrence);
        Some(position)
    }

    pub(crate) fn remove(&mut self, date: NaiveDate, index: usize) -> Option<ScheduledOccurrence> {
        let day = self.days.get_mut(&date)?;
        (index < day.len()).then(|| day.remove(index))
    }

    /// Append a persisted occurrence during load
    ///
    /// Returns false, leaving the store unchanged, if the day is unknown, the
    /// stamp leaves no room to mint after it, or the ID is already present.
    pub(crate) fn restore(&mut self, date: NaiveDate, occurrence: ScheduledOccurrence) -> bool {
        let stamp = occurrence.id().stamp();
        if !self.has_day(date) || stamp > OccurrenceId::MAX_STAMP || self.locate(occurrence.id()).is_some() {
            return false;
        }
        self.last_stamp = self.last_stamp.max(stamp);
        if let Some(day) = self.days.get_mut(&date) {
            day.push(occurrence);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CandidatePlace, PlaceDetails};

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn store() -> ItineraryStore {
        ItineraryStore::new([date("2025-06-01"), date("2025-06-02")])
    }

    fn clone_into(store: &mut ItineraryStore, day: NaiveDate, origin: &str, index: usize) -> OccurrenceId {
        let candidate = CandidatePlace::new(origin, PlaceDetails::new(origin, 35.0, 135.0));
        let id = store.mint_occurrence_id(&candidate.id);
        store
            .insert(day, index, ScheduledOccurrence::from_candidate(id.clone(), &candidate))
            .unwrap();
        id
    }

    fn titles(store: &ItineraryStore, day: NaiveDate) -> Vec<String> {
        store.day(day).unwrap().iter().map(|o| o.title().to_string()).collect()
    }

    #[test]
    fn test_new_has_empty_days() {
        let store = store();
        assert_eq!(store.dates().count(), 2);
        assert_eq!(store.day(date("2025-06-01")).unwrap().len(), 0);
        assert!(!store.has_day(date("2025-06-03")));
        assert_eq!(store.total_occurrences(), 0);
    }

    #[test]
    fn test_minted_ids_are_unique_even_within_one_millisecond() {
        let mut store = store();
        let origin = PlaceId::from("p1");
        let ids: Vec<OccurrenceId> = (0..50).map(|_| store.mint_occurrence_id(&origin)).collect();
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
        assert!(ids.windows(2).all(|w| w[0].stamp() < w[1].stamp()));
    }

    #[test]
    fn test_insert_clamps_index() {
        let mut store = store();
        let day = date("2025-06-01");
        clone_into(&mut store, day, "a", 0);
        clone_into(&mut store, day, "b", 99);
        clone_into(&mut store, day, "c", 1);
        assert_eq!(titles(&store, day), vec!["a", "c", "b"]);
        let first = store.day(day).unwrap()[0].clone();
        assert!(store.insert(date("2025-07-01"), 0, first).is_none());
    }

    #[test]
    fn test_neighbours_and_adjacency() {
        let mut store = store();
        let day = date("2025-06-01");
        let a = clone_into(&mut store, day, "a", 0);
        let b = clone_into(&mut store, day, "b", 1);
        let c = clone_into(&mut store, day, "c", 2);

        assert_eq!(store.neighbours(day, &b), (Some(a.clone()), Some(c.clone())));
        assert_eq!(store.neighbours(day, &a), (None, Some(b.clone())));
        assert!(store.is_adjacent(day, &LegKey::new(a.clone(), b.clone())));
        assert!(!store.is_adjacent(day, &LegKey::new(b.clone(), a.clone())));
        assert!(!store.is_adjacent(day, &LegKey::new(a.clone(), c.clone())));

        let keys = store.adjacent_keys(day);
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&LegKey::new(b, c)));
    }

    #[test]
    fn test_contains_origin_and_locate() {
        let mut store = store();
        let a = clone_into(&mut store, date("2025-06-02"), "a", 0);
        assert!(store.contains_origin(&PlaceId::from("a")));
        assert!(!store.contains_origin(&PlaceId::from("b")));
        assert_eq!(store.locate(&a), Some((date("2025-06-02"), 0)));

        store.remove(date("2025-06-02"), 0).unwrap();
        assert!(!store.contains_origin(&PlaceId::from("a")));
        assert!(store.remove(date("2025-06-02"), 0).is_none());
    }

    #[test]
    fn test_resolve_id() {
        let mut store = store();
        let day = date("2025-06-01");
        let a = clone_into(&mut store, day, "kyoto-station", 0);
        assert_eq!(store.resolve_id(day, &a.to_string()), Some(a.clone()));
        assert_eq!(store.resolve_id(date("2025-06-02"), &a.to_string()), None);
        assert_eq!(store.resolve_id(day, "kyoto-station"), None);
    }

    #[test]
    fn test_restore_rejects_duplicates_and_bumps_stamp() {
        let mut store = store();
        let day = date("2025-06-01");
        let candidate = CandidatePlace::new("a", PlaceDetails::new("a", 35.0, 135.0));
        let far_future = i64::MAX / 2;
        let occ = ScheduledOccurrence::from_candidate(OccurrenceId::new(PlaceId::from("a"), far_future), &candidate);

        assert!(store.restore(day, occ.clone()));
        assert!(!store.restore(date("2025-06-02"), occ.clone()));
        assert!(!store.restore(date("2025-07-01"), occ));

        let next = store.mint_occurrence_id(&PlaceId::from("a"));
        assert_eq!(next.stamp(), far_future + 1);
    }

    #[test]
    fn test_mint_after_largest_loaded_stamp() {
        let mut store = store();
        let day = date("2025-06-01");
        let candidate = CandidatePlace::new("a", PlaceDetails::new("a", 35.0, 135.0));
        let at = |stamp| ScheduledOccurrence::from_candidate(OccurrenceId::new(PlaceId::from("a"), stamp), &candidate);

        assert!(!store.restore(day, at(i64::MAX)));
        assert!(store.restore(day, at(OccurrenceId::MAX_STAMP)));

        let next = store.mint_occurrence_id(&PlaceId::from("b"));
        assert_eq!(next.stamp(), i64::MAX);
        assert_eq!(store.day_len(day), 1);
    }
}
