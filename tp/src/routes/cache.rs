//! Per-day cache of leg travel times
//!
//! Entries are keyed by the ordered pair of occurrence IDs, so a leg cached
//! for A→B is never returned for A→C even if B is later removed.

use chrono::NaiveDate;
use std::collections::HashMap;
use std::fmt;

use crate::domain::{OccurrenceId, TransportMode};
use crate::itinerary::ItineraryStore;

/// Wire value standing for "computed, no usable route"
pub const UNAVAILABLE_WIRE: i64 = -1;

/// Result of a finished leg computation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegDuration {
    /// Travel time in whole minutes, always at least 1
    Minutes(u32),
    /// The provider returned no route, a zero duration, or failed
    Unavailable,
}

impl LegDuration {
    /// Convert a provider duration; zero seconds means no usable route
    pub fn from_secs(secs: u64) -> Self {
        if secs == 0 {
            return Self::Unavailable;
        }
        let minutes = secs.saturating_add(30) / 60;
        Self::Minutes(minutes.clamp(1, u32::MAX as u64) as u32)
    }

    pub fn to_wire(self) -> i64 {
        match self {
            Self::Minutes(m) => m as i64,
            Self::Unavailable => UNAVAILABLE_WIRE,
        }
    }

    /// Decode a persisted value; anything non-positive is the sentinel
    pub fn from_wire(value: i64) -> Self {
        if value <= 0 {
            Self::Unavailable
        } else {
            Self::Minutes(value.min(u32::MAX as i64) as u32)
        }
    }
}

impl fmt::Display for LegDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Minutes(m) => write!(f, "{} min", m),
            Self::Unavailable => write!(f, "no route"),
        }
    }
}

/// Ordered pair of adjacent occurrences
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LegKey {
    pub from: OccurrenceId,
    pub to: OccurrenceId,
}

impl LegKey {
    pub fn new(from: OccurrenceId, to: OccurrenceId) -> Self {
        Self { from, to }
    }
}

impl fmt::Display for LegKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.from, self.to)
    }
}

/// Cached state of one leg
///
/// `duration == None` means a computation has been issued and has not
/// finished yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteLeg {
    pub mode: TransportMode,
    pub duration: Option<LegDuration>,
}

impl RouteLeg {
    pub fn computing(mode: TransportMode) -> Self {
        Self { mode, duration: None }
    }

    pub fn is_computing(&self) -> bool {
        self.duration.is_none()
    }
}

/// Leg cache for every day of a session
#[derive(Debug, Clone, Default)]
pub struct RouteCache {
    days: HashMap<NaiveDate, HashMap<LegKey, RouteLeg>>,
}

impl RouteCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, date: NaiveDate, key: &LegKey) -> Option<&RouteLeg> {
        self.days.get(&date)?.get(key)
    }

    pub fn insert(&mut self, date: NaiveDate, key: LegKey, leg: RouteLeg) {
        self.days.entry(date).or_default().insert(key, leg);
    }

    /// Record a finished computation, keeping the entry's mode
    pub(crate) fn complete(&mut self, date: NaiveDate, key: &LegKey, duration: LegDuration) -> bool {
        match self.days.get_mut(&date).and_then(|legs| legs.get_mut(key)) {
            Some(leg) => {
                leg.duration = Some(duration);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.days.values().map(|legs| legs.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop entries whose pair is no longer adjacent in the itinerary
    pub fn prune(&mut self, itinerary: &ItineraryStore) -> usize {
        let before = self.len();
        for (date, legs) in self.days.iter_mut() {
            let adjacent = itinerary.adjacent_keys(*date);
            legs.retain(|key, _| adjacent.contains(key));
        }
        self.days.retain(|_, legs| !legs.is_empty());
        before - self.len()
    }
}
