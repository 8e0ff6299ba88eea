//! Place and occurrence identifiers
//!
//! Candidate places keep the ID the document store gave them. A scheduled
//! occurrence is identified by its originating place ID plus a creation
//! stamp (Unix milliseconds), rendered as `{place_id}-{stamp}`.

use std::fmt;

/// Identifier of a candidate place
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlaceId(String);

impl PlaceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PlaceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PlaceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for PlaceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for PlaceId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for PlaceId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self(s))
    }
}

/// Identifier of one scheduled occurrence of a place
///
/// The originating place is a typed field, never recovered by inspecting the
/// rendered string, so place IDs may themselves contain `-`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OccurrenceId {
    origin: PlaceId,
    stamp: i64,
}

impl OccurrenceId {
    /// Largest stamp that still leaves room to mint a later one
    pub const MAX_STAMP: i64 = i64::MAX - 1;

    /// Only the itinerary store mints new occurrence IDs
    pub(crate) fn new(origin: PlaceId, stamp: i64) -> Self {
        Self { origin, stamp }
    }

    /// Rebuild an ID from its rendered form and the place it came from
    ///
    /// Returns `None` unless `raw` is exactly `{origin}-{digits}` with a
    /// stamp no larger than [`Self::MAX_STAMP`].
    pub fn parse(raw: &str, origin: &PlaceId) -> Option<Self> {
        let suffix = raw.strip_prefix(origin.as_str())?.strip_prefix('-')?;
        if suffix.is_empty() || !suffix.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let stamp: i64 = suffix.parse().ok()?;
        (stamp <= Self::MAX_STAMP).then(|| Self::new(origin.clone(), stamp))
    }

    /// Strip the `-{stamp}` suffix from a rendered ID
    pub fn strip_stamp(raw: &str) -> Option<&str> {
        let (prefix, suffix) = raw.rsplit_once('-')?;
        if prefix.is_empty() || suffix.is_empty() || !suffix.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        Some(prefix)
    }

    /// The candidate place this occurrence was cloned from
    pub fn origin(&self) -> &PlaceId {
        &self.origin
    }

    pub fn stamp(&self) -> i64 {
        self.stamp
    }
}

impl fmt::Display for OccurrenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.origin, self.stamp)
    }
}

impl serde::Serialize for OccurrenceId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}
