//! Scheduled occurrences of a place on a specific day

use chrono::NaiveTime;
use std::str::FromStr;
use thiserror::Error;

use super::hhmm;
use super::id::{OccurrenceId, PlaceId};
use super::place::{CandidatePlace, LatLng, PlaceDetails};

/// Which of an occurrence's two times is being edited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeField {
    Arrival,
    Departure,
}

impl std::fmt::Display for TimeField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Arrival => write!(f, "arrival"),
            Self::Departure => write!(f, "departure"),
        }
    }
}

impl FromStr for TimeField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "arrival" | "arrive" | "arrived" => Ok(Self::Arrival),
            "departure" | "depart" | "left" | "leave" => Ok(Self::Departure),
            other => Err(format!("Unknown time field '{}'. Expected arrival or departure", other)),
        }
    }
}

/// A time edit that would put departure at or before arrival
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field} {value} conflicts with {other_field} {other}: departure must be later than arrival")]
pub struct TimeConflict {
    pub field: TimeField,
    pub value: NaiveTime,
    pub other_field: TimeField,
    pub other: NaiveTime,
}

/// One placement of a candidate place onto a day
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledOccurrence {
    id: OccurrenceId,
    details: PlaceDetails,
    arrival: Option<NaiveTime>,
    departure: Option<NaiveTime>,
}

impl ScheduledOccurrence {
    /// Clone a candidate's descriptive fields into a fresh occurrence
    pub(crate) fn from_candidate(id: OccurrenceId, candidate: &CandidatePlace) -> Self {
        debug_assert_eq!(id.origin(), &candidate.id);
        Self {
            id,
            details: candidate.details.clone(),
            arrival: None,
            departure: None,
        }
    }

    /// Rebuild a persisted occurrence; times must already be consistent
    pub(crate) fn restore(
        id: OccurrenceId,
        details: PlaceDetails,
        arrival: Option<NaiveTime>,
        departure: Option<NaiveTime>,
    ) -> Result<Self, TimeConflict> {
        let arrival = arrival.map(hhmm::truncate);
        let departure = departure.map(hhmm::truncate);
        if let (Some(arrival), Some(departure)) = (arrival, departure)
            && departure <= arrival
        {
            return Err(TimeConflict {
                field: TimeField::Departure,
                value: departure,
                other_field: TimeField::Arrival,
                other: arrival,
            });
        }
        Ok(Self {
            id,
            details,
            arrival,
            departure,
        })
    }

    pub fn id(&self) -> &OccurrenceId {
        &self.id
    }

    /// The candidate place this occurrence was cloned from
    pub fn origin_id(&self) -> &PlaceId {
        self.id.origin()
    }

    pub fn details(&self) -> &PlaceDetails {
        &self.details
    }

    pub fn title(&self) -> &str {
        &self.details.title
    }

    pub fn location(&self) -> LatLng {
        self.details.location()
    }

    pub fn arrival(&self) -> Option<NaiveTime> {
        self.arrival
    }

    pub fn departure(&self) -> Option<NaiveTime> {
        self.departure
    }

    pub fn time(&self, field: TimeField) -> Option<NaiveTime> {
        match field {
            TimeField::Arrival => self.arrival,
            TimeField::Departure => self.departure,
        }
    }

    /// Check a proposed value against the other time field, at minute precision
    pub fn check_time(&self, field: TimeField, value: Option<NaiveTime>) -> Result<(), TimeConflict> {
        let Some(value) = value.map(hhmm::truncate) else {
            return Ok(());
        };
        match field {
            TimeField::Arrival => match self.departure {
                Some(departure) if value >= departure => Err(TimeConflict {
                    field,
                    value,
                    other_field: TimeField::Departure,
                    other: departure,
                }),
                _ => Ok(()),
            },
            TimeField::Departure => match self.arrival {
                Some(arrival) if value <= arrival => Err(TimeConflict {
                    field,
                    value,
                    other_field: TimeField::Arrival,
                    other: arrival,
                }),
                _ => Ok(()),
            },
        }
    }

    /// Set one time field, leaving both untouched if the result would be inconsistent
    ///
    /// Seconds are dropped first, so the checked value is the stored one.
    pub(crate) fn set_time(&mut self, field: TimeField, value: Option<NaiveTime>) -> Result<(), TimeConflict> {
        let value = value.map(hhmm::truncate);
        self.check_time(field, value)?;
        match field {
            TimeField::Arrival => self.arrival = value,
            TimeField::Departure => self.departure = value,
        }
        Ok(())
    }
}
