//! Document shapes written to the store
//!
//! Field names are camelCase and every optional field is written as an
//! explicit `null`.

use chrono::{NaiveDate, NaiveTime};
use docstore::{IndexValue, Record};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::{CandidatePlace, PlaceDetails, PlaceId, PlaceList, TransportMode, Trip};

pub const ITINERARIES: &str = "itineraries";
pub const TRIPS: &str = "trips";
pub const PLACE_LISTS: &str = "placeLists";
pub const PLACES: &str = "places";

/// One day of a saved itinerary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryRecord {
    pub id: String,
    pub date: NaiveDate,
    pub user_id: String,
    pub trip_id: String,
    #[serde(default)]
    pub places: Vec<PersistedPlace>,
}

impl Record for ItineraryRecord {
    fn id(&self) -> &str {
        &self.id
    }

    fn collection_name() -> &'static str {
        ITINERARIES
    }

    fn indexed_fields(&self) -> HashMap<String, IndexValue> {
        HashMap::from([
            ("userId".to_string(), IndexValue::from(self.user_id.as_str())),
            ("tripId".to_string(), IndexValue::from(self.trip_id.as_str())),
            ("date".to_string(), IndexValue::from(self.date.to_string())),
        ])
    }
}

/// A scheduled occurrence as stored, annotated with the leg ending at it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedPlace {
    pub id: String,
    pub original_place_id: PlaceId,
    #[serde(flatten)]
    pub details: PlaceDetails,
    #[serde(default, with = "crate::domain::hhmm")]
    pub arrived_time: Option<NaiveTime>,
    #[serde(default, with = "crate::domain::hhmm")]
    pub left_time: Option<NaiveTime>,
    /// Minutes, `-1` for "no route", `null` while computing or for the first stop
    #[serde(default)]
    pub transport_duration: Option<i64>,
    #[serde(default)]
    pub transport_mode: Option<TransportMode>,
}

impl Record for Trip {
    fn id(&self) -> &str {
        &self.id
    }

    fn collection_name() -> &'static str {
        TRIPS
    }

    fn indexed_fields(&self) -> HashMap<String, IndexValue> {
        HashMap::from([
            ("id".to_string(), IndexValue::from(self.id.as_str())),
            ("userId".to_string(), IndexValue::from(self.user_id.as_str())),
        ])
    }
}

/// A candidate list without its places; places are stored separately
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceListRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub notes: String,
    pub user_id: String,
    pub trip_id: String,
    /// Index of the list within the trip's catalog
    #[serde(default)]
    pub position: u32,
}

impl PlaceListRecord {
    pub fn from_list(list: &PlaceList, position: u32, user_id: &str, trip_id: &str) -> Self {
        Self {
            id: list.id.clone(),
            title: list.title.clone(),
            notes: list.notes.clone(),
            user_id: user_id.to_string(),
            trip_id: trip_id.to_string(),
            position,
        }
    }

    pub fn into_list(self) -> PlaceList {
        let mut list = PlaceList::new(self.id, self.title);
        list.notes = self.notes;
        list
    }
}

impl Record for PlaceListRecord {
    fn id(&self) -> &str {
        &self.id
    }

    fn collection_name() -> &'static str {
        PLACE_LISTS
    }

    fn indexed_fields(&self) -> HashMap<String, IndexValue> {
        HashMap::from([
            ("userId".to_string(), IndexValue::from(self.user_id.as_str())),
            ("tripId".to_string(), IndexValue::from(self.trip_id.as_str())),
        ])
    }
}

impl Record for CandidatePlace {
    fn id(&self) -> &str {
        self.id.as_str()
    }

    fn collection_name() -> &'static str {
        PLACES
    }

    fn indexed_fields(&self) -> HashMap<String, IndexValue> {
        HashMap::from([
            ("userId".to_string(), IndexValue::from(self.user_id.as_str())),
            ("tripId".to_string(), IndexValue::from(self.trip_id.as_str())),
            ("placeListId".to_string(), IndexValue::from(self.list_id())),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn persisted() -> PersistedPlace {
        PersistedPlace {
            id: "museum-1717200000000".to_string(),
            original_place_id: PlaceId::from("museum"),
            details: PlaceDetails::new("Museum", 35.01, 135.02),
            arrived_time: crate::domain::hhmm::parse("09:00"),
            left_time: None,
            transport_duration: Some(-1),
            transport_mode: Some(TransportMode::Walking),
        }
    }

    #[test]
    fn test_persisted_place_field_names_and_nulls() {
        let json = serde_json::to_value(persisted()).unwrap();
        let object = json.as_object().unwrap();

        for field in [
            "id",
            "originalPlaceId",
            "title",
            "address",
            "latitude",
            "longitude",
            "note",
            "placeListId",
            "GoogleMapPlaceId",
            "rating",
            "userRatingsTotal",
            "openingHours",
            "website",
            "photoUrl",
            "arrivedTime",
            "leftTime",
            "transportDuration",
            "transportMode",
        ] {
            assert!(object.contains_key(field), "missing field {field}");
        }
        assert_eq!(json["arrivedTime"], "09:00");
        assert!(json["leftTime"].is_null());
        assert!(json["note"].is_null());
        assert_eq!(json["transportDuration"], -1);
        assert_eq!(json["transportMode"], "WALKING");
    }

    #[test]
    fn test_persisted_place_reads_back() {
        let json = serde_json::to_value(persisted()).unwrap();
        let back: PersistedPlace = serde_json::from_value(json).unwrap();
        assert_eq!(back, persisted());
    }

    #[test]
    fn test_itinerary_record_indexes() {
        let record = ItineraryRecord {
            id: "u1_t1_2025-06-01".to_string(),
            date: "2025-06-01".parse().unwrap(),
            user_id: "u1".to_string(),
            trip_id: "t1".to_string(),
            places: vec![],
        };
        let fields = record.indexed_fields();
        assert_eq!(fields["date"], IndexValue::from("2025-06-01"));
        assert_eq!(fields["tripId"], IndexValue::from("t1"));
        assert_eq!(ItineraryRecord::collection_name(), "itineraries");
    }
}
