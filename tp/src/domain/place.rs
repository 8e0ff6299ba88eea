//! Trips, candidate places and the place catalog

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::id::PlaceId;

/// A latitude/longitude pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl std::fmt::Display for LatLng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

/// A trip with an inclusive date range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub notes: String,
    pub user_id: String,
}

impl Trip {
    /// Every calendar day of the trip, in order
    ///
    /// Empty when the end date precedes the start date.
    pub fn days(&self) -> Vec<NaiveDate> {
        self.start_date
            .iter_days()
            .take_while(|day| *day <= self.end_date)
            .collect()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// Descriptive fields shared by a candidate and every occurrence cloned from it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceDetails {
    pub title: String,
    #[serde(default)]
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub place_list_id: String,
    #[serde(default, rename = "GoogleMapPlaceId")]
    pub google_map_place_id: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub user_ratings_total: Option<u32>,
    #[serde(default)]
    pub opening_hours: Option<Vec<String>>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
}

impl PlaceDetails {
    /// Minimal details, mostly for fixtures and tests
    pub fn new(title: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            title: title.into(),
            address: String::new(),
            latitude,
            longitude,
            note: None,
            place_list_id: String::new(),
            google_map_place_id: None,
            rating: None,
            user_ratings_total: None,
            opening_hours: None,
            website: None,
            photo_url: None,
        }
    }

    pub fn location(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }
}

/// A point of interest saved into one of the trip's lists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidatePlace {
    pub id: PlaceId,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub trip_id: String,
    /// Index within its list; lists are stored unordered
    #[serde(default)]
    pub position: u32,
    #[serde(flatten)]
    pub details: PlaceDetails,
}

impl CandidatePlace {
    pub fn new(id: impl Into<PlaceId>, details: PlaceDetails) -> Self {
        Self {
            id: id.into(),
            user_id: String::new(),
            trip_id: String::new(),
            position: 0,
            details,
        }
    }

    pub fn list_id(&self) -> &str {
        &self.details.place_list_id
    }
}

/// A named list of candidate places
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceList {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub places: Vec<CandidatePlace>,
}

impl PlaceList {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            notes: String::new(),
            places: Vec::new(),
        }
    }

    /// Add a candidate, stamping it with this list's ID and its position
    pub fn with_place(mut self, mut place: CandidatePlace) -> Self {
        place.details.place_list_id = self.id.clone();
        place.position = self.places.len() as u32;
        self.places.push(place);
        self
    }
}

/// Read-only view of a trip's candidate lists
///
/// The scheduling engine never removes or reorders catalog entries; whether
/// a candidate is already on the itinerary is derived separately.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaceCatalog {
    lists: Vec<PlaceList>,
}

impl PlaceCatalog {
    pub fn new(lists: Vec<PlaceList>) -> Self {
        Self { lists }
    }

    pub fn lists(&self) -> &[PlaceList] {
        &self.lists
    }

    pub fn list(&self, list_id: &str) -> Option<&PlaceList> {
        self.lists.iter().find(|list| list.id == list_id)
    }

    /// The candidate at `index` in list `list_id`
    pub fn candidate(&self, list_id: &str, index: usize) -> Option<&CandidatePlace> {
        self.list(list_id)?.places.get(index)
    }

    /// Look a candidate up by ID across all lists
    pub fn find(&self, place_id: &PlaceId) -> Option<&CandidatePlace> {
        self.lists
            .iter()
            .flat_map(|list| list.places.iter())
            .find(|place| &place.id == place_id)
    }

    pub fn candidate_count(&self) -> usize {
        self.lists.iter().map(|list| list.places.len()).sum()
    }
}
