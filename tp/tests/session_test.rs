//! Integration tests for tripplan
//!
//! These tests drive a full planning session against an on-disk store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use docstore::{Filter, Store};
use tempfile::TempDir;

use tripplan::config::DirectionsConfig;
use tripplan::directions::{DirectionsError, DirectionsProvider, DirectionsRequest, DirectionsResponse};
use tripplan::domain::{PlaceId, TimeField, TransportMode, hhmm};
use tripplan::itinerary::ContainerId;
use tripplan::persistence::{ITINERARIES, TripFixture, import, record_id};
use tripplan::routes::LegDuration;
use tripplan::session::{PlanningSession, SessionState};

const FIXTURE: &str = r#"
trip:
  id: kansai
  name: Kansai
  startDate: 2025-06-01
  endDate: 2025-06-03
  userId: u1
lists:
  - id: sights
    title: Sights
    places:
      - id: kyoto-station
        title: Kyoto Station
        latitude: 34.9858
        longitude: 135.7588
      - id: fushimi-inari
        title: Fushimi Inari
        latitude: 34.9671
        longitude: 135.7727
      - id: kiyomizu
        title: Kiyomizu-dera
        latitude: 34.9949
        longitude: 135.7850
"#;

/// Every leg takes ten minutes, except ones ending at Kiyomizu-dera, which have no route
struct KyotoProvider;

#[async_trait]
impl DirectionsProvider for KyotoProvider {
    fn name(&self) -> &str {
        "kyoto"
    }

    async fn route(&self, request: DirectionsRequest) -> Result<DirectionsResponse, DirectionsError> {
        if request.destination.lat == 34.9949 {
            return Ok(DirectionsResponse::default());
        }
        Ok(DirectionsResponse::single(600))
    }
}

fn d(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

fn sights() -> ContainerId {
    ContainerId::list("sights")
}

fn open(dir: &TempDir) -> PlanningSession<Store> {
    let store = Store::open(dir.path()).expect("Failed to open store");
    PlanningSession::new(store, Arc::new(KyotoProvider), &DirectionsConfig::default(), "u1", "kansai")
}

fn seeded() -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut store = Store::open(dir.path()).expect("Failed to open store");
    import(&mut store, &TripFixture::from_yaml(FIXTURE).unwrap()).unwrap();
    dir
}

// =============================================================================
// Save / load
// =============================================================================

#[tokio::test]
async fn test_plan_save_and_reload_in_new_session() {
    let dir = seeded();
    let mut session = open(&dir);
    session.load().unwrap();

    {
        let editor = session.editor_mut().unwrap();
        let day = ContainerId::Day(d("2025-06-01"));
        let station = editor.move_item(&sights(), 0, &day, 0).unwrap();
        editor.move_item(&sights(), 1, &day, 1).unwrap();
        editor.move_item(&sights(), 2, &day, 2).unwrap();
        editor
            .set_time(d("2025-06-01"), &station, TimeField::Departure, hhmm::parse("08:30"))
            .unwrap();
        editor.settle_routes().await;
        assert!(editor.is_scheduled(&PlaceId::from("kyoto-station")));
    }
    session.save().unwrap();
    drop(session);

    let mut reopened = open(&dir);
    reopened.load().unwrap();
    assert_eq!(reopened.state(), SessionState::Ready);
    let editor = reopened.editor().unwrap();
    let day = editor.day(d("2025-06-01")).unwrap();
    let titles: Vec<&str> = day.iter().map(|o| o.title()).collect();
    assert_eq!(titles, vec!["Kyoto Station", "Fushimi Inari", "Kiyomizu-dera"]);
    assert_eq!(day[0].departure(), hhmm::parse("08:30"));

    let legs = editor.legs_for_day(d("2025-06-01"));
    assert_eq!(legs.len(), 2);
    assert_eq!(legs[0].1.unwrap().duration, Some(LegDuration::Minutes(10)));
    assert_eq!(legs[1].1.unwrap().duration, Some(LegDuration::Unavailable));
    assert_eq!(legs[1].1.unwrap().mode, TransportMode::Driving);
}

#[tokio::test]
async fn test_persisted_record_shape() {
    let dir = seeded();
    let mut session = open(&dir);
    session.load().unwrap();
    {
        let editor = session.editor_mut().unwrap();
        let day = ContainerId::Day(d("2025-06-02"));
        editor.move_item(&sights(), 0, &day, 0).unwrap();
        editor.move_item(&sights(), 2, &day, 1).unwrap();
        editor.settle_routes().await;
    }
    session.save().unwrap();

    let records = session
        .store()
        .list_raw(ITINERARIES, &[Filter::eq("date", "2025-06-02")])
        .unwrap();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record["id"], record_id("u1", "kansai", d("2025-06-02")).as_str());
    assert_eq!(record["userId"], "u1");
    assert_eq!(record["tripId"], "kansai");

    let places = record["places"].as_array().unwrap();
    assert_eq!(places[0]["originalPlaceId"], "kyoto-station");
    assert!(places[0]["id"].as_str().unwrap().starts_with("kyoto-station-"));
    assert!(places[0]["transportDuration"].is_null());
    assert!(places[0]["transportMode"].is_null());
    assert!(places[0]["arrivedTime"].is_null());
    assert_eq!(places[1]["transportDuration"], -1);
    assert_eq!(places[1]["transportMode"], "DRIVING");
}

#[tokio::test]
async fn test_resave_without_edits_is_identical() {
    let dir = seeded();
    let mut session = open(&dir);
    session.load().unwrap();
    {
        let editor = session.editor_mut().unwrap();
        editor.move_item(&sights(), 1, &ContainerId::Day(d("2025-06-03")), 0).unwrap();
        editor.move_item(&sights(), 0, &ContainerId::Day(d("2025-06-03")), 0).unwrap();
        editor.settle_routes().await;
    }
    session.save().unwrap();
    let first = session.store().list_raw(ITINERARIES, &[]).unwrap();

    session.load().unwrap();
    session.save().unwrap();
    let second = session.store().list_raw(ITINERARIES, &[]).unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_emptied_day_is_deleted_on_save() {
    let dir = seeded();
    let mut session = open(&dir);
    session.load().unwrap();
    let id = {
        let editor = session.editor_mut().unwrap();
        editor.move_item(&sights(), 0, &ContainerId::Day(d("2025-06-01")), 0).unwrap()
    };
    session.save().unwrap();
    assert_eq!(session.store().list_raw(ITINERARIES, &[]).unwrap().len(), 1);

    session.editor_mut().unwrap().remove_from_day(d("2025-06-01"), &id).unwrap();
    session.save().unwrap();
    assert!(session.store().list_raw(ITINERARIES, &[]).unwrap().is_empty());

    session.load().unwrap();
    assert_eq!(session.editor().unwrap().itinerary().total_occurrences(), 0);
    assert!(!session.editor().unwrap().is_scheduled(&PlaceId::from("kyoto-station")));
}

// =============================================================================
// Editing across days
// =============================================================================

#[tokio::test]
async fn test_cross_day_move_survives_reload() {
    let dir = seeded();
    let mut session = open(&dir);
    session.load().unwrap();
    {
        let editor = session.editor_mut().unwrap();
        let day1 = ContainerId::Day(d("2025-06-01"));
        for index in 0..3 {
            editor.move_item(&sights(), index, &day1, index).unwrap();
        }
        editor
            .move_item(&day1, 1, &ContainerId::Day(d("2025-06-03")), 0)
            .unwrap();
        editor.settle_routes().await;
    }
    session.save().unwrap();

    session.load().unwrap();
    let editor = session.editor().unwrap();
    assert_eq!(editor.day(d("2025-06-01")).unwrap().len(), 2);
    assert_eq!(editor.day(d("2025-06-03")).unwrap()[0].title(), "Fushimi Inari");
    assert_eq!(editor.itinerary().total_occurrences(), 3);

    // Station → Kiyomizu closes the gap and has no route
    let legs = editor.legs_for_day(d("2025-06-01"));
    assert_eq!(legs.len(), 1);
    assert_eq!(legs[0].1.unwrap().duration, Some(LegDuration::Unavailable));
    assert_eq!(editor.catalog().list("sights").unwrap().places.len(), 3);
}
