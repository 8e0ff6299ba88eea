//! PlanningSession - load/edit/save lifecycle of one trip
//!
//! ```text
//! Idle ──load──▶ Loading ──▶ Ready ──begin_save──▶ Saving ──finish_save──▶ Ready
//!                  ▲                                                    │
//!                  └──────────────────────── load ──────────────────────┘
//! ```
//!
//! Editing is only possible in `Ready`. A save attempted while another is in
//! progress is rejected rather than queued.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use docstore::WriteBatch;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::DirectionsConfig;
use crate::directions::DirectionsProvider;
use crate::domain::TransportMode;
use crate::itinerary::ScheduleEditor;
use crate::persistence::{self, DocumentStore, PersistError};
use crate::routes::RouteAnnotator;

/// Where a session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Loading,
    Ready,
    Saving,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Loading => write!(f, "loading"),
            Self::Ready => write!(f, "ready"),
            Self::Saving => write!(f, "saving"),
        }
    }
}

/// Errors from session transitions
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Cannot {action} while the session is {state}")]
    InvalidTransition { action: &'static str, state: SessionState },

    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// One user's planning session on one trip
pub struct PlanningSession<S: DocumentStore> {
    store: S,
    provider: Arc<dyn DirectionsProvider>,
    default_mode: TransportMode,
    leg_timeout: Duration,
    user_id: String,
    trip_id: String,
    state: SessionState,
    editor: Option<ScheduleEditor>,
}

impl<S: DocumentStore> PlanningSession<S> {
    pub fn new(
        store: S,
        provider: Arc<dyn DirectionsProvider>,
        directions: &DirectionsConfig,
        user_id: impl Into<String>,
        trip_id: impl Into<String>,
    ) -> Self {
        Self {
            store,
            provider,
            default_mode: directions.default_mode,
            leg_timeout: directions.timeout(),
            user_id: user_id.into(),
            trip_id: trip_id.into(),
            state: SessionState::Idle,
            editor: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn trip_id(&self) -> &str {
        &self.trip_id
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Whether there are edits not yet saved
    pub fn is_dirty(&self) -> bool {
        self.editor.as_ref().is_some_and(ScheduleEditor::is_dirty)
    }

    fn reject(&self, action: &'static str) -> SessionError {
        let e = SessionError::InvalidTransition {
            action,
            state: self.state,
        };
        warn!(error = %e, "session: transition rejected");
        e
    }

    /// Load (or reload) the trip from the store
    ///
    /// Legs saved while still computing are re-requested, so this must run
    /// inside a tokio runtime. On failure the previous state is kept.
    pub fn load(&mut self) -> Result<(), SessionError> {
        debug!(user_id = %self.user_id, trip_id = %self.trip_id, state = %self.state, "load: called");
        let previous = match self.state {
            SessionState::Idle | SessionState::Ready => self.state,
            _ => return Err(self.reject("load")),
        };

        self.state = SessionState::Loading;
        let loaded = match persistence::load(&self.store, &self.user_id, &self.trip_id, self.default_mode) {
            Ok(loaded) => loaded,
            Err(e) => {
                self.state = previous;
                return Err(e.into());
            }
        };

        let annotator = RouteAnnotator::with_cache(Arc::clone(&self.provider), self.leg_timeout, loaded.routes);
        let mut editor = ScheduleEditor::new(
            loaded.trip,
            loaded.catalog,
            loaded.itinerary,
            annotator,
            self.default_mode,
        );
        editor.resume_pending_legs();
        self.editor = Some(editor);
        self.state = SessionState::Ready;
        info!(trip_id = %self.trip_id, "load: session ready");
        Ok(())
    }

    /// Read access to the editor; available while ready or saving
    pub fn editor(&self) -> Result<&ScheduleEditor, SessionError> {
        match (self.state, self.editor.as_ref()) {
            (SessionState::Ready | SessionState::Saving, Some(editor)) => Ok(editor),
            _ => Err(self.reject("read the itinerary")),
        }
    }

    /// Mutable access to the editor; only while ready
    pub fn editor_mut(&mut self) -> Result<&mut ScheduleEditor, SessionError> {
        if self.state != SessionState::Ready || self.editor.is_none() {
            return Err(self.reject("edit"));
        }
        self.editor.as_mut().ok_or(SessionError::InvalidTransition {
            action: "edit",
            state: self.state,
        })
    }

    /// Enter `Saving` and snapshot the itinerary into a batch
    ///
    /// Finished leg computations are applied and stale legs pruned first.
    pub fn begin_save(&mut self) -> Result<WriteBatch, SessionError> {
        debug!(state = %self.state, "begin_save: called");
        if self.state != SessionState::Ready {
            return Err(self.reject("save"));
        }
        let Some(editor) = self.editor.as_mut() else {
            return Err(self.reject("save"));
        };

        editor.drain_routes();
        editor.prune_routes();
        let batch = persistence::build_batch(&self.user_id, &self.trip_id, editor.itinerary(), editor.routes())?;
        self.state = SessionState::Saving;
        Ok(batch)
    }

    /// Leave `Saving` with the outcome of the write
    ///
    /// Success clears the dirty flag; failure keeps it set.
    pub fn finish_save(&mut self, outcome: Result<usize, PersistError>) -> Result<usize, SessionError> {
        debug!(state = %self.state, ok = outcome.is_ok(), "finish_save: called");
        if self.state != SessionState::Saving {
            return Err(self.reject("finish saving"));
        }
        self.state = SessionState::Ready;
        match outcome {
            Ok(written) => {
                if let Some(editor) = self.editor.as_mut() {
                    editor.mark_clean();
                }
                info!(trip_id = %self.trip_id, written, "finish_save: saved");
                Ok(written)
            }
            Err(e) => {
                warn!(trip_id = %self.trip_id, error = %e, "finish_save: save failed, edits kept");
                Err(e.into())
            }
        }
    }

    /// Save the itinerary in one atomic batch
    pub fn save(&mut self) -> Result<usize, SessionError> {
        let batch = self.begin_save()?;
        let outcome = self.store.commit(batch).map_err(PersistError::from);
        self.finish_save(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directions::{DirectionsError, DirectionsRequest, DirectionsResponse};
    use crate::itinerary::ContainerId;
    use crate::persistence::{TripFixture, import};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use docstore::{Filter, Store, StoreError};
    use serde_json::Value;

    struct FixedProvider;

    #[async_trait]
    impl DirectionsProvider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn route(&self, _request: DirectionsRequest) -> Result<DirectionsResponse, DirectionsError> {
            Ok(DirectionsResponse::single(600))
        }
    }

    /// In-memory store that can be told to reject commits
    struct FlakyStore {
        inner: Store,
        fail: bool,
    }

    impl DocumentStore for FlakyStore {
        fn list_raw(&self, collection: &str, filters: &[Filter]) -> Result<Vec<Value>, StoreError> {
            self.inner.list_raw(collection, filters)
        }

        fn commit(&mut self, batch: WriteBatch) -> Result<usize, StoreError> {
            if self.fail {
                return Err(StoreError::Rejected("offline".to_string()));
            }
            self.inner.commit(batch)
        }
    }

    const FIXTURE: &str = r#"
trip:
  id: t1
  name: Kansai
  startDate: 2025-06-01
  endDate: 2025-06-02
  userId: u1
lists:
  - id: sights
    title: Sights
    places:
      - id: station
        title: Station
        latitude: 35.0
        longitude: 135.0
      - id: museum
        title: Museum
        latitude: 35.01
        longitude: 135.02
"#;

    fn session() -> PlanningSession<FlakyStore> {
        let mut inner = Store::open_in_memory().unwrap();
        import(&mut inner, &TripFixture::from_yaml(FIXTURE).unwrap()).unwrap();
        let store = FlakyStore { inner, fail: false };
        PlanningSession::new(store, Arc::new(FixedProvider), &DirectionsConfig::default(), "u1", "t1")
    }

    fn d1() -> NaiveDate {
        "2025-06-01".parse().unwrap()
    }

    #[tokio::test]
    async fn test_editing_requires_loaded_session() {
        let mut session = session();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.editor().is_err());
        assert!(session.editor_mut().is_err());
        assert!(matches!(
            session.save(),
            Err(SessionError::InvalidTransition { state: SessionState::Idle, .. })
        ));

        session.load().unwrap();
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(session.editor().unwrap().catalog().candidate_count(), 2);
        assert!(!session.is_dirty());
    }

    #[tokio::test]
    async fn test_unknown_trip_stays_idle() {
        let store = FlakyStore {
            inner: Store::open_in_memory().unwrap(),
            fail: false,
        };
        let mut session = PlanningSession::new(store, Arc::new(FixedProvider), &DirectionsConfig::default(), "u1", "nope");
        assert!(matches!(
            session.load(),
            Err(SessionError::Persist(PersistError::TripNotFound { .. }))
        ));
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_saving_blocks_edits_reloads_and_second_save() {
        let mut session = session();
        session.load().unwrap();
        let sights = ContainerId::list("sights");
        session
            .editor_mut()
            .unwrap()
            .move_item(&sights, 0, &ContainerId::Day(d1()), 0)
            .unwrap();

        let batch = session.begin_save().unwrap();
        assert_eq!(session.state(), SessionState::Saving);
        assert!(session.editor().is_ok());
        assert!(session.editor_mut().is_err());
        assert!(session.load().is_err());
        assert!(session.begin_save().is_err());

        let outcome = session.store_mut().commit(batch).map_err(PersistError::from);
        session.finish_save(outcome).unwrap();
        assert_eq!(session.state(), SessionState::Ready);
        assert!(!session.is_dirty());
        assert!(session.finish_save(Ok(0)).is_err());
    }

    #[tokio::test]
    async fn test_failed_save_keeps_dirty_and_store_untouched() {
        let mut session = session();
        session.load().unwrap();
        let sights = ContainerId::list("sights");
        session
            .editor_mut()
            .unwrap()
            .move_item(&sights, 1, &ContainerId::Day(d1()), 0)
            .unwrap();

        session.store_mut().fail = true;
        assert!(matches!(session.save(), Err(SessionError::Persist(_))));
        assert_eq!(session.state(), SessionState::Ready);
        assert!(session.is_dirty());
        let saved = session.store().list_raw("itineraries", &[]).unwrap();
        assert!(saved.is_empty());

        session.store_mut().fail = false;
        session.save().unwrap();
        assert!(!session.is_dirty());
        assert_eq!(session.store().list_raw("itineraries", &[]).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reload_after_save_restores_itinerary() {
        let mut session = session();
        session.load().unwrap();
        let sights = ContainerId::list("sights");
        {
            let editor = session.editor_mut().unwrap();
            editor.move_item(&sights, 0, &ContainerId::Day(d1()), 0).unwrap();
            editor.move_item(&sights, 1, &ContainerId::Day(d1()), 1).unwrap();
            editor.settle_routes().await;
        }
        session.save().unwrap();
        let before: Vec<_> = session.editor().unwrap().day(d1()).unwrap().to_vec();

        session.load().unwrap();
        let editor = session.editor().unwrap();
        assert_eq!(editor.day(d1()).unwrap(), before.as_slice());
        let leg = editor.leg(d1(), before[0].id(), before[1].id()).unwrap();
        assert_eq!(leg.duration, Some(crate::routes::LegDuration::Minutes(10)));
        assert!(!editor.is_dirty());
    }
}
