//! Persistence error types

use thiserror::Error;

use docstore::StoreError;

/// Errors raised while saving or loading a trip session
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Fixture parse error: {0}")]
    Fixture(#[from] serde_yaml::Error),

    #[error("Trip '{trip_id}' not found for user '{user_id}'")]
    TripNotFound { user_id: String, trip_id: String },
}
