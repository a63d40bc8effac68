//! Error types for the lift_core library.
//!
//! - `Error`: crate-level failures (IO, parsing, configuration, store)
//! - `ServiceError`: failures reported by the workout/exercise/user services
//! - `TransitionError`: inputs the session state machine refuses
//! - `SessionError`: failures surfaced on a running session's error channel

use crate::session::{Input, Phase};
use crate::types::{Adjustment, ExerciseId, UserId, WorkoutId};
use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for lift_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Workout library validation error
    #[error("Library validation error: {0}")]
    LibraryValidation(String),

    /// A service call failed
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// State management error
    #[error("State error: {0}")]
    State(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Failure of one of the consumed services
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("storage failure: {0}")]
    Storage(String),
}

impl From<Error> for ServiceError {
    fn from(err: Error) -> Self {
        match err {
            Error::Service(inner) => inner,
            other => ServiceError::Storage(other.to_string()),
        }
    }
}

/// An input the session cannot accept in its current phase
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("{input:?} is not accepted while {phase:?}")]
    Rejected { input: Input, phase: Phase },
}

/// A failure reported on a session's error channel
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("failed to load workout {workout_id}: {source}")]
    Fetch {
        workout_id: WorkoutId,
        #[source]
        source: ServiceError,
    },

    #[error("failed to {adjustment} difficulty of exercise {exercise_id}: {source}")]
    Progression {
        exercise_id: ExerciseId,
        adjustment: Adjustment,
        #[source]
        source: ServiceError,
    },

    #[error("failed to record streak progress for user {user_id}: {source}")]
    Streak {
        user_id: UserId,
        #[source]
        source: ServiceError,
    },

    #[error("failed to journal session: {0}")]
    Journal(String),

    #[error("background request panicked: {0}")]
    Panicked(String),
}
