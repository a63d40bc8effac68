//! File-backed implementation of the session services.
//!
//! Layout under the data directory:
//!
//! ```text
//! workouts.json                     workout library (optional)
//! sessions.csv                      rolled-up session history
//! journal/sessions.wal              completed sessions (JSONL)
//! journal/difficulty_requests.wal   requested difficulty changes (JSONL)
//! journal/users.json                streak state
//! ```

use crate::error::ServiceError;
use crate::library::{get_default_library, Library};
use crate::service::{ExerciseService, ServiceResult, UserService, WorkoutService};
use crate::state::{StreakState, UserState};
use crate::wal::{read_records, JsonlSink};
use crate::{Adjustment, ExerciseId, Result, UserId, Workout, WorkoutId};
use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// A journaled difficulty change
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DifficultyRequest {
    pub id: Uuid,
    pub exercise_id: ExerciseId,
    pub adjustment: Adjustment,
    pub requested_at: DateTime<Utc>,
}

/// Services backed by a local data directory
#[derive(Clone, Debug)]
pub struct LocalStore {
    data_dir: PathBuf,
}

impl LocalStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn workouts_path(&self) -> PathBuf {
        self.data_dir.join("workouts.json")
    }

    pub fn journal_dir(&self) -> PathBuf {
        self.data_dir.join("journal")
    }

    pub fn sessions_wal_path(&self) -> PathBuf {
        self.journal_dir().join("sessions.wal")
    }

    pub fn difficulty_wal_path(&self) -> PathBuf {
        self.journal_dir().join("difficulty_requests.wal")
    }

    pub fn users_path(&self) -> PathBuf {
        self.journal_dir().join("users.json")
    }

    pub fn sessions_csv_path(&self) -> PathBuf {
        self.data_dir.join("sessions.csv")
    }

    /// The library in `workouts.json`, or the built-in one when absent
    pub fn library(&self) -> Result<Library> {
        let path = self.workouts_path();
        if path.exists() {
            Library::load_from(&path)
        } else {
            tracing::debug!("No workout library at {:?}, using built-in", path);
            Ok(get_default_library().clone())
        }
    }

    pub fn find_workout(&self, workout_id: &str) -> ServiceResult<Workout> {
        let library = self.library()?;
        library
            .get(workout_id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("workout {}", workout_id)))
    }

    /// Append a difficulty request to the journal
    pub fn journal_adjustment(
        &self,
        exercise_id: &str,
        adjustment: Adjustment,
    ) -> Result<DifficultyRequest> {
        let request = DifficultyRequest {
            id: Uuid::new_v4(),
            exercise_id: exercise_id.to_string(),
            adjustment,
            requested_at: Utc::now(),
        };
        JsonlSink::new(self.difficulty_wal_path()).append_record(&request)?;
        tracing::info!("Journaled {} request for exercise {}", adjustment, exercise_id);
        Ok(request)
    }

    pub fn difficulty_requests(&self) -> Result<Vec<DifficultyRequest>> {
        read_records(&self.difficulty_wal_path())
    }

    /// Count a completed workout for `user_id` on `today`
    pub fn record_streak_on(&self, user_id: &str, today: NaiveDate) -> Result<StreakState> {
        let state = UserState::update(&self.users_path(), |state| {
            state
                .streaks
                .entry(user_id.to_string())
                .or_default()
                .record_workout(today);
            Ok(())
        })?;
        let streak = state.streak(user_id);
        tracing::info!(
            "Streak for user {} is {} (best {})",
            user_id,
            streak.current,
            streak.best
        );
        Ok(streak)
    }

    pub fn streak(&self, user_id: &str) -> Result<StreakState> {
        Ok(UserState::load(&self.users_path())?.streak(user_id))
    }
}

/// Run blocking file work off the async executor
async fn blocking<T, F>(f: F) -> ServiceResult<T>
where
    F: FnOnce() -> ServiceResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ServiceError::Unavailable(e.to_string()))?
}

#[async_trait]
impl WorkoutService for LocalStore {
    async fn fetch_workout(&self, workout_id: &WorkoutId) -> ServiceResult<Workout> {
        let store = self.clone();
        let workout_id = workout_id.clone();
        blocking(move || store.find_workout(&workout_id)).await
    }
}

#[async_trait]
impl ExerciseService for LocalStore {
    async fn increase_difficulty(&self, exercise_id: &ExerciseId) -> ServiceResult<()> {
        let store = self.clone();
        let exercise_id = exercise_id.clone();
        blocking(move || {
            store.journal_adjustment(&exercise_id, Adjustment::Increase)?;
            Ok(())
        })
        .await
    }

    async fn decrease_difficulty(&self, exercise_id: &ExerciseId) -> ServiceResult<()> {
        let store = self.clone();
        let exercise_id = exercise_id.clone();
        blocking(move || {
            store.journal_adjustment(&exercise_id, Adjustment::Decrease)?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl UserService for LocalStore {
    async fn record_streak_progress(&self, user_id: &UserId) -> ServiceResult<()> {
        let store = self.clone();
        let user_id = user_id.clone();
        blocking(move || {
            store.record_streak_on(&user_id, Local::now().date_naive())?;
            Ok(())
        })
        .await
    }
}
