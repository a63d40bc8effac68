//! Services consumed by a guided session.
//!
//! The session core only knows these contracts. `LocalStore` implements them
//! on a data directory; tests substitute recording doubles.

use crate::error::ServiceError;
use crate::{ExerciseId, UserId, Workout, WorkoutId};
use async_trait::async_trait;
use std::sync::Arc;

/// Result of a service call
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

#[async_trait]
pub trait WorkoutService: Send + Sync {
    async fn fetch_workout(&self, workout_id: &WorkoutId) -> ServiceResult<Workout>;
}

#[async_trait]
pub trait ExerciseService: Send + Sync {
    async fn increase_difficulty(&self, exercise_id: &ExerciseId) -> ServiceResult<()>;

    async fn decrease_difficulty(&self, exercise_id: &ExerciseId) -> ServiceResult<()>;
}

#[async_trait]
pub trait UserService: Send + Sync {
    async fn record_streak_progress(&self, user_id: &UserId) -> ServiceResult<()>;
}

/// The services one session talks to
#[derive(Clone)]
pub struct Services {
    pub workouts: Arc<dyn WorkoutService>,
    pub exercises: Arc<dyn ExerciseService>,
    pub users: Arc<dyn UserService>,
}

impl Services {
    /// Use one value for all three services
    pub fn from_shared<S>(shared: Arc<S>) -> Self
    where
        S: WorkoutService + ExerciseService + UserService + 'static,
    {
        Self {
            workouts: shared.clone(),
            exercises: shared.clone(),
            users: shared,
        }
    }
}

/// Who is training and which workout they opened.
///
/// Passed explicitly into a session instead of being looked up from ambient
/// storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionContext {
    pub user_id: UserId,
    pub workout_id: WorkoutId,
}
