//! Auto-progression at exercise boundaries.
//!
//! Each attempted set of the current exercise is recorded as a pass or a fail.
//! When the exercise ends, the recorded outcomes decide whether its difficulty
//! goes up or down:
//! - any failed set → decrease
//! - every set passed → increase
//! - manual exercises are never adjusted

use crate::service::{ExerciseService, ServiceResult};
use crate::{Adjustment, Exercise, ExerciseId};

/// Pass/fail outcomes of the sets attempted in the current exercise
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OutcomeLog {
    outcomes: Vec<bool>,
}

impl OutcomeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, passed: bool) {
        self.outcomes.push(passed);
    }

    /// Hand over the outcomes and start empty for the next exercise
    pub fn take(&mut self) -> Vec<bool> {
        std::mem::take(&mut self.outcomes)
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.outcomes
    }

    /// At least one set recorded and none failed
    pub fn all_passed(&self) -> bool {
        !self.outcomes.is_empty() && self.outcomes.iter().all(|passed| *passed)
    }

    pub fn any_failed(&self) -> bool {
        self.outcomes.contains(&false)
    }
}

/// Decide the adjustment for an exercise that just ended
pub fn resolve(exercise: &Exercise, outcomes: &OutcomeLog) -> Option<Adjustment> {
    if !exercise.auto_increase {
        return None;
    }

    if outcomes.any_failed() {
        Some(Adjustment::Decrease)
    } else if outcomes.all_passed() {
        Some(Adjustment::Increase)
    } else {
        tracing::debug!(
            "No outcomes recorded for '{}', leaving difficulty unchanged",
            exercise.name
        );
        None
    }
}

/// Issue the service call matching an adjustment
pub async fn request(
    service: &dyn ExerciseService,
    exercise_id: &ExerciseId,
    adjustment: Adjustment,
) -> ServiceResult<()> {
    tracing::info!("Requesting {} of difficulty for {}", adjustment, exercise_id);

    match adjustment {
        Adjustment::Increase => service.increase_difficulty(exercise_id).await,
        Adjustment::Decrease => service.decrease_difficulty(exercise_id).await,
    }
}
