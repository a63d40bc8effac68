//! Set and exercise sequencing.
//!
//! Materialization turns a fetched workout's exercises into concrete set
//! lists; [`advance`] walks a [`Position`] through them. Both are pure.

use crate::{Exercise, WorkoutSet};

/// Set count used when an auto-increase exercise carries no current set count
pub const DEFAULT_PRESCRIBED_SETS: u32 = 3;

/// Pointer into the exercise list and the current exercise's sets
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Position {
    pub exercise: usize,
    pub set: usize,
}

impl Position {
    pub fn start() -> Self {
        Self::default()
    }
}

/// Where the session goes after a set is resolved
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Next set of the same exercise, resting for the current exercise's rest
    NextSet { position: Position, rest: u32 },
    /// First set of the next exercise, resting for that exercise's rest
    NextExercise { position: Position, rest: u32 },
    /// The last set of the last exercise was resolved
    Complete,
}

/// Expand auto-increase prescriptions into sets and drop exercises without sets
pub fn materialize(exercises: Vec<Exercise>) -> Vec<Exercise> {
    let before = exercises.len();

    let materialized: Vec<Exercise> = exercises
        .into_iter()
        .map(|mut exercise| {
            if exercise.auto_increase {
                exercise.sets = prescribed_sets(&exercise);
            }
            exercise
        })
        .filter(|exercise| {
            if exercise.sets.is_empty() {
                tracing::debug!("Skipping exercise '{}' with no sets", exercise.name);
                return false;
            }
            true
        })
        .collect();

    tracing::debug!(
        "Materialized {} of {} exercises",
        materialized.len(),
        before
    );
    materialized
}

/// Replicate an exercise's current prescription once per prescribed set
fn prescribed_sets(exercise: &Exercise) -> Vec<WorkoutSet> {
    let prescription = &exercise.prescription;
    let count = match prescription.current_sets {
        Some(0) | None => DEFAULT_PRESCRIBED_SETS,
        Some(n) => n,
    };

    (0..count)
        .map(|i| WorkoutSet {
            id: u64::from(i),
            reps: prescription.current_reps.unwrap_or(0),
            weight: prescription.current_weight.unwrap_or(0.0),
            duration: prescription.current_duration.unwrap_or(0),
        })
        .collect()
}

/// Compute the step following the set at `position`
///
/// `exercises` must be materialized: every exercise has at least one set.
pub fn advance(position: Position, exercises: &[Exercise]) -> Step {
    let Some(current) = exercises.get(position.exercise) else {
        return Step::Complete;
    };

    if position.set + 1 < current.sets.len() {
        return Step::NextSet {
            position: Position {
                exercise: position.exercise,
                set: position.set + 1,
            },
            rest: current.rest,
        };
    }

    match exercises.get(position.exercise + 1) {
        Some(next) => Step::NextExercise {
            position: Position {
                exercise: position.exercise + 1,
                set: 0,
            },
            rest: next.rest,
        },
        None => Step::Complete,
    }
}
