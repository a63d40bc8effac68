//! Core domain types for guided workout sessions.
//!
//! This module defines the fundamental types used throughout the system:
//! - Workouts, exercises and their sets (as served by the workout service)
//! - Auto-increase prescriptions
//! - Difficulty adjustments
//! - Journal records for completed sessions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type WorkoutId = String;
pub type ExerciseId = String;
pub type UserId = String;

// ============================================================================
// Exercise Types
// ============================================================================

/// How an exercise is measured
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExerciseType {
    Weights,
    Bodyweight,
    Duration,
}

/// A single set target
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutSet {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub reps: u32,
    #[serde(default)]
    pub weight: f64,
    /// Target duration in seconds (DURATION exercises only)
    #[serde(default)]
    pub duration: u32,
}

/// Current targets of an auto-increase exercise.
///
/// These are flattened into the exercise on the wire
/// (`autoIncreaseCurrentSets`, ...).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct Prescription {
    #[serde(default, rename = "autoIncreaseCurrentSets")]
    pub current_sets: Option<u32>,
    #[serde(default, rename = "autoIncreaseCurrentReps")]
    pub current_reps: Option<u32>,
    #[serde(default, rename = "autoIncreaseCurrentWeight")]
    pub current_weight: Option<f64>,
    #[serde(default, rename = "autoIncreaseCurrentDuration")]
    pub current_duration: Option<u32>,
}

/// An exercise within a workout
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub id: ExerciseId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ExerciseType,
    /// Rest between this exercise's sets, in seconds
    #[serde(default)]
    pub rest: u32,
    #[serde(default)]
    pub auto_increase: bool,
    #[serde(flatten)]
    pub prescription: Prescription,
    /// Manually authored sets; replaced by the prescription when auto-increase is on
    #[serde(default)]
    pub sets: Vec<WorkoutSet>,
}

impl Exercise {
    pub fn is_duration(&self) -> bool {
        self.kind == ExerciseType::Duration
    }
}

/// A workout: an ordered list of exercises
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    pub id: WorkoutId,
    pub name: String,
    /// Rest between exercises, in seconds
    #[serde(default)]
    pub rest: u32,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
}

// ============================================================================
// Progression
// ============================================================================

/// A difficulty change requested for an auto-increase exercise
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Adjustment {
    Increase,
    Decrease,
}

impl std::fmt::Display for Adjustment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Adjustment::Increase => write!(f, "increase"),
            Adjustment::Decrease => write!(f, "decrease"),
        }
    }
}

// ============================================================================
// Journal Types
// ============================================================================

/// Outcomes of one exercise within a completed session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExerciseResult {
    pub exercise_id: ExerciseId,
    pub name: String,
    /// One entry per attempted set, `true` for a pass
    pub outcomes: Vec<bool>,
    pub adjustment: Option<Adjustment>,
}

/// A completed guided session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionRecord {
    pub id: Uuid,
    pub user_id: UserId,
    pub workout_id: WorkoutId,
    pub workout_name: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: DateTime<Utc>,
    pub exercises: Vec<ExerciseResult>,
}

impl SessionRecord {
    pub fn sets_attempted(&self) -> usize {
        self.exercises.iter().map(|e| e.outcomes.len()).sum()
    }

    pub fn sets_passed(&self) -> usize {
        self.exercises
            .iter()
            .map(|e| e.outcomes.iter().filter(|passed| **passed).count())
            .sum()
    }

    pub fn adjustments(&self, kind: Adjustment) -> usize {
        self.exercises
            .iter()
            .filter(|e| e.adjustment == Some(kind))
            .count()
    }

    /// Wall-clock length of the session, when the start is known
    pub fn duration_seconds(&self) -> Option<u32> {
        self.started_at.map(|started| {
            (self.completed_at - started)
                .num_seconds()
                .max(0)
                .try_into()
                .unwrap_or(u32::MAX)
        })
    }
}
