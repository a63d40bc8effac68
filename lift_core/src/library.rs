//! Workout library: the workouts the local store serves.
//!
//! A library is read from `workouts.json` in the data directory; without one,
//! the built-in library below is used.

use crate::types::*;
use crate::Result;
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// A set of workouts keyed by id
#[derive(Clone, Debug, Default)]
pub struct Library {
    pub workouts: HashMap<WorkoutId, Workout>,
}

/// Cached built-in library
static DEFAULT_LIBRARY: Lazy<Library> = Lazy::new(build_default_library);

/// Get a reference to the cached built-in library
pub fn get_default_library() -> &'static Library {
    &DEFAULT_LIBRARY
}

/// Builds the built-in library with three starter workouts
pub fn build_default_library() -> Library {
    let workouts = vec![
        Workout {
            id: "full_body".into(),
            name: "Full Body".into(),
            rest: 120,
            exercises: vec![
                auto_exercise(
                    "goblet_squat",
                    "Goblet Squat",
                    ExerciseType::Weights,
                    90,
                    Prescription {
                        current_sets: Some(3),
                        current_reps: Some(8),
                        current_weight: Some(16.0),
                        current_duration: None,
                    },
                ),
                manual_exercise(
                    "push_up",
                    "Push-up",
                    ExerciseType::Bodyweight,
                    60,
                    vec![reps_set(0, 12), reps_set(1, 10), reps_set(2, 8)],
                ),
                manual_exercise(
                    "plank",
                    "Plank",
                    ExerciseType::Duration,
                    45,
                    vec![timed_set(0, 45), timed_set(1, 45)],
                ),
            ],
        },
        Workout {
            id: "upper".into(),
            name: "Upper Body".into(),
            rest: 120,
            exercises: vec![
                auto_exercise(
                    "bench_press",
                    "Bench Press",
                    ExerciseType::Weights,
                    120,
                    Prescription {
                        current_sets: Some(4),
                        current_reps: Some(6),
                        current_weight: Some(60.0),
                        current_duration: None,
                    },
                ),
                auto_exercise(
                    "pull_up",
                    "Pull-up",
                    ExerciseType::Bodyweight,
                    90,
                    Prescription {
                        current_sets: Some(3),
                        current_reps: Some(5),
                        current_weight: None,
                        current_duration: None,
                    },
                ),
                auto_exercise(
                    "dead_hang",
                    "Dead Hang",
                    ExerciseType::Duration,
                    60,
                    Prescription {
                        current_sets: Some(2),
                        current_reps: None,
                        current_weight: None,
                        current_duration: Some(30),
                    },
                ),
            ],
        },
        Workout {
            id: "core_quick".into(),
            name: "Quick Core".into(),
            rest: 30,
            exercises: vec![
                manual_exercise(
                    "hollow_hold",
                    "Hollow Hold",
                    ExerciseType::Duration,
                    20,
                    vec![timed_set(0, 20), timed_set(1, 20), timed_set(2, 20)],
                ),
                manual_exercise(
                    "dead_bug",
                    "Dead Bug",
                    ExerciseType::Bodyweight,
                    20,
                    vec![reps_set(0, 10), reps_set(1, 10)],
                ),
            ],
        },
    ];

    Library::from_workouts(workouts)
}

fn auto_exercise(
    id: &str,
    name: &str,
    kind: ExerciseType,
    rest: u32,
    prescription: Prescription,
) -> Exercise {
    Exercise {
        id: id.into(),
        name: name.into(),
        kind,
        rest,
        auto_increase: true,
        prescription,
        sets: vec![],
    }
}

fn manual_exercise(
    id: &str,
    name: &str,
    kind: ExerciseType,
    rest: u32,
    sets: Vec<WorkoutSet>,
) -> Exercise {
    Exercise {
        id: id.into(),
        name: name.into(),
        kind,
        rest,
        auto_increase: false,
        prescription: Prescription::default(),
        sets,
    }
}

fn reps_set(id: u64, reps: u32) -> WorkoutSet {
    WorkoutSet {
        id,
        reps,
        weight: 0.0,
        duration: 0,
    }
}

fn timed_set(id: u64, duration: u32) -> WorkoutSet {
    WorkoutSet {
        id,
        reps: 0,
        weight: 0.0,
        duration,
    }
}

impl Library {
    pub fn from_workouts(workouts: Vec<Workout>) -> Self {
        Self {
            workouts: workouts.into_iter().map(|w| (w.id.clone(), w)).collect(),
        }
    }

    /// Load a library from a JSON array of workouts
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let workouts: Vec<Workout> = serde_json::from_str(&contents)?;
        tracing::info!("Loaded {} workouts from {:?}", workouts.len(), path);
        Ok(Self::from_workouts(workouts))
    }

    pub fn get(&self, id: &str) -> Option<&Workout> {
        self.workouts.get(id)
    }

    /// Workouts sorted by id
    pub fn sorted(&self) -> Vec<&Workout> {
        let mut workouts: Vec<_> = self.workouts.values().collect();
        workouts.sort_by(|a, b| a.id.cmp(&b.id));
        workouts
    }

    /// Validate the library for consistency
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (id, workout) in &self.workouts {
            if id.is_empty() || workout.id.is_empty() {
                errors.push("Workout has empty ID".to_string());
            }
            if id != &workout.id {
                errors.push(format!(
                    "Workout key '{}' doesn't match workout.id '{}'",
                    id, workout.id
                ));
            }
            if workout.name.is_empty() {
                errors.push(format!("Workout '{}' has empty name", id));
            }

            let mut seen = HashSet::new();
            for exercise in &workout.exercises {
                if !seen.insert(exercise.id.as_str()) {
                    errors.push(format!(
                        "Workout '{}' lists exercise '{}' more than once",
                        id, exercise.id
                    ));
                }
                if exercise.name.is_empty() {
                    errors.push(format!(
                        "Workout '{}': exercise '{}' has empty name",
                        id, exercise.id
                    ));
                }

                if exercise.auto_increase {
                    if exercise.kind == ExerciseType::Duration
                        && exercise.prescription.current_duration.unwrap_or(0) == 0
                    {
                        errors.push(format!(
                            "Workout '{}': timed exercise '{}' has no current duration",
                            id, exercise.id
                        ));
                    }
                } else if exercise.kind == ExerciseType::Duration {
                    for set in exercise.sets.iter().filter(|s| s.duration == 0) {
                        errors.push(format!(
                            "Workout '{}': timed exercise '{}' set {} has no duration",
                            id, exercise.id, set.id
                        ));
                    }
                }
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_loads() {
        let library = build_default_library();
        assert_eq!(library.workouts.len(), 3);
        assert!(library.get("full_body").is_some());
    }

    #[test]
    fn test_default_library_validates() {
        let library = build_default_library();
        let errors = library.validate();
        assert!(errors.is_empty(), "Validation errors: {:?}", errors);
    }

    #[test]
    fn test_cached_library_matches_built() {
        assert_eq!(
            get_default_library().workouts.len(),
            build_default_library().workouts.len()
        );
    }

    #[test]
    fn test_sorted_by_id() {
        let library = build_default_library();
        let ids: Vec<_> = library.sorted().iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, vec!["core_quick", "full_body", "upper"]);
    }

    #[test]
    fn test_validate_flags_problems() {
        let mut library = build_default_library();
        let mut workout = library.workouts["core_quick"].clone();
        workout.exercises.push(workout.exercises[0].clone());
        workout.exercises[0].sets[0].duration = 0;
        library.workouts.insert("renamed".into(), workout);

        let errors = library.validate();

        assert!(errors.iter().any(|e| e.contains("doesn't match")));
        assert!(errors.iter().any(|e| e.contains("more than once")));
        assert!(errors.iter().any(|e| e.contains("has no duration")));
    }

    #[test]
    fn test_load_from_json() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("workouts.json");
        std::fs::write(
            &path,
            r#"[{
                "id": "legs",
                "name": "Legs",
                "rest": 90,
                "exercises": [{
                    "id": "squat",
                    "name": "Squat",
                    "type": "WEIGHTS",
                    "rest": 120,
                    "autoIncrease": true,
                    "autoIncreaseCurrentSets": 5,
                    "autoIncreaseCurrentReps": 5,
                    "autoIncreaseCurrentWeight": 100.0
                }]
            }]"#,
        )
        .unwrap();

        let library = Library::load_from(&path).unwrap();

        let squat = &library.get("legs").unwrap().exercises[0];
        assert_eq!(squat.id, "squat");
        assert_eq!(squat.rest, 120);
        assert!(library.validate().is_empty());
    }
}
