//! Guided workout session state machine.
//!
//! `Session` is the only thing that mutates session state. It is sans-IO:
//! every event goes in through [`Session::handle`] and comes back out as a
//! list of [`Effect`]s (fetch, ticker control, service requests) that the
//! runtime performs. Phases:
//!
//! ```text
//! Loading ──► Ready ──► Active ◄──► Resting
//!    │                    │
//!    ├──► Empty           └──► Completed
//!    └──► Failed
//! (any) ──Leave──► Closed
//! ```

use crate::error::{ServiceError, SessionError, TransitionError};
use crate::progression::{self, OutcomeLog};
use crate::sequencer::{self, Position, Step};
use crate::service::SessionContext;
use crate::timer::{Countdown, Expired, TimerMode};
use crate::{
    Adjustment, Exercise, ExerciseId, ExerciseResult, ExerciseType, SessionRecord, UserId,
    Workout, WorkoutId, WorkoutSet,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Screen phase of a session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Workout fetch in flight
    Loading,
    /// Sets materialized, waiting for the user to confirm
    Ready,
    /// A set is current; pass/fail accepted
    Active,
    /// Rest countdown running; only skip accepted
    Resting,
    /// Every set resolved
    Completed,
    /// The workout had no exercise with sets
    Empty,
    /// The workout could not be fetched
    Failed,
    /// The user left; further events are ignored
    Closed,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Phase::Completed | Phase::Empty | Phase::Failed | Phase::Closed
        )
    }
}

/// User actions
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Input {
    Confirm,
    Pass,
    Fail,
    SkipRest,
    Leave,
}

/// Everything a session reacts to
#[derive(Debug)]
pub enum Event {
    WorkoutLoaded(Result<Workout, ServiceError>),
    Input(Input),
    /// One second of wall-clock time passed
    Tick,
}

/// Work the runtime performs on the session's behalf
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    FetchWorkout(WorkoutId),
    /// (Re)start the one-second ticker
    StartTicker,
    StopTicker,
    RequestAdjustment {
        exercise_id: ExerciseId,
        adjustment: Adjustment,
    },
    RecordStreak(UserId),
    Journal(SessionRecord),
    Report(SessionError),
}

/// What happens when a DURATION set's countdown reaches zero
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DurationCompletion {
    /// Stop the countdown and wait for an explicit pass or fail
    #[default]
    AwaitInput,
    /// Record a pass and move on
    AutoPass,
}

/// Read-only snapshot for rendering
#[derive(Clone, Debug, PartialEq)]
pub struct SessionView {
    pub phase: Phase,
    pub workout_name: String,
    /// Exercise names in order, with the working weight of auto-increase weight exercises
    pub roster: Vec<String>,
    /// 1-based
    pub exercise_number: usize,
    pub exercise_count: usize,
    /// 1-based
    pub set_number: usize,
    pub set_count: usize,
    pub exercise_name: Option<String>,
    pub exercise_kind: Option<ExerciseType>,
    /// Name of the exercise after the current one
    pub next_exercise: Option<String>,
    pub target: Option<WorkoutSet>,
    pub remaining: u32,
    pub timer: Option<TimerMode>,
}

/// One guided workout session
#[derive(Debug)]
pub struct Session {
    context: SessionContext,
    duration_completion: DurationCompletion,
    phase: Phase,
    workout_name: String,
    exercises: Vec<Exercise>,
    position: Position,
    outcomes: OutcomeLog,
    countdown: Countdown,
    results: Vec<ExerciseResult>,
    started_at: Option<DateTime<Utc>>,
    streak_recorded: bool,
}

impl Session {
    pub fn new(context: SessionContext, duration_completion: DurationCompletion) -> Self {
        Self {
            context,
            duration_completion,
            phase: Phase::Loading,
            workout_name: String::new(),
            exercises: Vec::new(),
            position: Position::start(),
            outcomes: OutcomeLog::new(),
            countdown: Countdown::new(),
            results: Vec::new(),
            started_at: None,
            streak_recorded: false,
        }
    }

    /// Effects that open the session
    pub fn begin(&self) -> Vec<Effect> {
        match self.phase {
            Phase::Loading => vec![Effect::FetchWorkout(self.context.workout_id.clone())],
            _ => Vec::new(),
        }
    }

    /// Apply one event
    pub fn handle(&mut self, event: Event) -> Result<Vec<Effect>, TransitionError> {
        if self.phase == Phase::Closed {
            tracing::debug!("Ignoring {:?} after the session closed", event);
            return Ok(Vec::new());
        }

        match event {
            Event::WorkoutLoaded(result) => Ok(self.on_loaded(result)),
            Event::Tick => Ok(self.on_tick()),
            Event::Input(input) => self.on_input(input),
        }
    }

    fn on_loaded(&mut self, result: Result<Workout, ServiceError>) -> Vec<Effect> {
        if self.phase != Phase::Loading {
            tracing::debug!("Ignoring workout load in phase {:?}", self.phase);
            return Vec::new();
        }

        match result {
            Ok(workout) => {
                self.workout_name = workout.name;
                self.exercises = sequencer::materialize(workout.exercises);
                self.position = Position::start();
                self.phase = if self.exercises.is_empty() {
                    tracing::info!("Workout '{}' has no exercises with sets", self.workout_name);
                    Phase::Empty
                } else {
                    tracing::info!(
                        "Workout '{}' ready with {} exercises",
                        self.workout_name,
                        self.exercises.len()
                    );
                    Phase::Ready
                };
                Vec::new()
            }
            Err(source) => {
                tracing::warn!(
                    "Failed to load workout {}: {}",
                    self.context.workout_id,
                    source
                );
                self.phase = Phase::Failed;
                vec![Effect::Report(SessionError::Fetch {
                    workout_id: self.context.workout_id.clone(),
                    source,
                })]
            }
        }
    }

    fn on_input(&mut self, input: Input) -> Result<Vec<Effect>, TransitionError> {
        let mut effects = Vec::new();

        match (input, self.phase) {
            (Input::Leave, _) => {
                if self.countdown.is_running() {
                    self.countdown.cancel();
                    effects.push(Effect::StopTicker);
                }
                tracing::info!("Leaving session in phase {:?}", self.phase);
                self.phase = Phase::Closed;
            }
            (Input::Confirm, Phase::Ready) => {
                self.started_at = Some(Utc::now());
                self.enter_set(&mut effects);
            }
            (Input::Pass, Phase::Active) => self.record_outcome(true, &mut effects),
            (Input::Fail, Phase::Active) => self.record_outcome(false, &mut effects),
            (Input::SkipRest, Phase::Resting) => {
                if let Some(expired) = self.countdown.expire() {
                    self.on_expired(expired, &mut effects);
                }
            }
            (input, phase) => return Err(TransitionError::Rejected { input, phase }),
        }

        Ok(effects)
    }

    fn on_tick(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        if let Some(expired) = self.countdown.tick() {
            self.on_expired(expired, &mut effects);
        }
        effects
    }

    /// Shared by natural expiry and skipping
    fn on_expired(&mut self, expired: Expired, effects: &mut Vec<Effect>) {
        effects.push(Effect::StopTicker);

        match expired.mode {
            TimerMode::Rest => {
                tracing::debug!("Rest elapsed");
                self.enter_set(effects);
            }
            TimerMode::Duration => match self.duration_completion {
                DurationCompletion::AwaitInput => {
                    tracing::debug!("Timed set finished, waiting for result");
                }
                DurationCompletion::AutoPass => {
                    tracing::debug!("Timed set finished, recording pass");
                    self.record_outcome(true, effects);
                }
            },
        }
    }

    /// Make the set at the current position current
    fn enter_set(&mut self, effects: &mut Vec<Effect>) {
        self.phase = Phase::Active;

        let Some(exercise) = self.exercises.get(self.position.exercise) else {
            return;
        };
        if exercise.is_duration() {
            let seconds = exercise
                .sets
                .get(self.position.set)
                .map(|set| set.duration)
                .unwrap_or(0);
            self.countdown.arm(seconds, TimerMode::Duration);
            if self.countdown.is_running() {
                effects.push(Effect::StartTicker);
            }
        }
    }

    fn begin_rest(&mut self, seconds: u32, effects: &mut Vec<Effect>) {
        self.countdown.arm(seconds, TimerMode::Rest);
        if self.countdown.is_running() {
            self.phase = Phase::Resting;
            effects.push(Effect::StartTicker);
        } else {
            self.enter_set(effects);
        }
    }

    fn record_outcome(&mut self, passed: bool, effects: &mut Vec<Effect>) {
        if self.countdown.is_running() {
            self.countdown.cancel();
            effects.push(Effect::StopTicker);
        }

        self.outcomes.record(passed);
        tracing::debug!(
            "Set {}/{} of exercise {} {}",
            self.position.set + 1,
            self.exercises
                .get(self.position.exercise)
                .map(|e| e.sets.len())
                .unwrap_or(0),
            self.position.exercise + 1,
            if passed { "passed" } else { "failed" }
        );

        match sequencer::advance(self.position, &self.exercises) {
            Step::NextSet { position, rest } => {
                self.position = position;
                self.begin_rest(rest, effects);
            }
            Step::NextExercise { position, rest } => {
                self.close_exercise(effects);
                self.position = position;
                self.begin_rest(rest, effects);
            }
            Step::Complete => {
                self.close_exercise(effects);
                self.complete(effects);
            }
        }
    }

    /// Resolve auto-progression for the exercise being left
    fn close_exercise(&mut self, effects: &mut Vec<Effect>) {
        let Some(exercise) = self.exercises.get(self.position.exercise) else {
            return;
        };
        let adjustment = progression::resolve(exercise, &self.outcomes);
        let outcomes = self.outcomes.take();

        if let Some(adjustment) = adjustment {
            effects.push(Effect::RequestAdjustment {
                exercise_id: exercise.id.clone(),
                adjustment,
            });
        }

        self.results.push(ExerciseResult {
            exercise_id: exercise.id.clone(),
            name: exercise.name.clone(),
            outcomes,
            adjustment,
        });
    }

    fn complete(&mut self, effects: &mut Vec<Effect>) {
        self.phase = Phase::Completed;
        tracing::info!("Workout '{}' completed", self.workout_name);

        if !self.streak_recorded {
            self.streak_recorded = true;
            effects.push(Effect::RecordStreak(self.context.user_id.clone()));
        }
        effects.push(Effect::Journal(self.record()));
    }

    fn record(&self) -> SessionRecord {
        SessionRecord {
            id: Uuid::new_v4(),
            user_id: self.context.user_id.clone(),
            workout_id: self.context.workout_id.clone(),
            workout_name: self.workout_name.clone(),
            started_at: self.started_at,
            completed_at: Utc::now(),
            exercises: self.results.clone(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Outcomes recorded for the current exercise so far
    pub fn outcomes(&self) -> &[bool] {
        self.outcomes.as_slice()
    }

    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    pub fn exercises(&self) -> &[Exercise] {
        &self.exercises
    }

    /// Outcomes of the exercises already left behind
    pub fn results(&self) -> &[ExerciseResult] {
        &self.results
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn view(&self) -> SessionView {
        let exercise = self.exercises.get(self.position.exercise);

        SessionView {
            phase: self.phase,
            workout_name: self.workout_name.clone(),
            roster: self.exercises.iter().map(roster_line).collect(),
            exercise_number: self.position.exercise + 1,
            exercise_count: self.exercises.len(),
            set_number: self.position.set + 1,
            set_count: exercise.map(|e| e.sets.len()).unwrap_or(0),
            exercise_name: exercise.map(|e| e.name.clone()),
            exercise_kind: exercise.map(|e| e.kind),
            next_exercise: self
                .exercises
                .get(self.position.exercise + 1)
                .map(|e| e.name.clone()),
            target: exercise.and_then(|e| e.sets.get(self.position.set).cloned()),
            remaining: self.countdown.remaining(),
            timer: self.countdown.mode(),
        }
    }
}

fn roster_line(exercise: &Exercise) -> String {
    match (exercise.auto_increase, exercise.kind) {
        (true, ExerciseType::Weights) => format!(
            "{} - {} kg",
            exercise.name,
            exercise.prescription.current_weight.unwrap_or(0.0)
        ),
        _ => exercise.name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Prescription;

    fn context() -> SessionContext {
        SessionContext {
            user_id: "u1".into(),
            workout_id: "w1".into(),
        }
    }

    fn auto_exercise(id: &str, sets: u32, rest: u32) -> Exercise {
        Exercise {
            id: id.into(),
            name: id.to_uppercase(),
            kind: ExerciseType::Weights,
            rest,
            auto_increase: true,
            prescription: Prescription {
                current_sets: Some(sets),
                current_reps: Some(5),
                current_weight: Some(50.0),
                current_duration: None,
            },
            sets: vec![],
        }
    }

    fn manual_exercise(id: &str, kind: ExerciseType, sets: Vec<WorkoutSet>, rest: u32) -> Exercise {
        Exercise {
            id: id.into(),
            name: id.to_uppercase(),
            kind,
            rest,
            auto_increase: false,
            prescription: Prescription::default(),
            sets,
        }
    }

    fn timed_set(duration: u32) -> WorkoutSet {
        WorkoutSet {
            id: 1,
            reps: 0,
            weight: 0.0,
            duration,
        }
    }

    fn workout(exercises: Vec<Exercise>) -> Workout {
        Workout {
            id: "w1".into(),
            name: "Test Day".into(),
            rest: 120,
            exercises,
        }
    }

    fn loaded(exercises: Vec<Exercise>) -> Session {
        let mut session = Session::new(context(), DurationCompletion::AwaitInput);
        session
            .handle(Event::WorkoutLoaded(Ok(workout(exercises))))
            .unwrap();
        session
    }

    fn started(exercises: Vec<Exercise>) -> Session {
        let mut session = loaded(exercises);
        session.handle(Event::Input(Input::Confirm)).unwrap();
        session
    }

    fn input(session: &mut Session, input: Input) -> Vec<Effect> {
        session.handle(Event::Input(input)).unwrap()
    }

    fn adjustments(effects: &[Effect]) -> Vec<(ExerciseId, Adjustment)> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::RequestAdjustment {
                    exercise_id,
                    adjustment,
                } => Some((exercise_id.clone(), *adjustment)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_begin_fetches_workout() {
        let session = Session::new(context(), DurationCompletion::AwaitInput);
        assert_eq!(session.phase(), Phase::Loading);
        assert_eq!(session.begin(), vec![Effect::FetchWorkout("w1".into())]);
    }

    #[test]
    fn test_load_enters_ready() {
        let session = loaded(vec![auto_exercise("a", 2, 30)]);

        assert_eq!(session.phase(), Phase::Ready);
        assert_eq!(session.position(), Position::start());
        assert_eq!(session.exercises()[0].sets.len(), 2);
    }

    #[test]
    fn test_all_empty_exercises_enter_empty() {
        let session = loaded(vec![
            manual_exercise("a", ExerciseType::Bodyweight, vec![], 30),
            manual_exercise("b", ExerciseType::Weights, vec![], 30),
        ]);

        assert_eq!(session.phase(), Phase::Empty);
        assert!(session.exercises().is_empty());
    }

    #[test]
    fn test_fetch_failure_enters_failed_and_reports() {
        let mut session = Session::new(context(), DurationCompletion::AwaitInput);
        let effects = session
            .handle(Event::WorkoutLoaded(Err(ServiceError::NotFound("w1".into()))))
            .unwrap();

        assert_eq!(session.phase(), Phase::Failed);
        assert!(session.exercises().is_empty());
        assert_eq!(
            effects,
            vec![Effect::Report(SessionError::Fetch {
                workout_id: "w1".into(),
                source: ServiceError::NotFound("w1".into()),
            })]
        );
    }

    #[test]
    fn test_outcome_rejected_before_confirm() {
        let mut session = loaded(vec![auto_exercise("a", 2, 30)]);

        let err = session.handle(Event::Input(Input::Pass)).unwrap_err();
        assert_eq!(
            err,
            TransitionError::Rejected {
                input: Input::Pass,
                phase: Phase::Ready
            }
        );
        assert!(session.outcomes().is_empty());
    }

    #[test]
    fn test_pass_within_exercise_rests_with_exercise_rest() {
        let mut session = started(vec![auto_exercise("a", 3, 45)]);

        let effects = input(&mut session, Input::Pass);

        assert_eq!(session.phase(), Phase::Resting);
        assert_eq!(session.position(), Position { exercise: 0, set: 1 });
        assert_eq!(session.outcomes(), &[true]);
        assert_eq!(session.countdown().remaining(), 45);
        assert_eq!(effects, vec![Effect::StartTicker]);
    }

    #[test]
    fn test_fail_advances_like_pass() {
        let mut passed = started(vec![auto_exercise("a", 3, 45)]);
        let mut failed = started(vec![auto_exercise("a", 3, 45)]);

        input(&mut passed, Input::Pass);
        input(&mut failed, Input::Fail);

        assert_eq!(passed.position(), failed.position());
        assert_eq!(passed.phase(), failed.phase());
        assert_eq!(failed.outcomes(), &[false]);
    }

    #[test]
    fn test_outcome_rejected_while_resting() {
        let mut session = started(vec![auto_exercise("a", 3, 45)]);
        input(&mut session, Input::Pass);

        assert!(session.handle(Event::Input(Input::Fail)).is_err());
        assert_eq!(session.outcomes(), &[true]);
        assert_eq!(session.position(), Position { exercise: 0, set: 1 });
    }

    #[test]
    fn test_exercise_boundary_resolves_then_clears() {
        let mut session = started(vec![auto_exercise("a", 2, 45), auto_exercise("b", 2, 90)]);

        input(&mut session, Input::Pass);
        input(&mut session, Input::SkipRest);
        let effects = input(&mut session, Input::Pass);

        assert_eq!(
            adjustments(&effects),
            vec![("a".to_string(), Adjustment::Increase)]
        );
        assert!(session.outcomes().is_empty());
        assert_eq!(session.position(), Position { exercise: 1, set: 0 });
        assert_eq!(session.phase(), Phase::Resting);
        // Rest before the next exercise uses that exercise's interval
        assert_eq!(session.countdown().remaining(), 90);
    }

    #[test]
    fn test_two_exercise_scenario() {
        let mut session = started(vec![auto_exercise("a", 2, 30), auto_exercise("b", 1, 60)]);
        let mut requested = Vec::new();

        requested.extend(adjustments(&input(&mut session, Input::Pass)));
        input(&mut session, Input::SkipRest);
        requested.extend(adjustments(&input(&mut session, Input::Pass)));
        input(&mut session, Input::SkipRest);
        let last = input(&mut session, Input::Fail);
        requested.extend(adjustments(&last));

        assert_eq!(
            requested,
            vec![
                ("a".to_string(), Adjustment::Increase),
                ("b".to_string(), Adjustment::Decrease),
            ]
        );
        assert_eq!(session.phase(), Phase::Completed);
        assert!(last.contains(&Effect::RecordStreak("u1".into())));

        let record = last
            .iter()
            .find_map(|e| match e {
                Effect::Journal(record) => Some(record.clone()),
                _ => None,
            })
            .expect("journal effect");
        assert_eq!(record.sets_attempted(), 3);
        assert_eq!(record.sets_passed(), 2);
        assert!(record.started_at.is_some());
    }

    #[test]
    fn test_completed_has_no_trailing_rest() {
        let mut session = started(vec![auto_exercise("a", 1, 30)]);

        let effects = input(&mut session, Input::Pass);

        assert_eq!(session.phase(), Phase::Completed);
        assert!(!session.countdown().is_running());
        assert!(!effects.contains(&Effect::StartTicker));
    }

    #[test]
    fn test_manual_exercises_request_nothing() {
        let sets = vec![timed_set(0), timed_set(0)];
        let mut session = started(vec![manual_exercise("a", ExerciseType::Bodyweight, sets, 0)]);

        let mut effects = input(&mut session, Input::Fail);
        effects.extend(input(&mut session, Input::Pass));

        assert!(adjustments(&effects).is_empty());
        assert_eq!(session.phase(), Phase::Completed);
        assert_eq!(session.results()[0].outcomes, vec![false, true]);
    }

    #[test]
    fn test_rest_ticks_down_to_active() {
        let mut session = started(vec![auto_exercise("a", 2, 3)]);
        input(&mut session, Input::Pass);

        assert!(session.handle(Event::Tick).unwrap().is_empty());
        assert!(session.handle(Event::Tick).unwrap().is_empty());
        let effects = session.handle(Event::Tick).unwrap();

        assert_eq!(effects, vec![Effect::StopTicker]);
        assert_eq!(session.phase(), Phase::Active);
        assert_eq!(session.countdown().remaining(), 0);
    }

    #[test]
    fn test_skip_matches_natural_expiry() {
        let exercises = vec![
            auto_exercise("a", 1, 0),
            manual_exercise("b", ExerciseType::Duration, vec![timed_set(30)], 2),
        ];
        let mut skipped = started(exercises.clone());
        let mut waited = started(exercises);

        input(&mut skipped, Input::Pass);
        input(&mut waited, Input::Pass);

        let skip_effects = input(&mut skipped, Input::SkipRest);
        waited.handle(Event::Tick).unwrap();
        let tick_effects = waited.handle(Event::Tick).unwrap();

        assert_eq!(skip_effects, tick_effects);
        assert_eq!(skipped.view(), waited.view());
        assert_eq!(skipped.countdown().mode(), Some(TimerMode::Duration));
        assert_eq!(skipped.countdown().remaining(), 30);
    }

    #[test]
    fn test_duration_set_arms_countdown() {
        let mut session = loaded(vec![manual_exercise(
            "plank",
            ExerciseType::Duration,
            vec![timed_set(30), timed_set(30)],
            10,
        )]);

        let effects = input(&mut session, Input::Confirm);

        assert_eq!(session.phase(), Phase::Active);
        assert_eq!(effects, vec![Effect::StartTicker]);
        assert_eq!(session.countdown().remaining(), 30);
        assert_eq!(session.countdown().mode(), Some(TimerMode::Duration));
    }

    #[test]
    fn test_duration_zero_waits_for_input() {
        let mut session = started(vec![manual_exercise(
            "plank",
            ExerciseType::Duration,
            vec![timed_set(2), timed_set(2)],
            10,
        )]);

        session.handle(Event::Tick).unwrap();
        let effects = session.handle(Event::Tick).unwrap();

        assert_eq!(effects, vec![Effect::StopTicker]);
        assert_eq!(session.phase(), Phase::Active);
        assert!(session.outcomes().is_empty());

        input(&mut session, Input::Pass);
        assert_eq!(session.phase(), Phase::Resting);
        assert_eq!(session.position(), Position { exercise: 0, set: 1 });
    }

    #[test]
    fn test_duration_auto_pass() {
        let mut session = Session::new(context(), DurationCompletion::AutoPass);
        session
            .handle(Event::WorkoutLoaded(Ok(workout(vec![manual_exercise(
                "plank",
                ExerciseType::Duration,
                vec![timed_set(1), timed_set(1)],
                5,
            )]))))
            .unwrap();
        input(&mut session, Input::Confirm);

        let effects = session.handle(Event::Tick).unwrap();

        assert_eq!(effects, vec![Effect::StopTicker, Effect::StartTicker]);
        assert_eq!(session.phase(), Phase::Resting);
        assert_eq!(session.outcomes(), &[true]);
    }

    #[test]
    fn test_outcome_during_duration_cancels_countdown() {
        let mut session = started(vec![manual_exercise(
            "plank",
            ExerciseType::Duration,
            vec![timed_set(30)],
            10,
        )]);

        let effects = input(&mut session, Input::Fail);

        assert_eq!(effects[0], Effect::StopTicker);
        assert_eq!(session.phase(), Phase::Completed);
        assert!(!session.countdown().is_running());
    }

    #[test]
    fn test_zero_rest_goes_straight_to_active() {
        let mut session = started(vec![auto_exercise("a", 2, 0)]);

        let effects = input(&mut session, Input::Pass);

        assert!(effects.is_empty());
        assert_eq!(session.phase(), Phase::Active);
        assert_eq!(session.position(), Position { exercise: 0, set: 1 });
    }

    #[test]
    fn test_leave_stops_ticker_and_ignores_late_events() {
        let mut session = started(vec![auto_exercise("a", 2, 30)]);
        input(&mut session, Input::Pass);

        let effects = input(&mut session, Input::Leave);
        assert_eq!(effects, vec![Effect::StopTicker]);
        assert_eq!(session.phase(), Phase::Closed);

        assert!(session.handle(Event::Tick).unwrap().is_empty());
        assert!(session.handle(Event::Input(Input::SkipRest)).unwrap().is_empty());
        assert_eq!(session.phase(), Phase::Closed);
    }

    #[test]
    fn test_late_fetch_after_leave_is_noop() {
        let mut session = Session::new(context(), DurationCompletion::AwaitInput);
        input(&mut session, Input::Leave);

        let effects = session
            .handle(Event::WorkoutLoaded(Ok(workout(vec![auto_exercise("a", 2, 30)]))))
            .unwrap();

        assert!(effects.is_empty());
        assert_eq!(session.phase(), Phase::Closed);
        assert!(session.exercises().is_empty());
    }

    #[test]
    fn test_streak_recorded_once() {
        let mut session = started(vec![auto_exercise("a", 1, 30)]);

        let effects = input(&mut session, Input::Pass);
        let streaks = effects
            .iter()
            .filter(|e| matches!(e, Effect::RecordStreak(_)))
            .count();
        assert_eq!(streaks, 1);

        assert!(session.handle(Event::Input(Input::Pass)).is_err());
        assert!(session.handle(Event::Tick).unwrap().is_empty());
    }

    #[test]
    fn test_view_counters() {
        let mut session = started(vec![auto_exercise("a", 3, 30), auto_exercise("b", 1, 30)]);
        input(&mut session, Input::Pass);

        let view = session.view();
        assert_eq!(view.phase, Phase::Resting);
        assert_eq!(view.workout_name, "Test Day");
        assert_eq!((view.exercise_number, view.exercise_count), (1, 2));
        assert_eq!((view.set_number, view.set_count), (2, 3));
        assert_eq!(view.exercise_name.as_deref(), Some("A"));
        assert_eq!(view.next_exercise.as_deref(), Some("B"));
        assert_eq!(view.remaining, 30);
        assert_eq!(view.timer, Some(TimerMode::Rest));
        assert_eq!(view.roster, vec!["A - 50 kg", "B - 50 kg"]);
    }
}
