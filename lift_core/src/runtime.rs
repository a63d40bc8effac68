//! Tokio driver for a [`Session`].
//!
//! The runner owns the session and is the only caller of
//! [`Session::handle`]. User input, ticker ticks, the workout fetch result and
//! background request completions all arrive on one `select!` loop, so the
//! state machine sees exactly one event at a time.

use crate::error::SessionError;
use crate::progression;
use crate::service::{ServiceResult, Services, SessionContext};
use crate::session::{DurationCompletion, Effect, Event, Input, Phase, Session, SessionView};
use crate::timer::TimerMode;
use crate::wal::SessionSink;
use crate::{SessionRecord, Workout};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle, JoinSet};

/// Cancellable one-second scheduler.
///
/// Every `start` spawns a fresh interval task tagged with a new generation
/// number; ticks carrying an older generation are stale and must be dropped
/// by the receiver.
#[derive(Debug)]
pub struct Ticker {
    period: Duration,
    generation: u64,
    task: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            generation: 0,
            task: None,
        }
    }

    pub fn start(&mut self, ticks: mpsc::UnboundedSender<u64>) {
        self.cancel();
        self.generation += 1;

        let generation = self.generation;
        let period = self.period;
        self.task = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // First tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                if ticks.send(generation).is_err() {
                    break;
                }
            }
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Runner settings
pub struct RunnerOptions {
    pub tick_period: Duration,
    pub duration_completion: DurationCompletion,
    /// Where completed sessions are journaled
    pub sink: Option<Box<dyn SessionSink>>,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            tick_period: Duration::from_secs(1),
            duration_completion: DurationCompletion::default(),
            sink: None,
        }
    }
}

/// How a run ended
#[derive(Clone, Debug, PartialEq)]
pub struct RunSummary {
    pub phase: Phase,
    /// Present when the workout was completed
    pub record: Option<SessionRecord>,
}

enum Wake {
    Event(Event),
    Background(Result<Result<(), SessionError>, JoinError>),
    StaleTick,
}

pub struct SessionRunner {
    session: Session,
    services: Services,
    sink: Option<Box<dyn SessionSink>>,
    ticker: Ticker,
    tick_tx: mpsc::UnboundedSender<u64>,
    tick_rx: mpsc::UnboundedReceiver<u64>,
    loaded_tx: mpsc::UnboundedSender<ServiceResult<Workout>>,
    loaded_rx: mpsc::UnboundedReceiver<ServiceResult<Workout>>,
    fetch: Option<JoinHandle<()>>,
    background: JoinSet<Result<(), SessionError>>,
    errors: mpsc::UnboundedSender<SessionError>,
    record: Option<SessionRecord>,
}

impl SessionRunner {
    /// Create a runner and the receiving end of its error channel
    pub fn new(
        context: SessionContext,
        services: Services,
        options: RunnerOptions,
    ) -> (Self, mpsc::UnboundedReceiver<SessionError>) {
        let (errors, errors_rx) = mpsc::unbounded_channel();
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();
        let (loaded_tx, loaded_rx) = mpsc::unbounded_channel();

        let runner = Self {
            session: Session::new(context, options.duration_completion),
            services,
            sink: options.sink,
            ticker: Ticker::new(options.tick_period),
            tick_tx,
            tick_rx,
            loaded_tx,
            loaded_rx,
            fetch: None,
            background: JoinSet::new(),
            errors,
            record: None,
        };
        (runner, errors_rx)
    }

    /// Drive the session until it reaches a terminal phase.
    ///
    /// `render` is called with the initial view and again whenever the view
    /// changes. A closed input channel counts as leaving.
    pub async fn run<R>(mut self, mut inputs: mpsc::Receiver<Input>, mut render: R) -> RunSummary
    where
        R: FnMut(&SessionView),
    {
        let effects = self.session.begin();
        self.apply(effects);

        let mut last_view = self.session.view();
        render(&last_view);

        let mut inputs_open = true;
        while !self.session.phase().is_terminal() {
            let wake = tokio::select! {
                input = inputs.recv(), if inputs_open => match input {
                    Some(input) => Wake::Event(Event::Input(input)),
                    None => {
                        tracing::debug!("Input channel closed, leaving session");
                        inputs_open = false;
                        Wake::Event(Event::Input(Input::Leave))
                    }
                },
                Some(result) = self.loaded_rx.recv() => Wake::Event(Event::WorkoutLoaded(result)),
                Some(generation) = self.tick_rx.recv() => {
                    if generation == self.ticker.generation() && self.ticker.is_running() {
                        Wake::Event(Event::Tick)
                    } else {
                        Wake::StaleTick
                    }
                }
                Some(joined) = self.background.join_next(), if !self.background.is_empty() => {
                    Wake::Background(joined)
                }
            };

            match wake {
                Wake::Event(event) => match self.session.handle(event) {
                    Ok(effects) => self.apply(effects),
                    Err(e) => tracing::warn!("{}", e),
                },
                Wake::Background(joined) => self.on_background(joined),
                Wake::StaleTick => continue,
            }

            let view = self.session.view();
            if view != last_view {
                render(&view);
                last_view = view;
            }
        }

        self.ticker.cancel();
        if let Some(fetch) = self.fetch.take() {
            fetch.abort();
        }

        while let Some(joined) = self.background.join_next().await {
            self.on_background(joined);
        }

        tracing::info!("Session ended in phase {:?}", self.session.phase());
        RunSummary {
            phase: self.session.phase(),
            record: self.record.take(),
        }
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::FetchWorkout(workout_id) => {
                    let workouts = self.services.workouts.clone();
                    let loaded = self.loaded_tx.clone();
                    self.fetch = Some(tokio::spawn(async move {
                        let result = workouts.fetch_workout(&workout_id).await;
                        let _ = loaded.send(result);
                    }));
                }
                Effect::StartTicker => self.ticker.start(self.tick_tx.clone()),
                Effect::StopTicker => self.ticker.cancel(),
                Effect::RequestAdjustment {
                    exercise_id,
                    adjustment,
                } => {
                    let exercises = self.services.exercises.clone();
                    self.background.spawn(async move {
                        let result =
                            progression::request(exercises.as_ref(), &exercise_id, adjustment)
                                .await;
                        result.map_err(|source| SessionError::Progression {
                            exercise_id,
                            adjustment,
                            source,
                        })
                    });
                }
                Effect::RecordStreak(user_id) => {
                    let users = self.services.users.clone();
                    self.background.spawn(async move {
                        let result = users.record_streak_progress(&user_id).await;
                        result.map_err(|source| SessionError::Streak { user_id, source })
                    });
                }
                Effect::Journal(record) => {
                    if let Some(sink) = self.sink.as_mut() {
                        if let Err(e) = sink.append(&record) {
                            self.report(SessionError::Journal(e.to_string()));
                        }
                    }
                    self.record = Some(record);
                }
                Effect::Report(error) => self.report(error),
            }
        }
    }

    fn on_background(&mut self, joined: Result<Result<(), SessionError>, JoinError>) {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(error)) => self.report(error),
            Err(e) if e.is_cancelled() => {}
            Err(e) => self.report(SessionError::Panicked(e.to_string())),
        }
    }

    fn report(&self, error: SessionError) {
        tracing::warn!("{}", error);
        let _ = self.errors.send(error);
    }
}

/// Scripted user that resolves every set the same way.
///
/// Feeds at most one input per screen, so repeated renders of the same set
/// do not record extra outcomes. A running duration countdown is left to
/// finish; the set is resolved once it reaches zero, unless the session
/// already passed it on expiry.
#[derive(Debug)]
pub struct AutoPilot {
    outcome: Input,
    last: Option<(Phase, usize, usize)>,
}

impl AutoPilot {
    pub fn passing() -> Self {
        Self {
            outcome: Input::Pass,
            last: None,
        }
    }

    pub fn failing() -> Self {
        Self {
            outcome: Input::Fail,
            last: None,
        }
    }

    pub fn next_input(&mut self, view: &SessionView) -> Option<Input> {
        let input = match view.phase {
            Phase::Ready => Input::Confirm,
            Phase::Active if view.timer == Some(TimerMode::Duration) => return None,
            Phase::Active => self.outcome,
            _ => return None,
        };

        let key = (view.phase, view.exercise_number, view.set_number);
        if self.last == Some(key) {
            return None;
        }
        self.last = Some(key);
        Some(input)
    }
}
