use clap::{Parser, Subcommand};
use lift_core::timer::TimerMode;
use lift_core::*;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(name = "lift")]
#[command(about = "Guided strength workout sessions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the user id from the configuration
    #[arg(long, global = true)]
    user: Option<UserId>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a guided workout session
    Start {
        /// Workout to run (see `lift list`)
        workout_id: WorkoutId,

        /// Auto-complete (for testing) - pass every set without prompting
        #[arg(long, conflicts_with = "auto_fail")]
        auto_complete: bool,

        /// Auto-fail (for testing) - fail every set without prompting
        #[arg(long, conflicts_with = "auto_complete")]
        auto_fail: bool,

        /// Length of one countdown second in milliseconds
        #[arg(long)]
        tick_millis: Option<u64>,

        /// Pass timed sets automatically when their countdown ends
        #[arg(long)]
        auto_pass_timed: bool,
    },

    /// List available workouts
    List,

    /// Show the workout streak
    Streak,

    /// Roll up journaled sessions to CSV
    Rollup {
        /// Clean up processed WAL files after rollup
        #[arg(long)]
        cleanup: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    lift_core::logging::init_with_level("warn");

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| config.data.data_dir.clone());
    let user_id = cli.user.clone().unwrap_or_else(|| config.user.id.clone());
    let store = LocalStore::new(data_dir);

    match cli.command {
        Commands::Start {
            workout_id,
            auto_complete,
            auto_fail,
            tick_millis,
            auto_pass_timed,
        } => {
            let pilot = if auto_complete {
                Some(AutoPilot::passing())
            } else if auto_fail {
                Some(AutoPilot::failing())
            } else {
                None
            };
            let mut session_config = config.session.clone();
            if let Some(millis) = tick_millis {
                session_config.tick_millis = millis;
            }
            if auto_pass_timed {
                session_config.duration_completion = DurationCompletion::AutoPass;
            }
            cmd_start(store, user_id, workout_id, pilot, &session_config).await
        }
        Commands::List => cmd_list(&store),
        Commands::Streak => cmd_streak(&store, &user_id),
        Commands::Rollup { cleanup } => cmd_rollup(&store, cleanup),
    }
}

async fn cmd_start(
    store: LocalStore,
    user_id: UserId,
    workout_id: WorkoutId,
    pilot: Option<AutoPilot>,
    session_config: &lift_core::config::SessionConfig,
) -> Result<()> {
    let context = SessionContext {
        user_id,
        workout_id: workout_id.clone(),
    };
    let options = RunnerOptions {
        tick_period: session_config.tick_period(),
        duration_completion: session_config.duration_completion,
        sink: Some(Box::new(JsonlSink::new(store.sessions_wal_path()))),
    };
    let (runner, mut errors) =
        SessionRunner::new(context, Services::from_shared(Arc::new(store)), options);

    let (tx, rx) = mpsc::channel(16);
    let mut console = Console::new(pilot.is_none());
    let mut autopilot = pilot.map(|pilot| (pilot, tx.clone()));

    // Interactive runs end when stdin closes, so only the reader keeps a sender
    if autopilot.is_none() {
        spawn_stdin_reader(tx);
    }

    let summary = runner
        .run(rx, move |view| {
            console.render(view);
            if let Some((pilot, tx)) = autopilot.as_mut() {
                if let Some(input) = pilot.next_input(view) {
                    let _ = tx.try_send(input);
                }
            }
        })
        .await;

    let mut fatal = None;
    while let Ok(error) = errors.try_recv() {
        match error {
            SessionError::Fetch { .. } => fatal = Some(error),
            other => eprintln!("warning: {}", other),
        }
    }

    if let Some(record) = &summary.record {
        print_summary(record);
    }

    match (summary.phase, fatal) {
        (Phase::Failed, Some(error)) => Err(Error::Other(error.to_string())),
        (Phase::Failed, None) => Err(Error::Other(format!(
            "failed to load workout {}",
            workout_id
        ))),
        _ => Ok(()),
    }
}

/// Feed stdin lines into the session; EOF closes the channel
fn spawn_stdin_reader(tx: mpsc::Sender<Input>) {
    std::thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            let input = match line.trim().to_lowercase().as_str() {
                "" | "y" => Input::Confirm,
                "p" => Input::Pass,
                "f" => Input::Fail,
                "s" => Input::SkipRest,
                "q" => Input::Leave,
                other => {
                    eprintln!("Unknown command: {}", other);
                    continue;
                }
            };
            if tx.blocking_send(input).is_err() {
                break;
            }
        }
    });
}

/// Prints session views to stdout
struct Console {
    interactive: bool,
    last: Option<SessionView>,
}

impl Console {
    fn new(interactive: bool) -> Self {
        Self {
            interactive,
            last: None,
        }
    }

    fn render(&mut self, view: &SessionView) {
        let same_screen = self.last.as_ref().is_some_and(|last| {
            last.phase == view.phase
                && last.exercise_number == view.exercise_number
                && last.set_number == view.set_number
        });
        self.last = Some(view.clone());

        if same_screen {
            // Countdown update
            if view.timer.is_some() {
                print!("\r  {}   ", format_clock(view.remaining));
                let _ = io::stdout().flush();
            }
            return;
        }

        match view.phase {
            Phase::Loading => println!("Loading workout..."),
            Phase::Ready => {
                println!("\n{}", view.workout_name);
                for (i, line) in view.roster.iter().enumerate() {
                    println!("  {}. {}", i + 1, line);
                }
                self.prompt("[Enter] start  [q] quit");
            }
            Phase::Active => {
                println!(
                    "\nExercise {}/{}: {}  (set {}/{})",
                    view.exercise_number,
                    view.exercise_count,
                    view.exercise_name.as_deref().unwrap_or("?"),
                    view.set_number,
                    view.set_count
                );
                if let (Some(kind), Some(target)) = (view.exercise_kind, &view.target) {
                    println!("  {}", describe_target(kind, target));
                }
                if view.timer == Some(TimerMode::Duration) {
                    println!("  {}", format_clock(view.remaining));
                }
                if view.set_number == view.set_count {
                    if let Some(next) = &view.next_exercise {
                        println!("  Next exercise: {}", next);
                    }
                }
                self.prompt("[p] pass  [f] fail  [q] quit");
            }
            Phase::Resting => {
                println!("\nRest {}", format_clock(view.remaining));
                if view.set_number == 1 {
                    if let Some(name) = &view.exercise_name {
                        println!("  Up next: {}", name);
                    }
                }
                self.prompt("[s] skip rest  [q] quit");
            }
            Phase::Completed => println!("\n✓ Workout complete!"),
            Phase::Empty => println!("\nThis workout has no exercises."),
            Phase::Failed => println!("\nCould not load the workout."),
            Phase::Closed => println!("\nSession closed."),
        }
    }

    fn prompt(&self, text: &str) {
        if self.interactive {
            println!("{}", text);
        }
    }
}

fn describe_target(kind: ExerciseType, target: &WorkoutSet) -> String {
    match kind {
        ExerciseType::Weights => format!("{} reps @ {} kg", target.reps, target.weight),
        ExerciseType::Bodyweight => format!("{} reps", target.reps),
        ExerciseType::Duration => format!("Hold for {}", format_clock(target.duration)),
    }
}

fn print_summary(record: &SessionRecord) {
    println!(
        "  Sets passed: {}/{}",
        record.sets_passed(),
        record.sets_attempted()
    );
    if let Some(seconds) = record.duration_seconds() {
        println!("  Time: {}", format_clock(seconds));
    }
    for exercise in &record.exercises {
        if let Some(adjustment) = exercise.adjustment {
            println!("  → {}: {} requested", exercise.name, adjustment);
        }
    }
}

fn cmd_list(store: &LocalStore) -> Result<()> {
    let library = store.library()?;
    let errors = library.validate();
    if !errors.is_empty() {
        eprintln!("Workout library validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::LibraryValidation("Invalid workout library".into()));
    }

    for workout in library.sorted() {
        println!(
            "{:<12} {} ({} exercises)",
            workout.id,
            workout.name,
            workout.exercises.len()
        );
    }
    Ok(())
}

fn cmd_streak(store: &LocalStore, user_id: &str) -> Result<()> {
    let streak = store.streak(user_id)?;

    println!("Current streak: {} days", streak.current);
    println!("Best streak: {} days", streak.best);
    println!("Total workouts: {}", streak.total_workouts);
    match streak.last_workout_on {
        Some(date) => println!("Last workout: {}", date),
        None => println!("Last workout: never"),
    }
    Ok(())
}

fn cmd_rollup(store: &LocalStore, cleanup: bool) -> Result<()> {
    let wal_path = store.sessions_wal_path();
    let csv_path = store.sessions_csv_path();

    if !wal_path.exists() {
        println!("No WAL file found - nothing to roll up.");
        return Ok(());
    }

    let count = lift_core::csv_rollup::wal_to_csv_and_archive(&wal_path, &csv_path)?;

    println!("✓ Rolled up {} sessions to CSV", count);
    println!("  CSV: {}", csv_path.display());

    if cleanup {
        let cleaned = lift_core::csv_rollup::cleanup_processed_wals(&store.journal_dir())?;
        if cleaned > 0 {
            println!("✓ Cleaned up {} processed WAL files", cleaned);
        }
    }

    Ok(())
}
