#![forbid(unsafe_code)]

//! Core domain model and session logic for Lift guided workouts.
//!
//! This crate provides:
//! - Domain types (workouts, exercises, sets, session records)
//! - The session state machine and its countdown, sequencing and progression parts
//! - Service contracts and a tokio runtime that drives a session against them
//! - Local persistence (workout library, journals, streak state, CSV rollup)

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod timer;
pub mod sequencer;
pub mod progression;
pub mod session;
pub mod service;
pub mod runtime;
pub mod library;
pub mod store;
pub mod wal;
pub mod csv_rollup;
pub mod state;

// Re-export commonly used types
pub use error::{Error, Result, ServiceError, SessionError, TransitionError};
pub use types::*;
pub use config::Config;
pub use library::{build_default_library, get_default_library, Library};
pub use runtime::{AutoPilot, RunSummary, RunnerOptions, SessionRunner};
pub use service::{Services, SessionContext};
pub use session::{DurationCompletion, Input, Phase, Session, SessionView};
pub use store::LocalStore;
pub use timer::format_clock;
pub use wal::{JsonlSink, SessionSink};
