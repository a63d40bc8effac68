//! User streak state persistence with file locking.
//!
//! This module handles saving and loading per-user streak bookkeeping
//! with proper file locking to prevent concurrent access issues.

use crate::{Error, Result, UserId};
use chrono::{Days, NaiveDate};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Workout streak of one user
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct StreakState {
    /// Consecutive days with a completed workout
    pub current: u32,
    pub best: u32,
    pub last_workout_on: Option<NaiveDate>,
    pub total_workouts: u32,
}

impl StreakState {
    /// Count a completed workout on `today`
    ///
    /// A second workout on the same day keeps the streak, a workout the day
    /// after the last one extends it, any longer gap restarts it.
    pub fn record_workout(&mut self, today: NaiveDate) {
        self.total_workouts += 1;

        let yesterday = today.checked_sub_days(Days::new(1));
        match self.last_workout_on {
            Some(last) if last == today => {
                tracing::debug!("Workout already counted today, streak stays {}", self.current);
                return;
            }
            Some(last) if Some(last) == yesterday => self.current += 1,
            _ => self.current = 1,
        }

        self.last_workout_on = Some(today);
        self.best = self.best.max(self.current);
    }
}

/// Persistent per-user state
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct UserState {
    pub streaks: HashMap<UserId, StreakState>,
}

impl UserState {
    /// Load user state from a file with shared locking
    ///
    /// Returns default state if file doesn't exist.
    /// If file is corrupted, logs a warning and returns default state.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No state file found, using default state");
            return Ok(Self::default());
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(
                    "Unable to open state file {:?}: {}. Using defaults.",
                    path,
                    e
                );
                return Ok(Self::default());
            }
        };

        if let Err(e) = file.lock_shared() {
            tracing::warn!(
                "Unable to lock state file {:?}: {}. Using defaults.",
                path,
                e
            );
            return Ok(Self::default());
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            tracing::warn!(
                "Failed to read state file {:?}: {}. Using defaults.",
                path,
                e
            );
            return Ok(Self::default());
        }

        file.unlock()?;

        match serde_json::from_str::<UserState>(&contents) {
            Ok(state) => {
                tracing::debug!("Loaded user state from {:?}", path);
                Ok(state)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to parse state file {:?}: {}. Using defaults.",
                    path,
                    e
                );
                Ok(Self::default())
            }
        }
    }

    /// Save user state to a file
    ///
    /// Atomically writes state by:
    /// 1. Writing to a temp file
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    ///
    /// Concurrent read-modify-write cycles must go through [`UserState::update`].
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = state_dir(path)?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved user state to {:?}", path);
        Ok(())
    }

    /// Load state, modify it, and save it back
    ///
    /// Holds an exclusive lock on `<path>.lock` for the whole cycle, so
    /// writers in other threads or processes cannot interleave.
    pub fn update<F>(path: &Path, f: F) -> Result<Self>
    where
        F: FnOnce(&mut UserState) -> Result<()>,
    {
        std::fs::create_dir_all(state_dir(path)?)?;
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(lock_path(path))?;
        lock.lock_exclusive()?;

        let result = Self::load(path).and_then(|mut state| {
            f(&mut state)?;
            state.save(path)?;
            Ok(state)
        });

        lock.unlock()?;
        result
    }

    pub fn streak(&self, user_id: &str) -> StreakState {
        self.streaks.get(user_id).cloned().unwrap_or_default()
    }
}

fn state_dir(path: &Path) -> Result<&Path> {
    path.parent()
        .ok_or_else(|| Error::State(format!("state path {:?} has no parent", path)))
}

/// Sidecar that serializes updates of the state file at `path`
fn lock_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}
