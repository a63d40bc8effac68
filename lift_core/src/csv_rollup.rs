//! CSV rollup functionality for archiving the session journal.
//!
//! This module implements atomic WAL-to-CSV conversion with proper error handling
//! to prevent data loss. Each completed session becomes one summary row.

use crate::{Adjustment, Result, SessionRecord};
use std::fs::OpenOptions;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    id: String,
    user_id: String,
    workout_id: String,
    workout_name: String,
    started_at: Option<String>,
    completed_at: String,
    duration: Option<u32>,
    exercises: usize,
    sets_attempted: usize,
    sets_passed: usize,
    increases: usize,
    decreases: usize,
}

impl From<&SessionRecord> for CsvRow {
    fn from(session: &SessionRecord) -> Self {
        CsvRow {
            id: session.id.to_string(),
            user_id: session.user_id.clone(),
            workout_id: session.workout_id.clone(),
            workout_name: session.workout_name.clone(),
            started_at: session.started_at.map(|t| t.to_rfc3339()),
            completed_at: session.completed_at.to_rfc3339(),
            duration: session.duration_seconds(),
            exercises: session.exercises.len(),
            sets_attempted: session.sets_attempted(),
            sets_passed: session.sets_passed(),
            increases: session.adjustments(Adjustment::Increase),
            decreases: session.adjustments(Adjustment::Decrease),
        }
    }
}

/// Roll up journaled sessions into CSV and archive the WAL atomically
///
/// This function:
/// 1. Reads all sessions from the WAL
/// 2. Appends them to the CSV file (creates with headers if needed)
/// 3. Syncs the CSV to disk
/// 4. Renames the WAL to .processed
/// 5. Returns the number of sessions processed
///
/// The CSV is fsynced before the WAL is renamed, and the WAL is renamed
/// (not deleted) so it can be recovered by hand.
pub fn wal_to_csv_and_archive(wal_path: &Path, csv_path: &Path) -> Result<usize> {
    let sessions = crate::wal::read_sessions(wal_path)?;

    if sessions.is_empty() {
        tracing::info!("No sessions in WAL to roll up");
        return Ok(0);
    }

    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;

    // Only a fresh file gets a header row
    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);

    for session in &sessions {
        writer.serialize(CsvRow::from(session))?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    file.sync_all()?;

    tracing::info!("Wrote {} sessions to CSV", sessions.len());

    let processed_path = wal_path.with_extension("wal.processed");
    std::fs::rename(wal_path, &processed_path)?;

    tracing::info!("Archived WAL to {:?}", processed_path);

    Ok(sessions.len())
}

/// Clean up old processed WAL files
///
/// This removes all .wal.processed files in the given directory.
pub fn cleanup_processed_wals(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();

        if path.extension().is_some_and(|ext| ext == "processed") {
            std::fs::remove_file(&path)?;
            tracing::debug!("Removed processed WAL: {:?}", path);
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Cleaned up {} processed WAL files", count);
    }

    Ok(count)
}
