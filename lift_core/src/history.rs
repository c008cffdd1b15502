//! Workout history across the WAL and the CSV archive.
//!
//! Archived sessions only survive as per-set CSV rows, so history is exposed
//! as lightweight summaries rather than full sessions.

use crate::csv_rollup::CsvRow;
use crate::{Result, WorkoutSession};
use chrono::{DateTime, Utc};
use csv::ReaderBuilder;
use std::collections::HashSet;
use std::path::Path;
use uuid::Uuid;

/// What history needs to know about a finished session
#[derive(Clone, Debug, PartialEq)]
pub struct SessionSummary {
    pub id: Uuid,
    pub routine_id: String,
    pub program_id: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<&WorkoutSession> for SessionSummary {
    fn from(session: &WorkoutSession) -> Self {
        Self {
            id: session.id,
            routine_id: session.routine_id.clone(),
            program_id: session.program_id.clone(),
            completed_at: session.completed_at,
        }
    }
}

fn summary_from_row(row: CsvRow) -> Result<SessionSummary> {
    let id = Uuid::parse_str(&row.session_id)
        .map_err(|e| crate::Error::Validation(format!("Invalid UUID: {}", e)))?;

    let completed_at = row
        .completed_at
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc));

    Ok(SessionSummary {
        id,
        routine_id: row.routine_id,
        program_id: row.program_id,
        completed_at,
    })
}

/// Load every known session from both WAL and CSV
///
/// Sorted newest first; sessions present in both sources appear once.
pub fn load_sessions(wal_path: &Path, csv_path: &Path) -> Result<Vec<SessionSummary>> {
    let mut sessions = Vec::new();
    let mut seen_ids = HashSet::new();

    if wal_path.exists() {
        for session in crate::wal::read_sessions(wal_path)? {
            if seen_ids.insert(session.id) {
                sessions.push(SessionSummary::from(&session));
            }
        }
        tracing::debug!("Loaded {} sessions from WAL", sessions.len());
    }

    if csv_path.exists() {
        let mut csv_count = 0;
        for summary in load_sessions_from_csv(csv_path)? {
            if seen_ids.insert(summary.id) {
                sessions.push(summary);
                csv_count += 1;
            }
        }
        tracing::debug!("Loaded {} sessions from CSV", csv_count);
    }

    sessions.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));

    tracing::info!("Loaded {} total sessions", sessions.len());
    Ok(sessions)
}

fn load_sessions_from_csv(path: &Path) -> Result<Vec<SessionSummary>> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;

    let mut sessions = Vec::new();
    for result in reader.deserialize::<CsvRow>() {
        match result {
            Ok(row) => match summary_from_row(row) {
                Ok(summary) => sessions.push(summary),
                Err(e) => tracing::warn!("Failed to parse CSV row: {}", e),
            },
            Err(e) => tracing::warn!("Failed to deserialize CSV row: {}", e),
        }
    }

    Ok(sessions)
}
