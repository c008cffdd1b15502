//! CSV rollup functionality for archiving WAL sessions.
//!
//! Each logged set becomes one CSV row. The CSV is synced before the WAL is
//! renamed, so a crash between the two steps never loses a session.

use crate::{Result, WorkoutSession};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct CsvRow {
    pub session_id: String,
    pub routine_id: String,
    pub program_id: Option<String>,
    pub started_at: String,
    pub completed_at: Option<String>,
    pub exercise_id: String,
    pub set_index: usize,
    pub target_weight: f64,
    pub target_reps: u32,
    pub percentage_of_max: Option<f64>,
    pub actual_weight: Option<f64>,
    pub actual_reps: Option<u32>,
    pub completed: bool,
}

fn rows_for(session: &WorkoutSession) -> impl Iterator<Item = CsvRow> + '_ {
    session.exercises.iter().flat_map(move |exercise| {
        exercise.sets.iter().enumerate().map(move |(index, set)| CsvRow {
            session_id: session.id.to_string(),
            routine_id: session.routine_id.clone(),
            program_id: session.program_id.clone(),
            started_at: session.started_at.to_rfc3339(),
            completed_at: session.completed_at.map(|t| t.to_rfc3339()),
            exercise_id: exercise.exercise_id.clone(),
            set_index: index,
            target_weight: set.target_weight,
            target_reps: set.target_reps,
            percentage_of_max: set.percentage_of_max,
            actual_weight: set.actual_weight,
            actual_reps: set.actual_reps,
            completed: set.completed,
        })
    })
}

/// Roll up WAL sessions into CSV and archive the WAL
///
/// Returns the number of sessions processed. The WAL is renamed to
/// `.wal.processed` rather than deleted.
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

    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);

    let mut rows = 0;
    for session in &sessions {
        for row in rows_for(session) {
            writer.serialize(row)?;
            rows += 1;
        }
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    file.sync_all()?;

    tracing::info!("Wrote {} sessions ({} sets) to CSV", sessions.len(), rows);

    let processed_path = wal_path.with_extension("wal.processed");
    std::fs::rename(wal_path, &processed_path)?;

    tracing::info!("Archived WAL to {:?}", processed_path);

    Ok(sessions.len())
}

/// Clean up old processed WAL files
pub fn cleanup_processed_wals(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();

        if path.extension().map_or(false, |ext| ext == "processed") {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wal::{JsonlSink, SessionSink};
    use crate::{ExerciseConfig, SessionExercise, SessionSet};
    use chrono::Utc;
    use std::fs::File;
    use uuid::Uuid;

    fn create_test_session(sets: usize) -> WorkoutSession {
        let set = SessionSet {
            target_weight: 135.0,
            target_reps: 5,
            percentage_of_max: Some(60.0),
            rest_time: Some(90),
            actual_weight: Some(135.0),
            actual_reps: Some(5),
            completed: true,
        };
        WorkoutSession {
            id: Uuid::new_v4(),
            routine_id: "day_a".into(),
            program_id: None,
            started_at: Utc::now(),
            completed_at: Some(Utc::now()),
            exercises: vec![SessionExercise {
                exercise_id: "squat".into(),
                config: ExerciseConfig {
                    max_weight: 225.0,
                    weight_increment: 5.0,
                    auto_progression_enabled: true,
                    barbell_weight: 45.0,
                },
                sets: vec![set; sets],
            }],
        }
    }

    #[test]
    fn test_wal_to_csv_writes_one_row_per_set() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("sessions.wal");
        let csv_path = temp_dir.path().join("sessions.csv");

        let mut sink = JsonlSink::new(&wal_path);
        sink.append(&create_test_session(3)).unwrap();
        sink.append(&create_test_session(2)).unwrap();

        let count = wal_to_csv_and_archive(&wal_path, &csv_path).unwrap();
        assert_eq!(count, 2);

        let reader = csv::Reader::from_path(&csv_path).unwrap();
        assert_eq!(reader.into_records().count(), 5);

        assert!(!wal_path.exists());
        assert!(wal_path.with_extension("wal.processed").exists());
    }

    #[test]
    fn test_wal_to_csv_appends_without_repeating_headers() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("sessions.wal");
        let csv_path = temp_dir.path().join("sessions.csv");

        let mut sink = JsonlSink::new(&wal_path);
        sink.append(&create_test_session(1)).unwrap();
        wal_to_csv_and_archive(&wal_path, &csv_path).unwrap();

        let mut sink = JsonlSink::new(&wal_path);
        sink.append(&create_test_session(1)).unwrap();
        wal_to_csv_and_archive(&wal_path, &csv_path).unwrap();

        let contents = std::fs::read_to_string(&csv_path).unwrap();
        assert_eq!(contents.matches("session_id").count(), 1);
        assert_eq!(contents.lines().count(), 3);
    }

    #[test]
    fn test_empty_wal() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("empty.wal");
        let csv_path = temp_dir.path().join("sessions.csv");

        File::create(&wal_path).unwrap();

        let count = wal_to_csv_and_archive(&wal_path, &csv_path).unwrap();
        assert_eq!(count, 0);
        assert!(!csv_path.exists());
    }

    #[test]
    fn test_cleanup_processed_wals() {
        let temp_dir = tempfile::tempdir().unwrap();

        File::create(temp_dir.path().join("s1.wal.processed")).unwrap();
        File::create(temp_dir.path().join("s2.wal.processed")).unwrap();
        File::create(temp_dir.path().join("keep.wal")).unwrap();

        let count = cleanup_processed_wals(temp_dir.path()).unwrap();
        assert_eq!(count, 2);
        assert!(temp_dir.path().join("keep.wal").exists());
    }
}
