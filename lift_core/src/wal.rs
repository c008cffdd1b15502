//! Write-Ahead Log (WAL) for finished workout sessions.
//!
//! Sessions are appended to a JSONL (JSON Lines) file with file locking
//! to ensure safe concurrent access.

use crate::{Error, Result, WorkoutSession};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Seek, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Session sink trait for persisting sessions
pub trait SessionSink {
    fn append(&mut self, session: &WorkoutSession) -> Result<()>;
}

/// JSONL-based session sink with file locking
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl SessionSink for JsonlSink {
    fn append(&mut self, session: &WorkoutSession) -> Result<()> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(session)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        file.unlock()?;

        tracing::debug!("Appended session {} to WAL", session.id);
        Ok(())
    }
}

/// Read all sessions from a WAL file
///
/// Lines that fail to parse are skipped with a warning.
pub fn read_sessions(path: &Path) -> Result<Vec<WorkoutSession>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut sessions = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<WorkoutSession>(&line) {
            Ok(session) => sessions.push(session),
            Err(e) => {
                tracing::warn!("Failed to parse session at line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} sessions from WAL", sessions.len());
    Ok(sessions)
}

/// Remove one session from the WAL, returning it
///
/// The file is rewritten under an exclusive lock. Unparseable lines are
/// kept as they are.
pub fn remove_session(path: &Path, id: Uuid) -> Result<WorkoutSession> {
    let not_found = || Error::NotFound(format!("session {}", id));
    if !path.exists() {
        return Err(not_found());
    }

    let file = OpenOptions::new().read(true).write(true).open(path)?;
    file.lock_exclusive()?;

    let mut kept = Vec::new();
    let mut removed = None;
    for line in BufReader::new(&file).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<WorkoutSession>(&line) {
            Ok(session) if session.id == id && removed.is_none() => removed = Some(session),
            _ => kept.push(line),
        }
    }

    let Some(session) = removed else {
        file.unlock()?;
        return Err(not_found());
    };

    file.set_len(0)?;
    (&file).rewind()?;
    {
        let mut writer = std::io::BufWriter::new(&file);
        for line in &kept {
            writer.write_all(line.as_bytes())?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
    }
    file.sync_all()?;
    file.unlock()?;

    tracing::info!("Removed session {} from WAL", id);
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn create_test_session() -> WorkoutSession {
        WorkoutSession {
            id: Uuid::new_v4(),
            routine_id: "day_a".into(),
            program_id: Some("main".into()),
            started_at: Utc::now(),
            completed_at: Some(Utc::now()),
            exercises: vec![],
        }
    }

    #[test]
    fn test_append_and_read_single_session() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("test.wal");

        let session = create_test_session();
        let session_id = session.id;

        let mut sink = JsonlSink::new(&wal_path);
        sink.append(&session).unwrap();

        let sessions = read_sessions(&wal_path).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, session_id);
        assert_eq!(sessions[0].program_id.as_deref(), Some("main"));
    }

    #[test]
    fn test_read_skips_corrupted_lines() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("test.wal");

        let mut sink = JsonlSink::new(&wal_path);
        sink.append(&create_test_session()).unwrap();
        let mut file = OpenOptions::new().append(true).open(&wal_path).unwrap();
        writeln!(file, "{{ not a session }}").unwrap();
        sink.append(&create_test_session()).unwrap();

        let sessions = read_sessions(&wal_path).unwrap();
        assert_eq!(sessions.len(), 2);
    }

    #[test]
    fn test_read_empty_wal() {
        let temp_dir = tempfile::tempdir().unwrap();
        let sessions = read_sessions(&temp_dir.path().join("nonexistent.wal")).unwrap();
        assert!(sessions.is_empty());
    }

    #[test]
    fn test_remove_session() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("test.wal");

        let mut sink = JsonlSink::new(&wal_path);
        let keep = create_test_session();
        let drop_me = create_test_session();
        sink.append(&keep).unwrap();
        sink.append(&drop_me).unwrap();

        let removed = remove_session(&wal_path, drop_me.id).unwrap();
        assert_eq!(removed.id, drop_me.id);

        let sessions = read_sessions(&wal_path).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, keep.id);
    }

    #[test]
    fn test_remove_unknown_session() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("test.wal");

        let mut sink = JsonlSink::new(&wal_path);
        sink.append(&create_test_session()).unwrap();

        let result = remove_session(&wal_path, Uuid::new_v4());
        assert!(matches!(result, Err(Error::NotFound(_))));
        assert_eq!(read_sessions(&wal_path).unwrap().len(), 1);

        let missing = remove_session(&temp_dir.path().join("none.wal"), Uuid::new_v4());
        assert!(matches!(missing, Err(Error::NotFound(_))));
    }
}
