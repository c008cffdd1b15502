//! Training data persistence with file locking.
//!
//! Exercises, barbells, routines, programs, goals and the plate inventory
//! live in one JSON document. Reads take a shared lock; writes go through a
//! locked temp file that is synced and renamed over the original.

use crate::{Barbell, Error, Exercise, Goal, PlateEntry, Program, ProgramKind, Result, Routine};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Everything the user has configured
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct TrainingData {
    #[serde(default)]
    pub exercises: Vec<Exercise>,
    #[serde(default)]
    pub barbells: Vec<Barbell>,
    #[serde(default)]
    pub routines: Vec<Routine>,
    #[serde(default)]
    pub programs: Vec<Program>,
    #[serde(default)]
    pub goals: Vec<Goal>,
    #[serde(default)]
    pub plate_inventory: Vec<PlateEntry>,
}

impl TrainingData {
    /// Load training data from a file with shared locking
    ///
    /// Returns empty data if the file doesn't exist. A corrupted file is an
    /// error: it holds user-authored configuration that must not be reset.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No data file found at {:?}, starting empty", path);
            return Ok(Self::default());
        }

        let file = File::open(path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        file.unlock()?;
        read?;

        let data: TrainingData = serde_json::from_str(&contents)?;
        tracing::debug!(
            "Loaded {} exercises, {} routines, {} programs from {:?}",
            data.exercises.len(),
            data.routines.len(),
            data.programs.len(),
            path
        );
        Ok(data)
    }

    /// Save training data atomically with exclusive locking
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let temp = NamedTempFile::new_in(path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "data path missing parent")
        })?)?;

        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string_pretty(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved training data to {:?}", path);
        Ok(())
    }

    /// Load data, modify it, and save it back
    ///
    /// Nothing is written if `f` fails.
    pub fn update<F>(path: &Path, f: F) -> Result<Self>
    where
        F: FnOnce(&mut TrainingData) -> Result<()>,
    {
        let mut data = Self::load(path)?;
        f(&mut data)?;
        data.save(path)?;
        Ok(data)
    }

    pub fn exercise(&self, id: &str) -> Result<&Exercise> {
        self.exercises
            .iter()
            .find(|e| e.id == id)
            .ok_or_else(|| Error::NotFound(format!("exercise '{}'", id)))
    }

    pub fn routine(&self, id: &str) -> Result<&Routine> {
        self.routines
            .iter()
            .find(|r| r.id == id)
            .ok_or_else(|| Error::NotFound(format!("routine '{}'", id)))
    }

    pub fn program_mut(&mut self, id: &str) -> Result<&mut Program> {
        self.programs
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| Error::NotFound(format!("program '{}'", id)))
    }

    /// Check references and invariants, returning a description of each problem
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let exercise_ids: HashSet<&str> = self.exercises.iter().map(|e| e.id.as_str()).collect();
        let barbell_ids: HashSet<&str> = self.barbells.iter().map(|b| b.id.as_str()).collect();
        let routine_ids: HashSet<&str> = self.routines.iter().map(|r| r.id.as_str()).collect();

        for exercise in &self.exercises {
            if !(exercise.weight_increment > 0.0) {
                errors.push(format!(
                    "Exercise '{}' has non-positive weight increment {}",
                    exercise.id, exercise.weight_increment
                ));
            }
            if !(exercise.max_weight > 0.0) {
                errors.push(format!(
                    "Exercise '{}' has non-positive max weight {}",
                    exercise.id, exercise.max_weight
                ));
            }
            if let Some(barbell) = &exercise.barbell_id {
                if !barbell_ids.contains(barbell.as_str()) {
                    errors.push(format!(
                        "Exercise '{}' references non-existent barbell '{}'",
                        exercise.id, barbell
                    ));
                }
            }
        }

        for routine in &self.routines {
            if routine.exercises.is_empty() {
                errors.push(format!("Routine '{}' has no exercises", routine.id));
            }
            for slot in &routine.exercises {
                if !exercise_ids.contains(slot.exercise_id.as_str()) {
                    errors.push(format!(
                        "Routine '{}' references non-existent exercise '{}'",
                        routine.id, slot.exercise_id
                    ));
                }
                if slot.sets.iter().any(|s| s.reps == 0) {
                    errors.push(format!(
                        "Routine '{}' has a set of '{}' with zero reps",
                        routine.id, slot.exercise_id
                    ));
                }
            }
        }

        for program in &self.programs {
            if program.routine_ids.is_empty() {
                errors.push(format!("Program '{}' has no routines", program.id));
            }
            for routine in &program.routine_ids {
                if !routine_ids.contains(routine.as_str()) {
                    errors.push(format!(
                        "Program '{}' references non-existent routine '{}'",
                        program.id, routine
                    ));
                }
            }
            if program.kind == ProgramKind::Finite && program.total_workouts.is_none() {
                errors.push(format!(
                    "Finite program '{}' has no total workout count",
                    program.id
                ));
            }
        }

        if self.programs.iter().filter(|p| p.is_active).count() > 1 {
            errors.push("More than one program is active".to_string());
        }
        if self.goals.iter().filter(|g| g.is_active).count() > 1 {
            errors.push("More than one goal is active".to_string());
        }

        errors
    }
}
