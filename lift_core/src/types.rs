//! Core domain types for the Lift training engine.
//!
//! This module defines the fundamental types used throughout the system:
//! - Exercises, barbells and the engine's exercise configuration view
//! - Set specifications and routines
//! - Programs and weekly goals
//! - Workout sessions and progression results

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::Error;

// ============================================================================
// Exercise Types
// ============================================================================

/// A barbell the user owns
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Barbell {
    pub id: String,
    pub name: String,
    pub weight: f64,
}

/// A stored exercise record
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Exercise {
    pub id: String,
    pub name: String,
    pub max_weight: f64,
    pub weight_increment: f64,
    pub auto_progression_enabled: bool,
    #[serde(default)]
    pub barbell_id: Option<String>,
}

impl Exercise {
    /// Build the engine view of this exercise.
    ///
    /// An exercise without a barbell, or pointing at an unknown barbell,
    /// gets a barbell weight of 0.
    pub fn config(&self, barbells: &[Barbell]) -> ExerciseConfig {
        let barbell_weight = self
            .barbell_id
            .as_deref()
            .and_then(|id| barbells.iter().find(|b| b.id == id))
            .map(|b| b.weight)
            .unwrap_or(0.0);

        ExerciseConfig {
            max_weight: self.max_weight,
            weight_increment: self.weight_increment,
            auto_progression_enabled: self.auto_progression_enabled,
            barbell_weight,
        }
    }
}

/// Exercise parameters the engine computes against
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExerciseConfig {
    pub max_weight: f64,
    pub weight_increment: f64,
    pub auto_progression_enabled: bool,
    /// 0 means the exercise is not performed on a barbell
    pub barbell_weight: f64,
}

impl ExerciseConfig {
    pub fn uses_barbell(&self) -> bool {
        self.barbell_weight > 0.0
    }
}

// ============================================================================
// Routine Types
// ============================================================================

/// How a set's load is expressed
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum SetWeight {
    /// Percentage of the exercise's current max
    Percentage(f64),
    /// Absolute weight
    Fixed(f64),
    /// The empty bar
    #[serde(rename = "bar")]
    BarOnly,
}

/// Template for one set within a routine
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SetSpec {
    pub weight: SetWeight,
    pub reps: u32,
    /// Rest after the set, in seconds
    #[serde(default)]
    pub rest_time: Option<u32>,
}

/// An exercise slot within a routine
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RoutineExercise {
    pub exercise_id: String,
    pub sets: Vec<SetSpec>,
}

/// Ordered list of exercises, each with ordered set specifications
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Routine {
    pub id: String,
    pub name: String,
    pub exercises: Vec<RoutineExercise>,
}

/// Plates of one denomination available to load
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct PlateEntry {
    pub weight: f64,
    /// Individual plates, consumed in pairs
    pub count: u32,
}

// ============================================================================
// Program and Goal Types
// ============================================================================

/// Whether a program cycles forever or ends after a fixed workout count
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProgramKind {
    Continuous,
    Finite,
}

/// Ordered list of routines cycled by the rotation
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Program {
    pub id: String,
    pub name: String,
    pub kind: ProgramKind,
    pub routine_ids: Vec<String>,
    #[serde(default)]
    pub current_position: u32,
    /// Required for finite programs
    #[serde(default)]
    pub total_workouts: Option<u32>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_active: bool,
}

/// Weekday indices (0 = Sunday .. 6 = Saturday) a goal expects workouts on.
///
/// Decoded once at the storage boundary; always non-empty and in range.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct ScheduledDays(BTreeSet<u8>);

impl ScheduledDays {
    pub fn new(days: impl IntoIterator<Item = u8>) -> crate::Result<Self> {
        let set: BTreeSet<u8> = days.into_iter().collect();
        if set.is_empty() {
            return Err(Error::Validation("scheduled days must not be empty".into()));
        }
        if let Some(bad) = set.iter().find(|d| **d > 6) {
            return Err(Error::Validation(format!(
                "scheduled day {} is not a weekday index (0-6)",
                bad
            )));
        }
        Ok(Self(set))
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Vec<u8>> for ScheduledDays {
    type Error = Error;

    fn try_from(days: Vec<u8>) -> crate::Result<Self> {
        Self::new(days)
    }
}

impl From<ScheduledDays> for Vec<u8> {
    fn from(days: ScheduledDays) -> Self {
        days.0.into_iter().collect()
    }
}

/// Weekly workout goal with streak tracking
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Goal {
    pub id: String,
    pub workouts_per_week: u32,
    pub scheduled_days: ScheduledDays,
    #[serde(default)]
    pub current_streak: u32,
    #[serde(default)]
    pub total_weeks: Option<u32>,
    #[serde(default)]
    pub is_active: bool,
    /// Start of the last week whose streak decision was applied
    #[serde(default)]
    pub last_evaluated_week: Option<NaiveDate>,
}

impl Goal {
    /// True once the streak has reached the goal's length in weeks
    pub fn is_achieved(&self) -> bool {
        self.total_weeks
            .map_or(false, |weeks| self.current_streak >= weeks)
    }
}

// ============================================================================
// Session Types
// ============================================================================

/// A concrete set materialized from a set spec
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionSet {
    pub target_weight: f64,
    pub target_reps: u32,
    pub percentage_of_max: Option<f64>,
    pub rest_time: Option<u32>,
    pub actual_weight: Option<f64>,
    pub actual_reps: Option<u32>,
    pub completed: bool,
}

/// One exercise within a live or finished session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionExercise {
    pub exercise_id: String,
    /// Configuration the targets were resolved against
    pub config: ExerciseConfig,
    pub sets: Vec<SessionSet>,
}

/// A workout built from a routine
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutSession {
    pub id: Uuid,
    pub routine_id: String,
    #[serde(default)]
    pub program_id: Option<String>,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    pub exercises: Vec<SessionExercise>,
}

/// Max weight change produced when a session finishes
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AutoProgressionResult {
    pub exercise_id: String,
    pub previous_max: f64,
    pub new_max: f64,
}
