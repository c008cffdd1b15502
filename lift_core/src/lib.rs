#![forbid(unsafe_code)]

//! Core domain model and training engine for Lift.
//!
//! This crate provides:
//! - Domain types (exercises, routines, programs, goals, sessions)
//! - Weight resolution and plate loadout calculation
//! - Auto-progression, program rotation and goal streaks
//! - The live workout session state machine
//! - Persistence (training data store, session WAL, CSV rollup)

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod weight;
pub mod plates;
pub mod progression;
pub mod program;
pub mod goal;
pub mod session;
pub mod store;
pub mod starter;
pub mod wal;
pub mod csv_rollup;
pub mod history;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use weight::{resolve_weight, ResolvedSet};
pub use plates::{default_plate_inventory, solve_plates, PlateSolution};
pub use progression::{apply_progressions, evaluate_progression, CompletedSet, ProgressionDecision};
pub use program::ProgramOutcome;
pub use goal::{check_and_update_streak, goal_progress, GoalProgress, StreakUpdate};
pub use session::{CompletedWorkout, RestTimer, SessionMachine, SessionState, TimerTick};
pub use store::TrainingData;
pub use starter::build_starter_data;
pub use wal::{JsonlSink, SessionSink};
pub use history::{load_sessions, SessionSummary};
