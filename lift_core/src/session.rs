//! Live workout session orchestration.
//!
//! A [`SessionMachine`] turns a routine into a concrete session, records
//! sets as they are logged, runs the rest timer between sets and, when the
//! workout is finished, evaluates progression and moves the linked program
//! along.
//!
//! States: `Idle -> Active -> Finished` or `Active -> Cancelled`. A new
//! session may be started from any state except `Active`.

use crate::progression::{evaluate_progression, CompletedSet};
use crate::program::{record_workout, ProgramOutcome};
use crate::weight::resolve_weight;
use crate::{
    AutoProgressionResult, Barbell, Error, Exercise, Program, Result, Routine, SessionExercise,
    SessionSet, WorkoutSession,
};
use chrono::Utc;
use uuid::Uuid;

/// Lifecycle state of the machine
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Active,
    Finished,
    Cancelled,
}

// ============================================================================
// Rest Timer
// ============================================================================

/// Result of advancing the rest timer by one second
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerTick {
    Running(u32),
    Finished,
}

/// Cooperative countdown between sets, ticked once per second by the caller
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RestTimer {
    duration_secs: u32,
    remaining_secs: u32,
}

impl RestTimer {
    pub fn new(duration_secs: u32) -> Self {
        Self {
            duration_secs,
            remaining_secs: duration_secs,
        }
    }

    pub fn tick(&mut self) -> TimerTick {
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            TimerTick::Finished
        } else {
            TimerTick::Running(self.remaining_secs)
        }
    }

    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }
}

// ============================================================================
// Session Machine
// ============================================================================

/// Everything produced by finishing a workout
#[derive(Clone, Debug)]
pub struct CompletedWorkout {
    /// The sealed session, ready to persist
    pub session: WorkoutSession,
    /// Exercises whose max should go up; the caller persists them
    pub progressions: Vec<AutoProgressionResult>,
    /// Set when the session belonged to a program
    pub program: Option<ProgramOutcome>,
}

/// Owns at most one live workout session
#[derive(Debug)]
pub struct SessionMachine {
    state: SessionState,
    session: Option<WorkoutSession>,
    current_exercise: usize,
    rest_timer: Option<RestTimer>,
}

impl Default for SessionMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionMachine {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            session: None,
            current_exercise: 0,
            rest_timer: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The live session, only while `Active`
    pub fn session(&self) -> Option<&WorkoutSession> {
        self.session.as_ref()
    }

    pub fn current_exercise(&self) -> usize {
        self.current_exercise
    }

    pub fn rest_timer(&self) -> Option<&RestTimer> {
        self.rest_timer.as_ref()
    }

    fn require_active(&self, action: &str) -> Result<()> {
        if self.state != SessionState::Active {
            return Err(Error::State(format!(
                "cannot {} while session is {:?}",
                action, self.state
            )));
        }
        Ok(())
    }

    fn active_session_mut(&mut self, action: &str) -> Result<&mut WorkoutSession> {
        self.require_active(action)?;
        self.session
            .as_mut()
            .ok_or_else(|| Error::State(format!("cannot {}: no session", action)))
    }

    /// Build a session from a routine and make it active
    ///
    /// Every set's target is resolved up front. If any exercise is missing or
    /// any set fails to resolve, nothing changes.
    pub fn start(
        &mut self,
        routine: &Routine,
        exercises: &[Exercise],
        barbells: &[Barbell],
        program_id: Option<&str>,
    ) -> Result<&WorkoutSession> {
        if self.state == SessionState::Active {
            return Err(Error::State("a session is already active".into()));
        }
        if routine.exercises.is_empty() {
            return Err(Error::NotFound(format!(
                "routine '{}' has no exercises",
                routine.id
            )));
        }

        let mut session_exercises = Vec::with_capacity(routine.exercises.len());
        for slot in &routine.exercises {
            let exercise = exercises
                .iter()
                .find(|e| e.id == slot.exercise_id)
                .ok_or_else(|| Error::NotFound(format!("exercise '{}'", slot.exercise_id)))?;
            let config = exercise.config(barbells);

            let sets = slot
                .sets
                .iter()
                .map(|spec| {
                    let resolved = resolve_weight(spec, &config)?;
                    Ok(SessionSet {
                        target_weight: resolved.target_weight,
                        target_reps: spec.reps,
                        percentage_of_max: resolved.percentage_of_max,
                        rest_time: spec.rest_time,
                        actual_weight: None,
                        actual_reps: None,
                        completed: false,
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            session_exercises.push(SessionExercise {
                exercise_id: exercise.id.clone(),
                config,
                sets,
            });
        }

        let session = WorkoutSession {
            id: Uuid::new_v4(),
            routine_id: routine.id.clone(),
            program_id: program_id.map(str::to_string),
            started_at: Utc::now(),
            completed_at: None,
            exercises: session_exercises,
        };

        tracing::info!(
            "Started session {} from routine {} ({} exercises)",
            session.id,
            routine.id,
            session.exercises.len()
        );

        self.state = SessionState::Active;
        self.current_exercise = 0;
        self.rest_timer = None;
        Ok(self.session.insert(session))
    }

    /// Log a set and start its rest countdown
    ///
    /// A set with a positive rest time replaces any running timer.
    pub fn complete_set(
        &mut self,
        exercise_idx: usize,
        set_idx: usize,
        actual_weight: f64,
        actual_reps: u32,
    ) -> Result<()> {
        let session = self.active_session_mut("complete a set")?;
        let set = session
            .exercises
            .get_mut(exercise_idx)
            .and_then(|e| e.sets.get_mut(set_idx))
            .ok_or_else(|| {
                Error::Validation(format!(
                    "no set {} for exercise {}",
                    set_idx, exercise_idx
                ))
            })?;

        set.actual_weight = Some(actual_weight);
        set.actual_reps = Some(actual_reps);
        set.completed = true;
        let rest = set.rest_time.unwrap_or(0);

        tracing::debug!(
            "Completed set {}/{}: {} x {}",
            exercise_idx,
            set_idx,
            actual_weight,
            actual_reps
        );

        if rest > 0 {
            self.rest_timer = Some(RestTimer::new(rest));
        }
        Ok(())
    }

    /// Advance the rest timer by one second; the timer is dropped once done
    pub fn tick_rest_timer(&mut self) -> Option<TimerTick> {
        let tick = self.rest_timer.as_mut()?.tick();
        if tick == TimerTick::Finished {
            self.rest_timer = None;
        }
        Some(tick)
    }

    pub fn skip_rest_timer(&mut self) {
        if self.rest_timer.take().is_some() {
            tracing::debug!("Rest timer skipped");
        }
    }

    /// Move the exercise pointer; set data is untouched
    pub fn set_current_exercise(&mut self, index: usize) -> Result<()> {
        let len = self
            .active_session_mut("change exercise")?
            .exercises
            .len();
        if index >= len {
            return Err(Error::Validation(format!(
                "exercise index {} out of range (0..{})",
                index, len
            )));
        }
        self.current_exercise = index;
        Ok(())
    }

    /// Seal the session, evaluate progression and count it against the program
    ///
    /// A linked program that has already reached its total is marked complete;
    /// otherwise it advances.
    ///
    /// `program` must be the session's linked program when it has one. On
    /// error the session stays active and nothing is modified.
    pub fn complete_workout(&mut self, program: Option<&mut Program>) -> Result<CompletedWorkout> {
        let session = self.active_session_mut("finish workout")?;

        let progressions: Vec<AutoProgressionResult> = session
            .exercises
            .iter()
            .filter_map(|exercise| {
                let sets: Vec<CompletedSet> = exercise.sets.iter().map(CompletedSet::from).collect();
                let decision = evaluate_progression(&exercise.config, &sets);
                decision.should_progress.then(|| AutoProgressionResult {
                    exercise_id: exercise.exercise_id.clone(),
                    previous_max: exercise.config.max_weight,
                    new_max: decision.new_max_weight,
                })
            })
            .collect();

        let now = Utc::now();
        let outcome = match (session.program_id.as_deref(), program) {
            (None, _) => None,
            (Some(id), Some(program)) if program.id == id => Some(record_workout(program, now)?),
            (Some(id), _) => {
                return Err(Error::NotFound(format!("program '{}'", id)));
            }
        };

        session.completed_at = Some(now);
        let session = self
            .session
            .take()
            .ok_or_else(|| Error::State("cannot finish workout: no session".into()))?;
        self.state = SessionState::Finished;
        self.rest_timer = None;
        self.current_exercise = 0;

        tracing::info!(
            "Finished session {}: {} exercises progressed",
            session.id,
            progressions.len()
        );

        Ok(CompletedWorkout {
            session,
            progressions,
            program: outcome,
        })
    }

    /// Throw the session away without any side effects
    pub fn cancel_workout(&mut self) -> Result<()> {
        let id = self.active_session_mut("cancel workout")?.id;
        self.session = None;
        self.state = SessionState::Cancelled;
        self.rest_timer = None;
        self.current_exercise = 0;
        tracing::info!("Cancelled session {}", id);
        Ok(())
    }
}
