//! Auto-progression of an exercise's max weight.
//!
//! An exercise progresses when every set of the session was completed with
//! at least the target reps. One missed rep or skipped set holds the max.

use crate::{AutoProgressionResult, Exercise, ExerciseConfig, SessionSet};

/// The parts of a logged set progression looks at
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompletedSet {
    pub percentage_of_max: Option<f64>,
    pub target_reps: u32,
    pub actual_reps: Option<u32>,
    pub completed: bool,
}

impl From<&SessionSet> for CompletedSet {
    fn from(set: &SessionSet) -> Self {
        Self {
            percentage_of_max: set.percentage_of_max,
            target_reps: set.target_reps,
            actual_reps: set.actual_reps,
            completed: set.completed,
        }
    }
}

impl CompletedSet {
    fn met_target(&self) -> bool {
        self.completed && self.actual_reps.map_or(false, |reps| reps >= self.target_reps)
    }
}

/// Outcome of evaluating one exercise
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProgressionDecision {
    pub should_progress: bool,
    pub new_max_weight: f64,
}

/// Decide whether an exercise's max goes up after a session
///
/// Pure: the same input always yields the same decision. Applying the new
/// max exactly once is the caller's job. An exercise with no logged sets
/// does not progress.
pub fn evaluate_progression(exercise: &ExerciseConfig, sets: &[CompletedSet]) -> ProgressionDecision {
    let should_progress = exercise.auto_progression_enabled
        && !sets.is_empty()
        && sets.iter().all(CompletedSet::met_target);

    let new_max_weight = if should_progress {
        exercise.max_weight + exercise.weight_increment
    } else {
        exercise.max_weight
    };

    tracing::debug!(
        "Progression over {} sets: progress={}, max {} -> {}",
        sets.len(),
        should_progress,
        exercise.max_weight,
        new_max_weight
    );

    ProgressionDecision {
        should_progress,
        new_max_weight,
    }
}

/// Write progression results onto the stored exercises
///
/// Returns how many exercises were updated. Results for unknown exercise
/// ids are skipped with a warning.
pub fn apply_progressions(exercises: &mut [Exercise], results: &[AutoProgressionResult]) -> usize {
    let mut applied = 0;
    for result in results {
        match exercises.iter_mut().find(|e| e.id == result.exercise_id) {
            Some(exercise) => {
                exercise.max_weight = result.new_max;
                applied += 1;
                tracing::info!(
                    "Increased max for {}: {} -> {}",
                    exercise.id,
                    result.previous_max,
                    result.new_max
                );
            }
            None => {
                tracing::warn!(
                    "Progression result for unknown exercise {}",
                    result.exercise_id
                );
            }
        }
    }
    applied
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(auto: bool) -> ExerciseConfig {
        ExerciseConfig {
            max_weight: 100.0,
            weight_increment: 5.0,
            auto_progression_enabled: auto,
            barbell_weight: 45.0,
        }
    }

    fn set(target: u32, actual: Option<u32>, completed: bool) -> CompletedSet {
        CompletedSet {
            percentage_of_max: Some(70.0),
            target_reps: target,
            actual_reps: actual,
            completed,
        }
    }

    #[test]
    fn test_all_sets_met_progresses() {
        let sets = vec![set(5, Some(5), true), set(5, Some(6), true), set(3, Some(3), true)];
        let decision = evaluate_progression(&config(true), &sets);

        assert!(decision.should_progress);
        assert_eq!(decision.new_max_weight, 105.0);
    }

    #[test]
    fn test_one_missed_rep_blocks() {
        let sets = vec![set(5, Some(8), true), set(5, Some(4), true), set(5, Some(8), true)];
        let decision = evaluate_progression(&config(true), &sets);

        assert!(!decision.should_progress);
        assert_eq!(decision.new_max_weight, 100.0);
    }

    #[test]
    fn test_skipped_set_blocks() {
        let sets = vec![set(5, Some(5), true), set(5, None, false)];
        assert!(!evaluate_progression(&config(true), &sets).should_progress);

        // Reps logged but not marked complete
        let sets = vec![set(5, Some(5), true), set(5, Some(5), false)];
        assert!(!evaluate_progression(&config(true), &sets).should_progress);
    }

    #[test]
    fn test_disabled_auto_progression() {
        let sets = vec![set(5, Some(5), true)];
        let decision = evaluate_progression(&config(false), &sets);

        assert!(!decision.should_progress);
        assert_eq!(decision.new_max_weight, 100.0);
    }

    #[test]
    fn test_no_sets_does_not_progress() {
        assert!(!evaluate_progression(&config(true), &[]).should_progress);
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let sets = vec![set(5, Some(5), true), set(5, Some(5), true)];
        let first = evaluate_progression(&config(true), &sets);
        let second = evaluate_progression(&config(true), &sets);
        assert_eq!(first, second);
    }

    #[test]
    fn test_apply_progressions() {
        let mut exercises = vec![Exercise {
            id: "squat".into(),
            name: "Squat".into(),
            max_weight: 100.0,
            weight_increment: 5.0,
            auto_progression_enabled: true,
            barbell_id: None,
        }];
        let results = vec![
            AutoProgressionResult {
                exercise_id: "squat".into(),
                previous_max: 100.0,
                new_max: 105.0,
            },
            AutoProgressionResult {
                exercise_id: "unknown".into(),
                previous_max: 50.0,
                new_max: 55.0,
            },
        ];

        assert_eq!(apply_progressions(&mut exercises, &results), 1);
        assert_eq!(exercises[0].max_weight, 105.0);
    }
}
