//! Starter data for a fresh install.
//!
//! Four barbell lifts, two alternating routines, a continuous program over
//! them and a three-day weekly goal.

use crate::plates::default_plate_inventory;
use crate::store::TrainingData;
use crate::types::*;
use crate::{Config, Result};

const BARBELL_ID: &str = "olympic_bar";

fn exercise(id: &str, name: &str, max_weight: f64, config: &Config) -> Exercise {
    Exercise {
        id: id.into(),
        name: name.into(),
        max_weight,
        weight_increment: config.training.default_weight_increment,
        auto_progression_enabled: true,
        barbell_id: Some(BARBELL_ID.into()),
    }
}

/// Warm-up at the bar, then three working sets at 65/75/85%
fn working_sets(config: &Config) -> Vec<SetSpec> {
    let rest = Some(config.training.default_rest_seconds);
    vec![
        SetSpec {
            weight: SetWeight::BarOnly,
            reps: 10,
            rest_time: Some(60),
        },
        SetSpec {
            weight: SetWeight::Percentage(65.0),
            reps: 5,
            rest_time: rest,
        },
        SetSpec {
            weight: SetWeight::Percentage(75.0),
            reps: 5,
            rest_time: rest,
        },
        SetSpec {
            weight: SetWeight::Percentage(85.0),
            reps: 5,
            rest_time: None,
        },
    ]
}

fn routine(id: &str, name: &str, exercise_ids: &[&str], config: &Config) -> Routine {
    Routine {
        id: id.into(),
        name: name.into(),
        exercises: exercise_ids
            .iter()
            .map(|exercise_id| RoutineExercise {
                exercise_id: (*exercise_id).into(),
                sets: working_sets(config),
            })
            .collect(),
    }
}

/// Build a complete, valid data set to start training with
pub fn build_starter_data(config: &Config) -> Result<TrainingData> {
    let exercises = vec![
        exercise("squat", "Back Squat", 225.0, config),
        exercise("bench", "Bench Press", 185.0, config),
        exercise("deadlift", "Deadlift", 275.0, config),
        exercise("press", "Overhead Press", 115.0, config),
    ];

    let routines = vec![
        routine("day_a", "Day A", &["squat", "bench"], config),
        routine("day_b", "Day B", &["deadlift", "press"], config),
    ];

    let program = Program {
        id: "alternating".into(),
        name: "A/B Alternating".into(),
        kind: ProgramKind::Continuous,
        routine_ids: vec!["day_a".into(), "day_b".into()],
        current_position: 0,
        total_workouts: None,
        completed_at: None,
        is_active: true,
    };

    let goal = Goal {
        id: "three_per_week".into(),
        workouts_per_week: 3,
        // Mon/Wed/Fri
        scheduled_days: ScheduledDays::new([1, 3, 5])?,
        current_streak: 0,
        total_weeks: None,
        is_active: true,
        last_evaluated_week: None,
    };

    Ok(TrainingData {
        exercises,
        barbells: vec![Barbell {
            id: BARBELL_ID.into(),
            name: "Olympic Bar".into(),
            weight: config.training.default_barbell_weight,
        }],
        routines,
        programs: vec![program],
        goals: vec![goal],
        plate_inventory: default_plate_inventory().to_vec(),
    })
}
