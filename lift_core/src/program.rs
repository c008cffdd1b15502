//! Program rotation and completion tracking.
//!
//! Continuous programs cycle their routines forever. Finite programs count
//! workouts with an unbounded position; the first workout recorded once the
//! position has reached `total_workouts` completes them. Their routine
//! pointer still cycles through the list.

use crate::{Error, Program, ProgramKind, Result};
use chrono::{DateTime, Utc};

/// What happened to a program when a linked workout finished
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProgramOutcome {
    Advanced { position: u32 },
    Completed,
}

fn require_routines(program: &Program) -> Result<usize> {
    if program.routine_ids.is_empty() {
        return Err(Error::State(format!(
            "program '{}' has no routines",
            program.id
        )));
    }
    Ok(program.routine_ids.len())
}

/// Routine the program's next workout should use
pub fn current_routine_id(program: &Program) -> Result<&str> {
    let len = require_routines(program)?;
    let index = program.current_position as usize % len;
    Ok(&program.routine_ids[index])
}

/// Move the program to its next workout
pub fn advance(program: &mut Program) -> Result<()> {
    let len = require_routines(program)? as u32;
    program.current_position = match program.kind {
        ProgramKind::Continuous => (program.current_position % len + 1) % len,
        ProgramKind::Finite => program.current_position.saturating_add(1),
    };
    tracing::debug!(
        "Advanced program {} to position {}",
        program.id,
        program.current_position
    );
    Ok(())
}

/// True when a finite program has run all its workouts
///
/// Continuous programs, and finite programs missing a workout count, never
/// complete.
pub fn is_complete(program: &Program) -> bool {
    match (program.kind, program.total_workouts) {
        (ProgramKind::Finite, Some(total)) => program.current_position >= total,
        _ => false,
    }
}

pub fn mark_complete(program: &mut Program, at: DateTime<Utc>) {
    program.completed_at = Some(at);
    program.is_active = false;
    tracing::info!("Program {} completed", program.id);
}

/// Count a finished workout against the program
///
/// A program that has already run all its workouts is marked complete;
/// otherwise it advances.
pub fn record_workout(program: &mut Program, at: DateTime<Utc>) -> Result<ProgramOutcome> {
    if is_complete(program) {
        mark_complete(program, at);
        return Ok(ProgramOutcome::Completed);
    }
    advance(program)?;
    Ok(ProgramOutcome::Advanced {
        position: program.current_position,
    })
}

fn find_index(programs: &[Program], program_id: &str) -> Result<usize> {
    programs
        .iter()
        .position(|p| p.id == program_id)
        .ok_or_else(|| Error::NotFound(format!("program '{}'", program_id)))
}

/// Undo one workout of progress, e.g. after a logged workout is deleted
///
/// A completed program is reopened, and reactivated only if no other program
/// is active.
pub fn decrement(programs: &mut [Program], program_id: &str) -> Result<()> {
    let index = find_index(programs, program_id)?;
    let other_active = programs
        .iter()
        .enumerate()
        .any(|(i, p)| i != index && p.is_active);

    let program = &mut programs[index];
    program.current_position = program.current_position.saturating_sub(1);

    if program.completed_at.take().is_some() {
        program.is_active = !other_active;
        tracing::info!(
            "Reopened program {} (active: {})",
            program.id,
            program.is_active
        );
    }

    tracing::debug!(
        "Decremented program {} to position {}",
        program.id,
        program.current_position
    );
    Ok(())
}

/// Make one program the only active one, starting it from the top
///
/// A completed program is reopened.
pub fn set_active(programs: &mut [Program], program_id: &str) -> Result<()> {
    let index = find_index(programs, program_id)?;
    for (i, program) in programs.iter_mut().enumerate() {
        if i == index {
            program.current_position = 0;
            program.completed_at = None;
            program.is_active = true;
        } else {
            program.is_active = false;
        }
    }
    tracing::info!("Activated program {}", program_id);
    Ok(())
}

/// The program currently marked active, if any
pub fn active_program(programs: &[Program]) -> Option<&Program> {
    programs.iter().find(|p| p.is_active)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program(id: &str, kind: ProgramKind, routines: &[&str], total: Option<u32>) -> Program {
        Program {
            id: id.into(),
            name: id.to_uppercase(),
            kind,
            routine_ids: routines.iter().map(|r| r.to_string()).collect(),
            current_position: 0,
            total_workouts: total,
            completed_at: None,
            is_active: false,
        }
    }

    #[test]
    fn test_continuous_cycles_back() {
        let mut p = program("p", ProgramKind::Continuous, &["a", "b", "c"], None);
        p.current_position = 1;

        for _ in 0..3 {
            advance(&mut p).unwrap();
        }
        assert_eq!(p.current_position, 1);
        assert_eq!(current_routine_id(&p).unwrap(), "b");
    }

    #[test]
    fn test_continuous_routine_order() {
        let mut p = program("p", ProgramKind::Continuous, &["a", "b"], None);
        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(current_routine_id(&p).unwrap().to_string());
            advance(&mut p).unwrap();
        }
        assert_eq!(seen, vec!["a", "b", "a", "b"]);
        assert!(!is_complete(&p));
    }

    #[test]
    fn test_finite_position_is_unbounded() {
        let mut p = program("p", ProgramKind::Finite, &["a", "b"], Some(5));
        for _ in 0..3 {
            advance(&mut p).unwrap();
        }
        assert_eq!(p.current_position, 3);
        assert_eq!(current_routine_id(&p).unwrap(), "b");
    }

    #[test]
    fn test_finite_complete_only_at_total() {
        let mut p = program("p", ProgramKind::Finite, &["a"], Some(3));
        for _ in 0..3 {
            assert!(!is_complete(&p));
            advance(&mut p).unwrap();
        }
        assert!(is_complete(&p));
    }

    #[test]
    fn test_record_workout_completes_once_total_reached() {
        let now = Utc::now();
        let mut p = program("p", ProgramKind::Finite, &["a", "b"], Some(2));
        p.is_active = true;

        assert_eq!(
            record_workout(&mut p, now).unwrap(),
            ProgramOutcome::Advanced { position: 1 }
        );
        assert_eq!(
            record_workout(&mut p, now).unwrap(),
            ProgramOutcome::Advanced { position: 2 }
        );
        assert!(p.is_active);
        assert!(p.completed_at.is_none());

        assert_eq!(record_workout(&mut p, now).unwrap(), ProgramOutcome::Completed);
        assert_eq!(p.current_position, 2);
        assert_eq!(p.completed_at, Some(now));
        assert!(!p.is_active);
    }

    #[test]
    fn test_record_workout_continuous_never_completes() {
        let now = Utc::now();
        let mut p = program("p", ProgramKind::Continuous, &["a"], None);
        for _ in 0..3 {
            assert_eq!(
                record_workout(&mut p, now).unwrap(),
                ProgramOutcome::Advanced { position: 0 }
            );
        }
        assert!(p.completed_at.is_none());
    }

    #[test]
    fn test_empty_routines_is_state_error() {
        let mut p = program("p", ProgramKind::Continuous, &[], None);
        assert!(matches!(current_routine_id(&p), Err(Error::State(_))));
        assert!(matches!(advance(&mut p), Err(Error::State(_))));
    }

    #[test]
    fn test_decrement_floors_at_zero() {
        let mut programs = vec![program("p", ProgramKind::Continuous, &["a", "b"], None)];
        decrement(&mut programs, "p").unwrap();
        assert_eq!(programs[0].current_position, 0);
    }

    #[test]
    fn test_decrement_reopens_completed_program() {
        let mut programs = vec![program("p", ProgramKind::Finite, &["a"], Some(2))];
        programs[0].current_position = 2;
        mark_complete(&mut programs[0], Utc::now());

        decrement(&mut programs, "p").unwrap();

        assert_eq!(programs[0].current_position, 1);
        assert!(programs[0].completed_at.is_none());
        assert!(programs[0].is_active);
        assert!(!is_complete(&programs[0]));
    }

    #[test]
    fn test_decrement_keeps_other_program_active() {
        let mut programs = vec![
            program("done", ProgramKind::Finite, &["a"], Some(1)),
            program("current", ProgramKind::Continuous, &["b"], None),
        ];
        programs[0].current_position = 1;
        mark_complete(&mut programs[0], Utc::now());
        programs[1].is_active = true;

        decrement(&mut programs, "done").unwrap();

        assert!(programs[0].completed_at.is_none());
        assert!(!programs[0].is_active);
        assert!(programs[1].is_active);
    }

    #[test]
    fn test_set_active_is_exclusive() {
        let mut programs = vec![
            program("a", ProgramKind::Continuous, &["x"], None),
            program("b", ProgramKind::Continuous, &["y", "z"], None),
        ];
        programs[0].is_active = true;
        programs[1].current_position = 1;

        set_active(&mut programs, "b").unwrap();

        assert!(!programs[0].is_active);
        assert!(programs[1].is_active);
        assert_eq!(programs[1].current_position, 0);
        assert_eq!(active_program(&programs).unwrap().id, "b");
    }

    #[test]
    fn test_set_active_reopens_completed_program() {
        let mut programs = vec![program("p", ProgramKind::Finite, &["a"], Some(1))];
        programs[0].current_position = 1;
        mark_complete(&mut programs[0], Utc::now());

        set_active(&mut programs, "p").unwrap();

        assert!(programs[0].is_active);
        assert_eq!(programs[0].current_position, 0);
        assert!(programs[0].completed_at.is_none());
        assert!(!is_complete(&programs[0]));
    }

    #[test]
    fn test_unknown_program_not_found() {
        let mut programs = vec![program("a", ProgramKind::Continuous, &["x"], None)];
        assert!(matches!(
            set_active(&mut programs, "nope"),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            decrement(&mut programs, "nope"),
            Err(Error::NotFound(_))
        ));
    }
}
