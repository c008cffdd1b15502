use clap::{Parser, Subcommand};
use lift_core::goal::{count_workouts_in_week, week_start, weekday_index};
use lift_core::program::{active_program, current_routine_id, decrement, set_active};
use lift_core::*;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

#[derive(Parser)]
#[command(name = "lift")]
#[command(about = "Percentage-based strength training tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write starter exercises, routines, program and goal
    Init {
        /// Overwrite existing data
        #[arg(long)]
        force: bool,
    },

    /// Show which plates to load for a target weight
    Plates {
        /// Total weight including the bar
        target: f64,

        /// Bar weight (defaults to the first stored barbell)
        #[arg(long)]
        bar: Option<f64>,
    },

    /// Run a workout (default)
    Workout {
        /// Routine to run instead of the active program's next routine
        #[arg(long)]
        routine: Option<String>,

        /// Log every set at its target (for scripting)
        #[arg(long, conflicts_with = "miss_reps")]
        auto_complete: bool,

        /// Log every set one rep short of target (for scripting)
        #[arg(long, conflicts_with = "auto_complete")]
        miss_reps: bool,

        /// Count down rest periods instead of waiting for Enter
        #[arg(long)]
        timed_rest: bool,
    },

    /// Inspect or switch programs
    Program {
        #[command(subcommand)]
        action: ProgramAction,
    },

    /// Show weekly goal progress and update the streak
    Goal,

    /// Inspect or edit logged workouts
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },

    /// Roll up WAL sessions to CSV
    Rollup {
        /// Clean up processed WAL files after rollup
        #[arg(long)]
        cleanup: bool,
    },
}

#[derive(Subcommand)]
enum ProgramAction {
    /// List programs and their next routine
    List,
    /// Make a program the active one, starting from its first routine
    Activate { id: String },
}

#[derive(Subcommand)]
enum HistoryAction {
    /// List logged workouts, newest first
    List,
    /// Delete a logged workout and undo its program progress
    Delete { id: String },
}

struct Paths {
    data_dir: PathBuf,
    data: PathBuf,
    wal_dir: PathBuf,
    wal: PathBuf,
    csv: PathBuf,
}

impl Paths {
    fn new(data_dir: PathBuf) -> Self {
        let wal_dir = data_dir.join("wal");
        Self {
            data: data_dir.join("data.json"),
            wal: wal_dir.join("workout_sessions.wal"),
            csv: data_dir.join("sessions.csv"),
            wal_dir,
            data_dir,
        }
    }
}

fn main() -> Result<()> {
    lift_core::logging::init_with_level("warn");

    let cli = Cli::parse();

    let config = Config::load()?;
    let paths = Paths::new(cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone()));

    match cli.command {
        Some(Commands::Init { force }) => cmd_init(&paths, force, &config),
        Some(Commands::Plates { target, bar }) => cmd_plates(&paths, target, bar, &config),
        Some(Commands::Workout {
            routine,
            auto_complete,
            miss_reps,
            timed_rest,
        }) => {
            let mode = if auto_complete {
                LogMode::AtTarget
            } else if miss_reps {
                LogMode::OneShort
            } else {
                LogMode::Prompt { timed_rest }
            };
            cmd_workout(&paths, routine, mode)
        }
        Some(Commands::Program { action }) => match action {
            ProgramAction::List => cmd_program_list(&paths),
            ProgramAction::Activate { id } => cmd_program_activate(&paths, &id),
        },
        Some(Commands::Goal) => cmd_goal(&paths),
        Some(Commands::History { action }) => match action {
            HistoryAction::List => cmd_history_list(&paths),
            HistoryAction::Delete { id } => cmd_history_delete(&paths, &id),
        },
        Some(Commands::Rollup { cleanup }) => cmd_rollup(&paths, cleanup),
        None => cmd_workout(&paths, None, LogMode::Prompt { timed_rest: false }),
    }
}

fn load_data(paths: &Paths) -> Result<TrainingData> {
    if !paths.data.exists() {
        return Err(Error::NotFound(format!(
            "no training data at {} (run `lift init`)",
            paths.data.display()
        )));
    }
    let data = TrainingData::load(&paths.data)?;
    let errors = data.validate();
    if !errors.is_empty() {
        eprintln!("Training data problems:");
        for error in errors {
            eprintln!("  - {}", error);
        }
    }
    Ok(data)
}

fn cmd_init(paths: &Paths, force: bool, config: &Config) -> Result<()> {
    if paths.data.exists() && !force {
        return Err(Error::State(format!(
            "data already exists at {} (use --force to overwrite)",
            paths.data.display()
        )));
    }

    std::fs::create_dir_all(&paths.data_dir)?;
    build_starter_data(config)?.save(&paths.data)?;

    println!("✓ Starter data written to {}", paths.data.display());
    Ok(())
}

fn cmd_plates(paths: &Paths, target: f64, bar: Option<f64>, config: &Config) -> Result<()> {
    let data = if paths.data.exists() {
        TrainingData::load(&paths.data)?
    } else {
        TrainingData::default()
    };

    let inventory: Vec<PlateEntry> = match &config.plates.inventory {
        Some(inventory) => inventory.clone(),
        None if !data.plate_inventory.is_empty() => data.plate_inventory.clone(),
        None => default_plate_inventory().to_vec(),
    };
    let bar = bar
        .or_else(|| data.barbells.first().map(|b| b.weight))
        .unwrap_or(config.training.default_barbell_weight);

    let solution = solve_plates(target, bar, &inventory);
    print_plates(target, bar, &solution);
    Ok(())
}

fn print_plates(target: f64, bar: f64, solution: &PlateSolution) {
    println!("Target: {} (bar {})", target, bar);
    if solution.plates_per_side.is_empty() {
        println!("Plates per side: none");
    } else {
        let plates: Vec<String> = solution
            .plates_per_side
            .iter()
            .map(|p| p.to_string())
            .collect();
        println!("Plates per side: {}", plates.join(", "));
    }
    println!("Achieved: {}", solution.achieved_weight);

    let shortfall = solution.shortfall(target);
    if shortfall > 0.0 {
        println!("⚠ Short of target by {}", shortfall);
    }
}

#[derive(Clone, Copy)]
enum LogMode {
    AtTarget,
    OneShort,
    Prompt { timed_rest: bool },
}

fn cmd_workout(paths: &Paths, routine_id: Option<String>, mode: LogMode) -> Result<()> {
    let mut data = load_data(paths)?;

    let (routine_id, program_id) = match routine_id {
        Some(id) => (id, None),
        None => {
            let program = active_program(&data.programs).ok_or_else(|| {
                Error::NotFound("no active program (pass --routine or activate one)".into())
            })?;
            (
                current_routine_id(program)?.to_string(),
                Some(program.id.clone()),
            )
        }
    };
    let routine = data.routine(&routine_id)?.clone();

    let mut machine = SessionMachine::new();
    let session = machine.start(
        &routine,
        &data.exercises,
        &data.barbells,
        program_id.as_deref(),
    )?;

    println!("\n╭─────────────────────────────────────────╮");
    println!("│  {}", routine.name);
    println!("╰─────────────────────────────────────────╯");

    let plan: Vec<(usize, String, Vec<SessionSet>)> = session
        .exercises
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let name = data
                .exercise(&e.exercise_id)
                .map(|x| x.name.clone())
                .unwrap_or_else(|_| e.exercise_id.clone());
            (i, name, e.sets.clone())
        })
        .collect();

    for (exercise_idx, name, sets) in plan {
        machine.set_current_exercise(exercise_idx)?;
        println!("\n  {}", name);

        for (set_idx, set) in sets.iter().enumerate() {
            let pct = set
                .percentage_of_max
                .map(|p| format!(" ({}%)", p))
                .unwrap_or_default();
            println!(
                "  → Set {}: {} x {}{}",
                set_idx + 1,
                set.target_weight,
                set.target_reps,
                pct
            );

            let reps = match mode {
                LogMode::AtTarget => Some(set.target_reps),
                LogMode::OneShort => Some(set.target_reps.saturating_sub(1)),
                LogMode::Prompt { .. } => match prompt_set(set.target_reps)? {
                    SetAction::Done(reps) => Some(reps),
                    SetAction::Skip => None,
                    SetAction::Cancel => {
                        machine.cancel_workout()?;
                        println!("\n✗ Workout cancelled, nothing saved.");
                        return Ok(());
                    }
                },
            };

            if let Some(reps) = reps {
                machine.complete_set(exercise_idx, set_idx, set.target_weight, reps)?;
            }
            rest(&mut machine, mode)?;
        }
    }

    let before = data.clone();
    let program = match program_id.as_deref() {
        Some(id) => Some(data.program_mut(id)?),
        None => None,
    };
    let completed = machine.complete_workout(program)?;
    apply_progressions(&mut data.exercises, &completed.progressions);

    // Maxes and program position first; the session is only logged once
    // they are on disk.
    data.save(&paths.data)?;
    let mut sink = JsonlSink::new(&paths.wal);
    if let Err(e) = sink.append(&completed.session) {
        restore_data(paths, &before);
        return Err(e);
    }

    println!("\n✓ Workout complete! Session {}", completed.session.id);
    for result in &completed.progressions {
        println!(
            "  ↑ {}: {} → {}",
            result.exercise_id, result.previous_max, result.new_max
        );
    }
    match completed.program {
        Some(ProgramOutcome::Completed) => println!("  ★ Program complete!"),
        Some(ProgramOutcome::Advanced { position }) => {
            println!("  Program position: {}", position)
        }
        None => {}
    }

    Ok(())
}

fn rest(machine: &mut SessionMachine, mode: LogMode) -> Result<()> {
    let Some(timer) = machine.rest_timer() else {
        return Ok(());
    };

    match mode {
        LogMode::Prompt { timed_rest: true } => {
            println!("    Rest {}s", timer.duration_secs());
            while let Some(TimerTick::Running(remaining)) = machine.tick_rest_timer() {
                print!("\r    {:>3}s ", remaining);
                io::stdout().flush()?;
                std::thread::sleep(Duration::from_secs(1));
            }
            println!("\r    Rest over");
        }
        LogMode::Prompt { timed_rest: false } => {
            print!("    Rest {}s, press Enter when ready ", timer.duration_secs());
            io::stdout().flush()?;
            let mut input = String::new();
            io::stdin().read_line(&mut input)?;
            machine.skip_rest_timer();
        }
        LogMode::AtTarget | LogMode::OneShort => machine.skip_rest_timer(),
    }
    Ok(())
}

enum SetAction {
    Done(u32),
    Skip,
    Cancel,
}

fn prompt_set(target_reps: u32) -> Result<SetAction> {
    print!("    Reps done [{}] ('s' skip, 'q' cancel): ", target_reps);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let action = match input.trim().to_lowercase().as_str() {
        "" => SetAction::Done(target_reps),
        "s" => SetAction::Skip,
        "q" => SetAction::Cancel,
        other => match other.parse() {
            Ok(reps) => SetAction::Done(reps),
            Err(_) => {
                eprintln!("Not a rep count: {}. Logging target.", other);
                SetAction::Done(target_reps)
            }
        },
    };
    Ok(action)
}

fn cmd_program_list(paths: &Paths) -> Result<()> {
    let data = load_data(paths)?;
    if data.programs.is_empty() {
        println!("No programs.");
        return Ok(());
    }

    for program in &data.programs {
        let marker = if program.is_active { "*" } else { " " };
        let progress = match (program.kind, program.total_workouts) {
            (ProgramKind::Finite, Some(total)) => {
                format!("{}/{} workouts", program.current_position, total)
            }
            _ => format!("position {}", program.current_position),
        };
        let next = if program.completed_at.is_some() {
            "completed".to_string()
        } else {
            match current_routine_id(program) {
                Ok(id) => format!("next: {}", id),
                Err(e) => e.to_string(),
            }
        };
        println!(
            "{} {} ({}) - {:?}, {}, {}",
            marker, program.id, program.name, program.kind, progress, next
        );
    }
    Ok(())
}

fn cmd_program_activate(paths: &Paths, id: &str) -> Result<()> {
    ensure_data(&paths.data)?;
    TrainingData::update(&paths.data, |data| set_active(&mut data.programs, id))?;
    println!("✓ Activated program {}", id);
    Ok(())
}

fn cmd_goal(paths: &Paths) -> Result<()> {
    ensure_data(&paths.data)?;
    let sessions = load_sessions(&paths.wal, &paths.csv)?;

    let today = chrono::Utc::now().date_naive();
    let week = week_start(today);
    let today_idx = weekday_index(today);
    let done = count_workouts_in_week(sessions.iter().filter_map(|s| s.completed_at), week);

    let mut report = None;
    TrainingData::update(&paths.data, |data| {
        let goal = data
            .goals
            .iter_mut()
            .find(|g| g.is_active)
            .ok_or_else(|| Error::NotFound("no active goal".into()))?;
        let update = check_and_update_streak(goal, done, today_idx, week);
        report = Some((goal_progress(goal, done, today_idx), update, goal.is_achieved()));
        Ok(())
    })?;

    let Some((progress, update, achieved)) = report else {
        return Ok(());
    };

    println!(
        "This week: {}/{} workouts",
        progress.workouts_this_week, progress.workouts_target
    );
    println!(
        "{}",
        if progress.is_on_track {
            "On track"
        } else {
            "Behind schedule"
        }
    );
    println!(
        "Next scheduled day: {}",
        WEEKDAYS[usize::from(progress.next_scheduled_day) % 7]
    );
    println!("Streak: {} weeks", progress.streak_weeks);
    match update {
        StreakUpdate::Incremented => println!("✓ Weekly goal met!"),
        StreakUpdate::Reset => println!("✗ Weekly goal missed, streak reset"),
        StreakUpdate::Unchanged | StreakUpdate::AlreadyEvaluated => {}
    }
    if achieved {
        println!("★ Goal achieved!");
    }
    Ok(())
}

fn cmd_history_list(paths: &Paths) -> Result<()> {
    let sessions = load_sessions(&paths.wal, &paths.csv)?;
    if sessions.is_empty() {
        println!("No workouts logged.");
        return Ok(());
    }
    for session in &sessions {
        let when = session
            .completed_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".into());
        println!(
            "{}  {}  {}{}",
            session.id,
            when,
            session.routine_id,
            session
                .program_id
                .as_deref()
                .map(|p| format!(" [{}]", p))
                .unwrap_or_default()
        );
    }
    Ok(())
}

fn cmd_history_delete(paths: &Paths, id: &str) -> Result<()> {
    let id = uuid::Uuid::parse_str(id)
        .map_err(|e| Error::Validation(format!("invalid session id {}: {}", id, e)))?;

    ensure_data(&paths.data)?;
    let session = lift_core::wal::read_sessions(&paths.wal)?
        .into_iter()
        .find(|s| s.id == id)
        .ok_or_else(|| Error::NotFound(format!("session {}", id)))?;

    let mut data = TrainingData::load(&paths.data)?;
    let before = data.clone();
    let rewound = match session.program_id.as_deref() {
        Some(program_id) => match decrement(&mut data.programs, program_id) {
            Ok(()) => Some(program_id),
            Err(Error::NotFound(_)) => {
                tracing::warn!("Program {} no longer exists", program_id);
                None
            }
            Err(e) => return Err(e),
        },
        None => None,
    };

    if rewound.is_some() {
        data.save(&paths.data)?;
    }
    if let Err(e) = lift_core::wal::remove_session(&paths.wal, id) {
        if rewound.is_some() {
            restore_data(paths, &before);
        }
        return Err(e);
    }

    println!("✓ Deleted session {}", id);
    if let Some(program_id) = rewound {
        println!("  Program {} moved back one workout", program_id);
    }
    Ok(())
}

/// Put training data back after a later write in the same command failed
fn restore_data(paths: &Paths, before: &TrainingData) {
    if let Err(e) = before.save(&paths.data) {
        tracing::error!("Failed to restore {}: {}", paths.data.display(), e);
    }
}

fn cmd_rollup(paths: &Paths, cleanup: bool) -> Result<()> {
    if !paths.wal.exists() {
        println!("No WAL file found - nothing to roll up.");
        return Ok(());
    }

    let count = lift_core::csv_rollup::wal_to_csv_and_archive(&paths.wal, &paths.csv)?;

    println!("✓ Rolled up {} sessions to CSV", count);
    println!("  CSV: {}", paths.csv.display());

    if cleanup {
        let cleaned = lift_core::csv_rollup::cleanup_processed_wals(&paths.wal_dir)?;
        if cleaned > 0 {
            println!("✓ Cleaned up {} processed WAL files", cleaned);
        }
    }

    Ok(())
}

fn ensure_data(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(Error::NotFound(format!(
            "no training data at {} (run `lift init`)",
            path.display()
        )))
    }
}
