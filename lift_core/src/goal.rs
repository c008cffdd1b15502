//! Weekly goal progress and streak tracking.
//!
//! Weekday indices run 0 (Sunday) to 6 (Saturday). Weeks start on Sunday.

use crate::Goal;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

/// Snapshot of the current week against a goal
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GoalProgress {
    pub workouts_this_week: u32,
    pub workouts_target: u32,
    pub streak_weeks: u32,
    /// Scheduled days strictly before today
    pub scheduled_days_passed: u32,
    pub is_on_track: bool,
    /// Today if scheduled, else the next scheduled day (wrapping into next week)
    pub next_scheduled_day: u8,
}

/// Result of a streak check
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreakUpdate {
    Incremented,
    Reset,
    /// Mid-week grace period
    Unchanged,
    /// The week was already decided by an earlier call
    AlreadyEvaluated,
}

/// Compute weekly progress for a goal
pub fn goal_progress(goal: &Goal, workouts_this_week: u32, today: u8) -> GoalProgress {
    let scheduled_days_passed = goal.scheduled_days.iter().filter(|d| *d < today).count() as u32;

    // ScheduledDays is never empty, so the fallback is only a formality
    let next_scheduled_day = goal
        .scheduled_days
        .iter()
        .find(|d| *d >= today)
        .or_else(|| goal.scheduled_days.iter().next())
        .unwrap_or(0);

    GoalProgress {
        workouts_this_week,
        workouts_target: goal.workouts_per_week,
        streak_weeks: goal.current_streak,
        scheduled_days_passed,
        is_on_track: workouts_this_week >= scheduled_days_passed,
        next_scheduled_day,
    }
}

/// Apply this week's outcome to the goal's streak
///
/// Meeting the weekly target extends the streak. Missing it once every
/// scheduled day has passed resets it. Each week is decided at most once:
/// the deciding week is recorded on the goal and later calls for that week
/// return `AlreadyEvaluated`.
pub fn check_and_update_streak(
    goal: &mut Goal,
    workouts_this_week: u32,
    today: u8,
    week: NaiveDate,
) -> StreakUpdate {
    if goal.last_evaluated_week == Some(week) {
        tracing::debug!("Streak for goal {} already evaluated for {}", goal.id, week);
        return StreakUpdate::AlreadyEvaluated;
    }

    let update = if workouts_this_week >= goal.workouts_per_week {
        goal.current_streak += 1;
        StreakUpdate::Incremented
    } else if goal.scheduled_days.iter().all(|d| d < today) {
        goal.current_streak = 0;
        StreakUpdate::Reset
    } else {
        StreakUpdate::Unchanged
    };

    if update != StreakUpdate::Unchanged {
        goal.last_evaluated_week = Some(week);
        tracing::info!(
            "Goal {} streak {:?}: now {} weeks",
            goal.id,
            update,
            goal.current_streak
        );
    }

    update
}

/// Weekday index of a date, Sunday = 0
pub fn weekday_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// The Sunday on or before `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(weekday_index(date)))
}

/// Number of completion times falling in the week starting `week`
pub fn count_workouts_in_week<I>(completions: I, week: NaiveDate) -> u32
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    let end = week + Duration::days(7);
    completions
        .into_iter()
        .map(|at| at.date_naive())
        .filter(|day| *day >= week && *day < end)
        .count() as u32
}

/// The goal currently marked active, if any
pub fn active_goal(goals: &[Goal]) -> Option<&Goal> {
    goals.iter().find(|g| g.is_active)
}
