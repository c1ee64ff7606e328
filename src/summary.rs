use chrono::{Duration, Local, NaiveDate};
use itertools::Itertools;
use std::cmp::Reverse;

use crate::exercises::ExerciseCategory;
use crate::sessions::{SessionRepository, WorkoutIntensity, WorkoutSession, WorkoutStats};

/// Days covered by the overview: the per-day breakdown and its stats row
const BREAKDOWN_DAYS: i64 = 5;

/// Sessions-per-week goal shown as progress in the overview
pub const WEEKLY_SESSION_TARGET: usize = 5;

/// How many recent sessions the overview lists
const RECENT_SESSIONS_LIMIT: usize = 10;

/// Per-calendar-day rollup of the session log
#[derive(Debug, Clone, PartialEq)]
pub struct DayWorkoutData {
    pub date: NaiveDate,
    pub focus: String,
    pub total_duration_ms: i64,
    pub total_calories: i32,
    pub session_count: usize,
    pub peak_intensity: Option<WorkoutIntensity>,
    pub sessions: Vec<WorkoutSession>,
}

/// Everything the summary view shows, recomputed on demand
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryOverview {
    pub streak: u32,
    pub stats: WorkoutStats,
    pub days: Vec<DayWorkoutData>,
    pub recent: Vec<WorkoutSession>,
}

impl SummaryOverview {
    pub fn load(repo: &SessionRepository) -> Self {
        Self::load_at(repo, Local::now().date_naive())
    }

    fn load_at(repo: &SessionRepository, today: NaiveDate) -> Self {
        let sessions = repo.get_all_workout_sessions();
        let days = last_five_days(&sessions, today);
        let recent = days
            .iter()
            .flat_map(|d| d.sessions.iter().cloned())
            .sorted_by_key(|s| Reverse(s.end_time))
            .take(RECENT_SESSIONS_LIMIT)
            .collect();
        SummaryOverview {
            streak: repo.get_completion_streak(),
            stats: repo.get_average_stats_for_last_days(BREAKDOWN_DAYS),
            days,
            recent,
        }
    }
}

/// Bucket the log into the last five calendar days, oldest first
pub fn last_five_days(sessions: &[WorkoutSession], today: NaiveDate) -> Vec<DayWorkoutData> {
    (0..BREAKDOWN_DAYS)
        .rev()
        .map(|offset| {
            let date = today - Duration::days(offset);
            let day_sessions: Vec<WorkoutSession> = sessions
                .iter()
                .filter(|s| s.end_date_local() == date)
                .cloned()
                .collect();
            DayWorkoutData {
                date,
                focus: day_focus(&day_sessions),
                total_duration_ms: day_sessions.iter().map(|s| s.duration_ms).sum(),
                total_calories: day_sessions.iter().map(|s| s.calories_burned).sum(),
                session_count: day_sessions.len(),
                peak_intensity: day_sessions.iter().map(|s| s.intensity).max(),
                sessions: day_sessions,
            }
        })
        .collect()
}

/// Single label for a day's training emphasis, by fixed precedence
fn day_focus(sessions: &[WorkoutSession]) -> String {
    if sessions.is_empty() {
        return "No workout".to_string();
    }
    let has = |category: ExerciseCategory| {
        sessions.iter().any(|s| s.exercise.category == category)
    };
    if has(ExerciseCategory::Cardio) {
        "Cardio"
    } else if has(ExerciseCategory::Strength) {
        "Strength"
    } else if has(ExerciseCategory::Flexibility) {
        "Flexibility"
    } else {
        "Mixed"
    }
    .to_string()
}

/// Bar heights for the breakdown chart, each in 0.0..=1.0 with the
/// busiest day at 1.0
pub fn chart_heights(days: &[DayWorkoutData]) -> Vec<f64> {
    let max = days
        .iter()
        .map(|d| d.total_duration_ms)
        .max()
        .unwrap_or(0)
        .max(1);
    days.iter()
        .map(|d| (d.total_duration_ms as f64 / max as f64).clamp(0.0, 1.0))
        .collect()
}
