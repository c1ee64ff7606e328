use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use tracing::warn;
use uuid::Uuid;

use crate::exercises::ExerciseRecord;
use crate::store::PrefStore;

const NAMESPACE: &str = "workout_sessions";
const KEY_SESSIONS: &str = "sessions";

/// Consecutive-day streaks are counted back at most this far
const STREAK_LOOKBACK_DAYS: u32 = 30;

/// How hard a session was, derived from its duration
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkoutIntensity {
    Light,
    Moderate,
    Intense,
}

impl WorkoutIntensity {
    /// Light under 15 minutes, moderate under 45, intense from there
    pub fn from_duration_ms(duration_ms: i64) -> Self {
        let minutes = duration_ms / 60_000;
        if minutes < 15 {
            WorkoutIntensity::Light
        } else if minutes < 45 {
            WorkoutIntensity::Moderate
        } else {
            WorkoutIntensity::Intense
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MoodRating {
    Terrible,
    Bad,
    Okay,
    Good,
    Excellent,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnergyLevel {
    #[strum(serialize = "Very Low")]
    VeryLow,
    Low,
    Medium,
    High,
    #[strum(serialize = "Very High")]
    VeryHigh,
}

/// One completed, timed exercise instance; immutable once saved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSession {
    pub id: Uuid,
    pub exercise: ExerciseRecord,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(rename = "duration")]
    pub duration_ms: i64,
    pub intensity: WorkoutIntensity,
    pub calories_burned: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood_before: Option<MoodRating>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood_after: Option<MoodRating>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy_before: Option<EnergyLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy_after: Option<EnergyLevel>,
}

impl WorkoutSession {
    /// Local calendar day the session finished on
    pub fn end_date_local(&self) -> NaiveDate {
        self.end_time.with_timezone(&Local).date_naive()
    }
}

/// Aggregate of a session set, all zeros when the set is empty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WorkoutStats {
    pub average_duration_ms: i64,
    pub average_calories: i32,
    pub total_sessions: usize,
    pub total_duration_ms: i64,
    pub total_calories: i32,
}

impl WorkoutStats {
    pub fn from_sessions(sessions: &[WorkoutSession]) -> Self {
        if sessions.is_empty() {
            return WorkoutStats::default();
        }
        let total_duration_ms: i64 = sessions.iter().map(|s| s.duration_ms).sum();
        let total_calories: i32 = sessions.iter().map(|s| s.calories_burned).sum();
        WorkoutStats {
            average_duration_ms: total_duration_ms / sessions.len() as i64,
            average_calories: total_calories / sessions.len() as i32,
            total_sessions: sessions.len(),
            total_duration_ms,
            total_calories,
        }
    }
}

/// Append-only log of completed sessions with read-side query helpers.
///
/// The whole log lives under one store key as a JSON array and is
/// rewritten on every save. Reads that hit corrupt data degrade to an
/// empty list.
pub struct SessionRepository {
    store: Rc<dyn PrefStore>,
}

impl SessionRepository {
    pub fn new(store: Rc<dyn PrefStore>) -> Self {
        Self { store }
    }

    /// Append a session and rewrite the persisted log
    pub fn save_workout_session(&self, session: &WorkoutSession) {
        let mut sessions = self.get_all_workout_sessions();
        sessions.push(session.clone());
        match serde_json::to_string(&sessions) {
            Ok(json) => {
                if let Err(e) = self.store.put(NAMESPACE, KEY_SESSIONS, &json) {
                    warn!(error = %e, "failed to persist session log");
                }
            }
            Err(e) => warn!(error = %e, "failed to serialize session log"),
        }
    }

    /// Full session log; empty on missing or corrupt data
    pub fn get_all_workout_sessions(&self) -> Vec<WorkoutSession> {
        let json = self
            .store
            .get(NAMESPACE, KEY_SESSIONS)
            .unwrap_or_else(|| "[]".to_string());
        match serde_json::from_str(&json) {
            Ok(sessions) => sessions,
            Err(e) => {
                warn!(error = %e, "discarding unreadable session log");
                Vec::new()
            }
        }
    }

    /// Sessions whose end time is after now minus `days`
    pub fn get_workout_sessions_for_last_days(&self, days: i64) -> Vec<WorkoutSession> {
        self.sessions_for_last_days_at(days, Utc::now())
    }

    fn sessions_for_last_days_at(&self, days: i64, now: DateTime<Utc>) -> Vec<WorkoutSession> {
        let cutoff = now - Duration::days(days);
        self.get_all_workout_sessions()
            .into_iter()
            .filter(|s| s.end_time > cutoff)
            .collect()
    }

    /// Sessions that finished on the given local calendar day
    pub fn get_workout_sessions_for_date(&self, date: NaiveDate) -> Vec<WorkoutSession> {
        self.get_all_workout_sessions()
            .into_iter()
            .filter(|s| s.end_date_local() == date)
            .collect()
    }

    /// Consecutive days with at least one session, counting back from today
    pub fn get_completion_streak(&self) -> u32 {
        self.completion_streak_at(Local::now().date_naive())
    }

    fn completion_streak_at(&self, today: NaiveDate) -> u32 {
        let sessions = self.get_all_workout_sessions();
        if sessions.is_empty() {
            return 0;
        }
        let mut streak = 0;
        let mut day = today;
        for _ in 0..STREAK_LOOKBACK_DAYS {
            if !sessions.iter().any(|s| s.end_date_local() == day) {
                break;
            }
            streak += 1;
            match day.pred_opt() {
                Some(previous) => day = previous,
                None => break,
            }
        }
        streak
    }

    /// Aggregate stats over the last `days`; all zeros when nothing matches
    pub fn get_average_stats_for_last_days(&self, days: i64) -> WorkoutStats {
        WorkoutStats::from_sessions(&self.get_workout_sessions_for_last_days(days))
    }
}
