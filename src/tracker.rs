use chrono::{DateTime, TimeZone, Utc};
use std::rc::Rc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::exercises::{self, Exercise, ExerciseRecord};
use crate::goals::GoalRepository;
use crate::sessions::{
    EnergyLevel, MoodRating, SessionRepository, WorkoutIntensity, WorkoutSession,
};
use crate::store::PrefStore;
use crate::util::parse_flag;

const NAMESPACE: &str = "workout_prefs";
const KEY_ACTIVE: &str = "workout_active";
const KEY_START_TIME: &str = "workout_start_time";
const KEY_EXERCISE_ID: &str = "active_exercise_id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkoutState {
    Idle,
    Active,
}

/// Optional details supplied when a workout is stopped
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StopAnnotations {
    pub notes: Option<String>,
    pub mood_before: Option<MoodRating>,
    pub mood_after: Option<MoodRating>,
    pub energy_before: Option<EnergyLevel>,
    pub energy_after: Option<EnergyLevel>,
}

/// Snapshot of the most recent completed workout in this process
#[derive(Debug, Clone, PartialEq)]
pub struct LastWorkout {
    pub exercise_name: String,
    pub duration_ms: i64,
    pub calories_burned: i32,
    pub ended_at: DateTime<Utc>,
}

/// IDLE/ACTIVE state machine driving a running workout.
///
/// The absolute start timestamp is persisted the moment a workout
/// begins, and elapsed time is always recomputed from it, so a process
/// restart (or a second process) picks the workout up mid-flight via
/// `resume` instead of starting the clock over.
pub struct WorkoutTracker {
    store: Rc<dyn PrefStore>,
    state: WorkoutState,
    start_time: Option<DateTime<Utc>>,
    exercise: Option<&'static Exercise>,
    elapsed_ms: i64,
    last_workout: Option<LastWorkout>,
}

impl WorkoutTracker {
    pub fn new(store: Rc<dyn PrefStore>) -> Self {
        Self {
            store,
            state: WorkoutState::Idle,
            start_time: None,
            exercise: None,
            elapsed_ms: 0,
            last_workout: None,
        }
    }

    pub fn state(&self) -> WorkoutState {
        self.state
    }

    pub fn exercise(&self) -> Option<&'static Exercise> {
        self.exercise
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    /// Elapsed milliseconds as of the latest tick
    pub fn elapsed_ms(&self) -> i64 {
        self.elapsed_ms
    }

    pub fn last_workout(&self) -> Option<&LastWorkout> {
        self.last_workout.as_ref()
    }

    /// Begin a workout. With no exercise given, the first selected goal
    /// is used; with nothing selected either, this is a no-op. Returns
    /// whether a workout actually started.
    pub fn start(&mut self, goals: &mut GoalRepository, exercise: Option<&'static Exercise>) -> bool {
        self.start_at(goals, exercise, Utc::now())
    }

    fn start_at(
        &mut self,
        goals: &mut GoalRepository,
        exercise: Option<&'static Exercise>,
        now: DateTime<Utc>,
    ) -> bool {
        if self.state == WorkoutState::Active {
            debug!("start ignored, workout already running");
            return false;
        }
        let Some(target) = exercise.or_else(|| goals.first_selected_goal().map(|g| g.exercise))
        else {
            debug!("start ignored, no exercise given and no goals selected");
            return false;
        };

        goals.set_active_goal(target);
        self.state = WorkoutState::Active;
        self.start_time = Some(now);
        self.exercise = Some(target);
        self.elapsed_ms = 0;
        self.last_workout = None;
        self.persist_active(target, now);
        true
    }

    /// Refresh the elapsed clock; called once a second while active
    pub fn on_tick(&mut self) {
        self.tick_at(Utc::now());
    }

    fn tick_at(&mut self, now: DateTime<Utc>) {
        if self.state != WorkoutState::Active {
            return;
        }
        if let Some(start) = self.start_time {
            self.elapsed_ms = (now - start).num_milliseconds().max(0);
        }
    }

    /// End the workout and append a session record.
    ///
    /// Intensity and calories are derived from the final duration; the
    /// session is only saved when time actually elapsed against a known
    /// exercise. Stopping while idle just clears state. Returns the
    /// saved session, if any.
    pub fn stop(
        &mut self,
        goals: &mut GoalRepository,
        sessions: &SessionRepository,
        annotations: StopAnnotations,
    ) -> Option<WorkoutSession> {
        self.stop_at(goals, sessions, annotations, Utc::now())
    }

    fn stop_at(
        &mut self,
        goals: &mut GoalRepository,
        sessions: &SessionRepository,
        annotations: StopAnnotations,
        now: DateTime<Utc>,
    ) -> Option<WorkoutSession> {
        let duration_ms = match self.start_time {
            Some(start) => (now - start).num_milliseconds().max(0),
            None => 0,
        };

        let saved = match self.exercise {
            Some(exercise) if duration_ms > 0 => {
                let whole_minutes = (duration_ms / 60_000) as i32;
                let session = WorkoutSession {
                    id: Uuid::new_v4(),
                    exercise: ExerciseRecord::from(exercise),
                    start_time: now - chrono::Duration::milliseconds(duration_ms),
                    end_time: now,
                    duration_ms,
                    intensity: WorkoutIntensity::from_duration_ms(duration_ms),
                    calories_burned: whole_minutes * exercise.category.calories_per_minute(),
                    notes: annotations.notes,
                    mood_before: annotations.mood_before,
                    mood_after: annotations.mood_after,
                    energy_before: annotations.energy_before,
                    energy_after: annotations.energy_after,
                };
                sessions.save_workout_session(&session);
                self.last_workout = Some(LastWorkout {
                    exercise_name: session.exercise.name.clone(),
                    duration_ms,
                    calories_burned: session.calories_burned,
                    ended_at: now,
                });
                Some(session)
            }
            _ => None,
        };

        self.state = WorkoutState::Idle;
        self.start_time = None;
        self.exercise = None;
        self.elapsed_ms = 0;
        self.clear_persisted();
        goals.clear_active_goal();
        saved
    }

    /// Reconstruct state from the persisted flags. Anything short of a
    /// fully valid active record reads as idle and clears the flags.
    pub fn resume(&mut self) -> WorkoutState {
        self.resume_at(Utc::now())
    }

    fn resume_at(&mut self, now: DateTime<Utc>) -> WorkoutState {
        let active = self
            .store
            .get(NAMESPACE, KEY_ACTIVE)
            .map(|v| parse_flag(&v))
            .unwrap_or(false);
        let start_ms = self
            .store
            .get(NAMESPACE, KEY_START_TIME)
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(0);
        let exercise = self
            .store
            .get(NAMESPACE, KEY_EXERCISE_ID)
            .and_then(|id| exercises::find(&id));

        if active && start_ms > 0 {
            if let (Some(exercise), Some(start)) =
                (exercise, Utc.timestamp_millis_opt(start_ms).single())
            {
                self.state = WorkoutState::Active;
                self.start_time = Some(start);
                self.exercise = Some(exercise);
                self.tick_at(now);
                return self.state;
            }
        }

        self.state = WorkoutState::Idle;
        self.start_time = None;
        self.exercise = None;
        self.elapsed_ms = 0;
        self.clear_persisted();
        self.state
    }

    fn persist_active(&self, exercise: &Exercise, start: DateTime<Utc>) {
        let writes = [
            (KEY_ACTIVE, "true".to_string()),
            (KEY_START_TIME, start.timestamp_millis().to_string()),
            (KEY_EXERCISE_ID, exercise.id.to_string()),
        ];
        for (key, value) in writes {
            if let Err(e) = self.store.put(NAMESPACE, key, &value) {
                warn!(key, error = %e, "failed to persist workout state");
            }
        }
    }

    fn clear_persisted(&self) {
        for key in [KEY_ACTIVE, KEY_START_TIME, KEY_EXERCISE_ID] {
            if let Err(e) = self.store.remove(NAMESPACE, key) {
                warn!(key, error = %e, "failed to clear workout state");
            }
        }
    }
}
