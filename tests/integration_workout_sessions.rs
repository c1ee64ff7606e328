use std::path::Path;
use std::rc::Rc;

use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Utc};
use tempfile::tempdir;
use uuid::Uuid;

use sweat::exercises::{self, ExerciseRecord};
use sweat::goals::GoalRepository;
use sweat::sessions::{SessionRepository, WorkoutIntensity, WorkoutSession};
use sweat::store::{PrefStore, Store};
use sweat::tracker::{StopAnnotations, WorkoutState, WorkoutTracker};

/// Integration tests for workout session workflows against a real database
/// file. Each Store reopen stands in for a fresh app launch, so everything
/// asserted here has to round-trip through disk.

fn open(dir: &Path) -> Rc<dyn PrefStore> {
    Rc::new(Store::open(dir.join("sweat.db")).unwrap())
}

fn at_noon(date: NaiveDate) -> DateTime<Utc> {
    Local
        .from_local_datetime(&date.and_hms_opt(12, 0, 0).unwrap())
        .single()
        .unwrap()
        .with_timezone(&Utc)
}

fn logged_session(exercise_id: &str, end: DateTime<Utc>, minutes: i64) -> WorkoutSession {
    let exercise = exercises::find(exercise_id).unwrap();
    let duration_ms = minutes * 60_000;
    WorkoutSession {
        id: Uuid::new_v4(),
        exercise: ExerciseRecord::from(exercise),
        start_time: end - Duration::milliseconds(duration_ms),
        end_time: end,
        duration_ms,
        intensity: WorkoutIntensity::from_duration_ms(duration_ms),
        calories_burned: minutes as i32 * exercise.category.calories_per_minute(),
        notes: None,
        mood_before: None,
        mood_after: None,
        energy_before: None,
        energy_after: None,
    }
}

#[test]
fn workout_goals_survive_a_reopen_in_priority_order() {
    let dir = tempdir().unwrap();

    // Launch 1: pick three goals, newest selection lands on top
    {
        let mut goals = GoalRepository::new(open(dir.path()));
        goals.select_goal(exercises::find("push_ups").unwrap());
        goals.select_goal(exercises::find("squats").unwrap());
        goals.select_goal(exercises::find("running").unwrap());
    }

    // Launch 2: same order and priorities come back from disk
    let goals = GoalRepository::new(open(dir.path()));
    let ids: Vec<&str> = goals.goals().iter().map(|g| g.exercise.id).collect();
    assert_eq!(ids, vec!["running", "squats", "push_ups"]);
    let priorities: Vec<i32> = goals.goals().iter().map(|g| g.priority).collect();
    assert_eq!(priorities, vec![3, 2, 1]);
}

#[test]
fn workout_resumes_in_a_second_launch() {
    let dir = tempdir().unwrap();
    let started;

    // Launch 1: start a workout and walk away
    {
        let store = open(dir.path());
        let mut goals = GoalRepository::new(Rc::clone(&store));
        let mut tracker = WorkoutTracker::new(store);
        assert!(tracker.start(&mut goals, exercises::find("cycling")));
        started = tracker.start_time().unwrap();
    }

    // Launch 2: resume picks the workout back up with the original clock
    let store = open(dir.path());
    let goals = GoalRepository::new(Rc::clone(&store));
    let mut tracker = WorkoutTracker::new(store);
    assert_eq!(tracker.resume(), WorkoutState::Active);
    assert_eq!(tracker.exercise().map(|e| e.id), Some("cycling"));
    assert_eq!(
        tracker.start_time().map(|t| t.timestamp_millis()),
        Some(started.timestamp_millis())
    );
    assert_eq!(
        goals.get_active_goal().map(|g| g.exercise.id),
        Some("cycling")
    );
}

#[test]
fn workout_stopped_in_a_second_launch_logs_the_full_duration() {
    let dir = tempdir().unwrap();

    // Launch 1: start only
    {
        let store = open(dir.path());
        let mut goals = GoalRepository::new(Rc::clone(&store));
        let mut tracker = WorkoutTracker::new(store);
        assert!(tracker.start(&mut goals, exercises::find("planks")));
    }

    // Time passes between launches
    std::thread::sleep(std::time::Duration::from_millis(30));

    // Launch 2: resume and stop, the saved duration covers both launches
    let store = open(dir.path());
    let mut goals = GoalRepository::new(Rc::clone(&store));
    let sessions = SessionRepository::new(Rc::clone(&store));
    let mut tracker = WorkoutTracker::new(store);
    tracker.resume();
    let saved = tracker
        .stop(&mut goals, &sessions, StopAnnotations::default())
        .expect("resumed workout should log a session");
    assert_eq!(saved.exercise.id, "planks");
    assert!(saved.duration_ms >= 30);
    assert_eq!(sessions.get_all_workout_sessions().len(), 1);
    assert!(goals.get_active_goal().is_none());

    // Launch 3: nothing left to resume
    let mut fresh = WorkoutTracker::new(open(dir.path()));
    assert_eq!(fresh.resume(), WorkoutState::Idle);
}

#[test]
fn workout_streak_spans_adjacent_days_across_launches() {
    let dir = tempdir().unwrap();
    let today = Local::now().date_naive();
    let yesterday = today.pred_opt().unwrap();

    {
        let sessions = SessionRepository::new(open(dir.path()));
        sessions.save_workout_session(&logged_session("running", at_noon(yesterday), 30));
        sessions.save_workout_session(&logged_session("push_ups", at_noon(today), 20));
    }

    let sessions = SessionRepository::new(open(dir.path()));
    assert_eq!(sessions.get_completion_streak(), 2);
    assert_eq!(sessions.get_all_workout_sessions().len(), 2);
    assert_eq!(sessions.get_workout_sessions_for_date(yesterday).len(), 1);

    let stats = sessions.get_average_stats_for_last_days(7);
    assert_eq!(stats.total_sessions, 2);
    assert_eq!(stats.total_duration_ms, 50 * 60_000);
}

#[test]
fn workout_log_recovers_from_a_corrupt_blob() {
    let dir = tempdir().unwrap();

    // Someone mangled the stored JSON by hand
    {
        let store = open(dir.path());
        store
            .put("workout_sessions", "sessions", "{ not json")
            .unwrap();
    }

    let sessions = SessionRepository::new(open(dir.path()));
    assert!(sessions.get_all_workout_sessions().is_empty());
    assert_eq!(sessions.get_completion_streak(), 0);

    // The next save replaces the bad blob outright
    sessions.save_workout_session(&logged_session("basketball_drills", Utc::now(), 10));
    assert_eq!(sessions.get_all_workout_sessions().len(), 1);
}
