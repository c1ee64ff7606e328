use std::rc::Rc;
use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

// Headless integration using the internal runtime + repositories without a TTY
// Verifies that a full select/start/tick/stop flow completes via Runner/TestEventSource.

fn key(c: char) -> sweat::runtime::AppEvent {
    sweat::runtime::AppEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
}

#[test]
fn headless_workout_flow_completes() {
    // Arrange: in-memory store shared by all three repositories
    let store: Rc<dyn sweat::store::PrefStore> =
        Rc::new(sweat::store::Store::open_in_memory().unwrap());
    let mut goals = sweat::goals::GoalRepository::new(Rc::clone(&store));
    let sessions = sweat::sessions::SessionRepository::new(Rc::clone(&store));
    let mut tracker = sweat::tracker::WorkoutTracker::new(Rc::clone(&store));

    goals.select_goal(sweat::exercises::find("push_ups").unwrap());

    // Channel for the test event source
    let (tx, rx) = mpsc::channel();

    // Create TestEventSource and Runner with a small tick interval
    let es = sweat::runtime::TestEventSource::new(rx);
    let ticker = sweat::runtime::FixedTicker::new(Duration::from_millis(5));
    let runner = sweat::runtime::Runner::new(es, ticker);

    // Producer: start first, stop once a few ticks have gone by
    tx.send(key('s')).unwrap();

    // Act: drive a tiny event loop until the stop lands (or bounded steps)
    let mut ticks = 0u32;
    let mut saved = None;
    for _ in 0..200u32 {
        match runner.step() {
            sweat::runtime::AppEvent::Tick => {
                if tracker.state() == sweat::tracker::WorkoutState::Active {
                    tracker.on_tick();
                    ticks += 1;
                    if ticks == 3 {
                        tx.send(key('x')).unwrap();
                    }
                }
            }
            sweat::runtime::AppEvent::Resize => {}
            sweat::runtime::AppEvent::Key(key) => match key.code {
                KeyCode::Char('s') => {
                    assert!(tracker.start(&mut goals, None), "top goal should start");
                }
                KeyCode::Char('x') => {
                    saved = tracker.stop(
                        &mut goals,
                        &sessions,
                        sweat::tracker::StopAnnotations::default(),
                    );
                    break;
                }
                _ => {}
            },
        }
    }

    // Assert: the workout was logged and the rollup sees it
    assert!(ticks >= 3, "the clock should have ticked while active");
    let session = saved.expect("stopping an active workout should log a session");
    assert_eq!(session.exercise.id, "push_ups");
    assert!(session.duration_ms > 0);

    assert_eq!(tracker.state(), sweat::tracker::WorkoutState::Idle);
    assert_eq!(tracker.elapsed_ms(), 0);
    assert_eq!(sessions.get_all_workout_sessions().len(), 1);
    assert_eq!(sessions.get_completion_streak(), 1);

    let overview = sweat::summary::SummaryOverview::load(&sessions);
    assert_eq!(overview.stats.total_sessions, 1);
    let today = overview.days.last().expect("five day rows");
    assert_eq!(today.session_count, 1);
    assert_eq!(today.focus, "Strength");
}

#[test]
fn headless_start_without_goals_does_nothing() {
    // No goals and no explicit exercise: start must refuse
    let store: Rc<dyn sweat::store::PrefStore> =
        Rc::new(sweat::store::Store::open_in_memory().unwrap());
    let mut goals = sweat::goals::GoalRepository::new(Rc::clone(&store));
    let sessions = sweat::sessions::SessionRepository::new(Rc::clone(&store));
    let mut tracker = sweat::tracker::WorkoutTracker::new(Rc::clone(&store));

    assert!(!tracker.start(&mut goals, None));
    assert_eq!(tracker.state(), sweat::tracker::WorkoutState::Idle);

    let saved = tracker.stop(
        &mut goals,
        &sessions,
        sweat::tracker::StopAnnotations::default(),
    );
    assert!(saved.is_none());
    assert!(sessions.get_all_workout_sessions().is_empty());
}

#[test]
fn headless_ticks_advance_the_clock() {
    // Quiet queue: every step times out into a Tick that moves elapsed along
    let store: Rc<dyn sweat::store::PrefStore> =
        Rc::new(sweat::store::Store::open_in_memory().unwrap());
    let mut goals = sweat::goals::GoalRepository::new(Rc::clone(&store));
    let mut tracker = sweat::tracker::WorkoutTracker::new(Rc::clone(&store));

    assert!(tracker.start(&mut goals, sweat::exercises::find("running")));

    let (_tx, rx) = mpsc::channel();
    let es = sweat::runtime::TestEventSource::new(rx);
    let ticker = sweat::runtime::FixedTicker::new(Duration::from_millis(10));
    let runner = sweat::runtime::Runner::new(es, ticker);

    for _ in 0..5u32 {
        // up to ~50ms
        if let sweat::runtime::AppEvent::Tick = runner.step() {
            tracker.on_tick();
        }
    }

    assert!(
        tracker.elapsed_ms() > 0,
        "elapsed should grow across quiet ticks"
    );
}
