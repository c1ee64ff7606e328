pub mod app_dirs;
pub mod exercises;
pub mod goals;
pub mod runtime;
pub mod sessions;
pub mod store;
pub mod summary;
pub mod tracker;
pub mod ui;
pub mod util;

use chrono::Local;
use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use itertools::Itertools;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    cmp::Reverse,
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    rc::Rc,
    time::Duration,
};
use tracing_subscriber::EnvFilter;

use crate::exercises::{Exercise, ExerciseCategory, MuscleGroup};
use crate::goals::GoalRepository;
use crate::runtime::{AppEvent, CrosstermEventSource, EventSource, FixedTicker, Runner, Ticker};
use crate::sessions::{EnergyLevel, MoodRating, SessionRepository, WorkoutSession};
use crate::store::{PrefStore, Store};
use crate::summary::SummaryOverview;
use crate::tracker::{StopAnnotations, WorkoutState, WorkoutTracker};
use crate::util::format_duration;

const TICK_RATE_MS: u64 = 1000;
const SUGGESTION_COUNT: usize = 5;

/// terminal workout tracker with goal priorities and daily stats
#[derive(Parser, Debug)]
#[clap(
    version,
    about,
    long_about = "A terminal workout tracker: pick exercise goals in priority order, time sessions against them, and review streaks, calories, and a five day breakdown."
)]
pub struct Cli {
    /// override the state database location
    #[clap(long, global = true, value_name = "PATH")]
    store: Option<PathBuf>,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// list the exercise catalog
    Exercises {
        /// only this category
        #[clap(long, value_enum)]
        category: Option<ExerciseCategory>,

        /// only exercises working this muscle group
        #[clap(long, value_enum)]
        muscle: Option<MuscleGroup>,
    },
    /// list selected goals in priority order
    Goals,
    /// add an exercise to the goal list
    Select { exercise_id: String },
    /// remove an exercise from the goal list
    Deselect { exercise_id: String },
    /// pick random exercises that are not goals yet
    Suggest {
        #[clap(long, default_value_t = SUGGESTION_COUNT)]
        count: usize,
    },
    /// start timing a workout
    Start { exercise_id: Option<String> },
    /// stop the running workout and log it
    Stop {
        #[clap(long)]
        notes: Option<String>,

        #[clap(long, value_enum)]
        mood_before: Option<MoodRating>,

        #[clap(long, value_enum)]
        mood_after: Option<MoodRating>,

        #[clap(long, value_enum)]
        energy_before: Option<EnergyLevel>,

        #[clap(long, value_enum)]
        energy_after: Option<EnergyLevel>,
    },
    /// show the tracker state and live elapsed time
    Status,
    /// list recent sessions, most recent first
    Log {
        #[clap(long, default_value_t = 7)]
        days: i64,
    },
    /// streak, averages and the five day breakdown
    Summary,
    /// dump the whole session log as csv
    Export { path: Option<PathBuf> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Tracker,
    Goals,
    Summary,
}

pub struct App {
    pub goals: GoalRepository,
    pub sessions: SessionRepository,
    pub tracker: WorkoutTracker,
    pub view: View,
    pub cursor: usize,
    pub suggestions: Vec<&'static Exercise>,
    pub summary: SummaryOverview,
}

impl App {
    pub fn new(store: Rc<dyn PrefStore>) -> Self {
        let goals = GoalRepository::new(Rc::clone(&store));
        let sessions = SessionRepository::new(Rc::clone(&store));
        let mut tracker = WorkoutTracker::new(store);
        tracker.resume();

        let suggestions = goals.get_random_exercises(SUGGESTION_COUNT);
        let summary = SummaryOverview::load(&sessions);

        Self {
            goals,
            sessions,
            tracker,
            view: View::Tracker,
            cursor: 0,
            suggestions,
            summary,
        }
    }

    pub fn refresh_summary(&mut self) {
        self.summary = SummaryOverview::load(&self.sessions);
    }

    pub fn reshuffle(&mut self) {
        self.suggestions = self.goals.get_random_exercises(SUGGESTION_COUNT);
        self.clamp_cursor();
    }

    pub fn start_workout(&mut self) -> bool {
        self.tracker.start(&mut self.goals, None)
    }

    pub fn stop_workout(&mut self, annotations: StopAnnotations) -> bool {
        let saved = self.tracker.stop(&mut self.goals, &self.sessions, annotations);
        self.refresh_summary();
        saved.is_some()
    }

    pub fn move_cursor(&mut self, delta: i64) {
        let rows = self.rows();
        if rows == 0 {
            return;
        }
        let moved = self.cursor as i64 + delta;
        self.cursor = moved.clamp(0, rows as i64 - 1) as usize;
    }

    /// Toggle the row under the cursor: deselect a goal, or select a
    /// suggestion (which then leaves the suggestion list).
    pub fn toggle_at_cursor(&mut self) {
        let selected = self.goals.goals().len();
        if self.cursor < selected {
            let exercise = self.goals.goals()[self.cursor].exercise;
            self.goals.deselect_goal(exercise);
            self.suggestions.insert(0, exercise);
        } else if let Some(&exercise) = self.suggestions.get(self.cursor - selected) {
            self.goals.select_goal(exercise);
            self.suggestions.retain(|e| e.id != exercise.id);
        }
        self.clamp_cursor();
    }

    fn rows(&self) -> usize {
        self.goals.goals().len() + self.suggestions.len()
    }

    fn clamp_cursor(&mut self) {
        let rows = self.rows();
        if rows == 0 {
            self.cursor = 0;
        } else if self.cursor >= rows {
            self.cursor = rows - 1;
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let store = match &cli.store {
        Some(path) => Store::open(path)?,
        None => Store::new()?,
    };
    let store: Rc<dyn PrefStore> = Rc::new(store);

    match cli.command {
        Some(command) => run_command(command, store),
        None => run_dashboard(store),
    }
}

fn run_dashboard(store: Rc<dyn PrefStore>) -> Result<(), Box<dyn Error>> {
    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(
            ErrorKind::Io,
            "the dashboard needs a tty (try `sweat status` for a one-shot view)",
        )
        .exit();
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(store);
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );
    let res = run_event_loop(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn run_event_loop<B: Backend, E: EventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    loop {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        match runner.step() {
            AppEvent::Tick => {
                if app.tracker.state() == WorkoutState::Active {
                    app.tracker.on_tick();
                }
            }
            AppEvent::Resize => {}
            AppEvent::Key(key) => {
                if handle_key(app, key) {
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Returns true when the dashboard should exit
fn handle_key(app: &mut App, key: KeyEvent) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return true;
    }

    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => return true,
        KeyCode::Char('t') => {
            app.view = View::Tracker;
        }
        KeyCode::Char('g') => {
            app.view = View::Goals;
            app.clamp_cursor();
        }
        KeyCode::Char('m') => {
            app.refresh_summary();
            app.view = View::Summary;
        }
        KeyCode::Char('s') => {
            app.start_workout();
            app.view = View::Tracker;
        }
        KeyCode::Char('x') => {
            app.stop_workout(StopAnnotations::default());
        }
        KeyCode::Char('r') => {
            if app.view == View::Goals {
                app.reshuffle();
            }
        }
        KeyCode::Char('j') | KeyCode::Down => {
            if app.view == View::Goals {
                app.move_cursor(1);
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            if app.view == View::Goals {
                app.move_cursor(-1);
            }
        }
        KeyCode::Enter => {
            if app.view == View::Goals {
                app.toggle_at_cursor();
            }
        }
        _ => {}
    }

    false
}

fn run_command(command: Command, store: Rc<dyn PrefStore>) -> Result<(), Box<dyn Error>> {
    let mut goals = GoalRepository::new(Rc::clone(&store));
    let sessions = SessionRepository::new(Rc::clone(&store));
    let mut tracker = WorkoutTracker::new(store);
    tracker.resume();

    match command {
        Command::Exercises { category, muscle } => {
            for exercise in filtered_exercises(category, muscle) {
                println!(
                    "{:<18} {:<24} {:<12} {}",
                    exercise.id,
                    exercise.name,
                    exercise.category.to_string(),
                    exercise
                        .muscle_groups
                        .iter()
                        .map(|g| g.to_string())
                        .join(", ")
                );
            }
        }
        Command::Goals => {
            let list = goals.goals();
            if list.is_empty() {
                println!("no goals selected");
            }
            for goal in list {
                let marker = if goal.active { "*" } else { " " };
                println!(
                    "{} {}. {:<24} ({})",
                    marker, goal.priority, goal.exercise.name, goal.exercise.id
                );
            }
        }
        Command::Select { exercise_id } => {
            let exercise = find_or_exit(&exercise_id);
            goals.select_goal(exercise);
            let priority = goals
                .goals()
                .iter()
                .find(|g| g.exercise.id == exercise.id)
                .map(|g| g.priority)
                .unwrap_or_default();
            println!("selected {} (priority {})", exercise.name, priority);
        }
        Command::Deselect { exercise_id } => {
            let exercise = find_or_exit(&exercise_id);
            let was_goal = goals.goals().iter().any(|g| g.exercise.id == exercise.id);
            goals.deselect_goal(exercise);
            if was_goal {
                println!("deselected {}", exercise.name);
            } else {
                println!("{} was not a goal", exercise.name);
            }
        }
        Command::Suggest { count } => {
            for exercise in goals.get_random_exercises(count) {
                println!("{:<18} {}", exercise.id, exercise.name);
            }
        }
        Command::Start { exercise_id } => {
            if tracker.state() == WorkoutState::Active {
                if let Some(exercise) = tracker.exercise() {
                    println!(
                        "already tracking {} ({})",
                        exercise.name,
                        format_duration(tracker.elapsed_ms())
                    );
                }
                return Ok(());
            }
            let exercise = exercise_id.map(|id| find_or_exit(&id));
            if tracker.start(&mut goals, exercise) {
                if let Some(exercise) = tracker.exercise() {
                    println!("started {}", exercise.name);
                }
            } else {
                println!("nothing to start: give an exercise id or select a goal first");
            }
        }
        Command::Stop {
            notes,
            mood_before,
            mood_after,
            energy_before,
            energy_after,
        } => {
            let was_active = tracker.state() == WorkoutState::Active;
            let annotations = StopAnnotations {
                notes,
                mood_before,
                mood_after,
                energy_before,
                energy_after,
            };
            match tracker.stop(&mut goals, &sessions, annotations) {
                Some(session) => {
                    print!("logged ");
                    print_session_line(&session);
                }
                None if was_active => println!("workout discarded (zero duration)"),
                None => println!("no workout running"),
            }
        }
        Command::Status => match tracker.state() {
            WorkoutState::Active => {
                if let Some(exercise) = tracker.exercise() {
                    println!(
                        "ACTIVE: {} ({})",
                        exercise.name,
                        format_duration(tracker.elapsed_ms())
                    );
                }
            }
            WorkoutState::Idle => println!("IDLE"),
        },
        Command::Log { days } => {
            let mut list = sessions.get_workout_sessions_for_last_days(days);
            if list.is_empty() {
                println!("no sessions in the last {} days", days);
            }
            list.sort_by_key(|s| Reverse(s.end_time));
            for session in &list {
                print_session_line(session);
            }
        }
        Command::Summary => {
            let overview = SummaryOverview::load(&sessions);
            println!(
                "streak: {} day{}",
                overview.streak,
                if overview.streak == 1 { "" } else { "s" }
            );
            println!(
                "last 5 days: {} sessions, {} avg, {} cal",
                overview.stats.total_sessions,
                format_duration(overview.stats.average_duration_ms),
                overview.stats.total_calories
            );
            for day in &overview.days {
                println!(
                    "{}  {:<11} {:>9}  {:>4} cal  {} session{}",
                    day.date.format("%a %m/%d"),
                    day.focus,
                    format_duration(day.total_duration_ms),
                    day.total_calories,
                    day.session_count,
                    if day.session_count == 1 { "" } else { "s" }
                );
            }
        }
        Command::Export { path } => {
            let path = path.unwrap_or_else(|| PathBuf::from("sessions.csv"));
            let all = sessions.get_all_workout_sessions();
            let mut writer = csv::Writer::from_path(&path)?;
            writer.write_record([
                "id",
                "exercise",
                "category",
                "start",
                "end",
                "duration_ms",
                "intensity",
                "calories",
                "notes",
            ])?;
            for session in &all {
                writer.write_record([
                    session.id.to_string(),
                    session.exercise.name.clone(),
                    session.exercise.category.to_string(),
                    session.start_time.to_rfc3339(),
                    session.end_time.to_rfc3339(),
                    session.duration_ms.to_string(),
                    session.intensity.to_string(),
                    session.calories_burned.to_string(),
                    session.notes.clone().unwrap_or_default(),
                ])?;
            }
            writer.flush()?;
            println!("wrote {} sessions to {}", all.len(), path.display());
        }
    }

    Ok(())
}

fn filtered_exercises(
    category: Option<ExerciseCategory>,
    muscle: Option<MuscleGroup>,
) -> Vec<&'static Exercise> {
    exercises::all()
        .iter()
        .filter(|e| category.map_or(true, |c| e.category == c))
        .filter(|e| muscle.map_or(true, |m| e.muscle_groups.contains(&m)))
        .collect()
}

fn find_or_exit(exercise_id: &str) -> &'static Exercise {
    match exercises::find(exercise_id) {
        Some(exercise) => exercise,
        None => {
            eprintln!(
                "unknown exercise: {} (run `sweat exercises` for the catalog)",
                exercise_id
            );
            std::process::exit(2);
        }
    }
}

fn print_session_line(session: &WorkoutSession) {
    println!(
        "{}  {:<24} {:>9}  {:>4} cal  {}",
        session.end_time.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
        session.exercise.name,
        format_duration(session.duration_ms),
        session.calories_burned,
        session.intensity
    );
}
