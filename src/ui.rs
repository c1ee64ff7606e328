use chrono::{Local, Utc};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};
use time_humanize::{Accuracy, HumanTime, Tense};

use crate::summary::{chart_heights, WEEKLY_SESSION_TARGET};
use crate::tracker::WorkoutState;
use crate::util::{format_duration, muscle_groups_label, MAX_VISIBLE_MUSCLE_GROUPS};
use crate::{App, View};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;
const CHART_BAR_CELLS: usize = 24;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.view {
            View::Tracker => render_tracker(self, area, buf),
            View::Goals => render_goals(self, area, buf),
            View::Summary => render_summary(self, area, buf),
        }
    }
}

fn render_tracker(app: &App, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let green_bold_style = Style::default().patch(bold_style).fg(Color::Green);
    let dim_style = Style::default().add_modifier(Modifier::DIM);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // state line
            Constraint::Length(1), // elapsed clock
            Constraint::Length(1), // padding
            Constraint::Length(1), // goals header
            Constraint::Min(1),    // goal list
            Constraint::Length(1), // last workout card
            Constraint::Length(1), // legend
        ])
        .split(area);

    let state_line = match app.tracker.state() {
        WorkoutState::Active => {
            let name = app
                .tracker
                .exercise()
                .map(|e| e.name)
                .unwrap_or("workout");
            Paragraph::new(Span::styled(format!("ACTIVE: {}", name), green_bold_style))
                .alignment(Alignment::Center)
        }
        WorkoutState::Idle => Paragraph::new(Span::styled(
            "IDLE - press (s) to start your first goal",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::ITALIC),
        ))
        .alignment(Alignment::Center),
    };
    state_line.render(chunks[0], buf);

    let clock_style = match app.tracker.state() {
        WorkoutState::Active => bold_style,
        WorkoutState::Idle => dim_style,
    };
    let clock = Paragraph::new(Span::styled(
        format_duration(app.tracker.elapsed_ms()),
        clock_style,
    ))
    .alignment(Alignment::Center);
    clock.render(chunks[1], buf);

    let goals = app.goals.goals();
    let header = Paragraph::new(Span::styled(
        format!("goals ({})", goals.len()),
        bold_style,
    ));
    header.render(chunks[3], buf);

    let goal_lines: Vec<Line> = if goals.is_empty() {
        vec![Line::from(Span::styled(
            "no goals yet, press (g) to pick some",
            dim_style,
        ))]
    } else {
        goals
            .iter()
            .map(|goal| {
                let marker = if goal.active { "●" } else { " " };
                let style = if goal.active {
                    green_bold_style
                } else {
                    Style::default()
                };
                Line::from(vec![
                    Span::styled(
                        format!("{} {}. {}", marker, goal.priority, goal.exercise.name),
                        style,
                    ),
                    Span::styled(
                        format!(
                            "  [{}]",
                            muscle_groups_label(
                                goal.exercise.muscle_groups,
                                MAX_VISIBLE_MUSCLE_GROUPS
                            )
                        ),
                        dim_style,
                    ),
                ])
            })
            .collect()
    };
    Paragraph::new(goal_lines).render(chunks[4], buf);

    if let Some(last) = app.tracker.last_workout() {
        let since = (Utc::now() - last.ended_at).num_seconds().max(0) as u64;
        let ago = HumanTime::from(std::time::Duration::from_secs(since))
            .to_text_en(Accuracy::Rough, Tense::Past);
        let card = Paragraph::new(Span::styled(
            format!(
                "last workout: {}  {}  {} cal  ({})",
                last.exercise_name,
                format_duration(last.duration_ms),
                last.calories_burned,
                ago
            ),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
        ));
        card.render(chunks[5], buf);
    }

    let legend = Paragraph::new(Span::styled(
        "(s)tart / (x) stop / (g)oals / su(m)mary / (esc)ape",
        italic_style,
    ));
    legend.render(chunks[6], buf);
}

fn render_goals(app: &App, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let green_bold_style = Style::default().patch(bold_style).fg(Color::Green);
    let dim_style = Style::default().add_modifier(Modifier::DIM);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);
    let cursor_style = Style::default().patch(bold_style).fg(Color::Yellow);

    let goals = app.goals.goals();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints(vec![
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(app.suggestions.len().max(1) as u16),
            Constraint::Length(1),
        ])
        .split(area);

    let header = Paragraph::new(Span::styled(
        format!("goals ({} selected)", goals.len()),
        bold_style,
    ));
    header.render(chunks[0], buf);

    let goal_lines: Vec<Line> = if goals.is_empty() {
        vec![Line::from(Span::styled("nothing selected yet", dim_style))]
    } else {
        goals
            .iter()
            .enumerate()
            .map(|(i, goal)| {
                let cursor = if i == app.cursor { "> " } else { "  " };
                let marker = if goal.active { "●" } else { " " };
                let style = if i == app.cursor {
                    cursor_style
                } else if goal.active {
                    green_bold_style
                } else {
                    Style::default()
                };
                Line::from(vec![
                    Span::styled(
                        format!(
                            "{}{} {}. {}",
                            cursor, marker, goal.priority, goal.exercise.name
                        ),
                        style,
                    ),
                    Span::styled(
                        format!(
                            "  [{}]",
                            muscle_groups_label(
                                goal.exercise.muscle_groups,
                                MAX_VISIBLE_MUSCLE_GROUPS
                            )
                        ),
                        dim_style,
                    ),
                ])
            })
            .collect()
    };
    Paragraph::new(goal_lines).render(chunks[1], buf);

    let sugg_header = Paragraph::new(Span::styled("suggestions", bold_style));
    sugg_header.render(chunks[2], buf);

    let sugg_lines: Vec<Line> = if app.suggestions.is_empty() {
        vec![Line::from(Span::styled(
            "every exercise is already a goal",
            dim_style,
        ))]
    } else {
        app.suggestions
            .iter()
            .enumerate()
            .map(|(i, exercise)| {
                let row = goals.len() + i;
                let cursor = if row == app.cursor { "> " } else { "  " };
                let style = if row == app.cursor {
                    cursor_style
                } else {
                    Style::default()
                };
                Line::from(vec![
                    Span::styled(format!("{}+ {}", cursor, exercise.name), style),
                    Span::styled(format!("  ({})", exercise.category), dim_style),
                ])
            })
            .collect()
    };
    Paragraph::new(sugg_lines).render(chunks[3], buf);

    let legend = Paragraph::new(Span::styled(
        "(enter) toggle / (r)eshuffle / (j/k) move / (t)racker / (esc)ape",
        italic_style,
    ));
    legend.render(chunks[4], buf);
}

fn render_summary(app: &App, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let dim_style = Style::default().add_modifier(Modifier::DIM);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);
    let magenta_style = Style::default().fg(Color::Magenta);

    let summary = &app.summary;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // streak and averages
            Constraint::Length(1), // weekly progress
            Constraint::Length(1), // padding
            Constraint::Length(1), // breakdown header
            Constraint::Length(5), // five day table
            Constraint::Length(1), // padding
            Constraint::Length(5), // duration chart
            Constraint::Length(1), // padding
            Constraint::Length(1), // recent header
            Constraint::Min(1),    // recent sessions
            Constraint::Length(1), // legend
        ])
        .split(area);

    let stats = Paragraph::new(Span::styled(
        format!(
            "{} day streak   last 5 days: {} sessions   {} avg   {} cal",
            summary.streak,
            summary.stats.total_sessions,
            format_duration(summary.stats.average_duration_ms),
            summary.stats.total_calories
        ),
        bold_style,
    ))
    .alignment(Alignment::Center);
    stats.render(chunks[0], buf);

    let done = summary.stats.total_sessions.min(WEEKLY_SESSION_TARGET);
    let meter = "▰".repeat(done) + &"▱".repeat(WEEKLY_SESSION_TARGET - done);
    let progress = Paragraph::new(Span::styled(
        format!(
            "{}  {} of {} workouts this week",
            meter, summary.stats.total_sessions, WEEKLY_SESSION_TARGET
        ),
        dim_style,
    ))
    .alignment(Alignment::Center);
    progress.render(chunks[1], buf);

    let breakdown_header = Paragraph::new(Span::styled("last 5 days", bold_style));
    breakdown_header.render(chunks[3], buf);

    let day_lines: Vec<Line> = summary
        .days
        .iter()
        .map(|day| {
            let peak = day
                .peak_intensity
                .map(|i| format!("  {}", i))
                .unwrap_or_default();
            Line::from(vec![
                Span::styled(
                    format!("{}  {:<11}", day.date.format("%a %m/%d"), day.focus),
                    Style::default(),
                ),
                Span::styled(
                    format!(
                        "  {:>9}  {:>4} cal  {} session{}{}",
                        format_duration(day.total_duration_ms),
                        day.total_calories,
                        day.session_count,
                        if day.session_count == 1 { "" } else { "s" },
                        peak
                    ),
                    dim_style,
                ),
            ])
        })
        .collect();
    Paragraph::new(day_lines).render(chunks[4], buf);

    let heights = chart_heights(&summary.days);
    let chart_lines: Vec<Line> = summary
        .days
        .iter()
        .zip(heights)
        .map(|(day, ratio)| {
            let filled = (ratio * CHART_BAR_CELLS as f64).round() as usize;
            Line::from(vec![
                Span::styled(format!("{}  ", day.date.format("%a")), dim_style),
                Span::styled("█".repeat(filled), magenta_style),
                Span::styled(
                    format!("  {}", format_duration(day.total_duration_ms)),
                    dim_style,
                ),
            ])
        })
        .collect();
    Paragraph::new(chart_lines).render(chunks[6], buf);

    let recent_header = Paragraph::new(Span::styled("recent sessions", bold_style));
    recent_header.render(chunks[8], buf);

    let recent_lines: Vec<Line> = if summary.recent.is_empty() {
        vec![Line::from(Span::styled("no workouts logged yet", dim_style))]
    } else {
        summary
            .recent
            .iter()
            .map(|session| {
                Line::from(vec![
                    Span::styled(
                        format!(
                            "{}  {:<16}",
                            session.end_time.with_timezone(&Local).format("%m/%d %H:%M"),
                            session.exercise.name
                        ),
                        Style::default(),
                    ),
                    Span::styled(
                        format!(
                            "{:>9}  {:>4} cal  {}",
                            format_duration(session.duration_ms),
                            session.calories_burned,
                            session.intensity
                        ),
                        dim_style,
                    ),
                ])
            })
            .collect()
    };
    Paragraph::new(recent_lines).render(chunks[9], buf);

    let legend = Paragraph::new(Span::styled(
        "(t)racker / (g)oals / (esc)ape",
        italic_style,
    ));
    legend.render(chunks[10], buf);
}
