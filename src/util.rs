use crate::exercises::MuscleGroup;

/// List renderings show at most this many muscle groups before eliding
pub const MAX_VISIBLE_MUSCLE_GROUPS: usize = 3;

/// Format a millisecond duration as mm:ss, or hh:mm:ss from an hour up
pub fn format_duration(millis: i64) -> String {
    let total_seconds = millis / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// Comma-joined muscle group labels, elided past `max_visible` as "+N"
pub fn muscle_groups_label(groups: &[MuscleGroup], max_visible: usize) -> String {
    let shown = groups
        .iter()
        .take(max_visible)
        .map(|g| g.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    if groups.len() > max_visible {
        format!("{} +{}", shown, groups.len() - max_visible)
    } else {
        shown
    }
}

/// Loose boolean used by the persisted flag formats: "true" in any
/// case is true, everything else is false
pub fn parse_flag(raw: &str) -> bool {
    raw.eq_ignore_ascii_case("true")
}
