//! Time display formatting
//!
//! Track durations render as `MM:SS`, switching to `HH:MM:SS` at one
//! hour. Used for list rows and the favorite table's display snapshot.

/// Format a millisecond duration for display
pub fn format_duration(ms: u64) -> String {
    let total_seconds = ms / 1000;
    let seconds = total_seconds % 60;
    let minutes = (total_seconds % 3600) / 60;

    if total_seconds >= 3600 {
        let hours = total_seconds / 3600;
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}
