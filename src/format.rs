//! Presentation helpers
//!
//! Small formatting functions shared by the report encoder, the CLI, and any
//! display layer consuming analytics records.

use crate::types::sanitize_seconds;

/// Split seconds into whole minutes and remaining whole seconds (fraction truncated)
fn split_minutes(seconds: f64) -> (u64, u64) {
    let whole = sanitize_seconds(seconds).floor() as u64;
    (whole / 60, whole % 60)
}

/// Render seconds as `M:SS`
///
/// ```
/// assert_eq!(solvetrace::format::format_time(125.9), "2:05");
/// ```
pub fn format_time(seconds: f64) -> String {
    let (minutes, secs) = split_minutes(seconds);
    format!("{minutes}:{secs:02}")
}

/// Render seconds as `"M minutes S seconds"`, dropping zero clauses
pub fn format_time_verbose(seconds: f64) -> String {
    let (minutes, secs) = split_minutes(seconds);

    match (minutes, secs) {
        (0, s) => plural(s, "second"),
        (m, 0) => plural(m, "minute"),
        (m, s) => format!("{} {}", plural(m, "minute"), plural(s, "second")),
    }
}

fn plural(count: u64, unit: &str) -> String {
    if count == 1 {
        format!("{count} {unit}")
    } else {
        format!("{count} {unit}s")
    }
}

/// Whole-number percentage of `part` in `total`, 0 when `total` is 0
pub fn percentage(part: f64, total: f64) -> u32 {
    let total = sanitize_seconds(total);
    if total == 0.0 {
        return 0;
    }
    (100.0 * sanitize_seconds(part) / total).round() as u32
}

/// `percentage` rendered as a string
pub fn format_percentage(part: f64, total: f64) -> String {
    percentage(part, total).to_string()
}
