//! Date/time helpers for request parsing and display.

use chrono::NaiveDateTime;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parses a local timestamp in any of the accepted formats.
pub fn parse_datetime(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
}

/// Whole minutes between two instants, truncated; zero when `end <= start`.
pub fn duration_minutes(start: &NaiveDateTime, end: &NaiveDateTime) -> i64 {
    if end <= start {
        return 0;
    }
    (*end - *start).num_seconds() / 60
}

/// Dutch display form: `45 minuten`, `2 uur`, `1 uur en 30 minuten`.
pub fn format_duration_display(minutes: i64) -> String {
    if minutes < 60 {
        return format!("{} minuten", minutes);
    }
    let hours = minutes / 60;
    let rest = minutes % 60;
    if rest == 0 {
        format!("{} uur", hours)
    } else {
        format!("{} uur en {} minuten", hours, rest)
    }
}
