//! Countdown strings for scheduled sends.
//!
//! All arithmetic happens in UTC; local time only appears in the absolute
//! part of the output.

use chrono::{DateTime, Local, Utc};

use crate::classify::is_overdue;

/// Absolute send time as shown next to a countdown, e.g. `Apr 26 3:05 PM`.
pub fn format_absolute(target: DateTime<Utc>) -> String {
    target
        .with_timezone(&Local)
        .format("%b %-d %-I:%M %p")
        .to_string()
}

/// `HH:MM:SS (<abs>)`, `overdue (<abs>)`, or empty when nothing is scheduled.
pub fn format_countdown(now: DateTime<Utc>, target: Option<DateTime<Utc>>) -> String {
    let Some(target) = target else {
        return String::new();
    };
    let abs = format_absolute(target);
    if is_overdue(now, target) {
        return format!("overdue ({abs})");
    }
    let total = (target - now).num_seconds();
    let h = total / 3600;
    let m = (total % 3600) / 60;
    let s = total % 60;
    format!("{h:02}:{m:02}:{s:02} ({abs})")
}

/// Rough distance between `now` and `target`, unsigned: "a few seconds",
/// "5 minutes", "an hour", "2 days" and so on.
pub fn humanize_until(now: DateTime<Utc>, target: DateTime<Utc>) -> String {
    let secs = (target - now).num_seconds().unsigned_abs() as f64;
    let minutes = secs / 60.0;
    let hours = minutes / 60.0;
    let days = hours / 24.0;
    let months = days / 30.4;
    let years = days / 365.0;

    let plural = |n: f64, unit: &str| format!("{} {unit}s", n.round() as u64);

    if secs < 45.0 {
        "a few seconds".to_string()
    } else if secs < 90.0 {
        "a minute".to_string()
    } else if minutes < 44.5 {
        plural(minutes, "minute")
    } else if minutes < 90.0 {
        "an hour".to_string()
    } else if hours < 21.5 {
        plural(hours, "hour")
    } else if hours < 36.0 {
        "a day".to_string()
    } else if days < 25.5 {
        plural(days, "day")
    } else if days < 46.0 {
        "a month".to_string()
    } else if months < 10.5 {
        plural(months, "month")
    } else if months < 18.0 {
        "a year".to_string()
    } else {
        plural(years, "year")
    }
}
