//! Uptime formatting.

use std::time::Duration;

const MINUTE: f64 = 60.0;
const HOUR: f64 = 3600.0;

/// Render uptime in the largest whole unit reached, with one decimal.
#[must_use]
pub fn format_uptime(uptime: Duration) -> String {
    let seconds = uptime.as_secs_f64();
    if seconds >= HOUR {
        format!("{:.1} hours", seconds / HOUR)
    } else if seconds >= MINUTE {
        format!("{:.1} minutes", seconds / MINUTE)
    } else {
        format!("{seconds:.1} seconds")
    }
}

/// Uptime in seconds rounded to two decimals.
#[must_use]
pub fn rounded_seconds(uptime: Duration) -> f64 {
    (uptime.as_secs_f64() * 100.0).round() / 100.0
}
