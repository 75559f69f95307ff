//! Time utilities: elapsed-time display, local wall-clock rendering.

use chrono::{DateTime, Local, Utc};

/// `HH:MM:SS` for a number of seconds. Negative input shows as zero,
/// hours are not wrapped at 24.
pub fn format_hms(secs: i64) -> String {
    let s = secs.max(0);
    format!("{:02}:{:02}:{:02}", s / 3600, (s % 3600) / 60, s % 60)
}

/// Local `HH:MM` of a stored instant, `--:--` when missing.
pub fn local_hm(at: Option<DateTime<Utc>>) -> String {
    match at {
        Some(t) => t.with_timezone(&Local).format("%H:%M").to_string(),
        None => "--:--".to_string(),
    }
}
