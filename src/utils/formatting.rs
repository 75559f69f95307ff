//! Formatting utilities used for CLI and export outputs.

/// `07h 45m` (or `07:45` when `short`) for a number of seconds.
pub fn secs2readable(secs: i64, short: bool) -> String {
    let mins = secs.max(0) / 60;
    let hours = mins / 60;
    let minutes = mins % 60;

    if short {
        format!("{:02}:{:02}", hours, minutes)
    } else {
        format!("{:02}h {:02}m", hours, minutes)
    }
}

/// Decimal hours as stored in attendance records, e.g. `7.75h`.
pub fn hours2readable(hours: f64) -> String {
    format!("{hours:.2}h")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readable_durations() {
        assert_eq!(secs2readable(27_900, false), "07h 45m");
        assert_eq!(secs2readable(27_959, true), "07:45");
        assert_eq!(secs2readable(-1, true), "00:00");
        assert_eq!(hours2readable(7.75), "7.75h");
    }
}
