/// ANSI color helper utilities for terminal output.
use crate::models::attendance::AttendanceStatus;
use crate::models::location::WorkLocation;
use crate::models::session::TimerStatus;

pub const RESET: &str = "\x1b[0m";

pub const GREY: &str = "\x1b[90m";
pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const BLUE: &str = "\x1b[34m";
pub const CYAN: &str = "\x1b[36m";
pub const MAGENTA: &str = "\x1b[35m";

pub fn color_for_status(status: TimerStatus) -> &'static str {
    match status {
        TimerStatus::NotStarted => GREY,
        TimerStatus::Active => GREEN,
        TimerStatus::Break => YELLOW,
        TimerStatus::Completed => BLUE,
    }
}

pub fn color_for_attendance(status: AttendanceStatus) -> &'static str {
    match status {
        AttendanceStatus::Present => GREEN,
        AttendanceStatus::Late => YELLOW,
        AttendanceStatus::HalfDay => MAGENTA,
        AttendanceStatus::Absent => RED,
    }
}

pub fn color_for_location(loc: WorkLocation) -> &'static str {
    match loc {
        WorkLocation::Office => BLUE,
        WorkLocation::Home => CYAN,
        WorkLocation::ClientSite => YELLOW,
        WorkLocation::CoWorking => MAGENTA,
        WorkLocation::Other => RESET,
    }
}

pub fn paint(color: &str, value: &str) -> String {
    format!("{color}{value}{RESET}")
}

/// Ritorna formattazione colorata di un valore opzionale.
///
/// Esempio:
/// `colorize_optional("--:--")` → "<grey>--:--<reset>"
pub fn colorize_optional(value: &str) -> String {
    let v = value.trim();
    if v.is_empty() || v == "--:--" || v == "0.00h" {
        paint(GREY, value)
    } else {
        value.to_string()
    }
}
