//! Time arithmetic on sessions. Pure functions, no store, no clock.

use crate::models::session::{Session, SessionStatus};
use chrono::{DateTime, Utc};

const MS_PER_HOUR: f64 = 3_600_000.0;

/// Worked seconds shown to the user at `now`.
///
/// Gross time since clock-in minus closed breaks minus the open break (if any).
/// Computed in milliseconds and floored once, so the value stays exactly
/// constant for the whole length of a break. A completed session is measured
/// up to its `end_time`, whatever `now` is. Never negative.
pub fn elapsed_seconds(session: &Session, now: DateTime<Utc>) -> i64 {
    let until = match (session.status, session.end_time) {
        (SessionStatus::Completed, Some(end)) => end,
        _ => now,
    };

    let gross_ms = (until - session.start_time).num_milliseconds();
    let open_ms = match (session.status, session.open_break()) {
        (SessionStatus::Break, Some(b)) => (until - b.start_time).num_milliseconds().max(0),
        _ => 0,
    };

    let net_ms = gross_ms - session.total_break_seconds * 1000 - open_ms;
    net_ms.max(0) / 1000
}

/// Net worked milliseconds of a completed session: (end − start) − breaks.
/// `None` while the session has no end time.
pub fn work_millis(session: &Session) -> Option<i64> {
    let end = session.end_time?;
    let gross = (end - session.start_time).num_milliseconds();
    Some((gross - session.total_break_seconds * 1000).max(0))
}

/// Decimal hours for the attendance record, rounded to 2 places.
pub fn total_hours(session: &Session) -> Option<f64> {
    let end = session.end_time?;
    let gross_h = (end - session.start_time).num_milliseconds() as f64 / MS_PER_HOUR;
    let break_h = session.total_break_seconds as f64 / 3600.0;
    Some(round2(gross_h - break_h))
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
