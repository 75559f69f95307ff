//! Dashboard figures derived from the attendance records of one user.

use crate::core::calculator::round2;
use crate::errors::SessionResult;
use crate::models::attendance::{AttendanceStatus, AttendanceSummary};
use crate::store::{AttendanceFilter, AttendanceStore};
use chrono::{Datelike, Days, NaiveDate};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DashboardStats {
    pub week_hours: f64,
    pub month_hours: f64,
    /// Present days over all recorded days, percent.
    pub attendance_rate: u32,
    pub recorded_days: usize,
}

/// Weeks start on Sunday.
pub fn week_start(today: NaiveDate) -> NaiveDate {
    let back = today.weekday().num_days_from_sunday() as u64;
    today.checked_sub_days(Days::new(back)).unwrap_or(today)
}

pub fn month_start(today: NaiveDate) -> NaiveDate {
    today.with_day(1).unwrap_or(today)
}

pub fn compute(records: &[AttendanceSummary], today: NaiveDate) -> DashboardStats {
    let hours_since = |from: NaiveDate| -> f64 {
        records
            .iter()
            .filter(|r| r.date >= from && r.date <= today)
            .map(|r| r.total_hours)
            .sum()
    };

    let present = records
        .iter()
        .filter(|r| r.status == AttendanceStatus::Present)
        .count();

    let attendance_rate = if records.is_empty() {
        0
    } else {
        ((present as f64 / records.len() as f64) * 100.0).round() as u32
    };

    DashboardStats {
        week_hours: round2(hours_since(week_start(today))),
        month_hours: round2(hours_since(month_start(today))),
        attendance_rate,
        recorded_days: records.len(),
    }
}

pub fn load(store: &dyn AttendanceStore, user_id: &str, today: NaiveDate) -> SessionResult<DashboardStats> {
    let records = store.query(&AttendanceFilter::for_user(user_id))?;
    Ok(compute(&records, today))
}
