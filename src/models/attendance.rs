use super::break_interval::BreakInterval;
use super::location::WorkLocation;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Daily classification. This crate only ever writes `Present`;
/// lateness and absence are decided elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttendanceStatus {
    Present,
    Late,
    Absent,
    HalfDay,
}

impl AttendanceStatus {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Late => "late",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::HalfDay => "half-day",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "present" => Some(AttendanceStatus::Present),
            "late" => Some(AttendanceStatus::Late),
            "absent" => Some(AttendanceStatus::Absent),
            "half-day" => Some(AttendanceStatus::HalfDay),
            _ => None,
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

/// Reconciled daily record (⇔ one row of `attendance`, unique on user_id + date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceSummary {
    pub id: i64,
    pub user_id: String,
    pub date: NaiveDate,
    pub clock_in: DateTime<Utc>,
    pub clock_out: Option<DateTime<Utc>>,
    pub total_hours: f64,
    pub breaks: Vec<BreakInterval>,
    pub status: AttendanceStatus,
    pub work_location: WorkLocation,
}

impl AttendanceSummary {
    /// The record written at clock-in: present, no hours yet.
    pub fn opened(
        user_id: &str,
        date: NaiveDate,
        clock_in: DateTime<Utc>,
        work_location: WorkLocation,
    ) -> Self {
        Self {
            id: 0,
            user_id: user_id.to_string(),
            date,
            clock_in,
            clock_out: None,
            total_hours: 0.0,
            breaks: Vec::new(),
            status: AttendanceStatus::Present,
            work_location,
        }
    }

    pub fn is_reconciled(&self) -> bool {
        self.clock_out.is_some()
    }
}
