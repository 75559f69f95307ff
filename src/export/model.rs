// src/export/model.rs

use crate::models::attendance::AttendanceSummary;
use serde::Serialize;

/// Struttura “piatta” per export dei riepiloghi giornalieri.
/// Breaks are reduced to a count and a total, so the same row fits CSV and JSON.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct AttendanceExport {
    pub id: i64,
    pub user_id: String,
    pub date: String,
    pub clock_in: String,
    pub clock_out: String,
    pub total_hours: f64,
    pub breaks: usize,
    pub break_minutes: i64,
    pub status: String,
    pub work_location: String,
}

impl From<&AttendanceSummary> for AttendanceExport {
    fn from(s: &AttendanceSummary) -> Self {
        let break_secs: i64 = s.breaks.iter().filter_map(|b| b.duration_seconds).sum();
        Self {
            id: s.id,
            user_id: s.user_id.clone(),
            date: s.date.format("%Y-%m-%d").to_string(),
            clock_in: s.clock_in.to_rfc3339(),
            clock_out: s.clock_out.map(|t| t.to_rfc3339()).unwrap_or_default(),
            total_hours: s.total_hours,
            breaks: s.breaks.len(),
            break_minutes: break_secs / 60,
            status: s.status.to_db_str().to_string(),
            work_location: s.work_location.to_db_str().to_string(),
        }
    }
}
