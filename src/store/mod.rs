//! Storage seams for the time clock.
//!
//! The engine only talks to these traits. Each one is a thin, typed view of a
//! document collection: point read by the natural key `(user_id, date)`,
//! create, partial update, and (for attendance) a filtered query.

pub mod sqlite;

pub use sqlite::SqliteStore;

use crate::db::log::AuditOp;
use crate::errors::SessionResult;
use crate::models::attendance::{AttendanceStatus, AttendanceSummary};
use crate::models::session::Session;
use chrono::{DateTime, NaiveDate, Utc};

pub trait SessionStore: Send + Sync {
    /// The in-progress (`active` or `break`) session for the key, if any.
    fn find_open(&self, user_id: &str, date: NaiveDate) -> SessionResult<Option<Session>>;

    /// Every session of the day, oldest first.
    fn list_for_day(&self, user_id: &str, date: NaiveDate) -> SessionResult<Vec<Session>>;

    /// Insert-if-absent: fails with `AlreadyActive` when another in-progress
    /// session exists for the same key. Returns the new id.
    fn create(&self, session: &Session) -> SessionResult<i64>;

    /// Persist the mutable fields (end time, breaks, break total, status).
    /// Fails with `NoActiveSession` if the stored row is already completed.
    fn update(&self, session: &Session) -> SessionResult<()>;

    /// Remember a completion whose `update` failed, so that a later process
    /// writes this snapshot instead of completing the row again at its own
    /// `now`. One parked completion per session id; parking again replaces it.
    fn park_completion(&self, session: &Session) -> SessionResult<()>;

    /// The parked completion for the key, if any.
    fn parked_completion(&self, user_id: &str, date: NaiveDate) -> SessionResult<Option<Session>>;

    fn clear_parked(&self, session_id: i64) -> SessionResult<()>;

    /// Append a line to the audit trail. Stores without one ignore it.
    fn audit(
        &self,
        _at: DateTime<Utc>,
        _op: AuditOp,
        _target: &str,
        _message: &str,
    ) -> SessionResult<()> {
        Ok(())
    }
}

pub trait AttendanceStore: Send + Sync {
    fn find(&self, user_id: &str, date: NaiveDate) -> SessionResult<Option<AttendanceSummary>>;

    /// Create the day's record unless one exists already. Returns the id of
    /// whichever record is stored afterwards.
    fn create_if_absent(&self, summary: &AttendanceSummary) -> SessionResult<i64>;

    /// Overwrite the reconciled fields (clock out, total hours, breaks).
    fn update(&self, summary: &AttendanceSummary) -> SessionResult<()>;

    fn query(&self, filter: &AttendanceFilter) -> SessionResult<Vec<AttendanceSummary>>;
}

/// Filter for attendance queries. Empty filter = everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttendanceFilter {
    pub user_id: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub status: Option<AttendanceStatus>,
}

impl AttendanceFilter {
    pub fn for_user(user_id: &str) -> Self {
        Self {
            user_id: Some(user_id.to_string()),
            ..Self::default()
        }
    }

    pub fn between(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    pub fn with_status(mut self, status: Option<AttendanceStatus>) -> Self {
        self.status = status;
        self
    }
}
