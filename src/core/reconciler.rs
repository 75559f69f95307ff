//! One-way projection of a completed session into the day's attendance record.

use crate::core::calculator;
use crate::errors::{SessionError, SessionResult};
use crate::models::attendance::AttendanceSummary;
use crate::models::session::Session;
use crate::store::AttendanceStore;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct Reconciler {
    store: Arc<dyn AttendanceStore>,
}

impl Reconciler {
    pub fn new(store: Arc<dyn AttendanceStore>) -> Self {
        Self { store }
    }

    /// Overwrite `clock_out`, `total_hours` and `breaks` of the day's record
    /// from `session` (last write wins, no accumulation across sessions).
    /// Creates the record if clock-in never managed to.
    ///
    /// Every failure is reported as `ReconciliationFailed`; the session itself
    /// is not touched.
    pub fn reconcile(&self, session: &Session) -> SessionResult<AttendanceSummary> {
        self.try_reconcile(session).map_err(|e| {
            warn!(
                user = %session.user_id,
                date = %session.date,
                error = %e,
                "Attendance reconciliation failed"
            );
            match e {
                SessionError::ReconciliationFailed(_) => e,
                other => SessionError::ReconciliationFailed(other.to_string()),
            }
        })
    }

    fn try_reconcile(&self, session: &Session) -> SessionResult<AttendanceSummary> {
        let (Some(clock_out), Some(hours)) = (session.end_time, calculator::total_hours(session))
        else {
            return Err(SessionError::ReconciliationFailed(format!(
                "session {} is still {}",
                session.id, session.status
            )));
        };

        let existing = self.store.find(&session.user_id, session.date)?;
        let was_missing = existing.is_none();

        let mut summary = existing.unwrap_or_else(|| {
            AttendanceSummary::opened(
                &session.user_id,
                session.date,
                session.start_time,
                session.work_location,
            )
        });

        summary.clock_out = Some(clock_out);
        summary.total_hours = hours;
        summary.breaks = session.closed_breaks();

        if was_missing {
            debug!(user = %session.user_id, date = %session.date, "Creating missing attendance record");
            summary.id = self.store.create_if_absent(&summary)?;
        }

        // also after a create: a concurrent clock-in may have won the insert
        self.store.update(&summary)?;

        Ok(summary)
    }
}
