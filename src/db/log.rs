use crate::errors::AppResult;
use chrono::{DateTime, Local, Utc};
use rusqlite::Connection;
use rusqlite::params;

/// Operations written to the internal `log` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditOp {
    Init,
    ClockIn,
    ClockOut,
    BreakStart,
    BreakEnd,
    Reconcile,
    ReconcileFailed,
    Export,
}

impl AuditOp {
    pub const fn as_str(&self) -> &'static str {
        match self {
            AuditOp::Init => "init",
            AuditOp::ClockIn => "clock_in",
            AuditOp::ClockOut => "clock_out",
            AuditOp::BreakStart => "break_start",
            AuditOp::BreakEnd => "break_end",
            AuditOp::Reconcile => "reconcile",
            AuditOp::ReconcileFailed => "reconcile_failed",
            AuditOp::Export => "export",
        }
    }
}

/// Write an internal log line into the `log` table, stamped with local time.
pub fn ttlog(conn: &Connection, op: AuditOp, target: &str, message: &str) -> AppResult<()> {
    ttlog_at(conn, Utc::now(), op, target, message)
}

/// Same as [`ttlog`] with an explicit instant (engine writes use its clock).
pub fn ttlog_at(
    conn: &Connection,
    at: DateTime<Utc>,
    op: AuditOp,
    target: &str,
    message: &str,
) -> AppResult<()> {
    // Timestamp locale, formattato in ISO 8601
    let stamp = at.with_timezone(&Local).to_rfc3339();

    let mut stmt = conn.prepare_cached(
        "INSERT INTO log (date, operation, target, message)
         VALUES (?1, ?2, ?3, ?4)",
    )?;

    stmt.execute(params![stamp, op.as_str(), target, message])?;

    Ok(())
}
