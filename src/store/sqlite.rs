//! SQLite implementation of both stores, sharing one connection.

use super::{AttendanceFilter, AttendanceStore, SessionStore};
use crate::db::initialize::init_db;
use crate::db::log::{AuditOp, ttlog_at};
use crate::db::pool::DbPool;
use crate::errors::{AppError, AppResult, SessionError, SessionResult};
use crate::models::attendance::{AttendanceStatus, AttendanceSummary};
use crate::models::break_interval::BreakInterval;
use crate::models::location::WorkLocation;
use crate::models::session::{Session, SessionStatus};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, ToSql, params};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

const SESSION_COLUMNS: &str = "id, user_id, date, start_time, end_time, breaks, \
     total_break_seconds, work_location, status";

const ATTENDANCE_COLUMNS: &str = "id, user_id, date, clock_in, clock_out, total_hours, \
     breaks, status, work_location";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (and migrate) the database at `path`.
    pub fn open(path: &str, timeout: Duration) -> AppResult<Self> {
        let pool = DbPool::with_timeout(path, timeout)?;
        init_db(&pool.conn)?;
        Ok(Self::from_pool(pool))
    }

    pub fn in_memory() -> AppResult<Self> {
        let pool = DbPool::in_memory()?;
        init_db(&pool.conn)?;
        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: DbPool) -> Self {
        Self {
            conn: Mutex::new(pool.into_inner()),
        }
    }

    fn lock(&self) -> SessionResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| SessionError::StoreUnavailable("database connection poisoned".into()))
    }
}

fn unavailable(e: rusqlite::Error) -> SessionError {
    SessionError::StoreUnavailable(e.to_string())
}

fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation
    )
}

// ------------------------------------------------
// Row mapping
// ------------------------------------------------

fn conversion_error(col: usize, err: AppError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(col, Type::Text, Box::new(err))
}

fn get_date(row: &Row, col: usize) -> rusqlite::Result<NaiveDate> {
    let s: String = row.get(col)?;
    NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|_| conversion_error(col, AppError::InvalidDate(s)))
}

fn get_instant(row: &Row, col: usize) -> rusqlite::Result<DateTime<Utc>> {
    let s: String = row.get(col)?;
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| conversion_error(col, AppError::InvalidRecord(format!("bad timestamp '{s}'"))))
}

fn get_opt_instant(row: &Row, col: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    match row.get::<_, Option<String>>(col)? {
        None => Ok(None),
        Some(_) => get_instant(row, col).map(Some),
    }
}

fn get_breaks(row: &Row, col: usize) -> rusqlite::Result<Vec<BreakInterval>> {
    let s: String = row.get(col)?;
    serde_json::from_str(&s).map_err(|e| conversion_error(col, AppError::Json(e)))
}

fn get_location(row: &Row, col: usize) -> rusqlite::Result<WorkLocation> {
    let s: String = row.get(col)?;
    WorkLocation::from_db_str(&s).ok_or_else(|| conversion_error(col, AppError::InvalidLocation(s)))
}

fn map_session(row: &Row) -> rusqlite::Result<Session> {
    let status_str: String = row.get(8)?;
    let status = SessionStatus::from_db_str(&status_str).ok_or_else(|| {
        conversion_error(8, AppError::InvalidRecord(format!("session status '{status_str}'")))
    })?;

    Ok(Session {
        id: row.get(0)?,
        user_id: row.get(1)?,
        date: get_date(row, 2)?,
        start_time: get_instant(row, 3)?,
        end_time: get_opt_instant(row, 4)?,
        breaks: get_breaks(row, 5)?,
        total_break_seconds: row.get(6)?,
        work_location: get_location(row, 7)?,
        status,
    })
}

fn map_attendance(row: &Row) -> rusqlite::Result<AttendanceSummary> {
    let status_str: String = row.get(7)?;
    let status = AttendanceStatus::from_db_str(&status_str).ok_or_else(|| {
        conversion_error(7, AppError::InvalidRecord(format!("attendance status '{status_str}'")))
    })?;

    Ok(AttendanceSummary {
        id: row.get(0)?,
        user_id: row.get(1)?,
        date: get_date(row, 2)?,
        clock_in: get_instant(row, 3)?,
        clock_out: get_opt_instant(row, 4)?,
        total_hours: row.get(5)?,
        breaks: get_breaks(row, 6)?,
        status,
        work_location: get_location(row, 8)?,
    })
}

fn breaks_json(breaks: &[BreakInterval]) -> SessionResult<String> {
    serde_json::to_string(breaks)
        .map_err(|e| SessionError::StoreUnavailable(format!("cannot encode breaks: {e}")))
}

fn date_str(d: NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

// ------------------------------------------------
// Sessions
// ------------------------------------------------

impl SessionStore for SqliteStore {
    fn find_open(&self, user_id: &str, date: NaiveDate) -> SessionResult<Option<Session>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM sessions
             WHERE user_id = ?1 AND date = ?2 AND status IN ('active','break')
             LIMIT 1"
        );
        conn.query_row(&sql, params![user_id, date_str(date)], map_session)
            .optional()
            .map_err(unavailable)
    }

    fn list_for_day(&self, user_id: &str, date: NaiveDate) -> SessionResult<Vec<Session>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM sessions
             WHERE user_id = ?1 AND date = ?2
             ORDER BY start_time ASC, id ASC"
        );
        let mut stmt = conn.prepare_cached(&sql).map_err(unavailable)?;
        let rows = stmt
            .query_map(params![user_id, date_str(date)], map_session)
            .map_err(unavailable)?;

        let mut out = Vec::new();
        for r in rows {
            out.push(r.map_err(unavailable)?);
        }
        Ok(out)
    }

    fn create(&self, session: &Session) -> SessionResult<i64> {
        let conn = self.lock()?;
        let res = conn.execute(
            "INSERT INTO sessions
                (user_id, date, start_time, end_time, breaks, total_break_seconds, work_location, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                session.user_id,
                date_str(session.date),
                session.start_time.to_rfc3339(),
                session.end_time.map(|t| t.to_rfc3339()),
                breaks_json(&session.breaks)?,
                session.total_break_seconds,
                session.work_location.to_db_str(),
                session.status.to_db_str(),
            ],
        );

        match res {
            Ok(_) => Ok(conn.last_insert_rowid()),
            // uq_sessions_open_per_day: someone else clocked in first
            Err(e) if is_constraint_violation(&e) => Err(SessionError::AlreadyActive {
                date: session.date,
            }),
            Err(e) => Err(unavailable(e)),
        }
    }

    fn update(&self, session: &Session) -> SessionResult<()> {
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "UPDATE sessions
                 SET end_time = ?1, breaks = ?2, total_break_seconds = ?3, status = ?4
                 WHERE id = ?5 AND status <> 'completed'",
                params![
                    session.end_time.map(|t| t.to_rfc3339()),
                    breaks_json(&session.breaks)?,
                    session.total_break_seconds,
                    session.status.to_db_str(),
                    session.id,
                ],
            )
            .map_err(unavailable)?;

        if changed == 0 {
            return Err(SessionError::NoActiveSession);
        }
        Ok(())
    }

    fn park_completion(&self, session: &Session) -> SessionResult<()> {
        let conn = self.lock()?;
        let snapshot = serde_json::to_string(session)
            .map_err(|e| SessionError::StoreUnavailable(format!("cannot encode session: {e}")))?;
        conn.execute(
            "INSERT INTO pending_completions (session_id, user_id, date, session, parked_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(session_id) DO UPDATE
                SET session = excluded.session, parked_at = excluded.parked_at",
            params![
                session.id,
                session.user_id,
                date_str(session.date),
                snapshot,
                Utc::now().to_rfc3339(),
            ],
        )
        .map_err(unavailable)?;
        Ok(())
    }

    fn parked_completion(&self, user_id: &str, date: NaiveDate) -> SessionResult<Option<Session>> {
        let conn = self.lock()?;
        let snapshot: Option<String> = conn
            .query_row(
                "SELECT session FROM pending_completions
                 WHERE user_id = ?1 AND date = ?2
                 ORDER BY parked_at DESC, session_id DESC
                 LIMIT 1",
                params![user_id, date_str(date)],
                |row| row.get(0),
            )
            .optional()
            .map_err(unavailable)?;

        snapshot
            .map(|s| serde_json::from_str(&s))
            .transpose()
            .map_err(|e| SessionError::StoreUnavailable(format!("cannot decode parked session: {e}")))
    }

    fn clear_parked(&self, session_id: i64) -> SessionResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM pending_completions WHERE session_id = ?1",
            params![session_id],
        )
        .map_err(unavailable)?;
        Ok(())
    }

    fn audit(
        &self,
        at: DateTime<Utc>,
        op: AuditOp,
        target: &str,
        message: &str,
    ) -> SessionResult<()> {
        let conn = self.lock()?;
        ttlog_at(&conn, at, op, target, message)
            .map_err(|e| SessionError::StoreUnavailable(e.to_string()))
    }
}

// ------------------------------------------------
// Attendance
// ------------------------------------------------

impl AttendanceStore for SqliteStore {
    fn find(&self, user_id: &str, date: NaiveDate) -> SessionResult<Option<AttendanceSummary>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE user_id = ?1 AND date = ?2"
        );
        conn.query_row(&sql, params![user_id, date_str(date)], map_attendance)
            .optional()
            .map_err(unavailable)
    }

    fn create_if_absent(&self, summary: &AttendanceSummary) -> SessionResult<i64> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO attendance
                (user_id, date, clock_in, clock_out, total_hours, breaks, status, work_location)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(user_id, date) DO NOTHING",
            params![
                summary.user_id,
                date_str(summary.date),
                summary.clock_in.to_rfc3339(),
                summary.clock_out.map(|t| t.to_rfc3339()),
                summary.total_hours,
                breaks_json(&summary.breaks)?,
                summary.status.to_db_str(),
                summary.work_location.to_db_str(),
            ],
        )
        .map_err(unavailable)?;

        conn.query_row(
            "SELECT id FROM attendance WHERE user_id = ?1 AND date = ?2",
            params![summary.user_id, date_str(summary.date)],
            |row| row.get(0),
        )
        .map_err(unavailable)
    }

    fn update(&self, summary: &AttendanceSummary) -> SessionResult<()> {
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "UPDATE attendance
                 SET clock_out = ?1, total_hours = ?2, breaks = ?3
                 WHERE user_id = ?4 AND date = ?5",
                params![
                    summary.clock_out.map(|t| t.to_rfc3339()),
                    summary.total_hours,
                    breaks_json(&summary.breaks)?,
                    summary.user_id,
                    date_str(summary.date),
                ],
            )
            .map_err(unavailable)?;

        if changed == 0 {
            return Err(SessionError::StoreUnavailable(format!(
                "no attendance record for {} on {}",
                summary.user_id, summary.date
            )));
        }
        Ok(())
    }

    fn query(&self, filter: &AttendanceFilter) -> SessionResult<Vec<AttendanceSummary>> {
        let conn = self.lock()?;

        let mut sql = format!("SELECT {ATTENDANCE_COLUMNS} FROM attendance");
        let mut conditions = Vec::new();
        let mut values: Vec<String> = Vec::new();

        if let Some(u) = &filter.user_id {
            conditions.push("user_id = ?");
            values.push(u.clone());
        }
        if let Some(from) = filter.from {
            conditions.push("date >= ?");
            values.push(date_str(from));
        }
        if let Some(to) = filter.to {
            conditions.push("date <= ?");
            values.push(date_str(to));
        }
        if let Some(st) = filter.status {
            conditions.push("status = ?");
            values.push(st.to_db_str().to_string());
        }

        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(" ORDER BY date ASC, user_id ASC");

        let params: Vec<&dyn ToSql> = values.iter().map(|s| s as &dyn ToSql).collect();

        let mut stmt = conn.prepare(&sql).map_err(unavailable)?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(params), map_attendance)
            .map_err(unavailable)?;

        let mut out = Vec::new();
        for r in rows {
            out.push(r.map_err(unavailable)?);
        }
        Ok(out)
    }
}
