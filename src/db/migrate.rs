use crate::ui::messages::success;
use rusqlite::{Connection, OptionalExtension, Result};

/// A schema step. Applied once, recorded in the `log` table as
/// `migration_applied` with the version as target.
struct Migration {
    version: &'static str,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "20250301_0001_create_sessions",
        description: "Created sessions table",
        sql: r#"
        CREATE TABLE IF NOT EXISTS sessions (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id             TEXT NOT NULL,
            date                TEXT NOT NULL,                -- YYYY-MM-DD
            start_time          TEXT NOT NULL,                -- RFC 3339
            end_time            TEXT,                         -- RFC 3339, set once
            breaks              TEXT NOT NULL DEFAULT '[]',   -- JSON array of intervals
            total_break_seconds INTEGER NOT NULL DEFAULT 0,
            work_location       TEXT NOT NULL DEFAULT 'office',
            status              TEXT NOT NULL DEFAULT 'active'
                                CHECK (status IN ('active','break','completed'))
        );

        CREATE INDEX IF NOT EXISTS idx_sessions_user_date ON sessions(user_id, date);
        "#,
    },
    Migration {
        version: "20250301_0002_create_attendance",
        description: "Created attendance table",
        sql: r#"
        CREATE TABLE IF NOT EXISTS attendance (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id       TEXT NOT NULL,
            date          TEXT NOT NULL,                  -- YYYY-MM-DD
            clock_in      TEXT NOT NULL,                  -- RFC 3339
            clock_out     TEXT,                           -- RFC 3339
            total_hours   REAL NOT NULL DEFAULT 0,
            breaks        TEXT NOT NULL DEFAULT '[]',     -- JSON snapshot of closed breaks
            status        TEXT NOT NULL DEFAULT 'present'
                          CHECK (status IN ('present','late','absent','half-day')),
            work_location TEXT NOT NULL DEFAULT 'office',
            UNIQUE (user_id, date)
        );

        CREATE INDEX IF NOT EXISTS idx_attendance_date ON attendance(date);
        "#,
    },
    Migration {
        version: "20250315_0003_single_open_session",
        description: "At most one in-progress session per user and day",
        sql: r#"
        CREATE UNIQUE INDEX IF NOT EXISTS uq_sessions_open_per_day
            ON sessions(user_id, date)
            WHERE status IN ('active','break');
        "#,
    },
    Migration {
        version: "20250402_0004_pending_completions",
        description: "Created pending_completions table",
        sql: r#"
        CREATE TABLE IF NOT EXISTS pending_completions (
            session_id INTEGER PRIMARY KEY,
            user_id    TEXT NOT NULL,
            date       TEXT NOT NULL,                     -- YYYY-MM-DD
            session    TEXT NOT NULL,                     -- JSON snapshot of the completed session
            parked_at  TEXT NOT NULL                      -- RFC 3339
        );

        CREATE INDEX IF NOT EXISTS idx_pending_user_date ON pending_completions(user_id, date);
        "#,
    },
];

/// Ensure that the `log` table exists with the modern schema.
fn ensure_log_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS log (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            date      TEXT NOT NULL,
            operation TEXT NOT NULL,
            target    TEXT DEFAULT '',
            message   TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

fn is_applied(conn: &Connection, version: &str) -> Result<bool> {
    let mut chk = conn.prepare_cached(
        "SELECT 1 FROM log
         WHERE operation = 'migration_applied' AND target = ?1
         LIMIT 1",
    )?;
    Ok(chk.query_row([version], |_| Ok(())).optional()?.is_some())
}

/// Versions already recorded in the log, oldest first.
pub fn applied_versions(conn: &Connection) -> Result<Vec<String>> {
    ensure_log_table(conn)?;
    let mut stmt = conn.prepare(
        "SELECT target FROM log WHERE operation = 'migration_applied' ORDER BY id ASC",
    )?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Public entry point: run all pending migrations.
///
/// Invoked by db::initialize::init_db(). Every step runs in its own
/// transaction together with its log marker.
pub fn run_pending_migrations(conn: &Connection) -> Result<()> {
    ensure_log_table(conn)?;

    for m in MIGRATIONS {
        if is_applied(conn, m.version)? {
            continue;
        }

        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(m.sql)?;
        tx.execute(
            "INSERT INTO log (date, operation, target, message)
             VALUES (datetime('now'), 'migration_applied', ?1, ?2)",
            [m.version, m.description],
        )?;
        tx.commit()?;

        success(format!("Migration applied: {} → {}", m.version, m.description));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_pending_migrations(&conn).unwrap();
        run_pending_migrations(&conn).unwrap();

        let versions = applied_versions(&conn).unwrap();
        assert_eq!(versions.len(), MIGRATIONS.len());
        assert_eq!(versions[0], "20250301_0001_create_sessions");
    }

    #[test]
    fn open_session_index_rejects_second_in_progress_row() {
        let conn = Connection::open_in_memory().unwrap();
        run_pending_migrations(&conn).unwrap();

        let insert = "INSERT INTO sessions (user_id, date, start_time, status)
                      VALUES ('u1', '2025-03-03', '2025-03-03T09:00:00Z', ?1)";
        conn.execute(insert, ["completed"]).unwrap();
        conn.execute(insert, ["active"]).unwrap();
        assert!(conn.execute(insert, ["break"]).is_err());
    }
}
