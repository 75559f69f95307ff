//! SQLite connection wrapper (lightweight for CLI usage).

use rusqlite::{Connection, Result};
use std::path::Path;
use std::time::Duration;

pub struct DbPool {
    pub conn: Connection,
}

impl DbPool {
    /// Open the database with a bounded busy timeout: a call that cannot get
    /// the lock within `timeout` fails with `SQLITE_BUSY` instead of hanging.
    pub fn with_timeout(path: &str, timeout: Duration) -> Result<Self> {
        let conn = Connection::open(Path::new(path))?;
        conn.busy_timeout(timeout)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn })
    }

    /// Private in-memory database, used by tests and dry runs.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    pub fn into_inner(self) -> Connection {
        self.conn
    }
}
