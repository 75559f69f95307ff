pub mod brk;
pub mod clock;
pub mod config;
pub mod db;
pub mod export;
pub mod init;
pub mod list;
pub mod log;
pub mod reconcile;
pub mod stats;
pub mod status;
pub mod watch;

use crate::clock::SystemClock;
use crate::config::Config;
use crate::core::engine::SessionEngine;
use crate::core::tracker::TimeClock;
use crate::errors::{AppError, AppResult};
use crate::models::break_interval::BreakReason;
use crate::models::location::WorkLocation;
use crate::store::SqliteStore;
use std::sync::Arc;

/// Open the configured database and wire a time clock on top of it.
/// The store is returned too, for commands that also read attendance.
pub(crate) fn open_clock(cfg: &Config) -> AppResult<(TimeClock, Arc<SqliteStore>)> {
    let store = Arc::new(SqliteStore::open(&cfg.database, cfg.store_timeout())?);
    let engine = SessionEngine::new(
        store.clone(),
        store.clone(),
        Arc::new(SystemClock),
        cfg.engine_options(),
    );
    Ok((TimeClock::new(engine), store))
}

pub(crate) fn parse_location(raw: Option<&str>, cfg: &Config) -> AppResult<WorkLocation> {
    match raw {
        Some(code) => WorkLocation::from_code(code).ok_or_else(|| {
            let valid: Vec<&str> = WorkLocation::ALL.iter().map(|l| l.to_db_str()).collect();
            AppError::InvalidLocation(format!("{code} (expected one of: {})", valid.join(", ")))
        }),
        None => cfg.location(),
    }
}

pub(crate) fn parse_reason(raw: Option<&str>) -> AppResult<BreakReason> {
    match raw {
        Some(code) => {
            BreakReason::from_code(code).ok_or_else(|| AppError::InvalidReason(code.to_string()))
        }
        None => Ok(BreakReason::Other),
    }
}
