#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use rtimeclock::clock::ManualClock;
use rtimeclock::core::engine::{EngineOptions, SessionEngine};
use rtimeclock::models::break_interval::BreakReason;
use rtimeclock::models::location::WorkLocation;
use rtimeclock::store::SqliteStore;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

pub const USER: &str = "tester";

pub fn rtc() -> Command {
    let mut cmd = cargo_bin_cmd!("rtimeclock");
    cmd.env("NO_COLOR", "1");
    cmd
}

/// `rtc()` already pointed at `db_path` as the test user.
pub fn rtc_db(db_path: &str) -> Command {
    let mut cmd = rtc();
    cmd.args(["--db", db_path, "--user", USER]);
    cmd
}

/// Create a unique test DB path inside the system temp dir and remove any existing file
pub fn setup_test_db(name: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_rtimeclock.sqlite", name));
    let db_path = path.to_string_lossy().to_string();
    fs::remove_file(&db_path).ok();
    db_path
}

/// Create a temporary output file path inside tempdir and ensure it's removed
pub fn temp_out(name: &str, ext: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_rtimeclock_out.{}", name, ext));
    let p = path.to_string_lossy().to_string();
    fs::remove_file(&p).ok();
    p
}

pub fn init_test_db(db_path: &str) {
    rtc()
        .args(["--db", db_path, "--test", "init"])
        .assert()
        .success();
}

pub fn utc(date: &str, h: u32, m: u32) -> DateTime<Utc> {
    let d = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
    Utc.from_utc_datetime(&d.and_hms_opt(h, m, 0).unwrap())
}

/// Record a full day directly through the engine: clock in at 09:00,
/// `break_min` minutes of lunch at 12:30, clock out after `hours` of gross time.
pub fn record_day(db_path: &str, user: &str, date: &str, hours: i64, break_min: i64) {
    let store = Arc::new(SqliteStore::open(db_path, std::time::Duration::from_secs(5)).unwrap());
    let clock = Arc::new(ManualClock::new(utc(date, 9, 0)));
    let engine = SessionEngine::new(
        store.clone(),
        store.clone(),
        clock.clone(),
        EngineOptions::default(),
    );

    engine.start_session(user, WorkLocation::Office).unwrap();
    if break_min > 0 {
        clock.set(utc(date, 12, 30));
        engine.start_break(user, BreakReason::Lunch).unwrap();
        clock.advance(Duration::minutes(break_min));
        engine.end_break(user).unwrap();
    }
    clock.set(utc(date, 9, 0) + Duration::hours(hours));
    let outcome = engine.stop_session(user).unwrap();
    assert!(!outcome.is_partial());
}
