//! Session engine behaviour against an in-memory SQLite store and a manual clock.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use rtimeclock::clock::ManualClock;
use rtimeclock::core::engine::{EngineOptions, SessionEngine};
use rtimeclock::core::tracker::TimeClock;
use rtimeclock::errors::{SessionError, SessionResult};
use rtimeclock::models::attendance::{AttendanceStatus, AttendanceSummary};
use rtimeclock::models::break_interval::BreakReason;
use rtimeclock::models::location::WorkLocation;
use rtimeclock::models::session::{Session, SessionStatus, TimerStatus};
use rtimeclock::store::{AttendanceFilter, AttendanceStore, SessionStore, SqliteStore};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;

const USER: &str = "alice";

fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 3, h, m, s).unwrap()
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 3).unwrap()
}

// ------------------------------------------------
// Store double: SQLite underneath, failures on demand
// ------------------------------------------------

struct Gate {
    entered: mpsc::Sender<()>,
    release: mpsc::Receiver<()>,
}

struct TestStore {
    inner: SqliteStore,
    failing_reads: AtomicU32,
    fail_session_writes: AtomicBool,
    fail_attendance: AtomicBool,
    gate: Mutex<Option<Gate>>,
}

impl TestStore {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: SqliteStore::in_memory().unwrap(),
            failing_reads: AtomicU32::new(0),
            fail_session_writes: AtomicBool::new(false),
            fail_attendance: AtomicBool::new(false),
            gate: Mutex::new(None),
        })
    }

    fn down() -> SessionError {
        SessionError::StoreUnavailable("simulated outage".into())
    }

    fn read_guard(&self) -> SessionResult<()> {
        let left = self.failing_reads.load(Ordering::SeqCst);
        if left > 0 {
            self.failing_reads.store(left - 1, Ordering::SeqCst);
            return Err(Self::down());
        }
        Ok(())
    }

    fn attendance_guard(&self) -> SessionResult<()> {
        if self.fail_attendance.load(Ordering::SeqCst) {
            return Err(Self::down());
        }
        Ok(())
    }

    /// The next `list_for_day` blocks until the returned sender fires.
    fn hold_next_read(&self) -> (mpsc::Receiver<()>, mpsc::Sender<()>) {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        *self.gate.lock().unwrap() = Some(Gate {
            entered: entered_tx,
            release: release_rx,
        });
        (entered_rx, release_tx)
    }
}

impl SessionStore for TestStore {
    fn find_open(&self, user_id: &str, date: NaiveDate) -> SessionResult<Option<Session>> {
        self.read_guard()?;
        self.inner.find_open(user_id, date)
    }

    fn list_for_day(&self, user_id: &str, date: NaiveDate) -> SessionResult<Vec<Session>> {
        let gate = self.gate.lock().unwrap().take();
        if let Some(g) = gate {
            g.entered.send(()).unwrap();
            g.release.recv().unwrap();
        }
        self.read_guard()?;
        self.inner.list_for_day(user_id, date)
    }

    fn create(&self, session: &Session) -> SessionResult<i64> {
        SessionStore::create(&self.inner, session)
    }

    fn update(&self, session: &Session) -> SessionResult<()> {
        if self.fail_session_writes.load(Ordering::SeqCst) {
            return Err(Self::down());
        }
        SessionStore::update(&self.inner, session)
    }

    fn park_completion(&self, session: &Session) -> SessionResult<()> {
        self.inner.park_completion(session)
    }

    fn parked_completion(&self, user_id: &str, date: NaiveDate) -> SessionResult<Option<Session>> {
        self.inner.parked_completion(user_id, date)
    }

    fn clear_parked(&self, session_id: i64) -> SessionResult<()> {
        self.inner.clear_parked(session_id)
    }
}

impl AttendanceStore for TestStore {
    fn find(&self, user_id: &str, date: NaiveDate) -> SessionResult<Option<AttendanceSummary>> {
        self.attendance_guard()?;
        self.inner.find(user_id, date)
    }

    fn create_if_absent(&self, summary: &AttendanceSummary) -> SessionResult<i64> {
        self.attendance_guard()?;
        self.inner.create_if_absent(summary)
    }

    fn update(&self, summary: &AttendanceSummary) -> SessionResult<()> {
        self.attendance_guard()?;
        AttendanceStore::update(&self.inner, summary)
    }

    fn query(&self, filter: &AttendanceFilter) -> SessionResult<Vec<AttendanceSummary>> {
        self.attendance_guard()?;
        self.inner.query(filter)
    }
}

struct Fixture {
    store: Arc<TestStore>,
    clock: Arc<ManualClock>,
    engine: SessionEngine,
}

fn options() -> EngineOptions {
    EngineOptions {
        read_retries: 3,
        retry_backoff: std::time::Duration::from_millis(1),
    }
}

/// A second process on the same database, with its own clock.
fn engine_on(store: &Arc<TestStore>, clock: &Arc<ManualClock>) -> SessionEngine {
    SessionEngine::new(store.clone(), store.clone(), clock.clone(), options())
}

fn fixture() -> Fixture {
    let store = TestStore::new();
    let clock = Arc::new(ManualClock::new(at(9, 0, 0)));
    let engine = engine_on(&store, &clock);
    Fixture {
        store,
        clock,
        engine,
    }
}

fn stored_today(f: &Fixture) -> Session {
    stored_row(&f.store)
}

fn stored_row(store: &TestStore) -> Session {
    store.inner.list_for_day(USER, day()).unwrap().pop().unwrap()
}

fn summary_today(f: &Fixture) -> Option<AttendanceSummary> {
    f.store.inner.find(USER, day()).unwrap()
}

// ------------------------------------------------
// Transitions
// ------------------------------------------------

#[test]
fn full_day_reconciles_to_seven_and_three_quarter_hours() {
    let f = fixture();
    assert_eq!(f.engine.current_status(USER).unwrap(), TimerStatus::NotStarted);

    f.engine.start_session(USER, WorkLocation::Home).unwrap();
    assert_eq!(f.engine.current_status(USER).unwrap(), TimerStatus::Active);

    let opened = summary_today(&f).expect("record created at clock-in");
    assert_eq!(opened.total_hours, 0.0);
    assert_eq!(opened.status, AttendanceStatus::Present);
    assert_eq!(opened.clock_in, at(9, 0, 0));

    f.clock.set(at(9, 30, 0));
    f.engine.start_break(USER, BreakReason::Lunch).unwrap();
    assert_eq!(f.engine.current_status(USER).unwrap(), TimerStatus::Break);

    f.clock.set(at(9, 45, 0));
    f.engine.end_break(USER).unwrap();
    assert_eq!(f.engine.current_status(USER).unwrap(), TimerStatus::Active);

    f.clock.set(at(17, 0, 0));
    let outcome = f.engine.stop_session(USER).unwrap();
    assert!(!outcome.is_partial());
    assert_eq!(outcome.elapsed_millis, 27_900_000);
    assert_eq!(f.engine.current_status(USER).unwrap(), TimerStatus::Completed);

    let summary = summary_today(&f).unwrap();
    assert_eq!(summary.total_hours, 7.75);
    assert_eq!(summary.clock_out, Some(at(17, 0, 0)));
    assert_eq!(summary.breaks.len(), 1);
    assert_eq!(summary.breaks[0].duration_seconds, Some(900));
    assert_eq!(summary.work_location, WorkLocation::Home);
    assert_eq!(outcome.summary.map(|s| s.total_hours), Some(7.75));
}

#[test]
fn second_clock_in_while_active_is_rejected() {
    let f = fixture();
    f.engine.start_session(USER, WorkLocation::Office).unwrap();

    let err = f.engine.start_session(USER, WorkLocation::Office).unwrap_err();
    assert_eq!(err, SessionError::AlreadyActive { date: day() });
    assert_eq!(f.store.inner.list_for_day(USER, day()).unwrap().len(), 1);
}

#[test]
fn store_refuses_a_second_open_session_for_the_same_day() {
    let f = fixture();
    let session = Session::start(USER, day(), at(9, 0, 0), WorkLocation::Office);

    SessionStore::create(f.store.as_ref(), &session).unwrap();
    let err = SessionStore::create(f.store.as_ref(), &session).unwrap_err();
    assert_eq!(err, SessionError::AlreadyActive { date: day() });
}

#[test]
fn two_engines_on_one_store_cannot_both_clock_in() {
    let f = fixture();
    let other = SessionEngine::new(
        f.store.clone(),
        f.store.clone(),
        f.clock.clone(),
        EngineOptions::default(),
    );

    f.engine.start_session(USER, WorkLocation::Office).unwrap();
    assert!(matches!(
        other.start_session(USER, WorkLocation::Home),
        Err(SessionError::AlreadyActive { .. })
    ));
}

#[test]
fn new_session_after_completion_overwrites_the_day() {
    let f = fixture();
    f.engine.start_session(USER, WorkLocation::Office).unwrap();
    f.clock.set(at(12, 0, 0));
    f.engine.stop_session(USER).unwrap();

    f.clock.set(at(14, 0, 0));
    f.engine.start_session(USER, WorkLocation::Office).unwrap();
    f.clock.set(at(15, 30, 0));
    f.engine.stop_session(USER).unwrap();

    assert_eq!(f.store.inner.list_for_day(USER, day()).unwrap().len(), 2);
    // last write wins, no accumulation
    let summary = summary_today(&f).unwrap();
    assert_eq!(summary.total_hours, 1.5);
    assert_eq!(summary.clock_in, at(9, 0, 0));
}

#[test]
fn double_start_break_fails() {
    let f = fixture();
    f.engine.start_session(USER, WorkLocation::Office).unwrap();
    f.engine.start_break(USER, BreakReason::Coffee).unwrap();

    let err = f.engine.start_break(USER, BreakReason::Coffee).unwrap_err();
    assert_eq!(
        err,
        SessionError::InvalidTransition {
            action: "start a break",
            status: TimerStatus::Break
        }
    );
    assert_eq!(stored_today(&f).breaks.len(), 1);
}

#[test]
fn double_end_break_fails_and_leaves_the_total_alone() {
    let f = fixture();
    f.engine.start_session(USER, WorkLocation::Office).unwrap();
    f.clock.set(at(10, 0, 0));
    f.engine.start_break(USER, BreakReason::Coffee).unwrap();
    f.clock.set(at(10, 10, 0));
    f.engine.end_break(USER).unwrap();

    f.clock.set(at(10, 20, 0));
    let err = f.engine.end_break(USER).unwrap_err();
    assert!(matches!(err, SessionError::InvalidTransition { .. }));
    assert_eq!(stored_today(&f).total_break_seconds, 600);
}

#[test]
fn transitions_without_a_session() {
    let f = fixture();
    assert_eq!(f.engine.stop_session(USER).unwrap_err(), SessionError::NoActiveSession);
    assert_eq!(
        f.engine.start_break(USER, BreakReason::Lunch).unwrap_err(),
        SessionError::InvalidTransition {
            action: "start a break",
            status: TimerStatus::NotStarted
        }
    );
    assert!(matches!(
        f.engine.end_break(USER),
        Err(SessionError::InvalidTransition { .. })
    ));
}

#[test]
fn nothing_leaves_completed() {
    let f = fixture();
    f.engine.start_session(USER, WorkLocation::Office).unwrap();
    f.clock.set(at(10, 0, 0));
    f.engine.stop_session(USER).unwrap();

    f.clock.set(at(11, 0, 0));
    assert_eq!(f.engine.stop_session(USER).unwrap_err(), SessionError::NoActiveSession);
    assert!(f.engine.start_break(USER, BreakReason::Other).is_err());
    assert!(f.engine.end_break(USER).is_err());
    assert_eq!(stored_today(&f).end_time, Some(at(10, 0, 0)));
}

#[test]
fn stop_during_break_closes_the_break_first() {
    let f = fixture();
    f.engine.start_session(USER, WorkLocation::Office).unwrap();
    f.clock.set(at(16, 0, 0));
    f.engine.start_break(USER, BreakReason::Meeting).unwrap();

    f.clock.set(at(16, 30, 0));
    let outcome = f.engine.stop_session(USER).unwrap();

    let stored = stored_today(&f);
    assert_eq!(stored.status, SessionStatus::Completed);
    assert!(stored.open_break().is_none());
    assert_eq!(stored.breaks[0].end_time, Some(at(16, 30, 0)));
    assert_eq!(stored.total_break_seconds, 1800);
    assert_eq!(outcome.elapsed_millis, 7 * 3_600_000);

    let summary = summary_today(&f).unwrap();
    assert_eq!(summary.breaks.len(), 1);
    assert_eq!(summary.total_hours, 7.0);
}

#[test]
fn break_total_is_the_sum_of_closed_breaks() {
    let f = fixture();
    f.engine.start_session(USER, WorkLocation::Office).unwrap();

    // (start hour, length in seconds); a zero-length break included
    let breaks = [(10, 300), (11, 0), (12, 1_800), (15, 61)];
    for (hour, secs) in breaks {
        let start = at(hour, 0, 0);
        f.clock.set(start);
        f.engine.start_break(USER, BreakReason::Other).unwrap();
        f.clock.set(start + Duration::seconds(secs));
        f.engine.end_break(USER).unwrap();
    }

    let stored = stored_today(&f);
    let sum: i64 = stored.breaks.iter().filter_map(|b| b.duration_seconds).sum();
    assert_eq!(stored.breaks.len(), 4);
    assert_eq!(stored.total_break_seconds, sum);
    assert_eq!(sum, 300 + 1_800 + 61);
}

// ------------------------------------------------
// Elapsed time
// ------------------------------------------------

#[test]
fn elapsed_is_frozen_during_a_break_and_after_clock_out() {
    let f = fixture();
    f.engine.start_session(USER, WorkLocation::Office).unwrap();

    f.clock.set(at(9, 45, 0));
    assert_eq!(f.engine.elapsed(USER), 45 * 60);

    f.engine.start_break(USER, BreakReason::Coffee).unwrap();
    let frozen = f.engine.elapsed(USER);
    f.clock.advance(Duration::minutes(10));
    assert_eq!(f.engine.elapsed(USER), frozen);

    f.engine.end_break(USER).unwrap();
    f.clock.advance(Duration::minutes(5));
    assert_eq!(f.engine.elapsed(USER), frozen + 5 * 60);

    f.engine.stop_session(USER).unwrap();
    let done = f.engine.elapsed(USER);
    f.clock.advance(Duration::hours(3));
    assert_eq!(f.engine.elapsed(USER), done);
    assert_eq!(f.engine.reading(USER).status, TimerStatus::Completed);
}

#[test]
fn elapsed_without_a_session_is_zero() {
    let f = fixture();
    assert_eq!(f.engine.elapsed(USER), 0);
    assert_eq!(f.engine.reading(USER).status, TimerStatus::NotStarted);
}

// ------------------------------------------------
// Failures, retries, queue
// ------------------------------------------------

#[test]
fn transient_read_failures_are_retried() {
    let f = fixture();
    f.engine.start_session(USER, WorkLocation::Office).unwrap();

    f.store.failing_reads.store(2, Ordering::SeqCst);
    f.engine.start_break(USER, BreakReason::Lunch).unwrap();
    assert_eq!(stored_today(&f).status, SessionStatus::Break);
}

#[test]
fn persistent_read_failure_surfaces_as_store_unavailable() {
    let f = fixture();
    f.engine.start_session(USER, WorkLocation::Office).unwrap();

    f.store.failing_reads.store(10, Ordering::SeqCst);
    let err = f.engine.start_break(USER, BreakReason::Lunch).unwrap_err();
    assert!(matches!(err, SessionError::StoreUnavailable(_)));
    assert!(err.is_retryable());
    // nothing changed, locally or in the store
    assert_eq!(f.engine.snapshot(USER).unwrap().status, SessionStatus::Active);
}

#[test]
fn failed_break_write_leaves_the_snapshot_untouched() {
    let f = fixture();
    f.engine.start_session(USER, WorkLocation::Office).unwrap();

    f.store.fail_session_writes.store(true, Ordering::SeqCst);
    let err = f.engine.start_break(USER, BreakReason::Lunch).unwrap_err();
    assert!(matches!(err, SessionError::StoreUnavailable(_)));
    assert_eq!(f.engine.snapshot(USER).unwrap().status, SessionStatus::Active);
    assert_eq!(f.engine.pending_count(), 0);
}

#[test]
fn clock_out_survives_a_failed_session_write() {
    let f = fixture();
    f.engine.start_session(USER, WorkLocation::Office).unwrap();
    f.clock.set(at(13, 0, 0));

    f.store.fail_session_writes.store(true, Ordering::SeqCst);
    let outcome = f.engine.stop_session(USER).unwrap();
    assert!(outcome.is_partial());
    assert!(matches!(outcome.persist_error, Some(SessionError::StoreUnavailable(_))));
    assert_eq!(outcome.session.status, SessionStatus::Completed);
    assert_eq!(f.engine.snapshot(USER).unwrap().status, SessionStatus::Completed);
    assert_eq!(f.engine.pending_count(), 1);
    assert_eq!(stored_today(&f).status, SessionStatus::Active);

    // still failing: nothing flushed, job kept
    assert_eq!(f.engine.retry_pending(), 0);
    assert_eq!(f.engine.pending_count(), 1);

    f.store.fail_session_writes.store(false, Ordering::SeqCst);
    assert_eq!(f.engine.retry_pending(), 1);
    assert_eq!(f.engine.pending_count(), 0);
    let stored = stored_today(&f);
    assert_eq!(stored.status, SessionStatus::Completed);
    assert_eq!(stored.end_time, Some(at(13, 0, 0)));
    assert!(f.store.inner.parked_completion(USER, day()).unwrap().is_none());
}

#[test]
fn failed_clock_out_is_kept_for_the_next_process() {
    let f = fixture();
    f.engine.start_session(USER, WorkLocation::Office).unwrap();

    f.clock.set(at(17, 0, 0));
    f.store.fail_session_writes.store(true, Ordering::SeqCst);
    let first = f.engine.stop_session(USER).unwrap();
    assert!(first.persist_error.is_some());
    drop(f.engine);

    let parked = f.store.inner.parked_completion(USER, day()).unwrap().unwrap();
    assert_eq!(parked.end_time, Some(at(17, 0, 0)));
    assert_eq!(stored_row(&f.store).status, SessionStatus::Active);

    // the store recovers; somebody types `out` again half an hour later
    f.store.fail_session_writes.store(false, Ordering::SeqCst);
    let later = Arc::new(ManualClock::new(at(17, 30, 0)));
    let other = engine_on(&f.store, &later);
    assert_eq!(other.current_status(USER).unwrap(), TimerStatus::Completed);

    let second = other.stop_session(USER).unwrap();
    assert!(!second.is_partial());
    assert_eq!(second.session.end_time, Some(at(17, 0, 0)));
    assert_eq!(second.elapsed_millis, 8 * 3_600_000);

    let summary = f.store.inner.find(USER, day()).unwrap().unwrap();
    assert_eq!(summary.clock_out, Some(at(17, 0, 0)));
    assert_eq!(summary.total_hours, 8.0);

    assert_eq!(stored_row(&f.store).end_time, Some(at(17, 0, 0)));
    assert!(f.store.inner.parked_completion(USER, day()).unwrap().is_none());
    assert_eq!(other.stop_session(USER).unwrap_err(), SessionError::NoActiveSession);
}

#[test]
fn parked_clock_out_survives_another_failed_write() {
    let f = fixture();
    f.engine.start_session(USER, WorkLocation::Office).unwrap();
    f.clock.set(at(17, 0, 0));
    f.store.fail_session_writes.store(true, Ordering::SeqCst);
    f.engine.stop_session(USER).unwrap();
    drop(f.engine);

    let later = Arc::new(ManualClock::new(at(18, 0, 0)));
    let other = engine_on(&f.store, &later);
    let outcome = other.stop_session(USER).unwrap();
    assert!(outcome.persist_error.is_some());
    assert_eq!(outcome.session.end_time, Some(at(17, 0, 0)));
    assert_eq!(other.pending_count(), 1);
    assert!(f.store.inner.parked_completion(USER, day()).unwrap().is_some());

    f.store.fail_session_writes.store(false, Ordering::SeqCst);
    assert_eq!(other.retry_pending(), 1);
    assert_eq!(stored_row(&f.store).end_time, Some(at(17, 0, 0)));
    assert!(f.store.inner.parked_completion(USER, day()).unwrap().is_none());
}

#[test]
fn other_transitions_write_back_a_parked_clock_out_first() {
    let f = fixture();
    f.engine.start_session(USER, WorkLocation::Office).unwrap();
    f.clock.set(at(12, 0, 0));
    f.store.fail_session_writes.store(true, Ordering::SeqCst);
    f.engine.stop_session(USER).unwrap();
    drop(f.engine);
    f.store.fail_session_writes.store(false, Ordering::SeqCst);

    let later = Arc::new(ManualClock::new(at(12, 30, 0)));
    let other = engine_on(&f.store, &later);
    assert_eq!(
        other.start_break(USER, BreakReason::Lunch).unwrap_err(),
        SessionError::InvalidTransition {
            action: "start a break",
            status: TimerStatus::Completed
        }
    );
    assert_eq!(stored_row(&f.store).end_time, Some(at(12, 0, 0)));
    assert!(f.store.inner.parked_completion(USER, day()).unwrap().is_none());

    let summary = f.store.inner.find(USER, day()).unwrap().unwrap();
    assert_eq!(summary.clock_out, Some(at(12, 0, 0)));
}

#[test]
fn reconcile_writes_back_a_parked_clock_out() {
    let f = fixture();
    f.engine.start_session(USER, WorkLocation::Office).unwrap();
    f.clock.set(at(15, 0, 0));
    f.store.fail_session_writes.store(true, Ordering::SeqCst);
    f.engine.stop_session(USER).unwrap();
    drop(f.engine);
    f.store.fail_session_writes.store(false, Ordering::SeqCst);

    let later = Arc::new(ManualClock::new(at(16, 0, 0)));
    let other = engine_on(&f.store, &later);
    let summary = other.reconcile_day(USER, day()).unwrap();
    assert_eq!(summary.clock_out, Some(at(15, 0, 0)));
    assert_eq!(summary.total_hours, 6.0);
    assert_eq!(stored_row(&f.store).status, SessionStatus::Completed);
}

#[test]
fn failed_reconciliation_does_not_undo_clock_out() {
    let f = fixture();
    f.engine.start_session(USER, WorkLocation::Office).unwrap();
    f.clock.set(at(17, 0, 0));

    f.store.fail_attendance.store(true, Ordering::SeqCst);
    let outcome = f.engine.stop_session(USER).unwrap();
    assert!(matches!(
        outcome.reconcile_error,
        Some(SessionError::ReconciliationFailed(_))
    ));
    assert!(outcome.summary.is_none());
    assert_eq!(stored_today(&f).status, SessionStatus::Completed);
    assert_eq!(summary_today(&f).unwrap().total_hours, 0.0);

    f.store.fail_attendance.store(false, Ordering::SeqCst);
    assert_eq!(f.engine.retry_pending(), 1);
    assert_eq!(summary_today(&f).unwrap().total_hours, 8.0);
}

#[test]
fn missing_attendance_record_is_recreated_at_clock_out() {
    let f = fixture();
    f.store.fail_attendance.store(true, Ordering::SeqCst);
    f.engine.start_session(USER, WorkLocation::ClientSite).unwrap();
    assert_eq!(f.engine.pending_count(), 1);
    f.store.fail_attendance.store(false, Ordering::SeqCst);
    assert!(summary_today(&f).is_none());

    f.clock.set(at(11, 0, 0));
    let outcome = f.engine.stop_session(USER).unwrap();
    assert!(outcome.reconcile_error.is_none());

    let summary = summary_today(&f).unwrap();
    assert_eq!(summary.total_hours, 2.0);
    assert_eq!(summary.work_location, WorkLocation::ClientSite);

    // the queued create is now a no-op
    assert_eq!(f.engine.retry_pending(), 1);
    assert_eq!(summary_today(&f).unwrap().total_hours, 2.0);
}

#[test]
fn reconcile_day_rebuilds_the_record() {
    let f = fixture();
    f.engine.start_session(USER, WorkLocation::Office).unwrap();
    f.clock.set(at(12, 30, 0));
    f.store.fail_attendance.store(true, Ordering::SeqCst);
    f.engine.stop_session(USER).unwrap();
    f.store.fail_attendance.store(false, Ordering::SeqCst);

    let summary = f.engine.reconcile_day(USER, day()).unwrap();
    assert_eq!(summary.total_hours, 3.5);

    let empty_day = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();
    assert!(matches!(
        f.engine.reconcile_day(USER, empty_day),
        Err(SessionError::ReconciliationFailed(_))
    ));
}

#[test]
fn concurrent_transition_is_busy() {
    let f = Arc::new(fixture());
    f.engine.start_session(USER, WorkLocation::Office).unwrap();

    let (entered, release) = f.store.hold_next_read();
    let worker = {
        let f = Arc::clone(&f);
        thread::spawn(move || f.engine.start_break(USER, BreakReason::Coffee))
    };

    entered.recv().unwrap();
    assert_eq!(f.engine.end_break(USER).unwrap_err(), SessionError::Busy);
    assert_eq!(f.engine.retry_pending(), 0);

    release.send(()).unwrap();
    worker.join().unwrap().unwrap();
    assert_eq!(stored_today(&f).status, SessionStatus::Break);
}

// ------------------------------------------------
// Facade + tick
// ------------------------------------------------

#[test]
fn subscribers_receive_the_elapsed_display_until_they_leave() {
    let f = fixture();
    let clock = f.clock.clone();
    let tc = TimeClock::with_tick_period(f.engine, std::time::Duration::from_millis(5));

    tc.start_session(USER, WorkLocation::Office).unwrap();
    clock.set(at(9, 30, 15));

    let (tx, rx) = mpsc::channel::<String>();
    let sub = tc
        .subscribe_elapsed(USER, move |s| {
            let _ = tx.send(s.to_string());
        })
        .unwrap();

    let first = rx.recv_timeout(std::time::Duration::from_secs(2)).unwrap();
    assert_eq!(first, "00:30:15");
    assert_eq!(tc.display_elapsed(USER), "00:30:15");

    sub.unsubscribe();
    // drain what was sent before unsubscribe returned
    while rx.try_recv().is_ok() {}
    thread::sleep(std::time::Duration::from_millis(40));
    assert!(rx.try_recv().is_err());
}

#[test]
fn clock_out_stops_the_shared_ticker() {
    let f = fixture();
    let clock = f.clock.clone();
    let tc = TimeClock::with_tick_period(f.engine, std::time::Duration::from_millis(5));
    tc.start_session(USER, WorkLocation::Office).unwrap();

    let (tx_a, rx_a) = mpsc::channel::<String>();
    let (tx_b, rx_b) = mpsc::channel::<String>();
    let _a = tc
        .subscribe_elapsed(USER, move |s| {
            let _ = tx_a.send(s.to_string());
        })
        .unwrap();
    let _b = tc
        .subscribe_elapsed(USER, move |s| {
            let _ = tx_b.send(s.to_string());
        })
        .unwrap();

    rx_a.recv_timeout(std::time::Duration::from_secs(2)).unwrap();
    rx_b.recv_timeout(std::time::Duration::from_secs(2)).unwrap();

    clock.set(at(10, 0, 0));
    let outcome = tc.stop_session(USER).unwrap();
    assert_eq!(outcome.elapsed_millis, 3_600_000);
    assert_eq!(tc.current_status(USER).unwrap(), TimerStatus::Completed);

    while rx_a.try_recv().is_ok() {}
    thread::sleep(std::time::Duration::from_millis(40));
    assert!(rx_a.try_recv().is_err());
}

#[test]
fn views_subscribed_before_clock_in_start_ticking_at_clock_in() {
    let f = fixture();
    let clock = f.clock.clone();
    let tc = TimeClock::with_tick_period(f.engine, std::time::Duration::from_millis(5));

    let (tx, rx) = mpsc::channel::<String>();
    let _sub = tc
        .subscribe_elapsed(USER, move |s| {
            let _ = tx.send(s.to_string());
        })
        .unwrap();
    let wait = std::time::Duration::from_secs(2);

    assert_eq!(rx.recv_timeout(wait).unwrap(), "00:00:00");
    assert!(!tc.is_ticking(USER));

    tc.start_session(USER, WorkLocation::Office).unwrap();
    assert!(tc.is_ticking(USER));
    clock.set(at(9, 10, 0));
    let ticked = (0..400)
        .filter_map(|_| rx.recv_timeout(wait).ok())
        .any(|v| v == "00:10:00");
    assert!(ticked);

    // clock out freezes the value, the view stays subscribed
    tc.stop_session(USER).unwrap();
    assert!(!tc.is_ticking(USER));
    let mut last = None;
    while let Ok(v) = rx.try_recv() {
        last = Some(v);
    }
    assert_eq!(last.as_deref(), Some("00:10:00"));

    // a new session of the same day restarts the ticks for it
    clock.set(at(14, 0, 0));
    tc.start_session(USER, WorkLocation::Home).unwrap();
    assert!(tc.is_ticking(USER));
    clock.set(at(14, 0, 5));
    let resumed = (0..400)
        .filter_map(|_| rx.recv_timeout(wait).ok())
        .any(|v| v == "00:00:05");
    assert!(resumed);
}

#[test]
fn ticks_resume_after_a_break() {
    let f = fixture();
    let clock = f.clock.clone();
    let tc = TimeClock::with_tick_period(f.engine, std::time::Duration::from_millis(5));
    tc.start_session(USER, WorkLocation::Office).unwrap();
    clock.set(at(10, 0, 0));
    tc.start_break(USER, BreakReason::Coffee).unwrap();

    let (tx, rx) = mpsc::channel::<String>();
    let _sub = tc
        .subscribe_elapsed(USER, move |s| {
            let _ = tx.send(s.to_string());
        })
        .unwrap();
    let wait = std::time::Duration::from_secs(2);
    assert_eq!(rx.recv_timeout(wait).unwrap(), "01:00:00");

    clock.set(at(10, 15, 0));
    tc.end_break(USER).unwrap();
    assert!(tc.is_ticking(USER));
    clock.set(at(10, 20, 0));
    let ticked = (0..400)
        .filter_map(|_| rx.recv_timeout(wait).ok())
        .any(|v| v == "01:05:00");
    assert!(ticked);
}

// ------------------------------------------------
// Queries
// ------------------------------------------------

#[test]
fn attendance_query_filters_by_status() {
    let store = SqliteStore::in_memory().unwrap();
    let mut half = AttendanceSummary::opened(USER, day(), at(9, 0, 0), WorkLocation::Office);
    half.status = AttendanceStatus::HalfDay;
    half.clock_out = Some(at(13, 0, 0));
    half.total_hours = 4.0;
    store.create_if_absent(&half).unwrap();

    let next = day().succ_opt().unwrap();
    let full = AttendanceSummary::opened(
        USER,
        next,
        Utc.with_ymd_and_hms(2025, 3, 4, 9, 0, 0).unwrap(),
        WorkLocation::Home,
    );
    store.create_if_absent(&full).unwrap();

    let all = AttendanceFilter::for_user(USER).between(day(), next);
    assert_eq!(store.query(&all).unwrap().len(), 2);

    let halves = store
        .query(&all.clone().with_status(Some(AttendanceStatus::HalfDay)))
        .unwrap();
    assert_eq!(halves.len(), 1);
    assert_eq!(halves[0].date, day());
    assert_eq!(halves[0].total_hours, 4.0);

    let absent = store
        .query(&all.with_status(Some(AttendanceStatus::Absent)))
        .unwrap();
    assert!(absent.is_empty());
}
