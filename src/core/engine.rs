//! Work-session state machine.
//!
//! ```text
//! NotStarted --start_session--> Active
//! Active     --start_break----> Break
//! Break      --end_break------> Active
//! Active     --stop_session---> Completed
//! Break      --stop_session---> Completed   (open break closed first)
//! ```
//!
//! Every transition re-reads today's session from the store, applies the
//! change to that fresh copy, persists it, and only then replaces the cached
//! snapshot used by [`SessionEngine::elapsed`] and the tick scheduler.

use crate::clock::Clock;
use crate::core::calculator;
use crate::core::reconciler::Reconciler;
use crate::db::log::AuditOp;
use crate::errors::{SessionError, SessionResult};
use crate::models::attendance::AttendanceSummary;
use crate::models::break_interval::BreakReason;
use crate::models::location::WorkLocation;
use crate::models::session::{Session, TimerStatus};
use crate::store::{AttendanceStore, SessionStore};
use chrono::NaiveDate;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, TryLockError};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    /// Extra attempts for a store read that failed with `StoreUnavailable`.
    pub read_retries: u32,
    /// Sleep before retry n is `retry_backoff * n`.
    pub retry_backoff: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            read_retries: 3,
            retry_backoff: Duration::from_millis(100),
        }
    }
}

/// Result of a clock-out. The session is completed locally in every case;
/// the two error slots say which writes are still owed to the stores.
#[derive(Debug, Clone)]
pub struct StopOutcome {
    pub session: Session,
    pub elapsed_millis: i64,
    pub summary: Option<AttendanceSummary>,
    /// Writing the completed session failed; the write is queued.
    pub persist_error: Option<SessionError>,
    /// Updating the attendance record failed; reconciliation is queued.
    pub reconcile_error: Option<SessionError>,
}

impl StopOutcome {
    pub fn is_partial(&self) -> bool {
        self.persist_error.is_some() || self.reconcile_error.is_some()
    }

    pub fn total_hours(&self) -> f64 {
        calculator::total_hours(&self.session).unwrap_or(0.0)
    }
}

/// What the tick scheduler needs on every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElapsedReading {
    pub seconds: i64,
    pub status: TimerStatus,
}

/// A write that changed local state but did not reach the store.
#[derive(Debug, Clone)]
enum PendingWrite {
    OpenAttendance(AttendanceSummary),
    Session(Session),
    Reconcile(Session),
}

pub struct SessionEngine {
    sessions: Arc<dyn SessionStore>,
    attendance: Arc<dyn AttendanceStore>,
    reconciler: Reconciler,
    clock: Arc<dyn Clock>,
    options: EngineOptions,
    in_flight: Mutex<()>,
    cache: RwLock<HashMap<String, Session>>,
    pending: Mutex<VecDeque<PendingWrite>>,
}

impl SessionEngine {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        attendance: Arc<dyn AttendanceStore>,
        clock: Arc<dyn Clock>,
        options: EngineOptions,
    ) -> Self {
        Self {
            reconciler: Reconciler::new(Arc::clone(&attendance)),
            sessions,
            attendance,
            clock,
            options,
            in_flight: Mutex::new(()),
            cache: RwLock::new(HashMap::new()),
            pending: Mutex::new(VecDeque::new()),
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    // ------------------------------------------------
    // Transitions
    // ------------------------------------------------

    /// Clock in. Creates today's session and, if missing, today's attendance record.
    pub fn start_session(&self, user_id: &str, location: WorkLocation) -> SessionResult<Session> {
        let _guard = self.begin_transition()?;
        let today = self.clock.today();
        self.settle_parked(user_id, today)?;
        let now = self.clock.now();

        if let Some(open) = self.read("find open session", || {
            self.sessions.find_open(user_id, today)
        })? {
            self.cache_put(open);
            return Err(SessionError::AlreadyActive { date: today });
        }

        let mut session = Session::start(user_id, today, now, location);
        session.id = self.sessions.create(&session)?;
        self.cache_put(session.clone());

        let summary = AttendanceSummary::opened(user_id, today, now, location);
        if let Err(e) = self.attendance.create_if_absent(&summary) {
            // the session stands; the record is retried, and reconcile recreates it anyway
            warn!(user = %user_id, date = %today, error = %e, "Attendance record not created at clock-in");
            self.enqueue(PendingWrite::OpenAttendance(summary));
        }

        self.audit(
            AuditOp::ClockIn,
            user_id,
            &format!("Clocked in at {} ({})", now.to_rfc3339(), location),
        );
        info!(user = %user_id, session = session.id, location = %location, "Session started");
        Ok(session)
    }

    pub fn start_break(&self, user_id: &str, reason: BreakReason) -> SessionResult<Session> {
        let _guard = self.begin_transition()?;
        self.settle_parked(user_id, self.clock.today())?;
        let now = self.clock.now();

        let mut session = self.fresh_today(user_id)?.ok_or(SessionError::InvalidTransition {
            action: "start a break",
            status: TimerStatus::NotStarted,
        })?;
        session.begin_break(now, reason)?;

        self.sessions.update(&session)?;
        self.cache_put(session.clone());

        self.audit(AuditOp::BreakStart, user_id, &format!("Break started ({reason})"));
        info!(user = %user_id, session = session.id, reason = %reason, "Break started");
        Ok(session)
    }

    pub fn end_break(&self, user_id: &str) -> SessionResult<Session> {
        let _guard = self.begin_transition()?;
        self.settle_parked(user_id, self.clock.today())?;
        let now = self.clock.now();

        let mut session = self.fresh_today(user_id)?.ok_or(SessionError::InvalidTransition {
            action: "end a break",
            status: TimerStatus::NotStarted,
        })?;
        session.finish_break(now)?;

        self.sessions.update(&session)?;
        self.cache_put(session.clone());

        let secs = session
            .breaks
            .last()
            .and_then(|b| b.duration_seconds)
            .unwrap_or(0);
        self.audit(AuditOp::BreakEnd, user_id, &format!("Break ended after {secs}s"));
        info!(user = %user_id, session = session.id, break_seconds = secs, "Break ended");
        Ok(session)
    }

    /// Clock out. Completion is never rolled back: a failed session write is
    /// parked in the store and queued, a failed reconciliation is queued, and
    /// both are reported in the outcome.
    ///
    /// If an earlier clock-out of today's session was parked, that completion
    /// is written back and returned instead of completing again at `now`.
    pub fn stop_session(&self, user_id: &str) -> SessionResult<StopOutcome> {
        let _guard = self.begin_transition()?;
        if let Some(replayed) = self.replay_parked(user_id, self.clock.today())? {
            return Ok(replayed);
        }
        let now = self.clock.now();

        let mut session = match self.fresh_today(user_id)? {
            Some(s) if s.status.is_in_progress() => s,
            _ => return Err(SessionError::NoActiveSession),
        };
        session.complete(now)?;

        let persist_error = match self.sessions.update(&session) {
            Ok(()) => None,
            Err(SessionError::NoActiveSession) => {
                // completed elsewhere in the meantime
                self.cache_remove(user_id);
                return Err(SessionError::NoActiveSession);
            }
            Err(e) => {
                warn!(user = %user_id, session = session.id, error = %e, "Completed session not persisted, parked and queued");
                if let Err(pe) = self.sessions.park_completion(&session) {
                    warn!(user = %user_id, session = session.id, error = %pe, "Completion could not be parked either");
                }
                self.enqueue(PendingWrite::Session(session.clone()));
                Some(e)
            }
        };
        self.cache_put(session.clone());

        let outcome = self.finish_completion(user_id, session, persist_error);
        self.audit(
            AuditOp::ClockOut,
            user_id,
            &format!(
                "Clocked out at {} after {}ms",
                now.to_rfc3339(),
                outcome.elapsed_millis
            ),
        );
        info!(user = %user_id, session = outcome.session.id, elapsed_millis = outcome.elapsed_millis, "Session completed");
        Ok(outcome)
    }

    // ------------------------------------------------
    // Reads
    // ------------------------------------------------

    /// Refresh the cached snapshot from the store and return it.
    /// In-progress session first, otherwise the latest one of the day.
    pub fn load(&self, user_id: &str) -> SessionResult<Option<Session>> {
        self.fresh_today(user_id)
    }

    pub fn current_status(&self, user_id: &str) -> SessionResult<TimerStatus> {
        Ok(self
            .load(user_id)?
            .map(|s| s.status.into())
            .unwrap_or(TimerStatus::NotStarted))
    }

    /// Last loaded session for the user, without touching the store.
    pub fn snapshot(&self, user_id: &str) -> Option<Session> {
        self.cache_read().get(user_id).cloned()
    }

    /// Worked seconds from the cached snapshot. Never touches the store.
    pub fn elapsed(&self, user_id: &str) -> i64 {
        self.reading(user_id).seconds
    }

    pub fn reading(&self, user_id: &str) -> ElapsedReading {
        let now = self.clock.now();
        match self.cache_read().get(user_id) {
            Some(s) => ElapsedReading {
                seconds: calculator::elapsed_seconds(s, now),
                status: s.status.into(),
            },
            None => ElapsedReading {
                seconds: 0,
                status: TimerStatus::NotStarted,
            },
        }
    }

    // ------------------------------------------------
    // Reconciliation & retries
    // ------------------------------------------------

    /// Re-run reconciliation from the latest completed session of `date`.
    pub fn reconcile_day(&self, user_id: &str, date: NaiveDate) -> SessionResult<AttendanceSummary> {
        let _guard = self.begin_transition()?;

        if let Some(replayed) = self.replay_parked(user_id, date)? {
            return match (replayed.summary, replayed.reconcile_error) {
                (Some(summary), _) => Ok(summary),
                (None, Some(e)) => Err(e),
                (None, None) => Err(SessionError::ReconciliationFailed(format!(
                    "{date} was not reconciled"
                ))),
            };
        }

        let sessions = self.read("list sessions", || self.sessions.list_for_day(user_id, date))?;
        let last_completed = sessions
            .into_iter()
            .rev()
            .find(|s| s.end_time.is_some())
            .ok_or_else(|| {
                SessionError::ReconciliationFailed(format!("no completed session on {date}"))
            })?;

        let summary = self.reconciler.reconcile(&last_completed)?;
        self.audit(
            AuditOp::Reconcile,
            user_id,
            &format!("{date} reconciled manually: {:.2}h", summary.total_hours),
        );
        Ok(summary)
    }

    pub fn pending_count(&self) -> usize {
        self.pending_lock().len()
    }

    /// Flush queued writes in order. Stops at the first one that still fails
    /// and returns how many went through.
    pub fn retry_pending(&self) -> usize {
        let Ok(_guard) = self.begin_transition() else {
            return 0;
        };

        let mut done = 0;
        loop {
            let Some(job) = self.pending_lock().pop_front() else {
                break;
            };

            let result = match &job {
                PendingWrite::OpenAttendance(summary) => {
                    self.attendance.create_if_absent(summary).map(|_| ())
                }
                PendingWrite::Session(session) => match self.sessions.update(session) {
                    // already completed in the store: nothing left to write
                    Ok(()) | Err(SessionError::NoActiveSession) => {
                        self.unpark(session.id);
                        Ok(())
                    }
                    Err(e) => Err(e),
                },
                PendingWrite::Reconcile(session) => self.reconciler.reconcile(session).map(|_| ()),
            };

            match result {
                Ok(()) => {
                    debug!(?job, "Queued write flushed");
                    done += 1;
                }
                Err(e) => {
                    warn!(error = %e, "Queued write still failing");
                    self.pending_lock().push_front(job);
                    break;
                }
            }
        }
        done
    }

    // ------------------------------------------------
    // Internals
    // ------------------------------------------------

    fn begin_transition(&self) -> SessionResult<MutexGuard<'_, ()>> {
        match self.in_flight.try_lock() {
            Ok(g) => Ok(g),
            Err(TryLockError::Poisoned(p)) => Ok(p.into_inner()),
            Err(TryLockError::WouldBlock) => Err(SessionError::Busy),
        }
    }

    fn fresh_today(&self, user_id: &str) -> SessionResult<Option<Session>> {
        let today = self.clock.today();
        let mut sessions =
            self.read("list sessions", || self.sessions.list_for_day(user_id, today))?;

        // a parked completion is the truth for its still-open row
        if let Some(parked) = self.read("find parked completion", || {
            self.sessions.parked_completion(user_id, today)
        })? && let Some(slot) = sessions
            .iter_mut()
            .find(|s| s.id == parked.id && s.status.is_in_progress())
        {
            *slot = parked;
        }

        let current = sessions
            .iter()
            .find(|s| s.status.is_in_progress())
            .or_else(|| sessions.last())
            .cloned();

        match &current {
            Some(s) => self.cache_put(s.clone()),
            None => self.cache_remove(user_id),
        }
        Ok(current)
    }

    /// Run a store read, retrying `StoreUnavailable` with a linear backoff.
    fn read<T>(&self, what: &str, f: impl Fn() -> SessionResult<T>) -> SessionResult<T> {
        let mut attempt = 0;
        loop {
            match f() {
                Err(SessionError::StoreUnavailable(msg)) if attempt < self.options.read_retries => {
                    attempt += 1;
                    warn!(attempt, error = %msg, "Store read failed ({what}), retrying");
                    thread::sleep(self.options.retry_backoff * attempt);
                }
                other => return other,
            }
        }
    }

    /// Reconcile a completed session and assemble the clock-out outcome.
    fn finish_completion(
        &self,
        user_id: &str,
        session: Session,
        persist_error: Option<SessionError>,
    ) -> StopOutcome {
        let elapsed_millis = calculator::work_millis(&session).unwrap_or(0);

        let (summary, reconcile_error) = match self.reconciler.reconcile(&session) {
            Ok(summary) => {
                self.audit(
                    AuditOp::Reconcile,
                    user_id,
                    &format!("{} reconciled: {:.2}h", session.date, summary.total_hours),
                );
                (Some(summary), None)
            }
            Err(e) => {
                self.enqueue(PendingWrite::Reconcile(session.clone()));
                self.audit(AuditOp::ReconcileFailed, user_id, &e.to_string());
                (None, Some(e))
            }
        };

        StopOutcome {
            session,
            elapsed_millis,
            summary,
            persist_error,
            reconcile_error,
        }
    }

    /// Write back a completion an earlier process parked for `(user_id, date)`.
    /// `None` when nothing was parked, or the row got completed some other way.
    fn replay_parked(&self, user_id: &str, date: NaiveDate) -> SessionResult<Option<StopOutcome>> {
        let Some(session) = self.read("find parked completion", || {
            self.sessions.parked_completion(user_id, date)
        })?
        else {
            return Ok(None);
        };

        let persist_error = match self.sessions.update(&session) {
            Ok(()) => None,
            Err(SessionError::NoActiveSession) => {
                debug!(session = session.id, "Parked completion already written, dropped");
                self.unpark(session.id);
                return Ok(None);
            }
            Err(e) => {
                warn!(user = %user_id, session = session.id, error = %e, "Parked completion still not persisted");
                self.enqueue(PendingWrite::Session(session.clone()));
                Some(e)
            }
        };
        if persist_error.is_none() {
            self.unpark(session.id);
            info!(user = %user_id, session = session.id, "Parked completion written back");
        }
        self.cache_put(session.clone());

        let end = session.end_time.map(|t| t.to_rfc3339()).unwrap_or_default();
        let outcome = self.finish_completion(user_id, session, persist_error);
        self.audit(
            AuditOp::ClockOut,
            user_id,
            &format!("Parked clock-out at {end} written back"),
        );
        Ok(Some(outcome))
    }

    /// Before any other transition: a parked completion must reach the store
    /// first, or the transition would act on a row that is already over.
    fn settle_parked(&self, user_id: &str, date: NaiveDate) -> SessionResult<()> {
        match self.replay_parked(user_id, date)? {
            Some(StopOutcome {
                persist_error: Some(e),
                ..
            }) => Err(e),
            _ => Ok(()),
        }
    }

    fn unpark(&self, session_id: i64) {
        if let Err(e) = self.sessions.clear_parked(session_id) {
            warn!(session = session_id, error = %e, "Parked completion not cleared");
        }
    }

    fn audit(&self, op: AuditOp, user_id: &str, message: &str) {
        if let Err(e) = self.sessions.audit(self.clock.now(), op, user_id, message) {
            warn!(error = %e, op = op.as_str(), "Failed to write internal log");
        }
    }

    fn enqueue(&self, job: PendingWrite) {
        self.pending_lock().push_back(job);
    }

    fn pending_lock(&self) -> MutexGuard<'_, VecDeque<PendingWrite>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn cache_read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Session>> {
        self.cache.read().unwrap_or_else(|e| e.into_inner())
    }

    fn cache_put(&self, session: Session) {
        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        cache.insert(session.user_id.clone(), session);
    }

    fn cache_remove(&self, user_id: &str) {
        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        cache.remove(user_id);
    }
}
