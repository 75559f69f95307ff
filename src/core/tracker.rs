//! The time clock as seen by a dashboard: the engine's transitions plus one
//! shared tick scheduler per user with a running session.

use crate::core::engine::{SessionEngine, StopOutcome};
use crate::core::ticker::{ElapsedSource, SubscriberSet, Subscription, TickScheduler};
use crate::errors::SessionResult;
use crate::models::break_interval::BreakReason;
use crate::models::location::WorkLocation;
use crate::models::session::TimerStatus;
use crate::utils::time::format_hms;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Subscribers of one user and the scheduler currently feeding them, if any.
#[derive(Default)]
struct UserTicks {
    subscribers: Arc<SubscriberSet>,
    scheduler: Option<TickScheduler>,
}

pub struct TimeClock {
    engine: Arc<SessionEngine>,
    tick_period: Duration,
    ticks: Mutex<HashMap<String, UserTicks>>,
}

impl TimeClock {
    pub fn new(engine: SessionEngine) -> Self {
        Self::with_tick_period(engine, crate::core::ticker::TICK_PERIOD)
    }

    pub fn with_tick_period(engine: SessionEngine, tick_period: Duration) -> Self {
        Self {
            engine: Arc::new(engine),
            tick_period,
            ticks: Mutex::new(HashMap::new()),
        }
    }

    pub fn engine(&self) -> &SessionEngine {
        &self.engine
    }

    /// Clock in. Views subscribed before clock-in start receiving ticks.
    pub fn start_session(&self, user_id: &str, location: WorkLocation) -> SessionResult<()> {
        self.engine.start_session(user_id, location)?;
        self.ensure_ticking(user_id);
        Ok(())
    }

    /// Clock out, publish the frozen value once and stop the user's ticker
    /// before returning. Subscribers stay registered for a later session.
    pub fn stop_session(&self, user_id: &str) -> SessionResult<StopOutcome> {
        let outcome = self.engine.stop_session(user_id)?;
        let subscribers = self.stop_ticking(user_id);
        if let Some(subs) = subscribers {
            subs.publish(&format_hms(outcome.elapsed_millis / 1000));
        }
        Ok(outcome)
    }

    pub fn start_break(&self, user_id: &str, reason: BreakReason) -> SessionResult<()> {
        self.engine.start_break(user_id, reason)?;
        self.ensure_ticking(user_id);
        Ok(())
    }

    pub fn end_break(&self, user_id: &str) -> SessionResult<()> {
        self.engine.end_break(user_id)?;
        self.ensure_ticking(user_id);
        Ok(())
    }

    pub fn current_status(&self, user_id: &str) -> SessionResult<TimerStatus> {
        self.engine.current_status(user_id)
    }

    /// Elapsed work time as `HH:MM:SS`, from the cached snapshot.
    pub fn display_elapsed(&self, user_id: &str) -> String {
        format_hms(self.engine.elapsed(user_id))
    }

    /// The callback gets the current value at once, then one value per tick
    /// while the user's session is running (now or after a later clock-in).
    pub fn subscribe_elapsed<F>(&self, user_id: &str, mut callback: F) -> SessionResult<Subscription>
    where
        F: FnMut(&str) + Send + 'static,
    {
        self.engine.load(user_id)?;
        callback(&self.display_elapsed(user_id));

        let subscription = {
            let mut ticks = self.ticks_lock();
            let entry = ticks.entry(user_id.to_string()).or_default();
            entry.subscribers.subscribe(callback)
        };
        self.ensure_ticking(user_id);
        Ok(subscription)
    }

    pub fn retry_pending(&self) -> usize {
        self.engine.retry_pending()
    }

    /// True while a scheduler feeds the user's subscribers.
    pub fn is_ticking(&self, user_id: &str) -> bool {
        self.ticks_lock()
            .get(user_id)
            .and_then(|t| t.scheduler.as_ref())
            .is_some_and(TickScheduler::is_running)
    }

    /// Start a scheduler for the user if the session runs, somebody listens
    /// and no live scheduler exists yet.
    fn ensure_ticking(&self, user_id: &str) {
        if !self.engine.reading(user_id).status.is_running() {
            return;
        }

        let finished = {
            let mut ticks = self.ticks_lock();
            let Some(entry) = ticks.get_mut(user_id) else {
                return;
            };
            if entry.subscribers.is_empty()
                || entry.scheduler.as_ref().is_some_and(TickScheduler::is_running)
            {
                return;
            }

            let engine = Arc::clone(&self.engine);
            let user = user_id.to_string();
            let source: ElapsedSource = Arc::new(move || engine.reading(&user));
            let fresh = TickScheduler::with_period(
                source,
                Arc::clone(&entry.subscribers),
                self.tick_period,
            );
            entry.scheduler.replace(fresh)
        };
        // a finished worker joins at once, but never under the map lock
        drop(finished);
    }

    fn stop_ticking(&self, user_id: &str) -> Option<Arc<SubscriberSet>> {
        let (subscribers, scheduler) = {
            let mut ticks = self.ticks_lock();
            let entry = ticks.get_mut(user_id)?;
            (Arc::clone(&entry.subscribers), entry.scheduler.take())
        };
        // dropped outside the map lock: Drop joins the worker
        drop(scheduler);
        Some(subscribers)
    }

    fn ticks_lock(&self) -> MutexGuard<'_, HashMap<String, UserTicks>> {
        self.ticks.lock().unwrap_or_else(|e| e.into_inner())
    }
}
