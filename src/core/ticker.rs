//! Periodic re-publication of the elapsed time.
//!
//! A `SubscriberSet` holds the callbacks of one user and outlives any single
//! scheduler: a `TickScheduler` is started on clock-in (or break end) and
//! publishes into the set until the session stops running. A single worker
//! thread wakes up every period, asks its source for a reading and hands the
//! formatted `HH:MM:SS` string to every subscriber. It never writes anywhere.
//!
//! Cancellation is synchronous: `cancel()` (or drop) joins the worker, and
//! `Subscription::unsubscribe()` takes the same lock the worker holds while
//! publishing, so no callback runs after either returns.

use crate::core::engine::ElapsedReading;
use crate::utils::time::format_hms;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;
use tracing::{debug, warn};

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

pub type ElapsedSource = Arc<dyn Fn() -> ElapsedReading + Send + Sync>;
type Callback = Box<dyn FnMut(&str) + Send>;

#[derive(Default)]
pub struct SubscriberSet {
    next_id: AtomicU64,
    list: Mutex<Vec<(u64, Callback)>>,
}

impl SubscriberSet {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(u64, Callback)>> {
        self.list.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a callback. It stays registered across schedulers until the
    /// returned `Subscription` is dropped.
    pub fn subscribe<F>(self: &Arc<Self>, callback: F) -> Subscription
    where
        F: FnMut(&str) + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().push((id, Box::new(callback)));
        Subscription {
            id,
            subscribers: Arc::downgrade(self),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn publish(&self, display: &str) {
        let mut list = self.lock();
        for (_, cb) in list.iter_mut() {
            cb(display);
        }
    }
}

pub struct TickScheduler {
    subscribers: Arc<SubscriberSet>,
    stop_tx: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
    worker_id: Option<ThreadId>,
}

impl TickScheduler {
    /// Start ticking into `subscribers`. The worker stops by itself after
    /// publishing a reading that is no longer running.
    pub fn with_period(
        source: ElapsedSource,
        subscribers: Arc<SubscriberSet>,
        period: Duration,
    ) -> Self {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let shared = Arc::clone(&subscribers);

        let spawned = thread::Builder::new()
            .name("rtimeclock-tick".into())
            .spawn(move || {
                loop {
                    match stop_rx.recv_timeout(period) {
                        Err(RecvTimeoutError::Timeout) => {}
                        // cancel() sent, or the scheduler was dropped
                        _ => break,
                    }

                    let reading = source();
                    shared.publish(&format_hms(reading.seconds));
                    debug!(seconds = reading.seconds, status = ?reading.status, "tick");

                    if !reading.status.is_running() {
                        debug!("Session no longer running, tick scheduler stops");
                        break;
                    }
                }
            });

        let (worker, worker_id) = match spawned {
            Ok(handle) => {
                let id = handle.thread().id();
                (Some(handle), Some(id))
            }
            Err(e) => {
                warn!(error = %e, "Could not spawn tick thread, elapsed time will not refresh");
                (None, None)
            }
        };

        Self {
            subscribers,
            stop_tx: Some(stop_tx),
            worker,
            worker_id,
        }
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(&str) + Send + 'static,
    {
        self.subscribers.subscribe(callback)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// True while the worker thread is alive (not cancelled, not finished).
    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    /// Stop ticking and wait for the worker to exit.
    pub fn cancel(&mut self) {
        drop(self.stop_tx.take());

        let Some(worker) = self.worker.take() else {
            return;
        };
        // joining ourselves would deadlock (cancel called from a callback)
        if self.worker_id == Some(thread::current().id()) {
            return;
        }
        if worker.join().is_err() {
            warn!("Tick thread panicked");
        }
    }
}

impl Drop for TickScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Handle returned by `subscribe`. Dropping it unsubscribes.
pub struct Subscription {
    id: u64,
    subscribers: Weak<SubscriberSet>,
}

impl Subscription {
    /// Remove the callback. Once this returns the callback never fires again.
    /// Must not be called from inside the callback itself.
    pub fn unsubscribe(self) {
        // Drop does the work
    }

    fn detach(&self) {
        if let Some(subs) = self.subscribers.upgrade() {
            subs.lock().retain(|(id, _)| *id != self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach();
    }
}
