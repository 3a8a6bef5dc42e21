//! Periodic trigger primitive.
//!
//! A [`Ticker`] owns one background task that fires a job at a fixed period.
//! Each firing runs to completion before the next one is scheduled, so a
//! single trigger never overlaps itself. The next planned fire instant is
//! published for liveness checks and cleared once the ticker stops, so a
//! dead trigger cannot report itself healthy.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

pub struct Ticker {
    handle: JoinHandle<()>,
    cancelled: Arc<AtomicBool>,
    notify: Arc<Notify>,
    next_fire: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl Ticker {
    /// Spawn a ticker that fires `job` every `period`, first firing one
    /// period from now.
    pub fn spawn<F, Fut>(period: Duration, job: F) -> Self
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancelled = Arc::new(AtomicBool::new(false));
        let notify = Arc::new(Notify::new());
        // Armed before the task first polls, so liveness queries issued right
        // after spawn already see a scheduled invocation.
        let next_fire: Arc<Mutex<Option<DateTime<Utc>>>> =
            Arc::new(Mutex::new(Some(Utc::now() + period)));

        let task_cancelled = cancelled.clone();
        let task_notify = notify.clone();
        let task_next_fire = next_fire.clone();

        let handle = tokio::spawn(async move {
            loop {
                if task_cancelled.load(Ordering::Acquire) {
                    break;
                }
                if let Ok(mut slot) = task_next_fire.lock() {
                    *slot = Some(Utc::now() + period);
                }
                tokio::select! {
                    _ = task_notify.notified() => break,
                    _ = tokio::time::sleep(period) => {
                        if task_cancelled.load(Ordering::Acquire) {
                            break;
                        }
                        // Runs to completion before the next tick is armed.
                        job().await;
                    }
                }
            }
            if let Ok(mut slot) = task_next_fire.lock() {
                *slot = None;
            }
        });

        Self {
            handle,
            cancelled,
            notify,
            next_fire,
        }
    }

    /// Stop the ticker. No firing happens after this returns; a job already
    /// in flight finishes normally. Safe to call repeatedly.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
        self.notify.notify_waiters();
        if let Ok(mut slot) = self.next_fire.lock() {
            *slot = None;
        }
    }

    /// The next planned fire instant, or `None` once the ticker has stopped.
    pub fn next_fire_time(&self) -> Option<DateTime<Utc>> {
        self.next_fire.lock().ok().and_then(|slot| *slot)
    }

    /// Whether the background task is still running.
    pub fn is_alive(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        // A dropped ticker winds down like a cancelled one: the task exits on
        // its own without cutting a job that is already in flight.
        self.cancel();
    }
}
