//! Scheduler loop — owns the periodic birthday scan and retry sweep.
//!
//! Two independent triggers: a frequent scan (the eligibility window is an
//! hour wide but should be caught promptly) and a slower sweep (retries are
//! not time-critical to the same degree). The two may run concurrently with
//! each other; each never overlaps itself.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;

use crate::delivery::DeliveryQueue;
use crate::eligibility;
use crate::store::UserStore;
use crate::sweeper::RetrySweeper;
use crate::ticker::Ticker;

struct Triggers {
    scan: Ticker,
    sweep: Ticker,
}

pub struct BirthdayScheduler {
    users: Arc<dyn UserStore>,
    queue: Arc<DeliveryQueue>,
    sweeper: Arc<RetrySweeper>,
    scan_interval: Duration,
    sweep_interval: Duration,
    triggers: Mutex<Option<Triggers>>,
}

impl BirthdayScheduler {
    pub fn new(
        users: Arc<dyn UserStore>,
        queue: Arc<DeliveryQueue>,
        sweeper: Arc<RetrySweeper>,
        scan_interval: Duration,
        sweep_interval: Duration,
    ) -> Self {
        Self {
            users,
            queue,
            sweeper,
            scan_interval,
            sweep_interval,
            triggers: Mutex::new(None),
        }
    }

    /// Register both periodic triggers. A scheduler that is already running
    /// is left untouched.
    pub fn start(&self) {
        let Ok(mut triggers) = self.triggers.lock() else {
            return;
        };
        if triggers.is_some() {
            tracing::warn!("Scheduler already running");
            return;
        }

        let users = self.users.clone();
        let queue = self.queue.clone();
        let scan = Ticker::spawn(self.scan_interval, move || {
            let users = users.clone();
            let queue = queue.clone();
            async move { run_scan(users, queue).await }
        });

        let sweeper = self.sweeper.clone();
        let sweep = Ticker::spawn(self.sweep_interval, move || {
            let sweeper = sweeper.clone();
            async move { sweeper.sweep(Utc::now()).await }
        });

        *triggers = Some(Triggers { scan, sweep });
        tracing::info!(
            scan_interval_secs = self.scan_interval.as_secs(),
            sweep_interval_secs = self.sweep_interval.as_secs(),
            "Scheduler started"
        );
    }

    /// Cancel both triggers and clear scheduling state. Idempotent; nothing
    /// fires after stop returns.
    pub fn stop(&self) {
        let Ok(mut triggers) = self.triggers.lock() else {
            return;
        };
        if let Some(t) = triggers.take() {
            t.scan.cancel();
            t.sweep.cancel();
            tracing::info!("Scheduler stopped");
        }
    }

    /// RUNNING iff both triggers are alive and report a next fire time.
    /// A trigger whose task has died drags this to false; "start was called"
    /// is not enough.
    pub fn is_running(&self) -> bool {
        let Ok(triggers) = self.triggers.lock() else {
            return false;
        };
        triggers.as_ref().is_some_and(|t| {
            t.scan.is_alive()
                && t.sweep.is_alive()
                && t.scan.next_fire_time().is_some()
                && t.sweep.next_fire_time().is_some()
        })
    }
}

/// One birthday scan cycle against the current instant.
pub async fn run_scan(users: Arc<dyn UserStore>, queue: Arc<DeliveryQueue>) {
    scan_at(users, queue, Utc::now()).await;
}

/// Evaluate every user against a single instant and hand the due ones to
/// the delivery queue.
///
/// A user whose timezone fails to resolve is logged and skipped; the batch
/// always runs to the end. Eligibility is gated only by `last_notified` —
/// an outstanding retry for a user does not suppress a fresh evaluation.
pub async fn scan_at(
    users: Arc<dyn UserStore>,
    queue: Arc<DeliveryQueue>,
    now: chrono::DateTime<Utc>,
) {
    let all = match users.find_all().await {
        Ok(all) => all,
        Err(e) => {
            tracing::error!(error = %e, "Birthday scan failed to load users");
            return;
        }
    };

    for user in all {
        match eligibility::is_due_now(&user, now) {
            Ok(true) => queue.deliver(&user, now).await,
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(
                    user_id = %user.id,
                    timezone = %user.timezone,
                    error = %e,
                    "Skipping user in birthday scan"
                );
            }
        }
    }
}
