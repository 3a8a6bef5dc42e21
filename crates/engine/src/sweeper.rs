//! Retry sweeper — single-flight re-delivery of failed notifications.
//!
//! Each sweep drains a bounded batch of due retries, oldest first. Sweeps
//! never overlap: a sweep that starts while another is in flight is skipped
//! outright, performing no store reads or writes, so a slow batch cannot
//! double-send.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};

use herald_common::types::RetryRecord;

use crate::backoff;
use crate::delivery::DeliveryQueue;
use crate::store::{RetryStore, UserStore};

pub struct RetrySweeper {
    queue: Arc<DeliveryQueue>,
    users: Arc<dyn UserStore>,
    retries: Arc<dyn RetryStore>,
    batch_size: i64,
    in_flight: AtomicBool,
}

/// Releases the in-flight flag when a sweep ends, however it ends.
struct SweepGuard<'a>(&'a AtomicBool);

impl Drop for SweepGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl RetrySweeper {
    pub fn new(
        queue: Arc<DeliveryQueue>,
        users: Arc<dyn UserStore>,
        retries: Arc<dyn RetryStore>,
        batch_size: i64,
    ) -> Self {
        Self {
            queue,
            users,
            retries,
            batch_size,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Run one sweep over the due retries.
    ///
    /// Per record: a missing user deletes the record (orphan cleanup); a
    /// successful re-send atomically deletes the record and stamps the user;
    /// a failed re-send either reschedules on the backoff schedule or, once
    /// attempts are exhausted, drops the record for good.
    pub async fn sweep(&self, now: DateTime<Utc>) {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            tracing::debug!("Sweep already in flight, skipping");
            return;
        }
        let _guard = SweepGuard(&self.in_flight);

        let due = match self.retries.find_due(now, self.batch_size).await {
            Ok(due) => due,
            Err(e) => {
                tracing::error!(error = %e, "Failed to fetch due retries");
                return;
            }
        };

        if due.is_empty() {
            return;
        }

        tracing::debug!(count = due.len(), "Sweeping due retries");
        for record in due {
            self.process(record, now).await;
        }
    }

    async fn process(&self, record: RetryRecord, now: DateTime<Utc>) {
        let user = match self.users.find_by_id(record.user_id).await {
            Ok(user) => user,
            Err(e) => {
                tracing::error!(
                    retry_id = %record.id,
                    error = %e,
                    "Failed to resolve user for retry"
                );
                return;
            }
        };

        let Some(user) = user else {
            tracing::info!(
                retry_id = %record.id,
                user_id = %record.user_id,
                "Deleting orphaned retry for missing user"
            );
            if let Err(e) = self.retries.delete(record.id).await {
                tracing::error!(retry_id = %record.id, error = %e, "Failed to delete orphaned retry");
            }
            return;
        };

        if self.queue.attempt(&user).await {
            match self.retries.succeed(record.id, user.id, now).await {
                Ok(()) => {
                    tracing::info!(
                        user_id = %user.id,
                        attempt = record.attempt,
                        "Birthday notification delivered on retry"
                    );
                }
                Err(e) => {
                    tracing::error!(user_id = %user.id, error = %e, "Failed to finalize successful retry");
                }
            }
            return;
        }

        match backoff::delay_for_attempt(record.attempt) {
            Some(delay) => {
                let next_retry = now + delay;
                match self
                    .retries
                    .update(record.id, record.attempt + 1, next_retry)
                    .await
                {
                    Ok(()) => {
                        tracing::warn!(
                            user_id = %user.id,
                            attempt = record.attempt + 1,
                            next_retry = %next_retry,
                            "Retry failed, rescheduled"
                        );
                    }
                    Err(e) => {
                        tracing::error!(user_id = %user.id, error = %e, "Failed to reschedule retry");
                    }
                }
            }
            None => {
                tracing::warn!(
                    user_id = %user.id,
                    attempts = record.attempt,
                    "Retry attempts exhausted, dropping notification"
                );
                if let Err(e) = self.retries.delete(record.id).await {
                    tracing::error!(user_id = %user.id, error = %e, "Failed to delete exhausted retry");
                }
            }
        }
    }
}
