//! Fixed retry backoff schedule.
//!
//! Failed deliveries walk a fixed ascending schedule rather than an open
//! formula: 5 minutes, then 30 minutes, then 2 hours, then give up. The
//! schedule is indexed by the number of failed attempts already recorded,
//! so an attempt-1 failure schedules the 30-minute retry, not a repeat of
//! the 5-minute one.

use chrono::Duration;

/// Maximum number of delivery attempts for a single notification.
pub const MAX_RETRIES: i32 = 3;

/// Ascending per-attempt delays, in minutes.
const SCHEDULE_MINUTES: [i64; MAX_RETRIES as usize] = [5, 30, 120];

/// Delay applied when a user is first enrolled after a failed delivery.
pub fn initial_delay() -> Duration {
    Duration::minutes(SCHEDULE_MINUTES[0])
}

/// Delay before the next retry, given the number of failed attempts so far.
///
/// `attempts_so_far` is the pre-increment attempt counter: 1 after the
/// enrollment failure, 2 after the first sweep failure, and so on. Returns
/// `None` once the schedule is exhausted (`attempts_so_far >= MAX_RETRIES`),
/// meaning the retry should be dropped.
pub fn delay_for_attempt(attempts_so_far: i32) -> Option<Duration> {
    if !(0..MAX_RETRIES).contains(&attempts_so_far) {
        return None;
    }
    SCHEDULE_MINUTES
        .get(attempts_so_far as usize)
        .map(|minutes| Duration::minutes(*minutes))
}
