use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user in the system.
///
/// `birthday` is a time-zone-naive calendar date; `timezone` is the IANA
/// identifier used to project instants into the user's local time.
/// `last_notified` is the UTC instant of the most recent birthday message.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub birthday: NaiveDate,
    pub timezone: String,
    pub last_notified: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Full display name, as used in outbound messages.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A pending delivery retry for a user.
///
/// A user has at most one active record at any time; `attempt` counts the
/// failed deliveries so far and stays within `[1, MAX_RETRIES]`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RetryRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub attempt: i32,
    pub next_retry: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
