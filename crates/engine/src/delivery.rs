//! Delivery queue — single delivery attempts with durable failure
//! enrollment.
//!
//! One instance is constructed at wiring time and shared by the birthday
//! scan and the retry sweeper, so both paths converge on the same sender
//! and the same outcome contract.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use herald_common::sender::NotificationSender;
use herald_common::types::User;

use crate::backoff;
use crate::store::{RetryStore, UserStore};

pub struct DeliveryQueue {
    sender: Arc<dyn NotificationSender>,
    users: Arc<dyn UserStore>,
    retries: Arc<dyn RetryStore>,
}

impl DeliveryQueue {
    pub fn new(
        sender: Arc<dyn NotificationSender>,
        users: Arc<dyn UserStore>,
        retries: Arc<dyn RetryStore>,
    ) -> Self {
        Self {
            sender,
            users,
            retries,
        }
    }

    /// Invoke the sender exactly once for this user. The sender contract
    /// collapses every transport fault to `false`.
    pub async fn attempt(&self, user: &User) -> bool {
        let message = birthday_message(user);
        self.sender
            .send(&user.email, &user.display_name(), &message)
            .await
    }

    /// Attempt delivery and record exactly one outcome: a `last_notified`
    /// stamp on success, a retry enrollment on failure. Never fails upward;
    /// store-layer errors are logged and do not surface to the scan.
    pub async fn deliver(&self, user: &User, now: DateTime<Utc>) {
        if self.attempt(user).await {
            match self.users.update_last_notified(user.id, now).await {
                Ok(()) => {
                    tracing::info!(user_id = %user.id, "Birthday notification delivered");
                }
                Err(e) => {
                    tracing::error!(
                        user_id = %user.id,
                        error = %e,
                        "Delivered but failed to stamp last_notified"
                    );
                }
            }
        } else {
            let next_retry = now + backoff::initial_delay();
            match self.retries.create(user.id, 1, next_retry).await {
                Ok(()) => {
                    tracing::warn!(
                        user_id = %user.id,
                        next_retry = %next_retry,
                        "Delivery failed, retry enrolled"
                    );
                }
                Err(e) => {
                    tracing::error!(
                        user_id = %user.id,
                        error = %e,
                        "Delivery failed and retry enrollment failed"
                    );
                }
            }
        }
    }
}

fn birthday_message(user: &User) -> String {
    format!("Hey, {} it's your birthday", user.display_name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use uuid::Uuid;

    #[test]
    fn test_birthday_message_format() {
        let user = User {
            id: Uuid::new_v4(),
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            email: "john@example.com".to_string(),
            birthday: NaiveDate::from_ymd_opt(1990, 1, 12).unwrap(),
            timezone: "UTC".to_string(),
            last_notified: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(birthday_message(&user), "Hey, John Doe it's your birthday");
    }
}
