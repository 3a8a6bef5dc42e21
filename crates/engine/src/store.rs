//! Persistence interfaces consumed by the core, with PostgreSQL
//! implementations.
//!
//! The core only needs a handful of operations on users and retries; the
//! traits keep the orchestration testable against in-memory stores while the
//! `Pg*` types carry the real queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use herald_common::error::AppError;
use herald_common::types::{RetryRecord, User};

/// Read/write access to user records.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_all(&self) -> Result<Vec<User>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Stamp the instant of the most recent birthday notification.
    async fn update_last_notified(
        &self,
        id: Uuid,
        instant: DateTime<Utc>,
    ) -> Result<(), AppError>;
}

/// Durable store of pending delivery retries.
#[async_trait]
pub trait RetryStore: Send + Sync {
    /// Fetch up to `limit` records with `next_retry <= now`, oldest first.
    async fn find_due(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<RetryRecord>, AppError>;

    async fn find_active_for_user(&self, user_id: Uuid) -> Result<Option<RetryRecord>, AppError>;

    /// Enroll a retry for a user. A user who already has an active record
    /// keeps it unchanged; there is never more than one per user.
    async fn create(
        &self,
        user_id: Uuid,
        attempt: i32,
        next_retry: DateTime<Utc>,
    ) -> Result<(), AppError>;

    async fn update(
        &self,
        id: Uuid,
        attempt: i32,
        next_retry: DateTime<Utc>,
    ) -> Result<(), AppError>;

    async fn delete(&self, id: Uuid) -> Result<(), AppError>;

    /// Delete the retry and stamp the user's `last_notified` as one unit.
    /// Partial application would either duplicate or lose a notification.
    async fn succeed(
        &self,
        retry_id: Uuid,
        user_id: Uuid,
        instant: DateTime<Utc>,
    ) -> Result<(), AppError>;
}

/// PostgreSQL-backed user store.
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_all(&self) -> Result<Vec<User>, AppError> {
        let users: Vec<User> = sqlx::query_as("SELECT * FROM users ORDER BY created_at")
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn update_last_notified(
        &self,
        id: Uuid,
        instant: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET last_notified = $1, updated_at = NOW() WHERE id = $2")
            .bind(instant)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// PostgreSQL-backed retry store.
pub struct PgRetryStore {
    pool: PgPool,
}

impl PgRetryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RetryStore for PgRetryStore {
    async fn find_due(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<RetryRecord>, AppError> {
        let records: Vec<RetryRecord> = sqlx::query_as(
            r#"
            SELECT * FROM delivery_retries
            WHERE next_retry <= $1
            ORDER BY next_retry ASC
            LIMIT $2
            "#,
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    async fn find_active_for_user(&self, user_id: Uuid) -> Result<Option<RetryRecord>, AppError> {
        let record: Option<RetryRecord> =
            sqlx::query_as("SELECT * FROM delivery_retries WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(record)
    }

    async fn create(
        &self,
        user_id: Uuid,
        attempt: i32,
        next_retry: DateTime<Utc>,
    ) -> Result<(), AppError> {
        // UNIQUE (user_id) keeps the record set at one per user even when
        // two failed deliveries race.
        sqlx::query(
            r#"
            INSERT INTO delivery_retries (id, user_id, attempt, next_retry)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(attempt)
        .bind(next_retry)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update(
        &self,
        id: Uuid,
        attempt: i32,
        next_retry: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE delivery_retries SET attempt = $1, next_retry = $2 WHERE id = $3")
            .bind(attempt)
            .bind(next_retry)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM delivery_retries WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn succeed(
        &self,
        retry_id: Uuid,
        user_id: Uuid,
        instant: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM delivery_retries WHERE id = $1")
            .bind(retry_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE users SET last_notified = $1, updated_at = NOW() WHERE id = $2")
            .bind(instant)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}
