//! User service — CRUD operations for user records.
//!
//! The scheduling core only ever reads users and stamps `last_notified`;
//! everything else about the user lifecycle lives here, behind the API.

use chrono::NaiveDate;
use chrono_tz::Tz;
use sqlx::PgPool;
use uuid::Uuid;

use herald_common::error::AppError;
use herald_common::types::User;

/// Service layer for user CRUD operations.
pub struct UserService;

/// Parameters for creating a new user.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct CreateUserParams {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub birthday: NaiveDate,
    pub timezone: String,
}

/// Parameters for updating an existing user. Omitted fields are unchanged.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct UpdateUserParams {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub timezone: Option<String>,
}

impl UserService {
    fn validate_timezone(timezone: &str) -> Result<(), AppError> {
        timezone
            .parse::<Tz>()
            .map(|_| ())
            .map_err(|_| AppError::Timezone(timezone.to_string()))
    }

    /// Create a new user. The timezone must resolve to a known IANA zone.
    pub async fn create(pool: &PgPool, params: &CreateUserParams) -> Result<User, AppError> {
        Self::validate_timezone(&params.timezone)?;

        let user: User = sqlx::query_as(
            r#"
            INSERT INTO users (id, first_name, last_name, email, birthday, timezone)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&params.first_name)
        .bind(&params.last_name)
        .bind(&params.email)
        .bind(params.birthday)
        .bind(&params.timezone)
        .fetch_one(pool)
        .await?;

        tracing::info!(user_id = %user.id, timezone = %user.timezone, "User created");
        Ok(user)
    }

    /// Get a single user by ID.
    pub async fn get(pool: &PgPool, id: Uuid) -> Result<User, AppError> {
        let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        user.ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }

    /// Update a user. Provided fields replace existing ones; a provided
    /// timezone is validated like at creation.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        params: &UpdateUserParams,
    ) -> Result<User, AppError> {
        if let Some(tz) = &params.timezone {
            Self::validate_timezone(tz)?;
        }

        let existing = Self::get(pool, id).await?;
        let first_name = params.first_name.clone().unwrap_or(existing.first_name);
        let last_name = params.last_name.clone().unwrap_or(existing.last_name);
        let email = params.email.clone().unwrap_or(existing.email);
        let birthday = params.birthday.unwrap_or(existing.birthday);
        let timezone = params.timezone.clone().unwrap_or(existing.timezone);

        let user: User = sqlx::query_as(
            r#"
            UPDATE users
            SET first_name = $1, last_name = $2, email = $3, birthday = $4,
                timezone = $5, updated_at = NOW()
            WHERE id = $6
            RETURNING *
            "#,
        )
        .bind(&first_name)
        .bind(&last_name)
        .bind(&email)
        .bind(birthday)
        .bind(&timezone)
        .bind(id)
        .fetch_one(pool)
        .await?;

        tracing::info!(user_id = %user.id, "User updated");
        Ok(user)
    }

    /// Delete a user. Returns true if a row was removed. Any outstanding
    /// retry for the user becomes an orphan and is cleaned up by the sweeper.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            tracing::info!(user_id = %id, "User deleted");
        }
        Ok(deleted)
    }
}
