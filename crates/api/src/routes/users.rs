//! User CRUD routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, post, put};
use axum::{Json, Router};
use uuid::Uuid;

use herald_common::error::AppError;
use herald_common::types::User;
use herald_engine::user::{CreateUserParams, UpdateUserParams, UserService};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/users", post(create_user))
        .route("/api/users/{id}", put(update_user))
        .route("/api/users/{id}", delete(delete_user))
}

/// POST /api/users — Create a new user.
async fn create_user(
    State(state): State<AppState>,
    Json(params): Json<CreateUserParams>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let user = UserService::create(&state.pool, &params).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// PUT /api/users/:id — Update a user.
async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(params): Json<UpdateUserParams>,
) -> Result<Json<User>, AppError> {
    let user = UserService::update(&state.pool, id, &params).await?;
    Ok(Json(user))
}

/// DELETE /api/users/:id — Delete a user.
async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let deleted = UserService::delete(&state.pool, id).await?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("User {} not found", id)))
    }
}
