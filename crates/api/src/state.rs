//! Shared application state for the Axum API server.

use std::sync::Arc;

use herald_common::config::AppConfig;
use herald_engine::scheduler::BirthdayScheduler;
use sqlx::PgPool;

/// Application state shared across all route handlers via Axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub scheduler: Arc<BirthdayScheduler>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(pool: PgPool, scheduler: Arc<BirthdayScheduler>, config: AppConfig) -> Self {
        Self {
            pool,
            scheduler,
            config,
        }
    }
}
