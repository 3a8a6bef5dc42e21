//! BirthdayHerald API server binary entrypoint.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use herald_common::config::AppConfig;
use herald_common::db::create_pool;

use herald_api::routes::create_router;
use herald_api::state::AppState;
use herald_engine::delivery::DeliveryQueue;
use herald_engine::scheduler::BirthdayScheduler;
use herald_engine::store::{PgRetryStore, PgUserStore};
use herald_engine::sweeper::RetrySweeper;
use herald_notifier::EmailSender;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("herald_api=debug,herald_engine=debug,tower_http=debug")
        }))
        .init();

    tracing::info!("Starting BirthdayHerald API server...");

    // Load configuration
    let config = AppConfig::from_env()?;

    // Create database connection pool
    let pool = create_pool(&config.database_url, config.db_max_connections).await?;

    // Run migrations
    sqlx::migrate!("../../migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    // Wire the scheduling core: one sender, one delivery queue, shared by the
    // scan and the retry paths.
    let sender = Arc::new(EmailSender::new(
        config.email_api_url.clone(),
        config.email_timeout_ms,
    )?);
    let users = Arc::new(PgUserStore::new(pool.clone()));
    let retries = Arc::new(PgRetryStore::new(pool.clone()));
    let queue = Arc::new(DeliveryQueue::new(
        sender,
        users.clone(),
        retries.clone(),
    ));
    let sweeper = Arc::new(RetrySweeper::new(
        queue.clone(),
        users.clone(),
        retries,
        config.sweep_batch_size,
    ));
    let scheduler = Arc::new(BirthdayScheduler::new(
        users,
        queue,
        sweeper,
        Duration::from_secs(config.scan_interval_secs),
        Duration::from_secs(config.sweep_interval_secs),
    ));

    scheduler.start();

    // Build application state and router
    let state = AppState::new(pool, scheduler.clone(), config.clone());
    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("API server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.stop();
    tracing::info!("BirthdayHerald API server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Received shutdown signal, stopping gracefully...");
}
