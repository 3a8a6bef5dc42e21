use serde::Deserialize;

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// PostgreSQL connection string
    pub database_url: String,

    /// Port the API server listens on (default: 3000)
    pub port: u16,

    /// Birthday scan interval in seconds (default: 60)
    pub scan_interval_secs: u64,

    /// Retry sweep interval in seconds (default: 300)
    pub sweep_interval_secs: u64,

    /// Maximum number of due retries fetched per sweep (default: 100)
    pub sweep_batch_size: i64,

    /// Base URL of the outbound email HTTP service
    pub email_api_url: String,

    /// Timeout for a single email send request in milliseconds (default: 5000)
    pub email_timeout_ms: u64,

    /// Maximum number of PostgreSQL connections in the pool (default: 20)
    pub db_max_connections: u32,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid u16"))?,
            scan_interval_secs: std::env::var("SCAN_INTERVAL_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("SCAN_INTERVAL_SECS must be a valid u64"))?,
            sweep_interval_secs: std::env::var("SWEEP_INTERVAL_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("SWEEP_INTERVAL_SECS must be a valid u64"))?,
            sweep_batch_size: std::env::var("SWEEP_BATCH_SIZE")
                .unwrap_or_else(|_| "100".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("SWEEP_BATCH_SIZE must be a valid i64"))?,
            email_api_url: std::env::var("EMAIL_API_URL")
                .unwrap_or_else(|_| "https://email-service.digitalenvision.com.au".to_string()),
            email_timeout_ms: std::env::var("EMAIL_TIMEOUT_MS")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("EMAIL_TIMEOUT_MS must be a valid u64"))?,
            db_max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("DB_MAX_CONNECTIONS must be a valid u32"))?,
        })
    }
}
