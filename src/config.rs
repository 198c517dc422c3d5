use std::str::FromStr;

use crate::error::AppError;

#[derive(Clone, Debug)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database_url: String,
    pub session_expiry_hours: i64,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub request_timeout_secs: u64,
    pub feed_page_size: i64,
    pub users_page_size: i64,
    pub rate_limit_requests: u32,
    pub rate_limit_window_secs: u64,
    pub notify_max_attempts: u32,
    pub mail_from: String,
}

/// Read `key` from the environment, falling back to `default`.
fn env_or<T>(key: &str, default: &str) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    std::env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid {}: {}", key, e)))
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let config = Config {
            server_host: env_or("SERVER_HOST", "127.0.0.1")?,
            server_port: env_or("SERVER_PORT", "8080")?,
            database_url: env_or("DATABASE_URL", "sqlite://chirp.db")?,
            session_expiry_hours: env_or("SESSION_EXPIRY_HOURS", "24")?,
            db_max_connections: env_or("DB_MAX_CONNECTIONS", "20")?,
            db_min_connections: env_or("DB_MIN_CONNECTIONS", "5")?,
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", "30")?,
            feed_page_size: env_or("FEED_PAGE_SIZE", "6")?,
            users_page_size: env_or("USERS_PAGE_SIZE", "10")?,
            rate_limit_requests: env_or("RATE_LIMIT_REQUESTS", "100")?,
            rate_limit_window_secs: env_or("RATE_LIMIT_WINDOW_SECS", "60")?,
            notify_max_attempts: env_or("NOTIFY_MAX_ATTEMPTS", "3")?,
            mail_from: env_or("MAIL_FROM", "noreply@chirp.local")?,
        };

        if config.feed_page_size < 1 || config.users_page_size < 1 {
            return Err(AppError::Config("Page sizes must be at least 1".to_string()));
        }

        Ok(config)
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server_host: "127.0.0.1".to_string(),
            server_port: 8080,
            database_url: "sqlite::memory:".to_string(),
            session_expiry_hours: 24,
            db_max_connections: 1,
            db_min_connections: 1,
            request_timeout_secs: 30,
            feed_page_size: 6,
            users_page_size: 10,
            rate_limit_requests: 100,
            rate_limit_window_secs: 60,
            notify_max_attempts: 3,
            mail_from: "noreply@chirp.local".to_string(),
        }
    }
}
