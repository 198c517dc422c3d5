use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chirp::{
    api::{create_router, AppState, RateLimiter},
    config::Config,
    db::{self, SessionRepository},
    error::AppError,
    notify::{run_notification_worker, ChannelDispatcher, LogMailer, WorkerSettings},
    social::SocialService,
};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,chirp=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("🚀 Starting chirp v{}...", env!("CARGO_PKG_VERSION"));

    let config = Arc::new(Config::from_env()?);
    tracing::info!("✅ Configuration loaded");

    // Connect and run migrations
    let pool = db::connect(&config).await?;
    tracing::info!("✅ Database ready: {}", config.database_url);

    // Retweet notifications are delivered off the request path
    let (dispatcher, notifications) = ChannelDispatcher::new();
    tokio::spawn(run_notification_worker(
        pool.clone(),
        notifications,
        Arc::new(LogMailer),
        WorkerSettings {
            from: config.mail_from.clone(),
            max_attempts: config.notify_max_attempts,
            backoff: Duration::from_secs(2),
        },
    ));
    tracing::info!("✅ Notification worker started");

    let rate_limiter = Arc::new(RateLimiter::new(
        config.rate_limit_requests,
        config.rate_limit_window_secs,
    ));
    tracing::info!(
        "✅ Rate limiter configured ({} req/{}s per IP)",
        config.rate_limit_requests,
        config.rate_limit_window_secs
    );

    let state = AppState {
        social: SocialService::new(pool.clone(), Arc::new(dispatcher), &config),
        config: config.clone(),
    };

    // Spawn background task for session cleanup
    {
        let pool = pool.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(3600)); // Every hour
            loop {
                interval.tick().await;
                match SessionRepository::cleanup_expired(&pool).await {
                    Ok(purged) => tracing::debug!(purged, "🧹 Expired sessions cleaned up"),
                    Err(e) => tracing::error!("❌ Session cleanup failed: {}", e),
                }
            }
        });
        tracing::info!("✅ Session cleanup task started (runs hourly)");
    }

    // Spawn background task for rate limiter cleanup
    {
        let limiter = rate_limiter.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(300)); // Every 5 minutes
            loop {
                interval.tick().await;
                let evicted = limiter.cleanup().await;
                tracing::debug!(evicted, "🧹 Rate limiter cache cleaned up");
            }
        });
    }

    let app = create_router(state, rate_limiter);

    let addr = config.server_address();
    tracing::info!("🌐 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .map_err(|e| AppError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}
