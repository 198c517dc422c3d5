pub mod auth;
pub mod feed;
pub mod posts;
pub mod users;
pub mod state;
pub mod middleware;

pub use state::AppState;
pub use middleware::RateLimiter;

use axum::{
    Router,
    routing::{delete, get, post},
    middleware as axum_middleware,
};
use tower_http::{
    cors::CorsLayer,
    trace::TraceLayer,
    timeout::TimeoutLayer,
};
use std::sync::Arc;
use std::time::Duration;
use serde::Serialize;

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

pub fn create_router(state: AppState, rate_limiter: Arc<RateLimiter>) -> Router {
    let timeout = Duration::from_secs(state.config.request_timeout_secs);

    Router::new()
        .route("/api/health", get(health))

        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me).put(auth::update_me))
        .route("/api/auth/api-keys", post(auth::create_api_key))
        .route("/api/auth/api-keys/:id", delete(auth::revoke_api_key))

        .route("/api/feed/home", get(feed::home))
        .route("/api/feed/explore", get(feed::explore))

        .route("/api/posts", post(posts::create))
        .route("/api/posts/:id", get(posts::detail))
        .route("/api/posts/:id/like", post(posts::like))
        .route("/api/posts/:id/retweet", post(posts::retweet))

        .route("/api/users", get(users::list))
        .route("/api/users/:username", get(users::profile))
        .route("/api/users/:username/stats", get(users::stats))
        .route("/api/users/:username/follow", post(users::follow))

        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::identity_middleware,
        ))
        .layer(axum_middleware::from_fn(move |req: axum::extract::Request, next: axum_middleware::Next| {
            let limiter = rate_limiter.clone();
            middleware::rate_limit_middleware(limiter, req, next)
        }))
        .layer(TimeoutLayer::new(timeout))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> axum::Json<HealthResponse> {
    axum::Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
