use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::api::state::AppState;
use crate::error::AppError;
use crate::social::Identity;

/// Pull the token out of `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

pub fn api_key(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("X-Api-Key")
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|k| !k.is_empty())
}

/// Resolves the caller for every request. A live session wins over an API
/// key; missing, malformed, expired or revoked credentials yield
/// `Identity::Anonymous`, and handlers decide whether that is enough.
pub async fn identity_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let mut identity = Identity::Anonymous;

    if let Some(token) = bearer_token(request.headers()) {
        if let Some(user_id) = state.social.resolve_token(token).await? {
            identity = Identity::User(user_id);
        }
    }
    if identity == Identity::Anonymous {
        if let Some(key) = api_key(request.headers()) {
            match state.social.resolve_api_key(key).await? {
                Some(key_id) => identity = Identity::ApiClient(key_id),
                None => tracing::debug!("Rejected unknown or revoked API key"),
            }
        }
    }

    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

/// Fixed-window request counter per client IP.
#[derive(Clone)]
pub struct RateLimiter {
    // IP -> (count, window_start)
    state: Arc<Mutex<HashMap<IpAddr, (u32, Instant)>>>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            state: Arc::new(Mutex::new(HashMap::new())),
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    pub async fn check(&self, ip: IpAddr) -> bool {
        let mut state = self.state.lock().await;
        let now = Instant::now();

        let entry = state.entry(ip).or_insert((0, now));

        if now.duration_since(entry.1) > self.window {
            *entry = (1, now);
            return true;
        }

        if entry.0 < self.max_requests {
            entry.0 += 1;
            true
        } else {
            false
        }
    }

    /// Forget clients idle for two windows.
    pub async fn cleanup(&self) -> usize {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        let before = state.len();
        state.retain(|_, (_, time)| now.duration_since(*time) <= self.window * 2);
        before - state.len()
    }
}

pub async fn rate_limit_middleware(
    limiter: Arc<RateLimiter>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));

    if !limiter.check(ip).await {
        tracing::warn!(%ip, "Rate limit exceeded");
        return Err(AppError::RateLimited);
    }

    Ok(next.run(request).await)
}
