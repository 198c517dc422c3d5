use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::bearer_token;
use crate::api::state::AppState;
use crate::db::{ApiKey, User};
use crate::error::AppError;
use crate::social::{ApiKeyRequest, Identity, ProfileUpdate, Registration};

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: i64,
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: i64,
    pub username: String,
    pub session_token: String,
    pub expires_at: i64,
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<Registration>,
) -> Result<Json<RegisterResponse>, AppError> {
    let user = state.social.register(&req).await?;

    Ok(Json(RegisterResponse {
        user_id: user.id,
        username: user.username,
    }))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let outcome = state.social.login(&req.username, &req.password).await?;

    Ok(Json(LoginResponse {
        user_id: outcome.user.id,
        username: outcome.user.username,
        session_token: outcome.token,
        expires_at: outcome.expires_at,
    }))
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    let token = bearer_token(&headers).ok_or_else(AppError::auth_required)?;

    state.social.logout(token).await?;

    Ok(Json(serde_json::json!({"success": true})))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<User>, AppError> {
    let user = state.social.me(identity.require()?).await?;
    Ok(Json(user))
}

/// PUT /api/auth/me
pub async fn update_me(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<ProfileUpdate>,
) -> Result<Json<User>, AppError> {
    let user = state.social.update_profile(identity.require()?, &req).await?;
    Ok(Json(user))
}

/// POST /api/auth/api-keys
pub async fn create_api_key(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<ApiKeyRequest>,
) -> Result<Json<ApiKey>, AppError> {
    let key = state.social.create_api_key(identity.require()?, &req).await?;
    Ok(Json(key))
}

/// DELETE /api/auth/api-keys/:id
pub async fn revoke_api_key(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(key_id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.social.revoke_api_key(identity.require()?, key_id).await?;
    Ok(Json(serde_json::json!({"success": true})))
}
