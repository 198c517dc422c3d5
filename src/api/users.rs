use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::api::feed::default_page;
use crate::api::state::AppState;
use crate::db::ProfileStats;
use crate::error::AppError;
use crate::social::{Identity, Profile, UserPage};

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub search: Option<String>,
    #[serde(default = "default_page")]
    pub page: i64,
}

#[derive(Debug, Serialize)]
pub struct FollowResponse {
    pub is_following: bool,
    pub follower_count: i64,
}

/// GET /api/users (requires auth)
pub async fn list(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<UserPage>, AppError> {
    let users = state
        .social
        .list_users(identity.require()?, query.search.as_deref(), query.page)
        .await?;

    Ok(Json(users))
}

/// GET /api/users/:username
pub async fn profile(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(username): Path<String>,
) -> Result<Json<Profile>, AppError> {
    let profile = state.social.get_profile(identity.user_id(), &username).await?;
    Ok(Json(profile))
}

/// GET /api/users/:username/stats
pub async fn stats(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<ProfileStats>, AppError> {
    let user = state.social.find_user(&username).await?;
    let stats = state.social.get_profile_stats(user.id).await?;
    Ok(Json(stats))
}

/// POST /api/users/:username/follow (requires auth)
pub async fn follow(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(username): Path<String>,
) -> Result<Json<FollowResponse>, AppError> {
    let actor = identity.require()?;
    let target = state.social.find_user(&username).await?;
    let toggle = state.social.toggle_follow(actor, target.id).await?;

    Ok(Json(FollowResponse {
        is_following: toggle.active,
        follower_count: toggle.count,
    }))
}
