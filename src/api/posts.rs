use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::db::Post;
use crate::error::AppError;
use crate::social::{Identity, PostDetail};

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub content: String,
    pub image: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub is_liked: bool,
    pub like_count: i64,
}

#[derive(Debug, Serialize)]
pub struct RetweetResponse {
    pub is_retweeted: bool,
    pub retweet_count: i64,
}

/// POST /api/posts (requires auth)
pub async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<CreatePostRequest>,
) -> Result<Json<Post>, AppError> {
    let post = state
        .social
        .create_post(identity.require()?, &req.content, req.image.as_deref())
        .await?;

    Ok(Json(post))
}

/// GET /api/posts/:id
pub async fn detail(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(post_id): Path<i64>,
) -> Result<Json<PostDetail>, AppError> {
    let detail = state.social.get_post(identity.user_id(), post_id).await?;
    Ok(Json(detail))
}

/// POST /api/posts/:id/like (requires auth)
pub async fn like(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(post_id): Path<i64>,
) -> Result<Json<LikeResponse>, AppError> {
    let toggle = state.social.toggle_like(identity.require()?, post_id).await?;

    Ok(Json(LikeResponse {
        is_liked: toggle.active,
        like_count: toggle.count,
    }))
}

/// POST /api/posts/:id/retweet (requires auth)
pub async fn retweet(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(post_id): Path<i64>,
) -> Result<Json<RetweetResponse>, AppError> {
    let toggle = state.social.toggle_retweet(identity.require()?, post_id).await?;

    Ok(Json(RetweetResponse {
        is_retweeted: toggle.active,
        retweet_count: toggle.count,
    }))
}
