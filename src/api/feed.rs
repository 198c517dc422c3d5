use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::api::state::AppState;
use crate::error::AppError;
use crate::social::{FeedPage, Identity};

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: i64,
}

pub(crate) fn default_page() -> i64 {
    1
}

/// GET /api/feed/home (requires auth)
pub async fn home(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<PageQuery>,
) -> Result<Json<FeedPage>, AppError> {
    let feed = state.social.get_home_feed(identity.require()?, query.page).await?;
    Ok(Json(feed))
}

/// GET /api/feed/explore (session or API key)
pub async fn explore(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<PageQuery>,
) -> Result<Json<FeedPage>, AppError> {
    identity.require_reader()?;
    let feed = state.social.get_explore_feed(identity.user_id(), query.page).await?;
    Ok(Json(feed))
}
