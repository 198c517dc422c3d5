//! Domain operations. Every call takes the acting user explicitly; nothing
//! here knows about HTTP or sessions.

pub mod validate;
mod accounts;
mod feed;
mod profile;
mod toggle;

use std::sync::Arc;
use serde::Serialize;
use sqlx::{Pool, Sqlite};

use crate::db::{FeedPost, Post, PostRepository, UserRepository};
use crate::error::AppError;
use crate::notify::NotificationDispatcher;

pub use accounts::{ApiKeyRequest, LoginOutcome, ProfileUpdate, Registration};
pub use profile::{Profile, UserPage};

/// Who is making a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    Anonymous,
    User(i64),
    /// Holder of an API key; may read feeds but never acts as a user.
    ApiClient(i64),
}

impl Identity {
    pub fn user_id(self) -> Option<i64> {
        match self {
            Identity::User(id) => Some(id),
            Identity::Anonymous | Identity::ApiClient(_) => None,
        }
    }

    pub fn require(self) -> Result<i64, AppError> {
        self.user_id().ok_or_else(AppError::auth_required)
    }

    /// Read access: a signed-in user or a valid API key.
    pub fn require_reader(self) -> Result<(), AppError> {
        match self {
            Identity::User(_) | Identity::ApiClient(_) => Ok(()),
            Identity::Anonymous => Err(AppError::auth_required()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedPage {
    pub page: i64,
    pub has_next: bool,
    pub posts: Vec<FeedPost>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    pub post: FeedPost,
    pub retweets: Vec<FeedPost>,
}

/// Clamp a 1-based page number and turn it into (page, limit, offset). The
/// limit asks for one extra row so callers can tell whether another page exists.
fn window(page: i64, page_size: i64) -> Result<(i64, i64, i64), AppError> {
    let page = page.max(1);
    let offset = (page - 1)
        .checked_mul(page_size)
        .ok_or_else(|| AppError::Validation("Page number is too large".to_string()))?;
    Ok((page, page_size + 1, offset))
}

fn split_page<T>(mut rows: Vec<T>, page_size: i64) -> (Vec<T>, bool) {
    let has_next = rows.len() as i64 > page_size;
    rows.truncate(page_size as usize);
    (rows, has_next)
}

#[derive(Clone)]
pub struct SocialService {
    pool: Pool<Sqlite>,
    notifier: Arc<dyn NotificationDispatcher>,
    feed_page_size: i64,
    users_page_size: i64,
    session_expiry_hours: i64,
}

impl SocialService {
    pub fn new(
        pool: Pool<Sqlite>,
        notifier: Arc<dyn NotificationDispatcher>,
        config: &crate::config::Config,
    ) -> Self {
        Self {
            pool,
            notifier,
            feed_page_size: config.feed_page_size,
            users_page_size: config.users_page_size,
            session_expiry_hours: config.session_expiry_hours,
        }
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// The acting user must still exist; a dangling identity is treated as
    /// unauthenticated.
    async fn ensure_actor(&self, actor_id: i64) -> Result<(), AppError> {
        if UserRepository::exists(&self.pool, actor_id).await? {
            Ok(())
        } else {
            Err(AppError::auth_required())
        }
    }

    pub async fn create_post(
        &self,
        author_id: i64,
        content: &str,
        image: Option<&str>,
    ) -> Result<Post, AppError> {
        let content = validate::content(content)?;
        let image = validate::image(image)?;
        self.ensure_actor(author_id).await?;

        let post = PostRepository::create(&self.pool, author_id, &content, image.as_deref()).await?;
        tracing::info!(user_id = author_id, post_id = post.id, "New post created");

        Ok(post)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;
    use crate::config::Config;
    use crate::db::testing;

    #[derive(Default)]
    pub struct RecordingDispatcher {
        pub sent: Mutex<Vec<(i64, String)>>,
    }

    impl NotificationDispatcher for RecordingDispatcher {
        fn retweeted(&self, post_id: i64, retweeter: &str) {
            self.sent.lock().unwrap().push((post_id, retweeter.to_string()));
        }
    }

    pub async fn service() -> (SocialService, Arc<RecordingDispatcher>) {
        let pool = testing::pool().await;
        let dispatcher = Arc::new(RecordingDispatcher::default());
        let service = SocialService::new(pool, dispatcher.clone(), &Config::default());
        (service, dispatcher)
    }

    /// Service over a file-backed, multi-connection database in `dir`.
    pub async fn file_service(dir: &std::path::Path) -> SocialService {
        let pool = testing::file_pool(dir).await;
        SocialService::new(pool, Arc::new(RecordingDispatcher::default()), &Config::default())
    }

    pub async fn user(service: &SocialService, username: &str) -> i64 {
        testing::user(service.pool(), username).await.id
    }
}
