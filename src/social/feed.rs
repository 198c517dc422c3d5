use crate::db::{FeedRepository, UserRepository};
use crate::error::AppError;
use super::{split_page, window, FeedPage, PostDetail, SocialService};

impl SocialService {
    /// Posts by the requester and everyone they follow, newest first.
    pub async fn get_home_feed(&self, requester_id: i64, page: i64) -> Result<FeedPage, AppError> {
        self.ensure_actor(requester_id).await?;

        let (page, limit, offset) = window(page, self.feed_page_size)?;
        let rows = FeedRepository::home(&self.pool, requester_id, limit, offset).await?;
        let (posts, has_next) = split_page(rows, self.feed_page_size);

        Ok(FeedPage { page, has_next, posts })
    }

    /// Every post, newest first. Annotations are relative to `viewer` if any.
    pub async fn get_explore_feed(&self, viewer: Option<i64>, page: i64) -> Result<FeedPage, AppError> {
        let (page, limit, offset) = window(page, self.feed_page_size)?;
        let rows = FeedRepository::explore(&self.pool, viewer, limit, offset).await?;
        let (posts, has_next) = split_page(rows, self.feed_page_size);

        Ok(FeedPage { page, has_next, posts })
    }

    pub async fn get_user_posts(
        &self,
        viewer: Option<i64>,
        author_id: i64,
        page: i64,
    ) -> Result<FeedPage, AppError> {
        if !UserRepository::exists(&self.pool, author_id).await? {
            return Err(AppError::NotFound(format!("User {} not found", author_id)));
        }

        let (page, limit, offset) = window(page, self.feed_page_size)?;
        let rows = FeedRepository::by_author(&self.pool, viewer, author_id, limit, offset).await?;
        let (posts, has_next) = split_page(rows, self.feed_page_size);

        Ok(FeedPage { page, has_next, posts })
    }

    pub async fn get_post(&self, viewer: Option<i64>, post_id: i64) -> Result<PostDetail, AppError> {
        let post = FeedRepository::single(&self.pool, viewer, post_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Post {} not found", post_id)))?;
        let retweets = FeedRepository::retweets_of(&self.pool, viewer, post_id).await?;

        Ok(PostDetail { post, retweets })
    }
}
