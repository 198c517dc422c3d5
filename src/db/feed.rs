use sqlx::{Pool, Sqlite};
use crate::db::models::FeedPost;
use crate::error::AppError;

pub struct FeedRepository;

// ?1 is the viewer (nullable); annotations are false for anonymous viewers.
const ANNOTATED_POSTS: &str = r#"
SELECT p.id, p.user_id, u.username, p.content, p.image, p.parent_id,
       p.parent_id IS NOT NULL AS is_retweet, p.created_at,
       (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS like_count,
       (SELECT COUNT(*) FROM posts r WHERE r.parent_id = p.id) AS retweet_count,
       EXISTS(SELECT 1 FROM likes l WHERE l.post_id = p.id AND l.user_id = ?1) AS is_liked,
       EXISTS(SELECT 1 FROM posts r WHERE r.parent_id = p.id AND r.user_id = ?1) AS is_retweeted
FROM posts p
JOIN users u ON u.id = p.user_id
"#;

const NEWEST_FIRST: &str = "ORDER BY p.created_at DESC, p.id DESC";

impl FeedRepository {
    /// Posts by `viewer` and everyone `viewer` follows.
    pub async fn home(
        pool: &Pool<Sqlite>,
        viewer: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<FeedPost>, AppError> {
        let sql = format!(
            "{ANNOTATED_POSTS}
WHERE p.user_id = ?1
   OR p.user_id IN (SELECT f.followee_id FROM follows f WHERE f.follower_id = ?1)
{NEWEST_FIRST}
LIMIT ?2 OFFSET ?3"
        );

        let posts = sqlx::query_as::<_, FeedPost>(&sql)
            .bind(viewer)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?;

        Ok(posts)
    }

    /// Every post, regardless of the follow graph.
    pub async fn explore(
        pool: &Pool<Sqlite>,
        viewer: Option<i64>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<FeedPost>, AppError> {
        let sql = format!("{ANNOTATED_POSTS}\n{NEWEST_FIRST}\nLIMIT ?2 OFFSET ?3");

        let posts = sqlx::query_as::<_, FeedPost>(&sql)
            .bind(viewer)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?;

        Ok(posts)
    }

    pub async fn by_author(
        pool: &Pool<Sqlite>,
        viewer: Option<i64>,
        author: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<FeedPost>, AppError> {
        let sql = format!("{ANNOTATED_POSTS}\nWHERE p.user_id = ?2\n{NEWEST_FIRST}\nLIMIT ?3 OFFSET ?4");

        let posts = sqlx::query_as::<_, FeedPost>(&sql)
            .bind(viewer)
            .bind(author)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?;

        Ok(posts)
    }

    pub async fn single(
        pool: &Pool<Sqlite>,
        viewer: Option<i64>,
        post_id: i64,
    ) -> Result<Option<FeedPost>, AppError> {
        let sql = format!("{ANNOTATED_POSTS}\nWHERE p.id = ?2");

        let post = sqlx::query_as::<_, FeedPost>(&sql)
            .bind(viewer)
            .bind(post_id)
            .fetch_optional(pool)
            .await?;

        Ok(post)
    }

    /// Retweets of `post_id`, newest first.
    pub async fn retweets_of(
        pool: &Pool<Sqlite>,
        viewer: Option<i64>,
        post_id: i64,
    ) -> Result<Vec<FeedPost>, AppError> {
        let sql = format!("{ANNOTATED_POSTS}\nWHERE p.parent_id = ?2\n{NEWEST_FIRST}");

        let posts = sqlx::query_as::<_, FeedPost>(&sql)
            .bind(viewer)
            .bind(post_id)
            .fetch_all(pool)
            .await?;

        Ok(posts)
    }
}
