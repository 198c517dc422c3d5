use sqlx::{Pool, Sqlite};
use crate::db::models::{Post, PostOwner, Toggle};
use crate::error::AppError;

pub struct PostRepository;

/// Outcome of a retweet toggle. `original` is the post that was (un)retweeted
/// after flattening retweet chains.
#[derive(Debug, Clone)]
pub struct RetweetToggle {
    pub toggle: Toggle,
    pub original: Post,
}

impl PostRepository {
    pub async fn create(
        pool: &Pool<Sqlite>,
        user_id: i64,
        content: &str,
        image: Option<&str>,
    ) -> Result<Post, AppError> {
        let created_at = chrono::Utc::now().timestamp_millis();

        let post = sqlx::query_as::<_, Post>(
            r#"
INSERT INTO posts (user_id, content, image, parent_id, created_at)
VALUES (?, ?, ?, NULL, ?)
RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(content)
        .bind(image)
        .bind(created_at)
        .fetch_one(pool)
        .await?;

        Ok(post)
    }

    /// Retweet rows of `parent_id` owned by `user_id`, newest first.
    #[cfg(test)]
    pub async fn retweets_by(
        pool: &Pool<Sqlite>,
        user_id: i64,
        parent_id: i64,
    ) -> Result<Vec<Post>, AppError> {
        let posts = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE user_id = ? AND parent_id = ? ORDER BY created_at DESC, id DESC")
            .bind(user_id)
            .bind(parent_id)
            .fetch_all(pool)
            .await?;

        Ok(posts)
    }

    pub async fn get_owner(pool: &Pool<Sqlite>, post_id: i64) -> Result<Option<PostOwner>, AppError> {
        let owner = sqlx::query_as::<_, PostOwner>(
            r#"
SELECT p.id AS post_id, p.content, u.id AS user_id, u.username, u.email
FROM posts p
JOIN users u ON u.id = p.user_id
WHERE p.id = ?
            "#,
        )
        .bind(post_id)
        .fetch_optional(pool)
        .await?;

        Ok(owner)
    }

    /// Flip `user_id`'s retweet of `post_id` in one transaction.
    ///
    /// Retweeting a retweet targets its original. The insert runs first so the
    /// transaction holds the write lock before anything is read; a conflict on
    /// the `(user_id, parent_id)` index means the retweet already exists and
    /// this call removes it instead.
    pub async fn toggle_retweet(
        pool: &Pool<Sqlite>,
        user_id: i64,
        post_id: i64,
    ) -> Result<RetweetToggle, AppError> {
        let now = chrono::Utc::now().timestamp_millis();
        let mut tx = pool.begin().await?;

        let inserted = sqlx::query(
            r#"
INSERT INTO posts (user_id, content, image, parent_id, created_at)
SELECT ?1, o.content, o.image, o.id, ?2
FROM posts o
WHERE o.id = (SELECT COALESCE(t.parent_id, t.id) FROM posts t WHERE t.id = ?3)
ON CONFLICT (user_id, parent_id) WHERE parent_id IS NOT NULL DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(now)
        .bind(post_id)
        .execute(&mut *tx)
        .await?
        .rows_affected()
            == 1;

        let original = sqlx::query_as::<_, Post>(
            r#"
SELECT o.* FROM posts o
WHERE o.id = (SELECT COALESCE(t.parent_id, t.id) FROM posts t WHERE t.id = ?)
            "#,
        )
        .bind(post_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post {} not found", post_id)))?;

        if !inserted {
            // Delete-if-exists
            sqlx::query("DELETE FROM posts WHERE user_id = ? AND parent_id = ?")
                .bind(user_id)
                .bind(original.id)
                .execute(&mut *tx)
                .await?;
        }

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE parent_id = ?")
            .bind(original.id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(RetweetToggle {
            toggle: Toggle { active: inserted, count },
            original,
        })
    }
}
