use sqlx::{Pool, Sqlite};
use crate::db::models::Toggle;
use crate::error::AppError;

pub struct LikeRepository;

impl LikeRepository {
    /// Flip `user_id`'s like on `post_id` in one transaction.
    ///
    /// The guarded insert is the existence check: zero affected rows means the
    /// like is already there (or the post is gone), so it gets deleted.
    pub async fn toggle(
        pool: &Pool<Sqlite>,
        user_id: i64,
        post_id: i64,
    ) -> Result<Toggle, AppError> {
        let now = chrono::Utc::now().timestamp_millis();
        let mut tx = pool.begin().await?;

        let inserted = sqlx::query(
            r#"
INSERT INTO likes (user_id, post_id, created_at)
SELECT ?1, p.id, ?2 FROM posts p WHERE p.id = ?3
ON CONFLICT (user_id, post_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(now)
        .bind(post_id)
        .execute(&mut *tx)
        .await?
        .rows_affected()
            == 1;

        if !inserted {
            let deleted = sqlx::query("DELETE FROM likes WHERE user_id = ? AND post_id = ?")
                .bind(user_id)
                .bind(post_id)
                .execute(&mut *tx)
                .await?
                .rows_affected();

            if deleted == 0 {
                let exists: bool =
                    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM posts WHERE id = ?)")
                        .bind(post_id)
                        .fetch_one(&mut *tx)
                        .await?;
                if !exists {
                    return Err(AppError::NotFound(format!("Post {} not found", post_id)));
                }
            }
        }

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM likes WHERE post_id = ?")
            .bind(post_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Toggle { active: inserted, count })
    }

    #[cfg(test)]
    pub async fn is_liked(pool: &Pool<Sqlite>, user_id: i64, post_id: i64) -> Result<bool, AppError> {
        let liked: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM likes WHERE user_id = ? AND post_id = ?)")
            .bind(user_id)
            .bind(post_id)
            .fetch_one(pool)
            .await?;

        Ok(liked)
    }
}
