use sqlx::{Pool, Sqlite};
use crate::db::models::Toggle;
use crate::error::AppError;

pub struct FollowRepository;

impl FollowRepository {
    /// Flip the `follower_id -> followee_id` edge in one transaction.
    /// `count` is the followee's follower count afterwards.
    pub async fn toggle(
        pool: &Pool<Sqlite>,
        follower_id: i64,
        followee_id: i64,
    ) -> Result<Toggle, AppError> {
        let now = chrono::Utc::now().timestamp_millis();
        let mut tx = pool.begin().await?;

        let inserted = sqlx::query(
            r#"
INSERT INTO follows (follower_id, followee_id, created_at)
SELECT ?1, u.id, ?2 FROM users u WHERE u.id = ?3
ON CONFLICT (follower_id, followee_id) DO NOTHING
            "#,
        )
        .bind(follower_id)
        .bind(now)
        .bind(followee_id)
        .execute(&mut *tx)
        .await?
        .rows_affected()
            == 1;

        if !inserted {
            let deleted = sqlx::query("DELETE FROM follows WHERE follower_id = ? AND followee_id = ?")
                .bind(follower_id)
                .bind(followee_id)
                .execute(&mut *tx)
                .await?
                .rows_affected();

            if deleted == 0 {
                let exists: bool =
                    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?)")
                        .bind(followee_id)
                        .fetch_one(&mut *tx)
                        .await?;
                if !exists {
                    return Err(AppError::NotFound(format!("User {} not found", followee_id)));
                }
            }
        }

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE followee_id = ?")
            .bind(followee_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Toggle { active: inserted, count })
    }

    pub async fn is_following(
        pool: &Pool<Sqlite>,
        follower_id: i64,
        followee_id: i64,
    ) -> Result<bool, AppError> {
        let following: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = ? AND followee_id = ?)")
            .bind(follower_id)
            .bind(followee_id)
            .fetch_one(pool)
            .await?;

        Ok(following)
    }
}
