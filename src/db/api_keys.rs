use sqlx::{Pool, Sqlite};
use uuid::Uuid;
use crate::db::models::ApiKey;
use crate::error::AppError;

pub struct ApiKeyRepository;

impl ApiKeyRepository {
    pub async fn create(pool: &Pool<Sqlite>, name: &str, created_by: i64) -> Result<ApiKey, AppError> {
        let key = Uuid::new_v4().simple().to_string();
        let created_at = chrono::Utc::now().timestamp_millis();

        let api_key = sqlx::query_as::<_, ApiKey>(
            r#"
INSERT INTO api_keys (name, key, created_by, revoked, created_at)
VALUES (?, ?, ?, 0, ?)
RETURNING *
            "#,
        )
        .bind(name)
        .bind(&key)
        .bind(created_by)
        .bind(created_at)
        .fetch_one(pool)
        .await?;

        Ok(api_key)
    }

    /// Unrevoked key matching `key`.
    pub async fn get_active(pool: &Pool<Sqlite>, key: &str) -> Result<Option<ApiKey>, AppError> {
        let api_key = sqlx::query_as::<_, ApiKey>("SELECT * FROM api_keys WHERE key = ? AND revoked = 0")
            .bind(key)
            .fetch_optional(pool)
            .await?;

        Ok(api_key)
    }

    /// Revoke a key created by `created_by`. Returns false if there is no such key.
    pub async fn revoke(pool: &Pool<Sqlite>, id: i64, created_by: i64) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE api_keys SET revoked = 1 WHERE id = ? AND created_by = ?")
            .bind(id)
            .bind(created_by)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}
