use sqlx::{Pool, Sqlite};
use crate::db::models::{ProfileStats, User, UserSummary};
use crate::error::AppError;

pub struct UserRepository;

/// Editable account fields.
pub struct ProfileFields<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub bio: &'a str,
    pub profile_picture: Option<&'a str>,
}

/// Fresh account details.
pub struct NewUser<'a> {
    pub profile: ProfileFields<'a>,
    pub password_hash: &'a [u8; 32],
    pub password_salt: &'a [u8; 32],
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn username_conflict(err: sqlx::Error) -> AppError {
    if is_unique_violation(&err) {
        AppError::Conflict("Username already exists".to_string())
    } else {
        AppError::Database(err)
    }
}

impl UserRepository {
    /// Insert a user; a taken username surfaces as `Conflict`.
    pub async fn create(pool: &Pool<Sqlite>, new: NewUser<'_>) -> Result<User, AppError> {
        let created_at = chrono::Utc::now().timestamp_millis();

        sqlx::query_as::<_, User>(
            r#"
INSERT INTO users (username, email, bio, profile_picture, password_hash, password_salt, created_at)
VALUES (?, ?, ?, ?, ?, ?, ?)
RETURNING *
            "#,
        )
        .bind(new.profile.username)
        .bind(new.profile.email)
        .bind(new.profile.bio)
        .bind(new.profile.profile_picture)
        .bind(new.password_hash.as_slice())
        .bind(new.password_salt.as_slice())
        .bind(created_at)
        .fetch_one(pool)
        .await
        .map_err(username_conflict)
    }

    pub async fn update_profile(
        pool: &Pool<Sqlite>,
        id: i64,
        fields: ProfileFields<'_>,
    ) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>(
            r#"
UPDATE users SET username = ?, email = ?, bio = ?, profile_picture = ?
WHERE id = ?
RETURNING *
            "#,
        )
        .bind(fields.username)
        .bind(fields.email)
        .bind(fields.bio)
        .bind(fields.profile_picture)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(username_conflict)
    }

    pub async fn get_by_username(pool: &Pool<Sqlite>, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    pub async fn get_by_id(pool: &Pool<Sqlite>, id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    pub async fn exists(pool: &Pool<Sqlite>, id: i64) -> Result<bool, AppError> {
        let found: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?)")
            .bind(id)
            .fetch_one(pool)
            .await?;

        Ok(found)
    }

    /// Everyone except `viewer`, alphabetically, optionally filtered by a
    /// case-insensitive username substring. The term is matched literally.
    pub async fn list(
        pool: &Pool<Sqlite>,
        viewer: i64,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<UserSummary>, AppError> {
        let term = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let users = sqlx::query_as::<_, UserSummary>(
            r#"
SELECT u.id, u.username, u.bio, u.profile_picture,
       EXISTS(SELECT 1 FROM follows f WHERE f.follower_id = ?1 AND f.followee_id = u.id) AS is_following
FROM users u
WHERE u.id != ?1
  AND (?2 IS NULL OR instr(lower(u.username), ?2) > 0)
ORDER BY u.username ASC
LIMIT ?3 OFFSET ?4
            "#,
        )
        .bind(viewer)
        .bind(term)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    /// Counts derived on demand; `None` if the user does not exist.
    pub async fn stats(pool: &Pool<Sqlite>, id: i64) -> Result<Option<ProfileStats>, AppError> {
        let stats = sqlx::query_as::<_, ProfileStats>(
            r#"
SELECT (SELECT COUNT(*) FROM posts WHERE user_id = u.id) AS tweet_count,
       (SELECT COUNT(*) FROM follows WHERE followee_id = u.id) AS follower_count,
       (SELECT COUNT(*) FROM follows WHERE follower_id = u.id) AS following_count
FROM users u
WHERE u.id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(stats)
    }
}
