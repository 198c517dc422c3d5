pub mod models;
pub mod users;
pub mod sessions;
pub mod posts;
pub mod likes;
pub mod follows;
pub mod feed;
pub mod api_keys;

pub use models::{ApiKey, FeedPost, Post, PostOwner, ProfileStats, Session, Toggle, User, UserSummary};
pub use users::{NewUser, ProfileFields, UserRepository};
pub use sessions::SessionRepository;
pub use posts::{PostRepository, RetweetToggle};
pub use likes::LikeRepository;
pub use follows::FollowRepository;
pub use feed::FeedRepository;
pub use api_keys::ApiKeyRepository;

use std::str::FromStr;
use std::time::Duration;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};

use crate::config::Config;
use crate::error::AppError;

/// Open the pool described by `config` and bring the schema up to date.
pub async fn connect(config: &Config) -> Result<Pool<Sqlite>, AppError> {
    let mut options = SqliteConnectOptions::from_str(&config.database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));
    if !config.database_url.contains(":memory:") {
        options = options.journal_mode(SqliteJournalMode::Wal);
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(config.db_max_connections)
        .min_connections(config.db_min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}
