use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Longest post body, counted in chars.
pub const MAX_POST_LEN: usize = 280;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub bio: String,
    pub profile_picture: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: Vec<u8>,
    #[serde(skip_serializing)]
    pub password_salt: Vec<u8>,
    pub created_at: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: String,
    pub user_id: i64,
    pub token: String,
    pub expires_at: i64,
    pub created_at: i64,
}

/// A stored post. `parent_id` is set on retweets and always names an original.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub user_id: i64,
    pub content: String,
    pub image: Option<String>,
    pub parent_id: Option<i64>,
    pub created_at: i64,
}

/// A post as shown to a particular viewer.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct FeedPost {
    pub id: i64,
    pub user_id: i64,
    pub username: String, // Joined from users table
    pub content: String,
    pub image: Option<String>,
    pub parent_id: Option<i64>,
    pub is_retweet: bool,
    pub created_at: i64,
    pub like_count: i64,
    pub retweet_count: i64,
    pub is_liked: bool,
    pub is_retweeted: bool,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub bio: String,
    pub profile_picture: Option<String>,
    pub is_following: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct ProfileStats {
    pub tweet_count: i64,
    pub follower_count: i64,
    pub following_count: i64,
}

/// Read-only credential for feed clients.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ApiKey {
    pub id: i64,
    pub name: String,
    pub key: String,
    pub created_by: i64,
    pub revoked: bool,
    pub created_at: i64,
}

/// Result of a toggle: whether the relation now exists, and the target's
/// refreshed counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Toggle {
    pub active: bool,
    pub count: i64,
}

/// Original post plus the owner details a notification needs.
#[derive(Debug, Clone, FromRow)]
pub struct PostOwner {
    pub post_id: i64,
    pub content: String,
    pub user_id: i64,
    pub username: String,
    pub email: String,
}
