use serde::Deserialize;

use crate::crypto::{generate_salt, hash_password, verify_password};
use crate::db::{ApiKey, ApiKeyRepository, NewUser, ProfileFields, SessionRepository, User, UserRepository};
use crate::error::AppError;
use super::{validate, SocialService};

#[derive(Debug, Deserialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub profile_picture: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProfileUpdate {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub profile_picture: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiKeyRequest {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    pub token: String,
    pub expires_at: i64,
}

impl SocialService {
    pub async fn register(&self, registration: &Registration) -> Result<User, AppError> {
        let username = validate::username(&registration.username)?;
        let email = validate::email(&registration.email)?;
        let bio = validate::bio(&registration.bio)?;
        let profile_picture = validate::image(registration.profile_picture.as_deref())?;
        validate::password(&registration.password)?;

        let salt = generate_salt();
        let password_hash = hash_password(&registration.password, &salt)?;

        let user = UserRepository::create(
            &self.pool,
            NewUser {
                profile: ProfileFields {
                    username: &username,
                    email: &email,
                    bio: &bio,
                    profile_picture: profile_picture.as_deref(),
                },
                password_hash: &password_hash,
                password_salt: &salt,
            },
        )
        .await?;

        tracing::info!(user_id = user.id, "New user registered: {}", user.username);
        Ok(user)
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, AppError> {
        let invalid = || AppError::Auth("Invalid credentials".to_string());

        let username = validate::username(username).map_err(|_| invalid())?;
        let user = UserRepository::get_by_username(&self.pool, &username)
            .await?
            .ok_or_else(invalid)?;

        if !verify_password(password, &user.password_hash, &user.password_salt)? {
            return Err(invalid());
        }

        let session = SessionRepository::create(&self.pool, user.id, self.session_expiry_hours).await?;
        tracing::info!(user_id = user.id, "User logged in");

        Ok(LoginOutcome {
            user,
            token: session.token,
            expires_at: session.expires_at,
        })
    }

    pub async fn logout(&self, token: &str) -> Result<(), AppError> {
        SessionRepository::delete(&self.pool, token).await
    }

    /// Maps a bearer token to its user, if the session is live.
    pub async fn resolve_token(&self, token: &str) -> Result<Option<i64>, AppError> {
        let session = SessionRepository::get_by_token(&self.pool, token).await?;
        Ok(session.map(|s| s.user_id))
    }

    pub async fn me(&self, user_id: i64) -> Result<User, AppError> {
        UserRepository::get_by_id(&self.pool, user_id)
            .await?
            .ok_or_else(AppError::auth_required)
    }

    pub async fn update_profile(&self, user_id: i64, update: &ProfileUpdate) -> Result<User, AppError> {
        let username = validate::username(&update.username)?;
        let email = validate::email(&update.email)?;
        let bio = validate::bio(&update.bio)?;
        let profile_picture = validate::image(update.profile_picture.as_deref())?;

        let fields = ProfileFields {
            username: &username,
            email: &email,
            bio: &bio,
            profile_picture: profile_picture.as_deref(),
        };
        let user = UserRepository::update_profile(&self.pool, user_id, fields)
            .await?
            .ok_or_else(AppError::auth_required)?;

        tracing::info!(user_id, "User {} updated their profile", user.username);
        Ok(user)
    }

    /// Issue a read-only API key owned by `user_id`.
    pub async fn create_api_key(&self, user_id: i64, request: &ApiKeyRequest) -> Result<ApiKey, AppError> {
        let name = request.name.trim();
        if name.is_empty() || name.chars().count() > 100 {
            return Err(AppError::Validation("Key name must be 1-100 characters".to_string()));
        }
        self.ensure_actor(user_id).await?;

        let key = ApiKeyRepository::create(&self.pool, name, user_id).await?;
        tracing::info!(user_id, key_id = key.id, "API key issued");
        Ok(key)
    }

    pub async fn revoke_api_key(&self, user_id: i64, key_id: i64) -> Result<(), AppError> {
        if !ApiKeyRepository::revoke(&self.pool, key_id, user_id).await? {
            return Err(AppError::NotFound(format!("API key {} not found", key_id)));
        }
        tracing::info!(user_id, key_id, "API key revoked");
        Ok(())
    }

    /// Maps an `X-Api-Key` value to its key id, if the key is still active.
    pub async fn resolve_api_key(&self, key: &str) -> Result<Option<i64>, AppError> {
        let api_key = ApiKeyRepository::get_active(&self.pool, key).await?;
        Ok(api_key.map(|k| k.id))
    }
}
