use serde::Serialize;

use crate::db::{FollowRepository, ProfileStats, User, UserRepository, UserSummary};
use crate::error::AppError;
use super::{split_page, window, FeedPage, SocialService};

#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub user: User,
    pub stats: ProfileStats,
    pub is_following: bool,
    pub posts: FeedPage,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserPage {
    pub page: i64,
    pub has_next: bool,
    pub users: Vec<UserSummary>,
}

impl SocialService {
    /// Tweet, follower and following counts, computed on demand.
    pub async fn get_profile_stats(&self, user_id: i64) -> Result<ProfileStats, AppError> {
        UserRepository::stats(&self.pool, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
    }

    pub async fn find_user(&self, username: &str) -> Result<User, AppError> {
        UserRepository::get_by_username(&self.pool, &username.to_lowercase())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", username)))
    }

    pub async fn get_profile(&self, viewer: Option<i64>, username: &str) -> Result<Profile, AppError> {
        let user = self.find_user(username).await?;
        let stats = self.get_profile_stats(user.id).await?;
        let is_following = match viewer {
            Some(viewer) => FollowRepository::is_following(&self.pool, viewer, user.id).await?,
            None => false,
        };
        let posts = self.get_user_posts(viewer, user.id, 1).await?;

        Ok(Profile { user, stats, is_following, posts })
    }

    /// Directory of other users, alphabetical.
    pub async fn list_users(
        &self,
        viewer: i64,
        search: Option<&str>,
        page: i64,
    ) -> Result<UserPage, AppError> {
        self.ensure_actor(viewer).await?;

        let (page, limit, offset) = window(page, self.users_page_size)?;
        let rows = UserRepository::list(&self.pool, viewer, search, limit, offset).await?;
        let (users, has_next) = split_page(rows, self.users_page_size);

        Ok(UserPage { page, has_next, users })
    }
}

#[cfg(test)]
mod tests {
    use crate::error::AppError;
    use crate::social::testing;

    #[tokio::test]
    async fn test_profile_stats() {
        let (service, _) = testing::service().await;
        let alice = testing::user(&service, "alice").await;
        let bob = testing::user(&service, "bob").await;
        let carol = testing::user(&service, "carol").await;

        let post = service.create_post(alice, "one", None).await.unwrap();
        service.create_post(alice, "two", None).await.unwrap();
        service.toggle_follow(bob, alice).await.unwrap();
        service.toggle_follow(carol, alice).await.unwrap();
        service.toggle_follow(alice, bob).await.unwrap();
        service.toggle_retweet(bob, post.id).await.unwrap();

        let stats = service.get_profile_stats(alice).await.unwrap();
        assert_eq!(stats.tweet_count, 2);
        assert_eq!(stats.follower_count, 2);
        assert_eq!(stats.following_count, 1);

        // Retweets count as the retweeter's tweets
        assert_eq!(service.get_profile_stats(bob).await.unwrap().tweet_count, 1);

        let err = service.get_profile_stats(999).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_profile_view() {
        let (service, _) = testing::service().await;
        let alice = testing::user(&service, "alice").await;
        let bob = testing::user(&service, "bob").await;
        service.create_post(alice, "hello", None).await.unwrap();
        service.toggle_follow(bob, alice).await.unwrap();

        let profile = service.get_profile(Some(bob), "Alice").await.unwrap();
        assert_eq!(profile.user.id, alice);
        assert!(profile.is_following);
        assert_eq!(profile.stats.follower_count, 1);
        assert_eq!(profile.posts.posts.len(), 1);

        let anonymous = service.get_profile(None, "alice").await.unwrap();
        assert!(!anonymous.is_following);

        assert!(matches!(
            service.get_profile(None, "nobody").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_users() {
        let (service, _) = testing::service().await;
        let alice = testing::user(&service, "alice").await;
        let bob = testing::user(&service, "bob").await;
        testing::user(&service, "bobby").await;
        testing::user(&service, "carol").await;
        service.toggle_follow(alice, bob).await.unwrap();

        let page = service.list_users(alice, None, 1).await.unwrap();
        let names: Vec<_> = page.users.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["bob", "bobby", "carol"]);
        assert!(page.users[0].is_following);
        assert!(!page.users[1].is_following);
        assert!(!page.has_next);

        let found = service.list_users(alice, Some("BOB"), 1).await.unwrap();
        assert_eq!(found.users.len(), 2);

        let none = service.list_users(alice, Some("ali"), 1).await.unwrap();
        assert!(none.users.is_empty());
    }

    #[tokio::test]
    async fn test_search_treats_wildcards_literally() {
        let (service, _) = testing::service().await;
        let alice = testing::user(&service, "alice").await;
        testing::user(&service, "a_b").await;
        testing::user(&service, "axb").await;
        testing::user(&service, "x100").await;

        let found = service.list_users(alice, Some("a_b"), 1).await.unwrap();
        let names: Vec<_> = found.users.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["a_b"]);

        assert!(service.list_users(alice, Some("%"), 1).await.unwrap().users.is_empty());
        assert!(service.list_users(alice, Some("1%"), 1).await.unwrap().users.is_empty());
    }
}
