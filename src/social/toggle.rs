use crate::db::{FollowRepository, LikeRepository, PostRepository, Toggle, UserRepository};
use crate::error::AppError;
use super::SocialService;

// Toggles flip state on every call. Each one runs as a single transaction whose
// insert is guarded by a unique index, so concurrent duplicates serialize
// instead of producing extra rows.
impl SocialService {
    /// Returns whether `actor_id` now likes the post and its like count.
    pub async fn toggle_like(&self, actor_id: i64, post_id: i64) -> Result<Toggle, AppError> {
        self.ensure_actor(actor_id).await?;

        let toggle = LikeRepository::toggle(&self.pool, actor_id, post_id).await?;
        let action = if toggle.active { "liked" } else { "unliked" };
        tracing::info!(user_id = actor_id, post_id, "User {} post", action);

        Ok(toggle)
    }

    /// Returns whether `actor_id` now follows the target and the target's
    /// follower count.
    pub async fn toggle_follow(&self, actor_id: i64, target_user_id: i64) -> Result<Toggle, AppError> {
        if actor_id == target_user_id {
            tracing::warn!(user_id = actor_id, "User attempted to follow themselves");
            return Err(AppError::SelfFollow);
        }
        self.ensure_actor(actor_id).await?;

        let toggle = FollowRepository::toggle(&self.pool, actor_id, target_user_id).await?;
        let action = if toggle.active { "followed" } else { "unfollowed" };
        tracing::info!(user_id = actor_id, target_user_id, "User {} user", action);

        Ok(toggle)
    }

    /// Returns whether `actor_id` has now retweeted the post and its retweet
    /// count. Retweets of retweets apply to the original. A new retweet
    /// notifies the original author unless they retweeted themselves.
    pub async fn toggle_retweet(&self, actor_id: i64, post_id: i64) -> Result<Toggle, AppError> {
        let actor = UserRepository::get_by_id(&self.pool, actor_id)
            .await?
            .ok_or_else(AppError::auth_required)?;

        let outcome = PostRepository::toggle_retweet(&self.pool, actor_id, post_id).await?;
        let original = &outcome.original;

        if outcome.toggle.active {
            tracing::info!(
                user_id = actor_id,
                post_id = original.id,
                author_id = original.user_id,
                "User retweeted post"
            );
            if original.user_id != actor_id {
                self.notifier.retweeted(original.id, &actor.username);
            }
        } else {
            tracing::info!(user_id = actor_id, post_id = original.id, "User un-retweeted post");
        }

        Ok(outcome.toggle)
    }
}

#[cfg(test)]
mod tests {
    use crate::db::{FeedRepository, FollowRepository, PostRepository, Toggle};
    use crate::error::AppError;
    use crate::social::{testing, SocialService};

    #[tokio::test]
    async fn test_follow_parity() {
        let (service, _) = testing::service().await;
        let alice = testing::user(&service, "alice").await;
        let bob = testing::user(&service, "bob").await;

        assert!(!FollowRepository::is_following(service.pool(), alice, bob).await.unwrap());
        for n in 1..=5 {
            let toggle = service.toggle_follow(alice, bob).await.unwrap();
            assert_eq!(toggle.active, n % 2 == 1);
            assert_eq!(
                FollowRepository::is_following(service.pool(), alice, bob).await.unwrap(),
                n % 2 == 1
            );
        }
    }

    #[tokio::test]
    async fn test_self_follow_rejected_without_mutation() {
        let (service, _) = testing::service().await;
        let alice = testing::user(&service, "alice").await;

        for _ in 0..2 {
            let err = service.toggle_follow(alice, alice).await.unwrap_err();
            assert!(matches!(err, AppError::SelfFollow));
        }
        let stats = service.get_profile_stats(alice).await.unwrap();
        assert_eq!((stats.follower_count, stats.following_count), (0, 0));
    }

    #[tokio::test]
    async fn test_toggle_targets_must_exist() {
        let (service, _) = testing::service().await;
        let alice = testing::user(&service, "alice").await;

        assert!(matches!(service.toggle_like(alice, 7).await, Err(AppError::NotFound(_))));
        assert!(matches!(service.toggle_retweet(alice, 7).await, Err(AppError::NotFound(_))));
        assert!(matches!(service.toggle_follow(alice, 7).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_like_round_trip_keeps_count() {
        let (service, _) = testing::service().await;
        let alice = testing::user(&service, "alice").await;
        let bob = testing::user(&service, "bob").await;
        let carol = testing::user(&service, "carol").await;
        let post = service.create_post(alice, "hello", None).await.unwrap();
        service.toggle_like(carol, post.id).await.unwrap();

        let on = service.toggle_like(bob, post.id).await.unwrap();
        let off = service.toggle_like(bob, post.id).await.unwrap();
        assert_eq!(on, Toggle { active: true, count: 2 });
        assert_eq!(off, Toggle { active: false, count: 1 });
    }

    #[tokio::test]
    async fn test_retweet_creates_and_removes_exactly_one_post() {
        let (service, dispatcher) = testing::service().await;
        let alice = testing::user(&service, "alice").await;
        let bob = testing::user(&service, "bob").await;
        let post = service.create_post(alice, "hello", None).await.unwrap();
        let unrelated = service.create_post(bob, "keep me", None).await.unwrap();

        let on = service.toggle_retweet(bob, post.id).await.unwrap();
        assert_eq!(on, Toggle { active: true, count: 1 });
        let retweets = PostRepository::retweets_by(service.pool(), bob, post.id).await.unwrap();
        assert_eq!(retweets.len(), 1);
        let shown = FeedRepository::single(service.pool(), None, retweets[0].id).await.unwrap().unwrap();
        assert!(shown.is_retweet);
        assert_eq!(retweets[0].user_id, bob);
        assert_eq!(retweets[0].content, "hello");
        assert_eq!(
            dispatcher.sent.lock().unwrap().as_slice(),
            &[(post.id, "bob".to_string())]
        );

        let off = service.toggle_retweet(bob, post.id).await.unwrap();
        assert_eq!(off, Toggle { active: false, count: 0 });
        assert!(PostRepository::retweets_by(service.pool(), bob, post.id).await.unwrap().is_empty());
        assert!(FeedRepository::single(service.pool(), None, unrelated.id).await.unwrap().is_some());
        let original = FeedRepository::single(service.pool(), None, post.id).await.unwrap().unwrap();
        assert!(!original.is_retweet);

        // Removing a retweet sends nothing
        assert_eq!(dispatcher.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_own_retweet_does_not_notify() {
        let (service, dispatcher) = testing::service().await;
        let alice = testing::user(&service, "alice").await;
        let post = service.create_post(alice, "hello", None).await.unwrap();

        let on = service.toggle_retweet(alice, post.id).await.unwrap();
        assert!(on.active);
        assert!(dispatcher.sent.lock().unwrap().is_empty());
    }

    async fn count(service: &SocialService, sql: &str, a: i64, b: i64) -> i64 {
        sqlx::query_scalar(sql)
            .bind(a)
            .bind(b)
            .fetch_one(service.pool())
            .await
            .unwrap()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_toggles_settle_by_parity() {
        let dir = tempfile::tempdir().unwrap();
        let service = testing::file_service(dir.path()).await;
        let alice = testing::user(&service, "alice").await;
        let bob = testing::user(&service, "bob").await;
        let carol = testing::user(&service, "carol").await;
        let dave = testing::user(&service, "dave").await;
        let post = service.create_post(alice, "hello", None).await.unwrap();

        // Bob and Carol toggle an odd number of times, Dave an even number
        let mut handles = Vec::new();
        for (actor, n) in [(bob, 7), (carol, 5), (dave, 6)] {
            for _ in 0..n {
                let s = service.clone();
                handles.push(tokio::spawn(async move { s.toggle_like(actor, post.id).await }));
                let s = service.clone();
                handles.push(tokio::spawn(async move { s.toggle_retweet(actor, post.id).await }));
                let s = service.clone();
                handles.push(tokio::spawn(async move { s.toggle_follow(actor, alice).await }));
            }
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        for (actor, expected) in [(bob, 1), (carol, 1), (dave, 0)] {
            let likes = count(&service, "SELECT COUNT(*) FROM likes WHERE user_id = ? AND post_id = ?", actor, post.id).await;
            let retweets = count(&service, "SELECT COUNT(*) FROM posts WHERE user_id = ? AND parent_id = ?", actor, post.id).await;
            let follows = count(&service, "SELECT COUNT(*) FROM follows WHERE follower_id = ? AND followee_id = ?", actor, alice).await;
            assert_eq!((likes, retweets, follows), (expected, expected, expected), "user {}", actor);
        }

        let detail = service.get_post(None, post.id).await.unwrap();
        assert_eq!((detail.post.like_count, detail.post.retweet_count), (2, 2));
        assert_eq!(service.get_profile_stats(alice).await.unwrap().follower_count, 2);

        // A second burst starting from the settled state flips Bob back off
        let handles: Vec<_> = (0..3)
            .flat_map(|_| {
                let (s1, s2, s3) = (service.clone(), service.clone(), service.clone());
                [
                    tokio::spawn(async move { s1.toggle_like(bob, post.id).await }),
                    tokio::spawn(async move { s2.toggle_retweet(bob, post.id).await }),
                    tokio::spawn(async move { s3.toggle_follow(bob, alice).await }),
                ]
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let likes = count(&service, "SELECT COUNT(*) FROM likes WHERE user_id = ? AND post_id = ?", bob, post.id).await;
        let retweets = count(&service, "SELECT COUNT(*) FROM posts WHERE user_id = ? AND parent_id = ?", bob, post.id).await;
        let follows = count(&service, "SELECT COUNT(*) FROM follows WHERE follower_id = ? AND followee_id = ?", bob, alice).await;
        assert_eq!((likes, retweets, follows), (0, 0, 0));
    }
}
