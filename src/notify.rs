//! Retweet notifications.
//!
//! Toggles hand work to a [`NotificationDispatcher`] and move on; delivery
//! happens on a background task and never reports back to the caller.

use std::sync::Arc;
use std::time::Duration;
use sqlx::{Pool, Sqlite};
use tokio::sync::mpsc;

use crate::db::PostRepository;
use crate::error::AppError;

/// Fire-and-forget sink for "someone retweeted your post".
pub trait NotificationDispatcher: Send + Sync {
    fn retweeted(&self, post_id: i64, retweeter: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetweetNotification {
    pub post_id: i64,
    pub retweeter: String,
}

/// Queues notifications for [`run_notification_worker`].
#[derive(Clone)]
pub struct ChannelDispatcher {
    tx: mpsc::UnboundedSender<RetweetNotification>,
}

impl ChannelDispatcher {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<RetweetNotification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl NotificationDispatcher for ChannelDispatcher {
    fn retweeted(&self, post_id: i64, retweeter: &str) {
        let notification = RetweetNotification {
            post_id,
            retweeter: retweeter.to_string(),
        };
        if self.tx.send(notification).is_err() {
            tracing::warn!(post_id, "Notification worker is gone, dropping retweet notification");
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

pub trait Mailer: Send + Sync {
    fn send(&self, email: &Email) -> Result<(), AppError>;
}

/// Writes outgoing mail to the log.
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, email: &Email) -> Result<(), AppError> {
        tracing::info!(
            from = %email.from,
            to = %email.to,
            subject = %email.subject,
            "📧 {}",
            email.body
        );
        Ok(())
    }
}

pub struct WorkerSettings {
    pub from: String,
    pub max_attempts: u32,
    pub backoff: Duration,
}

/// Build the email for `notification`, or `None` if the post is gone.
async fn compose(
    pool: &Pool<Sqlite>,
    from: &str,
    notification: &RetweetNotification,
) -> Result<Option<Email>, AppError> {
    let Some(owner) = PostRepository::get_owner(pool, notification.post_id).await? else {
        return Ok(None);
    };

    Ok(Some(Email {
        from: from.to_string(),
        to: owner.email,
        subject: format!("{} retweeted your tweet!", notification.retweeter),
        body: format!(
            "Hi {}, {} retweeted your tweet: \"{}\"",
            owner.username, notification.retweeter, owner.content
        ),
    }))
}

/// Deliver one notification, retrying with a linear backoff.
/// Returns whether the mail went out.
pub async fn deliver(
    pool: &Pool<Sqlite>,
    mailer: &dyn Mailer,
    settings: &WorkerSettings,
    notification: &RetweetNotification,
) -> bool {
    let max_attempts = settings.max_attempts.max(1);

    for attempt in 1..=max_attempts {
        let result = match compose(pool, &settings.from, notification).await {
            Ok(Some(email)) => mailer.send(&email),
            Ok(None) => {
                tracing::warn!(post_id = notification.post_id, "Retweeted post no longer exists, dropping notification");
                return false;
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => return true,
            Err(e) if attempt < max_attempts => {
                tracing::warn!(post_id = notification.post_id, attempt, "Notification failed, retrying: {}", e);
                tokio::time::sleep(settings.backoff * attempt).await;
            }
            Err(e) => {
                tracing::error!(post_id = notification.post_id, attempt, "❌ Notification failed: {}", e);
            }
        }
    }

    false
}

/// Drain the queue until every dispatcher is dropped.
pub async fn run_notification_worker(
    pool: Pool<Sqlite>,
    mut rx: mpsc::UnboundedReceiver<RetweetNotification>,
    mailer: Arc<dyn Mailer>,
    settings: WorkerSettings,
) {
    while let Some(notification) = rx.recv().await {
        deliver(&pool, mailer.as_ref(), &settings, &notification).await;
    }
    tracing::debug!("Notification worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use crate::db::testing;

    /// Fails the first `failures` sends, then records.
    struct FlakyMailer {
        failures: Mutex<u32>,
        sent: Mutex<Vec<Email>>,
    }

    impl FlakyMailer {
        fn new(failures: u32) -> Self {
            Self { failures: Mutex::new(failures), sent: Mutex::new(Vec::new()) }
        }
    }

    impl Mailer for FlakyMailer {
        fn send(&self, email: &Email) -> Result<(), AppError> {
            let mut failures = self.failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(AppError::Internal("smtp down".to_string()));
            }
            self.sent.lock().unwrap().push(email.clone());
            Ok(())
        }
    }

    fn settings(max_attempts: u32) -> WorkerSettings {
        WorkerSettings {
            from: "noreply@chirp.local".to_string(),
            max_attempts,
            backoff: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_worker_delivers_to_post_owner() {
        let pool = testing::pool().await;
        let alice = testing::user(&pool, "alice").await;
        let post = PostRepository::create(&pool, alice.id, "hello", None).await.unwrap();

        let mailer = Arc::new(FlakyMailer::new(0));
        let (dispatcher, rx) = ChannelDispatcher::new();
        dispatcher.retweeted(post.id, "bob");
        drop(dispatcher);

        run_notification_worker(pool, rx, mailer.clone(), settings(3)).await;

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "alice@example.com");
        assert_eq!(sent[0].subject, "bob retweeted your tweet!");
    }

    #[tokio::test]
    async fn test_deliver_retries_then_gives_up() {
        let pool = testing::pool().await;
        let alice = testing::user(&pool, "alice").await;
        let post = PostRepository::create(&pool, alice.id, "hello", None).await.unwrap();
        let notification = RetweetNotification { post_id: post.id, retweeter: "bob".to_string() };

        let recovers = FlakyMailer::new(2);
        assert!(deliver(&pool, &recovers, &settings(3), &notification).await);
        assert_eq!(recovers.sent.lock().unwrap().len(), 1);

        let broken = FlakyMailer::new(10);
        assert!(!deliver(&pool, &broken, &settings(3), &notification).await);
        assert!(broken.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deleted_post_is_dropped() {
        let pool = testing::pool().await;
        let mailer = FlakyMailer::new(0);
        let notification = RetweetNotification { post_id: 42, retweeter: "bob".to_string() };

        assert!(!deliver(&pool, &mailer, &settings(3), &notification).await);
        assert!(mailer.sent.lock().unwrap().is_empty());
    }
}
