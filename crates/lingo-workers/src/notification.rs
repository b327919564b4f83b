//! Notification consumer: turns fabric events into durable notification
//! rows and best-effort realtime pushes.
//!
//! Order of operations is fixed: persist first, push second. A notification
//! a user never saw live is still waiting in their inbox; the reverse
//! (pushed but never stored) would lose it on reload. Push failures are
//! logged and swallowed.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tracing::{debug, info};

use lingo_core::{
    ConnectionRegistry, Error, NewNotification, Notification, NotificationEvent,
    NotificationRepository, Result, UserRepository,
};
use lingo_fabric::Envelope;

use crate::consumer::EventHandler;

/// Handles every event on the notification queue with one exhaustive match.
pub struct NotificationDispatcher {
    users: Arc<dyn UserRepository>,
    notifications: Arc<dyn NotificationRepository>,
    registry: ConnectionRegistry,
}

impl NotificationDispatcher {
    pub fn new(
        users: Arc<dyn UserRepository>,
        notifications: Arc<dyn NotificationRepository>,
        registry: ConnectionRegistry,
    ) -> Self {
        Self {
            users,
            notifications,
            registry,
        }
    }

    /// Compose the stored message and deep link for an event.
    async fn compose(&self, event: &NotificationEvent) -> Result<(String, String)> {
        Ok(match event {
            NotificationEvent::NewReply {
                post_id,
                comment_id,
                ..
            } => (
                format!("{} replied to your comment", self.actor_name(event).await?),
                format!("/posts/{post_id}#comment-{comment_id}"),
            ),
            NotificationEvent::NewLike { post_id, .. } => (
                format!("{} liked your post", self.actor_name(event).await?),
                format!("/posts/{post_id}"),
            ),
            NotificationEvent::ReviewReminder { due_count, .. } => (
                if *due_count == 1 {
                    "You have 1 word due for review".to_string()
                } else {
                    format!("You have {due_count} words due for review")
                },
                "/reviews".to_string(),
            ),
            NotificationEvent::QuizResult {
                attempt_id,
                quiz_title,
                score,
                ..
            } => (
                format!("Your attempt at \"{quiz_title}\" scored {score} points"),
                format!("/attempts/{attempt_id}"),
            ),
        })
    }

    async fn actor_name(&self, event: &NotificationEvent) -> Result<String> {
        match event.actor_id() {
            Some(actor_id) => match self.users.get(actor_id).await? {
                Some(user) => Ok(user.name),
                None => Ok("Someone".to_string()),
            },
            None => Ok("Someone".to_string()),
        }
    }

    /// Serialize the realtime frame pushed to a live connection.
    fn push_frame(notification: &Notification) -> Result<String> {
        let frame = json!({
            "type": "notification",
            "payload": notification,
        });
        Ok(serde_json::to_string(&frame)?)
    }
}

#[async_trait]
impl EventHandler for NotificationDispatcher {
    fn name(&self) -> &'static str {
        "notification"
    }

    async fn handle(&self, envelope: &Envelope) -> Result<()> {
        let event: NotificationEvent = envelope.decode()?;
        let recipient_id = event.recipient_id();

        // Acting on your own content never notifies you.
        if event.actor_id() == Some(recipient_id) {
            debug!(
                user_id = %recipient_id,
                routing_key = %envelope.routing_key,
                "Suppressing self-notification"
            );
            return Ok(());
        }

        if self.users.get(recipient_id).await?.is_none() {
            return Err(Error::UserNotFound(recipient_id));
        }

        let (message, link) = self.compose(&event).await?;
        let new = NewNotification {
            recipient_id,
            actor_id: event.actor_id(),
            kind: event.kind(),
            message,
            link,
            reference_key: event.dedupe_key(Utc::now()),
        };

        let Some(notification) = self.notifications.insert_deduplicated(new).await? else {
            debug!(
                user_id = %recipient_id,
                routing_key = %envelope.routing_key,
                "Duplicate notification, already persisted"
            );
            return Ok(());
        };

        info!(
            user_id = %recipient_id,
            notification_id = %notification.id,
            kind = notification.kind.as_str(),
            "Notification persisted"
        );

        // Best-effort push after the durable write. A failure here must not
        // fail the message.
        match Self::push_frame(&notification) {
            Ok(frame) => {
                if !self.registry.send_to_user(recipient_id, frame) {
                    debug!(user_id = %recipient_id, "No live connection, push skipped");
                }
            }
            Err(e) => {
                debug!(user_id = %recipient_id, error = %e, "Push frame serialization failed");
            }
        }

        Ok(())
    }
}
