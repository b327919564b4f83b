//! Wire event types carried on the message fabric.
//!
//! Events are transient: produced once, consumed at-least-once, never
//! persisted themselves. All consumers must tolerate redelivery, which is
//! why every notification event exposes a [`NotificationEvent::dedupe_key`]
//! derived from its underlying business reference.
//!
//! Serialized as JSON with a `type` tag field, e.g.:
//! `{"type":"NewLike","recipient_id":"...","actor_id":"...","post_id":"..."}`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::NotificationKind;

// =============================================================================
// NOTIFICATION EVENTS
// =============================================================================

/// Discriminated union of everything that can become a user notification.
///
/// A single tagged enum (not four unrelated handler shapes) so the consumer
/// dispatches with an exhaustive `match`: adding a kind without handling it
/// is a compile error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NotificationEvent {
    /// Someone replied to the recipient's comment.
    NewReply {
        recipient_id: Uuid,
        actor_id: Uuid,
        post_id: Uuid,
        comment_id: Uuid,
    },
    /// Someone liked the recipient's post.
    NewLike {
        recipient_id: Uuid,
        actor_id: Uuid,
        post_id: Uuid,
    },
    /// The recipient has vocabulary items due for review.
    ReviewReminder { recipient_id: Uuid, due_count: i64 },
    /// The recipient's quiz attempt was scored.
    QuizResult {
        recipient_id: Uuid,
        attempt_id: Uuid,
        quiz_title: String,
        score: i32,
    },
}

impl NotificationEvent {
    /// Routing key this event is published with on the notification
    /// exchange. All keys match the `notification.#` binding.
    pub fn routing_key(&self) -> &'static str {
        match self {
            NotificationEvent::NewReply { .. } => "notification.reply.new",
            NotificationEvent::NewLike { .. } => "notification.like.new",
            NotificationEvent::ReviewReminder { .. } => "notification.reminder.review",
            NotificationEvent::QuizResult { .. } => "notification.quiz.result",
        }
    }

    /// The persisted-notification kind this event normalizes to.
    pub fn kind(&self) -> NotificationKind {
        match self {
            NotificationEvent::NewReply { .. } => NotificationKind::NewReply,
            NotificationEvent::NewLike { .. } => NotificationKind::NewLike,
            NotificationEvent::ReviewReminder { .. } => NotificationKind::ReviewReminder,
            NotificationEvent::QuizResult { .. } => NotificationKind::QuizResult,
        }
    }

    /// Who receives the notification.
    pub fn recipient_id(&self) -> Uuid {
        match self {
            NotificationEvent::NewReply { recipient_id, .. }
            | NotificationEvent::NewLike { recipient_id, .. }
            | NotificationEvent::ReviewReminder { recipient_id, .. }
            | NotificationEvent::QuizResult { recipient_id, .. } => *recipient_id,
        }
    }

    /// Who caused the event, when a human actor exists.
    pub fn actor_id(&self) -> Option<Uuid> {
        match self {
            NotificationEvent::NewReply { actor_id, .. }
            | NotificationEvent::NewLike { actor_id, .. } => Some(*actor_id),
            NotificationEvent::ReviewReminder { .. } | NotificationEvent::QuizResult { .. } => {
                None
            }
        }
    }

    /// Business reference used for idempotent persistence: a redelivered
    /// event yields the same key and therefore inserts nothing new.
    ///
    /// Reminders are keyed by calendar date, so one reminder per learner per
    /// scan day survives redelivery while tomorrow's reminder is new.
    pub fn dedupe_key(&self, now: DateTime<Utc>) -> String {
        match self {
            NotificationEvent::NewReply { comment_id, .. } => format!("comment:{comment_id}"),
            // The actor is part of the identity: likes on one post by two
            // different users are two events, not a duplicate.
            NotificationEvent::NewLike {
                post_id, actor_id, ..
            } => format!("post:{post_id}:actor:{actor_id}"),
            NotificationEvent::ReviewReminder { .. } => {
                format!("reminder:{}", now.date_naive())
            }
            NotificationEvent::QuizResult { attempt_id, .. } => format!("attempt:{attempt_id}"),
        }
    }
}

// =============================================================================
// QUIZ SUBMISSION EVENTS
// =============================================================================

/// One submitted answer. Choice questions carry `choice_id`; fill-in-blank
/// questions carry `answer_text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmittedAnswer {
    pub question_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choice_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer_text: Option<String>,
}

/// A quiz attempt handed to the scoring consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizSubmissionEvent {
    pub attempt_id: Uuid,
    pub user_id: Uuid,
    pub answers: Vec<SubmittedAnswer>,
}

impl QuizSubmissionEvent {
    /// Routing key on the quiz scoring exchange.
    pub const ROUTING_KEY: &'static str = "quiz.submission";
}

// =============================================================================
// CONTENT CREATION EVENTS
// =============================================================================

/// A new vocabulary item was created; triggers quiz auto-generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContentCreatedEvent {
    pub vocabulary_id: Uuid,
}

impl ContentCreatedEvent {
    /// Routing key on the vocabulary exchange.
    pub const ROUTING_KEY: &'static str = "vocabulary.created";
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_routing_keys_match_notification_binding() {
        let events = [
            NotificationEvent::NewReply {
                recipient_id: Uuid::nil(),
                actor_id: Uuid::nil(),
                post_id: Uuid::nil(),
                comment_id: Uuid::nil(),
            },
            NotificationEvent::NewLike {
                recipient_id: Uuid::nil(),
                actor_id: Uuid::nil(),
                post_id: Uuid::nil(),
            },
            NotificationEvent::ReviewReminder {
                recipient_id: Uuid::nil(),
                due_count: 3,
            },
            NotificationEvent::QuizResult {
                recipient_id: Uuid::nil(),
                attempt_id: Uuid::nil(),
                quiz_title: "t".into(),
                score: 10,
            },
        ];
        for event in events {
            assert!(event.routing_key().starts_with("notification."));
        }
    }

    #[test]
    fn test_tagged_json_serialization() {
        let event = NotificationEvent::NewLike {
            recipient_id: Uuid::nil(),
            actor_id: Uuid::nil(),
            post_id: Uuid::nil(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"NewLike"#));

        let back: NotificationEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_actor_only_on_social_events() {
        let actor = Uuid::new_v4();
        let reply = NotificationEvent::NewReply {
            recipient_id: Uuid::nil(),
            actor_id: actor,
            post_id: Uuid::nil(),
            comment_id: Uuid::nil(),
        };
        assert_eq!(reply.actor_id(), Some(actor));

        let reminder = NotificationEvent::ReviewReminder {
            recipient_id: Uuid::nil(),
            due_count: 1,
        };
        assert_eq!(reminder.actor_id(), None);
    }

    #[test]
    fn test_dedupe_key_is_stable_across_redelivery() {
        let attempt_id = Uuid::new_v4();
        let event = NotificationEvent::QuizResult {
            recipient_id: Uuid::new_v4(),
            attempt_id,
            quiz_title: "Vocabulary basics".into(),
            score: 30,
        };
        let now = Utc::now();
        assert_eq!(event.dedupe_key(now), event.dedupe_key(now));
        assert_eq!(event.dedupe_key(now), format!("attempt:{attempt_id}"));
    }

    #[test]
    fn test_like_dedupe_key_distinguishes_actors() {
        let post_id = Uuid::new_v4();
        let recipient_id = Uuid::new_v4();
        let like = |actor_id| NotificationEvent::NewLike {
            recipient_id,
            actor_id,
            post_id,
        };
        let now = Utc::now();
        let alice = like(Uuid::new_v4());
        let bob = like(Uuid::new_v4());

        // Same actor redelivered collapses; different actors do not.
        assert_eq!(alice.dedupe_key(now), alice.dedupe_key(now));
        assert_ne!(alice.dedupe_key(now), bob.dedupe_key(now));
    }

    #[test]
    fn test_reminder_dedupe_key_rolls_over_daily() {
        let event = NotificationEvent::ReviewReminder {
            recipient_id: Uuid::nil(),
            due_count: 4,
        };
        let monday = Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap();
        let monday_later = Utc.with_ymd_and_hms(2026, 3, 2, 23, 0, 0).unwrap();
        let tuesday = Utc.with_ymd_and_hms(2026, 3, 3, 8, 0, 0).unwrap();

        assert_eq!(event.dedupe_key(monday), event.dedupe_key(monday_later));
        assert_ne!(event.dedupe_key(monday), event.dedupe_key(tuesday));
    }

    #[test]
    fn test_submission_event_roundtrip() {
        let event = QuizSubmissionEvent {
            attempt_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            answers: vec![
                SubmittedAnswer {
                    question_id: Uuid::new_v4(),
                    choice_id: Some(Uuid::new_v4()),
                    answer_text: None,
                },
                SubmittedAnswer {
                    question_id: Uuid::new_v4(),
                    choice_id: None,
                    answer_text: Some("ephemeral".into()),
                },
            ],
        };
        let json = serde_json::to_value(&event).unwrap();
        // Optional fields are skipped when absent.
        assert!(json["answers"][0].get("answer_text").is_none());
        assert!(json["answers"][1].get("choice_id").is_none());

        let back: QuizSubmissionEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
