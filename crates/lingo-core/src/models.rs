//! Domain model types shared across the lingo crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::defaults;

// =============================================================================
// USERS
// =============================================================================

/// A platform user (learner). Account administration lives outside this
/// service; only the fields the pipeline reads are modeled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    /// Stable identity used to address realtime deliveries.
    pub email: String,
}

// =============================================================================
// VOCABULARY
// =============================================================================

/// A vocabulary item in the content catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vocabulary {
    pub id: Uuid,
    pub word: String,
    pub definition_en: Option<String>,
    pub meaning: Option<String>,
    pub example_en: Option<String>,
    pub part_of_speech: Option<String>,
    pub pronunciation: Option<String>,
    pub image_url: Option<String>,
    pub audio_url: Option<String>,
    pub category_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Vocabulary {
    /// True when the item carries a usable example sentence that actually
    /// contains the target word (case-insensitive).
    pub fn has_usable_example(&self) -> bool {
        self.example_en
            .as_deref()
            .map(|s| {
                !s.trim().is_empty() && s.to_lowercase().contains(&self.word.to_lowercase())
            })
            .unwrap_or(false)
    }
}

// =============================================================================
// SPACED REPETITION
// =============================================================================

/// Per-learner, per-item spaced-repetition state.
///
/// Mutated only by a review submission flowing through the SM-2 scheduler;
/// the review-due scanner reads it but never writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewState {
    pub user_id: Uuid,
    pub vocabulary_id: Uuid,
    /// Multiplier controlling interval growth. Never below 1.3.
    pub ease_factor: f64,
    pub interval_days: i32,
    pub repetition_count: i32,
    /// None until the first review is submitted.
    pub next_review_at: Option<DateTime<Utc>>,
}

impl ReviewState {
    /// Fresh state for an item the learner has never reviewed.
    pub fn new(user_id: Uuid, vocabulary_id: Uuid) -> Self {
        Self {
            user_id,
            vocabulary_id,
            ease_factor: defaults::SRS_INITIAL_EASE,
            interval_days: 0,
            repetition_count: 0,
            next_review_at: None,
        }
    }
}

// =============================================================================
// NOTIFICATIONS
// =============================================================================

/// Kind tag on a persisted notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    NewReply,
    NewLike,
    ReviewReminder,
    QuizResult,
}

impl NotificationKind {
    /// Stable string form for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::NewReply => "new_reply",
            NotificationKind::NewLike => "new_like",
            NotificationKind::ReviewReminder => "review_reminder",
            NotificationKind::QuizResult => "quiz_result",
        }
    }

    /// Parse the database string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "new_reply" => Some(NotificationKind::NewReply),
            "new_like" => Some(NotificationKind::NewLike),
            "review_reminder" => Some(NotificationKind::ReviewReminder),
            "quiz_result" => Some(NotificationKind::QuizResult),
            _ => None,
        }
    }
}

/// A durable notification record.
///
/// Created only by the notification consumer; the producer side never
/// touches these rows. After insert, only the read flag is ever mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub actor_id: Option<Uuid>,
    pub kind: NotificationKind,
    pub message: String,
    pub link: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a notification.
///
/// `reference_key` is the idempotency reference (comment id, post id,
/// attempt id, or reminder date): together with recipient and kind it
/// uniquely identifies the business event, so a redelivered fabric message
/// inserts nothing.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub recipient_id: Uuid,
    pub actor_id: Option<Uuid>,
    pub kind: NotificationKind,
    pub message: String,
    pub link: String,
    pub reference_key: String,
}

// =============================================================================
// QUIZZES
// =============================================================================

/// Strategy tag on a generated question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
    FillInBlank,
    MultipleChoiceText,
    MultipleChoiceImage,
    ListeningComprehension,
}

impl QuestionType {
    /// Stable string form for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::FillInBlank => "fill_in_blank",
            QuestionType::MultipleChoiceText => "multiple_choice_text",
            QuestionType::MultipleChoiceImage => "multiple_choice_image",
            QuestionType::ListeningComprehension => "listening_comprehension",
        }
    }

    /// Parse the database string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "fill_in_blank" => Some(QuestionType::FillInBlank),
            "multiple_choice_text" => Some(QuestionType::MultipleChoiceText),
            "multiple_choice_image" => Some(QuestionType::MultipleChoiceImage),
            "listening_comprehension" => Some(QuestionType::ListeningComprehension),
            _ => None,
        }
    }

    /// True for question types answered by picking a choice.
    pub fn is_choice_based(&self) -> bool {
        !matches!(self, QuestionType::FillInBlank)
    }
}

/// One answer option on a choice-based question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    pub id: Uuid,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub is_correct: bool,
}

/// A quiz question, tagged with the strategy that generated it and linked
/// back to its source vocabulary item for traceability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: Uuid,
    pub question_type: QuestionType,
    pub prompt: String,
    pub audio_url: Option<String>,
    pub image_url: Option<String>,
    /// Expected text for fill-in-blank questions.
    pub correct_answer: Option<String>,
    pub points: i32,
    pub related_vocabulary_id: Option<Uuid>,
    pub choices: Vec<Choice>,
}

impl Question {
    /// The single correct choice, if this is a choice-based question.
    pub fn correct_choice(&self) -> Option<&Choice> {
        self.choices.iter().find(|c| c.is_correct)
    }
}

/// A quiz with its questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub questions: Vec<Question>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for an auto-generated quiz. Persisted all-or-nothing.
#[derive(Debug, Clone)]
pub struct NewQuiz {
    pub title: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub questions: Vec<NewQuestion>,
}

/// Insert payload for one generated question.
#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub question_type: QuestionType,
    pub prompt: String,
    pub audio_url: Option<String>,
    pub image_url: Option<String>,
    pub correct_answer: Option<String>,
    pub points: i32,
    pub related_vocabulary_id: Option<Uuid>,
    pub choices: Vec<NewChoice>,
}

/// Insert payload for one choice.
#[derive(Debug, Clone)]
pub struct NewChoice {
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub is_correct: bool,
}

// =============================================================================
// QUIZ ATTEMPTS
// =============================================================================

/// Lifecycle of a quiz attempt. `Scored` is terminal: once an attempt is
/// scored, re-scoring is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttemptStatus {
    InProgress,
    Scored,
}

impl AttemptStatus {
    /// Stable string form for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptStatus::InProgress => "in_progress",
            AttemptStatus::Scored => "scored",
        }
    }

    /// Parse the database string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "in_progress" => Some(AttemptStatus::InProgress),
            "scored" => Some(AttemptStatus::Scored),
            _ => None,
        }
    }
}

/// One learner's run through a quiz.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizAttempt {
    pub id: Uuid,
    pub quiz_id: Uuid,
    pub user_id: Uuid,
    pub status: AttemptStatus,
    pub score: i32,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Per-question grading outcome recorded alongside the attempt score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionResult {
    pub question_id: Uuid,
    pub correct: bool,
    pub points_awarded: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_kind_roundtrip() {
        for kind in [
            NotificationKind::NewReply,
            NotificationKind::NewLike,
            NotificationKind::ReviewReminder,
            NotificationKind::QuizResult,
        ] {
            assert_eq!(NotificationKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(NotificationKind::parse("bogus"), None);
    }

    #[test]
    fn test_question_type_roundtrip() {
        for qt in [
            QuestionType::FillInBlank,
            QuestionType::MultipleChoiceText,
            QuestionType::MultipleChoiceImage,
            QuestionType::ListeningComprehension,
        ] {
            assert_eq!(QuestionType::parse(qt.as_str()), Some(qt));
        }
        assert_eq!(QuestionType::parse(""), None);
    }

    #[test]
    fn test_choice_based_classification() {
        assert!(!QuestionType::FillInBlank.is_choice_based());
        assert!(QuestionType::MultipleChoiceText.is_choice_based());
        assert!(QuestionType::MultipleChoiceImage.is_choice_based());
        assert!(QuestionType::ListeningComprehension.is_choice_based());
    }

    #[test]
    fn test_attempt_status_roundtrip() {
        assert_eq!(AttemptStatus::parse("in_progress"), Some(AttemptStatus::InProgress));
        assert_eq!(AttemptStatus::parse("scored"), Some(AttemptStatus::Scored));
        assert_eq!(AttemptStatus::parse("done"), None);
    }

    #[test]
    fn test_new_review_state_defaults() {
        let state = ReviewState::new(Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(state.ease_factor, crate::defaults::SRS_INITIAL_EASE);
        assert_eq!(state.interval_days, 0);
        assert_eq!(state.repetition_count, 0);
        assert!(state.next_review_at.is_none());
    }

    #[test]
    fn test_has_usable_example() {
        let mut vocab = Vocabulary {
            id: Uuid::new_v4(),
            word: "Ephemeral".to_string(),
            definition_en: None,
            meaning: None,
            example_en: Some("Fame is ephemeral at best.".to_string()),
            part_of_speech: Some("adjective".to_string()),
            pronunciation: None,
            image_url: None,
            audio_url: None,
            category_id: None,
            created_at: Utc::now(),
        };
        // Match is case-insensitive.
        assert!(vocab.has_usable_example());

        vocab.example_en = Some("A sentence without the word.".to_string());
        assert!(!vocab.has_usable_example());

        vocab.example_en = Some("   ".to_string());
        assert!(!vocab.has_usable_example());

        vocab.example_en = None;
        assert!(!vocab.has_usable_example());
    }

    #[test]
    fn test_correct_choice_lookup() {
        let question = Question {
            id: Uuid::new_v4(),
            question_type: QuestionType::MultipleChoiceText,
            prompt: "Pick one".to_string(),
            audio_url: None,
            image_url: None,
            correct_answer: None,
            points: 10,
            related_vocabulary_id: None,
            choices: vec![
                Choice {
                    id: Uuid::new_v4(),
                    content: Some("wrong".to_string()),
                    image_url: None,
                    is_correct: false,
                },
                Choice {
                    id: Uuid::new_v4(),
                    content: Some("right".to_string()),
                    image_url: None,
                    is_correct: true,
                },
            ],
        };
        assert_eq!(
            question.correct_choice().and_then(|c| c.content.as_deref()),
            Some("right")
        );
    }
}
