//! Repository traits for the lingo persistence layer.
//!
//! These traits define the interfaces the database crate implements,
//! enabling pluggable backends and in-memory fakes for worker tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// USERS
// =============================================================================

/// Read-only learner lookup. Account CRUD lives outside this service.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fetch a user by id.
    async fn get(&self, id: Uuid) -> Result<Option<User>>;
}

// =============================================================================
// VOCABULARY
// =============================================================================

/// Vocabulary catalog lookups needed by the pipeline.
#[async_trait]
pub trait VocabularyRepository: Send + Sync {
    /// Fetch a vocabulary item by id.
    async fn get(&self, id: Uuid) -> Result<Option<Vocabulary>>;

    /// Random vocabulary items sharing `part_of_speech`, excluding
    /// `exclude_id`, for use as distractor choices. Returns up to `limit`
    /// items; fewer when the catalog is thin.
    async fn distractors(
        &self,
        exclude_id: Uuid,
        part_of_speech: &str,
        limit: i64,
    ) -> Result<Vec<Vocabulary>>;
}

// =============================================================================
// REVIEW STATE
// =============================================================================

/// Spaced-repetition state persistence.
///
/// The store is the single source of truth: the scanner re-reads it on
/// every pass rather than caching, so concurrent review submissions are
/// always reflected.
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Fetch the state for one learner/item pairing.
    async fn get(&self, user_id: Uuid, vocabulary_id: Uuid) -> Result<Option<ReviewState>>;

    /// Idempotent upsert keyed by (user_id, vocabulary_id).
    async fn upsert(&self, state: &ReviewState) -> Result<()>;

    /// Users with at least one item whose next review time has passed.
    async fn users_with_due_items(&self, now: DateTime<Utc>) -> Result<Vec<Uuid>>;

    /// Number of due items for one learner (not globally).
    async fn due_count(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<i64>;
}

// =============================================================================
// NOTIFICATIONS
// =============================================================================

/// Durable notification persistence. Insert-only from the consumer side;
/// only the read flag is ever mutated afterwards.
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Insert unless a row with the same (recipient, kind, reference_key)
    /// already exists. Returns `None` on the duplicate path, which callers
    /// treat as success; this is what makes redelivery safe.
    async fn insert_deduplicated(&self, new: NewNotification) -> Result<Option<Notification>>;

    /// Recipient's notifications, newest first.
    async fn list_for_recipient(
        &self,
        recipient_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>>;

    /// Flip the read flag. Errors if the notification does not belong to
    /// `recipient_id`.
    async fn mark_read(&self, id: Uuid, recipient_id: Uuid) -> Result<()>;

    /// Unread count for one recipient.
    async fn unread_count(&self, recipient_id: Uuid) -> Result<i64>;
}

// =============================================================================
// QUIZZES
// =============================================================================

/// Quiz persistence for the auto-generation pipeline.
#[async_trait]
pub trait QuizRepository: Send + Sync {
    /// Persist a quiz with all its questions and choices in one
    /// transaction: either everything lands or nothing does.
    async fn create(&self, new: NewQuiz) -> Result<Quiz>;
}

// =============================================================================
// QUIZ ATTEMPTS
// =============================================================================

/// Quiz attempt lookups and the terminal scoring transition.
#[async_trait]
pub trait AttemptRepository: Send + Sync {
    /// Fetch an attempt by id.
    async fn get(&self, id: Uuid) -> Result<Option<QuizAttempt>>;

    /// The quiz's questions (with choices and expected answers) for grading.
    async fn answer_key(&self, quiz_id: Uuid) -> Result<Vec<Question>>;

    /// Title of the quiz an attempt belongs to, for the result notification.
    async fn quiz_title(&self, quiz_id: Uuid) -> Result<Option<String>>;

    /// Transition IN_PROGRESS → SCORED and record the score. Returns
    /// `false` when the attempt was already scored; the terminal state is
    /// never re-entered, so redelivered submissions are no-ops.
    async fn record_score(
        &self,
        attempt_id: Uuid,
        score: i32,
        results: &[QuestionResult],
    ) -> Result<bool>;
}
