//! REST handlers: thin producers in front of the fabric, plus the
//! notification read surface.
//!
//! Producer endpoints validate, persist what must be durable before the
//! event exists (vocabulary rows, review state), publish, and return.
//! Everything asynchronous happens in the consumers.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use lingo_core::defaults::{PAGE_LIMIT, PAGE_OFFSET};
use lingo_core::events::{ContentCreatedEvent, NotificationEvent, QuizSubmissionEvent, SubmittedAnswer};
use lingo_core::srs::{schedule, SrsState};
use lingo_core::{
    AttemptRepository, AttemptStatus, NotificationRepository, ReviewRepository, ReviewState,
    Vocabulary, VocabularyRepository,
};
use lingo_fabric::topology::{NOTIFICATION_EXCHANGE, QUIZ_SCORING_EXCHANGE, VOCABULARY_EXCHANGE};

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// VOCABULARY INTAKE
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateVocabularyRequest {
    pub word: String,
    pub definition_en: Option<String>,
    pub meaning: Option<String>,
    pub example_en: Option<String>,
    pub part_of_speech: Option<String>,
    pub pronunciation: Option<String>,
    pub image_url: Option<String>,
    pub audio_url: Option<String>,
    pub category_id: Option<Uuid>,
}

/// Create a vocabulary item and publish `vocabulary.created`. The row is
/// committed before the event goes out, so the generation consumer can
/// always find it.
pub async fn create_vocabulary(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateVocabularyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.authenticate(&headers)?;

    if req.word.trim().is_empty() {
        return Err(ApiError::BadRequest("word must not be empty".to_string()));
    }

    let vocab = Vocabulary {
        id: Uuid::now_v7(),
        word: req.word,
        definition_en: req.definition_en,
        meaning: req.meaning,
        example_en: req.example_en,
        part_of_speech: req.part_of_speech,
        pronunciation: req.pronunciation,
        image_url: req.image_url,
        audio_url: req.audio_url,
        category_id: req.category_id,
        created_at: Utc::now(),
    };
    state.db.vocabulary.insert(&vocab).await?;

    let event = ContentCreatedEvent {
        vocabulary_id: vocab.id,
    };
    state
        .broker
        .publish(VOCABULARY_EXCHANGE, ContentCreatedEvent::ROUTING_KEY, &event)?;

    info!(vocabulary_id = %vocab.id, word = %vocab.word, "Vocabulary created");
    Ok((StatusCode::CREATED, Json(vocab)))
}

// =============================================================================
// REVIEW SUBMISSION
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct SubmitReviewRequest {
    /// Recall quality grade, 0 through 5.
    pub quality: u8,
}

/// Submit a review grade for one vocabulary item; runs the SM-2 scheduler
/// and persists the new state synchronously.
pub async fn submit_review(
    State(state): State<AppState>,
    Path(vocabulary_id): Path<Uuid>,
    headers: HeaderMap,
    Json(req): Json<SubmitReviewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = state.authenticate(&headers)?;

    if state.db.vocabulary.get(vocabulary_id).await?.is_none() {
        return Err(ApiError::NotFound(format!(
            "vocabulary {vocabulary_id} not found"
        )));
    }

    let prev = state
        .db
        .reviews
        .get(user_id, vocabulary_id)
        .await?
        .unwrap_or_else(|| ReviewState::new(user_id, vocabulary_id));

    let outcome = schedule(
        SrsState {
            ease_factor: prev.ease_factor,
            interval_days: prev.interval_days,
            repetition_count: prev.repetition_count,
        },
        req.quality,
        Utc::now(),
    )?;

    let next = ReviewState {
        user_id,
        vocabulary_id,
        ease_factor: outcome.ease_factor,
        interval_days: outcome.interval_days,
        repetition_count: outcome.repetition_count,
        next_review_at: Some(outcome.next_review_at),
    };
    state.db.reviews.upsert(&next).await?;

    info!(
        user_id = %user_id,
        vocabulary_id = %vocabulary_id,
        quality = req.quality,
        interval_days = next.interval_days,
        "Review recorded"
    );
    Ok(Json(next))
}

// =============================================================================
// QUIZ ATTEMPTS
// =============================================================================

/// Open an attempt on a quiz.
pub async fn start_attempt(
    State(state): State<AppState>,
    Path(quiz_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = state.authenticate(&headers)?;

    if state.db.attempts.quiz_title(quiz_id).await?.is_none() {
        return Err(ApiError::NotFound(format!("quiz {quiz_id} not found")));
    }

    let attempt = state.db.attempts.start(quiz_id, user_id).await?;
    Ok((StatusCode::CREATED, Json(attempt)))
}

#[derive(Debug, Deserialize)]
pub struct SubmitAttemptRequest {
    pub answers: Vec<SubmittedAnswer>,
}

/// Hand a completed attempt to the scoring pipeline. Returns 202; the
/// result arrives as a notification once the consumer has graded it.
pub async fn submit_attempt(
    State(state): State<AppState>,
    Path(attempt_id): Path<Uuid>,
    headers: HeaderMap,
    Json(req): Json<SubmitAttemptRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = state.authenticate(&headers)?;

    let attempt = state
        .db
        .attempts
        .get(attempt_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("attempt {attempt_id} not found")))?;
    if attempt.user_id != user_id {
        return Err(ApiError::Unauthorized(
            "attempt belongs to another user".to_string(),
        ));
    }
    if attempt.status == AttemptStatus::Scored {
        return Err(ApiError::Conflict("attempt already scored".to_string()));
    }

    let event = QuizSubmissionEvent {
        attempt_id,
        user_id,
        answers: req.answers,
    };
    state.broker.publish(
        QUIZ_SCORING_EXCHANGE,
        QuizSubmissionEvent::ROUTING_KEY,
        &event,
    )?;

    info!(attempt_id = %attempt_id, user_id = %user_id, "Submission queued for scoring");
    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "status": "queued" })),
    ))
}

// =============================================================================
// SOCIAL EVENT PRODUCERS
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct LikeRequest {
    /// Author of the liked post.
    pub recipient_id: Uuid,
}

/// Record a like on a post by publishing the notification event. The post
/// itself lives in the content service; this gateway only produces the
/// engagement event.
pub async fn like_post(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    headers: HeaderMap,
    Json(req): Json<LikeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let actor_id = state.authenticate(&headers)?;

    let event = NotificationEvent::NewLike {
        recipient_id: req.recipient_id,
        actor_id,
        post_id,
    };
    state
        .broker
        .publish(NOTIFICATION_EXCHANGE, event.routing_key(), &event)?;
    Ok(StatusCode::ACCEPTED)
}

#[derive(Debug, Deserialize)]
pub struct ReplyRequest {
    /// Author of the comment being replied to.
    pub recipient_id: Uuid,
    /// Id of the newly created reply comment.
    pub reply_id: Uuid,
}

/// Announce a reply to a comment.
pub async fn reply_to_comment(
    State(state): State<AppState>,
    Path((post_id, _comment_id)): Path<(Uuid, Uuid)>,
    headers: HeaderMap,
    Json(req): Json<ReplyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let actor_id = state.authenticate(&headers)?;

    let event = NotificationEvent::NewReply {
        recipient_id: req.recipient_id,
        actor_id,
        post_id,
        comment_id: req.reply_id,
    };
    state
        .broker
        .publish(NOTIFICATION_EXCHANGE, event.routing_key(), &event)?;
    Ok(StatusCode::ACCEPTED)
}

// =============================================================================
// NOTIFICATION READ SURFACE
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// The caller's notifications, newest first.
pub async fn list_notifications(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(page): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = state.authenticate(&headers)?;

    let limit = page.limit.unwrap_or(PAGE_LIMIT).clamp(1, PAGE_LIMIT);
    let offset = page.offset.unwrap_or(PAGE_OFFSET).max(0);

    let notifications = state
        .db
        .notifications
        .list_for_recipient(user_id, limit, offset)
        .await?;
    Ok(Json(notifications))
}

/// Unread badge count.
pub async fn unread_count(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = state.authenticate(&headers)?;
    let unread = state.db.notifications.unread_count(user_id).await?;
    Ok(Json(serde_json::json!({ "unread": unread })))
}

/// Mark one of the caller's notifications as read.
pub async fn mark_notification_read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = state.authenticate(&headers)?;
    state.db.notifications.mark_read(id, user_id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

// =============================================================================
// SYSTEM
// =============================================================================

/// Liveness probe.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "realtime_connections": state.registry.active_count(),
    }))
}
