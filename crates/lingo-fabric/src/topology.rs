//! Named exchanges, queues, and bindings for the engagement pipeline.
//!
//! Declared once at startup; declarations are idempotent so workers and the
//! API gateway can share one broker without ordering concerns.

use lingo_core::Result;

use crate::broker::Broker;

/// Exchange for all user-facing notification events.
pub const NOTIFICATION_EXCHANGE: &str = "notification_exchange";
/// Queue drained by the notification consumer.
pub const NOTIFICATION_QUEUE: &str = "q.notification";
/// Catch-all binding: every `notification.*` event lands on the queue.
pub const NOTIFICATION_ROUTING_KEY: &str = "notification.#";

/// Exchange for quiz attempt submissions.
pub const QUIZ_SCORING_EXCHANGE: &str = "quiz_scoring_exchange";
/// Queue drained by the scoring consumer.
pub const QUIZ_SCORING_QUEUE: &str = "q.quiz_scoring";
pub const QUIZ_SCORING_ROUTING_KEY: &str = "quiz.submission";

/// Exchange for content lifecycle events.
pub const VOCABULARY_EXCHANGE: &str = "vocabulary_exchange";
/// Queue drained by the quiz-generation consumer.
pub const VOCABULARY_CREATED_QUEUE: &str = "q.vocabulary_created";
pub const VOCABULARY_CREATED_ROUTING_KEY: &str = "vocabulary.created";

/// Declare the full pipeline topology on a broker.
pub fn declare_topology(broker: &Broker) -> Result<()> {
    broker.declare_exchange(NOTIFICATION_EXCHANGE);
    broker.declare_queue(NOTIFICATION_QUEUE);
    broker.bind(
        NOTIFICATION_EXCHANGE,
        NOTIFICATION_QUEUE,
        NOTIFICATION_ROUTING_KEY,
    )?;

    broker.declare_exchange(QUIZ_SCORING_EXCHANGE);
    broker.declare_queue(QUIZ_SCORING_QUEUE);
    broker.bind(
        QUIZ_SCORING_EXCHANGE,
        QUIZ_SCORING_QUEUE,
        QUIZ_SCORING_ROUTING_KEY,
    )?;

    broker.declare_exchange(VOCABULARY_EXCHANGE);
    broker.declare_queue(VOCABULARY_CREATED_QUEUE);
    broker.bind(
        VOCABULARY_EXCHANGE,
        VOCABULARY_CREATED_QUEUE,
        VOCABULARY_CREATED_ROUTING_KEY,
    )?;

    Ok(())
}
