//! Structured logging field name constants for lingo.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized names across every
//! subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue (bad message dropped, business-rule rejection) |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration, high-volume data |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID propagated across request → event → consumer.
/// Format: UUIDv7 (time-ordered).
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "fabric", "db", "workers", "gateway"
pub const SUBSYSTEM: &str = "subsystem";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// User UUID being operated on (recipient or learner).
pub const USER_ID: &str = "user_id";

/// Vocabulary item UUID.
pub const VOCABULARY_ID: &str = "vocabulary_id";

/// Quiz attempt UUID.
pub const ATTEMPT_ID: &str = "attempt_id";

/// Persisted notification UUID.
pub const NOTIFICATION_ID: &str = "notification_id";

// ─── Fabric fields ─────────────────────────────────────────────────────────

/// Fabric message UUID (UUIDv7).
pub const MESSAGE_ID: &str = "message_id";

/// Routing key a message was published with.
pub const ROUTING_KEY: &str = "routing_key";

/// Queue a message was consumed from.
pub const QUEUE: &str = "queue";

/// Exchange a message was published to.
pub const EXCHANGE: &str = "exchange";

/// Delivery attempt number (1-based).
pub const ATTEMPT: &str = "attempt";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of review items due for one learner.
pub const DUE_COUNT: &str = "due_count";

/// Number of generated questions on a quiz.
pub const QUESTION_COUNT: &str = "question_count";

/// Computed score for a quiz attempt.
pub const SCORE: &str = "score";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
