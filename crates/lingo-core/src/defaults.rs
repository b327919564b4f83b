//! Centralized default constants for the lingo system.
//!
//! **This module is the single source of truth** for shared default values.
//! All crates reference these constants instead of defining their own magic
//! numbers.

// =============================================================================
// SPACED REPETITION (SM-2)
// =============================================================================

/// Floor for the ease factor. SM-2 never lets ease drop below this.
pub const SRS_MIN_EASE: f64 = 1.3;

/// Ease factor assigned to a brand-new review state.
pub const SRS_INITIAL_EASE: f64 = 2.5;

/// Interval (days) after the first successful repetition.
pub const SRS_FIRST_INTERVAL_DAYS: i32 = 1;

/// Interval (days) after the second successful repetition.
pub const SRS_SECOND_INTERVAL_DAYS: i32 = 6;

/// Highest valid recall grade.
pub const SRS_MAX_QUALITY: u8 = 5;

/// Grades below this reset the repetition sequence.
pub const SRS_PASSING_QUALITY: u8 = 3;

// =============================================================================
// QUIZ GENERATION
// =============================================================================

/// Fixed point value for every auto-generated question.
pub const QUESTION_POINTS: i32 = 10;

/// Distractors required before a choice question can be generated.
pub const MIN_DISTRACTORS: usize = 3;

/// Placeholder substituted for the target word in generated prompts.
pub const BLANK_PLACEHOLDER: &str = "______";

// =============================================================================
// MESSAGE FABRIC
// =============================================================================

/// Delivery attempts before a message is dead-lettered.
pub const MAX_DELIVERY_ATTEMPTS: u32 = 5;

// =============================================================================
// SCHEDULING
// =============================================================================

/// Seconds between review-due scans (daily).
pub const SCAN_INTERVAL_SECS: u64 = 86_400;

// =============================================================================
// REALTIME GATEWAY
// =============================================================================

/// Seconds between WebSocket keep-alive pings.
pub const WS_PING_INTERVAL_SECS: u64 = 30;

/// Default bearer-token lifetime in seconds (24 hours).
pub const TOKEN_TTL_SECS: i64 = 86_400;

// =============================================================================
// PAGINATION
// =============================================================================

/// Default page size for notification listings.
pub const PAGE_LIMIT: i64 = 50;

/// Default page offset.
pub const PAGE_OFFSET: i64 = 0;
