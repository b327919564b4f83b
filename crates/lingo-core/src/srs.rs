//! SM-2 spaced-repetition scheduler.
//!
//! Pure functions over value types: no clock reads, no I/O. The caller
//! passes `now`, which keeps review scheduling deterministic and makes the
//! scheduler testable against SM-2 reference vectors.

use chrono::{DateTime, Duration, Utc};

use crate::defaults::{
    SRS_FIRST_INTERVAL_DAYS, SRS_MAX_QUALITY, SRS_MIN_EASE, SRS_PASSING_QUALITY,
    SRS_SECOND_INTERVAL_DAYS,
};
use crate::error::{Error, Result};

/// Scheduler input: the learner's state for one item before this review.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SrsState {
    pub ease_factor: f64,
    pub interval_days: i32,
    pub repetition_count: i32,
}

/// Scheduler output: the state after grading plus the next due timestamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SrsOutcome {
    pub ease_factor: f64,
    pub interval_days: i32,
    pub repetition_count: i32,
    pub next_review_at: DateTime<Utc>,
}

/// Apply one graded review to a spaced-repetition state.
///
/// `quality` is the recall grade on the 0–5 scale; grades below 3 are
/// failures. Grades above 5 are rejected as invalid input, never clamped.
///
/// Failure resets the repetition sequence (count 0, interval 1 day) while
/// still lowering the ease factor. Success walks the fixed 1-day/6-day
/// openers before switching to the multiplicative progression. The ease
/// update is the standard SM-2 curve, floored at 1.3:
///
/// ```text
/// ef' = ef + (0.1 - (5 - q) * (0.08 + (5 - q) * 0.02))
/// ```
pub fn schedule(prev: SrsState, quality: u8, now: DateTime<Utc>) -> Result<SrsOutcome> {
    if quality > SRS_MAX_QUALITY {
        return Err(Error::InvalidInput(format!(
            "recall quality must be between 0 and {SRS_MAX_QUALITY}, got {quality}"
        )));
    }

    let ease_factor = next_ease(prev.ease_factor, quality);

    let (repetition_count, interval_days) = if quality < SRS_PASSING_QUALITY {
        (0, SRS_FIRST_INTERVAL_DAYS)
    } else {
        let repetition_count = prev.repetition_count + 1;
        let interval_days = match repetition_count {
            1 => SRS_FIRST_INTERVAL_DAYS,
            2 => SRS_SECOND_INTERVAL_DAYS,
            _ => (prev.interval_days as f64 * ease_factor).round() as i32,
        };
        (repetition_count, interval_days)
    };

    Ok(SrsOutcome {
        ease_factor,
        interval_days,
        repetition_count,
        next_review_at: now + Duration::days(interval_days as i64),
    })
}

/// SM-2 ease adjustment, floored at [`SRS_MIN_EASE`].
fn next_ease(ease_factor: f64, quality: u8) -> f64 {
    let q = quality as f64;
    let adjusted = ease_factor + (0.1 - (5.0 - q) * (0.08 + (5.0 - q) * 0.02));
    adjusted.max(SRS_MIN_EASE)
}
