//! Spaced-repetition review state repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use lingo_core::{Error, Result, ReviewRepository, ReviewState};

/// PostgreSQL implementation of ReviewRepository.
///
/// One row per (user, vocabulary item). The table is the single source of
/// truth for due-ness; the scanner queries it fresh on every pass.
#[derive(Clone)]
pub struct PgReviewRepository {
    pool: Pool<Postgres>,
}

impl PgReviewRepository {
    /// Create a new PgReviewRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReviewRepository for PgReviewRepository {
    async fn get(&self, user_id: Uuid, vocabulary_id: Uuid) -> Result<Option<ReviewState>> {
        let row = sqlx::query(
            r#"
            SELECT user_id, vocabulary_id, ease_factor, interval_days,
                   repetition_count, next_review_at
            FROM review_state
            WHERE user_id = $1 AND vocabulary_id = $2
            "#,
        )
        .bind(user_id)
        .bind(vocabulary_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|row| ReviewState {
            user_id: row.get("user_id"),
            vocabulary_id: row.get("vocabulary_id"),
            ease_factor: row.get("ease_factor"),
            interval_days: row.get("interval_days"),
            repetition_count: row.get("repetition_count"),
            next_review_at: row.get("next_review_at"),
        }))
    }

    async fn upsert(&self, state: &ReviewState) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO review_state
                (user_id, vocabulary_id, ease_factor, interval_days,
                 repetition_count, next_review_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id, vocabulary_id) DO UPDATE SET
                ease_factor = EXCLUDED.ease_factor,
                interval_days = EXCLUDED.interval_days,
                repetition_count = EXCLUDED.repetition_count,
                next_review_at = EXCLUDED.next_review_at,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(state.user_id)
        .bind(state.vocabulary_id)
        .bind(state.ease_factor)
        .bind(state.interval_days)
        .bind(state.repetition_count)
        .bind(state.next_review_at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn users_with_due_items(&self, now: DateTime<Utc>) -> Result<Vec<Uuid>> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT user_id
            FROM review_state
            WHERE next_review_at IS NOT NULL AND next_review_at <= $1
            ORDER BY user_id
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(|row| row.get("user_id")).collect())
    }

    async fn due_count(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<i64> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS due_count
            FROM review_state
            WHERE user_id = $1
              AND next_review_at IS NOT NULL
              AND next_review_at <= $2
            "#,
        )
        .bind(user_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.get("due_count"))
    }
}
