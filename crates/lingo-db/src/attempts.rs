//! Quiz attempt repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use lingo_core::{
    AttemptRepository, AttemptStatus, Choice, Error, Question, QuestionResult, QuestionType,
    QuizAttempt, Result,
};

/// PostgreSQL implementation of AttemptRepository.
#[derive(Clone)]
pub struct PgAttemptRepository {
    pool: Pool<Postgres>,
}

impl PgAttemptRepository {
    /// Create a new PgAttemptRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Open a new attempt for a learner. Starts IN_PROGRESS with score 0.
    pub async fn start(&self, quiz_id: Uuid, user_id: Uuid) -> Result<QuizAttempt> {
        let id = Uuid::now_v7();
        let started_at = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO quiz_attempt (id, quiz_id, user_id, status, score, started_at)
            VALUES ($1, $2, $3, $4, 0, $5)
            "#,
        )
        .bind(id)
        .bind(quiz_id)
        .bind(user_id)
        .bind(AttemptStatus::InProgress.as_str())
        .bind(started_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(QuizAttempt {
            id,
            quiz_id,
            user_id,
            status: AttemptStatus::InProgress,
            score: 0,
            started_at,
            completed_at: None,
        })
    }
}

#[async_trait]
impl AttemptRepository for PgAttemptRepository {
    async fn get(&self, id: Uuid) -> Result<Option<QuizAttempt>> {
        let row = sqlx::query(
            r#"
            SELECT id, quiz_id, user_id, status, score, started_at, completed_at
            FROM quiz_attempt
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.map(|row| {
            let status_str: String = row.get("status");
            let status = AttemptStatus::parse(&status_str).ok_or_else(|| {
                Error::Internal(format!("unknown attempt status in db: {status_str}"))
            })?;
            Ok(QuizAttempt {
                id: row.get("id"),
                quiz_id: row.get("quiz_id"),
                user_id: row.get("user_id"),
                status,
                score: row.get("score"),
                started_at: row.get("started_at"),
                completed_at: row.get("completed_at"),
            })
        })
        .transpose()
    }

    async fn answer_key(&self, quiz_id: Uuid) -> Result<Vec<Question>> {
        let question_rows = sqlx::query(
            r#"
            SELECT id, question_type, prompt, audio_url, image_url,
                   correct_answer, points, related_vocabulary_id
            FROM question
            WHERE quiz_id = $1
            ORDER BY position
            "#,
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let mut questions = Vec::with_capacity(question_rows.len());
        for row in question_rows {
            let type_str: String = row.get("question_type");
            let question_type = QuestionType::parse(&type_str).ok_or_else(|| {
                Error::Internal(format!("unknown question type in db: {type_str}"))
            })?;
            let question_id: Uuid = row.get("id");

            let choice_rows = sqlx::query(
                r#"
                SELECT id, content, image_url, is_correct
                FROM choice
                WHERE question_id = $1
                ORDER BY position
                "#,
            )
            .bind(question_id)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

            questions.push(Question {
                id: question_id,
                question_type,
                prompt: row.get("prompt"),
                audio_url: row.get("audio_url"),
                image_url: row.get("image_url"),
                correct_answer: row.get("correct_answer"),
                points: row.get("points"),
                related_vocabulary_id: row.get("related_vocabulary_id"),
                choices: choice_rows
                    .into_iter()
                    .map(|c| Choice {
                        id: c.get("id"),
                        content: c.get("content"),
                        image_url: c.get("image_url"),
                        is_correct: c.get("is_correct"),
                    })
                    .collect(),
            });
        }

        Ok(questions)
    }

    async fn quiz_title(&self, quiz_id: Uuid) -> Result<Option<String>> {
        let row = sqlx::query("SELECT title FROM quiz WHERE id = $1")
            .bind(quiz_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(row.map(|row| row.get("title")))
    }

    async fn record_score(
        &self,
        attempt_id: Uuid,
        score: i32,
        results: &[QuestionResult],
    ) -> Result<bool> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        // The status guard makes the transition one-way: a second scoring
        // pass for the same attempt updates zero rows.
        let updated = sqlx::query(
            r#"
            UPDATE quiz_attempt
            SET status = $2, score = $3, completed_at = $4
            WHERE id = $1 AND status = $5
            "#,
        )
        .bind(attempt_id)
        .bind(AttemptStatus::Scored.as_str())
        .bind(score)
        .bind(Utc::now())
        .bind(AttemptStatus::InProgress.as_str())
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        if updated.rows_affected() == 0 {
            tx.rollback().await.map_err(Error::Database)?;
            return Ok(false);
        }

        for result in results {
            sqlx::query(
                r#"
                INSERT INTO attempt_result (attempt_id, question_id, correct, points_awarded)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(attempt_id)
            .bind(result.question_id)
            .bind(result.correct)
            .bind(result.points_awarded)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
        }

        tx.commit().await.map_err(Error::Database)?;
        Ok(true)
    }
}
