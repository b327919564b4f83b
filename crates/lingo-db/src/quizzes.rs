//! Quiz repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use lingo_core::{Choice, Error, NewQuiz, Question, Quiz, QuizRepository, Result};

/// PostgreSQL implementation of QuizRepository.
#[derive(Clone)]
pub struct PgQuizRepository {
    pool: Pool<Postgres>,
}

impl PgQuizRepository {
    /// Create a new PgQuizRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QuizRepository for PgQuizRepository {
    async fn create(&self, new: NewQuiz) -> Result<Quiz> {
        let quiz_id = Uuid::now_v7();
        let created_at = Utc::now();

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        sqlx::query(
            r#"
            INSERT INTO quiz (id, title, description, category_id, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(quiz_id)
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.category_id)
        .bind(created_at)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        let mut questions = Vec::with_capacity(new.questions.len());
        for (q_pos, q) in new.questions.into_iter().enumerate() {
            let question_id = Uuid::now_v7();
            sqlx::query(
                r#"
                INSERT INTO question
                    (id, quiz_id, question_type, prompt, audio_url, image_url,
                     correct_answer, points, related_vocabulary_id, position)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                "#,
            )
            .bind(question_id)
            .bind(quiz_id)
            .bind(q.question_type.as_str())
            .bind(&q.prompt)
            .bind(&q.audio_url)
            .bind(&q.image_url)
            .bind(&q.correct_answer)
            .bind(q.points)
            .bind(q.related_vocabulary_id)
            .bind(q_pos as i32)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

            let mut choices = Vec::with_capacity(q.choices.len());
            for (c_pos, c) in q.choices.into_iter().enumerate() {
                let choice_id = Uuid::now_v7();
                sqlx::query(
                    r#"
                    INSERT INTO choice (id, question_id, content, image_url, is_correct, position)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    "#,
                )
                .bind(choice_id)
                .bind(question_id)
                .bind(&c.content)
                .bind(&c.image_url)
                .bind(c.is_correct)
                .bind(c_pos as i32)
                .execute(&mut *tx)
                .await
                .map_err(Error::Database)?;

                choices.push(Choice {
                    id: choice_id,
                    content: c.content,
                    image_url: c.image_url,
                    is_correct: c.is_correct,
                });
            }

            questions.push(Question {
                id: question_id,
                question_type: q.question_type,
                prompt: q.prompt,
                audio_url: q.audio_url,
                image_url: q.image_url,
                correct_answer: q.correct_answer,
                points: q.points,
                related_vocabulary_id: q.related_vocabulary_id,
                choices,
            });
        }

        tx.commit().await.map_err(Error::Database)?;

        Ok(Quiz {
            id: quiz_id,
            title: new.title,
            description: new.description,
            category_id: new.category_id,
            questions,
            created_at,
        })
    }
}
