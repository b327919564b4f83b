//! Vocabulary repository implementation.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use lingo_core::{Error, Result, Vocabulary, VocabularyRepository};

const VOCABULARY_COLUMNS: &str = "id, word, definition_en, meaning, example_en, \
     part_of_speech, pronunciation, image_url, audio_url, category_id, created_at";

fn row_to_vocabulary(row: PgRow) -> Vocabulary {
    Vocabulary {
        id: row.get("id"),
        word: row.get("word"),
        definition_en: row.get("definition_en"),
        meaning: row.get("meaning"),
        example_en: row.get("example_en"),
        part_of_speech: row.get("part_of_speech"),
        pronunciation: row.get("pronunciation"),
        image_url: row.get("image_url"),
        audio_url: row.get("audio_url"),
        category_id: row.get("category_id"),
        created_at: row.get("created_at"),
    }
}

/// PostgreSQL implementation of VocabularyRepository.
#[derive(Clone)]
pub struct PgVocabularyRepository {
    pool: Pool<Postgres>,
}

impl PgVocabularyRepository {
    /// Create a new PgVocabularyRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Insert a vocabulary item. Used by the content intake handler before
    /// the created event goes on the fabric.
    pub async fn insert(&self, vocab: &Vocabulary) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO vocabulary
                (id, word, definition_en, meaning, example_en, part_of_speech,
                 pronunciation, image_url, audio_url, category_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(vocab.id)
        .bind(&vocab.word)
        .bind(&vocab.definition_en)
        .bind(&vocab.meaning)
        .bind(&vocab.example_en)
        .bind(&vocab.part_of_speech)
        .bind(&vocab.pronunciation)
        .bind(&vocab.image_url)
        .bind(&vocab.audio_url)
        .bind(vocab.category_id)
        .bind(vocab.created_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }
}

#[async_trait]
impl VocabularyRepository for PgVocabularyRepository {
    async fn get(&self, id: Uuid) -> Result<Option<Vocabulary>> {
        let row = sqlx::query(&format!(
            "SELECT {VOCABULARY_COLUMNS} FROM vocabulary WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(row_to_vocabulary))
    }

    async fn distractors(
        &self,
        exclude_id: Uuid,
        part_of_speech: &str,
        limit: i64,
    ) -> Result<Vec<Vocabulary>> {
        // Random sampling keeps generated quizzes from always reusing the
        // same distractor set. Fine at catalog scale.
        let rows = sqlx::query(&format!(
            r#"
            SELECT {VOCABULARY_COLUMNS}
            FROM vocabulary
            WHERE id != $1 AND LOWER(part_of_speech) = LOWER($2)
            ORDER BY random()
            LIMIT $3
            "#
        ))
        .bind(exclude_id)
        .bind(part_of_speech)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(row_to_vocabulary).collect())
    }
}
