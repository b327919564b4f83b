//! Notification repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use lingo_core::{
    Error, NewNotification, Notification, NotificationKind, NotificationRepository, Result,
};

fn row_to_notification(row: PgRow) -> Result<Notification> {
    let kind_str: String = row.get("kind");
    let kind = NotificationKind::parse(&kind_str)
        .ok_or_else(|| Error::Internal(format!("unknown notification kind in db: {kind_str}")))?;
    Ok(Notification {
        id: row.get("id"),
        recipient_id: row.get("recipient_id"),
        actor_id: row.get("actor_id"),
        kind,
        message: row.get("message"),
        link: row.get("link"),
        read: row.get("read"),
        created_at: row.get("created_at"),
    })
}

/// PostgreSQL implementation of NotificationRepository.
#[derive(Clone)]
pub struct PgNotificationRepository {
    pool: Pool<Postgres>,
}

impl PgNotificationRepository {
    /// Create a new PgNotificationRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for PgNotificationRepository {
    async fn insert_deduplicated(&self, new: NewNotification) -> Result<Option<Notification>> {
        // The unique index on (recipient_id, kind, reference_key) makes the
        // insert a no-op on redelivery. RETURNING yields no row on the
        // conflict path, which callers treat as "already delivered".
        let row = sqlx::query(
            r#"
            INSERT INTO notification
                (id, recipient_id, actor_id, kind, message, link, read,
                 reference_key, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, FALSE, $7, $8)
            ON CONFLICT (recipient_id, kind, reference_key) DO NOTHING
            RETURNING id, recipient_id, actor_id, kind, message, link, read, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(new.recipient_id)
        .bind(new.actor_id)
        .bind(new.kind.as_str())
        .bind(&new.message)
        .bind(&new.link)
        .bind(&new.reference_key)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.map(row_to_notification).transpose()
    }

    async fn list_for_recipient(
        &self,
        recipient_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>> {
        let rows = sqlx::query(
            r#"
            SELECT id, recipient_id, actor_id, kind, message, link, read, created_at
            FROM notification
            WHERE recipient_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(recipient_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.into_iter().map(row_to_notification).collect()
    }

    async fn mark_read(&self, id: Uuid, recipient_id: Uuid) -> Result<()> {
        let result = sqlx::query(
            "UPDATE notification SET read = TRUE WHERE id = $1 AND recipient_id = $2",
        )
        .bind(id)
        .bind(recipient_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("notification {id}")));
        }
        Ok(())
    }

    async fn unread_count(&self, recipient_id: Uuid) -> Result<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS unread FROM notification WHERE recipient_id = $1 AND read = FALSE",
        )
        .bind(recipient_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.get("unread"))
    }
}
