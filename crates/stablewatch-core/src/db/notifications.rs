//! Append-only delivery log.

use crate::types::Notification;
use crate::Result;
use sqlx::PgPool;
use uuid::Uuid;

pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record one delivery outcome; a second row for the same pair is ignored.
    pub async fn insert(&self, notification: &Notification) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (event_id, channel_id, status, error_message, sent_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (event_id, channel_id) DO NOTHING
            "#,
        )
        .bind(notification.event_id)
        .bind(notification.channel_id)
        .bind(notification.status.as_str())
        .bind(&notification.error_message)
        .bind(notification.sent_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn channel_ids_for_event(&self, event_id: Uuid) -> Result<Vec<Uuid>> {
        let rows: Vec<(Uuid,)> =
            sqlx::query_as("SELECT channel_id FROM notifications WHERE event_id = $1")
                .bind(event_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(|r| r.0).collect())
    }
}
