//! Read access to notification channels.

use crate::types::{ChannelConfig, NotificationChannel};
use crate::Result;
use sqlx::PgPool;
use uuid::Uuid;

pub struct ChannelRepository {
    pool: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct ChannelRow {
    id: Uuid,
    user_id: Uuid,
    #[sqlx(rename = "type")]
    kind: String,
    config: serde_json::Value,
    is_enabled: bool,
    verified: bool,
}

impl ChannelRow {
    fn into_channel(self) -> Result<NotificationChannel> {
        let config: ChannelConfig = serde_json::from_value(self.config)?;
        Ok(NotificationChannel {
            id: self.id,
            user_id: self.user_id,
            kind: self.kind.parse()?,
            config,
            is_enabled: self.is_enabled,
            verified: self.verified,
        })
    }
}

impl ChannelRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Enabled and verified channels for a user.
    ///
    /// Rows with an unknown type or unreadable config are skipped with a
    /// warning rather than failing the whole event.
    pub async fn get_eligible_for_user(&self, user_id: Uuid) -> Result<Vec<NotificationChannel>> {
        let rows: Vec<ChannelRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, type, config, is_enabled, verified
            FROM notification_channels
            WHERE user_id = $1 AND is_enabled = true AND verified = true
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let id = row.id;
                row.into_channel()
                    .map_err(|e| tracing::warn!(channel_id = %id, error = %e, "Skipping channel"))
                    .ok()
            })
            .collect())
    }
}
