//! Append-mostly event log.

use crate::types::{Event, NewEvent};
use crate::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

pub struct EventRepository {
    pool: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct EventRow {
    id: Uuid,
    wallet_id: Uuid,
    tx_hash: String,
    direction: String,
    amount: Decimal,
    token: String,
    network: String,
    occurred_at: DateTime<Utc>,
    raw: serde_json::Value,
    notified: bool,
    created_at: DateTime<Utc>,
}

impl EventRow {
    fn into_event(self) -> Result<Event> {
        Ok(Event {
            id: self.id,
            wallet_id: self.wallet_id,
            tx_hash: self.tx_hash,
            direction: self.direction.parse()?,
            amount: self.amount,
            token: self.token,
            network: self.network.parse()?,
            occurred_at: self.occurred_at,
            raw: self.raw,
            notified: self.notified,
            created_at: self.created_at,
        })
    }
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new event. Returns its id, or `None` if the transfer was
    /// already recorded for this wallet and network.
    pub async fn insert(&self, event: &NewEvent) -> Result<Option<Uuid>> {
        let row: Option<(Uuid,)> = sqlx::query_as(
            r#"
            INSERT INTO events (
                wallet_id, tx_hash, direction, amount, token, network, occurred_at, raw, notified
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, false)
            ON CONFLICT (wallet_id, network, tx_hash) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(event.wallet_id)
        .bind(&event.tx_hash)
        .bind(event.direction.as_str())
        .bind(event.amount)
        .bind(&event.token)
        .bind(event.network.as_str())
        .bind(event.occurred_at)
        .bind(&event.raw)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.0))
    }

    /// Oldest events still waiting for dispatch.
    pub async fn get_unnotified(&self, limit: i64) -> Result<Vec<Event>> {
        let rows: Vec<EventRow> = sqlx::query_as(
            r#"
            SELECT id, wallet_id, tx_hash, direction, amount, token, network,
                   occurred_at, raw, notified, created_at
            FROM events
            WHERE notified = false
            ORDER BY created_at ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(EventRow::into_event).collect()
    }

    /// Flip `notified` to true. Already-notified rows are left untouched.
    pub async fn mark_notified(&self, event_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE events SET notified = true WHERE id = $1 AND notified = false")
            .bind(event_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
