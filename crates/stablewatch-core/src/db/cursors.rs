//! Per-(wallet, network) monitoring cursors.

use crate::types::{MonitoringState, Network};
use crate::Result;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

pub struct CursorRepository {
    pool: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct CursorRow {
    wallet_id: Uuid,
    last_tx_hash: Option<String>,
    initialized: bool,
    last_checked_at: DateTime<Utc>,
}

impl CursorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, wallet_id: Uuid, network: Network) -> Result<Option<MonitoringState>> {
        let row: Option<CursorRow> = sqlx::query_as(
            r#"
            SELECT wallet_id, last_tx_hash, initialized, last_checked_at
            FROM monitoring_state
            WHERE wallet_id = $1 AND network = $2
            "#,
        )
        .bind(wallet_id)
        .bind(network.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| MonitoringState {
            wallet_id: r.wallet_id,
            network,
            last_tx_hash: r.last_tx_hash,
            initialized: r.initialized,
            last_checked_at: r.last_checked_at,
        }))
    }

    /// Point the cursor at `tx_hash`, creating it initialized if absent.
    pub async fn advance(&self, wallet_id: Uuid, network: Network, tx_hash: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO monitoring_state (wallet_id, network, last_tx_hash, initialized, last_checked_at, updated_at)
            VALUES ($1, $2, $3, true, NOW(), NOW())
            ON CONFLICT (wallet_id, network) DO UPDATE SET
                last_tx_hash = EXCLUDED.last_tx_hash,
                initialized = true,
                last_checked_at = NOW(),
                updated_at = NOW()
            "#,
        )
        .bind(wallet_id)
        .bind(network.as_str())
        .bind(tx_hash)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
