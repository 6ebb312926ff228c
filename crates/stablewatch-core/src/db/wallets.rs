//! Read access to user-registered wallets.

use crate::types::Wallet;
use crate::Result;
use sqlx::PgPool;
use uuid::Uuid;

/// Repository for watched wallets.
pub struct WalletRepository {
    pool: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct WalletRow {
    id: Uuid,
    user_id: Uuid,
    network: String,
    address: String,
    label: Option<String>,
    is_active: bool,
}

impl WalletRow {
    fn into_wallet(self) -> Result<Wallet> {
        Ok(Wallet {
            id: self.id,
            user_id: self.user_id,
            network: self.network.parse()?,
            address: self.address,
            label: self.label,
            is_active: self.is_active,
        })
    }
}

impl WalletRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Active wallets in a stable order.
    ///
    /// Rows with an unsupported network are skipped with a warning so one bad
    /// row cannot block the whole cycle.
    pub async fn get_active(&self) -> Result<Vec<Wallet>> {
        let rows: Vec<WalletRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, network, address, label, is_active
            FROM wallets
            WHERE is_active = true
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let id = row.id;
                row.into_wallet()
                    .map_err(|e| tracing::warn!(wallet_id = %id, error = %e, "Skipping wallet"))
                    .ok()
            })
            .collect())
    }

    pub async fn get(&self, wallet_id: Uuid) -> Result<Option<Wallet>> {
        let row: Option<WalletRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, network, address, label, is_active
            FROM wallets
            WHERE id = $1
            "#,
        )
        .bind(wallet_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(WalletRow::into_wallet).transpose()
    }
}
