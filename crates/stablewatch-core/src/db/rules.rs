//! Read access to alert rules.

use crate::types::AlertRule;
use crate::Result;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

pub struct RuleRepository {
    pool: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct RuleRow {
    id: Uuid,
    wallet_id: Uuid,
    direction: String,
    min_amount: Option<Decimal>,
    is_active: bool,
}

impl RuleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_active_for_wallet(&self, wallet_id: Uuid) -> Result<Vec<AlertRule>> {
        let rows: Vec<RuleRow> = sqlx::query_as(
            r#"
            SELECT id, wallet_id, direction, min_amount, is_active
            FROM alert_rules
            WHERE wallet_id = $1 AND is_active = true
            "#,
        )
        .bind(wallet_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|r| -> Result<AlertRule> {
                Ok(AlertRule {
                    id: r.id,
                    wallet_id: r.wallet_id,
                    direction: r.direction.parse()?,
                    min_amount: r.min_amount,
                    is_active: r.is_active,
                })
            })
            .collect()
    }
}
