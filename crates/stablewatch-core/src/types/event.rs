//! Alert-worthy transfers persisted by the monitor.

use super::{Direction, Network};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Token symbol for every monitored contract.
pub const USDT: &str = "USDT";

/// A qualifying transfer about to be appended to the event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvent {
    pub wallet_id: Uuid,
    pub tx_hash: String,
    pub direction: Direction,
    pub amount: Decimal,
    pub token: String,
    pub network: Network,
    pub occurred_at: DateTime<Utc>,
    pub raw: serde_json::Value,
}

/// A persisted event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub wallet_id: Uuid,
    pub tx_hash: String,
    pub direction: Direction,
    pub amount: Decimal,
    pub token: String,
    pub network: Network,
    pub occurred_at: DateTime<Utc>,
    pub raw: serde_json::Value,
    /// Flipped once by the dispatcher after all channel attempts finish.
    pub notified: bool,
    pub created_at: DateTime<Utc>,
}

impl Event {
    pub fn from_new(id: Uuid, new: NewEvent, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            wallet_id: new.wallet_id,
            tx_hash: new.tx_hash,
            direction: new.direction,
            amount: new.amount,
            token: new.token,
            network: new.network,
            occurred_at: new.occurred_at,
            raw: new.raw,
            notified: false,
            created_at,
        }
    }
}
