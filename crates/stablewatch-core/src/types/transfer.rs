//! Provider-neutral transfer records produced by the chain adapters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A token transfer as reported by an explorer, normalized across providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTransfer {
    /// Transaction hash / id.
    pub reference: String,
    pub from: String,
    pub to: String,
    /// Integer amount in the token's smallest unit, as a decimal string.
    pub value: String,
    pub decimals: u32,
    pub occurred_at: DateTime<Utc>,
    /// Provider record exactly as received.
    pub payload: serde_json::Value,
}
