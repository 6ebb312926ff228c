//! Watched wallets and their monitoring cursors.

use super::Network;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A watch-only wallet registered by a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    pub id: Uuid,
    pub user_id: Uuid,
    pub network: Network,
    pub address: String,
    pub label: Option<String>,
    pub is_active: bool,
}

impl Wallet {
    /// Label if the user set one, otherwise the raw address.
    pub fn display_name(&self) -> &str {
        self.label
            .as_deref()
            .filter(|l| !l.trim().is_empty())
            .unwrap_or(&self.address)
    }

    /// Address in the network's canonical comparison form.
    pub fn normalized_address(&self) -> String {
        self.network.normalize_address(&self.address)
    }
}

/// Durable bookmark of the last processed transfer for a (wallet, network).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringState {
    pub wallet_id: Uuid,
    pub network: Network,
    /// Reference of the last processed transfer.
    pub last_tx_hash: Option<String>,
    pub initialized: bool,
    pub last_checked_at: DateTime<Utc>,
}

impl MonitoringState {
    /// Stored reference, treating an empty string like no reference.
    pub fn reference(&self) -> Option<&str> {
        self.last_tx_hash.as_deref().filter(|h| !h.is_empty())
    }
}
