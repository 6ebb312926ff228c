//! Storage seams used by the two workers.
//!
//! The durable store is the only hand-off between the monitor and the
//! dispatcher. Each worker sees only the operations it needs.

mod memory;

pub use memory::MemoryStore;

use crate::types::{
    AlertRule, Event, MonitoringState, Network, NewEvent, Notification, NotificationChannel,
    Wallet,
};
use crate::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// Operations the transaction monitor performs.
#[async_trait]
pub trait MonitorStore: Send + Sync {
    /// Wallets with `is_active = true`.
    async fn active_wallets(&self) -> Result<Vec<Wallet>>;

    /// Cursor for a (wallet, network), if one was ever written.
    async fn cursor(&self, wallet_id: Uuid, network: Network) -> Result<Option<MonitoringState>>;

    /// Upsert the cursor to `tx_hash` and mark it initialized.
    async fn advance_cursor(&self, wallet_id: Uuid, network: Network, tx_hash: &str)
        -> Result<()>;

    /// Active alert rules for a wallet.
    async fn active_rules(&self, wallet_id: Uuid) -> Result<Vec<AlertRule>>;

    /// Append an event. Returns `false` when the (wallet, network, tx_hash)
    /// already exists, in which case nothing is written.
    async fn insert_event(&self, event: &NewEvent) -> Result<bool>;
}

/// Operations the notification dispatcher performs.
#[async_trait]
pub trait DispatchStore: Send + Sync {
    /// Up to `limit` events with `notified = false`, oldest first.
    async fn unnotified_events(&self, limit: u32) -> Result<Vec<Event>>;

    async fn wallet(&self, wallet_id: Uuid) -> Result<Option<Wallet>>;

    /// The owner's channels that are both enabled and verified.
    async fn eligible_channels(&self, user_id: Uuid) -> Result<Vec<NotificationChannel>>;

    /// Channels that already have a notification row for this event.
    async fn delivered_channels(&self, event_id: Uuid) -> Result<Vec<Uuid>>;

    /// Append one delivery outcome. Existing (event, channel) rows are kept.
    async fn insert_notification(&self, notification: &Notification) -> Result<()>;

    async fn mark_notified(&self, event_id: Uuid) -> Result<()>;
}
