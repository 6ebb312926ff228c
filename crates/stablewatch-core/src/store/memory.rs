//! In-process store for tests, benches, and local dry runs.

use super::{DispatchStore, MonitorStore};
use crate::types::{
    AlertRule, Event, MonitoringState, Network, NewEvent, Notification, NotificationChannel,
    Wallet,
};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    wallets: Vec<Wallet>,
    rules: Vec<AlertRule>,
    channels: Vec<NotificationChannel>,
    cursors: HashMap<(Uuid, Network), MonitoringState>,
    events: Vec<Event>,
    notifications: Vec<Notification>,
    cursor_writes: u64,
    fail_event_inserts: bool,
    fail_notification_inserts: bool,
}

/// Store backed by process memory. Cloning shares the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_wallet(&self, wallet: Wallet) {
        self.inner.write().await.wallets.push(wallet);
    }

    pub async fn add_rule(&self, rule: AlertRule) {
        self.inner.write().await.rules.push(rule);
    }

    pub async fn add_channel(&self, channel: NotificationChannel) {
        self.inner.write().await.channels.push(channel);
    }

    /// Append an event directly, bypassing the monitor.
    pub async fn seed_event(&self, event: Event) {
        self.inner.write().await.events.push(event);
    }

    /// All events in insertion order.
    pub async fn events(&self) -> Vec<Event> {
        self.inner.read().await.events.clone()
    }

    pub async fn notifications(&self) -> Vec<Notification> {
        self.inner.read().await.notifications.clone()
    }

    pub async fn notifications_for(&self, event_id: Uuid) -> Vec<Notification> {
        self.inner
            .read()
            .await
            .notifications
            .iter()
            .filter(|n| n.event_id == event_id)
            .cloned()
            .collect()
    }

    /// Number of cursor writes since creation.
    pub async fn cursor_writes(&self) -> u64 {
        self.inner.read().await.cursor_writes
    }

    /// Make every event insert fail with a database error.
    #[cfg(any(test, feature = "test-util"))]
    pub async fn set_fail_event_inserts(&self, fail: bool) {
        self.inner.write().await.fail_event_inserts = fail;
    }

    /// Make every notification insert fail with a database error.
    #[cfg(any(test, feature = "test-util"))]
    pub async fn set_fail_notification_inserts(&self, fail: bool) {
        self.inner.write().await.fail_notification_inserts = fail;
    }
}

fn injected_failure() -> Error {
    Error::Database(sqlx::Error::Protocol("injected failure".to_string()))
}

#[async_trait]
impl MonitorStore for MemoryStore {
    async fn active_wallets(&self) -> Result<Vec<Wallet>> {
        let inner = self.inner.read().await;
        Ok(inner
            .wallets
            .iter()
            .filter(|w| w.is_active)
            .cloned()
            .collect())
    }

    async fn cursor(&self, wallet_id: Uuid, network: Network) -> Result<Option<MonitoringState>> {
        let inner = self.inner.read().await;
        Ok(inner.cursors.get(&(wallet_id, network)).cloned())
    }

    async fn advance_cursor(
        &self,
        wallet_id: Uuid,
        network: Network,
        tx_hash: &str,
    ) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.cursors.insert(
            (wallet_id, network),
            MonitoringState {
                wallet_id,
                network,
                last_tx_hash: Some(tx_hash.to_string()),
                initialized: true,
                last_checked_at: Utc::now(),
            },
        );
        inner.cursor_writes += 1;
        Ok(())
    }

    async fn active_rules(&self, wallet_id: Uuid) -> Result<Vec<AlertRule>> {
        let inner = self.inner.read().await;
        Ok(inner
            .rules
            .iter()
            .filter(|r| r.wallet_id == wallet_id && r.is_active)
            .cloned()
            .collect())
    }

    async fn insert_event(&self, event: &NewEvent) -> Result<bool> {
        let mut inner = self.inner.write().await;
        if inner.fail_event_inserts {
            return Err(injected_failure());
        }

        let duplicate = inner.events.iter().any(|e| {
            e.wallet_id == event.wallet_id
                && e.network == event.network
                && e.tx_hash == event.tx_hash
        });
        if duplicate {
            return Ok(false);
        }

        inner
            .events
            .push(Event::from_new(Uuid::new_v4(), event.clone(), Utc::now()));
        Ok(true)
    }
}

#[async_trait]
impl DispatchStore for MemoryStore {
    async fn unnotified_events(&self, limit: u32) -> Result<Vec<Event>> {
        let inner = self.inner.read().await;
        let mut pending: Vec<Event> = inner.events.iter().filter(|e| !e.notified).cloned().collect();
        pending.sort_by_key(|e| e.created_at);
        pending.truncate(limit as usize);
        Ok(pending)
    }

    async fn wallet(&self, wallet_id: Uuid) -> Result<Option<Wallet>> {
        let inner = self.inner.read().await;
        Ok(inner.wallets.iter().find(|w| w.id == wallet_id).cloned())
    }

    async fn eligible_channels(&self, user_id: Uuid) -> Result<Vec<NotificationChannel>> {
        let inner = self.inner.read().await;
        Ok(inner
            .channels
            .iter()
            .filter(|c| c.user_id == user_id && c.is_eligible())
            .cloned()
            .collect())
    }

    async fn delivered_channels(&self, event_id: Uuid) -> Result<Vec<Uuid>> {
        let inner = self.inner.read().await;
        Ok(inner
            .notifications
            .iter()
            .filter(|n| n.event_id == event_id)
            .map(|n| n.channel_id)
            .collect())
    }

    async fn insert_notification(&self, notification: &Notification) -> Result<()> {
        let mut inner = self.inner.write().await;
        if inner.fail_notification_inserts {
            return Err(injected_failure());
        }

        let exists = inner.notifications.iter().any(|n| {
            n.event_id == notification.event_id && n.channel_id == notification.channel_id
        });
        if !exists {
            inner.notifications.push(notification.clone());
        }
        Ok(())
    }

    async fn mark_notified(&self, event_id: Uuid) -> Result<()> {
        let mut inner = self.inner.write().await;
        if let Some(event) = inner.events.iter_mut().find(|e| e.id == event_id) {
            event.notified = true;
        }
        Ok(())
    }
}
