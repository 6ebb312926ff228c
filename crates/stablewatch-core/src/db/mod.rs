//! Database access layer for PostgreSQL.

pub mod channels;
pub mod cursors;
pub mod events;
pub mod notifications;
pub mod rules;
pub mod wallets;

use crate::config::DatabaseConfig;
use crate::store::{DispatchStore, MonitorStore};
use crate::types::{
    AlertRule, Event, MonitoringState, Network, NewEvent, Notification, NotificationChannel,
    Wallet,
};
use crate::Result;
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::path::Path;
use uuid::Uuid;

use channels::ChannelRepository;
use cursors::CursorRepository;
use events::EventRepository;
use notifications::NotificationRepository;
use rules::RuleRepository;
use wallets::WalletRepository;

/// Create a PostgreSQL connection pool.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url)
        .await?;

    Ok(pool)
}

/// Run database migrations from the migrations directory.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    let migrator = sqlx::migrate::Migrator::new(Path::new("./migrations")).await?;
    migrator.run(pool).await?;
    Ok(())
}

/// PostgreSQL-backed store serving both workers.
pub struct PgStore {
    wallets: WalletRepository,
    cursors: CursorRepository,
    rules: RuleRepository,
    events: EventRepository,
    channels: ChannelRepository,
    notifications: NotificationRepository,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            wallets: WalletRepository::new(pool.clone()),
            cursors: CursorRepository::new(pool.clone()),
            rules: RuleRepository::new(pool.clone()),
            events: EventRepository::new(pool.clone()),
            channels: ChannelRepository::new(pool.clone()),
            notifications: NotificationRepository::new(pool),
        }
    }
}

#[async_trait]
impl MonitorStore for PgStore {
    async fn active_wallets(&self) -> Result<Vec<Wallet>> {
        self.wallets.get_active().await
    }

    async fn cursor(&self, wallet_id: Uuid, network: Network) -> Result<Option<MonitoringState>> {
        self.cursors.get(wallet_id, network).await
    }

    async fn advance_cursor(
        &self,
        wallet_id: Uuid,
        network: Network,
        tx_hash: &str,
    ) -> Result<()> {
        self.cursors.advance(wallet_id, network, tx_hash).await
    }

    async fn active_rules(&self, wallet_id: Uuid) -> Result<Vec<AlertRule>> {
        self.rules.get_active_for_wallet(wallet_id).await
    }

    async fn insert_event(&self, event: &NewEvent) -> Result<bool> {
        Ok(self.events.insert(event).await?.is_some())
    }
}

#[async_trait]
impl DispatchStore for PgStore {
    async fn unnotified_events(&self, limit: u32) -> Result<Vec<Event>> {
        self.events.get_unnotified(limit as i64).await
    }

    async fn wallet(&self, wallet_id: Uuid) -> Result<Option<Wallet>> {
        self.wallets.get(wallet_id).await
    }

    async fn eligible_channels(&self, user_id: Uuid) -> Result<Vec<NotificationChannel>> {
        self.channels.get_eligible_for_user(user_id).await
    }

    async fn delivered_channels(&self, event_id: Uuid) -> Result<Vec<Uuid>> {
        self.notifications.channel_ids_for_event(event_id).await
    }

    async fn insert_notification(&self, notification: &Notification) -> Result<()> {
        self.notifications.insert(notification).await
    }

    async fn mark_notified(&self, event_id: Uuid) -> Result<()> {
        self.events.mark_notified(event_id).await
    }
}
