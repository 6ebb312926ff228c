//! Fan-out of unnotified events to their owner's channels.
//!
//! Every eligible channel gets exactly one notification row per event, and
//! the event is marked notified only after all rows are durable. A store
//! failure leaves the event unnotified for the next cycle; rows that already
//! exist are skipped on that retry.

use crate::format::{format_alert, AlertMessage};
use crate::senders::SenderSet;
use serde::Serialize;
use stablewatch_core::config::DispatcherSettings;
use stablewatch_core::types::{Event, Notification, NotificationChannel};
use stablewatch_core::{DispatchStore, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// What happened to one event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EventOutcome {
    pub sent: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Totals for one dispatcher cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchStats {
    pub events: usize,
    pub failed_events: usize,
    pub sent: usize,
    pub failed: usize,
}

pub struct NotificationDispatcher {
    store: Arc<dyn DispatchStore>,
    senders: SenderSet,
    settings: DispatcherSettings,
}

impl NotificationDispatcher {
    pub fn new(store: Arc<dyn DispatchStore>, senders: SenderSet, settings: DispatcherSettings) -> Self {
        Self {
            store,
            senders,
            settings,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.settings.poll_interval_ms)
    }

    /// Dispatch one bounded batch of unnotified events, oldest first.
    pub async fn run_cycle(&self) -> Result<DispatchStats> {
        let events = self.store.unnotified_events(self.settings.batch_size).await?;
        let mut stats = DispatchStats {
            events: events.len(),
            ..Default::default()
        };

        for event in &events {
            match self.dispatch_event(event).await {
                Ok(outcome) => {
                    stats.sent += outcome.sent;
                    stats.failed += outcome.failed;
                }
                Err(e) => {
                    stats.failed_events += 1;
                    error!(
                        event_id = %event.id,
                        error = %e,
                        "Event dispatch failed; retrying next cycle"
                    );
                }
            }
        }

        Ok(stats)
    }

    /// Deliver one event to every eligible channel, then mark it notified.
    pub async fn dispatch_event(&self, event: &Event) -> Result<EventOutcome> {
        let mut outcome = EventOutcome::default();

        let Some(wallet) = self.store.wallet(event.wallet_id).await? else {
            warn!(
                event_id = %event.id,
                wallet_id = %event.wallet_id,
                "Wallet no longer exists; marking event notified"
            );
            self.store.mark_notified(event.id).await?;
            return Ok(outcome);
        };

        let channels = self.store.eligible_channels(wallet.user_id).await?;
        if channels.is_empty() {
            debug!(event_id = %event.id, "No eligible channels");
            self.store.mark_notified(event.id).await?;
            return Ok(outcome);
        }

        let delivered = self.store.delivered_channels(event.id).await?;
        let message = format_alert(event, &wallet);

        for channel in &channels {
            if delivered.contains(&channel.id) {
                outcome.skipped += 1;
                continue;
            }

            let notification = self.attempt(event, channel, &message).await;
            self.store.insert_notification(&notification).await?;

            if notification.error_message.is_none() {
                outcome.sent += 1;
            } else {
                outcome.failed += 1;
            }
        }

        self.store.mark_notified(event.id).await?;
        Ok(outcome)
    }

    async fn attempt(
        &self,
        event: &Event,
        channel: &NotificationChannel,
        message: &AlertMessage,
    ) -> Notification {
        let Some(destination) = channel.destination() else {
            let field = channel.kind.destination_field();
            warn!(
                channel_id = %channel.id,
                kind = %channel.kind,
                "Channel has no destination"
            );
            return Notification::failed(
                event.id,
                channel.id,
                format!("missing {} in channel config", field),
            );
        };

        match self
            .senders
            .for_kind(channel.kind)
            .deliver(destination, message)
            .await
        {
            Ok(()) => {
                info!(
                    event_id = %event.id,
                    kind = %channel.kind,
                    "{} notification sent ({} {} {})",
                    channel.kind,
                    event.direction,
                    event.amount.round_dp(2),
                    event.token
                );
                Notification::sent(event.id, channel.id)
            }
            Err(e) => {
                warn!(
                    event_id = %event.id,
                    channel_id = %channel.id,
                    kind = %channel.kind,
                    error = %e,
                    "Delivery failed"
                );
                Notification::failed(event.id, channel.id, e.to_string())
            }
        }
    }
}
