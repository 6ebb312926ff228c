//! The monitor cycle: poll every active wallet once, in order.
//!
//! Wallets are processed strictly one after another so no two steps ever
//! touch the same cursor concurrently. A store failure aborts only the
//! current wallet's step; the cursor is advanced only after the matching
//! event insert succeeded, so the next cycle retries from the last durable
//! point without losing or duplicating events.

use crate::classifier::classify;
use crate::detector::{detect, Detection};
use crate::rules::qualifies;
use serde::Serialize;
use stablewatch_core::api::ChainAdapter;
use stablewatch_core::config::MonitorSettings;
use stablewatch_core::types::{NewEvent, Wallet, USDT};
use stablewatch_core::{MonitorStore, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// What one wallet step did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WalletOutcome {
    pub new_transfers: usize,
    pub events_created: usize,
    pub cursor_writes: usize,
}

/// Totals for one monitor cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CycleStats {
    pub wallets: usize,
    pub failed_wallets: usize,
    pub new_transfers: usize,
    pub events_created: usize,
    pub cursor_writes: usize,
}

impl CycleStats {
    fn absorb(&mut self, outcome: WalletOutcome) {
        self.new_transfers += outcome.new_transfers;
        self.events_created += outcome.events_created;
        self.cursor_writes += outcome.cursor_writes;
    }
}

/// Detects new transfers for watched wallets and records qualifying events.
pub struct TransactionMonitor {
    store: Arc<dyn MonitorStore>,
    adapter: Arc<dyn ChainAdapter>,
    settings: MonitorSettings,
}

impl TransactionMonitor {
    pub fn new(
        store: Arc<dyn MonitorStore>,
        adapter: Arc<dyn ChainAdapter>,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            store,
            adapter,
            settings,
        }
    }

    /// Pause between cycles.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.settings.poll_interval_ms)
    }

    /// Run one full pass over the active wallets.
    ///
    /// Only a failure to list wallets is returned; per-wallet failures are
    /// logged and counted.
    pub async fn run_cycle(&self) -> Result<CycleStats> {
        let wallets = self.store.active_wallets().await?;
        let mut stats = CycleStats {
            wallets: wallets.len(),
            ..Default::default()
        };

        let wallet_delay = Duration::from_millis(self.settings.wallet_delay_ms);

        for wallet in &wallets {
            match self.process_wallet(wallet).await {
                Ok(outcome) => stats.absorb(outcome),
                Err(e) => {
                    stats.failed_wallets += 1;
                    error!(
                        wallet_id = %wallet.id,
                        network = %wallet.network,
                        error = %e,
                        "Wallet step failed; retrying next cycle"
                    );
                }
            }

            if !wallet_delay.is_zero() {
                tokio::time::sleep(wallet_delay).await;
            }
        }

        Ok(stats)
    }

    /// Fetch, detect, classify, evaluate, and persist for one wallet.
    pub async fn process_wallet(&self, wallet: &Wallet) -> Result<WalletOutcome> {
        let mut outcome = WalletOutcome::default();

        let cursor = self.store.cursor(wallet.id, wallet.network).await?;
        let transfers = self.adapter.fetch(wallet.network, &wallet.address).await;

        let new = match detect(cursor.as_ref(), &transfers) {
            Detection::Empty => return Ok(outcome),
            Detection::Seed { reference } => {
                self.store
                    .advance_cursor(wallet.id, wallet.network, reference)
                    .await?;
                outcome.cursor_writes += 1;
                info!(
                    wallet_id = %wallet.id,
                    network = %wallet.network,
                    tx_hash = reference,
                    "Initialized wallet cursor"
                );
                return Ok(outcome);
            }
            Detection::Stale { reference } => {
                warn!(
                    wallet_id = %wallet.id,
                    network = %wallet.network,
                    cursor = reference,
                    fetched = transfers.len(),
                    "Cursor not found in explorer window; skipping batch"
                );
                return Ok(outcome);
            }
            Detection::New(new) => new,
        };

        if new.is_empty() {
            return Ok(outcome);
        }
        outcome.new_transfers = new.len();

        let rules = self.store.active_rules(wallet.id).await?;

        for transfer in new {
            if let Some(classified) = classify(transfer, wallet) {
                if qualifies(&rules, &classified) {
                    let event = NewEvent {
                        wallet_id: wallet.id,
                        tx_hash: transfer.reference.clone(),
                        direction: classified.direction,
                        amount: classified.amount,
                        token: USDT.to_string(),
                        network: wallet.network,
                        occurred_at: transfer.occurred_at,
                        raw: transfer.payload.clone(),
                    };

                    if self.store.insert_event(&event).await? {
                        outcome.events_created += 1;
                        info!(
                            wallet_id = %wallet.id,
                            network = %wallet.network,
                            direction = %classified.direction,
                            amount = %classified.amount.round_dp(2),
                            "{} {:.2} {} detected",
                            classified.direction,
                            classified.amount,
                            USDT
                        );
                    } else {
                        debug!(
                            wallet_id = %wallet.id,
                            tx_hash = %transfer.reference,
                            "Event already recorded"
                        );
                    }
                }
            }

            self.store
                .advance_cursor(wallet.id, wallet.network, &transfer.reference)
                .await?;
            outcome.cursor_writes += 1;
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use stablewatch_core::types::{AlertRule, Direction, Network, RawTransfer, RuleDirection};
    use stablewatch_core::MemoryStore;
    use std::sync::Mutex;
    use uuid::Uuid;

    const ADDR: &str = "0x00000000000000000000000000000000000000aa";
    const PEER: &str = "0x00000000000000000000000000000000000000bb";

    /// Adapter returning whatever the test last put in it.
    #[derive(Default)]
    struct StubAdapter {
        transfers: Mutex<Vec<RawTransfer>>,
    }

    impl StubAdapter {
        fn set(&self, transfers: Vec<RawTransfer>) {
            *self.transfers.lock().unwrap() = transfers;
        }
    }

    #[async_trait]
    impl ChainAdapter for StubAdapter {
        async fn fetch(&self, _network: Network, _address: &str) -> Vec<RawTransfer> {
            self.transfers.lock().unwrap().clone()
        }
    }

    fn incoming(reference: &str, raw_value: &str, seq: i64) -> RawTransfer {
        RawTransfer {
            reference: reference.to_string(),
            from: PEER.to_string(),
            to: ADDR.to_string(),
            value: raw_value.to_string(),
            decimals: 6,
            occurred_at: Utc.timestamp_opt(1_700_000_000 + seq, 0).unwrap(),
            payload: serde_json::json!({ "hash": reference }),
        }
    }

    fn outgoing(reference: &str, raw_value: &str, seq: i64) -> RawTransfer {
        RawTransfer {
            from: ADDR.to_string(),
            to: PEER.to_string(),
            ..incoming(reference, raw_value, seq)
        }
    }

    /// Delegates to a `MemoryStore`, failing event inserts for one wallet.
    struct FailingInsertsFor {
        inner: MemoryStore,
        wallet_id: Uuid,
    }

    #[async_trait]
    impl MonitorStore for FailingInsertsFor {
        async fn active_wallets(&self) -> Result<Vec<Wallet>> {
            self.inner.active_wallets().await
        }

        async fn cursor(
            &self,
            wallet_id: Uuid,
            network: Network,
        ) -> Result<Option<stablewatch_core::types::MonitoringState>> {
            self.inner.cursor(wallet_id, network).await
        }

        async fn advance_cursor(
            &self,
            wallet_id: Uuid,
            network: Network,
            tx_hash: &str,
        ) -> Result<()> {
            self.inner.advance_cursor(wallet_id, network, tx_hash).await
        }

        async fn active_rules(&self, wallet_id: Uuid) -> Result<Vec<AlertRule>> {
            self.inner.active_rules(wallet_id).await
        }

        async fn insert_event(&self, event: &NewEvent) -> Result<bool> {
            if event.wallet_id == self.wallet_id {
                return Err(stablewatch_core::Error::Database(sqlx_protocol_error()));
            }
            self.inner.insert_event(event).await
        }
    }

    fn sqlx_protocol_error() -> sqlx::Error {
        sqlx::Error::Protocol("connection reset".to_string())
    }

    struct Harness {
        store: MemoryStore,
        adapter: Arc<StubAdapter>,
        monitor: TransactionMonitor,
        wallet: Wallet,
    }

    async fn harness(rules: Vec<(RuleDirection, Option<i64>)>) -> Harness {
        let store = MemoryStore::new();
        let wallet = Wallet {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            network: Network::Ethereum,
            address: ADDR.to_uppercase().replace("0X", "0x"),
            label: None,
            is_active: true,
        };
        store.add_wallet(wallet.clone()).await;
        for (direction, min) in rules {
            store
                .add_rule(AlertRule {
                    id: Uuid::new_v4(),
                    wallet_id: wallet.id,
                    direction,
                    min_amount: min.map(|m| Decimal::new(m, 0)),
                    is_active: true,
                })
                .await;
        }

        let adapter = Arc::new(StubAdapter::default());
        let monitor = TransactionMonitor::new(
            Arc::new(store.clone()),
            adapter.clone(),
            MonitorSettings {
                poll_interval_ms: 0,
                wallet_delay_ms: 0,
            },
        );

        Harness {
            store,
            adapter,
            monitor,
            wallet,
        }
    }

    /// Seed the cursor at `reference` through a first poll.
    async fn initialize_at(h: &Harness, reference: &str) {
        h.adapter.set(vec![incoming(reference, "1", 0)]);
        h.monitor.run_cycle().await.unwrap();
    }

    #[tokio::test]
    async fn test_first_poll_initializes_without_events() {
        let h = harness(vec![(RuleDirection::Both, None)]).await;
        h.adapter.set(vec![
            incoming("0x1", "1000000", 1),
            incoming("0x2", "2000000", 2),
        ]);

        let stats = h.monitor.run_cycle().await.unwrap();

        assert_eq!(stats.events_created, 0);
        assert_eq!(stats.cursor_writes, 1);
        assert!(h.store.events().await.is_empty());
        let cursor = h
            .store
            .cursor(h.wallet.id, Network::Ethereum)
            .await
            .unwrap()
            .unwrap();
        assert!(cursor.initialized);
        assert_eq!(cursor.reference(), Some("0x2"));
    }

    #[tokio::test]
    async fn test_empty_first_poll_stays_uninitialized() {
        let h = harness(vec![(RuleDirection::Both, None)]).await;
        h.monitor.run_cycle().await.unwrap();
        assert!(h
            .store
            .cursor(h.wallet.id, Network::Ethereum)
            .await
            .unwrap()
            .is_none());
        assert_eq!(h.store.cursor_writes().await, 0);
    }

    #[tokio::test]
    async fn test_one_dollar_incoming_creates_event_and_advances() {
        let h = harness(vec![(RuleDirection::Both, Some(0))]).await;
        initialize_at(&h, "0xseed").await;

        h.adapter.set(vec![
            incoming("0xseed", "1", 0),
            incoming("0xnew", "1000000", 1),
        ]);
        h.monitor.run_cycle().await.unwrap();

        let events = h.store.events().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].direction, Direction::Incoming);
        assert_eq!(events[0].amount, Decimal::ONE);
        assert_eq!(format!("{:.2}", events[0].amount), "1.00");
        assert_eq!(events[0].token, "USDT");
        assert_eq!(events[0].tx_hash, "0xnew");
        assert!(!events[0].notified);

        let cursor = h
            .store
            .cursor(h.wallet.id, Network::Ethereum)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cursor.reference(), Some("0xnew"));
    }

    #[tokio::test]
    async fn test_n_new_transfers_create_n_events_in_order() {
        let h = harness(vec![(RuleDirection::Both, None)]).await;
        initialize_at(&h, "0xseed").await;

        let mut feed = vec![incoming("0xseed", "1", 0)];
        for i in 1..=5 {
            feed.push(incoming(&format!("0x{i}"), "1000000", i));
        }
        h.adapter.set(feed);

        let stats = h.monitor.run_cycle().await.unwrap();
        assert_eq!(stats.events_created, 5);
        // One write per new transfer
        assert_eq!(stats.cursor_writes, 5);

        let hashes: Vec<_> = h.store.events().await.into_iter().map(|e| e.tx_hash).collect();
        assert_eq!(hashes, vec!["0x1", "0x2", "0x3", "0x4", "0x5"]);
    }

    #[tokio::test]
    async fn test_incoming_minimum_rule() {
        let h = harness(vec![(RuleDirection::Incoming, Some(100))]).await;
        initialize_at(&h, "0xseed").await;

        h.adapter.set(vec![
            incoming("0xseed", "1", 0),
            incoming("0xsmall", "50000000", 1),
            outgoing("0xout", "150000000", 2),
            incoming("0xbig", "150000000", 3),
        ]);
        let stats = h.monitor.run_cycle().await.unwrap();

        let events = h.store.events().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].tx_hash, "0xbig");
        assert_eq!(events[0].amount, Decimal::new(150, 0));
        // Non-qualifying transfers still move the cursor
        assert_eq!(stats.cursor_writes, 3);
    }

    #[tokio::test]
    async fn test_rerun_on_unchanged_feed_is_a_no_op() {
        let h = harness(vec![(RuleDirection::Both, None)]).await;
        initialize_at(&h, "0xseed").await;
        h.adapter.set(vec![incoming("0xseed", "1", 0), incoming("0xa", "5", 1)]);
        h.monitor.run_cycle().await.unwrap();

        let events_before = h.store.events().await.len();
        let writes_before = h.store.cursor_writes().await;

        let stats = h.monitor.run_cycle().await.unwrap();

        assert_eq!(stats.events_created, 0);
        assert_eq!(stats.cursor_writes, 0);
        assert_eq!(h.store.events().await.len(), events_before);
        assert_eq!(h.store.cursor_writes().await, writes_before);
    }

    #[tokio::test]
    async fn test_multi_log_transaction_is_idempotent() {
        let h = harness(vec![(RuleDirection::Both, None)]).await;
        initialize_at(&h, "0xseed").await;
        h.adapter.set(vec![
            incoming("0xseed", "1", 0),
            incoming("0xmulti", "1000000", 1),
            incoming("0xmulti", "2000000", 1),
        ]);

        h.monitor.run_cycle().await.unwrap();
        assert_eq!(h.store.events().await.len(), 1);
        let writes_before = h.store.cursor_writes().await;

        for _ in 0..3 {
            let stats = h.monitor.run_cycle().await.unwrap();
            assert_eq!(stats.new_transfers, 0);
            assert_eq!(stats.cursor_writes, 0);
        }
        assert_eq!(h.store.cursor_writes().await, writes_before);
        assert_eq!(h.store.events().await.len(), 1);
    }

    #[tokio::test]
    async fn test_stale_cursor_skips_batch() {
        let h = harness(vec![(RuleDirection::Both, None)]).await;
        initialize_at(&h, "0xpruned").await;
        let writes_before = h.store.cursor_writes().await;

        h.adapter.set(vec![incoming("0xa", "5", 1), incoming("0xb", "5", 2)]);
        let stats = h.monitor.run_cycle().await.unwrap();

        assert_eq!(stats.events_created, 0);
        assert!(h.store.events().await.is_empty());
        assert_eq!(h.store.cursor_writes().await, writes_before);
    }

    #[tokio::test]
    async fn test_no_active_rules_never_alerts_but_advances() {
        let h = harness(vec![]).await;
        initialize_at(&h, "0xseed").await;
        h.adapter.set(vec![incoming("0xseed", "1", 0), incoming("0xa", "999000000", 1)]);

        let stats = h.monitor.run_cycle().await.unwrap();
        assert!(h.store.events().await.is_empty());
        assert_eq!(stats.cursor_writes, 1);
    }

    #[tokio::test]
    async fn test_failed_insert_keeps_cursor_and_retries() {
        let h = harness(vec![(RuleDirection::Both, None)]).await;
        initialize_at(&h, "0xseed").await;
        h.adapter.set(vec![incoming("0xseed", "1", 0), incoming("0xa", "5", 1)]);

        h.store.set_fail_event_inserts(true).await;
        let stats = h.monitor.run_cycle().await.unwrap();
        assert_eq!(stats.failed_wallets, 1);
        let cursor = h
            .store
            .cursor(h.wallet.id, Network::Ethereum)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cursor.reference(), Some("0xseed"));

        h.store.set_fail_event_inserts(false).await;
        let stats = h.monitor.run_cycle().await.unwrap();
        assert_eq!(stats.failed_wallets, 0);
        assert_eq!(stats.events_created, 1);
        assert_eq!(h.store.events().await.len(), 1);
    }

    #[tokio::test]
    async fn test_failing_wallet_does_not_block_the_next() {
        let h = harness(vec![(RuleDirection::Both, None)]).await;
        let mut second = h.wallet.clone();
        second.id = Uuid::new_v4();
        h.store.add_wallet(second.clone()).await;
        h.store
            .add_rule(AlertRule {
                id: Uuid::new_v4(),
                wallet_id: second.id,
                direction: RuleDirection::Both,
                min_amount: None,
                is_active: true,
            })
            .await;

        // Seed both cursors
        initialize_at(&h, "0xseed").await;

        let monitor = TransactionMonitor::new(
            Arc::new(FailingInsertsFor {
                inner: h.store.clone(),
                wallet_id: h.wallet.id,
            }),
            h.adapter.clone(),
            MonitorSettings {
                poll_interval_ms: 0,
                wallet_delay_ms: 0,
            },
        );
        h.adapter.set(vec![incoming("0xseed", "1", 0), incoming("0xa", "5000000", 1)]);

        let stats = monitor.run_cycle().await.unwrap();
        assert_eq!(stats.wallets, 2);
        assert_eq!(stats.failed_wallets, 1);
        assert_eq!(stats.events_created, 1);

        let events = h.store.events().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].wallet_id, second.id);

        let failed = h
            .store
            .cursor(h.wallet.id, Network::Ethereum)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(failed.reference(), Some("0xseed"));
        let advanced = h
            .store
            .cursor(second.id, Network::Ethereum)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(advanced.reference(), Some("0xa"));
    }

    #[tokio::test]
    async fn test_unrelated_transfers_advance_without_events() {
        let h = harness(vec![(RuleDirection::Both, None)]).await;
        initialize_at(&h, "0xseed").await;
        let unrelated = RawTransfer {
            from: PEER.to_string(),
            to: PEER.to_string(),
            ..incoming("0xother", "5", 1)
        };
        h.adapter.set(vec![incoming("0xseed", "1", 0), unrelated]);

        let stats = h.monitor.run_cycle().await.unwrap();
        assert_eq!(stats.events_created, 0);
        assert_eq!(stats.cursor_writes, 1);
    }

    #[tokio::test]
    async fn test_inactive_wallets_are_not_polled() {
        let h = harness(vec![(RuleDirection::Both, None)]).await;
        let mut idle = h.wallet.clone();
        idle.id = Uuid::new_v4();
        idle.is_active = false;
        h.store.add_wallet(idle).await;

        let stats = h.monitor.run_cycle().await.unwrap();
        assert_eq!(stats.wallets, 1);
    }
}
