//! Chain explorer clients.
//!
//! Each client answers the same question, "which USDT transfers touch this
//! address?", and returns them oldest first. Upstream failures never escape a
//! [`ChainAdapter`]: they are logged and reported as an empty list so one
//! flaky explorer response cannot stall the cycle for other wallets.

pub mod etherscan;
pub mod tronscan;

pub use etherscan::EtherscanClient;
pub use tronscan::TronscanClient;

use crate::config::ExplorerConfig;
use crate::types::{ExplorerFamily, Network, RawTransfer};
use async_trait::async_trait;
use std::sync::Arc;

/// Fetches raw transfers for one address, ascending by occurrence time.
#[async_trait]
pub trait ChainAdapter: Send + Sync {
    async fn fetch(&self, network: Network, address: &str) -> Vec<RawTransfer>;
}

/// Routes each network to the client for its explorer family.
pub struct ExplorerRouter {
    etherscan: Arc<dyn ChainAdapter>,
    tronscan: Arc<dyn ChainAdapter>,
}

impl ExplorerRouter {
    pub fn new(etherscan: Arc<dyn ChainAdapter>, tronscan: Arc<dyn ChainAdapter>) -> Self {
        Self {
            etherscan,
            tronscan,
        }
    }

    /// Build the production router on a shared HTTP client.
    pub fn from_config(config: &ExplorerConfig, http_client: reqwest::Client) -> Self {
        Self::new(
            Arc::new(EtherscanClient::new(config, http_client.clone())),
            Arc::new(TronscanClient::new(config, http_client)),
        )
    }
}

#[async_trait]
impl ChainAdapter for ExplorerRouter {
    async fn fetch(&self, network: Network, address: &str) -> Vec<RawTransfer> {
        match network.family() {
            ExplorerFamily::Etherscan => self.etherscan.fetch(network, address).await,
            ExplorerFamily::Tronscan => self.tronscan.fetch(network, address).await,
        }
    }
}

/// Sort oldest first, keeping provider order for equal timestamps.
pub(crate) fn sort_ascending(transfers: &mut [RawTransfer]) {
    transfers.sort_by_key(|t| t.occurred_at);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::sync::Mutex;

    struct Recording {
        label: &'static str,
        calls: Mutex<Vec<Network>>,
    }

    #[async_trait]
    impl ChainAdapter for Recording {
        async fn fetch(&self, network: Network, _address: &str) -> Vec<RawTransfer> {
            self.calls.lock().unwrap().push(network);
            vec![RawTransfer {
                reference: self.label.to_string(),
                from: String::new(),
                to: String::new(),
                value: "0".to_string(),
                decimals: 6,
                occurred_at: Utc::now(),
                payload: serde_json::Value::Null,
            }]
        }
    }

    #[tokio::test]
    async fn test_router_dispatches_by_family() {
        let eth = Arc::new(Recording {
            label: "etherscan",
            calls: Mutex::new(Vec::new()),
        });
        let tron = Arc::new(Recording {
            label: "tronscan",
            calls: Mutex::new(Vec::new()),
        });
        let router = ExplorerRouter::new(eth.clone(), tron.clone());

        assert_eq!(router.fetch(Network::Ethereum, "a").await[0].reference, "etherscan");
        assert_eq!(router.fetch(Network::Bsc, "a").await[0].reference, "etherscan");
        assert_eq!(router.fetch(Network::Tron, "a").await[0].reference, "tronscan");

        assert_eq!(
            *eth.calls.lock().unwrap(),
            vec![Network::Ethereum, Network::Bsc]
        );
        assert_eq!(*tron.calls.lock().unwrap(), vec![Network::Tron]);
    }

    #[test]
    fn test_sort_is_stable() {
        let at = |secs| Utc.timestamp_opt(secs, 0).unwrap();
        let mk = |r: &str, secs| RawTransfer {
            reference: r.to_string(),
            from: String::new(),
            to: String::new(),
            value: "1".to_string(),
            decimals: 6,
            occurred_at: at(secs),
            payload: serde_json::Value::Null,
        };
        let mut transfers = vec![mk("c", 30), mk("a", 10), mk("b1", 20), mk("b2", 20)];
        sort_ascending(&mut transfers);
        let order: Vec<_> = transfers.iter().map(|t| t.reference.as_str()).collect();
        assert_eq!(order, vec!["a", "b1", "b2", "c"]);
    }
}
