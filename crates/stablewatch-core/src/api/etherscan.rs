//! Etherscan v2 multichain client for ERC-20 / BEP-20 token transfers.

use super::{sort_ascending, ChainAdapter};
use crate::config::ExplorerConfig;
use crate::types::{Network, RawTransfer};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::DateTime;
use serde::Deserialize;
use tracing::{debug, warn};

/// Account-API client shared by every EVM network.
pub struct EtherscanClient {
    base_url: String,
    api_key: String,
    contracts: crate::config::TokenContracts,
    http_client: reqwest::Client,
}

impl EtherscanClient {
    pub fn new(config: &ExplorerConfig, http_client: reqwest::Client) -> Self {
        Self {
            base_url: config.etherscan_url.clone(),
            api_key: config.etherscan_api_key.clone(),
            contracts: config.contracts.clone(),
            http_client,
        }
    }

    /// Fetch USDT transfers touching `address`, oldest first.
    pub async fn get_token_transfers(
        &self,
        network: Network,
        address: &str,
    ) -> Result<Vec<RawTransfer>> {
        let chain_id = network.chain_id().ok_or_else(|| Error::Api {
            message: format!("{} is not served by Etherscan", network),
            status: None,
        })?;
        let chain_id = chain_id.to_string();

        let response = self
            .http_client
            .get(&self.base_url)
            .query(&[
                ("chainid", chain_id.as_str()),
                ("module", "account"),
                ("action", "tokentx"),
                ("contractaddress", self.contracts.for_network(network)),
                ("address", address),
                ("sort", "asc"),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Api {
                message: format!("Etherscan request failed: {}", response.status()),
                status: Some(response.status().as_u16()),
            });
        }

        let body: serde_json::Value = response.json().await?;
        parse_response(body)
    }
}

#[async_trait]
impl ChainAdapter for EtherscanClient {
    async fn fetch(&self, network: Network, address: &str) -> Vec<RawTransfer> {
        match self.get_token_transfers(network, address).await {
            Ok(transfers) => {
                debug!(%network, address, count = transfers.len(), "Fetched token transfers");
                transfers
            }
            Err(e) => {
                warn!(%network, address, error = %e, "Etherscan fetch failed");
                Vec::new()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenTxResponse {
    #[serde(default)]
    message: Option<String>,
    result: serde_json::Value,
}

/// One `tokentx` record.
#[derive(Debug, Clone, Deserialize)]
pub struct EtherscanTransfer {
    pub hash: String,
    pub from: String,
    pub to: String,
    pub value: String,
    #[serde(rename = "tokenDecimal")]
    pub token_decimal: String,
    /// Epoch seconds, as a decimal string.
    #[serde(rename = "timeStamp")]
    pub time_stamp: String,
}

impl EtherscanTransfer {
    fn into_raw(self, payload: serde_json::Value) -> Result<RawTransfer> {
        let invalid = |reason: String| Error::InvalidTransfer {
            reference: self.hash.clone(),
            reason,
        };

        let decimals: u32 = self
            .token_decimal
            .trim()
            .parse()
            .map_err(|_| invalid(format!("bad tokenDecimal {:?}", self.token_decimal)))?;
        let secs: i64 = self
            .time_stamp
            .trim()
            .parse()
            .map_err(|_| invalid(format!("bad timeStamp {:?}", self.time_stamp)))?;
        let occurred_at = DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| invalid(format!("timeStamp {} out of range", secs)))?;

        Ok(RawTransfer {
            reference: self.hash,
            from: self.from,
            to: self.to,
            value: self.value,
            decimals,
            occurred_at,
            payload,
        })
    }
}

/// Parse a `tokentx` response body into ascending transfers.
///
/// The provider signals errors by putting a string in `result`.
pub fn parse_response(body: serde_json::Value) -> Result<Vec<RawTransfer>> {
    let response: TokenTxResponse = serde_json::from_value(body)?;

    let records = match response.result {
        serde_json::Value::Array(records) => records,
        other => {
            return Err(Error::Api {
                message: format!(
                    "Etherscan error: {} ({})",
                    response.message.unwrap_or_default(),
                    other
                ),
                status: None,
            })
        }
    };

    let mut transfers = records
        .into_iter()
        .map(|record| {
            let transfer: EtherscanTransfer = serde_json::from_value(record.clone())?;
            transfer.into_raw(record)
        })
        .collect::<Result<Vec<_>>>()?;

    sort_ascending(&mut transfers);
    Ok(transfers)
}
