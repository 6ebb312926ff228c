//! Tronscan client for TRC-20 token transfers.

use super::{sort_ascending, ChainAdapter};
use crate::config::ExplorerConfig;
use crate::types::{Network, RawTransfer};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::DateTime;
use serde::Deserialize;
use tracing::{debug, warn};

/// TRC-20 amounts are always reported with 6 decimals by this provider.
pub const TRC20_USDT_DECIMALS: u32 = 6;

pub struct TronscanClient {
    base_url: String,
    api_key: Option<String>,
    contract: String,
    page_limit: u32,
    http_client: reqwest::Client,
}

impl TronscanClient {
    pub fn new(config: &ExplorerConfig, http_client: reqwest::Client) -> Self {
        Self {
            base_url: config.tronscan_url.clone(),
            api_key: config.tronscan_api_key.clone(),
            contract: config.contracts.trc20.clone(),
            page_limit: config.tronscan_page_limit,
            http_client,
        }
    }

    /// Fetch the most recent USDT transfers touching `address`, oldest first.
    pub async fn get_token_transfers(&self, address: &str) -> Result<Vec<RawTransfer>> {
        let limit = self.page_limit.to_string();
        let mut request = self.http_client.get(&self.base_url).query(&[
            ("limit", limit.as_str()),
            ("start", "0"),
            ("contract_address", self.contract.as_str()),
            ("relatedAddress", address),
        ]);
        if let Some(key) = &self.api_key {
            request = request.header("TRON-PRO-API-KEY", key);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(Error::Api {
                message: format!("Tronscan request failed: {}", response.status()),
                status: Some(response.status().as_u16()),
            });
        }

        let body: serde_json::Value = response.json().await?;
        parse_response(body)
    }
}

#[async_trait]
impl ChainAdapter for TronscanClient {
    async fn fetch(&self, network: Network, address: &str) -> Vec<RawTransfer> {
        match self.get_token_transfers(address).await {
            Ok(transfers) => {
                debug!(%network, address, count = transfers.len(), "Fetched token transfers");
                transfers
            }
            Err(e) => {
                warn!(%network, address, error = %e, "Tronscan fetch failed");
                Vec::new()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct TransfersResponse {
    #[serde(default)]
    token_transfers: Vec<serde_json::Value>,
}

/// One `token_transfers` record.
#[derive(Debug, Clone, Deserialize)]
pub struct TronscanTransfer {
    pub transaction_id: String,
    pub from_address: String,
    pub to_address: String,
    pub quant: String,
    /// Epoch milliseconds.
    pub block_ts: i64,
}

impl TronscanTransfer {
    fn into_raw(self, payload: serde_json::Value) -> Result<RawTransfer> {
        let occurred_at =
            DateTime::from_timestamp_millis(self.block_ts).ok_or_else(|| Error::InvalidTransfer {
                reference: self.transaction_id.clone(),
                reason: format!("block_ts {} out of range", self.block_ts),
            })?;

        Ok(RawTransfer {
            reference: self.transaction_id,
            from: self.from_address,
            to: self.to_address,
            value: self.quant,
            decimals: TRC20_USDT_DECIMALS,
            occurred_at,
            payload,
        })
    }
}

/// Parse a transfers response body into ascending transfers.
pub fn parse_response(body: serde_json::Value) -> Result<Vec<RawTransfer>> {
    let response: TransfersResponse = serde_json::from_value(body)?;

    let mut transfers = response
        .token_transfers
        .into_iter()
        .map(|record| {
            let transfer: TronscanTransfer = serde_json::from_value(record.clone())?;
            transfer.into_raw(record)
        })
        .collect::<Result<Vec<_>>>()?;

    sort_ascending(&mut transfers);
    Ok(transfers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn record(id: &str, block_ts: i64) -> serde_json::Value {
        json!({
            "transaction_id": id,
            "block_ts": block_ts,
            "from_address": "TFromAddressxxxxxxxxxxxxxxxxxxxxxx",
            "to_address": "TToAddressxxxxxxxxxxxxxxxxxxxxxxxx",
            "block": 60000000,
            "quant": "2500000",
            "confirmed": true,
            "tokenInfo": { "tokenAbbr": "USDT", "tokenDecimal": 6 }
        })
    }

    #[test]
    fn test_parse_newest_first_feed_into_ascending() {
        let body = json!({
            "total": 2,
            "token_transfers": [record("t2", 1_700_000_100_000), record("t1", 1_700_000_000_000)]
        });

        let transfers = parse_response(body).unwrap();
        assert_eq!(transfers[0].reference, "t1");
        assert_eq!(transfers[1].reference, "t2");
        assert_eq!(transfers[0].decimals, TRC20_USDT_DECIMALS);
        assert_eq!(transfers[0].value, "2500000");
        assert_eq!(transfers[0].occurred_at.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_missing_key_is_empty() {
        assert!(parse_response(json!({ "total": 0 })).unwrap().is_empty());
    }

    #[test]
    fn test_millis_and_seconds_normalize_to_same_instant() {
        let tron = parse_response(json!({ "token_transfers": [record("t", 1_700_000_000_000)] }))
            .unwrap();
        let eth = crate::api::etherscan::parse_response(json!({
            "result": [{
                "hash": "0x1",
                "from": "0xa",
                "to": "0xb",
                "value": "1",
                "tokenDecimal": "6",
                "timeStamp": "1700000000"
            }]
        }))
        .unwrap();
        assert_eq!(tron[0].occurred_at, eth[0].occurred_at);
    }

    #[test]
    fn test_malformed_record_is_an_error() {
        let body = json!({ "token_transfers": [{ "transaction_id": "t" }] });
        tokio_test::assert_err!(parse_response(body));
    }

    const PATH: &str = "/api/token_trc20/transfers";

    fn client(server_url: &str, api_key: Option<&str>) -> TronscanClient {
        let config = ExplorerConfig {
            tronscan_url: format!("{}{}", server_url, PATH),
            tronscan_api_key: api_key.map(String::from),
            tronscan_page_limit: 20,
            ..ExplorerConfig::default()
        };
        TronscanClient::new(&config, reqwest::Client::new())
    }

    #[tokio::test]
    async fn test_fetch_sends_key_and_query() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", PATH)
            .match_header("TRON-PRO-API-KEY", "tron-key")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("limit".into(), "20".into()),
                Matcher::UrlEncoded("start".into(), "0".into()),
                Matcher::UrlEncoded(
                    "contract_address".into(),
                    "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t".into(),
                ),
                Matcher::UrlEncoded("relatedAddress".into(), "TWallet".into()),
            ]))
            .with_status(200)
            .with_body(json!({ "token_transfers": [record("t1", 1_700_000_000_000)] }).to_string())
            .create_async()
            .await;

        let transfers = client(&server.url(), Some("tron-key"))
            .fetch(Network::Tron, "TWallet")
            .await;
        assert_eq!(transfers.len(), 1);
        assert_eq!(transfers[0].reference, "t1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_without_key_omits_header() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", PATH)
            .match_header("TRON-PRO-API-KEY", Matcher::Missing)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(json!({ "token_transfers": [] }).to_string())
            .create_async()
            .await;

        assert!(client(&server.url(), None)
            .fetch(Network::Tron, "TWallet")
            .await
            .is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_swallows_upstream_failures() {
        let cases = [
            (500, "internal error".to_string()),
            (200, "not json".to_string()),
            (429, json!({ "Error": "request rate exceeded" }).to_string()),
            (
                200,
                json!({ "token_transfers": [{ "transaction_id": "broken" }] }).to_string(),
            ),
        ];

        for (status, body) in cases {
            let mut server = mockito::Server::new_async().await;
            let _mock = server
                .mock("GET", PATH)
                .match_query(Matcher::Any)
                .with_status(status)
                .with_body(body)
                .create_async()
                .await;

            let transfers = client(&server.url(), None).fetch(Network::Tron, "TWallet").await;
            assert!(transfers.is_empty(), "status {} should yield nothing", status);
        }
    }
}
