//! Configuration management for the Stablewatch workers.
//!
//! Everything is resolved once at process start into a [`Config`] value that
//! is then handed to each component constructor.

use crate::types::Network;
use crate::{Error, Result};
use serde::Deserialize;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub explorers: ExplorerConfig,
    pub http: HttpConfig,
    pub monitor: MonitorSettings,
    pub dispatcher: DispatcherSettings,
    pub alerts: AlertsConfig,
    pub health_file: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Chain explorer endpoints, credentials, and token contracts.
#[derive(Debug, Clone, Deserialize)]
pub struct ExplorerConfig {
    pub etherscan_url: String,
    pub etherscan_api_key: String,
    pub tronscan_url: String,
    pub tronscan_api_key: Option<String>,
    /// Transfers requested per Tronscan poll (provider window).
    pub tronscan_page_limit: u32,
    pub contracts: TokenContracts,
}

/// USDT contract address per network.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenContracts {
    pub erc20: String,
    pub bep20: String,
    pub trc20: String,
}

impl TokenContracts {
    pub fn for_network(&self, network: Network) -> &str {
        match network {
            Network::Ethereum => &self.erc20,
            Network::Bsc => &self.bep20,
            Network::Tron => &self.trc20,
        }
    }
}

impl Default for TokenContracts {
    fn default() -> Self {
        Self {
            erc20: "0xdac17f958d2ee523a2206206994597c13d831ec7".to_string(),
            bep20: "0x55d398326f99059ff775485246999027b3197955".to_string(),
            trc20: "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t".to_string(),
        }
    }
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            etherscan_url: "https://api.etherscan.io/v2/api".to_string(),
            etherscan_api_key: String::new(),
            tronscan_url: "https://apilist.tronscanapi.com/api/token_trc20/transfers".to_string(),
            tronscan_api_key: None,
            tronscan_page_limit: 20,
            contracts: TokenContracts::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

impl HttpConfig {
    /// Build the shared HTTP client with an explicit request timeout.
    pub fn build_client(&self) -> Result<reqwest::Client> {
        Ok(reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .user_agent(concat!("stablewatch/", env!("CARGO_PKG_VERSION")))
            .build()?)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 10 }
    }
}

/// Monitor loop cadence.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorSettings {
    /// Pause between monitor cycles.
    pub poll_interval_ms: u64,
    /// Pause after each wallet, to stay under explorer rate limits.
    pub wallet_delay_ms: u64,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 30_000,
            wallet_delay_ms: 1_000,
        }
    }
}

/// Dispatcher loop cadence.
#[derive(Debug, Clone, Deserialize)]
pub struct DispatcherSettings {
    pub poll_interval_ms: u64,
    /// Unnotified events selected per cycle.
    pub batch_size: u32,
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 5_000,
            batch_size: 50,
        }
    }
}

/// Outbound delivery credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct AlertsConfig {
    pub telegram_bot_token: Option<String>,
    pub telegram_api_url: String,
    pub resend_api_key: Option<String>,
    pub resend_api_url: String,
    pub email_from: String,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            telegram_bot_token: None,
            telegram_api_url: "https://api.telegram.org".to_string(),
            resend_api_key: None,
            resend_api_url: "https://api.resend.com".to_string(),
            email_from: "Stablewatch <alerts@stablewatch.app>".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    #[allow(clippy::result_large_err)]
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let explorer_defaults = ExplorerConfig::default();
        let alert_defaults = AlertsConfig::default();
        let monitor_defaults = MonitorSettings::default();
        let dispatcher_defaults = DispatcherSettings::default();

        Ok(Self {
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").map_err(|_| Error::Config {
                    message: "DATABASE_URL environment variable not set".to_string(),
                })?,
                max_connections: parse_env("DATABASE_MAX_CONNECTIONS", 5),
            },
            explorers: ExplorerConfig {
                etherscan_url: env::var("ETHERSCAN_API_URL")
                    .unwrap_or(explorer_defaults.etherscan_url),
                etherscan_api_key: env::var("ETHERSCAN_API_KEY").unwrap_or_default(),
                tronscan_url: env::var("TRONSCAN_API_URL")
                    .unwrap_or(explorer_defaults.tronscan_url),
                tronscan_api_key: non_empty_env("TRONSCAN_API_KEY"),
                tronscan_page_limit: parse_env(
                    "TRONSCAN_PAGE_LIMIT",
                    explorer_defaults.tronscan_page_limit,
                ),
                contracts: TokenContracts {
                    erc20: env::var("USDT_ERC20_CONTRACT")
                        .unwrap_or(explorer_defaults.contracts.erc20),
                    bep20: env::var("USDT_BEP20_CONTRACT")
                        .unwrap_or(explorer_defaults.contracts.bep20),
                    trc20: env::var("USDT_TRC20_CONTRACT")
                        .unwrap_or(explorer_defaults.contracts.trc20),
                },
            },
            http: HttpConfig {
                timeout_secs: parse_nonzero_env("HTTP_TIMEOUT_SECS", HttpConfig::default().timeout_secs),
            },
            monitor: MonitorSettings {
                poll_interval_ms: parse_env("POLLING_INTERVAL_MS", monitor_defaults.poll_interval_ms),
                wallet_delay_ms: parse_env("WALLET_DELAY_MS", monitor_defaults.wallet_delay_ms),
            },
            dispatcher: DispatcherSettings {
                poll_interval_ms: parse_env(
                    "DISPATCH_INTERVAL_MS",
                    dispatcher_defaults.poll_interval_ms,
                ),
                batch_size: parse_nonzero_env("DISPATCH_BATCH_SIZE", dispatcher_defaults.batch_size),
            },
            alerts: AlertsConfig {
                telegram_bot_token: non_empty_env("TELEGRAM_BOT_TOKEN"),
                telegram_api_url: env::var("TELEGRAM_API_URL")
                    .unwrap_or(alert_defaults.telegram_api_url),
                resend_api_key: non_empty_env("RESEND_API_KEY"),
                resend_api_url: env::var("RESEND_API_URL").unwrap_or(alert_defaults.resend_api_url),
                email_from: env::var("EMAIL_FROM").unwrap_or(alert_defaults.email_from),
            },
            health_file: env::var("HEALTH_FILE").unwrap_or_else(|_| "/tmp/healthy".to_string()),
        })
    }

    /// Load configuration for testing (with defaults).
    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            database: DatabaseConfig {
                url: "postgres://localhost/stablewatch_test".to_string(),
                max_connections: 2,
            },
            explorers: ExplorerConfig::default(),
            http: HttpConfig::default(),
            monitor: MonitorSettings::default(),
            dispatcher: DispatcherSettings::default(),
            alerts: AlertsConfig::default(),
            health_file: "/tmp/healthy".to_string(),
        }
    }
}

fn parse_env<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Like [`parse_env`], but zero falls back to `default`.
fn parse_nonzero_env<T>(key: &str, default: T) -> T
where
    T: FromStr + PartialEq + Default + Copy + fmt::Display,
{
    let value = parse_env(key, default);
    nonzero_or(key, value, default)
}

fn nonzero_or<T>(key: &str, value: T, default: T) -> T
where
    T: PartialEq + Default + fmt::Display,
{
    if value == T::default() {
        warn!("{} must be greater than zero; using {}", key, default);
        default
    } else {
        value
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.trim().is_empty())
}
