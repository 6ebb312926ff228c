//! Supported networks and their explorer conventions.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A network on which a wallet is watched for USDT transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Ethereum,
    Bsc,
    Tron,
}

/// Which explorer API shape serves a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplorerFamily {
    /// Etherscan v2 multichain account API.
    Etherscan,
    /// Tronscan TRC-20 transfer API.
    Tronscan,
}

impl Network {
    pub const ALL: [Network; 3] = [Network::Ethereum, Network::Bsc, Network::Tron];

    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Ethereum => "ethereum",
            Network::Bsc => "bsc",
            Network::Tron => "tron",
        }
    }

    pub fn family(&self) -> ExplorerFamily {
        match self {
            Network::Ethereum | Network::Bsc => ExplorerFamily::Etherscan,
            Network::Tron => ExplorerFamily::Tronscan,
        }
    }

    /// Etherscan v2 `chainid` parameter. `None` for non-EVM networks.
    pub fn chain_id(&self) -> Option<u64> {
        match self {
            Network::Ethereum => Some(1),
            Network::Bsc => Some(56),
            Network::Tron => None,
        }
    }

    /// Human-readable name used in alert messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Network::Ethereum => "Ethereum (ERC20)",
            Network::Bsc => "BSC (BEP20)",
            Network::Tron => "Tron (TRC20)",
        }
    }

    /// Explorer link for a transaction reference.
    pub fn explorer_tx_url(&self, tx_hash: &str) -> String {
        match self {
            Network::Ethereum => format!("https://etherscan.io/tx/{}", tx_hash),
            Network::Bsc => format!("https://bscscan.com/tx/{}", tx_hash),
            Network::Tron => format!("https://tronscan.org/#/transaction/{}", tx_hash),
        }
    }

    /// Canonical form of an address for equality checks.
    ///
    /// Hex addresses are case-insensitive; Tron base58 addresses are not.
    pub fn normalize_address(&self, address: &str) -> String {
        match self.family() {
            ExplorerFamily::Etherscan => address.trim().to_lowercase(),
            ExplorerFamily::Tronscan => address.trim().to_string(),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ethereum" => Ok(Network::Ethereum),
            "bsc" => Ok(Network::Bsc),
            "tron" => Ok(Network::Tron),
            other => Err(Error::UnknownVariant {
                kind: "network",
                value: other.to_string(),
            }),
        }
    }
}
