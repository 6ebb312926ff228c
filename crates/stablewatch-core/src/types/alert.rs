//! Transfer directions and user alert rules.

use crate::Error;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Direction of a transfer relative to the watched wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Incoming,
    Outgoing,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Incoming => "incoming",
            Direction::Outgoing => "outgoing",
        }
    }

    /// Capitalized form used in alert text.
    pub fn title(&self) -> &'static str {
        match self {
            Direction::Incoming => "Incoming",
            Direction::Outgoing => "Outgoing",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "incoming" => Ok(Direction::Incoming),
            "outgoing" => Ok(Direction::Outgoing),
            other => Err(Error::UnknownVariant {
                kind: "direction",
                value: other.to_string(),
            }),
        }
    }
}

/// Direction filter on an alert rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleDirection {
    Incoming,
    Outgoing,
    Both,
}

impl RuleDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleDirection::Incoming => "incoming",
            RuleDirection::Outgoing => "outgoing",
            RuleDirection::Both => "both",
        }
    }

    pub fn admits(&self, direction: Direction) -> bool {
        match self {
            RuleDirection::Both => true,
            RuleDirection::Incoming => direction == Direction::Incoming,
            RuleDirection::Outgoing => direction == Direction::Outgoing,
        }
    }
}

impl FromStr for RuleDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "incoming" => Ok(RuleDirection::Incoming),
            "outgoing" => Ok(RuleDirection::Outgoing),
            "both" => Ok(RuleDirection::Both),
            other => Err(Error::UnknownVariant {
                kind: "rule direction",
                value: other.to_string(),
            }),
        }
    }
}

/// A user-owned rule deciding which transfers on a wallet raise alerts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRule {
    pub id: Uuid,
    pub wallet_id: Uuid,
    pub direction: RuleDirection,
    /// Inclusive lower bound on the normalized amount.
    pub min_amount: Option<Decimal>,
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_direction_admits() {
        assert!(RuleDirection::Both.admits(Direction::Incoming));
        assert!(RuleDirection::Both.admits(Direction::Outgoing));
        assert!(RuleDirection::Incoming.admits(Direction::Incoming));
        assert!(!RuleDirection::Incoming.admits(Direction::Outgoing));
        assert!(!RuleDirection::Outgoing.admits(Direction::Incoming));
    }

    #[test]
    fn test_direction_title() {
        assert_eq!(Direction::Incoming.title(), "Incoming");
        assert_eq!(Direction::Outgoing.to_string(), "outgoing");
        assert!("sideways".parse::<RuleDirection>().is_err());
    }
}
