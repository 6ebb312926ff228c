//! Direction and amount of a raw transfer relative to a watched wallet.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stablewatch_core::types::{Direction, RawTransfer, Wallet};
use thiserror::Error;
use tracing::warn;

/// Largest scale a `Decimal` can carry.
const MAX_DECIMALS: u32 = 28;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
    #[error("value {0:?} is not a non-negative integer")]
    NotAnInteger(String),
    #[error("{decimals} decimals exceeds the supported maximum of 28")]
    TooManyDecimals { decimals: u32 },
    #[error("value {0} does not fit a decimal")]
    Overflow(String),
}

/// A transfer that touches the wallet, with a normalized amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedTransfer {
    pub direction: Direction,
    pub amount: Decimal,
}

/// `raw / 10^decimals`, exactly.
pub fn normalize_amount(raw: &str, decimals: u32) -> Result<Decimal, AmountError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AmountError::NotAnInteger(raw.to_string()));
    }
    if decimals > MAX_DECIMALS {
        return Err(AmountError::TooManyDecimals { decimals });
    }

    let magnitude: i128 = trimmed
        .parse()
        .map_err(|_| AmountError::Overflow(trimmed.to_string()))?;

    Decimal::try_from_i128_with_scale(magnitude, decimals)
        .map(|d| d.normalize())
        .map_err(|_| AmountError::Overflow(trimmed.to_string()))
}

/// Classify `transfer` for `wallet`.
///
/// Returns `None` when the transfer does not involve the wallet, or when its
/// amount cannot be read (logged). Receiving takes precedence over sending for
/// a self-transfer.
pub fn classify(transfer: &RawTransfer, wallet: &Wallet) -> Option<ClassifiedTransfer> {
    let address = wallet.normalized_address();
    let network = wallet.network;

    let direction = if network.normalize_address(&transfer.to) == address {
        Direction::Incoming
    } else if network.normalize_address(&transfer.from) == address {
        Direction::Outgoing
    } else {
        return None;
    };

    match normalize_amount(&transfer.value, transfer.decimals) {
        Ok(amount) => Some(ClassifiedTransfer { direction, amount }),
        Err(e) => {
            warn!(
                wallet_id = %wallet.id,
                tx_hash = %transfer.reference,
                error = %e,
                "Discarding transfer with unreadable amount"
            );
            None
        }
    }
}
