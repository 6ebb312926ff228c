//! Transaction Monitor
//!
//! Polls chain explorers for USDT transfers on watched wallets, detects what is
//! new since each wallet's cursor, and records events that match the owner's
//! alert rules.

pub mod classifier;
pub mod detector;
pub mod monitor;
pub mod rules;

pub use classifier::{classify, normalize_amount, AmountError, ClassifiedTransfer};
pub use detector::{detect, Detection};
pub use monitor::{CycleStats, TransactionMonitor, WalletOutcome};
pub use rules::{qualifies, rule_matches};
