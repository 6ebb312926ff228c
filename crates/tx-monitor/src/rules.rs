//! Alert rule evaluation.
//!
//! A transfer qualifies when ANY active rule on the wallet matches it. A
//! wallet without active rules never qualifies.

use crate::classifier::ClassifiedTransfer;
use stablewatch_core::types::AlertRule;

/// Whether a single rule matches a classified transfer.
pub fn rule_matches(rule: &AlertRule, transfer: &ClassifiedTransfer) -> bool {
    rule.is_active
        && rule.direction.admits(transfer.direction)
        && rule
            .min_amount
            .map_or(true, |min| transfer.amount >= min)
}

/// OR across rules.
pub fn qualifies(rules: &[AlertRule], transfer: &ClassifiedTransfer) -> bool {
    rules.iter().any(|rule| rule_matches(rule, transfer))
}
