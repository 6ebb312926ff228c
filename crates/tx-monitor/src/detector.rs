//! Cursor-based incremental detection.
//!
//! A (wallet, network) cursor starts uninitialized. The first non-empty fetch
//! seeds it to the newest transfer without raising anything, so a freshly
//! added wallet does not alert on its history. After that, only transfers
//! strictly after the stored reference are new.

use stablewatch_core::types::{MonitoringState, RawTransfer};

/// What one fetch means for a cursor.
#[derive(Debug, PartialEq)]
pub enum Detection<'a> {
    /// The explorer returned nothing; no writes.
    Empty,
    /// First sighting: seed the cursor here and emit nothing.
    Seed { reference: &'a str },
    /// The stored reference is no longer in the explorer window.
    /// The batch is skipped rather than replayed.
    Stale { reference: &'a str },
    /// Transfers after the stored reference, oldest first. May be empty.
    New(&'a [RawTransfer]),
}

/// Decide what to do with `transfers` (ascending) given the stored cursor.
pub fn detect<'a>(
    cursor: Option<&'a MonitoringState>,
    transfers: &'a [RawTransfer],
) -> Detection<'a> {
    let Some(last) = transfers.last() else {
        return Detection::Empty;
    };

    let cursor = match cursor {
        Some(c) if c.initialized => c,
        _ => {
            return Detection::Seed {
                reference: &last.reference,
            }
        }
    };

    let Some(reference) = cursor.reference() else {
        return Detection::New(transfers);
    };

    // One transaction can carry several transfer logs under the same
    // reference; the cursor sits after the last of them.
    match transfers.iter().rposition(|t| t.reference == reference) {
        Some(idx) => Detection::New(&transfers[idx + 1..]),
        None => Detection::Stale { reference },
    }
}
