//! Alert text shared by every channel.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use stablewatch_core::types::{Event, Wallet};

/// Rendered alert: a subject line (email) and the body sent everywhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertMessage {
    pub subject: String,
    pub body: String,
}

/// Amount with exactly two decimals, half rounded away from zero.
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.2}", rounded)
}

pub fn format_alert(event: &Event, wallet: &Wallet) -> AlertMessage {
    let network = event.network.display_name();
    let amount = format_amount(event.amount);

    let body = format!(
        "[{token}] Transaction on {network}\n\
         Network: {network}\n\
         Wallet: {wallet}\n\
         Direction: {direction}\n\
         Amount: {amount} {token}\n\
         Tx: {url}",
        token = event.token,
        network = network,
        wallet = wallet.display_name(),
        direction = event.direction.title(),
        amount = amount,
        url = event.network.explorer_tx_url(&event.tx_hash),
    );

    let subject = format!(
        "Crypto Alert: {} {} {}",
        event.direction.as_str(),
        amount,
        event.token
    );

    AlertMessage { subject, body }
}
