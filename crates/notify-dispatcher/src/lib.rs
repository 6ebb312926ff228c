//! Notification Dispatcher
//!
//! Picks up unnotified transfer events and fans each one out to the owner's
//! enabled and verified channels (Telegram, email, webhook), recording one
//! notification row per channel.

pub mod dispatcher;
pub mod format;
pub mod senders;

pub use dispatcher::{DispatchStats, EventOutcome, NotificationDispatcher};
pub use format::{format_alert, format_amount, AlertMessage};
pub use senders::{
    ChannelSender, DeliveryError, EmailSender, SenderSet, TelegramSender, WebhookSender,
};
