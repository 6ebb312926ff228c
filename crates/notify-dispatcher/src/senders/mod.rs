//! Channel senders.
//!
//! Every channel kind delivers through the same [`ChannelSender`] capability.
//! The dispatcher picks one per channel from a [`SenderSet`] and records the
//! outcome; senders never retry.

mod email;
mod telegram;
mod webhook;

pub use email::EmailSender;
pub use telegram::TelegramSender;
pub use webhook::WebhookSender;

use crate::format::AlertMessage;
use async_trait::async_trait;
use stablewatch_core::config::AlertsConfig;
use stablewatch_core::types::ChannelKind;
use std::sync::Arc;
use thiserror::Error;

/// Why a delivery attempt failed. The display text is stored on the
/// notification row.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("{0} not configured")]
    NotConfigured(&'static str),

    #[error("invalid destination: {0}")]
    InvalidDestination(String),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("gateway rejected message: {0}")]
    Gateway(String),
}

/// Delivers one alert to one destination.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChannelSender: Send + Sync {
    async fn deliver(&self, destination: &str, message: &AlertMessage) -> Result<(), DeliveryError>;
}

/// One sender per channel kind.
#[derive(Clone)]
pub struct SenderSet {
    telegram: Arc<dyn ChannelSender>,
    email: Arc<dyn ChannelSender>,
    webhook: Arc<dyn ChannelSender>,
}

impl SenderSet {
    pub fn new(
        telegram: Arc<dyn ChannelSender>,
        email: Arc<dyn ChannelSender>,
        webhook: Arc<dyn ChannelSender>,
    ) -> Self {
        Self {
            telegram,
            email,
            webhook,
        }
    }

    /// HTTP-backed senders sharing one client.
    pub fn from_config(config: &AlertsConfig, http_client: reqwest::Client) -> Self {
        Self::new(
            Arc::new(TelegramSender::new(
                http_client.clone(),
                &config.telegram_api_url,
                config.telegram_bot_token.clone(),
            )),
            Arc::new(EmailSender::new(
                http_client.clone(),
                &config.resend_api_url,
                config.resend_api_key.clone(),
                &config.email_from,
            )),
            Arc::new(WebhookSender::new(http_client)),
        )
    }

    pub fn for_kind(&self, kind: ChannelKind) -> &dyn ChannelSender {
        match kind {
            ChannelKind::Telegram => self.telegram.as_ref(),
            ChannelKind::Email => self.email.as_ref(),
            ChannelKind::Webhook => self.webhook.as_ref(),
        }
    }
}

/// Body text of an error response, shortened for storage.
pub(crate) async fn error_body(response: reqwest::Response) -> String {
    const MAX_LEN: usize = 300;

    let text = response.text().await.unwrap_or_default();
    let text = text.trim();
    if text.chars().count() > MAX_LEN {
        let mut short: String = text.chars().take(MAX_LEN).collect();
        short.push_str("...");
        short
    } else {
        text.to_string()
    }
}
