//! Telegram Bot API sender.

use super::{error_body, ChannelSender, DeliveryError};
use crate::format::AlertMessage;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct TelegramResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

pub struct TelegramSender {
    http_client: reqwest::Client,
    api_url: String,
    bot_token: Option<String>,
}

impl TelegramSender {
    pub fn new(http_client: reqwest::Client, api_url: &str, bot_token: Option<String>) -> Self {
        Self {
            http_client,
            api_url: api_url.trim_end_matches('/').to_string(),
            bot_token,
        }
    }
}

#[async_trait]
impl ChannelSender for TelegramSender {
    async fn deliver(&self, chat_id: &str, message: &AlertMessage) -> Result<(), DeliveryError> {
        let token = self
            .bot_token
            .as_deref()
            .ok_or(DeliveryError::NotConfigured("chat bot token"))?;

        let url = format!("{}/bot{}/sendMessage", self.api_url, token);

        let response = self
            .http_client
            .post(&url)
            .json(&serde_json::json!({
                "chat_id": chat_id,
                "text": message.body,
                "disable_web_page_preview": true
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response).await;
            let description = serde_json::from_str::<TelegramResponse>(&body)
                .ok()
                .and_then(|r| r.description)
                .unwrap_or(body);
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body: description,
            });
        }

        let body: TelegramResponse = response.json().await?;
        if !body.ok {
            return Err(DeliveryError::Gateway(
                body.description
                    .unwrap_or_else(|| "response did not report ok".to_string()),
            ));
        }

        debug!(chat_id, "Sent Telegram alert");
        Ok(())
    }
}
