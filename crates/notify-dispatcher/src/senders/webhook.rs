//! Generic JSON webhook sender.

use super::{error_body, ChannelSender, DeliveryError};
use crate::format::AlertMessage;
use async_trait::async_trait;
use tracing::debug;
use url::Url;

pub struct WebhookSender {
    http_client: reqwest::Client,
}

impl WebhookSender {
    pub fn new(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }
}

fn parse_webhook_url(raw: &str) -> Result<Url, DeliveryError> {
    let url = Url::parse(raw).map_err(|e| DeliveryError::InvalidDestination(format!("{raw}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(DeliveryError::InvalidDestination(format!(
            "unsupported scheme {other}"
        ))),
    }
}

#[async_trait]
impl ChannelSender for WebhookSender {
    async fn deliver(&self, webhook_url: &str, message: &AlertMessage) -> Result<(), DeliveryError> {
        let url = parse_webhook_url(webhook_url)?;

        let response = self
            .http_client
            .post(url)
            .json(&serde_json::json!({
                "text": message.body,
                "subject": message.subject
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body: error_body(response).await,
            });
        }

        debug!("Sent webhook alert");
        Ok(())
    }
}
