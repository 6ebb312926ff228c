//! Email sender over the Resend HTTP API.

use super::{error_body, ChannelSender, DeliveryError};
use crate::format::AlertMessage;
use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    text: &'a str,
}

pub struct EmailSender {
    http_client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    from: String,
}

impl EmailSender {
    pub fn new(
        http_client: reqwest::Client,
        api_url: &str,
        api_key: Option<String>,
        from: &str,
    ) -> Self {
        Self {
            http_client,
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key,
            from: from.to_string(),
        }
    }
}

#[async_trait]
impl ChannelSender for EmailSender {
    async fn deliver(&self, to: &str, message: &AlertMessage) -> Result<(), DeliveryError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(DeliveryError::NotConfigured("email transport"))?;

        if !to.contains('@') {
            return Err(DeliveryError::InvalidDestination(to.to_string()));
        }

        let response = self
            .http_client
            .post(format!("{}/emails", self.api_url))
            .bearer_auth(api_key)
            .json(&SendEmailRequest {
                from: &self.from,
                to: [to],
                subject: &message.subject,
                text: &message.body,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body: error_body(response).await,
            });
        }

        debug!(to, "Sent email alert");
        Ok(())
    }
}
