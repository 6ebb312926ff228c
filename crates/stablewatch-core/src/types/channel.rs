//! Notification channels and per-channel delivery records.

use crate::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Channel type. Stored as `telegram`, `email` or `webhook`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    /// Chat-bot delivery through the Telegram Bot API.
    Telegram,
    Email,
    Webhook,
}

impl ChannelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::Telegram => "telegram",
            ChannelKind::Email => "email",
            ChannelKind::Webhook => "webhook",
        }
    }

    /// Config field holding the destination for this kind.
    pub fn destination_field(&self) -> &'static str {
        match self {
            ChannelKind::Telegram => "chat_id",
            ChannelKind::Email => "email",
            ChannelKind::Webhook => "webhook_url",
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "telegram" => Ok(ChannelKind::Telegram),
            "email" => Ok(ChannelKind::Email),
            "webhook" => Ok(ChannelKind::Webhook),
            other => Err(Error::UnknownVariant {
                kind: "channel type",
                value: other.to_string(),
            }),
        }
    }
}

/// Channel configuration as stored in the `config` JSON column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Telegram accepts numeric chat ids; both forms are read as text.
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub chat_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

/// A user's delivery channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationChannel {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: ChannelKind,
    pub config: ChannelConfig,
    pub is_enabled: bool,
    pub verified: bool,
}

impl NotificationChannel {
    /// Destination for this channel's kind, if configured.
    pub fn destination(&self) -> Option<&str> {
        let value = match self.kind {
            ChannelKind::Telegram => self.config.chat_id.as_deref(),
            ChannelKind::Email => self.config.email.as_deref(),
            ChannelKind::Webhook => self.config.webhook_url.as_deref(),
        };
        value.map(str::trim).filter(|v| !v.is_empty())
    }

    /// Whether the dispatcher may deliver to this channel.
    pub fn is_eligible(&self) -> bool {
        self.is_enabled && self.verified
    }
}

/// Outcome of one delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    Sent,
    Failed,
    Pending,
}

impl NotificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationStatus::Sent => "sent",
            NotificationStatus::Failed => "failed",
            NotificationStatus::Pending => "pending",
        }
    }
}

impl FromStr for NotificationStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sent" => Ok(NotificationStatus::Sent),
            "failed" => Ok(NotificationStatus::Failed),
            "pending" => Ok(NotificationStatus::Pending),
            other => Err(Error::UnknownVariant {
                kind: "notification status",
                value: other.to_string(),
            }),
        }
    }
}

/// One row of the append-only notification log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub event_id: Uuid,
    pub channel_id: Uuid,
    pub status: NotificationStatus,
    pub error_message: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
}

impl Notification {
    pub fn sent(event_id: Uuid, channel_id: Uuid) -> Self {
        Self {
            event_id,
            channel_id,
            status: NotificationStatus::Sent,
            error_message: None,
            sent_at: Some(Utc::now()),
        }
    }

    pub fn failed(event_id: Uuid, channel_id: Uuid, error: impl Into<String>) -> Self {
        Self {
            event_id,
            channel_id,
            status: NotificationStatus::Failed,
            error_message: Some(error.into()),
            sent_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(kind: ChannelKind, config: ChannelConfig) -> NotificationChannel {
        NotificationChannel {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            kind,
            config,
            is_enabled: true,
            verified: true,
        }
    }

    #[test]
    fn test_destination_follows_kind() {
        let config = ChannelConfig {
            chat_id: Some("42".to_string()),
            email: Some("a@b.c".to_string()),
            webhook_url: None,
        };
        assert_eq!(
            channel(ChannelKind::Telegram, config.clone()).destination(),
            Some("42")
        );
        assert_eq!(
            channel(ChannelKind::Email, config.clone()).destination(),
            Some("a@b.c")
        );
        assert_eq!(channel(ChannelKind::Webhook, config).destination(), None);
    }

    #[test]
    fn test_config_parses_from_stored_json() {
        let config: ChannelConfig =
            serde_json::from_value(serde_json::json!({ "chat_id": "123", "extra": 1 })).unwrap();
        assert_eq!(config.chat_id.as_deref(), Some("123"));
        assert!(config.email.is_none());

        let numeric: ChannelConfig =
            serde_json::from_value(serde_json::json!({ "chat_id": -100123 })).unwrap();
        assert_eq!(numeric.chat_id.as_deref(), Some("-100123"));
    }

    #[test]
    fn test_eligibility_needs_enabled_and_verified() {
        let mut ch = channel(ChannelKind::Email, ChannelConfig::default());
        assert!(ch.is_eligible());
        ch.verified = false;
        assert!(!ch.is_eligible());
    }

    #[test]
    fn test_notification_constructors() {
        let sent = Notification::sent(Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(sent.status, NotificationStatus::Sent);
        assert!(sent.sent_at.is_some());

        let failed = Notification::failed(Uuid::new_v4(), Uuid::new_v4(), "boom");
        assert_eq!(failed.status, NotificationStatus::Failed);
        assert_eq!(failed.error_message.as_deref(), Some("boom"));
        assert!(failed.sent_at.is_none());
    }
}
