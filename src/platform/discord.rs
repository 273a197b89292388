//! Discord REST API v10 client.

use crate::platform::ChatClient;
use crate::{Attachment, ChannelInfo, ChatMessage, ExportError, Result};

use serde::Deserialize;
use std::time::Duration;

const API_BASE: &str = "https://discord.com/api/v10";

/// Snowflake ids arrive as decimal strings on the wire.
fn snowflake<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    raw.parse::<u64>().map_err(serde::de::Error::custom)
}

#[derive(Debug, Deserialize)]
struct WireChannel {
    #[serde(deserialize_with = "snowflake")]
    id: u64,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireAuthor {
    #[serde(deserialize_with = "snowflake")]
    id: u64,
    username: String,
}

#[derive(Debug, Deserialize)]
struct WireAttachment {
    #[serde(deserialize_with = "snowflake")]
    id: u64,
    filename: String,
    url: String,
    size: u64,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    #[serde(deserialize_with = "snowflake")]
    id: u64,
    timestamp: chrono::DateTime<chrono::Utc>,
    author: WireAuthor,
    #[serde(default)]
    content: String,
    #[serde(default)]
    attachments: Vec<WireAttachment>,
}

impl From<WireMessage> for ChatMessage {
    fn from(wire: WireMessage) -> Self {
        ChatMessage {
            id: wire.id,
            timestamp: wire.timestamp,
            author_id: wire.author.id,
            author: wire.author.username,
            content: wire.content,
            attachments: wire
                .attachments
                .into_iter()
                .map(|a| Attachment {
                    id: a.id,
                    filename: a.filename,
                    url: a.url,
                    size_bytes: a.size,
                })
                .collect(),
        }
    }
}

/// Bot-token REST client. Cheap to clone; the inner `reqwest::Client` is
/// already reference counted.
#[derive(Clone)]
pub struct DiscordClient {
    http: reqwest::Client,
    token: String,
}

impl DiscordClient {
    pub fn new(token: String) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            token,
        }
    }

    fn auth(&self) -> String {
        format!("Bot {}", self.token)
    }
}

impl ChatClient for DiscordClient {
    async fn channel_info(&self, channel_id: u64) -> Result<ChannelInfo> {
        let response = self
            .http
            .get(format!("{API_BASE}/channels/{channel_id}"))
            .header("authorization", self.auth())
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ExportError::ChannelNotFound(channel_id));
        }

        let channel: WireChannel = response.error_for_status()?.json().await?;
        Ok(ChannelInfo {
            id: channel.id,
            name: channel.name.unwrap_or_else(|| channel_id.to_string()),
        })
    }

    async fn messages_after(
        &self,
        channel_id: u64,
        after: Option<u64>,
        limit: u8,
    ) -> Result<Vec<ChatMessage>> {
        // after=0 pages from the very start of the channel.
        let after = after.unwrap_or(0);
        let response = self
            .http
            .get(format!("{API_BASE}/channels/{channel_id}/messages"))
            .query(&[("after", after.to_string()), ("limit", limit.to_string())])
            .header("authorization", self.auth())
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ExportError::ChannelNotFound(channel_id));
        }

        let wire: Vec<WireMessage> = response.error_for_status()?.json().await?;
        let mut messages: Vec<ChatMessage> = wire.into_iter().map(ChatMessage::from).collect();
        // The API documents no ordering guarantee for `after` queries, so
        // impose the chronological order the walker relies on.
        messages.sort_by_key(|message| message.id);
        Ok(messages)
    }

    async fn send_message(&self, channel_id: u64, text: &str) -> Result<()> {
        self.http
            .post(format!("{API_BASE}/channels/{channel_id}/messages"))
            .header("authorization", self.auth())
            .json(&serde_json::json!({ "content": text }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        // Attachment CDN URLs are pre-signed; no auth header needed.
        let bytes = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(bytes.to_vec())
    }
}
