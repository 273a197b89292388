//! Chat platform seam.
//!
//! The export pipeline only ever talks to a [`ChatClient`]; the Discord REST
//! implementation lives in [`discord`]. Tests drive the pipeline with an
//! in-memory client.

pub mod discord;

pub use discord::DiscordClient;

use crate::{ChannelInfo, ChatMessage, Result};

/// The platform capabilities the exporter needs: resolve a channel, page
/// through its history, post text into it, and fetch attachment bytes.
pub trait ChatClient {
    /// Resolve a channel id. Fails with [`crate::ExportError::ChannelNotFound`]
    /// when the platform does not know the id.
    async fn channel_info(&self, channel_id: u64) -> Result<ChannelInfo>;

    /// One page of up to `limit` messages with ids strictly greater than
    /// `after`, ascending. `None` means "from the beginning". An empty page
    /// means the history is exhausted.
    async fn messages_after(
        &self,
        channel_id: u64,
        after: Option<u64>,
        limit: u8,
    ) -> Result<Vec<ChatMessage>>;

    /// Post a text message into the channel.
    async fn send_message(&self, channel_id: u64, text: &str) -> Result<()>;

    /// Fetch the raw bytes behind an attachment URL.
    async fn download(&self, url: &str) -> Result<Vec<u8>>;
}
