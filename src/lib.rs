//! Channel archiver: walks a Discord channel's full message history and
//! produces durable local artifacts (JSON, XLSX, per-year text reports)
//! with best-effort attachment downloads and resumable progress.

pub mod config;
pub mod error;
pub mod export;
pub mod history;
pub mod platform;
pub mod state;

pub use error::{ExportError, Result};

/// A resolved channel, as reported by the platform.
#[derive(Debug, Clone)]
pub struct ChannelInfo {
    pub id: u64,
    pub name: String,
}

/// One message pulled from channel history.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub id: u64,
    /// UTC creation time.
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub author_id: u64,
    pub author: String,
    pub content: String,
    pub attachments: Vec<Attachment>,
}

/// An attachment hanging off a message.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub id: u64,
    pub filename: String,
    pub url: String,
    pub size_bytes: u64,
}
