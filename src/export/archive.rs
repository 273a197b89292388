//! Archive pass: build the complete record set and download attachments.

use crate::export::{sanitize_component, AttachmentRecord, MessageRecord};
use crate::history::HistoryWalker;
use crate::platform::ChatClient;
use crate::{ChatMessage, Result};

use anyhow::Context as _;
use std::path::Path;

/// Walk the entire channel history from the beginning and build one
/// [`MessageRecord`] per message, downloading attachments as it goes.
///
/// This pass never resumes from the watermark: its product is the complete
/// current record set for the output artifacts, and skipping old messages
/// would silently drop them from the reports. A failed attachment download
/// is logged and leaves that record's `local_path` empty; it never aborts
/// the pass.
///
/// `expected_total` is the estimator's message count, used for the
/// per-message progress percentage. Messages that arrived between the two
/// passes can push the figure past 100; that is tolerated.
pub async fn run<C: ChatClient>(
    client: &C,
    channel_id: u64,
    channel_dir: &Path,
    expected_total: u64,
) -> Result<Vec<MessageRecord>> {
    std::fs::create_dir_all(channel_dir)
        .with_context(|| format!("failed to create {}", channel_dir.display()))?;

    let mut walker = HistoryWalker::new(client, channel_id, None);
    let mut records = Vec::new();
    let mut count: u64 = 0;

    while let Some(message) = walker.next().await? {
        count += 1;
        records.push(build_record(client, &message, channel_dir).await);

        if expected_total > 0 {
            let percentage = (count as f64 / expected_total as f64) * 100.0;
            let _ = client
                .send_message(channel_id, &format!("Progress: {percentage:.2}%"))
                .await;
        }
    }

    Ok(records)
}

async fn build_record<C: ChatClient>(
    client: &C,
    message: &ChatMessage,
    channel_dir: &Path,
) -> MessageRecord {
    let mut attachments = Vec::with_capacity(message.attachments.len());

    for attachment in &message.attachments {
        let relative = attachment_relative_path(message, &attachment.filename);
        let local_path = match save_attachment(client, &attachment.url, channel_dir, &relative)
            .await
        {
            Ok(()) => Some(relative),
            Err(error) => {
                tracing::error!(
                    %error,
                    url = %attachment.url,
                    filename = %attachment.filename,
                    "error saving attachment"
                );
                None
            }
        };
        attachments.push(AttachmentRecord {
            url: attachment.url.clone(),
            local_path,
        });
    }

    MessageRecord {
        timestamp: message.timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        name: message.author.clone(),
        content: message.content.clone(),
        attachments,
    }
}

/// `Attachments/<year>/<UTC yyyymmdd_HHMMSS>_<author>_<original filename>`,
/// relative to the channel directory. Author and filename are sanitized into
/// single path components.
fn attachment_relative_path(message: &ChatMessage, filename: &str) -> String {
    format!(
        "Attachments/{}/{}_{}_{}",
        message.timestamp.format("%Y"),
        message.timestamp.format("%Y%m%d_%H%M%S"),
        sanitize_component(&message.author),
        sanitize_component(filename)
    )
}

async fn save_attachment<C: ChatClient>(
    client: &C,
    url: &str,
    channel_dir: &Path,
    relative: &str,
) -> anyhow::Result<()> {
    let target = channel_dir.join(relative);
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let bytes = client.download(url).await?;
    tokio::fs::write(&target, bytes)
        .await
        .with_context(|| format!("failed to write {}", target.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone as _;

    fn message_at(year: i32, author: &str) -> ChatMessage {
        ChatMessage {
            id: 1,
            timestamp: chrono::Utc
                .with_ymd_and_hms(year, 4, 5, 6, 7, 8)
                .unwrap(),
            author_id: 9,
            author: author.to_string(),
            content: String::new(),
            attachments: Vec::new(),
        }
    }

    #[test]
    fn attachment_path_partitions_by_year_and_sanitizes() {
        let message = message_at(2023, "mal/ory");
        let path = attachment_relative_path(&message, "holiday pic.png");
        assert_eq!(
            path,
            "Attachments/2023/20230405_060708_mal_ory_holiday pic.png"
        );
    }

    #[test]
    fn attachment_path_uses_utc_timestamp_prefix() {
        let message = message_at(1999, "kim");
        let path = attachment_relative_path(&message, "a.txt");
        assert!(path.starts_with("Attachments/1999/19990405_060708_"));
    }
}
