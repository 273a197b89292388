//! Estimator pass: size the pending download without fetching anything.

use crate::history::HistoryWalker;
use crate::platform::ChatClient;
use crate::state::ExportState;
use crate::Result;

use std::path::Path;

/// Post a running-count notice every this many messages. The source material
/// for this cadence was wall-clock based, but a percentage is impossible here
/// (the total is not known until the pass ends), so we report raw counts.
const PROGRESS_EVERY: u64 = 500;

/// Aggregates from one estimator pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SizeEstimate {
    pub messages: u64,
    pub attachments: u64,
    pub total_bytes: u64,
}

impl SizeEstimate {
    pub fn total_megabytes(&self) -> f64 {
        self.total_bytes as f64 / (1024.0 * 1024.0)
    }
}

/// Walk the history strictly after the channel's stored watermark, counting
/// messages and attachment bytes. The watermark advances after every message
/// and is flushed to disk every `save_every` messages, so a crash mid-pass
/// loses at most one save window of progress.
pub async fn run<C: ChatClient>(
    client: &C,
    channel_id: u64,
    state: &mut ExportState,
    state_path: &Path,
    save_every: usize,
) -> Result<SizeEstimate> {
    let after = state.watermark(channel_id).last_message_id();
    let mut walker = HistoryWalker::new(client, channel_id, after);
    let mut estimate = SizeEstimate::default();

    while let Some(message) = walker.next().await? {
        estimate.messages += 1;
        for attachment in &message.attachments {
            estimate.attachments += 1;
            estimate.total_bytes += attachment.size_bytes;
            state
                .watermark_mut(channel_id)
                .advance_attachment(attachment.id);
        }
        state.watermark_mut(channel_id).advance_message(message.id);
        tracing::debug!(channel_id, message_id = message.id, "estimated message");

        if estimate.messages % PROGRESS_EVERY == 0 {
            let _ = client
                .send_message(
                    channel_id,
                    &format!(
                        "Scanning... {} messages, {} attachments so far.",
                        estimate.messages, estimate.attachments
                    ),
                )
                .await;
        }
        if save_every > 0 && estimate.messages % save_every as u64 == 0 {
            state.save(state_path);
        }
    }

    state.save(state_path);
    tracing::info!(
        channel_id,
        messages = estimate.messages,
        attachments = estimate.attachments,
        total_bytes = estimate.total_bytes,
        "estimator pass complete"
    );

    Ok(estimate)
}
