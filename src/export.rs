//! Export orchestration: estimate, confirm, archive, emit.

pub mod archive;
pub mod confirm;
pub mod estimate;
pub mod reports;

use crate::config::ExportConfig;
use crate::platform::ChatClient;
use crate::state::ExportState;
use crate::{ExportError, Result};

use serde::Serialize;
use std::path::PathBuf;

/// One archived message, in record order. Built once during the archive pass,
/// immutable afterward; only the derived reports are persisted.
#[derive(Debug, Clone, Serialize)]
pub struct MessageRecord {
    #[serde(rename = "date/time")]
    pub timestamp: String,
    pub name: String,
    pub content: String,
    pub attachments: Vec<AttachmentRecord>,
}

/// An attachment paired with where it landed on disk. A failed download
/// leaves `local_path` empty; the URL is always kept.
#[derive(Debug, Clone, Serialize)]
pub struct AttachmentRecord {
    pub url: String,
    pub local_path: Option<String>,
}

/// Strip path separators and other filesystem-hostile characters.
pub(crate) fn sanitize_component(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Sequences one full export of one channel. Holds no cross-run state of its
/// own; watermarks live in the [`ExportState`] loaded at entry.
pub struct Exporter<'a, C: ChatClient> {
    client: &'a C,
    config: &'a ExportConfig,
    operator_id: u64,
}

impl<'a, C: ChatClient> Exporter<'a, C> {
    pub fn new(client: &'a C, config: &'a ExportConfig, operator_id: u64) -> Self {
        Self {
            client,
            config,
            operator_id,
        }
    }

    /// Run the export end to end. Cancellation and channel-not-found come
    /// back as their typed errors; everything else is already logged and
    /// reported into the channel as a generic failure before returning.
    pub async fn run(&self, channel_id: u64) -> Result<()> {
        match self.run_inner(channel_id).await {
            Ok(()) => Ok(()),
            Err(error @ ExportError::ChannelNotFound(_)) => {
                tracing::error!(channel_id, "channel not found");
                Err(error)
            }
            Err(error) if error.is_cancellation() => Err(error),
            Err(error) => {
                tracing::error!(%error, channel_id, "export failed");
                let _ = self
                    .client
                    .send_message(
                        channel_id,
                        "An error occurred during export. Please check the logs for more information.",
                    )
                    .await;
                Err(error)
            }
        }
    }

    async fn run_inner(&self, channel_id: u64) -> Result<()> {
        let channel = self.client.channel_info(channel_id).await?;

        self.client
            .send_message(
                channel_id,
                &format!("archivebot received command to export {}", channel.name),
            )
            .await?;
        self.client
            .send_message(channel_id, "Export has begun.")
            .await?;
        tracing::info!(channel_id, channel_name = %channel.name, "export has begun");

        let mut state = ExportState::load(&self.config.state_file);
        let estimate = estimate::run(
            self.client,
            channel_id,
            &mut state,
            &self.config.state_file,
            self.config.save_every,
        )
        .await?;

        let decision = confirm::await_decision(
            self.client,
            channel_id,
            self.operator_id,
            &estimate,
            state.watermark(channel_id).last_message_id(),
            std::time::Duration::from_secs(self.config.confirm_timeout_secs),
        )
        .await?;

        match decision {
            confirm::Decision::Approved => {
                self.client
                    .send_message(
                        channel_id,
                        "Downloading attachments. This may take some time...",
                    )
                    .await?;
            }
            confirm::Decision::Declined => {
                tracing::info!(channel_id, "export declined by operator");
                self.client
                    .send_message(channel_id, "Operation cancelled.")
                    .await?;
                return Err(ExportError::ConfirmationDeclined);
            }
            confirm::Decision::TimedOut => {
                tracing::info!(channel_id, "confirmation timed out");
                self.client
                    .send_message(channel_id, "Response timed out. Operation cancelled.")
                    .await?;
                return Err(ExportError::ConfirmationTimeout);
            }
        }

        // Nothing below this point runs without approval, so a declined run
        // leaves the channel's output directory untouched.
        let channel_dir = self
            .config
            .output_dir
            .join(format!("{}_{}", sanitize_component(&channel.name), channel.id));

        let records = archive::run(self.client, channel_id, &channel_dir, estimate.messages).await?;

        let json_path = match reports::write_json(&records, &channel_dir) {
            Ok(path) => Some(path),
            Err(error) => {
                tracing::error!(%error, "failed to write messages.json");
                None
            }
        };
        let xlsx_path = match reports::write_xlsx(&records, &channel_dir) {
            Ok(path) => Some(path),
            Err(error) => {
                tracing::error!(%error, "failed to write messages.xlsx");
                None
            }
        };
        let year_paths = match reports::write_yearly_text(&records, &channel_dir) {
            Ok(paths) => paths,
            Err(error) => {
                tracing::error!(%error, "failed to write per-year reports");
                Vec::new()
            }
        };

        state.save(&self.config.state_file);

        let summary = completion_summary(&json_path, &xlsx_path, &year_paths);
        self.client.send_message(channel_id, &summary).await?;
        tracing::info!(
            channel_id,
            records = records.len(),
            years = year_paths.len(),
            "export complete"
        );

        Ok(())
    }
}

fn completion_summary(
    json_path: &Option<PathBuf>,
    xlsx_path: &Option<PathBuf>,
    year_paths: &[PathBuf],
) -> String {
    let mut parts = Vec::new();
    if let Some(path) = json_path {
        parts.push(format!("JSON: {}", path.display()));
    }
    if let Some(path) = xlsx_path {
        parts.push(format!("Excel: {}", path.display()));
    }
    if !year_paths.is_empty() {
        parts.push(format!("text files for {} year(s)", year_paths.len()));
    }
    if parts.is_empty() {
        "Export finished, but no artifacts could be written. Check the logs.".to_string()
    } else {
        format!("Messages exported to {}", parts.join(", "))
    }
}
