//! Cross-run export progress, persisted as a single JSON file.
//!
//! The file maps channel id (string-encoded) to a two-element array of
//! `(lastMessageId, lastAttachmentId)`, each nullable. It is read wholesale
//! at the start of a run and overwritten wholesale on every save.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Resume point for one channel. `last_message_id` only ever moves forward;
/// newer messages have larger ids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Watermark(pub Option<u64>, pub Option<u64>);

impl Watermark {
    pub fn last_message_id(&self) -> Option<u64> {
        self.0
    }

    pub fn last_attachment_id(&self) -> Option<u64> {
        self.1
    }

    /// Advance the message watermark. Ignores ids that would move it backward.
    pub fn advance_message(&mut self, message_id: u64) {
        if self.0.is_none_or(|current| message_id > current) {
            self.0 = Some(message_id);
        }
    }

    pub fn advance_attachment(&mut self, attachment_id: u64) {
        if self.1.is_none_or(|current| attachment_id > current) {
            self.1 = Some(attachment_id);
        }
    }
}

/// All channels' watermarks for this instance. Loaded at orchestration entry
/// and passed explicitly through the run; there is no process-global state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExportState {
    channels: BTreeMap<String, Watermark>,
}

impl ExportState {
    /// Load from `path`. A missing or unparseable file yields an empty state;
    /// corrupt state is logged and treated as absent, never fatal.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(error) => {
                if error.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(%error, path = %path.display(), "failed to read export state");
                }
                return Self::default();
            }
        };

        match serde_json::from_str(&content) {
            Ok(state) => state,
            Err(error) => {
                tracing::warn!(%error, path = %path.display(), "corrupt export state, starting fresh");
                Self::default()
            }
        }
    }

    /// Best-effort atomic save: write a sibling temp file, then rename over
    /// the target. Failure is logged, not escalated; checkpointing must never
    /// kill a run.
    pub fn save(&self, path: &Path) {
        if let Err(error) = self.try_save(path) {
            tracing::warn!(%error, path = %path.display(), "failed to save export state");
        }
    }

    fn try_save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let temp = path.with_extension("json.tmp");
        let content = serde_json::to_vec(self).map_err(std::io::Error::other)?;
        std::fs::write(&temp, content)?;
        std::fs::rename(&temp, path)
    }

    pub fn watermark(&self, channel_id: u64) -> Watermark {
        self.channels
            .get(&channel_id.to_string())
            .copied()
            .unwrap_or_default()
    }

    pub fn watermark_mut(&mut self, channel_id: u64) -> &mut Watermark {
        self.channels.entry(channel_id.to_string()).or_default()
    }
}
