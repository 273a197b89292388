//! Error taxonomy for an export run.

/// Crate-wide result alias.
pub type Result<T, E = ExportError> = std::result::Result<T, E>;

/// Failures that can surface during an export run.
///
/// Only `ChannelNotFound` and `Other` abort a run. Attachment and emitter
/// failures are contained where they happen and logged; they never carry
/// past their component.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The channel id did not resolve. Fatal: nothing is written.
    #[error("channel {0} not found")]
    ChannelNotFound(u64),

    /// The operator answered "no" at the confirmation gate.
    #[error("export declined by operator")]
    ConfirmationDeclined,

    /// The confirmation window elapsed without a qualifying reply.
    #[error("confirmation timed out")]
    ConfirmationTimeout,

    /// A platform API call failed (history page, message post, download).
    #[error("platform request failed: {0}")]
    Platform(#[from] reqwest::Error),

    /// Catch-all for anything the orchestrator did not classify.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ExportError {
    /// True for the two clean-abort outcomes of the confirmation gate.
    /// They differ only in logging; the user sees the same cancellation.
    pub fn is_cancellation(&self) -> bool {
        matches!(
            self,
            ExportError::ConfirmationDeclined | ExportError::ConfirmationTimeout
        )
    }
}
