//! Configuration loaded from `config.toml`.

use anyhow::Context as _;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub discord: DiscordConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

/// Discord credentials and the operator allowed to answer confirmations.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordConfig {
    /// Bot token used for the REST API.
    pub token: String,
    /// User id whose yes/no replies the confirmation gate accepts.
    pub operator_id: u64,
}

/// Export behavior knobs. Everything has a sensible default.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Root directory the per-channel output trees land under.
    pub output_dir: PathBuf,
    /// Location of the cross-run watermark file.
    pub state_file: PathBuf,
    /// Persist watermarks every this many processed messages.
    pub save_every: usize,
    /// Seconds the confirmation gate waits for a reply.
    pub confirm_timeout_secs: u64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        let instance_dir = Config::default_instance_dir();
        Self {
            output_dir: instance_dir.join("exports"),
            state_file: instance_dir.join("export_state.json"),
            save_every: 100,
            confirm_timeout_secs: 60,
        }
    }
}

impl Config {
    /// Load and parse a config file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse config: {}", path.display()))?;

        if config.discord.token.trim().is_empty() {
            anyhow::bail!("discord.token is empty in {}", path.display());
        }

        Ok(config)
    }

    /// Instance directory holding state, logs, and default output.
    pub fn default_instance_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("archivebot")
    }

    /// Default config path under the user's config directory.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("archivebot")
            .join("config.toml")
    }
}
