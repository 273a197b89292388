use archivebot::config::Config;
use archivebot::export::Exporter;
use archivebot::platform::DiscordClient;
use archivebot::ExportError;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

#[derive(Parser)]
#[command(name = "archivebot", version, about)]
struct Cli {
    /// Path to config.toml. Defaults to the user config directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug-level logging.
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Export a channel's full history into local artifacts.
    Export {
        /// Channel id to export.
        channel_id: u64,
    },
}

fn init_tracing(log_dir: &std::path::Path, debug: bool) -> anyhow::Result<()> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory: {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::never(log_dir, "archivebot.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    // Leak the guard so the non-blocking writer lives for the entire process.
    std::mem::forget(guard);

    let filter = if debug {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().compact())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .compact(),
        )
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.unwrap_or_else(Config::default_config_path);
    let config = Config::load(&config_path)?;

    init_tracing(&Config::default_instance_dir().join("logs"), cli.debug)?;

    match cli.command {
        Command::Export { channel_id } => {
            let client = DiscordClient::new(config.discord.token.clone());
            let exporter = Exporter::new(&client, &config.export, config.discord.operator_id);

            match exporter.run(channel_id).await {
                Ok(()) => Ok(()),
                Err(ExportError::ChannelNotFound(id)) => {
                    anyhow::bail!("channel {id} not found");
                }
                // Declined or timed out: already reported in-channel.
                Err(error) if error.is_cancellation() => Ok(()),
                Err(error) => Err(error.into()),
            }
        }
    }
}
