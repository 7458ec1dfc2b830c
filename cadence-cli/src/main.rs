//! Cadence CLI - Command-line interface
//!
//! Runs the server, and exposes search, resolution and relay for use from
//! a terminal.

mod commands;

use std::path::PathBuf;

use cadence_core::config::CadenceConfig;
use cadence_core::tracing_setup::{CliLogLevel, init_tracing};
use clap::Parser;

#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Music search and audio relay server")]
struct Cli {
    /// Console log level (overridden by RUST_LOG)
    #[arg(long, value_enum, default_value_t = CliLogLevel::Info, global = true)]
    log_level: CliLogLevel,

    /// Also write a full trace log into this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Client profile presented upstream
    #[arg(long, global = true)]
    profile: Option<String>,

    /// Path to the yt-dlp executable
    #[arg(long, global = true)]
    ytdlp: Option<PathBuf>,

    #[command(subcommand)]
    command: commands::Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_tracing_level(), cli.log_dir.as_deref())?;

    let mut config = CadenceConfig::from_env();
    if let Some(profile) = cli.profile {
        config.resolver.profile = profile;
    }
    if let Some(binary) = cli.ytdlp {
        config.resolver.provider_binary = binary;
    }

    commands::handle_command(cli.command, config).await
}
