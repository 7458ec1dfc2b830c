//! CLI command implementations

use std::path::PathBuf;

use anyhow::bail;
use cadence_core::config::CadenceConfig;
use cadence_core::profile::BUILTIN_PROFILES;
use cadence_core::resolver::MediaLocator;
use cadence_core::{
    CadenceError, ClientProfile, CoreComponents, ItemIdentifier, RelayOutcome, RuntimeMode,
};
use cadence_search::{CatalogSearchService, SearchFilter};
use clap::Subcommand;
use tokio::io::AsyncWrite;
use tracing::{debug, info, warn};

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server
    Server {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
        /// Directory holding the front-end files
        #[arg(long)]
        static_dir: Option<PathBuf>,
        /// Use demo providers instead of the real catalog
        #[arg(long)]
        dev: bool,
        /// Media URL served for every item in development mode
        #[arg(long, requires = "dev")]
        dev_media_url: Option<String>,
    },
    /// Search the catalog for songs
    Search {
        /// Search terms
        #[arg(required = true)]
        query: Vec<String>,
        /// Include every catalog entry, not only songs
        #[arg(long)]
        all: bool,
        /// Use demo data
        #[arg(long)]
        dev: bool,
    },
    /// Resolve an item and print what would be relayed
    Resolve {
        /// Item id
        id: String,
        /// Also print the origin-bound upstream URL
        #[arg(long)]
        show_url: bool,
    },
    /// Relay an item's audio to stdout
    Play {
        /// Item id
        id: String,
    },
    /// List built-in client profiles
    Profiles,
}

/// Handle the CLI command
///
/// # Errors
/// Returns the failure of the command that ran
pub async fn handle_command(command: Commands, mut config: CadenceConfig) -> anyhow::Result<()> {
    match command {
        Commands::Server {
            host,
            port,
            static_dir,
            dev,
            dev_media_url,
        } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(dir) = static_dir {
                config.server.static_dir = dir;
            }
            if dev {
                config.server.mode = RuntimeMode::Development;
            }
            if dev_media_url.is_some() {
                config.server.dev_media_url = dev_media_url;
            }
            start_server(config).await
        }
        Commands::Search { query, all, dev } => {
            if dev {
                config.server.mode = RuntimeMode::Development;
            }
            let filter = if all {
                SearchFilter::All
            } else {
                SearchFilter::Songs
            };
            search(config, &query.join(" "), filter).await
        }
        Commands::Resolve { id, show_url } => resolve(config, &id, show_url).await,
        Commands::Play { id } => play(config, &id).await,
        Commands::Profiles => list_profiles(&config),
    }
}

async fn start_server(config: CadenceConfig) -> anyhow::Result<()> {
    cadence_web::run_server(config)
        .await
        .map_err(|e| anyhow::anyhow!("Server failed: {e}"))
}

async fn search(config: CadenceConfig, query: &str, filter: SearchFilter) -> anyhow::Result<()> {
    let service = CatalogSearchService::from_runtime_mode(config.server.mode, &config);
    let tracks = service.search_filtered(query, filter).await?;

    if tracks.is_empty() {
        println!("No results for {query:?}");
        return Ok(());
    }

    for track in tracks {
        let duration = track
            .duration
            .map(|secs| format!(" [{}:{:02}]", secs / 60, secs % 60))
            .unwrap_or_default();
        println!("{:<12} {} - {}{}", track.id, track.title, track.uploader, duration);
    }
    Ok(())
}

async fn resolve(config: CadenceConfig, id: &str, show_url: bool) -> anyhow::Result<()> {
    let (components, locator) = resolve_locator(&config, id).await.map_err(user_facing)?;

    println!("Item:      {}", locator.item());
    if let Some(title) = &locator.title {
        println!("Title:     {title}");
    }
    if let Some(uploader) = &locator.uploader {
        println!("Uploader:  {uploader}");
    }
    println!("Format:    {}", locator.format_id);
    println!("Codec:     {} ({:?})", locator.audio_codec, locator.codec);
    println!(
        "Container: {}",
        locator
            .container_mime()
            .unwrap_or(config.relay.default_content_type)
    );
    if let Some(length) = locator.content_length {
        println!("Length:    {length} bytes");
    }
    println!("Profile:   {}", components.profile.label());
    if show_url {
        println!("URL:       {}", locator.url());
    }
    Ok(())
}

async fn resolve_locator(
    config: &CadenceConfig,
    id: &str,
) -> cadence_core::Result<(CoreComponents, MediaLocator)> {
    let item = ItemIdentifier::parse(id)?;
    let components = CoreComponents::build(config)?;
    let locator = components.resolver.resolve_with_retry(&item).await?;
    Ok((components, locator))
}

async fn play(config: CadenceConfig, id: &str) -> anyhow::Result<()> {
    let mut stdout = tokio::io::stdout();
    let (item, outcome) = relay_to(&config, id, &mut stdout)
        .await
        .map_err(user_facing)?;

    match outcome {
        RelayOutcome::Completed { bytes, .. } => {
            info!("Relayed {} bytes for {}", bytes, item);
            Ok(())
        }
        RelayOutcome::ClientDisconnected { bytes, .. } => {
            info!("Output closed after {} bytes", bytes);
            Ok(())
        }
        RelayOutcome::UpstreamFailed { bytes, reason, .. } => {
            bail!("Upstream failed after {bytes} bytes: {reason}")
        }
    }
}

async fn relay_to<W>(
    config: &CadenceConfig,
    id: &str,
    sink: &mut W,
) -> cadence_core::Result<(ItemIdentifier, RelayOutcome)>
where
    W: AsyncWrite + Unpin,
{
    let item = ItemIdentifier::parse(id)?;
    let components = CoreComponents::build(config)?;
    let outcome = components.relay.relay(&item, sink).await?;
    Ok((item, outcome))
}

/// Reduces a core failure to its terminal message; the full chain is logged.
fn user_facing(error: CadenceError) -> anyhow::Error {
    if error.is_user_error() {
        debug!("Rejected input: {error}");
    } else {
        warn!("Command failed: {error}");
    }
    anyhow::anyhow!(error.user_message())
}

fn list_profiles(config: &CadenceConfig) -> anyhow::Result<()> {
    for name in BUILTIN_PROFILES {
        let profile = ClientProfile::builtin(name)?;
        let marker = if *name == config.resolver.profile {
            "*"
        } else {
            " "
        };
        println!(
            "{} {:<16} v{}  backends: {}",
            marker,
            profile.name(),
            profile.version(),
            profile.player_clients().join(", ")
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_config() -> CadenceConfig {
        let mut config = CadenceConfig::for_testing();
        config.server.mode = RuntimeMode::Development;
        config.server.dev_media_url = None;
        config
    }

    #[tokio::test]
    async fn test_invalid_id_reports_short_message() {
        let error = resolve(offline_config(), "a b", false).await.unwrap_err();
        assert_eq!(
            error.to_string(),
            "Invalid item id: item id contains unsupported character ' '"
        );
    }

    #[tokio::test]
    async fn test_unresolvable_item_hides_provider_diagnostic() {
        let error = resolve(offline_config(), "demo00", false).await.unwrap_err();
        assert_eq!(error.to_string(), "Could not resolve audio for demo00");

        let mut sink = Vec::new();
        let error = relay_to(&offline_config(), "demo00", &mut sink)
            .await
            .map_err(user_facing)
            .unwrap_err();
        assert_eq!(error.to_string(), "Could not resolve audio for demo00");
        assert!(sink.is_empty());
    }

    #[test]
    fn test_unknown_profile_is_reported_as_is() {
        let error = CadenceError::from(ClientProfile::builtin("toaster").unwrap_err());
        let message = user_facing(error).to_string();
        assert!(message.contains("toaster"), "{message}");
    }
}
