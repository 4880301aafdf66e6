//! Cadence Playlist Server
//!
//! Builds running playlists whose tempo matches a target step cadence,
//! sourcing candidate tracks from the Spotify catalog.

mod config;
mod recommend;
mod server;
mod sourcing;
mod spotify;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use cadence_core::{PaceInput, PaceUnit, SearchCache};

use config::Config;
use recommend::RecommendRequest;
use server::ServerState;
use spotify::SpotifyClient;

#[derive(Parser)]
#[command(name = "cadence-server")]
#[command(about = "Build running playlists matched to your step cadence")]
struct Cli {
    /// Address for CLI connections
    #[arg(short, long, default_value = "127.0.0.1:7878")]
    bind: String,

    /// Spotify app client ID
    #[arg(long, env = "SPOTIFY_CLIENT_ID")]
    client_id: Option<String>,

    /// Spotify app client secret
    #[arg(long, env = "SPOTIFY_CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,

    /// Directory for cached search results (no caching when omitted)
    #[arg(short, long)]
    cache_dir: Option<PathBuf>,

    /// Seconds before a cached search is refetched
    #[arg(long, default_value = "3600")]
    cache_max_age: u64,

    /// Build one playlist, print it as JSON and exit
    #[arg(long, requires = "pace")]
    once: bool,

    /// Running pace as M:SS (with --once)
    #[arg(long)]
    pace: Option<String>,

    /// Pace unit: km or mi
    #[arg(long, default_value = "km")]
    unit: PaceUnit,

    /// Cadence in steps per minute (defaults to the pace suggestion)
    #[arg(long)]
    cadence: Option<u32>,

    /// Comma-separated genres
    #[arg(long, value_delimiter = ',')]
    genres: Vec<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging; RUST_LOG wins over --verbose
    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = Config {
        bind_addr: cli.bind,
        client_id: cli.client_id,
        client_secret: cli.client_secret,
        cache_dir: cli.cache_dir,
        cache_max_age: Duration::from_secs(cli.cache_max_age),
    };

    if !config.has_credentials() {
        warn!("Spotify credentials missing; recommendations will come back empty");
    }

    let cache = match &config.cache_dir {
        Some(dir) => {
            let cache = SearchCache::new(dir, config.cache_max_age)?;
            info!("Search cache at {:?}: {:?}", dir, cache.stats()?);
            Some(cache)
        }
        None => None,
    };

    let client = SpotifyClient::new(
        config.client_id.clone(),
        config.client_secret.clone(),
        cache.clone(),
    )?;

    if cli.once {
        let pace = match &cli.pace {
            Some(p) => PaceInput::parse(p, cli.unit)?,
            None => anyhow::bail!("--once requires --pace"),
        };
        let request = RecommendRequest {
            pace,
            cadence: cli.cadence,
            genres: if cli.genres.is_empty() { None } else { Some(cli.genres) },
        };

        let mut rng = StdRng::from_entropy();
        let response = recommend::recommend(&client, request, &mut rng).await?;
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        info!("Cadence Playlist Server starting");
        server::run(ServerState::new(config, client, cache)).await?;
    }

    Ok(())
}
