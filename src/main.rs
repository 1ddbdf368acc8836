use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use clan_tracker::api::{build_router, state::AppState};
use clan_tracker::auth::sha256_hex;
use clan_tracker::calculate::Aggregator;
use clan_tracker::config::AppConfig;
use clan_tracker::models::{PlayerId, TimeWindow};
use clan_tracker::storage::{ClanRepository, JsonlRepository, StorageConfig};

#[derive(Parser)]
#[command(name = "clan-tracker")]
#[command(about = "Clan war performance tracker")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,

        /// Port number
        #[arg(long)]
        port: Option<u16>,
    },

    /// Print per-player summaries as JSON
    Stats {
        /// Year of a custom month (requires --month)
        #[arg(long)]
        year: Option<i32>,

        /// Custom month, 1-12 (requires --year)
        #[arg(long)]
        month: Option<u32>,

        /// Only print this player
        #[arg(long)]
        player: Option<String>,
    },

    /// Print scheduled matches that have no result yet
    Upcoming,

    /// Print the SHA-256 digest of a password for `admin.password_sha256`
    HashPassword { password: String },
}

fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    init_tracing(&config.log_level, cli.json_logs);
    tracing::debug!("Data directory: {}", config.data_dir.display());

    match cli.command {
        Commands::Serve { host, port } => {
            tracing::info!("Starting clan-tracker v{}", env!("CARGO_PKG_VERSION"));

            let state = AppState::from_config(&config);
            if !state.sessions.login_enabled() {
                tracing::warn!("admin.password_sha256 is not set; admin login is disabled");
            }

            let app = build_router(state, &config.server.cors_origin);
            let host = host.unwrap_or(config.server.host);
            let port = port.unwrap_or(config.server.port);
            let addr = format!("{}:{}", host, port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Listening on http://{}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Stats {
            year,
            month,
            player,
        } => {
            let window = TimeWindow::from_parts(year, month)?;
            let repository = JsonlRepository::new(StorageConfig::new(config.data_dir));
            let players = repository.players_with_records().await?;
            let aggregator = Aggregator::new(config.stats.calendar);
            let mut summaries = aggregator.summarize_per_player(&players, window);

            if let Some(id) = player {
                let id = PlayerId::from(id);
                summaries.retain(|s| s.id == id);
                if summaries.is_empty() {
                    bail!("Player '{}' not found", id);
                }
            }

            println!("{}", serde_json::to_string_pretty(&summaries)?);
        }
        Commands::Upcoming => {
            let repository = JsonlRepository::new(StorageConfig::new(config.data_dir));
            let upcoming = repository.upcoming_matches().await?;
            println!("{}", serde_json::to_string_pretty(&upcoming)?);
        }
        Commands::HashPassword { password } => {
            println!("{}", sha256_hex(&password));
        }
    }

    Ok(())
}
