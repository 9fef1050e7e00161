use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use life_trackers::config::{Config, StorageBackend};
use life_trackers::events::build_publisher;
use life_trackers::server::{self, AppState};
use life_trackers::{logging, metrics, seed, TrackerService};
use tracker_core::{InMemoryStorage, Storage};

#[derive(Parser)]
#[command(name = "life-trackers")]
#[command(about = "Multi-tenant personal life tracker API")]
#[command(version)]
struct Cli {
    /// Path to a TOML config file (defaults to ./trackers.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API
    Serve {
        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
        /// Load demo data before serving
        #[arg(long)]
        seed: bool,
    },
    /// Load demo data for the demo tenant and exit
    Seed,
    /// Apply SQLite migrations and exit
    Migrate,
}

fn open_storage(config: &Config) -> anyhow::Result<Arc<dyn Storage>> {
    match config.storage.backend {
        StorageBackend::Memory => {
            info!("Using in-memory storage");
            Ok(Arc::new(InMemoryStorage::new()))
        }
        #[cfg(feature = "db")]
        StorageBackend::Sqlite => {
            let storage = tracker_core::SqliteStorage::open(&config.storage.db_path)
                .with_context(|| format!("opening {}", config.storage.db_path.display()))?;
            Ok(Arc::new(storage))
        }
        #[cfg(not(feature = "db"))]
        StorageBackend::Sqlite => {
            anyhow::bail!("sqlite storage requires the `db` feature; set storage.backend = \"memory\"")
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    logging::init_logging(&config.logging)?;

    match cli.command {
        Commands::Serve { port, seed } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            metrics::init_metrics(&config.metrics);
            let storage = open_storage(&config)?;
            let service = TrackerService::new(storage, build_publisher(&config.events)?);
            if seed {
                seed::seed_demo_data(&service).await?;
            }
            let state = AppState {
                service,
                default_tenant: config.tenancy.default_tenant,
            };
            server::serve(state, &config.bind_address()).await?;
        }
        Commands::Seed => {
            let storage = open_storage(&config)?;
            let service = TrackerService::new(storage, build_publisher(&config.events)?);
            let report = seed::seed_demo_data(&service).await?;
            println!("Seeded: {:?}", report.seeded);
            println!("Already populated: {:?}", report.skipped);
        }
        Commands::Migrate => {
            #[cfg(feature = "db")]
            {
                // opening applies pending migrations
                tracker_core::SqliteStorage::open(&config.storage.db_path)?;
                println!("Migrations applied to {}", config.storage.db_path.display());
            }
            #[cfg(not(feature = "db"))]
            anyhow::bail!("migrations require the `db` feature");
        }
    }

    Ok(())
}
