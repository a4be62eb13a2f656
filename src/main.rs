//! # Insights CLI (`insights`)
//!
//! Serves the insights dashboard API and manages the collection behind it.
//!
//! ## Usage
//!
//! ```bash
//! insights --config ./config/insights.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `insights init` | Create the database schema |
//! | `insights serve` | Start the HTTP API |
//! | `insights seed -i` | Replace the collection with the seed file |
//! | `insights seed -d` | Delete every insight |
//! | `insights stats` | Print collection statistics |
//!
//! Configuration comes from the TOML file (optional) and the environment
//! (`DATABASE_URL`, `HOST`, `PORT`, `CORS_ORIGIN`, `SEED_FILE`); a `.env`
//! file in the working directory is loaded first.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use insights_api::config::{self, Config};
use insights_api::seed::{self, SeedMode};
use insights_api::store::{SqliteStore, Store};
use insights_api::{db, migrate, server, stats};

/// Insights CLI — a read-only dashboard API over a collection of insight
/// records, plus the tooling to seed it.
#[derive(Parser)]
#[command(name = "insights", version, about)]
struct Cli {
    /// Path to configuration file (TOML). Built-in defaults are used when
    /// the file does not exist.
    #[arg(long, global = true, default_value = "./config/insights.toml")]
    config: PathBuf,

    /// Log at debug level (overridden by `RUST_LOG`).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the `insights` table and its indexes. Idempotent.
    Init,

    /// Start the HTTP API.
    ///
    /// Binds to `server.host:server.port` and serves `/api/*` until
    /// SIGINT or SIGTERM.
    Serve,

    /// Import or destroy the insight collection.
    ///
    /// With `-i`, deletes every record and loads the seed file.
    /// With `-d`, deletes every record.
    Seed {
        /// Replace the collection with the contents of the seed file.
        #[arg(short = 'i', long = "import", conflicts_with = "destroy")]
        import: bool,

        /// Delete every insight.
        #[arg(short = 'd', long = "destroy")]
        destroy: bool,

        /// Seed file to read instead of `seed.path`.
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Print collection statistics.
    Stats,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Connect, make sure the schema exists, and wrap the pool in a store.
async fn open_store(cfg: &Config) -> Result<SqliteStore> {
    let pool = db::connect(&cfg.db).await?;
    migrate::run_migrations(&pool).await?;
    tracing::info!(url = %cfg.db.url, "connected to database");
    Ok(SqliteStore::new(pool))
}

async fn run(cli: Cli) -> Result<()> {
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            let pool = db::connect(&cfg.db).await?;
            migrate::run_migrations(&pool).await?;
            pool.close().await;
            println!("Database initialized successfully.");
        }
        Commands::Serve => {
            let store: Arc<dyn Store> = Arc::new(open_store(&cfg).await?);
            server::run_server(&cfg, store).await?;
        }
        Commands::Seed {
            import,
            destroy,
            file,
        } => {
            let mode = match (import, destroy) {
                (true, _) => SeedMode::Import,
                (false, true) => SeedMode::Destroy,
                (false, false) => {
                    println!("{}", seed::USAGE);
                    return Ok(());
                }
            };
            let path = file.unwrap_or_else(|| cfg.seed.path.clone());
            let store = open_store(&cfg).await?;
            let result = seed::run_seed(&store, mode, &path).await;
            store.close().await;
            result?;
        }
        Commands::Stats => {
            let store = open_store(&cfg).await?;
            let result = stats::run_stats(&store).await;
            store.close().await;
            result?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        tracing::error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
