//! Quote harvester CLI
//!
//! Local execution entry point. For AWS Lambda, use `harvester-lambda`.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use harvester::{
    error::Result,
    models::Config,
    pipeline::Pipeline,
    server,
    storage::{self, QuoteCache},
};

/// Quote harvester
#[derive(Parser, Debug)]
#[command(
    name = "harvester",
    version,
    about = "Harvests quotes into a key-value cache and serves them back"
)]
struct Cli {
    /// Path to a TOML config file (defaults plus environment when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Harvest quotes from the source and store them in the cache
    Harvest {
        /// Number of quotes to collect (default: source.desired_count)
        #[arg(short = 'n', long)]
        count: Option<usize>,

        /// Source base URL (default: source.base_url)
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Print cached quotes as JSON
    Read {
        /// Maximum number of quotes (default: source.desired_count)
        #[arg(short = 'n', long)]
        count: Option<usize>,
    },

    /// Serve the read API
    Serve {
        /// Bind address (default: server.address)
        #[arg(long)]
        address: Option<String>,
    },

    /// Validate configuration
    Validate,

    /// Show the effective configuration
    Info,
}

/// Initialize logging based on verbosity flag.
///
/// `RUST_LOG` wins when set; otherwise `LOG_LEVEL`, then `fallback`.
fn init_logging(verbose: bool, fallback: &str) {
    let level = if verbose {
        "debug".to_string()
    } else {
        std::env::var("LOG_LEVEL").unwrap_or_else(|_| fallback.to_string())
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Load the config file if given. An explicit path that fails is an error.
fn load_config_file(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => Ok(Config::default()),
    }
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = load_config_file(cli.config.as_ref())?;
    init_logging(cli.verbose, &config.logging.level);

    log::info!("Quote harvester starting...");
    if let Some(path) = &cli.config {
        log::info!("Loaded configuration from {}", path.display());
    }

    // After init_logging: rejected values are logged.
    let rejected = config.apply_env();
    if !rejected.is_empty() {
        log::warn!("Ignored invalid environment values: {}", rejected.join(", "));
    }

    match cli.command {
        Command::Harvest { count, base_url } => {
            config.validate()?;
            let base_url = base_url.unwrap_or_else(|| config.source.base_url.clone());
            let count = count.unwrap_or(config.source.desired_count);

            let pipeline = Pipeline::from_config(Arc::new(config)).await?;
            log::info!("Cache backend: {}", pipeline.cache().store().describe());

            let summary = pipeline.run_batch_with(&base_url, count).await?;
            log::info!(
                "Stored {} quotes in {}ms ({} pages attempted, {} skipped, {:?})",
                summary.stored,
                summary.elapsed_ms(),
                summary.report.pages_attempted,
                summary.report.pages_skipped,
                summary.report.termination
            );
        }

        Command::Read { count } => {
            let count = count.unwrap_or(config.source.desired_count);
            let store = storage::connect(&config.cache).await?;
            let cache = QuoteCache::new(store, &config.cache);

            let quotes = cache.read(count).await?;
            log::info!("Read {} quotes from the cache", quotes.len());
            println!("{}", serde_json::to_string_pretty(&quotes)?);
        }

        Command::Serve { address } => {
            let address = address.unwrap_or_else(|| config.server.bind_address());
            let store = storage::connect(&config.cache).await?;
            let cache = QuoteCache::new(store, &config.cache);

            server::serve(&address, cache, config.source.desired_count).await?;
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");
        }

        Command::Info => {
            log::info!("Source: {}", config.source.base_url);
            log::info!(
                "Cache: {} ({})",
                if config.cache.use_local() {
                    config.cache.local_dir.clone()
                } else {
                    config.cache.redis_url()
                },
                config.cache.region
            );
            println!("{}", toml::to_string_pretty(&config)?);
        }
    }

    log::info!("Done!");

    Ok(())
}
