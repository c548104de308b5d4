//! Batch launcher: prepares the environment, checks the datastore and
//! processes routes on a fixed-size worker pool.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hpcl_core::{
    check_datastore, load_config_or_default, prepare_environment, read_route_list,
    validate_config, BatchRunner, GeometryProcessor, RouteProcessor, RouteStore,
};

/// Batch route processing
#[derive(Parser, Debug)]
#[command(name = "route-batch", version, about)]
#[command(group(ArgGroup::new("mode").required(true).args(["pending", "csv"])))]
struct Cli {
    /// Process all pending routes
    #[arg(long)]
    pending: bool,

    /// Process the routes listed in a from_code,to_code file
    #[arg(long, value_name = "PATH")]
    csv: Option<PathBuf>,

    /// Number of worker tasks (defaults to batch.workers)
    #[arg(long)]
    workers: Option<usize>,

    /// Configuration file
    #[arg(long, env = "HPCL_CONFIG", default_value = "config.toml")]
    config: PathBuf,

    /// Also reprocess routes whose previous processing failed
    #[arg(long)]
    retry_failed: bool,

    /// Route database (overrides database.path)
    #[arg(long, value_name = "PATH")]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = load_config_or_default(&cli.config)
        .with_context(|| format!("Failed to load config from {:?}", cli.config))?;
    if let Some(database) = cli.database {
        config.database.path = database;
    }
    if let Some(workers) = cli.workers {
        config.batch.workers = workers;
    }
    validate_config(&config).context("Configuration validation failed")?;

    info!("Setting up batch environment");
    prepare_environment(&config.batch).context("Environment setup failed")?;

    let store: Arc<dyn RouteStore> = Arc::new(
        check_datastore(&config.database.path).context("Datastore connection check failed")?,
    );
    info!(path = %config.database.path.display(), "Datastore reachable");

    let processor: Arc<dyn RouteProcessor> = Arc::new(GeometryProcessor::new(
        config.batch.sharp_turn_threshold_deg,
    ));
    let runner = BatchRunner::new(store, processor, config.batch.workers);

    let summary = match cli.csv {
        Some(path) => {
            info!(path = %path.display(), "Processing routes from file");
            let entries = read_route_list(&path)?;
            runner.run_route_list(&entries).await?
        }
        None => {
            let include_failed = cli.retry_failed || config.batch.retry_failed;
            info!(include_failed, "Processing pending routes");
            runner.run_pending(include_failed).await?
        }
    };

    println!("{}", summary.render());
    Ok(())
}
