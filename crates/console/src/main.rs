//! Terminal front end for the route server.

mod render;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hpcl_core::{
    create_console_channel, load_config_or_default, validate_config, Console, HttpRouteApi,
    PollOutcome, RouteApi, RouteQuery, RouteStatus, TriggerOutcome,
};

/// Route processing console
#[derive(Parser, Debug)]
#[command(name = "hpcl-console", version, about)]
struct Cli {
    /// Configuration file
    #[arg(long, env = "HPCL_CONFIG", default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Route server base URL (overrides console.base_url)
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Process one route and follow it to completion
    Process {
        /// Route ID
        id: String,
    },
    /// Process several routes with staggered requests
    Bulk(BulkArgs),
    /// Show dashboard statistics
    Dashboard {
        /// Refresh once and exit
        #[arg(long)]
        once: bool,
    },
    /// List routes
    Routes {
        /// Only show routes whose name or codes contain this text
        #[arg(long)]
        filter: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        per_page: u32,
    },
    /// Download a route export
    Export {
        #[arg(long, default_value = "csv")]
        format: String,
        /// Output file (defaults to the server-suggested filename)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct BulkArgs {
    /// Route IDs, in processing order
    ids: Vec<String>,

    /// Select every pending route instead of explicit IDs
    #[arg(long, conflicts_with = "ids")]
    pending: bool,
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
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = load_config_or_default(&cli.config)
        .with_context(|| format!("Failed to load config from {:?}", cli.config))?;
    if let Some(base_url) = cli.base_url {
        config.console.base_url = base_url;
    }
    validate_config(&config).context("Configuration validation failed")?;

    let api: Arc<dyn RouteApi> = Arc::new(
        HttpRouteApi::new(&config.console.base_url, config.console.request_timeout())
            .context("Failed to create route API client")?,
    );
    info!(base_url = %config.console.base_url, "Route console starting");

    let (handle, events) = create_console_channel(config.console.event_buffer);
    let renderer = tokio::spawn(render::run(events));
    let console = Console::new(api, config.console.clone(), handle);

    let result = execute(&console, cli.command).await;

    // Closing the last handle ends the renderer once queued events are printed.
    drop(console);
    let _ = renderer.await;

    result
}

async fn execute(console: &Console, command: Command) -> Result<()> {
    match command {
        Command::Process { id } => process(console, &id).await,
        Command::Bulk(args) => bulk(console, args).await,
        Command::Dashboard { once } => dashboard(console, once).await,
        Command::Routes {
            filter,
            page,
            per_page,
        } => {
            let query = RouteQuery::default().with_page(page).with_per_page(per_page);
            let page = console
                .routes(&query, filter.as_deref())
                .await
                .context("Failed to list routes")?;
            render::print_routes(&page);
            Ok(())
        }
        Command::Export { format, output } => {
            let file = console
                .api()
                .export_routes(&format)
                .await
                .context("Export failed")?;
            let path = output.unwrap_or_else(|| PathBuf::from(&file.filename));
            tokio::fs::write(&path, &file.bytes)
                .await
                .with_context(|| format!("Failed to write {:?}", path))?;
            println!("Exported {} bytes to {}", file.bytes.len(), path.display());
            Ok(())
        }
    }
}

async fn process(console: &Console, id: &str) -> Result<()> {
    match console.process_route(id).await {
        TriggerOutcome::Failed(message) => bail!("Route {} was not started: {}", id, message),
        started => match started.wait().await {
            Some(PollOutcome::Failed { .. }) => bail!("Route {} failed", id),
            Some(PollOutcome::GaveUp { polls }) => {
                bail!("Route {} still processing after {} status checks", id, polls)
            }
            _ => Ok(()),
        },
    }
}

async fn bulk(console: &Console, args: BulkArgs) -> Result<()> {
    let ids = if args.pending {
        pending_route_ids(console).await?
    } else {
        args.ids
    };

    let summary = console.process_routes(&ids).await?;
    if summary.failed > 0 {
        bail!(
            "{} of {} routes could not be started",
            summary.failed,
            summary.total
        );
    }
    Ok(())
}

/// Collect the IDs of all pending routes, page by page.
async fn pending_route_ids(console: &Console) -> Result<Vec<String>> {
    let mut ids = Vec::new();
    let mut query = RouteQuery::default()
        .with_per_page(200)
        .with_status(RouteStatus::Pending);

    loop {
        let page = console
            .routes(&query, None)
            .await
            .context("Failed to list pending routes")?;
        let fetched = page.routes.len();
        ids.extend(page.routes.into_iter().map(|route| route.id));
        if fetched == 0 || ids.len() as u64 >= page.total {
            break;
        }
        let next_page = query.page + 1;
        query = query.with_page(next_page);
    }

    Ok(ids)
}

async fn dashboard(console: &Console, once: bool) -> Result<()> {
    let refresher = console.dashboard();
    if refresher.refresh_once().await.is_none() {
        bail!("Could not fetch statistics from {}", console.config().base_url);
    }
    if once {
        return Ok(());
    }

    refresher.start();
    signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;
    refresher.stop();
    Ok(())
}
