use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use shepherd::{report, router, AppState};
use shepherd_core::config::Config;
use shepherd_core::occupancy::decode_snapshot;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Shepherd parking zone occupancy service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service that hosts a live parking status session
    Serve(ServeArgs),
    /// Group a saved occupancy snapshot by zone and print it
    Aggregate(AggregateArgs),
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// TOML config file; SHEPHERD_* environment variables override it
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct AggregateArgs {
    /// JSON occupancy snapshot (spot id -> occupancy code)
    #[arg(long)]
    spots: PathBuf,
    /// JSON zone documents (zone key -> list of spot ids)
    #[arg(long)]
    zones: Option<PathBuf>,
    /// Print the model as JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve(args) => handle_serve(args).await,
        Command::Aggregate(args) => handle_aggregate(args),
    }
}

async fn handle_serve(args: ServeArgs) -> Result<()> {
    let config = Config::load(args.config.as_deref()).context("failed to load configuration")?;
    let state = AppState::new(&config);

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state).into_make_service())
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!("failed to listen for shutdown signal: {err}");
            }
        })
        .await?;

    info!("server stopped");
    Ok(())
}

fn handle_aggregate(args: AggregateArgs) -> Result<()> {
    let raw = report::read_json(&args.spots)?;
    let spots = decode_snapshot(&raw)
        .with_context(|| format!("invalid occupancy snapshot in '{}'", args.spots.display()))?;

    let zones = args.zones.as_deref().map(report::load_zones);
    let status = report::status_from_inputs(&spots, zones, Utc::now());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("{}", report::render_table(&status));
        println!("{}", report::summary_line(&status));
    }

    Ok(())
}
