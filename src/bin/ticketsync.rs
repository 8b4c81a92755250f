//! Command-line front end for the ticketing sync SDK.
//!
//! Reads `TICKETSYNC_*` environment variables for the API connection and
//! prints results as JSON.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use ticketsync_sdk::config;
use ticketsync_sdk::queries::{ProductQuery, SearchProductsParams};
use ticketsync_sdk::{Clock, PersistentCache, SdkConfig, SyncError, SystemClock, TicketSyncSdk};

#[derive(Parser)]
#[command(name = "ticketsync", version, about = "Sync and query ticket catalog data")]
struct Cli {
    /// Cache directory (defaults to the platform cache dir)
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Full or incremental product catalog sync
    SyncProducts,
    /// Fetch live inventory for the given product ids
    SyncInventory {
        #[arg(required = true)]
        ids: Vec<u64>,
    },
    /// Sync reference data (only when stale unless --force)
    SyncReference {
        #[arg(long)]
        force: bool,
    },
    /// Search the cached catalog
    Search {
        #[arg(long)]
        text: Option<String>,
        #[arg(long = "type")]
        product_type: Option<String>,
        #[arg(long)]
        team: Option<u64>,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value_t = 20)]
        page_size: usize,
    },
    /// List cached upcoming football matches
    Upcoming,
    /// Fetch the full detail record for one product
    Detail { id: u64 },
    /// Run the background schedulers until Ctrl-C
    Run {
        /// Product ids to keep inventory fresh for (defaults to upcoming matches)
        #[arg(long = "working-set", value_delimiter = ',')]
        working_set: Vec<u64>,
    },
    /// Remove every cached entry
    Clear,
}

impl Command {
    /// Served from the cache alone.
    fn is_local(&self) -> bool {
        matches!(self, Self::Search { .. } | Self::Upcoming | Self::Clear)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ticketsync_sdk::Result<()> {
    let Cli { cache_dir, command } = cli;
    if command.is_local() {
        // Cache-only commands work without API credentials.
        let cache = PersistentCache::open(cache_dir.unwrap_or_else(config::default_cache_dir))?;
        return run_local(&cache, &SystemClock, command);
    }

    let mut builder = TicketSyncSdk::builder().config(SdkConfig::from_env()?);
    if let Some(dir) = cache_dir {
        builder = builder.cache_dir(dir);
    }
    let sdk = builder.build()?;
    tracing::debug!("{}", sdk);

    match command {
        Command::SyncProducts => print_json(&sdk.catalog().sync_products().await)?,
        Command::SyncInventory { ids } => print_json(&sdk.inventory().sync_inventory(&ids).await)?,
        Command::SyncReference { force } => {
            let snapshot = if force {
                sdk.reference().sync_all().await?
            } else {
                sdk.reference().get().await?
            };
            print_json(&serde_json::json!({
                "teams": snapshot.teams.len(),
                "venues": snapshot.venues.len(),
                "competitions": snapshot.competitions.len(),
                "countries": snapshot.countries.len(),
                "ticketCategories": snapshot.ticket_categories.len(),
                "deliveryMethods": snapshot.delivery_methods.len(),
                "lastSync": snapshot.last_sync,
            }))?
        }
        Command::Detail { id } => print_json(&sdk.catalog().fetch_detail(id).await?)?,
        Command::Run { working_set } => {
            let working_set = if working_set.is_empty() {
                sdk.products()
                    .upcoming_matches()?
                    .into_iter()
                    .map(|p| p.id)
                    .collect()
            } else {
                working_set
            };
            let handle = sdk.start_auto_sync(working_set);
            tokio::signal::ctrl_c().await?;
            handle.shutdown().await;
        }
        local => run_local(sdk.cache(), sdk.clock(), local)?,
    }
    Ok(())
}

fn run_local(cache: &PersistentCache, clock: &dyn Clock, command: Command) -> ticketsync_sdk::Result<()> {
    let products = ProductQuery::new(cache, clock);
    match command {
        Command::Search {
            text,
            product_type,
            team,
            page,
            page_size,
        } => {
            let params = SearchProductsParams {
                text,
                product_type,
                team,
                page: Some(page),
                page_size: Some(page_size),
                ..Default::default()
            };
            print_json(&products.search(&params)?)
        }
        Command::Upcoming => print_json(&products.upcoming_matches()?),
        Command::Clear => {
            cache.clear()?;
            tracing::info!("cache cleared");
            Ok(())
        }
        _ => Err(SyncError::InvalidArgument(
            "command needs API access".into(),
        )),
    }
}

fn print_json<T: Serialize>(value: &T) -> ticketsync_sdk::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
