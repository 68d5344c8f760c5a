//! Look up individual coordinates for pincodes that share a location.
//!
//! Queries Nominatim (structured, then free-form) and GeoNames in turn,
//! checkpointing to the progress file so an interrupted run resumes where
//! it stopped. Ctrl-C finishes the current pincode, saves and exits.
//!
//! Environment: `GEONAMES_USERNAME`, `GEOCODER_USER_AGENT` (see
//! `geocode_resolver::config`).

use anyhow::Result;
use clap::Parser;
use geocode_resolver::{
    load_pincode_list, resolve_pending, FallbackChain, Progress, ResolverConfig,
};
use pincode_geo::CoordinateStore;
use pincode_tools::{banner, init_tracing, DEFAULT_FIX_LIST, DEFAULT_PROGRESS, DEFAULT_STORE};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "fetch-unique-coords",
    about = "Resolve shared-location pincodes against external geocoders"
)]
struct Args {
    /// Pincodes to resolve, one per line
    #[arg(short, long, default_value = DEFAULT_FIX_LIST)]
    pincodes: PathBuf,

    /// Current coordinate store
    #[arg(short, long, default_value = DEFAULT_STORE)]
    store: PathBuf,

    /// Resumable progress checkpoint
    #[arg(long, default_value = DEFAULT_PROGRESS)]
    progress: PathBuf,

    /// Store copy with resolved coordinates applied
    #[arg(short, long, default_value = "updated_pincode_coords.json")]
    output: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = ResolverConfig::from_env()?;
    let pincodes = load_pincode_list(&args.pincodes)?;
    let store = CoordinateStore::load(&args.store)?;
    let mut progress = Progress::load_or_default(&args.progress)?;
    let chain = FallbackChain::standard(&config)?;

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, finishing current pincode");
                shutdown.store(true, Ordering::SeqCst);
            }
        });
    }

    banner("FETCHING UNIQUE COORDINATES");
    info!("Strategies: {}", chain.strategy_names().join(" -> "));

    let stats = resolve_pending(
        &chain,
        &pincodes,
        &store,
        &mut progress,
        &args.progress,
        &config,
        &shutdown,
    )
    .await?;

    let updated = progress.apply_to(&store);
    updated.save(&args.output)?;

    banner("FINAL RESULTS");
    info!("Total processed: {}", progress.processed.len());
    info!("Updated across all runs: {}", progress.updated_count());
    info!("Attempted this run: {}", stats.attempted());
    info!("Updated with new coords: {}", stats.updated);
    info!("Unchanged (same coords returned): {}", stats.unchanged);
    info!("Failed (no coords found): {}", stats.failed);
    info!("Skipped (done in an earlier run): {}", stats.skipped);
    info!("Updated coordinates saved to: {:?}", args.output);
    info!("Progress file: {:?}", args.progress);

    if stats.interrupted {
        warn!(
            "Run interrupted at index {}; rerun to resume",
            progress.last_index
        );
    }

    Ok(())
}
