//! Spread pincodes that share a coordinate onto a golden-angle spiral.
//!
//! Reads the duplicate report written by `find-duplicate-coords` and
//! rewrites the coordinate store in place.

use anyhow::Result;
use clap::Parser;
use pincode_geo::{rewrite_store, SpiralConfig};
use pincode_tools::{banner, init_tracing, DEFAULT_REPORT, DEFAULT_STORE};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "add-jitter", about = "Give every pincode in a shared location its own point")]
struct Args {
    /// Coordinate store, rewritten in place
    #[arg(short, long, default_value = DEFAULT_STORE)]
    store: PathBuf,

    /// Duplicate report from find-duplicate-coords
    #[arg(short, long, default_value = DEFAULT_REPORT)]
    report: PathBuf,

    /// Seed for reproducible placement
    #[arg(long)]
    seed: Option<u64>,

    /// Pincodes to print after saving
    #[arg(
        long,
        value_delimiter = ',',
        default_value = "560001,560002,560003,560010,560020,560050"
    )]
    verify: Vec<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = SpiralConfig::default();
    let mut rng: Box<dyn RngCore> = match args.seed {
        Some(seed) => {
            info!("Using seed {}", seed);
            Box::new(StdRng::seed_from_u64(seed))
        }
        None => Box::new(rand::thread_rng()),
    };

    let (store, summary) = rewrite_store(&args.store, &args.report, &config, rng.as_mut())?;

    info!(
        "Done! Updated {} pincode coordinates ({} clusters, {} report pincodes not in store)",
        summary.updated, summary.clusters_processed, summary.missing
    );

    banner("Verification");
    for pin in &args.verify {
        if let Some(coord) = store.lookup(pin) {
            info!("  {}: [{}, {}]", pin, coord.lat, coord.lng);
        }
    }

    Ok(())
}
