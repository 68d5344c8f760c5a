//! Build the coordinate store from the GeoNames India postal dump.
//!
//! Download `IN.zip` from download.geonames.org/export/zip/ and unpack
//! `IN.txt` first.

use anyhow::Result;
use clap::Parser;
use pincode_geo::geonames::import_file;
use pincode_tools::{init_tracing, DEFAULT_STORE};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "parse-geonames",
    about = "Convert the GeoNames IN.txt dump into a coordinate store"
)]
struct Args {
    /// Tab-separated GeoNames postal dump
    #[arg(short, long, default_value = "/tmp/IN_pincodes.txt")]
    input: PathBuf,

    /// Coordinate store output
    #[arg(short, long, default_value = DEFAULT_STORE)]
    output: PathBuf,

    /// Sample entries to print
    #[arg(long, default_value_t = 5)]
    sample: usize,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    info!("Parsing GeoNames India postal code data from {:?}", args.input);
    let (store, stats) = import_file(&args.input)?;

    info!(
        "Processed {} records total ({} skipped)",
        stats.lines, stats.skipped
    );
    info!("Total unique pincodes: {}", store.len());

    store.save(&args.output)?;
    info!("Saved to: {:?}", args.output);

    info!("Sample entries:");
    for (pincode, coord) in store.iter().take(args.sample) {
        info!("  {}: {}, {}", pincode, coord.lat, coord.lng);
    }

    Ok(())
}
