//! Report pincodes that share a coordinate.
//!
//! Usage:
//!   find-duplicate-coords --store public/data/pincode_latlng.json \
//!                         --report duplicate_coords_report.json

use anyhow::Result;
use clap::Parser;
use pincode_geo::{find_duplicates, CoordinateStore};
use pincode_tools::{banner, init_tracing, DEFAULT_FIX_LIST, DEFAULT_REPORT, DEFAULT_STORE};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "find-duplicate-coords",
    about = "Find pincodes sharing the same coordinate"
)]
struct Args {
    /// Coordinate store to analyse
    #[arg(short, long, default_value = DEFAULT_STORE)]
    store: PathBuf,

    /// Duplicate report output
    #[arg(short, long, default_value = DEFAULT_REPORT)]
    report: PathBuf,

    /// Flat list of every pincode at a shared location
    #[arg(long, default_value = DEFAULT_FIX_LIST)]
    fix_list: PathBuf,

    /// Number of largest clusters to print
    #[arg(long, default_value_t = 50)]
    top: usize,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let store = CoordinateStore::load(&args.store)?;
    info!("Total pincodes: {}", store.len());

    let report = find_duplicates(&store);
    let summary = &report.summary;

    banner("DUPLICATE COORDINATES ANALYSIS");
    info!("Unique coordinate locations: {}", summary.unique_locations);
    info!("Locations with multiple pincodes: {}", summary.duplicate_locations);
    info!(
        "Total pincodes at duplicate locations: {}",
        summary.pincodes_at_duplicate_locations
    );
    info!(
        "Pincodes at unique locations: {}",
        summary.pincodes_at_unique_locations
    );

    banner(&format!("TOP {} DUPLICATE LOCATIONS", args.top));
    for (i, cluster) in report.duplicates.iter().take(args.top).enumerate() {
        let pins: Vec<&str> = cluster.pincodes.iter().map(|p| p.as_str()).collect();
        info!(
            "{}. [{}, {}] - {} pincodes:",
            i + 1,
            cluster.lat,
            cluster.lng,
            cluster.count
        );
        info!("   {}", pins.join(", "));
    }

    banner("DISTRIBUTION BY DUPLICATE COUNT");
    for (count, locations) in report.distribution.iter().rev() {
        info!("{} pincodes at same location: {} locations", count, locations);
    }

    report.save(&args.report)?;
    info!("Full report saved to: {:?}", args.report);

    let written = report.write_fix_list(&args.fix_list)?;
    info!(
        "Pincodes needing unique coords saved to: {:?} ({} pincodes)",
        args.fix_list, written
    );

    Ok(())
}
