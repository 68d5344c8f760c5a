//! List dataset pincodes that have no stored coordinate.

use anyhow::Result;
use clap::Parser;
use dataset_aggregator::scan_coverage;
use pincode_geo::CoordinateStore;
use pincode_tools::{banner, init_tracing, DEFAULT_MISSING_LIST, DEFAULT_STORE};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "find-missing-pincodes",
    about = "Compare dataset CSV pincodes against the coordinate store"
)]
struct Args {
    /// Directory searched recursively for CSV files
    #[arg(short, long, default_value = "public/data")]
    data_dir: PathBuf,

    /// Coordinate store
    #[arg(short, long, default_value = DEFAULT_STORE)]
    store: PathBuf,

    /// Missing pincode list output
    #[arg(short, long, default_value = DEFAULT_MISSING_LIST)]
    output: PathBuf,

    /// Missing pincodes to print
    #[arg(long, default_value_t = 20)]
    sample: usize,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let store = CoordinateStore::load(&args.store)?;
    info!("Existing pincodes in store: {}", store.len());

    let report = scan_coverage(&args.data_dir, &store)?;

    banner("Summary");
    info!(
        "CSV files scanned: {} ({} without a pincode column)",
        report.files_scanned, report.files_skipped
    );
    info!("Total unique pincodes in CSVs: {}", report.total());
    info!("Pincodes with coordinates: {}", report.covered());
    info!("Missing pincodes: {}", report.missing.len());
    info!("Coverage: {:.2}%", report.coverage_pct());

    report.write_missing_list(&args.output)?;
    info!("Saved missing pincodes to {:?}", args.output);

    if !report.missing.is_empty() {
        let sample: Vec<&str> = report
            .missing
            .iter()
            .take(args.sample)
            .map(|p| p.as_str())
            .collect();
        info!("Sample missing: {}", sample.join(", "));
    }

    Ok(())
}
