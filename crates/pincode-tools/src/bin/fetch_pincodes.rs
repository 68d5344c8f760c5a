//! Build the coordinate store from the data.gov.in pincode directory.
//!
//! Requires `DATA_GOV_API_KEY`.

use anyhow::Result;
use clap::Parser;
use geocode_resolver::{DataGovConfig, DataGovImporter, ResolverConfig};
use pincode_tools::{init_tracing, DEFAULT_STORE};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "fetch-pincodes",
    about = "Download all-India pincode coordinates from data.gov.in"
)]
struct Args {
    /// Coordinate store output
    #[arg(short, long, default_value = DEFAULT_STORE)]
    output: PathBuf,

    /// Records per page
    #[arg(long, default_value_t = 1000, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    page_size: usize,

    /// Attempts per page before giving up
    #[arg(long, default_value_t = 5)]
    max_retries: u32,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = DataGovConfig {
        page_size: args.page_size,
        max_retries: args.max_retries,
        ..DataGovConfig::from_env()?
    };
    let importer = DataGovImporter::new(config, &ResolverConfig::from_env()?)?;

    info!("Fetching pincode data from data.gov.in...");
    let (store, summary) = importer.import_all().await?;

    info!(
        "Total unique pincodes with coordinates: {} ({} records over {} pages)",
        summary.unique_pincodes, summary.records, summary.pages
    );

    store.save(&args.output)?;
    info!("Saved to: {:?}", args.output);
    Ok(())
}
