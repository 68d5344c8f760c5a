//! Geocode dataset pincodes that have no coordinate at all.
//!
//! Input is the list written by `find-missing-pincodes`; found coordinates
//! are merged into the store, the rest go to the still-missing list.

use anyhow::Result;
use clap::Parser;
use geocode_resolver::http::HttpClient;
use geocode_resolver::strategies::NominatimCountrySearch;
use geocode_resolver::{fetch_missing, load_pincode_list, ResolverConfig};
use pincode_geo::CoordinateStore;
use pincode_tools::{banner, init_tracing, write_lines, DEFAULT_MISSING_LIST, DEFAULT_STORE};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "fetch-missing-pincodes",
    about = "Fill pincodes missing from the store via Nominatim"
)]
struct Args {
    /// Pincodes to look up, one per line
    #[arg(short, long, default_value = DEFAULT_MISSING_LIST)]
    missing: PathBuf,

    /// Coordinate store, updated in place
    #[arg(short, long, default_value = DEFAULT_STORE)]
    store: PathBuf,

    /// Pincodes Nominatim could not place
    #[arg(long, default_value = "still_missing_pincodes.txt")]
    still_missing: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = ResolverConfig::from_env()?;
    let pincodes = load_pincode_list(&args.missing)?;
    info!("Found {} missing pincodes to fetch", pincodes.len());

    let mut store = CoordinateStore::load(&args.store)?;
    info!("Existing pincodes: {}", store.len());

    let strategy = NominatimCountrySearch::new(HttpClient::new(&config)?, &config);
    let outcome = fetch_missing(&strategy, &pincodes, &mut store).await;

    store.save(&args.store)?;

    banner("Done");
    info!("Found coordinates: {}", outcome.found);
    info!("Not found: {}", outcome.not_found.len());
    info!("Total pincodes now: {}", store.len());
    info!("Saved to: {:?}", args.store);

    if !outcome.not_found.is_empty() {
        write_lines(&args.still_missing, outcome.not_found.iter())?;
        info!("Still missing saved to: {:?}", args.still_missing);
    }

    Ok(())
}
