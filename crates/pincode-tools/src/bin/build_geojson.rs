//! Aggregate a dataset category into a per-pincode GeoJSON layer.
//!
//! Usage:
//!   build-geojson --category enrolment --metric age_0_5 --output enrolment.geojson

use anyhow::{bail, Result};
use clap::Parser;
use dataset_aggregator::{
    attach_coordinates, read_csv_files, to_feature_collection, CoordinateCache, DatasetsConfig,
};
use pincode_tools::{init_tracing, DEFAULT_STORE};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "build-geojson", about = "Build a per-pincode FeatureCollection for one metric")]
struct Args {
    /// Dataset configuration
    #[arg(short, long, default_value = "public/data/datasets.json")]
    config: PathBuf,

    /// Directory that dataset file paths are relative to
    #[arg(long, default_value = "public")]
    root: PathBuf,

    /// Coordinate store
    #[arg(short, long, default_value = DEFAULT_STORE)]
    store: PathBuf,

    /// Category id (default: first category)
    #[arg(long)]
    category: Option<String>,

    /// File ids to include (default: the category's first file)
    #[arg(long, value_delimiter = ',')]
    files: Vec<String>,

    /// Use every file of the category
    #[arg(long, conflicts_with = "files")]
    all_files: bool,

    /// Metric key (default: the category's first metric)
    #[arg(long)]
    metric: Option<String>,

    /// GeoJSON output
    #[arg(short, long, default_value = "pincode_features.geojson")]
    output: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Dataset paths are site-absolute (`/data/...`); anchor them at `root`
fn resolve_path(root: &Path, dataset_path: &str) -> PathBuf {
    root.join(dataset_path.trim_start_matches('/'))
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let datasets = DatasetsConfig::load(&args.config)?;
    let category = match &args.category {
        Some(id) => datasets.category(id)?,
        None => match datasets.categories.first() {
            Some(c) => c,
            None => bail!("{:?} defines no categories", args.config),
        },
    };

    let metric = match &args.metric {
        Some(key) => {
            category.metric(key)?;
            key.clone()
        }
        None => match category.metrics.first_key() {
            Some(key) => key.to_string(),
            None => bail!("category {:?} defines no metrics", category.id),
        },
    };

    let files = if args.all_files {
        category.files.iter().collect::<Vec<_>>()
    } else if args.files.is_empty() {
        category.files.iter().take(1).collect()
    } else {
        args.files
            .iter()
            .map(|id| category.file(id))
            .collect::<dataset_aggregator::Result<Vec<_>>>()?
    };
    if files.is_empty() {
        bail!("category {:?} has no files", category.id);
    }

    let paths: Vec<PathBuf> = files
        .iter()
        .map(|f| resolve_path(&args.root, &f.path))
        .collect();
    info!(
        "Category {:?}, metric {:?}, {} file(s)",
        category.id,
        metric,
        paths.len()
    );

    let mut cache = CoordinateCache::new(&args.store);
    let records = read_csv_files(&paths)?;
    let placed = attach_coordinates(records, cache.get_or_load()?);
    let collection = to_feature_collection(&placed, &metric);

    info!("Writing {} features to {:?}", collection.features.len(), args.output);
    let writer = BufWriter::new(File::create(&args.output)?);
    serde_json::to_writer(writer, &collection)?;

    Ok(())
}
