//! Dataset Aggregation
//!
//! Turns per-row statistics CSVs into one map point per pincode:
//!
//! 1. [`config`] describes the available categories, their metrics and files.
//! 2. [`records`] reads CSV rows and attaches stored coordinates.
//! 3. [`aggregate`] sums metrics per pincode and emits a GeoJSON
//!    `FeatureCollection` for the selected metric.
//!
//! [`coverage`] answers the reverse question: which dataset pincodes have no
//! coordinate yet.

use pincode_geo::GeoError;
use thiserror::Error;

pub mod aggregate;
pub mod cache;
pub mod config;
pub mod coverage;
pub mod records;

pub use aggregate::{aggregate_by_pincode, to_feature_collection, AggregatedPoint};
pub use cache::CoordinateCache;
pub use config::{DatasetCategory, DatasetFile, DatasetsConfig, MetricConfig, MetricSet};
pub use coverage::{find_csv_files, scan_coverage, CoverageReport};
pub use records::{attach_coordinates, read_csv_file, read_csv_files, GeoRecord, RawRecord};

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Unknown dataset category: {0}")]
    UnknownCategory(String),
    #[error("Unknown file {file:?} in category {category:?}")]
    UnknownFile { category: String, file: String },
    #[error("Unknown metric {metric:?} in category {category:?}")]
    UnknownMetric { category: String, metric: String },
    #[error(transparent)]
    Geo(#[from] GeoError),
}

pub type Result<T> = std::result::Result<T, DatasetError>;
