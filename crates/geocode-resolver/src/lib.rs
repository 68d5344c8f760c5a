//! External Pincode Geocoding
//!
//! Resolves pincodes that still share a coordinate (or have none) against
//! third-party geocoders, one request at a time, with fixed pauses between
//! requests to respect each service's rate limit.
//!
//! # Strategy order
//!
//! | # | Strategy | Provenance tag | Pause |
//! |---|----------|----------------|-------|
//! | 1 | Nominatim structured `postalcode=` search | `nominatim-structured` | 1.1 s |
//! | 2 | Nominatim free-form search, postcode-confirmed | `nominatim-freeform` / `nominatim-freeform-fallback` | 1.1 s |
//! | 3 | GeoNames `postalCodeSearchJSON` | `geonames` | 0.5 s |
//!
//! The first strategy whose answer differs from the stored coordinate by
//! more than the threshold (0.001° on either axis) wins.
//!
//! Progress is checkpointed to disk so an interrupted run resumes where it
//! stopped without re-querying finished or exhausted pincodes.

use pincode_geo::{Coordinate, GeoError};
use thiserror::Error;

pub mod chain;
pub mod config;
pub mod data_gov;
pub mod http;
pub mod missing;
pub mod progress;
pub mod runner;
pub mod strategies;

pub use chain::{FallbackChain, Resolution};
pub use config::ResolverConfig;
pub use progress::{EntryStatus, Progress, ProgressEntry};
pub use data_gov::{DataGovConfig, DataGovImporter, ImportSummary};
pub use missing::{fetch_missing, MissingFetchOutcome};
pub use runner::{load_pincode_list, resolve_pending, BatchStats};
pub use strategies::GeocodeStrategy;

#[derive(Error, Debug)]
pub enum ResolverError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{service} returned status {status}")]
    Status { service: String, status: u16 },
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Geo(#[from] GeoError),
    #[error("Missing API key: set {0}")]
    MissingApiKey(&'static str),
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ResolverError>;

/// A coordinate returned by one geocoder
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeHit {
    pub coordinate: Coordinate,
    /// Provenance tag, e.g. `nominatim-structured`
    pub source: String,
    pub display_name: Option<String>,
}

impl GeocodeHit {
    pub fn new(coordinate: Coordinate, source: impl Into<String>) -> Self {
        Self {
            coordinate,
            source: source.into(),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: Option<String>) -> Self {
        self.display_name = name;
        self
    }
}

/// Lenient float parse for feeds that send numbers as strings
pub(crate) fn parse_degrees(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|v: &f64| v.is_finite())
}
