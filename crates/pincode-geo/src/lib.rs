//! Pincode Coordinate Toolkit
//!
//! Holds the persisted pincode → coordinate mapping and the offline passes
//! that clean it up before it reaches the map:
//!
//! 1. [`duplicates`] groups pincodes that share a rounded coordinate.
//! 2. [`spiral`] spreads each shared location into distinct points on a
//!    golden-angle spiral.
//! 3. [`rewriter`] writes the spread points back into the [`CoordinateStore`].
//!
//! # Precision
//!
//! All coordinates are decimal degrees kept at 6 decimal places
//! (≈0.11 m at the equator). "Same location" means equal after rounding
//! both axes to that precision.
//!
//! | Cluster size | Spread radius |
//! |--------------|---------------|
//! | ≥100         | 0.15° (≈16.7 km) |
//! | 50–99        | 0.12° (≈13.3 km) |
//! | 30–49        | 0.08° (≈8.9 km)  |
//! | 15–29        | 0.05° (≈5.6 km)  |
//! | 5–14         | 0.03° (≈3.3 km)  |
//! | 2–4          | 0.015° (≈1.7 km) |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub mod duplicates;
pub mod geonames;
pub mod rewriter;
pub mod spiral;
pub mod store;

pub use duplicates::{find_duplicates, Cluster, DuplicateReport, DuplicateSummary};
pub use rewriter::{apply_report, rewrite_store, RewriteSummary};
pub use spiral::{distribute_in_spiral, RadiusTier, SpiralConfig};
pub use store::{CoordinateStore, LoadStats};

/// Decimal places kept for every stored coordinate
pub const COORD_PRECISION: u32 = 6;

/// Scale factor matching [`COORD_PRECISION`]
pub const COORD_SCALE: f64 = 1_000_000.0;

/// Approximate kilometres per degree of latitude
pub const KM_PER_DEGREE: f64 = 111.0;

/// Length of a canonical Indian postal code
pub const PINCODE_LEN: usize = 6;

#[derive(Error, Debug)]
pub enum GeoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid pincode: {0:?}")]
    InvalidPincode(String),
    #[error("Invalid coordinate: lat={lat}, lng={lng}")]
    InvalidCoordinate { lat: f64, lng: f64 },
    #[error("Malformed coordinate store: {0}")]
    MalformedStore(String),
    #[error("Malformed duplicate report: {0}")]
    MalformedReport(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, GeoError>;

/// Round a degree value to [`COORD_PRECISION`] decimal places
pub fn round_coord(value: f64) -> f64 {
    (value * COORD_SCALE).round() / COORD_SCALE
}

/// A 6-digit, zero-padded Indian postal code
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pincode(String);

impl Pincode {
    /// Accept exactly six ASCII digits
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        if raw.len() == PINCODE_LEN && raw.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(raw))
        } else {
            Err(GeoError::InvalidPincode(raw))
        }
    }

    /// Canonicalize feed values that lost their leading zeros
    /// (`"11001"` → `"011001"`). Surrounding whitespace is ignored.
    pub fn normalize(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty()
            || trimmed.len() > PINCODE_LEN
            || !trimmed.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(GeoError::InvalidPincode(raw.to_string()));
        }
        Ok(Self(format!("{:0>width$}", trimmed, width = PINCODE_LEN)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Pincode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Pincode {
    type Err = GeoError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for Pincode {
    type Error = GeoError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Pincode> for String {
    fn from(p: Pincode) -> Self {
        p.0
    }
}

impl AsRef<str> for Pincode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    /// Build a validated coordinate
    pub fn new(lat: f64, lng: f64) -> Result<Self> {
        let c = Self { lat, lng };
        if c.is_valid() {
            Ok(c)
        } else {
            Err(GeoError::InvalidCoordinate { lat, lng })
        }
    }

    /// Both axes finite and inside WGS84 bounds
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Both axes rounded to store precision
    pub fn rounded(&self) -> Self {
        Self {
            lat: round_coord(self.lat),
            lng: round_coord(self.lng),
        }
    }

    /// Pull an out-of-range point back inside WGS84 bounds
    pub fn clamped(&self) -> Self {
        Self {
            lat: self.lat.clamp(-90.0, 90.0),
            lng: self.lng.clamp(-180.0, 180.0),
        }
    }

    /// True when either axis differs by more than `threshold_deg`
    pub fn differs_from(&self, other: &Coordinate, threshold_deg: f64) -> bool {
        (self.lat - other.lat).abs() > threshold_deg || (self.lng - other.lng).abs() > threshold_deg
    }

    /// Planar distance in degree space
    pub fn degree_distance(&self, other: &Coordinate) -> f64 {
        (self.lat - other.lat).hypot(self.lng - other.lng)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.lat, self.lng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pincode_validation() {
        assert!(Pincode::new("560001").is_ok());
        assert!(Pincode::new("56001").is_err());
        assert!(Pincode::new("5600011").is_err());
        assert!(Pincode::new("56A001").is_err());
        assert!(Pincode::new("").is_err());
    }

    #[test]
    fn test_pincode_normalize_pads() {
        assert_eq!(Pincode::normalize("11001").unwrap().as_str(), "011001");
        assert_eq!(Pincode::normalize(" 560001 ").unwrap().as_str(), "560001");
        assert!(Pincode::normalize("1234567").is_err());
        assert!(Pincode::normalize("12-456").is_err());
    }

    #[test]
    fn test_pincode_serde_rejects_bad_keys() {
        let ok: Pincode = serde_json::from_str("\"110001\"").unwrap();
        assert_eq!(ok.as_str(), "110001");
        assert!(serde_json::from_str::<Pincode>("\"abc\"").is_err());
    }

    #[test]
    fn test_coordinate_bounds() {
        assert!(Coordinate::new(12.9716, 77.5946).is_ok());
        assert!(Coordinate::new(91.0, 0.0).is_err());
        assert!(Coordinate::new(0.0, -180.5).is_err());
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_round_coord() {
        assert_eq!(round_coord(12.3456784), 12.345678);
        assert_eq!(round_coord(12.3456786), 12.345679);
        assert_eq!(round_coord(-77.1234564), -77.123456);
    }

    #[test]
    fn test_differs_from_threshold() {
        let a = Coordinate { lat: 20.0, lng: 78.0 };
        let b = Coordinate { lat: 20.0005, lng: 78.0005 };
        let c = Coordinate { lat: 20.0, lng: 78.002 };
        assert!(!a.differs_from(&b, 0.001));
        assert!(a.differs_from(&c, 0.001));
    }
}
