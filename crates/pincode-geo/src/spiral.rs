//! Golden-angle spiral redistribution
//!
//! Spreads `count` coincident points around their shared center:
//!
//! ```text
//! r_i     = R · √(i / n)          (area-uniform radial growth)
//! θ_i     = i · π(3 − √5)         (golden angle ≈ 2.39996 rad)
//! lat_i   = lat₀ + r_i·(1 ± ε_r) · cos(θ_i ± ε_θ)
//! lng_i   = lng₀ + r_i·(1 ± ε_r) · sin(θ_i ± ε_θ)
//! ```
//!
//! Point 0 stays on the reported location, displaced by at most the anchor
//! jitter on each axis. Jitter is drawn from the caller's RNG; pass a seeded
//! generator for reproducible output.

use crate::{Coordinate, GeoError, Result, KM_PER_DEGREE};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Spread radius applied to clusters of at least `min_count` pincodes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadiusTier {
    pub min_count: usize,
    pub radius_deg: f64,
}

impl RadiusTier {
    pub const fn new(min_count: usize, radius_deg: f64) -> Self {
        Self {
            min_count,
            radius_deg,
        }
    }

    pub fn radius_km(&self) -> f64 {
        self.radius_deg * KM_PER_DEGREE
    }
}

/// Radius step table, largest clusters first
pub const DEFAULT_RADIUS_TIERS: [RadiusTier; 6] = [
    RadiusTier::new(100, 0.15),
    RadiusTier::new(50, 0.12),
    RadiusTier::new(30, 0.08),
    RadiusTier::new(15, 0.05),
    RadiusTier::new(5, 0.03),
    RadiusTier::new(2, 0.015),
];

/// Max displacement of point 0 on each axis (degrees)
pub const DEFAULT_ANCHOR_JITTER_DEG: f64 = 0.001;

/// Multiplicative jitter on the spiral radius (±5%)
pub const DEFAULT_RADIAL_JITTER: f64 = 0.05;

/// Additive jitter on the spiral angle (radians)
pub const DEFAULT_ANGULAR_JITTER_RAD: f64 = 0.1;

/// The golden angle π(3 − √5)
pub fn golden_angle() -> f64 {
    PI * (3.0 - 5.0_f64.sqrt())
}

/// Tunables for spiral placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpiralConfig {
    /// Descending by `min_count`
    pub tiers: Vec<RadiusTier>,
    pub anchor_jitter_deg: f64,
    pub radial_jitter: f64,
    pub angular_jitter_rad: f64,
}

impl Default for SpiralConfig {
    fn default() -> Self {
        Self {
            tiers: DEFAULT_RADIUS_TIERS.to_vec(),
            anchor_jitter_deg: DEFAULT_ANCHOR_JITTER_DEG,
            radial_jitter: DEFAULT_RADIAL_JITTER,
            angular_jitter_rad: DEFAULT_ANGULAR_JITTER_RAD,
        }
    }
}

impl SpiralConfig {
    pub fn validate(&self) -> Result<()> {
        if self.tiers.is_empty() {
            return Err(GeoError::InvalidConfig("radius table is empty".into()));
        }
        if self.tiers.windows(2).any(|w| w[0].min_count <= w[1].min_count) {
            return Err(GeoError::InvalidConfig(
                "radius tiers must be strictly descending by min_count".into(),
            ));
        }
        if self.tiers.iter().any(|t| !(t.radius_deg > 0.0)) {
            return Err(GeoError::InvalidConfig("radius must be positive".into()));
        }
        if !(0.0..1.0).contains(&self.radial_jitter)
            || self.anchor_jitter_deg < 0.0
            || self.angular_jitter_rad < 0.0
        {
            return Err(GeoError::InvalidConfig(
                "jitter amplitudes must be non-negative (radial < 1)".into(),
            ));
        }
        Ok(())
    }

    /// Exact table lookup, no interpolation. Sizes below the smallest tier
    /// get the smallest tier.
    pub fn tier_for(&self, count: usize) -> Option<&RadiusTier> {
        self.tiers
            .iter()
            .find(|t| count >= t.min_count)
            .or_else(|| self.tiers.last())
    }

    pub fn radius_for(&self, count: usize) -> f64 {
        self.tier_for(count).map_or(0.0, |t| t.radius_deg)
    }
}

/// Uniform draw in `[-amplitude, amplitude]`
fn symmetric<R: Rng + ?Sized>(rng: &mut R, amplitude: f64) -> f64 {
    if amplitude > 0.0 {
        rng.gen_range(-amplitude..=amplitude)
    } else {
        0.0
    }
}

/// Place `count` points around `center`, index-aligned with the cluster's
/// pincode list. Output is rounded to store precision.
pub fn distribute_in_spiral<R: Rng + ?Sized>(
    center: Coordinate,
    count: usize,
    radius: f64,
    config: &SpiralConfig,
    rng: &mut R,
) -> Vec<Coordinate> {
    let golden = golden_angle();
    let mut points = Vec::with_capacity(count);

    for i in 0..count {
        let point = if i == 0 {
            Coordinate {
                lat: center.lat + symmetric(rng, config.anchor_jitter_deg),
                lng: center.lng + symmetric(rng, config.anchor_jitter_deg),
            }
        } else {
            let r = radius * (i as f64 / count as f64).sqrt();
            let theta = i as f64 * golden;

            let r_jittered = r * (1.0 + symmetric(rng, config.radial_jitter));
            let theta_jittered = theta + symmetric(rng, config.angular_jitter_rad);

            Coordinate {
                lat: center.lat + r_jittered * theta_jittered.cos(),
                lng: center.lng + r_jittered * theta_jittered.sin(),
            }
        };
        points.push(point.clamped().rounded());
    }

    points
}
