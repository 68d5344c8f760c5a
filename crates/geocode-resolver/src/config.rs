//! Resolver tunables
//!
//! Defaults match the public usage policies of the services involved.
//! Selected values can be overridden from the environment:
//!
//! - `GEONAMES_USERNAME`: GeoNames account (default: "demo")
//! - `GEOCODER_USER_AGENT`: User-Agent sent to Nominatim
//! - `GEOCODE_THRESHOLD_DEG`: minimum change that counts as a new coordinate
//! - `NOMINATIM_DELAY_MS`: pause after each Nominatim request (default: 1100)
//! - `GEONAMES_DELAY_MS`: pause after each GeoNames request (default: 500)
//! - `GEOCODE_MAX_RETRIES`: retries for transient request failures (default: 2)

use crate::{ResolverError, Result};
use std::time::Duration;

pub const NOMINATIM_BASE_URL: &str = "https://nominatim.openstreetmap.org";
pub const GEONAMES_BASE_URL: &str = "http://api.geonames.org";
pub const DEFAULT_USER_AGENT: &str = "LokDristi-GeoVisualization/1.0 (Educational Project)";

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub user_agent: String,
    pub geonames_username: String,
    pub nominatim_base_url: String,
    pub geonames_base_url: String,
    /// A hit within this distance (either axis) of the stored value is "the same"
    pub difference_threshold_deg: f64,
    pub nominatim_delay: Duration,
    pub geonames_delay: Duration,
    pub request_timeout: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
    /// Pincodes between progress saves
    pub checkpoint_every: usize,
    /// Pincodes between stats logs
    pub stats_every: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            geonames_username: "demo".to_string(),
            nominatim_base_url: NOMINATIM_BASE_URL.to_string(),
            geonames_base_url: GEONAMES_BASE_URL.to_string(),
            difference_threshold_deg: 0.001,
            nominatim_delay: Duration::from_millis(1100),
            geonames_delay: Duration::from_millis(500),
            request_timeout: Duration::from_secs(10),
            max_retries: 2,
            retry_delay: Duration::from_millis(2000),
            checkpoint_every: 10,
            stats_every: 50,
        }
    }
}

impl ResolverConfig {
    /// Defaults with environment overrides applied
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            user_agent: env_or("GEOCODER_USER_AGENT", defaults.user_agent)?,
            geonames_username: env_or("GEONAMES_USERNAME", defaults.geonames_username)?,
            difference_threshold_deg: env_or(
                "GEOCODE_THRESHOLD_DEG",
                defaults.difference_threshold_deg,
            )?,
            nominatim_delay: Duration::from_millis(env_or(
                "NOMINATIM_DELAY_MS",
                defaults.nominatim_delay.as_millis() as u64,
            )?),
            geonames_delay: Duration::from_millis(env_or(
                "GEONAMES_DELAY_MS",
                defaults.geonames_delay.as_millis() as u64,
            )?),
            max_retries: env_or("GEOCODE_MAX_RETRIES", defaults.max_retries)?,
            ..defaults
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.difference_threshold_deg >= 0.0) {
            return Err(ResolverError::Config(
                "difference threshold must be non-negative".into(),
            ));
        }
        if self.checkpoint_every == 0 || self.stats_every == 0 {
            return Err(ResolverError::Config(
                "checkpoint and stats intervals must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Read an environment variable, falling back to `default` when unset.
///
/// Set-but-unparsable values are errors.
fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .parse::<T>()
            .map_err(|e| ResolverError::Config(format!("Failed to parse {}: {}", key, e))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ResolverConfig::default();
        assert_eq!(config.difference_threshold_deg, 0.001);
        assert_eq!(config.nominatim_delay, Duration::from_millis(1100));
        assert_eq!(config.geonames_delay, Duration::from_millis(500));
        assert_eq!(config.checkpoint_every, 10);
        assert_eq!(config.stats_every, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let config = ResolverConfig {
            checkpoint_every: 0,
            ..ResolverConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_or_parses_and_defaults() {
        assert_eq!(env_or("GEOCODE_TEST_SURELY_UNSET_VAR", 7u32).unwrap(), 7);
    }
}
