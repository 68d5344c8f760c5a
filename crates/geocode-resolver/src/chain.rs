//! Ordered fallback across geocoding strategies

use crate::http::HttpClient;
use crate::strategies::{GeoNamesPostal, GeocodeStrategy, NominatimFreeform, NominatimStructured};
use crate::{GeocodeHit, ResolverConfig, Result};
use pincode_geo::{Coordinate, Pincode};
use tracing::{debug, warn};

/// Outcome of resolving one pincode
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// A strategy returned a coordinate that differs from the stored one
    Updated(GeocodeHit),
    /// Every answer matched the stored coordinate; holds the first answer
    Unchanged(GeocodeHit),
    /// No strategy returned a coordinate
    NotFound,
}

pub struct FallbackChain {
    strategies: Vec<Box<dyn GeocodeStrategy>>,
    threshold_deg: f64,
}

impl FallbackChain {
    pub fn new(strategies: Vec<Box<dyn GeocodeStrategy>>, threshold_deg: f64) -> Self {
        Self {
            strategies,
            threshold_deg,
        }
    }

    /// Nominatim structured, then Nominatim free-form, then GeoNames
    pub fn standard(config: &ResolverConfig) -> Result<Self> {
        let http = HttpClient::new(config)?;
        let strategies: Vec<Box<dyn GeocodeStrategy>> = vec![
            Box::new(NominatimStructured::new(http.clone(), config)),
            Box::new(NominatimFreeform::new(http.clone(), config)),
            Box::new(GeoNamesPostal::new(http, config)),
        ];
        Ok(Self::new(strategies, config.difference_threshold_deg))
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// A hit counts as new when there is nothing stored or it moved by more
    /// than the threshold on either axis.
    pub fn is_new(&self, existing: Option<&Coordinate>, hit: &GeocodeHit) -> bool {
        existing.map_or(true, |old| hit.coordinate.differs_from(old, self.threshold_deg))
    }

    /// Try each strategy in order, pausing for its delay after every
    /// request. Stops at the first hit that differs from `existing`.
    ///
    /// A failing strategy is logged and treated as having no answer.
    pub async fn resolve(&self, pincode: &Pincode, existing: Option<&Coordinate>) -> Resolution {
        let mut first_hit: Option<GeocodeHit> = None;

        for strategy in &self.strategies {
            debug!("{}: trying {}", pincode, strategy.name());
            let outcome = strategy.lookup(pincode).await;
            tokio::time::sleep(strategy.delay()).await;

            match outcome {
                Ok(Some(hit)) if self.is_new(existing, &hit) => {
                    return Resolution::Updated(hit);
                }
                Ok(Some(hit)) => {
                    debug!("{}: {} returned the stored coordinate", pincode, strategy.name());
                    first_hit.get_or_insert(hit);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("{}: {} lookup failed: {}", pincode, strategy.name(), e);
                }
            }
        }

        match first_hit {
            Some(hit) => Resolution::Unchanged(hit),
            None => Resolution::NotFound,
        }
    }
}
