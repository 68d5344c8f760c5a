//! Geocoder strategies
//!
//! Each strategy answers one question: "where is this pincode?" It returns
//! `Ok(None)` when the service has no answer and `Err` only when the
//! request itself failed.

use crate::{GeocodeHit, Result};
use async_trait::async_trait;
use pincode_geo::Pincode;
use std::time::Duration;

pub mod geonames;
pub mod nominatim;

pub use geonames::GeoNamesPostal;
pub use nominatim::{NominatimCountrySearch, NominatimFreeform, NominatimStructured};

/// A single geocoding source
#[async_trait]
pub trait GeocodeStrategy: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Pause required after every request to this service
    fn delay(&self) -> Duration;

    async fn lookup(&self, pincode: &Pincode) -> Result<Option<GeocodeHit>>;
}
