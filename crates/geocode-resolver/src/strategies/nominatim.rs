//! OpenStreetMap Nominatim search
//!
//! Usage policy: at most one request per second and an identifying
//! User-Agent, both enforced through [`ResolverConfig`].

use super::GeocodeStrategy;
use crate::http::HttpClient;
use crate::{parse_degrees, GeocodeHit, ResolverConfig, Result};
use async_trait::async_trait;
use pincode_geo::{Coordinate, Pincode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const SERVICE: &str = "Nominatim";

/// One search result. `lat`/`lon` arrive as strings.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct NominatimPlace {
    #[serde(default)]
    lat: Value,
    #[serde(default)]
    lon: Value,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    address: Option<NominatimAddress>,
}

#[derive(Debug, Clone, Deserialize)]
struct NominatimAddress {
    #[serde(default)]
    postcode: Option<String>,
}

impl NominatimPlace {
    fn coordinate(&self) -> Option<Coordinate> {
        let lat = parse_degrees(&self.lat)?;
        let lng = parse_degrees(&self.lon)?;
        Coordinate::new(lat, lng).ok()
    }

    fn to_hit(&self, source: &str) -> Option<GeocodeHit> {
        self.coordinate()
            .map(|c| GeocodeHit::new(c, source).with_display_name(self.display_name.clone()))
    }

    fn postcode(&self) -> Option<&str> {
        self.address.as_ref()?.postcode.as_deref()
    }
}

/// First result, if it carries a usable coordinate
pub(crate) fn first_hit(places: &[NominatimPlace], source: &str) -> Option<GeocodeHit> {
    places.first().and_then(|p| p.to_hit(source))
}

/// Prefer a result whose address postcode is the pincode itself; otherwise
/// accept the first result located in India.
pub(crate) fn pick_freeform(places: &[NominatimPlace], pincode: &Pincode) -> Option<GeocodeHit> {
    if let Some(hit) = places
        .iter()
        .filter(|p| p.postcode().map(str::trim) == Some(pincode.as_str()))
        .find_map(|p| p.to_hit("nominatim-freeform"))
    {
        return Some(hit);
    }

    places
        .first()
        .filter(|p| {
            p.display_name
                .as_deref()
                .is_some_and(|name| name.contains("India"))
        })
        .and_then(|p| p.to_hit("nominatim-freeform-fallback"))
}

#[derive(Debug, Clone)]
struct NominatimClient {
    http: HttpClient,
    search_url: String,
    delay: Duration,
}

impl NominatimClient {
    fn new(http: HttpClient, config: &ResolverConfig) -> Self {
        Self {
            http,
            search_url: format!("{}/search", config.nominatim_base_url.trim_end_matches('/')),
            delay: config.nominatim_delay,
        }
    }

    async fn search(&self, query: &[(&str, String)]) -> Result<Vec<NominatimPlace>> {
        self.http.get_json(SERVICE, &self.search_url, query).await
    }
}

/// `postalcode=<pin>&country=India`
#[derive(Debug, Clone)]
pub struct NominatimStructured {
    client: NominatimClient,
}

impl NominatimStructured {
    pub fn new(http: HttpClient, config: &ResolverConfig) -> Self {
        Self {
            client: NominatimClient::new(http, config),
        }
    }
}

#[async_trait]
impl GeocodeStrategy for NominatimStructured {
    fn name(&self) -> &str {
        "nominatim-structured"
    }

    fn delay(&self) -> Duration {
        self.client.delay
    }

    async fn lookup(&self, pincode: &Pincode) -> Result<Option<GeocodeHit>> {
        let places = self
            .client
            .search(&[
                ("postalcode", pincode.to_string()),
                ("country", "India".to_string()),
                ("format", "json".to_string()),
                ("limit", "1".to_string()),
            ])
            .await?;
        debug!("{}: {} structured results", pincode, places.len());
        Ok(first_hit(&places, "nominatim-structured"))
    }
}

/// `q=<pin> postal code India`, confirmed against the returned postcode
#[derive(Debug, Clone)]
pub struct NominatimFreeform {
    client: NominatimClient,
}

impl NominatimFreeform {
    pub fn new(http: HttpClient, config: &ResolverConfig) -> Self {
        Self {
            client: NominatimClient::new(http, config),
        }
    }
}

#[async_trait]
impl GeocodeStrategy for NominatimFreeform {
    fn name(&self) -> &str {
        "nominatim-freeform"
    }

    fn delay(&self) -> Duration {
        self.client.delay
    }

    async fn lookup(&self, pincode: &Pincode) -> Result<Option<GeocodeHit>> {
        let places = self
            .client
            .search(&[
                ("q", format!("{} postal code India", pincode)),
                ("format", "json".to_string()),
                ("limit", "5".to_string()),
                ("addressdetails", "1".to_string()),
            ])
            .await?;
        debug!("{}: {} free-form results", pincode, places.len());
        Ok(pick_freeform(&places, pincode))
    }
}

/// `q=<pin>, India&countrycodes=in`, used to fill pincodes with no
/// coordinate at all
#[derive(Debug, Clone)]
pub struct NominatimCountrySearch {
    client: NominatimClient,
}

impl NominatimCountrySearch {
    pub fn new(http: HttpClient, config: &ResolverConfig) -> Self {
        Self {
            client: NominatimClient::new(http, config),
        }
    }
}

#[async_trait]
impl GeocodeStrategy for NominatimCountrySearch {
    fn name(&self) -> &str {
        "nominatim-search"
    }

    fn delay(&self) -> Duration {
        self.client.delay
    }

    async fn lookup(&self, pincode: &Pincode) -> Result<Option<GeocodeHit>> {
        let places = self
            .client
            .search(&[
                ("q", format!("{}, India", pincode)),
                ("format", "json".to_string()),
                ("limit", "1".to_string()),
                ("countrycodes", "in".to_string()),
            ])
            .await?;
        Ok(first_hit(&places, "nominatim-search"))
    }
}
