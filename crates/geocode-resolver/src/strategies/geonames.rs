//! GeoNames postal code search

use super::GeocodeStrategy;
use crate::http::HttpClient;
use crate::{parse_degrees, GeocodeHit, ResolverConfig, Result};
use async_trait::async_trait;
use pincode_geo::{Coordinate, Pincode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PostalCodeSearch {
    #[serde(default)]
    postal_codes: Vec<PostalCodeEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostalCodeEntry {
    #[serde(default)]
    lat: Value,
    #[serde(default)]
    lng: Value,
    #[serde(default)]
    place_name: Option<String>,
    #[serde(default)]
    admin_name1: Option<String>,
}

pub(crate) fn first_postal_hit(response: &PostalCodeSearch) -> Option<GeocodeHit> {
    let entry = response.postal_codes.first()?;
    let coord = Coordinate::new(parse_degrees(&entry.lat)?, parse_degrees(&entry.lng)?).ok()?;
    let name = match (&entry.place_name, &entry.admin_name1) {
        (Some(place), Some(admin)) => Some(format!("{}, {}", place, admin)),
        (Some(place), None) => Some(place.clone()),
        _ => None,
    };
    Some(GeocodeHit::new(coord, "geonames").with_display_name(name))
}

#[derive(Debug, Clone)]
pub struct GeoNamesPostal {
    http: HttpClient,
    url: String,
    username: String,
    delay: Duration,
}

impl GeoNamesPostal {
    pub fn new(http: HttpClient, config: &ResolverConfig) -> Self {
        Self {
            http,
            url: format!(
                "{}/postalCodeSearchJSON",
                config.geonames_base_url.trim_end_matches('/')
            ),
            username: config.geonames_username.clone(),
            delay: config.geonames_delay,
        }
    }
}

#[async_trait]
impl GeocodeStrategy for GeoNamesPostal {
    fn name(&self) -> &str {
        "geonames"
    }

    fn delay(&self) -> Duration {
        self.delay
    }

    async fn lookup(&self, pincode: &Pincode) -> Result<Option<GeocodeHit>> {
        let response: PostalCodeSearch = self
            .http
            .get_json(
                "GeoNames",
                &self.url,
                &[
                    ("postalcode", pincode.to_string()),
                    ("country", "IN".to_string()),
                    ("maxRows", "1".to_string()),
                    ("username", self.username.clone()),
                ],
            )
            .await?;
        Ok(first_postal_hit(&response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_postal_hit() {
        let response: PostalCodeSearch = serde_json::from_str(
            r#"{"postalCodes": [{"lat": 12.9716, "lng": 77.5946, "placeName": "Bangalore GPO", "adminName1": "Karnataka"}]}"#,
        )
        .unwrap();
        let hit = first_postal_hit(&response).unwrap();
        assert_eq!(hit.source, "geonames");
        assert_eq!(hit.display_name.as_deref(), Some("Bangalore GPO, Karnataka"));
    }

    #[test]
    fn test_quota_error_body_is_no_hit() {
        let response: PostalCodeSearch = serde_json::from_str(
            r#"{"status": {"message": "daily limit exceeded", "value": 18}}"#,
        )
        .unwrap();
        assert!(first_postal_hit(&response).is_none());
    }
}
