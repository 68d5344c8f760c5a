//! Bulk import from the data.gov.in all-India pincode directory
//!
//! The directory is paged (`offset`/`limit`); each record carries
//! `pincode`, `latitude` and `longitude`, frequently as strings and
//! frequently as `"NA"` or `0`.

use crate::http::{with_retry, AttemptError, HttpClient};
use crate::{parse_degrees, ResolverConfig, ResolverError, Result};
use pincode_geo::{Coordinate, CoordinateStore, Pincode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

pub const API_KEY_ENV: &str = "DATA_GOV_API_KEY";
pub const RESOURCE_URL: &str =
    "https://api.data.gov.in/resource/04cbe4b1-2f2b-4c39-a1d5-1c2e28bc0e32";

#[derive(Debug, Clone)]
pub struct DataGovConfig {
    pub api_key: String,
    pub resource_url: String,
    pub page_size: usize,
    pub page_delay: Duration,
    pub retry_delay: Duration,
    pub max_retries: u32,
}

impl DataGovConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            resource_url: RESOURCE_URL.to_string(),
            page_size: 1000,
            page_delay: Duration::from_millis(100),
            retry_delay: Duration::from_secs(2),
            max_retries: 5,
        }
    }

    /// API key from `DATA_GOV_API_KEY`
    pub fn from_env() -> Result<Self> {
        match std::env::var(API_KEY_ENV) {
            Ok(key) if !key.trim().is_empty() => Ok(Self::new(key.trim())),
            _ => Err(ResolverError::MissingApiKey(API_KEY_ENV)),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(ResolverError::Config("page size must be positive".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    total: Value,
    #[serde(default)]
    records: Vec<Value>,
}

impl Page {
    fn total(&self) -> Option<usize> {
        match &self.total {
            Value::Number(n) => n.as_u64().map(|n| n as usize),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub records: usize,
    pub pages: usize,
    pub unique_pincodes: usize,
}

/// Pull a usable (pincode, coordinate) pair out of one record.
///
/// Pincodes are zero-padded; zero, non-numeric and out-of-range
/// coordinates are dropped.
pub fn parse_record(record: &Value) -> Option<(Pincode, Coordinate)> {
    let raw_pin = match record.get("pincode")? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    let pincode = Pincode::normalize(&raw_pin).ok()?;
    let lat = parse_degrees(record.get("latitude")?)?;
    let lng = parse_degrees(record.get("longitude")?)?;
    if lat == 0.0 || lng == 0.0 {
        return None;
    }
    Coordinate::new(lat, lng).ok().map(|c| (pincode, c))
}

/// Merge a page of records; the first coordinate seen for a pincode wins
pub fn merge_records(records: &[Value], store: &mut CoordinateStore) -> usize {
    records
        .iter()
        .filter_map(parse_record)
        .filter(|(pincode, coord)| store.insert_if_absent(pincode.clone(), *coord))
        .count()
}

pub struct DataGovImporter {
    http: HttpClient,
    config: DataGovConfig,
}

impl DataGovImporter {
    pub fn new(config: DataGovConfig, resolver: &ResolverConfig) -> Result<Self> {
        config.validate()?;
        // Page-level retry happens here, not in the client
        let http = HttpClient::new(&ResolverConfig {
            max_retries: 0,
            ..resolver.clone()
        })?;
        Ok(Self { http, config })
    }

    /// Every failure is retried at page level, up to `max_retries` times
    async fn fetch_page(&self, offset: usize) -> Result<Page> {
        with_retry(
            "data.gov.in",
            self.config.max_retries,
            self.config.retry_delay,
            || async move {
                self.http
                    .get_json::<Page>(
                        "data.gov.in",
                        &self.config.resource_url,
                        &[
                            ("api-key", self.config.api_key.clone()),
                            ("format", "json".to_string()),
                            ("offset", offset.to_string()),
                            ("limit", self.config.page_size.to_string()),
                        ],
                    )
                    .await
                    .map_err(AttemptError::Retryable)
            },
        )
        .await
    }

    /// Page through the whole directory into a fresh store
    pub async fn import_all(&self) -> Result<(CoordinateStore, ImportSummary)> {
        let first = self.fetch_page(0).await?;
        let total = first
            .total()
            .ok_or_else(|| ResolverError::Parse("data.gov.in response has no total".into()))?;
        info!("Total records: {}", total);

        let mut store = CoordinateStore::new();
        let mut summary = ImportSummary::default();
        let mut page = Some(first);
        let mut offset = 0;

        while offset < total {
            let current = match page.take() {
                Some(p) => p,
                None => self.fetch_page(offset).await?,
            };
            if current.records.is_empty() {
                debug!("Empty page at offset {}", offset);
            }

            merge_records(&current.records, &mut store);
            summary.records += current.records.len();
            summary.pages += 1;
            info!(
                "Fetched {}/{} records ({} unique pincodes with coords)",
                summary.records,
                total,
                store.len()
            );

            offset += self.config.page_size;
            tokio::time::sleep(self.config.page_delay).await;
        }

        summary.unique_pincodes = store.len();
        Ok((store, summary))
    }
}
