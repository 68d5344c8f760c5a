//! `datasets.json` configuration
//!
//! ```json
//! {
//!   "categories": [{
//!     "id": "enrolment",
//!     "label": "Enrolment",
//!     "metrics": {
//!       "age_0_5": { "label": "Age 0-5", "color": ["#fee5d9", "#a50f15"], "heatRadius": 20 }
//!     },
//!     "files": [{ "id": "jan", "label": "January", "path": "/data/enrolment/jan.csv" }]
//!   }]
//! }
//! ```
//!
//! Metric order matters: the first metric is a category's default.

use crate::{DatasetError, Result};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricConfig {
    pub label: String,
    /// Gradient endpoints, low to high
    pub color: [String; 2],
    pub heat_radius: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetFile {
    pub id: String,
    pub label: String,
    pub path: String,
}

/// Metric definitions in the order they were written
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricSet(Vec<(String, MetricConfig)>);

impl MetricSet {
    pub fn get(&self, key: &str) -> Option<&MetricConfig> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, m)| m)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetricConfig)> {
        self.0.iter().map(|(k, m)| (k.as_str(), m))
    }

    pub fn first_key(&self) -> Option<&str> {
        self.0.first().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for MetricSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, metric) in &self.0 {
            map.serialize_entry(key, metric)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for MetricSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct OrderedMetrics;

        impl<'de> Visitor<'de> for OrderedMetrics {
            type Value = MetricSet;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of metric key to metric configuration")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<MetricSet, A::Error> {
                let mut entries: Vec<(String, MetricConfig)> =
                    Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, metric)) = access.next_entry::<String, MetricConfig>()? {
                    // Later duplicates replace earlier ones in place
                    match entries.iter_mut().find(|(k, _)| *k == key) {
                        Some(slot) => slot.1 = metric,
                        None => entries.push((key, metric)),
                    }
                }
                Ok(MetricSet(entries))
            }
        }

        deserializer.deserialize_map(OrderedMetrics)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetCategory {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub metrics: MetricSet,
    #[serde(default)]
    pub files: Vec<DatasetFile>,
}

impl DatasetCategory {
    pub fn file(&self, file_id: &str) -> Result<&DatasetFile> {
        self.files
            .iter()
            .find(|f| f.id == file_id)
            .ok_or_else(|| DatasetError::UnknownFile {
                category: self.id.clone(),
                file: file_id.to_string(),
            })
    }

    pub fn metric(&self, metric_key: &str) -> Result<&MetricConfig> {
        self.metrics
            .get(metric_key)
            .ok_or_else(|| DatasetError::UnknownMetric {
                category: self.id.clone(),
                metric: metric_key.to_string(),
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetsConfig {
    #[serde(default)]
    pub categories: Vec<DatasetCategory>,
}

impl DatasetsConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: DatasetsConfig = serde_json::from_str(&fs::read_to_string(path)?)?;
        info!(
            "Loaded {} dataset categories from {:?}",
            config.categories.len(),
            path
        );
        Ok(config)
    }

    pub fn category(&self, category_id: &str) -> Result<&DatasetCategory> {
        self.categories
            .iter()
            .find(|c| c.id == category_id)
            .ok_or_else(|| DatasetError::UnknownCategory(category_id.to_string()))
    }

    pub fn metric_config(&self, category_id: &str, metric_key: &str) -> Option<&MetricConfig> {
        self.category(category_id).ok()?.metrics.get(metric_key)
    }

    pub fn category_metrics(&self, category_id: &str) -> Option<&MetricSet> {
        self.category(category_id).ok().map(|c| &c.metrics)
    }

    pub fn category_files(&self, category_id: &str) -> &[DatasetFile] {
        self.category(category_id)
            .map(|c| c.files.as_slice())
            .unwrap_or_default()
    }

    /// First metric declared for the category
    pub fn default_metric_key(&self, category_id: &str) -> Option<&str> {
        self.category(category_id).ok()?.metrics.first_key()
    }
}
