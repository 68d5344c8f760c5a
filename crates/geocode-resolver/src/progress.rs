//! Resumable progress checkpoint
//!
//! ```json
//! {
//!   "processed": {
//!     "560034": { "old": {"lat": 12.97, "lng": 77.59}, "new": {"lat": 12.93, "lng": 77.62}, "source": "nominatim-structured" },
//!     "560035": { "status": "unchanged" }
//!   },
//!   "failed": ["560099"],
//!   "lastIndex": 3
//! }
//! ```
//!
//! Older checkpoints stored `new` as a `[lat, lng]` pair; both forms load.

use crate::Result;
use pincode_geo::{Coordinate, CoordinateStore, Pincode};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProgressEntry {
    Updated {
        #[serde(default)]
        old: Option<Coordinate>,
        #[serde(deserialize_with = "coordinate_or_pair")]
        new: Coordinate,
        source: String,
    },
    Unchanged {
        status: EntryStatus,
    },
}

impl ProgressEntry {
    pub fn unchanged() -> Self {
        Self::Unchanged {
            status: EntryStatus::Unchanged,
        }
    }

    /// Replacement coordinate, if this entry carries one
    pub fn replacement(&self) -> Option<Coordinate> {
        match self {
            Self::Updated { new, .. } => Some(*new),
            Self::Unchanged { .. } => None,
        }
    }
}

fn coordinate_or_pair<'de, D>(deserializer: D) -> std::result::Result<Coordinate, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Object(Coordinate),
        Pair(f64, f64),
    }

    Ok(match Repr::deserialize(deserializer)? {
        Repr::Object(c) => c,
        Repr::Pair(lat, lng) => Coordinate { lat, lng },
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    #[serde(default)]
    pub processed: BTreeMap<Pincode, ProgressEntry>,
    #[serde(default)]
    pub failed: Vec<Pincode>,
    #[serde(default)]
    pub last_index: usize,
}

impl Progress {
    /// Load a checkpoint, or start fresh when none exists yet
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let progress: Progress = serde_json::from_str(&content)?;
        info!(
            "Resuming from {}: {} processed, {} failed, index {}",
            path.display(),
            progress.processed.len(),
            progress.failed.len(),
            progress.last_index
        );
        Ok(progress)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(self)?)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Already answered in an earlier run
    pub fn is_done(&self, pincode: &Pincode) -> bool {
        self.processed.contains_key(pincode) || self.failed.contains(pincode)
    }

    pub fn record_failed(&mut self, pincode: Pincode) {
        if !self.failed.contains(&pincode) {
            self.failed.push(pincode);
        }
    }

    pub fn updated_count(&self) -> usize {
        self.processed
            .values()
            .filter(|e| e.replacement().is_some())
            .count()
    }

    /// Copy of `store` with every updated pincode replaced
    pub fn apply_to(&self, store: &CoordinateStore) -> CoordinateStore {
        let mut out = store.clone();
        for (pincode, entry) in &self.processed {
            if let Some(coord) = entry.replacement() {
                out.insert(pincode.clone(), coord);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn pin(s: &str) -> Pincode {
        Pincode::new(s).unwrap()
    }

    #[test]
    fn test_missing_file_starts_fresh() {
        let dir = tempdir().unwrap();
        let progress = Progress::load_or_default(dir.path().join("fetch_progress.json")).unwrap();
        assert_eq!(progress, Progress::default());
    }

    #[test]
    fn test_save_and_resume() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fetch_progress.json");

        let mut progress = Progress::default();
        progress.processed.insert(
            pin("560034"),
            ProgressEntry::Updated {
                old: Some(Coordinate { lat: 12.9716, lng: 77.5946 }),
                new: Coordinate { lat: 12.93, lng: 77.62 },
                source: "geonames".into(),
            },
        );
        progress.processed.insert(pin("560035"), ProgressEntry::unchanged());
        progress.record_failed(pin("560099"));
        progress.record_failed(pin("560099"));
        progress.last_index = 3;
        progress.save(&path).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["lastIndex"], 3);
        assert_eq!(raw["processed"]["560035"]["status"], "unchanged");

        let loaded = Progress::load_or_default(&path).unwrap();
        assert_eq!(loaded, progress);
        assert_eq!(loaded.failed.len(), 1);
        assert!(loaded.is_done(&pin("560099")));
        assert!(!loaded.is_done(&pin("560001")));
        assert_eq!(loaded.updated_count(), 1);
    }

    #[test]
    fn test_loads_pair_form() {
        let loaded: Progress = serde_json::from_str(
            r#"{"processed": {"560034": {"old": null, "new": [12.93, 77.62], "source": "geonames"}}, "failed": [], "lastIndex": 1}"#,
        )
        .unwrap();
        assert_eq!(
            loaded.processed[&pin("560034")].replacement(),
            Some(Coordinate { lat: 12.93, lng: 77.62 })
        );
    }

    #[test]
    fn test_apply_to_replaces_only_updates() {
        let store: CoordinateStore = vec![
            (pin("560034"), Coordinate { lat: 12.9716, lng: 77.5946 }),
            (pin("560035"), Coordinate { lat: 12.9716, lng: 77.5946 }),
        ]
        .into_iter()
        .collect();

        let mut progress = Progress::default();
        progress.processed.insert(
            pin("560034"),
            ProgressEntry::Updated {
                old: None,
                new: Coordinate { lat: 12.93, lng: 77.62 },
                source: "nominatim-structured".into(),
            },
        );
        progress.processed.insert(pin("560035"), ProgressEntry::unchanged());

        let out = progress.apply_to(&store);
        assert_eq!(out.lookup("560034"), Some(Coordinate { lat: 12.93, lng: 77.62 }));
        assert_eq!(out.lookup("560035"), store.lookup("560035"));
    }
}
