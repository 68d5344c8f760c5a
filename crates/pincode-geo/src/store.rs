//! Persisted pincode → coordinate mapping
//!
//! File format is a JSON object keyed by 6-digit pincode:
//!
//! ```json
//! { "560001": { "lat": 12.9716, "lng": 77.5946 } }
//! ```
//!
//! The legacy array export (`[{"pincode", "latitude", "longitude"}]`) is
//! accepted on load and rewritten in object form on save.

use crate::{Coordinate, GeoError, Pincode, Result};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, info, warn};

/// Entry counts observed while loading a store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub loaded: usize,
    pub rejected: usize,
}

/// In-memory coordinate store
///
/// Entries that fail validation are held verbatim in a side table and
/// written back on save, so nothing read from disk is ever dropped.
#[derive(Debug, Clone, Default)]
pub struct CoordinateStore {
    entries: BTreeMap<Pincode, Coordinate>,
    rejected: BTreeMap<String, Value>,
}

impl CoordinateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a store file. Unreadable files and non-JSON content are errors;
    /// individual bad entries are not.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading pincode coordinates from {:?}", path);

        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let raw: Value = serde_json::from_reader(reader)?;
        let store = Self::from_value(raw)?;

        let stats = store.stats();
        info!(
            "Loaded {} pincode coordinates ({} rejected entries kept aside)",
            stats.loaded, stats.rejected
        );
        Ok(store)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(json)?)
    }

    /// Build from either the object or the legacy array layout
    pub fn from_value(raw: Value) -> Result<Self> {
        let mut store = Self::new();
        match raw {
            Value::Object(map) => {
                for (key, value) in map {
                    store.ingest(key, value);
                }
            }
            Value::Array(items) => {
                for (i, item) in items.into_iter().enumerate() {
                    store.ingest_legacy(i, item);
                }
            }
            other => {
                return Err(GeoError::MalformedStore(format!(
                    "expected object or array at top level, found {}",
                    json_kind(&other)
                )));
            }
        }
        Ok(store)
    }

    fn ingest(&mut self, key: String, value: Value) {
        let pincode = match Pincode::new(key.as_str()) {
            Ok(p) => p,
            Err(_) => {
                warn!("Skipping entry with malformed pincode key {:?}", key);
                self.rejected.insert(key, value);
                return;
            }
        };
        let coord = value
            .get("lat")
            .and_then(Value::as_f64)
            .zip(value.get("lng").and_then(Value::as_f64))
            .map(|(lat, lng)| Coordinate { lat, lng })
            .filter(Coordinate::is_valid);

        match coord {
            Some(c) => {
                self.entries.insert(pincode, c);
            }
            None => {
                warn!("Skipping {}: unusable coordinate {}", pincode, value);
                self.rejected.insert(key, value);
            }
        }
    }

    fn ingest_legacy(&mut self, index: usize, item: Value) {
        let raw_pin = match item.get("pincode") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                warn!("Skipping legacy entry #{} without pincode", index);
                return;
            }
        };
        let lat = item.get("latitude").and_then(Value::as_f64);
        let lng = item.get("longitude").and_then(Value::as_f64);

        match (Pincode::normalize(&raw_pin), lat, lng) {
            (Ok(pincode), Some(lat), Some(lng)) if (Coordinate { lat, lng }).is_valid() => {
                self.entries.insert(pincode, Coordinate { lat, lng });
            }
            _ => {
                warn!("Skipping legacy entry #{} ({})", index, raw_pin);
                self.rejected.insert(raw_pin, item);
            }
        }
    }

    /// Serialize to the object layout, rejected entries included
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        for (key, value) in &self.rejected {
            map.insert(key.clone(), value.clone());
        }
        for (pincode, coord) in &self.entries {
            map.insert(
                pincode.to_string(),
                serde_json::json!({ "lat": coord.lat, "lng": coord.lng }),
            );
        }
        Value::Object(map)
    }

    /// Persist the whole store. Writes a sibling temp file first and renames
    /// it over the target, so the previous file survives a failed write.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let tmp = path.with_extension("json.tmp");
        {
            let file = File::create(&tmp)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, &self.to_value())?;
            writer.flush()?;
        }
        fs::rename(&tmp, path)?;
        debug!("Wrote {} entries to {:?}", self.len() + self.rejected.len(), path);
        Ok(())
    }

    pub fn get(&self, pincode: &Pincode) -> Option<&Coordinate> {
        self.entries.get(pincode)
    }

    /// Lookup by raw string; malformed input simply misses
    pub fn lookup(&self, pincode: &str) -> Option<Coordinate> {
        Pincode::new(pincode.trim())
            .ok()
            .and_then(|p| self.entries.get(&p).copied())
    }

    pub fn contains(&self, pincode: &Pincode) -> bool {
        self.entries.contains_key(pincode)
    }

    /// Insert at store precision; the coordinate is rounded to
    /// [`COORD_PRECISION`](crate::COORD_PRECISION) decimals.
    pub fn insert(&mut self, pincode: Pincode, coord: Coordinate) -> Option<Coordinate> {
        self.rejected.remove(pincode.as_str());
        self.entries.insert(pincode, coord.rounded())
    }

    /// Insert only when the pincode has no coordinate yet
    pub fn insert_if_absent(&mut self, pincode: Pincode, coord: Coordinate) -> bool {
        if self.entries.contains_key(&pincode) {
            return false;
        }
        self.insert(pincode, coord);
        true
    }

    /// Valid entries in ascending pincode order
    pub fn iter(&self) -> impl Iterator<Item = (&Pincode, &Coordinate)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn rejected_len(&self) -> usize {
        self.rejected.len()
    }

    pub fn stats(&self) -> LoadStats {
        LoadStats {
            loaded: self.entries.len(),
            rejected: self.rejected.len(),
        }
    }
}

impl FromIterator<(Pincode, Coordinate)> for CoordinateStore {
    fn from_iter<I: IntoIterator<Item = (Pincode, Coordinate)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
            rejected: BTreeMap::new(),
        }
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_object_format() {
        let json = r#"{
            "560001": {"lat": 12.9716, "lng": 77.5946},
            "110001": {"lat": 28.6328, "lng": 77.2197}
        }"#;
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let store = CoordinateStore::load(file.path()).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(
            store.lookup("560001"),
            Some(Coordinate { lat: 12.9716, lng: 77.5946 })
        );
        // ascending key order
        let keys: Vec<&str> = store.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(keys, vec!["110001", "560001"]);
    }

    #[test]
    fn test_load_legacy_array_format() {
        let json = r#"[
            {"pincode": 110001, "latitude": 28.6328, "longitude": 77.2197},
            {"pincode": "11002", "latitude": 28.64, "longitude": 77.23},
            {"pincode": "560001", "latitude": "n/a", "longitude": 77.0}
        ]"#;
        let store = CoordinateStore::from_json_str(json).unwrap();
        assert_eq!(store.len(), 2);
        assert!(store.lookup("011002").is_some());
        assert_eq!(store.rejected_len(), 1);
    }

    #[test]
    fn test_malformed_entries_are_skipped_and_kept() {
        let json = r#"{
            "560001": {"lat": 12.9716, "lng": 77.5946},
            "ABCDEF": {"lat": 1.0, "lng": 2.0},
            "560002": {"lat": "twelve", "lng": 77.0},
            "560003": {"lat": 95.0, "lng": 77.0}
        }"#;
        let store = CoordinateStore::from_json_str(json).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.rejected_len(), 3);

        let value = store.to_value();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 4);
        assert_eq!(obj["560002"]["lat"], "twelve");
    }

    #[test]
    fn test_top_level_scalar_is_fatal() {
        let err = CoordinateStore::from_json_str("42").unwrap_err();
        assert!(matches!(err, GeoError::MalformedStore(_)));
        assert!(CoordinateStore::from_json_str("{not json").is_err());
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = CoordinateStore::load(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, GeoError::Io(_)));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pincode_latlng.json");

        let mut store = CoordinateStore::new();
        store.insert(
            Pincode::new("560001").unwrap(),
            Coordinate { lat: 12.971599, lng: 77.594563 },
        );
        store.save(&path).unwrap();
        assert!(!path.with_extension("json.tmp").exists());

        let reloaded = CoordinateStore::load(&path).unwrap();
        assert_eq!(
            reloaded.lookup("560001"),
            Some(Coordinate { lat: 12.971599, lng: 77.594563 })
        );
    }

    #[test]
    fn test_insert_if_absent() {
        let mut store = CoordinateStore::new();
        let pin = Pincode::new("400001").unwrap();
        assert!(store.insert_if_absent(pin.clone(), Coordinate { lat: 18.93, lng: 72.83 }));
        assert!(!store.insert_if_absent(pin.clone(), Coordinate { lat: 0.0, lng: 0.0 }));
        assert_eq!(store.get(&pin).unwrap().lat, 18.93);
    }

    #[test]
    fn test_insert_rounds_to_store_precision() {
        let mut store = CoordinateStore::new();
        let pin = Pincode::new("560001").unwrap();
        store.insert(pin.clone(), Coordinate { lat: 12.971598765, lng: 77.594562345 });
        assert_eq!(store.get(&pin), Some(&Coordinate { lat: 12.971599, lng: 77.594562 }));

        let other = Pincode::new("560002").unwrap();
        let fine = Coordinate {
            lat: -8.12345649,
            lng: 0.0000004,
        };
        assert!(store.insert_if_absent(other.clone(), fine));
        assert_eq!(store.get(&other), Some(&Coordinate { lat: -8.123456, lng: 0.0 }));
    }
}
