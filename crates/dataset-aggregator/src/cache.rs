use crate::Result;
use pincode_geo::CoordinateStore;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Lazily loaded coordinate store owned by whoever builds features.
///
/// The store is read from disk on first use and kept until
/// [`invalidate`](Self::invalidate) is called.
#[derive(Debug)]
pub struct CoordinateCache {
    path: PathBuf,
    store: Option<CoordinateStore>,
}

impl CoordinateCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            store: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_loaded(&self) -> bool {
        self.store.is_some()
    }

    pub fn get_or_load(&mut self) -> Result<&CoordinateStore> {
        let store = match self.store.take() {
            Some(store) => {
                debug!("Using cached coordinates from {:?}", self.path);
                store
            }
            None => CoordinateStore::load(&self.path)?,
        };
        Ok(self.store.insert(store))
    }

    /// Drop the cached store; the next access re-reads the file
    pub fn invalidate(&mut self) {
        self.store = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_loads_once_until_invalidated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pincode_latlng.json");
        fs::write(&path, r#"{"560001": {"lat": 12.97, "lng": 77.59}}"#).unwrap();

        let mut cache = CoordinateCache::new(&path);
        assert!(!cache.is_loaded());
        assert_eq!(cache.get_or_load().unwrap().len(), 1);

        fs::write(
            &path,
            r#"{"560001": {"lat": 12.97, "lng": 77.59}, "560002": {"lat": 12.98, "lng": 77.60}}"#,
        )
        .unwrap();
        assert_eq!(cache.get_or_load().unwrap().len(), 1);

        cache.invalidate();
        assert!(!cache.is_loaded());
        assert_eq!(cache.get_or_load().unwrap().len(), 2);
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempdir().unwrap();
        let mut cache = CoordinateCache::new(dir.path().join("absent.json"));
        assert!(cache.get_or_load().is_err());
        assert!(!cache.is_loaded());
    }
}
