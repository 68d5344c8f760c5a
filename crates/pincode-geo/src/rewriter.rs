//! Apply spiral placement back onto the coordinate store

use crate::{
    distribute_in_spiral, CoordinateStore, DuplicateReport, RadiusTier, Result, SpiralConfig,
};
use rand::Rng;
use std::path::Path;
use tracing::{debug, info};

/// Clusters at or above this size get an individual log line
pub const LOG_CLUSTER_MIN: usize = 30;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteSummary {
    pub clusters_processed: usize,
    pub clusters_skipped: usize,
    /// Store entries overwritten
    pub updated: usize,
    /// Report pincodes absent from the store
    pub missing: usize,
}

/// Spread every cluster in `report` and overwrite the matching store
/// entries in memory. Pincodes the store no longer holds are skipped.
pub fn apply_report<R: Rng + ?Sized>(
    store: &mut CoordinateStore,
    report: &DuplicateReport,
    config: &SpiralConfig,
    rng: &mut R,
) -> RewriteSummary {
    let mut summary = RewriteSummary::default();

    for cluster in &report.duplicates {
        if cluster.count < 2 {
            summary.clusters_skipped += 1;
            continue;
        }

        let tier = config.tier_for(cluster.count);
        let radius = tier.map_or(0.0, |t| t.radius_deg);
        let positions = distribute_in_spiral(cluster.center(), cluster.count, radius, config, rng);

        for (pincode, position) in cluster.pincodes.iter().zip(positions) {
            if store.contains(pincode) {
                store.insert(pincode.clone(), position);
                summary.updated += 1;
            } else {
                debug!("{} listed in report but absent from store", pincode);
                summary.missing += 1;
            }
        }
        summary.clusters_processed += 1;

        if cluster.count >= LOG_CLUSTER_MIN {
            info!(
                "  Spread {} pincodes around [{}, {}] with radius {}° (~{}km)",
                cluster.count,
                cluster.lat,
                cluster.lng,
                radius,
                tier.map_or(0.0, RadiusTier::radius_km).round()
            );
        }
    }

    summary
}

/// Load store and report, spread every cluster, then save the full store.
///
/// Nothing is written unless both inputs load and the whole pass finishes.
pub fn rewrite_store<R: Rng + ?Sized>(
    store_path: impl AsRef<Path>,
    report_path: impl AsRef<Path>,
    config: &SpiralConfig,
    rng: &mut R,
) -> Result<(CoordinateStore, RewriteSummary)> {
    config.validate()?;
    let mut store = CoordinateStore::load(store_path.as_ref())?;
    let report = DuplicateReport::load(report_path.as_ref())?;

    info!(
        "Found {} locations with duplicate pincodes",
        report.duplicates.len()
    );

    let summary = apply_report(&mut store, &report, config, rng);

    info!("Saving updated coordinates...");
    store.save(store_path.as_ref())?;
    info!("Updated {} pincode coordinates", summary.updated);

    Ok((store, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{find_duplicates, Coordinate, GeoError, Pincode};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn pin(s: &str) -> Pincode {
        Pincode::new(s).unwrap()
    }

    fn five_entry_store() -> CoordinateStore {
        [
            ("560001", 12.9716, 77.5946),
            ("560002", 12.9716, 77.5946),
            ("560003", 12.9716, 77.5946),
            ("110001", 28.6328, 77.2197),
            ("400001", 18.9388, 72.8354),
        ]
        .iter()
        .map(|(p, lat, lng)| (pin(p), Coordinate { lat: *lat, lng: *lng }))
        .collect()
    }

    #[test]
    fn test_rewrites_exactly_cluster_members() {
        let mut store = five_entry_store();
        let before = store.clone();
        let report = find_duplicates(&store);
        let mut rng = StdRng::seed_from_u64(11);

        let summary = apply_report(&mut store, &report, &SpiralConfig::default(), &mut rng);
        assert_eq!(summary.updated, 3);
        assert_eq!(summary.clusters_processed, 1);

        for p in ["560001", "560002", "560003"] {
            assert_ne!(store.get(&pin(p)), before.get(&pin(p)));
        }
        for p in ["110001", "400001"] {
            assert_eq!(store.get(&pin(p)), before.get(&pin(p)));
        }
    }

    #[test]
    fn test_stale_report_entries_are_skipped() {
        let mut store = five_entry_store();
        let mut report = find_duplicates(&store);
        report.duplicates[0].pincodes.push(pin("999999"));
        report.duplicates[0].count += 1;

        let mut rng = StdRng::seed_from_u64(1);
        let summary = apply_report(&mut store, &report, &SpiralConfig::default(), &mut rng);
        assert_eq!(summary.updated, 3);
        assert_eq!(summary.missing, 1);
        assert!(store.get(&pin("999999")).is_none());
        assert_eq!(store.len(), 5);
    }

    #[test]
    fn test_singleton_cluster_skipped() {
        let mut store = five_entry_store();
        let mut report = find_duplicates(&store);
        report.duplicates[0].count = 1;
        report.duplicates[0].pincodes.truncate(1);

        let mut rng = StdRng::seed_from_u64(1);
        let summary = apply_report(&mut store, &report, &SpiralConfig::default(), &mut rng);
        assert_eq!(summary.updated, 0);
        assert_eq!(summary.clusters_skipped, 1);
    }

    #[test]
    fn test_rewrite_store_persists_full_store() {
        let dir = tempfile::tempdir().unwrap();
        let store_path = dir.path().join("pincode_latlng.json");
        let report_path = dir.path().join("duplicate_coords_report.json");

        let store = five_entry_store();
        store.save(&store_path).unwrap();
        find_duplicates(&store).save(&report_path).unwrap();

        let mut rng = StdRng::seed_from_u64(5);
        let (_, summary) =
            rewrite_store(&store_path, &report_path, &SpiralConfig::default(), &mut rng).unwrap();
        assert_eq!(summary.updated, 3);

        let reloaded = CoordinateStore::load(&store_path).unwrap();
        assert_eq!(reloaded.len(), 5);
        assert!(find_duplicates(&reloaded).duplicates.is_empty());
    }

    #[test]
    fn test_missing_report_leaves_store_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store_path = dir.path().join("pincode_latlng.json");
        five_entry_store().save(&store_path).unwrap();
        let original = std::fs::read_to_string(&store_path).unwrap();

        let mut rng = StdRng::seed_from_u64(5);
        let err = rewrite_store(
            &store_path,
            dir.path().join("missing_report.json"),
            &SpiralConfig::default(),
            &mut rng,
        )
        .unwrap_err();
        assert!(matches!(err, GeoError::Io(_)));
        assert_eq!(std::fs::read_to_string(&store_path).unwrap(), original);
    }
}
