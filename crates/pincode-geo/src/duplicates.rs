//! Shared-coordinate detection
//!
//! Groups pincodes by their coordinate rounded to store precision. Any
//! group with two or more members is a [`Cluster`]. Detection is pure: the
//! same store always yields the same report.

use crate::{Coordinate, CoordinateStore, GeoError, Pincode, Result, COORD_SCALE};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

/// A location shared by `count ≥ 2` pincodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub lat: f64,
    pub lng: f64,
    pub count: usize,
    /// Sorted ascending
    pub pincodes: Vec<Pincode>,
}

impl Cluster {
    pub fn center(&self) -> Coordinate {
        Coordinate {
            lat: self.lat,
            lng: self.lng,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateSummary {
    pub total_pincodes: usize,
    pub unique_locations: usize,
    pub duplicate_locations: usize,
    pub pincodes_at_duplicate_locations: usize,
    pub pincodes_at_unique_locations: usize,
}

/// Detector output, persisted as `duplicate_coords_report.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateReport {
    pub summary: DuplicateSummary,
    /// cluster size → number of locations with that size
    pub distribution: BTreeMap<usize, usize>,
    /// Largest clusters first
    pub duplicates: Vec<Cluster>,
}

/// Integer grid key at store precision
type LocationKey = (i64, i64);

fn location_key(c: &Coordinate) -> LocationKey {
    (
        (c.lat * COORD_SCALE).round() as i64,
        (c.lng * COORD_SCALE).round() as i64,
    )
}

/// Find every location shared by more than one pincode.
///
/// Clusters are ordered by size, largest first; equal sizes keep the order
/// in which their first member appeared in the store.
pub fn find_duplicates(store: &CoordinateStore) -> DuplicateReport {
    let mut index: HashMap<LocationKey, usize> = HashMap::new();
    let mut groups: Vec<(LocationKey, Vec<Pincode>)> = Vec::new();

    for (pincode, coord) in store.iter() {
        let key = location_key(coord);
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push((key, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(pincode.clone());
    }

    let unique_locations = groups.len();

    let mut duplicates: Vec<Cluster> = groups
        .into_iter()
        .filter(|(_, pins)| pins.len() > 1)
        .map(|((lat, lng), mut pincodes)| {
            pincodes.sort();
            Cluster {
                lat: lat as f64 / COORD_SCALE,
                lng: lng as f64 / COORD_SCALE,
                count: pincodes.len(),
                pincodes,
            }
        })
        .collect();

    // stable: ties keep grouping order
    duplicates.sort_by(|a, b| b.count.cmp(&a.count));

    let mut distribution: BTreeMap<usize, usize> = BTreeMap::new();
    for dup in &duplicates {
        *distribution.entry(dup.count).or_insert(0) += 1;
    }

    let at_duplicates: usize = duplicates.iter().map(|d| d.count).sum();
    let summary = DuplicateSummary {
        total_pincodes: store.len(),
        unique_locations,
        duplicate_locations: duplicates.len(),
        pincodes_at_duplicate_locations: at_duplicates,
        pincodes_at_unique_locations: store.len() - at_duplicates,
    };

    info!(
        "Found {} shared locations covering {} of {} pincodes",
        summary.duplicate_locations,
        summary.pincodes_at_duplicate_locations,
        summary.total_pincodes
    );

    DuplicateReport {
        summary,
        distribution,
        duplicates,
    }
}

impl DuplicateReport {
    /// Load a report written by [`DuplicateReport::save`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading duplicate report from {:?}", path);

        let file = File::open(path)?;
        let report: DuplicateReport = serde_json::from_reader(BufReader::new(file))?;
        report.validate()?;
        debug!("Report lists {} clusters", report.duplicates.len());
        Ok(report)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    /// Every cluster must list exactly `count` pincodes
    pub fn validate(&self) -> Result<()> {
        for (i, cluster) in self.duplicates.iter().enumerate() {
            if cluster.count != cluster.pincodes.len() {
                return Err(GeoError::MalformedReport(format!(
                    "cluster #{} at [{}, {}] declares count {} but lists {} pincodes",
                    i,
                    cluster.lat,
                    cluster.lng,
                    cluster.count,
                    cluster.pincodes.len()
                )));
            }
        }
        Ok(())
    }

    /// All pincodes sitting at a shared location, in report order
    pub fn pincodes_to_fix(&self) -> Vec<&Pincode> {
        self.duplicates.iter().flat_map(|d| d.pincodes.iter()).collect()
    }

    /// Write [`Self::pincodes_to_fix`] one per line
    pub fn write_fix_list(&self, path: impl AsRef<Path>) -> Result<usize> {
        let pins = self.pincodes_to_fix();
        let file = File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        let body: Vec<&str> = pins.iter().map(|p| p.as_str()).collect();
        writer.write_all(body.join("\n").as_bytes())?;
        writer.flush()?;
        Ok(pins.len())
    }
}
