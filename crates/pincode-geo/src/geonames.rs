//! GeoNames postal dump import
//!
//! Reads the tab-separated `IN.txt` export from download.geonames.org:
//!
//! ```text
//! country  postal  place  admin1 ... admin3code  latitude  longitude  accuracy
//!   0        1       2      3          8           9         10         11
//! ```
//!
//! The first row seen for a pincode wins.

use crate::{Coordinate, CoordinateStore, Pincode, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

const FIELD_POSTAL: usize = 1;
const FIELD_LAT: usize = 9;
const FIELD_LNG: usize = 10;
const MIN_FIELDS: usize = 11;

/// Lines between progress logs
pub const PROGRESS_EVERY: usize = 50_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportStats {
    pub lines: usize,
    pub imported: usize,
    pub skipped: usize,
}

/// Parse one dump line into a pincode/coordinate pair
pub fn parse_line(line: &str) -> Option<(Pincode, Coordinate)> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < MIN_FIELDS {
        return None;
    }
    let pincode = Pincode::new(fields[FIELD_POSTAL].trim()).ok()?;
    let lat: f64 = fields[FIELD_LAT].trim().parse().ok()?;
    let lng: f64 = fields[FIELD_LNG].trim().parse().ok()?;
    Coordinate::new(lat, lng).ok().map(|c| (pincode, c))
}

/// Import every usable line from `reader`
pub fn import_from_reader<R: BufRead>(reader: R) -> Result<(CoordinateStore, ImportStats)> {
    let mut store = CoordinateStore::new();
    let mut stats = ImportStats::default();

    for line in reader.lines() {
        let line = line?;
        stats.lines += 1;

        match parse_line(&line) {
            Some((pincode, coord)) => {
                if store.insert_if_absent(pincode, coord) {
                    stats.imported += 1;
                }
            }
            None => {
                stats.skipped += 1;
                debug!("Skipping line {}", stats.lines);
            }
        }

        if stats.lines % PROGRESS_EVERY == 0 {
            info!(
                "Processed {} records ({} unique pincodes)",
                stats.lines,
                store.len()
            );
        }
    }

    info!("Processed {} records total", stats.lines);
    Ok((store, stats))
}

pub fn import_file(path: impl AsRef<Path>) -> Result<(CoordinateStore, ImportStats)> {
    let path = path.as_ref();
    info!("Parsing GeoNames India postal code data from {:?}", path);
    let file = File::open(path)?;
    import_from_reader(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const SAMPLE: &str = "IN\t560001\tBangalore G.P.O.\tKarnataka\t19\tBangalore\t525\tBangalore\t\t12.9762\t77.6033\t4\n\
IN\t560001\tM.G.Road\tKarnataka\t19\tBangalore\t525\tBangalore\t\t12.9750\t77.6060\t4\n\
IN\t110001\tConnaught Place\tDelhi\t07\tNew Delhi\t\t\t\t28.6328\t77.2197\t4\n\
IN\t110002\tbroken\n\
IN\tXYZ\tBad code\tDelhi\t07\t\t\t\t\t28.0\t77.0\t4\n";

    #[test]
    fn test_first_occurrence_wins() {
        let (store, stats) = import_from_reader(Cursor::new(SAMPLE)).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(stats.lines, 5);
        assert_eq!(stats.imported, 2);
        assert_eq!(stats.skipped, 2);
        assert_eq!(
            store.lookup("560001"),
            Some(Coordinate { lat: 12.9762, lng: 77.6033 })
        );
    }

    #[test]
    fn test_parse_line_rejects_short_rows() {
        assert!(parse_line("IN\t110002\tbroken").is_none());
        assert!(parse_line("").is_none());
    }

    #[test]
    fn test_imported_coordinates_rounded() {
        let line = "IN\t560001\tBangalore G.P.O.\tKarnataka\t19\tBangalore\t525\tBangalore\t\t12.97159876\t77.59456234\t4\n";
        let (store, _) = import_from_reader(Cursor::new(line)).unwrap();
        let coord = store.lookup("560001").unwrap();
        assert_eq!(coord, Coordinate { lat: 12.971599, lng: 77.594562 });
        assert_eq!(coord, coord.rounded());
    }
}
