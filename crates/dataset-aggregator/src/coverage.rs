//! Which dataset pincodes still lack a coordinate

use crate::records::column_index;
use crate::Result;
use csv::{ReaderBuilder, Trim};
use pincode_geo::{CoordinateStore, Pincode};
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoverageReport {
    pub files_scanned: usize,
    /// Files without a pincode column
    pub files_skipped: usize,
    pub pincodes: BTreeSet<Pincode>,
    pub missing: BTreeSet<Pincode>,
}

impl CoverageReport {
    pub fn total(&self) -> usize {
        self.pincodes.len()
    }

    pub fn covered(&self) -> usize {
        self.pincodes.len() - self.missing.len()
    }

    /// Percentage of dataset pincodes with a coordinate
    pub fn coverage_pct(&self) -> f64 {
        if self.pincodes.is_empty() {
            return 100.0;
        }
        self.covered() as f64 / self.total() as f64 * 100.0
    }

    /// Sorted missing pincodes, one per line
    pub fn write_missing_list(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        let lines: Vec<&str> = self.missing.iter().map(Pincode::as_str).collect();
        writer.write_all(lines.join("\n").as_bytes())?;
        writer.flush()?;
        Ok(())
    }
}

/// Every `.csv` file under `dir`, recursively, in path order
pub fn find_csv_files(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    let mut pending = vec![dir.as_ref().to_path_buf()];

    while let Some(current) = pending.pop() {
        for entry in fs::read_dir(&current)? {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
            } else if path.extension().is_some_and(|ext| ext == "csv") {
                found.push(path);
            }
        }
    }

    found.sort();
    Ok(found)
}

/// Valid pincodes in one CSV, or `None` when it has no pincode column
pub fn pincodes_in_csv<R: Read>(reader: R) -> Result<Option<BTreeSet<Pincode>>> {
    let mut csv = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let Some(column) = column_index(csv.headers()?, "pincode") else {
        return Ok(None);
    };

    let mut pincodes = BTreeSet::new();
    for row in csv.records() {
        match row {
            Ok(row) => {
                if let Some(pincode) = row.get(column).and_then(|raw| Pincode::new(raw).ok()) {
                    pincodes.insert(pincode);
                }
            }
            Err(e) => debug!("Skipping unreadable row: {}", e),
        }
    }
    Ok(Some(pincodes))
}

/// Compare every pincode in the CSVs under `data_dir` against `store`
pub fn scan_coverage(
    data_dir: impl AsRef<Path>,
    store: &CoordinateStore,
) -> Result<CoverageReport> {
    let files = find_csv_files(data_dir.as_ref())?;
    info!("Found {} CSV files under {:?}", files.len(), data_dir.as_ref());

    let mut report = CoverageReport::default();
    for file in &files {
        match pincodes_in_csv(BufReader::new(File::open(file)?))? {
            Some(pincodes) => {
                report.files_scanned += 1;
                let missing: Vec<&Pincode> =
                    pincodes.iter().filter(|p| !store.contains(p)).collect();
                debug!(
                    "{:?}: {} pincodes, {} missing",
                    file,
                    pincodes.len(),
                    missing.len()
                );
                report.missing.extend(missing.into_iter().cloned());
                report.pincodes.extend(pincodes);
            }
            None => {
                warn!("No pincode column in {:?}", file);
                report.files_skipped += 1;
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pincode_geo::Coordinate;
    use tempfile::tempdir;

    #[test]
    fn test_pincodes_in_csv() {
        let csv = "date,PinCode,count\nx,560001,1\nx,56001,2\nx,abcdef,3\nx, 781001 ,4\n";
        let pins = pincodes_in_csv(csv.as_bytes()).unwrap().unwrap();
        let pins: Vec<&str> = pins.iter().map(Pincode::as_str).collect();
        assert_eq!(pins, vec!["560001", "781001"]);

        assert!(pincodes_in_csv("a,b\n1,2\n".as_bytes()).unwrap().is_none());
    }

    #[test]
    fn test_scan_coverage_recurses() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("enrolment");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("a.csv"), "pincode,v\n560001,1\n560002,2\n").unwrap();
        fs::write(nested.join("b.csv"), "pincode,v\n560002,1\n781001,2\n").unwrap();
        fs::write(nested.join("c.csv"), "state,v\nAssam,1\n").unwrap();
        fs::write(nested.join("notes.txt"), "pincode\n999999\n").unwrap();

        let store: CoordinateStore = vec![(
            Pincode::new("560001").unwrap(),
            Coordinate { lat: 12.97, lng: 77.59 },
        )]
        .into_iter()
        .collect();

        let report = scan_coverage(dir.path(), &store).unwrap();
        assert_eq!(report.files_scanned, 2);
        assert_eq!(report.files_skipped, 1);
        assert_eq!(report.total(), 3);
        assert_eq!(report.covered(), 1);
        assert!((report.coverage_pct() - 33.333).abs() < 0.01);

        let out = dir.path().join("missing_pincodes.txt");
        report.write_missing_list(&out).unwrap();
        assert_eq!(fs::read_to_string(out).unwrap(), "560002\n781001");
    }
}
