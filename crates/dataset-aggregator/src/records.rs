//! CSV statistics rows

use crate::Result;
use csv::{ReaderBuilder, StringRecord, Trim};
use pincode_geo::{Coordinate, CoordinateStore};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info, warn};

/// Columns read as text; every other numeric column is a metric
pub const CATEGORICAL_COLUMNS: [&str; 4] = ["date", "state", "district", "pincode"];

/// One CSV row before coordinates are attached
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// `<pincode>-<row index>`
    pub id: String,
    pub date: String,
    pub state: String,
    pub district: String,
    pub pincode: String,
    pub metrics: BTreeMap<String, f64>,
}

/// A row placed on the map
#[derive(Debug, Clone, PartialEq)]
pub struct GeoRecord {
    pub record: RawRecord,
    pub coordinate: Coordinate,
}

/// Case-insensitive header lookup
pub(crate) fn column_index(headers: &StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
}

fn is_categorical(header: &str) -> bool {
    CATEGORICAL_COLUMNS
        .iter()
        .any(|c| header.trim().eq_ignore_ascii_case(c))
}

/// Parse every row of a headed CSV. Rows the CSV reader cannot decode are
/// skipped with a warning.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<RawRecord>> {
    let mut csv = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);
    let headers = csv.headers()?.clone();

    let field = |row: &StringRecord, name: &str| -> String {
        column_index(&headers, name)
            .and_then(|i| row.get(i))
            .unwrap_or_default()
            .to_string()
    };

    let mut records = Vec::new();
    for (index, row) in csv.records().enumerate() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                warn!("Skipping unreadable CSV row {}: {}", index + 1, e);
                continue;
            }
        };

        let metrics = headers
            .iter()
            .zip(row.iter())
            .filter(|(header, _)| !is_categorical(header))
            .filter_map(|(header, value)| {
                value
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .map(|v| (header.trim().to_string(), v))
            })
            .collect();

        let pincode = field(&row, "pincode");
        records.push(RawRecord {
            id: format!("{}-{}", pincode, index),
            date: field(&row, "date"),
            state: field(&row, "state"),
            district: field(&row, "district"),
            pincode,
            metrics,
        });
    }

    Ok(records)
}

pub fn read_csv_file(path: impl AsRef<Path>) -> Result<Vec<RawRecord>> {
    let path = path.as_ref();
    let records = read_records(BufReader::new(File::open(path)?))?;
    debug!("Read {} rows from {:?}", records.len(), path);
    Ok(records)
}

/// Read several files and concatenate their rows in order
pub fn read_csv_files<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<RawRecord>> {
    let mut all = Vec::new();
    for path in paths {
        all.extend(read_csv_file(path)?);
    }
    Ok(all)
}

/// Place each row at its pincode's stored coordinate.
///
/// Rows whose pincode has no coordinate are dropped with a warning.
pub fn attach_coordinates(records: Vec<RawRecord>, store: &CoordinateStore) -> Vec<GeoRecord> {
    let total = records.len();
    let placed: Vec<GeoRecord> = records
        .into_iter()
        .filter_map(|record| match store.lookup(&record.pincode) {
            Some(coordinate) => Some(GeoRecord { record, coordinate }),
            None => {
                warn!(
                    "Pincode {:?} not found in coordinate data (row {})",
                    record.pincode, record.id
                );
                None
            }
        })
        .collect();

    info!(
        "Placed {} of {} rows ({} without coordinates)",
        placed.len(),
        total,
        total - placed.len()
    );
    placed
}
