//! Per-pincode aggregation and GeoJSON output

use crate::records::GeoRecord;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value as GeoValue};
use pincode_geo::Coordinate;
use serde_json::json;
use std::collections::{BTreeMap, HashMap};

/// All rows of one pincode collapsed into a single point
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedPoint {
    pub pincode: String,
    /// Taken from the first row seen
    pub state: String,
    pub district: String,
    pub coordinate: Coordinate,
    pub metrics: BTreeMap<String, f64>,
    pub count: usize,
}

impl AggregatedPoint {
    fn start(record: &GeoRecord) -> Self {
        Self {
            pincode: record.record.pincode.clone(),
            state: record.record.state.clone(),
            district: record.record.district.clone(),
            coordinate: record.coordinate,
            metrics: record.record.metrics.clone(),
            count: 1,
        }
    }

    fn absorb(&mut self, record: &GeoRecord) {
        for (key, value) in &record.record.metrics {
            *self.metrics.entry(key.clone()).or_insert(0.0) += value;
        }
        self.count += 1;
    }

    /// Summed value of `metric`, zero when no row carried it
    pub fn value(&self, metric: &str) -> f64 {
        self.metrics.get(metric).copied().unwrap_or(0.0)
    }

    pub fn to_feature(&self, metric: &str) -> Feature {
        let mut properties = JsonObject::new();
        properties.insert("id".into(), json!(self.pincode));
        properties.insert("state".into(), json!(self.state));
        properties.insert("district".into(), json!(self.district));
        properties.insert("pincode".into(), json!(self.pincode));
        properties.insert("value".into(), json!(self.value(metric)));
        properties.insert("count".into(), json!(self.count));

        Feature {
            bbox: None,
            geometry: Some(Geometry::new(GeoValue::Point(vec![
                self.coordinate.lng,
                self.coordinate.lat,
            ]))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        }
    }
}

/// Group rows by pincode, summing every metric. Points come out in the
/// order their pincode first appears.
pub fn aggregate_by_pincode(records: &[GeoRecord]) -> Vec<AggregatedPoint> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut points: Vec<AggregatedPoint> = Vec::new();

    for record in records {
        match index.get(record.record.pincode.as_str()) {
            Some(&i) => points[i].absorb(record),
            None => {
                index.insert(record.record.pincode.as_str(), points.len());
                points.push(AggregatedPoint::start(record));
            }
        }
    }

    points
}

/// One point feature per pincode carrying the selected metric's sum
pub fn to_feature_collection(records: &[GeoRecord], metric: &str) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: aggregate_by_pincode(records)
            .iter()
            .map(|p| p.to_feature(metric))
            .collect(),
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::RawRecord;

    fn record(pincode: &str, row: usize, metrics: &[(&str, f64)]) -> GeoRecord {
        GeoRecord {
            record: RawRecord {
                id: format!("{}-{}", pincode, row),
                date: "01-03-2025".into(),
                state: "Karnataka".into(),
                district: "Bengaluru Urban".into(),
                pincode: pincode.into(),
                metrics: metrics.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            },
            coordinate: Coordinate { lat: 12.97, lng: 77.59 },
        }
    }

    #[test]
    fn test_sums_metric_and_counts_rows() {
        let records = vec![
            record("560001", 0, &[("enrolled", 10.0)]),
            record("560001", 1, &[("enrolled", 15.0)]),
        ];
        let fc = to_feature_collection(&records, "enrolled");
        assert_eq!(fc.features.len(), 1);

        let props = fc.features[0].properties.as_ref().unwrap();
        assert_eq!(props["value"], json!(25.0));
        assert_eq!(props["count"], json!(2));
        assert_eq!(props["id"], json!("560001"));
        assert_eq!(props["pincode"], json!("560001"));
    }

    #[test]
    fn test_geometry_is_lng_lat() {
        let fc = to_feature_collection(&[record("560001", 0, &[])], "enrolled");
        let geometry = fc.features[0].geometry.as_ref().unwrap();
        assert_eq!(geometry.value, GeoValue::Point(vec![77.59, 12.97]));
        assert_eq!(fc.features[0].properties.as_ref().unwrap()["value"], json!(0.0));
    }

    #[test]
    fn test_first_seen_order_and_partial_metrics() {
        let records = vec![
            record("781001", 0, &[("a", 1.0)]),
            record("110001", 1, &[("b", 2.0)]),
            record("781001", 2, &[("b", 3.0)]),
        ];
        let points = aggregate_by_pincode(&records);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].pincode, "781001");
        assert_eq!(points[0].value("a"), 1.0);
        assert_eq!(points[0].value("b"), 3.0);
        assert_eq!(points[0].count, 2);
        assert_eq!(points[1].pincode, "110001");
    }

    #[test]
    fn test_serializes_as_feature_collection() {
        let fc = to_feature_collection(&[record("560001", 0, &[("enrolled", 4.0)])], "enrolled");
        let value = serde_json::to_value(&fc).unwrap();
        assert_eq!(value["type"], "FeatureCollection");
        assert_eq!(value["features"][0]["type"], "Feature");
        assert_eq!(value["features"][0]["geometry"]["type"], "Point");
    }
}
