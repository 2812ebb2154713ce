use std::collections::HashMap;

use super::{RegionFeature, RegionRecord};

/// Outcome of a join, kept for logging and the summary output
#[derive(Debug, Default, Clone, PartialEq)]
pub struct JoinReport {
    pub matched: usize,
    /// Codes of features that found no record
    pub unmatched_features: Vec<String>,
    /// Codes of records no feature asked for
    pub unused_records: Vec<String>,
}

/// Parse a table cell. Anything that is not a plain float becomes NaN.
pub fn parse_value(text: &str) -> f64 {
    text.trim().parse::<f64>().unwrap_or(f64::NAN)
}

/// Copy every attribute of the matching record into each feature's attributes.
///
/// Matching is exact string equality on the administrative code. Features
/// without a record are left as they are; records without a feature are ignored.
/// When several records share a code the last one wins.
pub fn join(features: &mut [RegionFeature], records: &[RegionRecord], attributes: &[String]) -> JoinReport {
    let index: HashMap<&str, &RegionRecord> = records.iter().map(|r| (r.code.as_str(), r)).collect();

    let mut report = JoinReport::default();

    for feature in features.iter_mut() {
        let Some(record) = index.get(feature.code.as_str()) else {
            report.unmatched_features.push(feature.code.clone());
            continue;
        };

        for attr in attributes {
            let value = record.field(attr).map_or(f64::NAN, parse_value);
            feature.attributes.insert(attr.clone(), value);
        }
        report.matched += 1;
    }

    let mut used: Vec<&str> = features.iter().map(|f| f.code.as_str()).collect();
    used.sort_unstable();
    for code in index.keys() {
        if used.binary_search(code).is_err() {
            report.unused_records.push(code.to_string());
        }
    }
    report.unused_records.sort();

    tracing::debug!(
        matched = report.matched,
        unmatched = report.unmatched_features.len(),
        unused = report.unused_records.len(),
        "joined records into features"
    );

    report
}

/// Values of one attribute across all records, in record order
pub fn record_values(records: &[RegionRecord], attribute: &str) -> Vec<f64> {
    records
        .iter()
        .map(|r| r.field(attribute).map_or(f64::NAN, parse_value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{Class, ColorScale, Method};
    use crate::palette::Palette;
    use ratatui::style::Color;

    fn record(code: &str, v: &str) -> RegionRecord {
        RegionRecord::new(code, [("v", v)])
    }

    fn attrs() -> Vec<String> {
        vec!["v".to_string()]
    }

    fn features(codes: &[&str]) -> Vec<RegionFeature> {
        codes.iter().map(|c| RegionFeature::new(c, c, Vec::new())).collect()
    }

    #[test]
    fn test_join_matches_and_skips() {
        let records = vec![record("A", "10"), record("B", "20"), record("C", "100")];
        let mut feats = features(&["A", "B", "C", "D"]);

        let report = join(&mut feats, &records, &attrs());

        assert_eq!(feats[0].value("v"), Some(10.0));
        assert_eq!(feats[1].value("v"), Some(20.0));
        assert_eq!(feats[2].value("v"), Some(100.0));
        assert_eq!(feats[3].value("v"), None);
        assert!(feats[3].attributes.is_empty());
        assert_eq!(report.matched, 3);
        assert_eq!(report.unmatched_features, vec!["D".to_string()]);
        assert!(report.unused_records.is_empty());
    }

    #[test]
    fn test_missing_feature_renders_fallback() {
        let records = vec![record("A", "10"), record("B", "20"), record("C", "100")];
        let mut feats = features(&["A", "B", "C", "D"]);
        join(&mut feats, &records, &attrs());

        let scale = ColorScale::build(&record_values(&records, "v"), Method::NaturalBreaks, Palette::default());
        assert_eq!(scale.breakpoints(), &[20.0, 100.0]);
        assert_eq!(scale.classify_opt(feats[3].value("v")), Class::Fallback);
        assert_eq!(scale.color_opt(feats[3].value("v")), Color::Rgb(0xCC, 0xCC, 0xCC));
        assert_eq!(scale.classify_opt(feats[0].value("v")), Class::Bucket(0));
    }

    #[test]
    fn test_exact_key_match_only() {
        let records = vec![record("a", "1"), record(" A", "2")];
        let mut feats = features(&["A"]);
        let report = join(&mut feats, &records, &attrs());
        assert!(feats[0].attributes.is_empty());
        assert_eq!(report.unused_records, vec![" A".to_string(), "a".to_string()]);
    }

    #[test]
    fn test_unparseable_becomes_nan() {
        let records = vec![record("A", "n/a"), RegionRecord::new("B", [("w", "3")])];
        let mut feats = features(&["A", "B"]);
        join(&mut feats, &records, &attrs());

        assert!(feats[0].attributes["v"].is_nan());
        assert_eq!(feats[0].value("v"), None);
        // Column absent from the record
        assert!(feats[1].attributes["v"].is_nan());
    }

    #[test]
    fn test_join_is_idempotent() {
        let records = vec![record("A", "1.5"), record("B", "oops")];
        let mut once = features(&["A", "B", "C"]);
        join(&mut once, &records, &attrs());

        let mut twice = once.clone();
        let report = join(&mut twice, &records, &attrs());

        assert_eq!(report.matched, 2);
        for (a, b) in once.iter().zip(&twice) {
            assert_eq!(a.attributes.len(), b.attributes.len());
            for (k, v) in &a.attributes {
                assert_eq!(v.to_bits(), b.attributes[k].to_bits());
            }
        }
    }

    #[test]
    fn test_last_duplicate_record_wins() {
        let records = vec![record("A", "1"), record("A", "2")];
        let mut feats = features(&["A"]);
        join(&mut feats, &records, &attrs());
        assert_eq!(feats[0].value("v"), Some(2.0));
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value(" 42.5 "), 42.5);
        assert_eq!(parse_value("-3"), -3.0);
        assert!(parse_value("").is_nan());
        assert!(parse_value("12abc").is_nan());
    }
}
