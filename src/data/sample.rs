use super::{LineString, RegionFeature, RegionRecord};
use crate::hash::{hash2, rand_simple};

/// Coarse outlines of the metropolitan regions: (code, name, exterior ring)
const REGIONS: [(&str, &str, &[(f64, f64)]); 13] = [
    (
        "FR-HDF",
        "Hauts-de-France",
        &[(1.6, 50.9), (2.5, 51.1), (4.2, 50.0), (4.0, 49.0), (2.6, 49.1), (1.5, 49.7)],
    ),
    (
        "FR-NOR",
        "Normandie",
        &[(-1.9, 49.7), (1.5, 50.0), (1.7, 49.1), (1.0, 48.5), (-1.1, 48.5), (-1.6, 48.7)],
    ),
    (
        "FR-IDF",
        "Île-de-France",
        &[(1.7, 49.1), (3.5, 49.1), (3.4, 48.4), (2.9, 48.2), (1.6, 48.4)],
    ),
    (
        "FR-GES",
        "Grand Est",
        &[
            (3.5, 49.1), (4.0, 49.0), (4.2, 50.0), (6.4, 49.5), (8.2, 49.0),
            (7.6, 47.6), (7.0, 47.5), (5.9, 47.9), (4.6, 48.3), (3.4, 48.4),
        ],
    ),
    (
        "FR-BRE",
        "Bretagne",
        &[(-4.8, 48.4), (-3.0, 48.8), (-1.6, 48.7), (-1.1, 48.0), (-2.0, 47.5), (-4.3, 47.8)],
    ),
    (
        "FR-PDL",
        "Pays de la Loire",
        &[(-2.0, 47.5), (-1.1, 48.0), (-1.1, 48.5), (1.0, 48.5), (0.4, 47.1), (-1.0, 46.4), (-2.2, 46.8)],
    ),
    (
        "FR-CVL",
        "Centre-Val de Loire",
        &[(0.4, 47.1), (1.0, 48.5), (1.6, 48.4), (2.9, 48.2), (3.1, 47.2), (2.6, 46.4), (1.0, 46.6)],
    ),
    (
        "FR-BFC",
        "Bourgogne-Franche-Comté",
        &[(2.9, 48.2), (3.4, 48.4), (4.6, 48.3), (5.9, 47.9), (7.0, 47.5), (6.1, 46.4), (4.8, 46.3), (3.0, 46.8), (3.1, 47.2)],
    ),
    (
        "FR-NAQ",
        "Nouvelle-Aquitaine",
        &[
            (-1.0, 46.4), (0.4, 47.1), (1.0, 46.6), (2.6, 46.4), (2.2, 45.0),
            (0.6, 44.1), (-0.1, 43.3), (-1.8, 43.4), (-1.3, 44.6), (-1.2, 46.2),
        ],
    ),
    (
        "FR-ARA",
        "Auvergne-Rhône-Alpes",
        &[(2.6, 46.4), (3.0, 46.8), (4.8, 46.3), (6.1, 46.4), (7.0, 45.9), (6.8, 45.0), (5.3, 44.4), (4.0, 44.3), (2.2, 45.0)],
    ),
    (
        "FR-OCC",
        "Occitanie",
        &[(-0.1, 43.3), (0.6, 44.1), (2.2, 45.0), (4.0, 44.3), (4.8, 43.7), (3.2, 43.2), (3.1, 42.4), (1.7, 42.5), (0.0, 42.7)],
    ),
    (
        "FR-PAC",
        "Provence-Alpes-Côte d'Azur",
        &[(4.0, 44.3), (5.3, 44.4), (6.8, 45.0), (7.6, 44.1), (7.5, 43.8), (6.5, 43.1), (5.0, 43.3), (4.8, 43.7)],
    ),
    (
        "FR-COR",
        "Corse",
        &[(8.6, 43.0), (9.4, 43.0), (9.6, 42.2), (9.2, 41.4), (8.6, 41.9)],
    ),
];

/// Regions left out of the sample table so the fallback color shows up
const WITHOUT_RECORD: &[&str] = &["FR-COR"];

/// Built-in stand-in for the region files: coarse polygons, deterministic
/// pseudo-random values in `[0, 100)` and a rough outline of the neighbours.
pub fn generate_sample_france(attributes: &[String]) -> (Vec<RegionRecord>, Vec<RegionFeature>, Vec<LineString>) {
    let mut records = Vec::new();
    let mut features = Vec::with_capacity(REGIONS.len());

    for (region_idx, (code, name, outline)) in REGIONS.iter().enumerate() {
        let mut ring: Vec<(f64, f64)> = outline.to_vec();
        ring.push(outline[0]);
        features.push(RegionFeature::new(code, name, vec![vec![ring]]));

        if WITHOUT_RECORD.contains(code) {
            continue;
        }

        let cells: Vec<(String, String)> = attributes
            .iter()
            .enumerate()
            .map(|(attr_idx, attr)| {
                let v = (rand_simple(hash2(region_idx as u64 + 1, attr_idx as u64 + 1)) * 1000.0).floor() / 10.0;
                (attr.clone(), format!("{:.1}", v))
            })
            .collect();
        records.push(RegionRecord::new(
            code,
            cells.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        ));
    }

    (records, features, sample_background())
}

/// Simplified western Europe outline
fn sample_background() -> Vec<LineString> {
    vec![
        vec![
            (-10.0, 36.0), (-5.0, 36.0), (0.0, 38.0), (3.2, 42.0),
            (5.0, 43.2), (7.5, 43.8), (10.0, 44.0), (13.0, 45.7),
        ],
        vec![
            (-9.5, 43.0), (-1.8, 43.4), (-1.2, 46.2), (-2.2, 46.8),
            (-4.3, 47.8), (-4.8, 48.4), (-1.9, 49.7), (1.6, 50.9),
            (4.5, 52.5), (8.5, 54.0), (10.0, 57.5),
        ],
        vec![
            (-5.7, 50.0), (1.4, 51.2), (1.7, 52.7), (0.0, 53.5),
            (-3.0, 56.0), (-5.0, 58.6), (-6.2, 56.5), (-3.0, 53.3),
            (-5.0, 51.6), (-5.7, 50.0),
        ],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_is_deterministic() {
        let attrs = vec!["varA".to_string(), "varB".to_string()];
        let (a, _, _) = generate_sample_france(&attrs);
        let (b, _, _) = generate_sample_france(&attrs);
        assert_eq!(a, b);
    }

    #[test]
    fn test_sample_values_in_range() {
        let attrs = vec!["varA".to_string()];
        let (records, features, background) = generate_sample_france(&attrs);
        assert_eq!(features.len(), 13);
        assert_eq!(records.len(), 12);
        assert!(!background.is_empty());
        for r in &records {
            let v = r.value("varA").unwrap();
            assert!((0.0..100.0).contains(&v));
        }
        for f in &features {
            let ring = &f.polygons[0][0];
            assert_eq!(ring.first(), ring.last());
        }
    }
}
