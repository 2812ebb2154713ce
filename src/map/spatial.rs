use std::collections::HashMap;

use crate::data::RegionFeature;
use crate::map::geometry::polygon_contains;

/// Spatial index over region bounding boxes for hover hit testing.
/// Each region is inserted into every cell its bbox overlaps, so a point
/// query never misses a region; candidates are then checked exactly.
pub struct RegionIndex {
    cells: HashMap<(i32, i32), Vec<usize>>,
    cell_size: f64,
}

impl RegionIndex {
    #[inline(always)]
    fn to_cell(&self, lon: f64, lat: f64) -> (i32, i32) {
        let x = (lon / self.cell_size).floor() as i32;
        let y = (lat / self.cell_size).floor() as i32;
        (x, y)
    }

    /// Build from feature bounding boxes, `cell_size` in degrees
    pub fn build(features: &[RegionFeature], cell_size: f64) -> Self {
        let mut index = Self {
            cells: HashMap::new(),
            cell_size,
        };
        for (idx, feature) in features.iter().enumerate() {
            let (min_lon, min_lat, max_lon, max_lat) = feature.bounds;
            if !min_lon.is_finite() {
                continue;
            }
            let min_cell = index.to_cell(min_lon, min_lat);
            let max_cell = index.to_cell(max_lon, max_lat);
            for y in min_cell.1..=max_cell.1 {
                for x in min_cell.0..=max_cell.0 {
                    index.cells.entry((x, y)).or_default().push(idx);
                }
            }
        }
        index
    }

    /// Index of the region containing (lon, lat); the first match in feature order wins
    pub fn region_at(&self, features: &[RegionFeature], lon: f64, lat: f64) -> Option<usize> {
        let candidates = self.cells.get(&self.to_cell(lon, lat))?;
        candidates.iter().copied().find(|&idx| {
            let f = &features[idx];
            let (min_lon, min_lat, max_lon, max_lat) = f.bounds;
            lon >= min_lon
                && lon <= max_lon
                && lat >= min_lat
                && lat <= max_lat
                && f.polygons.iter().any(|p| polygon_contains(p, lon, lat))
        })
    }
}
