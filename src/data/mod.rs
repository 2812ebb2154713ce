mod join;
mod sample;

pub use join::{join, parse_value, record_values, JoinReport};
pub use sample::generate_sample_france;

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use geojson::{GeoJson, Geometry, JsonObject, Value};
use thiserror::Error;

use crate::config::DataConfig;

/// A closed ring of lon/lat coordinates
pub type Ring = Vec<(f64, f64)>;

/// Exterior ring followed by any holes
pub type Polygon = Vec<Ring>;

/// A geographic line (sequence of lon/lat coordinates)
pub type LineString = Vec<(f64, f64)>;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse CSV {}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("key column {column:?} not found in {}", .path.display())]
    MissingColumn { column: String, path: PathBuf },
    #[error("failed to parse GeoJSON {}", .path.display())]
    GeoJson {
        path: PathBuf,
        #[source]
        source: Box<geojson::Error>,
    },
    #[error("{} is not a FeatureCollection", .path.display())]
    NotFeatureCollection { path: PathBuf },
}

/// One row of the attribute table
#[derive(Clone, Debug, PartialEq)]
pub struct RegionRecord {
    pub code: String,
    fields: HashMap<String, String>,
}

impl RegionRecord {
    pub fn new<'a>(code: &str, fields: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            code: code.to_string(),
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Raw cell text for a column
    pub fn field(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    /// Parsed value for a column; `None` when missing or not a number
    pub fn value(&self, column: &str) -> Option<f64> {
        self.field(column).map(parse_value).filter(|v| v.is_finite())
    }
}

/// A region polygon carrying the attributes joined onto it
#[derive(Clone, Debug)]
pub struct RegionFeature {
    pub code: String,
    pub name: String,
    pub polygons: Vec<Polygon>,
    /// Source GeoJSON properties, untouched
    pub properties: JsonObject,
    /// Numeric attributes written by [`join`]; NaN marks an unparseable cell
    pub attributes: BTreeMap<String, f64>,
    /// Lon/lat bounds `(min_lon, min_lat, max_lon, max_lat)` for hit testing
    pub bounds: (f64, f64, f64, f64),
}

impl RegionFeature {
    pub fn new(code: &str, name: &str, polygons: Vec<Polygon>) -> Self {
        let bounds = polygon_bounds(&polygons);
        Self {
            code: code.to_string(),
            name: name.to_string(),
            polygons,
            properties: JsonObject::new(),
            attributes: BTreeMap::new(),
            bounds,
        }
    }

    /// Joined value, if present and numeric
    pub fn value(&self, attribute: &str) -> Option<f64> {
        self.attributes.get(attribute).copied().filter(|v| v.is_finite())
    }
}

fn polygon_bounds(polygons: &[Polygon]) -> (f64, f64, f64, f64) {
    let mut bounds = (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);
    for &(lon, lat) in polygons.iter().flatten().flatten() {
        bounds.0 = bounds.0.min(lon);
        bounds.1 = bounds.1.min(lat);
        bounds.2 = bounds.2.max(lon);
        bounds.3 = bounds.3.max(lat);
    }
    bounds
}

/// Everything the viewer needs, fully joined
pub struct Dataset {
    pub records: Vec<RegionRecord>,
    pub features: Vec<RegionFeature>,
    /// Background outlines drawn behind the regions
    pub background: Vec<LineString>,
    pub report: JoinReport,
    /// True when the built-in sample stands in for missing files
    pub is_sample: bool,
}

/// Load records and regions, then join them.
///
/// Missing region or CSV files fall back to the built-in sample; a present but
/// broken file is an error. The background layer is optional and skipped on failure.
pub fn load_dataset(config: &DataConfig, attributes: &[String]) -> Result<Dataset, DataError> {
    let csv_path = config.dir.join(&config.csv);
    let regions_path = config.dir.join(&config.regions);

    let (records, mut features, mut background, is_sample) = if csv_path.exists() && regions_path.exists() {
        let records = load_records(&csv_path, &config.join_key)?;
        let features = load_regions(&regions_path, &config.join_key, &config.name_key)?;
        tracing::info!(
            records = records.len(),
            features = features.len(),
            "loaded {} and {}",
            csv_path.display(),
            regions_path.display()
        );
        (records, features, Vec::new(), false)
    } else {
        tracing::warn!(
            "{} or {} missing, using built-in sample regions",
            csv_path.display(),
            regions_path.display()
        );
        let (records, features, background) = generate_sample_france(attributes);
        (records, features, background, true)
    };

    if let Some(name) = &config.background {
        let path = config.dir.join(name);
        if path.exists() {
            match load_background(&path) {
                Ok(lines) => background = lines,
                Err(e) => tracing::warn!("failed to load background {}: {}", path.display(), e),
            }
        }
    }

    let report = join(&mut features, &records, attributes);
    if !report.unmatched_features.is_empty() {
        tracing::info!(codes = ?report.unmatched_features, "regions without attribute data");
    }

    Ok(Dataset {
        records,
        features,
        background,
        report,
        is_sample,
    })
}

/// Read the attribute table; every column except the key is kept as raw text
pub fn load_records(path: &Path, join_key: &str) -> Result<Vec<RegionRecord>, DataError> {
    let csv_err = |source| DataError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_path(path)
        .map_err(csv_err)?;
    let headers = rdr.headers().map_err(csv_err)?.clone();

    let key_idx = headers
        .iter()
        .position(|h| h == join_key)
        .ok_or_else(|| DataError::MissingColumn {
            column: join_key.to_string(),
            path: path.to_path_buf(),
        })?;

    let mut records = Vec::new();
    for result in rdr.records() {
        let row = result.map_err(csv_err)?;
        let code = row.get(key_idx).unwrap_or("");
        if code.is_empty() {
            tracing::warn!("skipping row without {join_key} in {}", path.display());
            continue;
        }

        let fields = headers
            .iter()
            .zip(row.iter())
            .enumerate()
            .filter(|(i, _)| *i != key_idx)
            .map(|(_, pair)| pair);
        records.push(RegionRecord::new(code, fields));
    }

    Ok(records)
}

fn read_geojson(path: &Path) -> Result<GeoJson, DataError> {
    let content = fs::read_to_string(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    content.parse().map_err(|source| DataError::GeoJson {
        path: path.to_path_buf(),
        source: Box::new(source),
    })
}

/// Read region polygons. Features without a code or without polygon geometry are skipped.
pub fn load_regions(path: &Path, join_key: &str, name_key: &str) -> Result<Vec<RegionFeature>, DataError> {
    let GeoJson::FeatureCollection(fc) = read_geojson(path)? else {
        return Err(DataError::NotFeatureCollection {
            path: path.to_path_buf(),
        });
    };

    let mut features = Vec::with_capacity(fc.features.len());

    for feature in fc.features {
        let properties = feature.properties.unwrap_or_default();

        let code = match properties.get(join_key) {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => {
                tracing::warn!("skipping feature without {join_key}");
                continue;
            }
        };

        let name = properties
            .get(name_key)
            .and_then(|v| v.as_str())
            .unwrap_or(code.as_str())
            .to_string();

        let polygons = feature
            .geometry
            .as_ref()
            .map(collect_polygons)
            .unwrap_or_default();
        if polygons.is_empty() {
            tracing::warn!(code = %code, "skipping feature without polygon geometry");
            continue;
        }

        let mut region = RegionFeature::new(&code, &name, polygons);
        region.properties = properties;
        features.push(region);
    }

    Ok(features)
}

/// Read background outlines (every ring or line becomes one linestring)
pub fn load_background(path: &Path) -> Result<Vec<LineString>, DataError> {
    let geojson = read_geojson(path)?;
    let mut lines = Vec::new();
    process_geojson_lines(&geojson, |line| lines.push(line));
    Ok(lines)
}

fn to_coords(positions: &[Vec<f64>]) -> Vec<(f64, f64)> {
    positions
        .iter()
        .filter(|c| c.len() >= 2)
        .map(|c| (c[0], c[1]))
        .collect()
}

fn collect_polygons(geometry: &Geometry) -> Vec<Polygon> {
    match &geometry.value {
        Value::Polygon(rings) => vec![rings.iter().map(|r| to_coords(r)).collect()],
        Value::MultiPolygon(polygons) => polygons
            .iter()
            .map(|rings| rings.iter().map(|r| to_coords(r)).collect())
            .collect(),
        Value::GeometryCollection(geometries) => geometries.iter().flat_map(collect_polygons).collect(),
        _ => Vec::new(),
    }
}

/// Process GeoJSON and extract line features
fn process_geojson_lines<F>(geojson: &GeoJson, mut add_line: F)
where
    F: FnMut(LineString),
{
    match geojson {
        GeoJson::FeatureCollection(fc) => {
            for feature in &fc.features {
                if let Some(ref geometry) = feature.geometry {
                    process_geometry_lines(geometry, &mut add_line);
                }
            }
        }
        GeoJson::Feature(f) => {
            if let Some(ref geometry) = f.geometry {
                process_geometry_lines(geometry, &mut add_line);
            }
        }
        GeoJson::Geometry(geometry) => {
            process_geometry_lines(geometry, &mut add_line);
        }
    }
}

fn process_geometry_lines<F>(geometry: &Geometry, add_line: &mut F)
where
    F: FnMut(LineString),
{
    match &geometry.value {
        Value::LineString(coords) => add_line(to_coords(coords)),
        Value::MultiLineString(lines) => {
            for coords in lines {
                add_line(to_coords(coords));
            }
        }
        Value::Polygon(rings) => {
            for ring in rings {
                add_line(to_coords(ring));
            }
        }
        Value::MultiPolygon(polygons) => {
            for ring in polygons.iter().flatten() {
                add_line(to_coords(ring));
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                process_geometry_lines(g, add_line);
            }
        }
        _ => {}
    }
}
