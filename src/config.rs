use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::classify::Method;
use crate::palette::{Palette, DEFAULT_CLASS_COLORS, DEFAULT_FALLBACK};

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataConfig,
    #[serde(rename = "attribute")]
    pub attributes: AttributeList,
    pub classification: ClassificationConfig,
    pub projection: ProjectionConfig,
    pub chart: ChartConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DataConfig {
    pub dir: PathBuf,
    pub csv: PathBuf,
    pub regions: PathBuf,
    pub background: Option<PathBuf>,
    /// Column / property shared by both datasets
    pub join_key: String,
    /// Property holding the human readable region name
    pub name_key: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
            csv: PathBuf::from("unitsData.csv"),
            regions: PathBuf::from("FranceRegions.geojson"),
            background: Some(PathBuf::from("EuropeCountries.geojson")),
            join_key: "adm1_code".to_string(),
            name_key: "name".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AttributeConfig {
    pub column: String,
    pub label: Option<String>,
}

impl AttributeConfig {
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.column)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(transparent)]
pub struct AttributeList(pub Vec<AttributeConfig>);

impl Default for AttributeList {
    fn default() -> Self {
        Self(
            ["A", "B", "C", "D", "E"]
                .iter()
                .map(|s| AttributeConfig {
                    column: format!("var{s}"),
                    label: Some(format!("Variable {s}")),
                })
                .collect(),
        )
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ClassificationConfig {
    pub method: Method,
    /// Hex colors, one per class
    pub colors: Vec<String>,
    pub fallback: String,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            method: Method::NaturalBreaks,
            colors: DEFAULT_CLASS_COLORS.iter().map(|c| c.to_string()).collect(),
            fallback: DEFAULT_FALLBACK.to_string(),
        }
    }
}

impl ClassificationConfig {
    pub fn palette(&self) -> Result<Palette> {
        Palette::from_hex(&self.colors, &self.fallback).context("invalid classification colors")
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ProjectionConfig {
    /// Lon/lat of the map center, after rotation
    pub center: [f64; 2],
    /// Longitude rotation in degrees
    pub rotate: f64,
    /// Standard parallels of the conic projection
    pub parallels: [f64; 2],
    /// Scale at the 480x460 map frame
    pub scale: f64,
    /// Graticule spacing in degrees; 0 disables it
    pub graticule_step: f64,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            center: [0.0, 46.2],
            rotate: -2.0,
            parallels: [43.0, 62.0],
            scale: 2500.0,
            graticule_step: 5.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ChartConfig {
    /// Top of the bar scale; derived from the data when absent
    pub y_max: Option<f64>,
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }

    /// Attribute column names in display order
    pub fn columns(&self) -> Vec<String> {
        self.attributes.0.iter().map(|a| a.column.clone()).collect()
    }

    /// Label for a column, falling back to the column name
    pub fn label_for<'a>(&'a self, column: &'a str) -> &'a str {
        self.attributes
            .0
            .iter()
            .find(|a| a.column == column)
            .map_or(column, AttributeConfig::label)
    }
}
