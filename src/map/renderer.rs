use glam::DVec2;
use ratatui::style::Color;

use crate::braille::BrailleCanvas;
use crate::data::{LineString, RegionFeature};
use crate::map::geometry::{draw_line, draw_thick_line, fill_rings};
use crate::map::projection::Viewport;

/// Outline style of one region; the hover handler swaps it and restores it later
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegionStyle {
    pub stroke: Color,
    pub thick: bool,
}

impl Default for RegionStyle {
    fn default() -> Self {
        Self {
            stroke: Color::White,
            thick: false,
        }
    }
}

impl RegionStyle {
    pub fn highlight() -> Self {
        Self {
            stroke: Color::Blue,
            thick: true,
        }
    }
}

/// Display settings for map layers
#[derive(Clone)]
pub struct DisplaySettings {
    pub show_graticule: bool,
    pub show_background: bool,
    pub show_outlines: bool,
    pub show_labels: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_graticule: true,
            show_background: true,
            show_outlines: true,
            show_labels: false,
        }
    }
}

/// Canvases sharing one color, drawn in insertion order
pub type ColorLayers = Vec<(Color, BrailleCanvas)>;

/// Rendered map, back to front
pub struct MapLayers {
    pub graticule: BrailleCanvas,
    pub background: BrailleCanvas,
    pub fills: ColorLayers,
    pub outlines: ColorLayers,
    /// (column, row, text) in character cells
    pub labels: Vec<(u16, u16, String)>,
}

/// Canvas for `color`, created on first use
fn layer_for(layers: &mut ColorLayers, color: Color, width: usize, height: usize) -> &mut BrailleCanvas {
    let idx = match layers.iter().position(|(c, _)| *c == color) {
        Some(idx) => idx,
        None => {
            layers.push((color, BrailleCanvas::new(width, height)));
            layers.len() - 1
        }
    };
    &mut layers[idx].1
}

/// Map renderer: graticule, background outlines and the choropleth regions
pub struct MapRenderer {
    pub background: Vec<LineString>,
    pub graticule: Vec<LineString>,
    pub settings: DisplaySettings,
}

impl MapRenderer {
    pub fn new(background: Vec<LineString>, graticule_step: f64) -> Self {
        Self {
            background,
            graticule: graticule_lines(graticule_step, (-30.0, 25.0, 45.0, 75.0)),
            settings: DisplaySettings::default(),
        }
    }

    pub fn toggle_graticule(&mut self) {
        self.settings.show_graticule = !self.settings.show_graticule;
    }

    pub fn toggle_background(&mut self) {
        self.settings.show_background = !self.settings.show_background;
    }

    /// Region outlines; a highlighted region keeps its outline either way
    pub fn toggle_outlines(&mut self) {
        self.settings.show_outlines = !self.settings.show_outlines;
    }

    pub fn toggle_labels(&mut self) {
        self.settings.show_labels = !self.settings.show_labels;
    }

    /// Render all layers. `fill` and `stroke` decide each region's colors.
    pub fn render<F, S>(
        &self,
        width: usize,
        height: usize,
        viewport: &Viewport,
        features: &[RegionFeature],
        fill: F,
        stroke: S,
    ) -> MapLayers
    where
        F: Fn(&RegionFeature) -> Color,
        S: Fn(&RegionFeature) -> RegionStyle,
    {
        let mut layers = MapLayers {
            graticule: BrailleCanvas::new(width, height),
            background: BrailleCanvas::new(width, height),
            fills: Vec::new(),
            outlines: Vec::new(),
            labels: Vec::new(),
        };

        if self.settings.show_graticule {
            for line in &self.graticule {
                draw_linestring(&mut layers.graticule, line, viewport, false);
            }
        }

        if self.settings.show_background {
            for line in &self.background {
                draw_linestring(&mut layers.background, line, viewport, false);
            }
        }

        for feature in features {
            let canvas = layer_for(&mut layers.fills, fill(feature), width, height);
            for polygon in &feature.polygons {
                let rings: Vec<Vec<DVec2>> = polygon
                    .iter()
                    .map(|ring| ring.iter().map(|&(lon, lat)| viewport.project_f(lon, lat)).collect())
                    .collect();
                fill_rings(canvas, &rings);
            }
        }

        for feature in features {
            let style = stroke(feature);
            if !self.settings.show_outlines && !style.thick {
                continue;
            }
            let canvas = layer_for(&mut layers.outlines, style.stroke, width, height);
            for ring in feature.polygons.iter().flatten() {
                draw_linestring(canvas, ring, viewport, style.thick);
            }
        }

        if self.settings.show_labels {
            for feature in features {
                let (min_lon, min_lat, max_lon, max_lat) = feature.bounds;
                if !min_lon.is_finite() {
                    continue;
                }
                let (px, py) = viewport.project((min_lon + max_lon) / 2.0, (min_lat + max_lat) / 2.0);
                if viewport.is_visible(px, py) && px >= 0 && py >= 0 {
                    let text = feature.name.clone();
                    let half = (text.chars().count() / 2) as u16;
                    let col = ((px / 2) as u16).saturating_sub(half);
                    layers.labels.push((col, (py / 4) as u16, text));
                }
            }
        }

        layers
    }
}

/// Draw a linestring with viewport culling
fn draw_linestring(canvas: &mut BrailleCanvas, line: &LineString, viewport: &Viewport, thick: bool) {
    if line.len() < 2 {
        return;
    }

    let mut prev: Option<(i32, i32)> = None;

    for &(lon, lat) in line {
        let (px, py) = viewport.project(lon, lat);

        if let Some((prev_x, prev_y)) = prev {
            if viewport.line_might_be_visible((prev_x, prev_y), (px, py)) {
                if thick {
                    draw_thick_line(canvas, prev_x, prev_y, px, py);
                } else {
                    draw_line(canvas, prev_x, prev_y, px, py);
                }
            }
        }

        prev = Some((px, py));
    }
}

/// Meridians and parallels every `step` degrees inside `(min_lon, min_lat, max_lon, max_lat)`,
/// sampled every degree so they follow the conic curvature
pub fn graticule_lines(step: f64, extent: (f64, f64, f64, f64)) -> Vec<LineString> {
    if step <= 0.0 {
        return Vec::new();
    }
    let (min_lon, min_lat, max_lon, max_lat) = extent;
    let mut lines = Vec::new();

    let mut lon = (min_lon / step).ceil() * step;
    while lon <= max_lon {
        let samples = (max_lat - min_lat).ceil() as usize;
        lines.push((0..=samples).map(|i| (lon, (min_lat + i as f64).min(max_lat))).collect());
        lon += step;
    }

    let mut lat = (min_lat / step).ceil() * step;
    while lat <= max_lat {
        let samples = (max_lon - min_lon).ceil() as usize;
        lines.push((0..=samples).map(|i| ((min_lon + i as f64).min(max_lon), lat)).collect());
        lat += step;
    }

    lines
}
