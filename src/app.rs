use std::collections::HashMap;

use ratatui::layout::Rect;

use crate::chart::{format_value, ChartModel};
use crate::classify::{ColorScale, Method};
use crate::config::{AppConfig, ProjectionConfig};
use crate::data::{record_values, Dataset, RegionFeature};
use crate::map::{MapRenderer, RegionIndex, RegionStyle, Viewport};
use crate::palette::Palette;
use crate::selection::Selection;
use crate::ui::{compute_panes, tab_layout, Panes};

/// Pointer callbacks the event loop invokes; regions are identified by code
pub trait HoverHandler {
    fn on_enter(&mut self, code: &str);
    fn on_leave(&mut self, code: &str);
    fn on_move(&mut self, col: u16, row: u16);
}

/// Style a region had before the hover highlight replaced it
#[derive(Clone, Debug, PartialEq)]
pub struct SavedStyle {
    pub code: String,
    pub style: RegionStyle,
}

/// Info label shown next to the cursor
#[derive(Clone, Debug, PartialEq)]
pub struct Tooltip {
    pub col: u16,
    pub row: u16,
    pub lines: Vec<String>,
}

/// Application state
pub struct App {
    pub dataset: Dataset,
    pub selection: Selection,
    /// Display label per attribute, aligned with `selection.attributes()`
    labels: Vec<String>,
    pub method: Method,
    palette: Palette,
    pub scale: ColorScale,
    pub chart: ChartModel,
    y_max: Option<f64>,
    pub viewport: Viewport,
    projection: ProjectionConfig,
    pub map_renderer: MapRenderer,
    index: RegionIndex,
    styles: HashMap<String, RegionStyle>,
    saved: Option<SavedStyle>,
    pub hovered: Option<String>,
    pub panes: Panes,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Current mouse position for the tooltip
    pub mouse_pos: Option<(u16, u16)>,
}

impl App {
    /// Build the app from a joined dataset. The scale and chart are computed
    /// here, so the first frame already sees complete data.
    pub fn new(
        config: &AppConfig,
        dataset: Dataset,
        palette: Palette,
        method: Method,
        initial: Option<&str>,
        width: u16,
        height: u16,
    ) -> Self {
        let columns = config.columns();
        let labels = columns.iter().map(|c| config.label_for(c).to_string()).collect();
        let selection = Selection::new(columns, initial);

        let panes = compute_panes(Rect::new(0, 0, width, height));
        let viewport = Viewport::new(
            &config.projection,
            panes.map_inner.width as usize * 2,
            panes.map_inner.height as usize * 4,
        );
        let index = RegionIndex::build(&dataset.features, 1.0);
        let map_renderer = MapRenderer::new(dataset.background.clone(), config.projection.graticule_step);

        let scale = ColorScale::build(&[], method, palette.clone());
        let chart = ChartModel::build(&[], "", "", &scale, None);

        let mut app = Self {
            dataset,
            selection,
            labels,
            method,
            palette,
            scale,
            chart,
            y_max: config.chart.y_max,
            viewport,
            projection: config.projection.clone(),
            map_renderer,
            index,
            styles: HashMap::new(),
            saved: None,
            hovered: None,
            panes,
            should_quit: false,
            last_mouse: None,
            mouse_pos: None,
        };
        app.recompute();
        app
    }

    /// Rebuild the color scale and chart for the expressed attribute
    fn recompute(&mut self) {
        let expressed = self.selection.expressed();
        let values = record_values(&self.dataset.records, expressed);
        self.scale = ColorScale::build(&values, self.method, self.palette.clone());
        self.chart = ChartModel::build(
            &self.dataset.records,
            expressed,
            self.expressed_label(),
            &self.scale,
            self.y_max,
        );
        tracing::debug!(
            attribute = expressed,
            method = %self.method,
            breakpoints = ?self.scale.breakpoints(),
            "rebuilt color scale"
        );
    }

    /// The attribute-change handler: the only path that changes the expressed attribute
    pub fn select_attribute(&mut self, index: usize) {
        if self.selection.select(index) {
            self.recompute();
        }
    }

    pub fn next_attribute(&mut self) {
        if self.selection.next() {
            self.recompute();
        }
    }

    pub fn prev_attribute(&mut self) {
        if self.selection.prev() {
            self.recompute();
        }
    }

    pub fn cycle_method(&mut self) {
        self.method = self.method.next();
        self.recompute();
    }

    pub fn expressed_label(&self) -> &str {
        self.labels
            .get(self.selection.index())
            .map_or(self.selection.expressed(), String::as_str)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Fill color of a region for the expressed attribute
    pub fn region_color(&self, feature: &RegionFeature) -> ratatui::style::Color {
        self.scale.color_opt(feature.value(self.selection.expressed()))
    }

    /// Current outline style of a region
    pub fn region_style(&self, feature: &RegionFeature) -> RegionStyle {
        self.styles.get(&feature.code).copied().unwrap_or_default()
    }

    /// Update pane layout and viewport size when the terminal resizes
    pub fn resize(&mut self, width: u16, height: u16) {
        self.panes = compute_panes(Rect::new(0, 0, width, height));
        self.viewport.width = self.panes.map_inner.width as usize * 2;
        self.viewport.height = self.panes.map_inner.height as usize * 4;
    }

    /// Back to the configured center and zoom
    pub fn reset_view(&mut self) {
        self.viewport = Viewport::new(&self.projection, self.viewport.width, self.viewport.height);
    }

    /// Pan the map
    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.viewport.pan(dx, dy);
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
    }

    /// Convert a terminal cell to braille pixels when it lies on the map
    fn map_pixel(&self, col: u16, row: u16) -> Option<(i32, i32)> {
        let inner = self.panes.map_inner;
        if !contains(inner, col, row) {
            return None;
        }
        Some((((col - inner.x) as i32) * 2, ((row - inner.y) as i32) * 4))
    }

    /// Zoom in towards a screen position (terminal column/row)
    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        if let Some((px, py)) = self.map_pixel(col, row) {
            self.viewport.zoom_in_at(px, py);
        }
    }

    /// Zoom out from a screen position (terminal column/row)
    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        if let Some((px, py)) = self.map_pixel(col, row) {
            self.viewport.zoom_out_at(px, py);
        }
    }

    /// Handle mouse drag on the map
    pub fn handle_drag(&mut self, x: u16, y: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = last_x as i32 - x as i32;
            let dy = last_y as i32 - y as i32;
            self.pan(dx * 2, dy * 4);
        }
        self.last_mouse = Some((x, y));
    }

    /// Reset drag state when mouse button released
    pub fn end_drag(&mut self) {
        self.last_mouse = None;
    }

    /// Left click: select a tab, or start a drag on the map
    pub fn click(&mut self, col: u16, row: u16) {
        if let Some(idx) = self.tab_at(col, row) {
            self.select_attribute(idx);
        } else if self.map_pixel(col, row).is_some() {
            self.last_mouse = Some((col, row));
        }
    }

    /// Attribute tab under a terminal cell
    pub fn tab_at(&self, col: u16, row: u16) -> Option<usize> {
        let tabs = self.panes.tabs;
        if !contains(tabs, col, row) {
            return None;
        }
        let rel = col - tabs.x;
        tab_layout(&self.labels)
            .iter()
            .position(|&(start, width)| rel >= start && rel < start + width)
    }

    /// Region code under a terminal cell, from the map or the chart
    pub fn hit_test(&self, col: u16, row: u16) -> Option<String> {
        if let Some((px, py)) = self.map_pixel(col, row) {
            let (lon, lat) = self.viewport.unproject(px, py);
            return self
                .index
                .region_at(&self.dataset.features, lon, lat)
                .map(|idx| self.dataset.features[idx].code.clone());
        }

        let chart = self.panes.chart_inner;
        if contains(chart, col, row) {
            return self
                .chart
                .bar_at(col - chart.x, chart.width)
                .map(|i| self.chart.bars[i].code.clone());
        }

        None
    }

    /// Route a pointer position to the hover callbacks
    pub fn pointer_moved(&mut self, col: u16, row: u16) {
        let target = self.hit_test(col, row);
        if target != self.hovered {
            if let Some(old) = self.hovered.clone() {
                self.on_leave(&old);
            }
            if let Some(new) = &target {
                self.on_enter(new);
            }
        }
        self.on_move(col, row);
    }

    /// Info label for the hovered region
    pub fn tooltip(&self) -> Option<Tooltip> {
        let code = self.hovered.as_deref()?;
        let (col, row) = self.mouse_pos?;
        let expressed = self.selection.expressed();

        let feature = self.dataset.features.iter().find(|f| f.code == code);
        let value = match feature {
            Some(f) => f.value(expressed),
            None => self
                .dataset
                .records
                .iter()
                .find(|r| r.code == code)
                .and_then(|r| r.value(expressed)),
        };
        let name = feature.map_or(code, |f| f.name.as_str());

        let first = match value {
            Some(v) => format!("{} {}", format_value(v), self.expressed_label()),
            None => format!("No data for {}", self.expressed_label()),
        };

        Some(Tooltip {
            col: col.saturating_add(2),
            row: row.saturating_add(1),
            lines: vec![first, name.to_string()],
        })
    }

    /// Request quit
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Get current zoom level as a string
    pub fn zoom_level(&self) -> String {
        format!("{:.1}x", self.viewport.zoom)
    }
}

impl HoverHandler for App {
    fn on_enter(&mut self, code: &str) {
        let current = self.styles.get(code).copied().unwrap_or_default();
        self.saved = Some(SavedStyle {
            code: code.to_string(),
            style: current,
        });
        self.styles.insert(code.to_string(), RegionStyle::highlight());
        self.hovered = Some(code.to_string());
    }

    fn on_leave(&mut self, code: &str) {
        if self.saved.as_ref().is_some_and(|s| s.code == code) {
            if let Some(saved) = self.saved.take() {
                self.styles.insert(saved.code, saved.style);
            }
        }
        if self.hovered.as_deref() == Some(code) {
            self.hovered = None;
        }
    }

    fn on_move(&mut self, col: u16, row: u16) {
        self.mouse_pos = Some((col, row));
    }
}

fn contains(rect: Rect, col: u16, row: u16) -> bool {
    col >= rect.x && col < rect.x + rect.width && row >= rect.y && row < rect.y + rect.height
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{join, RegionRecord};

    fn square(code: &str, lon: f64, lat: f64) -> RegionFeature {
        let ring = vec![(lon, lat), (lon + 1.5, lat), (lon + 1.5, lat + 1.5), (lon, lat + 1.5), (lon, lat)];
        RegionFeature::new(code, &format!("Region {code}"), vec![vec![ring]])
    }

    fn app() -> App {
        let config = AppConfig::default();
        let records = vec![
            RegionRecord::new("A", [("varA", "10"), ("varB", "5")]),
            RegionRecord::new("B", [("varA", "20"), ("varB", "50")]),
            RegionRecord::new("C", [("varA", "100"), ("varB", "7")]),
        ];
        let mut features = vec![square("A", 0.0, 46.0), square("B", 2.0, 46.0), square("C", 0.0, 44.0), square("D", 2.0, 44.0)];
        let report = join(&mut features, &records, &config.columns());
        let dataset = Dataset {
            records,
            features,
            background: Vec::new(),
            report,
            is_sample: false,
        };
        App::new(&config, dataset, Palette::default(), Method::NaturalBreaks, None, 120, 40)
    }

    #[test]
    fn test_initial_scale_is_ready() {
        let app = app();
        assert_eq!(app.selection.expressed(), "varA");
        assert_eq!(app.scale.breakpoints(), &[20.0, 100.0]);
        assert_eq!(app.chart.bars.len(), 3);
        assert_eq!(app.chart.title, "Number of Variable A in each region");
        assert_eq!(app.region_color(&app.dataset.features[3]), Palette::default().fallback);
    }

    #[test]
    fn test_attribute_change_rebuilds() {
        let mut app = app();
        app.select_attribute(1);
        assert_eq!(app.selection.expressed(), "varB");
        assert_eq!(app.scale.breakpoints(), &[7.0, 50.0]);
        assert_eq!(app.chart.bars[0].code, "A");
        assert_eq!(app.expressed_label(), "Variable B");
    }

    #[test]
    fn test_reselect_is_identical() {
        let mut app = app();
        let before = app.scale.clone();
        app.select_attribute(0);
        assert_eq!(app.scale, before);
        app.select_attribute(2);
        app.select_attribute(0);
        assert_eq!(app.scale.breakpoints(), before.breakpoints());
        for f in &app.dataset.features {
            assert_eq!(app.region_color(f), before.color_opt(f.value("varA")));
        }
    }

    #[test]
    fn test_method_cycle_recomputes() {
        let mut app = app();
        app.cycle_method();
        assert_eq!(app.method, Method::Quantile);
        assert_eq!(app.scale.method(), Method::Quantile);
        assert_eq!(app.scale.breakpoints().len(), 4);
    }

    #[test]
    fn test_hover_saves_and_restores_style() {
        let mut app = app();
        let feature_a = app.dataset.features[0].clone();
        assert_eq!(app.region_style(&feature_a), RegionStyle::default());

        app.on_enter("A");
        assert_eq!(app.region_style(&feature_a), RegionStyle::highlight());
        assert_eq!(app.hovered.as_deref(), Some("A"));

        app.on_leave("A");
        assert_eq!(app.region_style(&feature_a), RegionStyle::default());
        assert_eq!(app.hovered, None);
    }

    #[test]
    fn test_pointer_over_map_and_chart() {
        let mut app = app();
        let inner = app.panes.map_inner;

        // Find a cell over region B by projecting its center
        let (px, py) = app.viewport.project(2.75, 46.75);
        let col = inner.x + (px / 2) as u16;
        let row = inner.y + (py / 4) as u16;
        app.pointer_moved(col, row);
        assert_eq!(app.hovered.as_deref(), Some("B"));

        let tip = app.tooltip().unwrap();
        assert_eq!(tip.lines, vec!["20 Variable A".to_string(), "Region B".to_string()]);

        // First bar in the chart is the smallest value, region A
        let chart = app.panes.chart_inner;
        app.pointer_moved(chart.x, chart.bottom() - 1);
        assert_eq!(app.hovered.as_deref(), Some("A"));
        assert_eq!(app.region_style(&app.dataset.features[1]), RegionStyle::default());

        // Unmatched region D still hovers, with a no-data tooltip
        let (px, py) = app.viewport.project(2.75, 44.75);
        app.pointer_moved(inner.x + (px / 2) as u16, inner.y + (py / 4) as u16);
        assert_eq!(app.hovered.as_deref(), Some("D"));
        assert_eq!(app.tooltip().unwrap().lines[0], "No data for Variable A");
    }

    #[test]
    fn test_tab_click_selects_attribute() {
        let mut app = app();
        let (start, _) = tab_layout(app.labels())[2];
        app.click(app.panes.tabs.x + start, app.panes.tabs.y);
        assert_eq!(app.selection.expressed(), "varC");
    }
}
