use crate::app::App;
use crate::braille::BrailleCanvas;
use crate::chart::{format_value, ChartWidget};
use crate::map::MapLayers;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
    Frame,
};

/// Legend rows: five classes plus the no-data swatch, inside a border
const LEGEND_HEIGHT: u16 = 8;

/// Screen areas, recomputed on resize so mouse hit testing matches what is drawn
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Panes {
    pub tabs: Rect,
    pub map: Rect,
    pub map_inner: Rect,
    pub chart: Rect,
    pub chart_inner: Rect,
    pub legend: Rect,
    pub status: Rect,
}

/// Split the terminal: attribute tabs on top, map left, chart and legend right, status bar
pub fn compute_panes(area: Rect) -> Panes {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Attribute tabs
            Constraint::Min(3),    // Map and chart
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(rows[1]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(LEGEND_HEIGHT)])
        .split(columns[1]);

    let inner = |r: Rect| r.inner(Margin::new(1, 1));

    Panes {
        tabs: rows[0],
        map: columns[0],
        map_inner: inner(columns[0]),
        chart: right[0],
        chart_inner: inner(right[0]),
        legend: right[1],
        status: rows[2],
    }
}

/// `(start, width)` of each tab relative to the tabs row; tabs are separated by one column
pub fn tab_layout(labels: &[String]) -> Vec<(u16, u16)> {
    let mut x = 0u16;
    labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let width = tab_text(i, label).chars().count() as u16;
            let span = (x, width);
            x = x.saturating_add(width + 1);
            span
        })
        .collect()
}

fn tab_text(index: usize, label: &str) -> String {
    format!(" {} {} ", index + 1, label)
}

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let panes = app.panes;

    render_tabs(frame, app, panes.tabs);
    render_map(frame, app, panes.map);
    render_chart(frame, app, panes.chart);
    render_legend(frame, app, panes.legend);
    render_status_bar(frame, app, panes.status);
    render_tooltip(frame, app);
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let selected = app.selection.index();
    let mut spans = Vec::new();
    for (i, label) in app.labels().iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled("│", Style::default().fg(Color::DarkGray)));
        }
        let style = if i == selected {
            Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(tab_text(i, label), style));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let title = if app.dataset.is_sample { " Regions (sample data) " } else { " Regions " };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            title,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    // Braille gives 2x4 resolution per character
    let layers = app.map_renderer.render(
        inner.width as usize,
        inner.height as usize,
        &app.viewport,
        &app.dataset.features,
        |f| app.region_color(f),
        |f| app.region_style(f),
    );

    frame.render_widget(MapWidget { layers }, inner);
}

/// Renders braille map layers with text labels overlaid
struct MapWidget {
    layers: MapLayers,
}

impl MapWidget {
    /// Render a braille canvas layer with a specific color
    fn render_layer(canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
        for (row_idx, row_str) in canvas.rows().enumerate() {
            if row_idx >= area.height as usize {
                break;
            }
            let y = area.y + row_idx as u16;

            for (col_idx, ch) in row_str.chars().enumerate() {
                if col_idx >= area.width as usize {
                    break;
                }
                // Skip empty braille characters (U+2800)
                if ch == '\u{2800}' {
                    continue;
                }
                let x = area.x + col_idx as u16;
                buf[(x, y)].set_char(ch).set_fg(color);
            }
        }
    }
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Back to front: graticule, neighbouring countries, region fills, region outlines
        Self::render_layer(&self.layers.graticule, Color::Indexed(238), area, buf);
        Self::render_layer(&self.layers.background, Color::DarkGray, area, buf);
        for (color, canvas) in &self.layers.fills {
            Self::render_layer(canvas, *color, area, buf);
        }
        for (color, canvas) in &self.layers.outlines {
            Self::render_layer(canvas, *color, area, buf);
        }

        let label_style = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);
        for (lx, ly, text) in &self.layers.labels {
            if *ly >= area.height || *lx >= area.width {
                continue;
            }
            let max_len = (area.width - *lx) as usize;
            buf.set_stringn(area.x + *lx, area.y + *ly, text, max_len, label_style);
        }
    }
}

fn render_chart(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    frame.render_widget(
        ChartWidget {
            model: &app.chart,
            highlighted: app.hovered.as_deref(),
        },
        inner,
    );
}

/// Legend row text for one class interval
fn interval_text(lower: Option<f64>, upper: Option<f64>) -> String {
    match (lower, upper) {
        (None, Some(hi)) => format!("< {}", format_value(hi)),
        (Some(lo), Some(hi)) => format!("{} to < {}", format_value(lo), format_value(hi)),
        (Some(lo), None) => format!(">= {}", format_value(lo)),
        (None, None) => "all values".to_string(),
    }
}

fn render_legend(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            format!(" {} ", app.scale.method()),
            Style::default().fg(Color::Cyan),
        ));

    let mut lines: Vec<Line> = app
        .scale
        .legend()
        .into_iter()
        .map(|(lower, upper, color)| {
            Line::from(vec![
                Span::styled("██ ", Style::default().fg(color)),
                Span::raw(interval_text(lower, upper)),
            ])
        })
        .collect();
    lines.push(Line::from(vec![
        Span::styled("██ ", Style::default().fg(app.scale.palette().fallback)),
        Span::styled("no data", Style::default().fg(Color::DarkGray)),
    ]));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_tooltip(frame: &mut Frame, app: &App) {
    let Some(tip) = app.tooltip() else {
        return;
    };
    let screen = frame.area();

    let width = tip.lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) as u16 + 2;
    let height = tip.lines.len() as u16 + 2;
    if width > screen.width || height > screen.height {
        return;
    }

    // Keep the popup on screen, flipping to the left of the cursor near the edge
    let x = if tip.col + width > screen.right() {
        tip.col.saturating_sub(width + 3)
    } else {
        tip.col
    };
    let y = tip.row.min(screen.bottom() - height);
    let area = Rect::new(x, y, width, height);

    let mut lines: Vec<Line> = Vec::new();
    for (i, text) in tip.lines.iter().enumerate() {
        let style = if i == 0 {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        lines.push(Line::from(Span::styled(text.clone(), style)));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue));
    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let report = &app.dataset.report;

    let status = Line::from(vec![
        Span::styled(" Zoom: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.expressed_label().to_string(), Style::default().fg(Color::Cyan)),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.method.to_string(), Style::default().fg(Color::Green)),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            format!(
                "{} joined, {} without data",
                report.matched,
                report.unmatched_features.len()
            ),
            Style::default().fg(Color::Magenta),
        ),
        Span::styled(
            " | 1-9/tab:attribute m:method g/b/o/L:layers hjkl:pan +/-:zoom r:reset q:quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let paragraph = Paragraph::new(status);
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panes_cover_terminal() {
        let panes = compute_panes(Rect::new(0, 0, 100, 30));
        assert_eq!(panes.tabs, Rect::new(0, 0, 100, 1));
        assert_eq!(panes.status, Rect::new(0, 29, 100, 1));
        assert_eq!(panes.map.x, 0);
        assert_eq!(panes.map.height, 28);
        assert_eq!(panes.chart.x, panes.map.right());
        assert_eq!(panes.legend.height, LEGEND_HEIGHT);
        assert_eq!(panes.chart.bottom(), panes.legend.y);
        assert_eq!(panes.map_inner, Rect::new(1, 2, panes.map.width - 2, 26));
    }

    #[test]
    fn test_tab_layout() {
        let labels = vec!["Alpha".to_string(), "B".to_string()];
        // " 1 Alpha " is 9 wide, then a separator
        assert_eq!(tab_layout(&labels), vec![(0, 9), (10, 5)]);
    }

    #[test]
    fn test_interval_text() {
        assert_eq!(interval_text(None, Some(20.0)), "< 20");
        assert_eq!(interval_text(Some(20.0), Some(100.0)), "20 to < 100");
        assert_eq!(interval_text(Some(100.0), None), ">= 100");
        assert_eq!(interval_text(None, None), "all values");
    }
}
