use std::cmp::Ordering;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::Widget,
};

use crate::classify::ColorScale;
use crate::data::RegionRecord;

/// Partial block glyphs, index = eighths filled
const EIGHTHS: [char; 9] = [' ', '▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Background of the bar column under the cursor
const HOVER_BAND: Color = Color::Indexed(236);

/// One bar per region record
#[derive(Clone, Debug, PartialEq)]
pub struct Bar {
    pub code: String,
    pub value: Option<f64>,
    pub color: Color,
}

/// Bars sorted by the expressed attribute plus their vertical scale
#[derive(Clone, Debug)]
pub struct ChartModel {
    pub bars: Vec<Bar>,
    pub y_max: f64,
    pub title: String,
}

impl ChartModel {
    /// Bars ascending by value, non-numeric values last, ties in record order
    pub fn build(records: &[RegionRecord], attribute: &str, label: &str, scale: &ColorScale, y_max: Option<f64>) -> Self {
        let mut bars: Vec<Bar> = records
            .iter()
            .map(|r| {
                let value = r.value(attribute);
                Bar {
                    code: r.code.clone(),
                    value,
                    color: scale.color_opt(value),
                }
            })
            .collect();

        bars.sort_by(|a, b| match (a.value, b.value) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });

        let y_max = y_max.filter(|m| *m > 0.0).unwrap_or_else(|| {
            let max = bars.iter().filter_map(|b| b.value).fold(0.0, f64::max);
            if max > 0.0 {
                max * 1.05
            } else {
                1.0
            }
        });

        Self {
            bars,
            y_max,
            title: format!("Number of {} in each region", label),
        }
    }

    /// Column span `(x, width)` of bar `i` inside `width` cells
    pub fn bar_span(&self, i: usize, width: u16) -> (u16, u16) {
        let slot = width as f64 / self.bars.len().max(1) as f64;
        let x = (i as f64 * slot).floor() as u16;
        let w = if slot >= 2.0 { slot.floor() as u16 - 1 } else { 1 };
        (x, w.max(1))
    }

    /// Bar under column `col` (relative to the chart area)
    pub fn bar_at(&self, col: u16, width: u16) -> Option<usize> {
        (0..self.bars.len()).find(|&i| {
            let (x, w) = self.bar_span(i, width);
            col >= x && col < x + w
        })
    }

    /// Bar height in eighths of a row for `rows` available rows
    pub fn bar_eighths(&self, value: Option<f64>, rows: u16) -> u32 {
        let Some(v) = value else { return 0 };
        let fraction = (v / self.y_max).clamp(0.0, 1.0);
        (fraction * rows as f64 * 8.0).round() as u32
    }
}

/// Renders the chart model; bars of `highlighted` get a hover band
pub struct ChartWidget<'a> {
    pub model: &'a ChartModel,
    pub highlighted: Option<&'a str>,
}

impl Widget for ChartWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height < 3 || area.width == 0 {
            return;
        }

        let title_style = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);
        buf.set_stringn(area.x + 1, area.y, &self.model.title, area.width.saturating_sub(1) as usize, title_style);

        // Title row plus one row kept free for the tallest label
        let plot_top = area.y + 2;
        let rows = area.bottom().saturating_sub(plot_top);
        let bottom = area.bottom() - 1;

        for (i, bar) in self.model.bars.iter().enumerate() {
            let (x, w) = self.model.bar_span(i, area.width);
            let x = area.x + x;
            let hovered = self.highlighted == Some(bar.code.as_str());

            if hovered {
                for y in plot_top..area.bottom() {
                    for dx in 0..w {
                        buf[(x + dx, y)].set_bg(HOVER_BAND);
                    }
                }
            }

            let eighths = self.model.bar_eighths(bar.value, rows);
            let full = (eighths / 8) as u16;
            let partial = (eighths % 8) as usize;

            for dy in 0..full {
                for dx in 0..w {
                    buf[(x + dx, bottom - dy)].set_char('█').set_fg(bar.color);
                }
            }
            if partial > 0 && full < rows {
                for dx in 0..w {
                    buf[(x + dx, bottom - full)].set_char(EIGHTHS[partial]).set_fg(bar.color);
                }
            }

            // Value label just above the bar when it fits
            let text = match bar.value {
                Some(v) => format_value(v),
                None => "n/a".to_string(),
            };
            let top_row = bottom.saturating_sub(full + u16::from(partial > 0));
            if text.chars().count() as u16 <= w && top_row >= plot_top.saturating_sub(1) {
                let label_x = x + (w - text.chars().count() as u16) / 2;
                let mut style = Style::default().fg(Color::Gray);
                if hovered {
                    style = style.add_modifier(Modifier::BOLD).fg(Color::White);
                }
                buf.set_string(label_x, top_row, &text, style);
            }
        }
    }
}

/// Short numeric label: integers without decimals, otherwise one decimal
pub fn format_value(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e9 {
        format!("{}", v as i64)
    } else {
        format!("{:.1}", v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Method;
    use crate::palette::Palette;

    fn records() -> Vec<RegionRecord> {
        vec![
            RegionRecord::new("C", [("v", "100")]),
            RegionRecord::new("X", [("v", "bad")]),
            RegionRecord::new("A", [("v", "10")]),
            RegionRecord::new("B", [("v", "20")]),
        ]
    }

    fn model(y_max: Option<f64>) -> ChartModel {
        let recs = records();
        let values: Vec<f64> = recs.iter().filter_map(|r| r.value("v")).collect();
        let scale = ColorScale::build(&values, Method::NaturalBreaks, Palette::default());
        ChartModel::build(&recs, "v", "Variable V", &scale, y_max)
    }

    #[test]
    fn test_sorted_ascending_missing_last() {
        let m = model(None);
        let codes: Vec<&str> = m.bars.iter().map(|b| b.code.as_str()).collect();
        assert_eq!(codes, vec!["A", "B", "C", "X"]);
        assert_eq!(m.bars[3].color, Palette::default().fallback);
        assert_eq!(m.title, "Number of Variable V in each region");
    }

    #[test]
    fn test_y_max() {
        assert!((model(None).y_max - 105.0).abs() < 1e-9);
        assert_eq!(model(Some(200.0)).y_max, 200.0);
    }

    #[test]
    fn test_bar_heights() {
        let m = model(Some(100.0));
        assert_eq!(m.bar_eighths(Some(100.0), 10), 80);
        assert_eq!(m.bar_eighths(Some(50.0), 10), 40);
        assert_eq!(m.bar_eighths(Some(500.0), 10), 80);
        assert_eq!(m.bar_eighths(Some(-5.0), 10), 0);
        assert_eq!(m.bar_eighths(None, 10), 0);
    }

    #[test]
    fn test_bar_hit_test() {
        let m = model(None);
        // 4 bars in 40 columns: 10 wide slots, 9 wide bars
        assert_eq!(m.bar_span(1, 40), (10, 9));
        assert_eq!(m.bar_at(0, 40), Some(0));
        assert_eq!(m.bar_at(9, 40), None);
        assert_eq!(m.bar_at(15, 40), Some(1));
        assert_eq!(m.bar_at(39, 40), None);
    }

    #[test]
    fn test_render_draws_bars_and_title() {
        let m = model(Some(100.0));
        let area = Rect::new(0, 0, 40, 12);
        let mut buf = Buffer::empty(area);
        ChartWidget { model: &m, highlighted: Some("C") }.render(area, &mut buf);

        assert_eq!(buf[(1, 0)].symbol(), "N");
        // Tallest bar "C" is third: fills its slot up to the top plot row
        assert_eq!(buf[(20, 11)].symbol(), "█");
        assert_eq!(buf[(20, 2)].symbol(), "█");
        assert_eq!(buf[(20, 2)].bg, HOVER_BAND);
        // Missing value draws nothing but its label
        assert_eq!(buf[(30, 11)].symbol(), " ");
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(42.0), "42");
        assert_eq!(format_value(4.26), "4.3");
    }
}
