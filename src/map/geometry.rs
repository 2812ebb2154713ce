use glam::DVec2;

use crate::braille::BrailleCanvas;
use crate::data::Polygon;

/// Draw a line using Bresenham's algorithm
pub fn draw_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut x = x0;
    let mut y = y0;

    loop {
        canvas.set_pixel_signed(x, y);

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;

        if e2 >= dy {
            if x == x1 {
                break;
            }
            err += dy;
            x += sx;
        }

        if e2 <= dx {
            if y == y1 {
                break;
            }
            err += dx;
            y += sy;
        }
    }
}

/// Draw a thicker line (hover highlight)
pub fn draw_thick_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    draw_line(canvas, x0, y0, x1, y1);
    draw_line(canvas, x0 + 1, y0, x1 + 1, y1);
    draw_line(canvas, x0, y0 + 1, x1, y1 + 1);
}

/// Fill projected rings with the even-odd rule, sampling each pixel row at its center.
/// Holes are simply further rings.
pub fn fill_rings(canvas: &mut BrailleCanvas, rings: &[Vec<DVec2>]) {
    let (_, height) = canvas.pixel_size();

    let (min_y, max_y) = rings
        .iter()
        .flatten()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p.y), hi.max(p.y)));
    if !min_y.is_finite() {
        return;
    }

    let first_row = min_y.floor().max(0.0) as i32;
    let last_row = max_y.ceil().min(height as f64 - 1.0) as i32;
    let mut crossings: Vec<f64> = Vec::new();

    for row in first_row..=last_row {
        let y = row as f64 + 0.5;
        crossings.clear();

        for ring in rings {
            for (a, b) in ring.iter().zip(ring.iter().cycle().skip(1)) {
                // Half-open in y so shared vertices are counted once
                if (a.y <= y) != (b.y <= y) {
                    let t = (y - a.y) / (b.y - a.y);
                    crossings.push(a.x + t * (b.x - a.x));
                }
            }
        }

        crossings.sort_by(|a, b| a.total_cmp(b));
        for pair in crossings.chunks_exact(2) {
            let x0 = (pair[0] - 0.5).ceil() as i32;
            let x1 = (pair[1] - 0.5).floor() as i32;
            if x1 >= x0 {
                canvas.fill_span(row, x0, x1);
            }
        }
    }
}

/// Even-odd point in ring test
fn ring_contains(ring: &[(f64, f64)], lon: f64, lat: f64) -> bool {
    let mut inside = false;
    let mut j = ring.len().wrapping_sub(1);
    for i in 0..ring.len() {
        let (xi, yi) = ring[i];
        let (xj, yj) = ring[j];
        if (yi > lat) != (yj > lat) && lon < (xj - xi) * (lat - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Point in polygon, holes excluded
pub fn polygon_contains(polygon: &Polygon, lon: f64, lat: f64) -> bool {
    let mut rings = polygon.iter();
    match rings.next() {
        Some(exterior) if ring_contains(exterior, lon, lat) => !rings.any(|hole| ring_contains(hole, lon, lat)),
        _ => false,
    }
}
