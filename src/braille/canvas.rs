/// Dot bits indexed by `[pixel row within cell][pixel column within cell]`.
///
/// ```text
/// 0x01 0x08
/// 0x02 0x10
/// 0x04 0x20
/// 0x40 0x80
/// ```
const DOT_BITS: [[u8; 2]; 4] = [[0x01, 0x08], [0x02, 0x10], [0x04, 0x20], [0x40, 0x80]];

const BRAILLE_BLANK: u32 = 0x2800;

/// Monochrome pixel canvas drawn with Braille patterns (U+2800..U+28FF).
/// Each character cell holds a 2x4 grid of dots, so a canvas of
/// `width x height` cells has `width*2 x height*4` pixels.
#[derive(Clone)]
pub struct BrailleCanvas {
    width: usize,
    height: usize,
    /// Dot bits per cell, row-major
    cells: Vec<u8>,
}

impl BrailleCanvas {
    /// Canvas of `width x height` character cells
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![0; width * height],
        }
    }

    pub fn set_pixel(&mut self, x: usize, y: usize) {
        let (cx, cy) = (x / 2, y / 4);
        if cx >= self.width || cy >= self.height {
            return;
        }
        self.cells[cy * self.width + cx] |= DOT_BITS[y % 4][x % 2];
    }

    /// Set a pixel using signed coordinates (ignores negative values)
    pub fn set_pixel_signed(&mut self, x: i32, y: i32) {
        if x >= 0 && y >= 0 {
            self.set_pixel(x as usize, y as usize);
        }
    }

    /// Set every pixel in the horizontal span `[x0, x1]` on row `y`, clipped to the canvas
    pub fn fill_span(&mut self, y: i32, x0: i32, x1: i32) {
        let (px_width, px_height) = self.pixel_size();
        if y < 0 || y as usize >= px_height || px_width == 0 {
            return;
        }
        let x0 = x0.max(0) as usize;
        let x1 = x1.min(px_width as i32 - 1);
        if x1 < 0 || (x1 as usize) < x0 {
            return;
        }

        let y = y as usize;
        let [left, right] = DOT_BITS[y % 4];
        let row = &mut self.cells[(y / 4) * self.width..(y / 4 + 1) * self.width];
        for x in x0..=x1 as usize {
            row[x / 2] |= if x % 2 == 0 { left } else { right };
        }
    }

    /// Pixel dimensions (width, height)
    pub fn pixel_size(&self) -> (usize, usize) {
        (self.width * 2, self.height * 4)
    }

    /// True when no dot is set
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|&b| b == 0)
    }

    #[cfg(test)]
    pub fn to_string(&self) -> String {
        self.rows().collect::<Vec<_>>().join("\n")
    }

    /// Rows of Braille characters, top to bottom
    pub fn rows(&self) -> impl Iterator<Item = String> + '_ {
        self.cells.chunks(self.width.max(1)).take(self.height).map(|row| {
            row.iter()
                .map(|&b| char::from_u32(BRAILLE_BLANK + b as u32).unwrap_or(' '))
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_pixel() {
        let mut canvas = BrailleCanvas::new(1, 1);
        canvas.set_pixel(0, 0);
        assert_eq!(canvas.to_string(), "⠁");
    }

    #[test]
    fn test_all_dots() {
        let mut canvas = BrailleCanvas::new(1, 1);
        for x in 0..2 {
            for y in 0..4 {
                canvas.set_pixel(x, y);
            }
        }
        assert_eq!(canvas.to_string(), "⣿");
    }

    #[test]
    fn test_out_of_bounds_ignored() {
        let mut canvas = BrailleCanvas::new(1, 1);
        canvas.set_pixel(2, 0);
        canvas.set_pixel(0, 4);
        canvas.set_pixel_signed(-1, 0);
        assert!(canvas.is_blank());
    }

    #[test]
    fn test_fill_span_clips() {
        let mut canvas = BrailleCanvas::new(2, 1);
        canvas.fill_span(0, -5, 10);
        assert_eq!(canvas.to_string(), "⠉⠉");
        canvas.fill_span(-1, 0, 3);
        canvas.fill_span(9, 0, 3);
        canvas.fill_span(1, 6, 9);
        assert_eq!(canvas.to_string(), "⠉⠉");
    }

    #[test]
    fn test_fill_span_partial_cell() {
        let mut canvas = BrailleCanvas::new(2, 1);
        canvas.fill_span(3, 1, 2);
        // (1,3) in the first cell, (2,3) in the second
        assert_eq!(canvas.to_string(), "⢀⡀");
    }

    #[test]
    fn test_blank() {
        let mut canvas = BrailleCanvas::new(3, 2);
        assert!(canvas.is_blank());
        assert_eq!(canvas.pixel_size(), (6, 8));
        canvas.set_pixel_signed(5, 7);
        assert!(!canvas.is_blank());
        assert_eq!(canvas.rows().count(), 2);
    }

    #[test]
    fn test_diagonal() {
        let mut canvas = BrailleCanvas::new(2, 1);
        canvas.set_pixel(0, 0);
        canvas.set_pixel(1, 1);
        canvas.set_pixel(2, 2);
        canvas.set_pixel(3, 3);
        // 0x01 | 0x10, then 0x04 | 0x80
        assert_eq!(canvas.to_string(), "⠑⢄");
    }
}
