use ratatui::style::Color;
use thiserror::Error;

/// Default class colors, lightest to darkest
pub const DEFAULT_CLASS_COLORS: [&str; 5] = ["#D4B9DA", "#C994C7", "#DF65B0", "#DD1C77", "#980043"];

/// Neutral color for regions without a usable value
pub const DEFAULT_FALLBACK: &str = "#CCC";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaletteError {
    #[error("color {0:?} must start with '#'")]
    MissingHash(String),
    #[error("color {0:?} must have 3 or 6 hex digits")]
    BadLength(String),
    #[error("color {0:?} contains a non-hex digit")]
    BadDigit(String),
    #[error("palette needs at least one class color")]
    Empty,
}

/// Ordered class colors plus the fallback used for missing values
#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
    pub classes: Vec<Color>,
    pub fallback: Color,
}

impl Palette {
    /// Build a palette from hex strings (`#RGB` or `#RRGGBB`)
    pub fn from_hex<S: AsRef<str>>(classes: &[S], fallback: &str) -> Result<Self, PaletteError> {
        if classes.is_empty() {
            return Err(PaletteError::Empty);
        }
        let classes = classes
            .iter()
            .map(|c| parse_hex(c.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            classes,
            fallback: parse_hex(fallback)?,
        })
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            classes: vec![
                Color::Rgb(0xD4, 0xB9, 0xDA),
                Color::Rgb(0xC9, 0x94, 0xC7),
                Color::Rgb(0xDF, 0x65, 0xB0),
                Color::Rgb(0xDD, 0x1C, 0x77),
                Color::Rgb(0x98, 0x00, 0x43),
            ],
            fallback: Color::Rgb(0xCC, 0xCC, 0xCC),
        }
    }
}

/// Parse a CSS style hex color. Short form digits are doubled (`#CCC` = `#CCCCCC`).
pub fn parse_hex(text: &str) -> Result<Color, PaletteError> {
    let digits = text
        .strip_prefix('#')
        .ok_or_else(|| PaletteError::MissingHash(text.to_string()))?;

    let nibble = |c: char| c.to_digit(16).map(|d| d as u8);
    let values: Option<Vec<u8>> = digits.chars().map(nibble).collect();
    let values = values.ok_or_else(|| PaletteError::BadDigit(text.to_string()))?;

    match values.as_slice() {
        [r, g, b] => Ok(Color::Rgb(r * 17, g * 17, b * 17)),
        [r1, r0, g1, g0, b1, b0] => Ok(Color::Rgb(r1 * 16 + r0, g1 * 16 + g0, b1 * 16 + b0)),
        _ => Err(PaletteError::BadLength(text.to_string())),
    }
}

/// Format a color back to `#RRGGBB` (used by the summary output)
pub fn to_hex(color: Color) -> String {
    match color {
        Color::Rgb(r, g, b) => format!("#{:02X}{:02X}{:02X}", r, g, b),
        other => format!("{}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_hex_expands() {
        assert_eq!(parse_hex("#CCC"), Ok(Color::Rgb(0xCC, 0xCC, 0xCC)));
    }

    #[test]
    fn test_long_hex() {
        assert_eq!(parse_hex("#980043"), Ok(Color::Rgb(0x98, 0x00, 0x43)));
        assert_eq!(parse_hex("#d4b9da"), Ok(Color::Rgb(0xD4, 0xB9, 0xDA)));
    }

    #[test]
    fn test_bad_hex() {
        assert!(matches!(parse_hex("CCC"), Err(PaletteError::MissingHash(_))));
        assert!(matches!(parse_hex("#CCCC"), Err(PaletteError::BadLength(_))));
        assert!(matches!(parse_hex("#GGGGGG"), Err(PaletteError::BadDigit(_))));
    }

    #[test]
    fn test_default_matches_hex_constants() {
        let parsed = Palette::from_hex(&DEFAULT_CLASS_COLORS, DEFAULT_FALLBACK).unwrap();
        assert_eq!(parsed, Palette::default());
        assert_eq!(to_hex(parsed.fallback), "#CCCCCC");
    }
}
