mod geometry;
mod projection;
mod renderer;
mod spatial;

pub use geometry::{fill_rings, polygon_contains};
pub use projection::{Albers, Viewport};
pub use renderer::{graticule_lines, ColorLayers, DisplaySettings, MapLayers, MapRenderer, RegionStyle};
pub use spatial::RegionIndex;
