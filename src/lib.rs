//! Terminal choropleth of regional data with a coordinated bar chart.
//!
//! Region polygons are joined to a table of attributes by administrative code,
//! classified into color classes, and drawn as Braille fills next to a bar
//! chart of the same values.

pub mod app;
pub mod braille;
pub mod chart;
pub mod classify;
pub mod config;
pub mod data;
pub mod hash;
pub mod map;
pub mod palette;
pub mod selection;
pub mod ui;
