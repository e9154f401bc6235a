//! Static web map generator.
//!
//! Loads city and state population tables plus two GeoJSON documents, derives
//! a handful of statistics (map centre, population quartiles, choropleth
//! thresholds) and renders everything into one self-contained HTML page.

pub mod config;
pub mod diagnostics;
pub mod input;
pub mod render;
pub mod stats;
pub mod view;

pub type Result<T> = anyhow::Result<T>;
