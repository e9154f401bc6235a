//! Map model: combine the input tables and geometry into what the page draws.

mod palette;

pub use palette::{ThresholdScale, color_brewer, palette_names};

use crate::Result;
use crate::config::{ChoroplethConfig, MapConfig, TileLayer};
use crate::diagnostics;
use crate::input::{CityRow, GeoDocument, Inputs, StateRow};
use crate::stats::{self, QuartileCuts, Tier};

use anyhow::anyhow;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize)]
pub struct TileView {
    pub name: String,
    pub url: String,
    pub attribution: String,
    pub max_zoom: u8,
    /// Shown when the page opens.
    pub active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MarkerView {
    pub lat: f64,
    pub lon: f64,
    pub popup: String,
    pub tooltip: String,
    pub color: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MarkerGroupView {
    pub name: String,
    pub markers: Vec<MarkerView>,
}

/// Leaflet path style for a plain GeoJSON overlay.
#[derive(Debug, Clone, Serialize)]
pub struct OverlayStyle {
    pub color: String,
    pub weight: f64,
    pub opacity: f64,
    pub fill_color: String,
    pub fill_opacity: f64,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            color: "#3388ff".to_string(),
            weight: 3.0,
            opacity: 1.0,
            fill_color: "#3388ff".to_string(),
            fill_opacity: 0.2,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GeoOverlayView {
    pub name: String,
    pub style: OverlayStyle,
    pub geojson: GeoDocument,
}

/// Per-feature choropleth result, index-aligned with the GeoJSON features.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionView {
    pub key: Option<String>,
    pub value: Option<u64>,
    pub fill: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LegendView {
    pub caption: String,
    pub thresholds: Vec<f64>,
    pub colors: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChoroplethView {
    pub name: String,
    pub fill_opacity: f64,
    pub line_opacity: f64,
    pub nan_fill_opacity: f64,
    pub regions: Vec<RegionView>,
    pub legend: LegendView,
    pub geojson: GeoDocument,
}

#[derive(Debug, Clone, Serialize)]
pub struct ControlsView {
    pub layer_control: bool,
    pub lat_lng_popup: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MapData {
    pub center: [f64; 2],
    pub zoom_start: u8,
    pub tiles: Vec<TileView>,
    pub cities: MarkerGroupView,
    pub oceans: GeoOverlayView,
    pub choropleth: ChoroplethView,
    pub controls: ControlsView,
}

/// Numbers the map is derived from; also printed by `stats`.
#[derive(Debug, Clone)]
pub struct MapStats {
    pub center: [f64; 2],
    pub cuts: QuartileCuts,
    pub tier_counts: Vec<(Tier, usize)>,
    pub thresholds: Vec<f64>,
}

/// Join outcome worth reporting; neither case is fatal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JoinReport {
    /// Feature indices whose key is missing or has no row.
    pub unmatched_features: Vec<usize>,
    /// State names no feature refers to.
    pub unmatched_rows: Vec<String>,
}

pub fn compute_stats(
    cities: &[CityRow],
    states: &[StateRow],
    choropleth: &ChoroplethConfig,
) -> Result<MapStats> {
    let no_cities = || anyhow!(diagnostics::error_message("no cities to summarize"));

    let lats: Vec<f64> = cities.iter().map(|c| c.lat).collect();
    let lons: Vec<f64> = cities.iter().map(|c| c.lon).collect();
    let center = [
        stats::mean(&lats).ok_or_else(no_cities)?,
        stats::mean(&lons).ok_or_else(no_cities)?,
    ];

    let populations: Vec<u64> = cities.iter().map(|c| c.population).collect();
    let cuts = QuartileCuts::from_populations(&populations).ok_or_else(no_cities)?;

    let mut counts: BTreeMap<Tier, usize> = Tier::ALL.iter().map(|t| (*t, 0)).collect();
    for p in &populations {
        *counts.entry(cuts.classify(*p)).or_default() += 1;
    }

    let thresholds = match &choropleth.thresholds {
        Some(t) => t.clone(),
        None => {
            let pops: Vec<f64> = states.iter().map(|s| s.pop as f64).collect();
            stats::split_six(&pops)
        }
    };

    Ok(MapStats {
        center,
        cuts,
        tier_counts: counts.into_iter().collect(),
        thresholds,
    })
}

pub fn build_markers(cities: &[CityRow], cuts: &QuartileCuts) -> Vec<MarkerView> {
    cities
        .iter()
        .map(|c| {
            MarkerView {
                lat: c.lat,
                lon: c.lon,
                popup: format!(
                    "#{}, {}, Population: {}",
                    c.rank,
                    c.place,
                    stats::format_thousands(c.population)
                ),
                tooltip: c.place.clone(),
                color: cuts.classify(c.population).hex().to_string(),
            }
        })
        .collect()
}

/// Colour each feature by the state row its key points at.
pub fn join_regions(
    geo: &GeoDocument,
    states: &[StateRow],
    key_on: &str,
    scale: &ThresholdScale,
    nan_fill_color: &str,
) -> Result<(Vec<RegionView>, JoinReport)> {
    let by_name: BTreeMap<&str, u64> = states.iter().map(|s| (s.name.as_str(), s.pop)).collect();
    let keys = geo.feature_keys(key_on)?;

    let mut report = JoinReport::default();
    let mut used: BTreeMap<&str, bool> = by_name.keys().map(|k| (*k, false)).collect();
    let mut regions = Vec::with_capacity(keys.len());

    for (idx, key) in keys.into_iter().enumerate() {
        let value = key.as_deref().and_then(|k| by_name.get(k).copied());
        if let Some(k) = key.as_deref() {
            if let Some(flag) = used.get_mut(k) {
                *flag = true;
            }
        }

        let fill = match value {
            Some(v) => scale.color_for(v as f64).to_string(),
            None => {
                report.unmatched_features.push(idx);
                nan_fill_color.to_string()
            }
        };
        regions.push(RegionView { key, value, fill });
    }

    report.unmatched_rows = states
        .iter()
        .filter(|s| !used.get(s.name.as_str()).copied().unwrap_or(false))
        .map(|s| s.name.clone())
        .collect();

    Ok((regions, report))
}

fn tile_view(layer: &TileLayer, active: bool) -> TileView {
    TileView {
        name: layer.name.clone(),
        url: layer.url.clone(),
        attribution: layer.attribution.clone(),
        max_zoom: layer.max_zoom,
        active,
    }
}

/// Build the full page model. Join mismatches are warned about, not fatal.
pub fn build_map_data(inputs: &Inputs, config: &MapConfig) -> Result<MapData> {
    let ch = &config.choropleth;
    let summary = compute_stats(&inputs.cities, &inputs.states, ch)?;
    tracing::debug!(
        lat = summary.center[0],
        lon = summary.center[1],
        cuts = ?summary.cuts,
        thresholds = ?summary.thresholds,
        "computed map statistics"
    );

    let scale = ThresholdScale::new(summary.thresholds.clone(), &ch.palette)?;
    let (regions, report) = join_regions(
        &inputs.states_geo,
        &inputs.states,
        &ch.key_on,
        &scale,
        &ch.nan_fill_color,
    )?;

    for idx in &report.unmatched_features {
        let key = regions[*idx].key.as_deref().unwrap_or("<none>");
        diagnostics::warn(format!(
            "feature #{} ({}) at {} has no population row",
            idx, key, ch.key_on
        ));
    }
    for name in &report.unmatched_rows {
        diagnostics::warn(format!("state row {:?} matches no feature", name));
    }

    let tiles = std::iter::once(tile_view(&config.base_tiles, true))
        .chain(config.tile_layers.iter().map(|l| tile_view(l, false)))
        .collect();

    Ok(MapData {
        center: summary.center,
        zoom_start: config.zoom_start,
        tiles,
        cities: MarkerGroupView {
            name: config.cities_layer_name.clone(),
            markers: build_markers(&inputs.cities, &summary.cuts),
        },
        oceans: GeoOverlayView {
            name: config.oceans_layer_name.clone(),
            style: OverlayStyle::default(),
            geojson: inputs.oceans.clone(),
        },
        choropleth: ChoroplethView {
            name: ch.name.clone(),
            fill_opacity: ch.fill_opacity,
            line_opacity: ch.line_opacity,
            nan_fill_opacity: ch.nan_fill_opacity,
            regions,
            legend: LegendView {
                caption: ch.legend_name.clone(),
                thresholds: scale.thresholds,
                colors: scale.colors,
            },
            geojson: inputs.states_geo.clone(),
        },
        controls: ControlsView {
            layer_control: true,
            lat_lng_popup: config.lat_lng_popup,
        },
    })
}
