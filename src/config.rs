//! Map configuration: built-in defaults, optionally overridden by a YAML file.
//!
//! Every field of [`ConfigFile`] is optional; whatever is present replaces the
//! matching default in [`MapConfig`]. [`MapConfig::resolve`] puts CLI flags
//! on top of the merged result.

use crate::Result;
use crate::diagnostics;

use anyhow::{Context, bail};
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_OUTPUT: &str = "Webmap.html";

/// Raw YAML config as written by the user.
#[derive(Debug, Default, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub data_dir: Option<String>,
    pub output: Option<String>,
    pub cities_file: Option<String>,
    pub states_file: Option<String>,
    pub states_geo_file: Option<String>,
    pub oceans_file: Option<String>,
    pub zoom_start: Option<u8>,
    pub base_tiles: Option<TileLayer>,
    pub tile_layers: Option<Vec<TileLayer>>,
    pub cities_layer_name: Option<String>,
    pub oceans_layer_name: Option<String>,
    pub choropleth_layer_name: Option<String>,
    pub key_on: Option<String>,
    #[serde(alias = "fill_color")]
    pub palette: Option<String>,
    pub fill_opacity: Option<f64>,
    pub line_opacity: Option<f64>,
    pub nan_fill_color: Option<String>,
    pub nan_fill_opacity: Option<f64>,
    pub legend_name: Option<String>,
    pub thresholds: Option<Vec<f64>>,
    pub lat_lng_popup: Option<bool>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).with_context(|| {
            diagnostics::error_message(format!("read config file {}", path.display()))
        })?;
        Self::parse(&text, &path.display().to_string())
    }

    pub fn parse(text: &str, source: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
            .with_context(|| diagnostics::error_message(format!("parse config file {}", source)))
    }
}

/// One selectable tile layer (Leaflet `L.tileLayer`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TileLayer {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub attribution: String,
    #[serde(default = "default_max_zoom")]
    pub max_zoom: u8,
}

fn default_max_zoom() -> u8 {
    18
}

impl TileLayer {
    fn new(name: &str, url: &str, attribution: &str, max_zoom: u8) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            attribution: attribution.to_string(),
            max_zoom,
        }
    }
}

/// File names of the four inputs, relative to the data directory.
#[derive(Debug, Clone, PartialEq)]
pub struct InputNames {
    pub cities: String,
    pub states: String,
    pub states_geo: String,
    pub oceans: String,
}

impl Default for InputNames {
    fn default() -> Self {
        Self {
            cities: "us-cities.csv".to_string(),
            states: "us-state-populations.csv".to_string(),
            states_geo: "us-states.json".to_string(),
            oceans: "oceans.json".to_string(),
        }
    }
}

/// Absolute-or-relative paths of the four inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct InputFiles {
    pub cities: PathBuf,
    pub states: PathBuf,
    pub states_geo: PathBuf,
    pub oceans: PathBuf,
}

impl InputNames {
    pub fn resolve(&self, data_dir: &Path) -> InputFiles {
        InputFiles {
            cities: data_dir.join(&self.cities),
            states: data_dir.join(&self.states),
            states_geo: data_dir.join(&self.states_geo),
            oceans: data_dir.join(&self.oceans),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChoroplethConfig {
    pub name: String,
    /// Dotted path into each feature, e.g. `feature.properties.name`.
    pub key_on: String,
    pub palette: String,
    pub fill_opacity: f64,
    pub line_opacity: f64,
    pub nan_fill_color: String,
    pub nan_fill_opacity: f64,
    pub legend_name: String,
    /// Explicit cut points; derived from the state populations when unset.
    pub thresholds: Option<Vec<f64>>,
}

impl Default for ChoroplethConfig {
    fn default() -> Self {
        Self {
            name: "State Population Choropleth".to_string(),
            key_on: "feature.properties.name".to_string(),
            palette: "YlGn".to_string(),
            fill_opacity: 0.7,
            line_opacity: 0.2,
            nan_fill_color: "#000000".to_string(),
            nan_fill_opacity: 0.4,
            legend_name: "US Population Per State (Census 2017)".to_string(),
            thresholds: None,
        }
    }
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct MapConfig {
    pub data_dir: PathBuf,
    pub output: PathBuf,
    pub inputs: InputNames,
    pub zoom_start: u8,
    pub base_tiles: TileLayer,
    pub tile_layers: Vec<TileLayer>,
    pub cities_layer_name: String,
    pub oceans_layer_name: String,
    pub choropleth: ChoroplethConfig,
    pub lat_lng_popup: bool,
}

impl Default for MapConfig {
    fn default() -> Self {
        let carto = "&copy; OpenStreetMap contributors &copy; CARTO";
        let stamen = "&copy; Stadia Maps &copy; Stamen Design &copy; OpenStreetMap contributors";
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            output: PathBuf::from(DEFAULT_OUTPUT),
            inputs: InputNames::default(),
            zoom_start: 5,
            base_tiles: TileLayer::new(
                "CartoDB dark_matter",
                "https://{s}.basemaps.cartocdn.com/dark_all/{z}/{x}/{y}.png",
                carto,
                18,
            ),
            tile_layers: vec![
                TileLayer::new(
                    "OpenStreetMap",
                    "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png",
                    "&copy; OpenStreetMap contributors",
                    19,
                ),
                TileLayer::new(
                    "CartoDB positron",
                    "https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}.png",
                    carto,
                    18,
                ),
                TileLayer::new(
                    "Stamen Toner",
                    "https://tiles.stadiamaps.com/tiles/stamen_toner/{z}/{x}/{y}.png",
                    stamen,
                    18,
                ),
                TileLayer::new(
                    "Stamen Watercolor",
                    "https://tiles.stadiamaps.com/tiles/stamen_watercolor/{z}/{x}/{y}.jpg",
                    stamen,
                    16,
                ),
            ],
            cities_layer_name: "50 Most Populous US Cities".to_string(),
            oceans_layer_name: "Oceans".to_string(),
            choropleth: ChoroplethConfig::default(),
            lat_lng_popup: true,
        }
    }
}

const HEX_COLOR_RE: &str = r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$";

impl MapConfig {
    /// Merge a config file onto the defaults and validate the result.
    pub fn from_file(file: ConfigFile) -> Result<Self> {
        let mut cfg = Self::default();
        cfg.apply(file);
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn apply(&mut self, file: ConfigFile) {
        if let Some(v) = file.data_dir {
            self.data_dir = PathBuf::from(v);
        }
        if let Some(v) = file.output {
            self.output = PathBuf::from(v);
        }
        if let Some(v) = file.cities_file {
            self.inputs.cities = v;
        }
        if let Some(v) = file.states_file {
            self.inputs.states = v;
        }
        if let Some(v) = file.states_geo_file {
            self.inputs.states_geo = v;
        }
        if let Some(v) = file.oceans_file {
            self.inputs.oceans = v;
        }
        if let Some(v) = file.zoom_start {
            self.zoom_start = v;
        }
        if let Some(v) = file.base_tiles {
            self.base_tiles = v;
        }
        if let Some(v) = file.tile_layers {
            self.tile_layers = v;
        }
        if let Some(v) = file.cities_layer_name {
            self.cities_layer_name = v;
        }
        if let Some(v) = file.oceans_layer_name {
            self.oceans_layer_name = v;
        }
        if let Some(v) = file.lat_lng_popup {
            self.lat_lng_popup = v;
        }

        let ch = &mut self.choropleth;
        if let Some(v) = file.choropleth_layer_name {
            ch.name = v;
        }
        if let Some(v) = file.key_on {
            ch.key_on = v;
        }
        if let Some(v) = file.palette {
            ch.palette = v;
        }
        if let Some(v) = file.fill_opacity {
            ch.fill_opacity = v;
        }
        if let Some(v) = file.line_opacity {
            ch.line_opacity = v;
        }
        if let Some(v) = file.nan_fill_color {
            ch.nan_fill_color = v;
        }
        if let Some(v) = file.nan_fill_opacity {
            ch.nan_fill_opacity = v;
        }
        if let Some(v) = file.legend_name {
            ch.legend_name = v;
        }
        if file.thresholds.is_some() {
            ch.thresholds = file.thresholds;
        }
    }

    /// Defaults, then the config file at `path` (if any), then CLI flags.
    pub fn resolve(
        path: Option<&Path>,
        data_dir: Option<PathBuf>,
        output: Option<PathBuf>,
    ) -> Result<Self> {
        let file = match path {
            Some(p) => ConfigFile::load(p)?,
            None => ConfigFile::default(),
        };
        let mut cfg = Self::from_file(file)?;
        if let Some(dir) = data_dir {
            cfg.data_dir = dir;
        }
        if let Some(out) = output {
            cfg.output = out;
        }
        Ok(cfg)
    }

    pub fn input_files(&self) -> InputFiles {
        self.inputs.resolve(&self.data_dir)
    }

    pub fn validate(&self) -> Result<()> {
        if self.zoom_start > 20 {
            bail!(
                "{}",
                diagnostics::error_message(format!(
                    "zoom_start must be at most 20, got {}",
                    self.zoom_start
                ))
            );
        }

        let ch = &self.choropleth;
        for (field, value) in [
            ("fill_opacity", ch.fill_opacity),
            ("line_opacity", ch.line_opacity),
            ("nan_fill_opacity", ch.nan_fill_opacity),
        ] {
            if !(0.0..=1.0).contains(&value) {
                bail!(
                    "{}",
                    diagnostics::error_message(format!(
                        "{} must be within [0, 1], got {}",
                        field, value
                    ))
                );
            }
        }

        let re = Regex::new(HEX_COLOR_RE)?;
        if !re.is_match(&ch.nan_fill_color) {
            bail!(
                "{}",
                diagnostics::error_message(format!(
                    "nan_fill_color must be a hex color like #000000, got {:?}",
                    ch.nan_fill_color
                ))
            );
        }

        if !ch.key_on.starts_with("feature.") {
            bail!(
                "{}",
                diagnostics::error_message(format!(
                    "key_on must start with \"feature.\", got {:?}",
                    ch.key_on
                ))
            );
        }

        if let Some(t) = &ch.thresholds {
            validate_thresholds(t)?;
        }

        for layer in std::iter::once(&self.base_tiles).chain(&self.tile_layers) {
            if layer.name.trim().is_empty() || layer.url.trim().is_empty() {
                bail!(
                    "{}",
                    diagnostics::error_message("tile layers need a non-empty name and url")
                );
            }
        }

        Ok(())
    }
}

/// Threshold scales need 3..=6 finite, non-decreasing cut points.
pub fn validate_thresholds(thresholds: &[f64]) -> Result<()> {
    if !(3..=6).contains(&thresholds.len()) {
        bail!(
            "{}",
            diagnostics::error_message(format!(
                "threshold scale needs between 3 and 6 values, got {}",
                thresholds.len()
            ))
        );
    }
    if thresholds.iter().any(|t| !t.is_finite()) {
        bail!(
            "{}",
            diagnostics::error_message("threshold scale values must be finite")
        );
    }
    if thresholds.windows(2).any(|w| w[0] > w[1]) {
        bail!(
            "{}",
            diagnostics::error_message(format!(
                "threshold scale must be non-decreasing: {:?}",
                thresholds
            ))
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_keeps_defaults() {
        let file = ConfigFile::parse("", "inline").unwrap();
        let cfg = MapConfig::from_file(file).unwrap();
        assert_eq!(cfg, MapConfig::default());
        assert_eq!(cfg.tile_layers.len(), 4);
        assert_eq!(cfg.output, PathBuf::from("Webmap.html"));
    }

    #[test]
    fn yaml_overrides_selected_fields() {
        let yaml = r#"
zoom_start: 4
fill_color: OrRd
legend_name: People
oceans_file: seas.geojson
tile_layers:
  - name: OSM
    url: https://tile.example/{z}/{x}/{y}.png
"#;
        let cfg = MapConfig::from_file(ConfigFile::parse(yaml, "inline").unwrap()).unwrap();
        assert_eq!(cfg.zoom_start, 4);
        assert_eq!(cfg.choropleth.palette, "OrRd");
        assert_eq!(cfg.choropleth.legend_name, "People");
        assert_eq!(cfg.tile_layers.len(), 1);
        assert_eq!(cfg.tile_layers[0].max_zoom, 18);
        assert_eq!(
            cfg.input_files().oceans,
            Path::new("data").join("seas.geojson")
        );
        assert_eq!(cfg.inputs.cities, "us-cities.csv");
    }

    #[test]
    fn example_config_is_valid() {
        let text = include_str!("../webmap.example.yml");
        let cfg = MapConfig::from_file(ConfigFile::parse(text, "example").unwrap()).unwrap();
        assert_eq!(cfg.tile_layers.len(), 2);
        assert_eq!(cfg.choropleth, ChoroplethConfig::default());
    }

    #[test]
    fn resolve_without_file_or_flags_uses_defaults() {
        let cfg = MapConfig::resolve(None, None, None).unwrap();
        assert_eq!(cfg.data_dir, PathBuf::from("data"));
        assert_eq!(cfg.output, PathBuf::from("Webmap.html"));
    }

    #[test]
    fn resolve_layers_flags_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.yml");
        fs::write(&path, "data_dir: from-yaml
output: yaml.html
zoom_start: 3
").unwrap();

        let cfg = MapConfig::resolve(Some(&path), None, None).unwrap();
        assert_eq!(cfg.data_dir, PathBuf::from("from-yaml"));
        assert_eq!(cfg.output, PathBuf::from("yaml.html"));

        let cfg = MapConfig::resolve(
            Some(&path),
            Some(PathBuf::from("from-flag")),
            Some(PathBuf::from("flag.html")),
        )
        .unwrap();
        assert_eq!(cfg.data_dir, PathBuf::from("from-flag"));
        assert_eq!(cfg.output, PathBuf::from("flag.html"));
        assert_eq!(cfg.zoom_start, 3);
    }

    #[test]
    fn resolve_reports_missing_config_file() {
        let err = MapConfig::resolve(Some(Path::new("no/such/map.yml")), None, None).unwrap_err();
        assert!(format!("{err}").contains("no/such/map.yml"), "{err}");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(ConfigFile::parse("zoom: 3\n", "inline").is_err());
    }

    #[test]
    fn bad_values_fail_validation() {
        let file = ConfigFile {
            fill_opacity: Some(1.5),
            ..ConfigFile::default()
        };
        assert!(MapConfig::from_file(file).is_err());

        let file = ConfigFile {
            nan_fill_color: Some("black".to_string()),
            ..ConfigFile::default()
        };
        assert!(MapConfig::from_file(file).is_err());

        let file = ConfigFile {
            key_on: Some("properties.name".to_string()),
            ..ConfigFile::default()
        };
        assert!(MapConfig::from_file(file).is_err());
    }

    #[test]
    fn threshold_rules() {
        assert!(validate_thresholds(&[0.0, 1.0, 2.0]).is_ok());
        assert!(validate_thresholds(&[0.0, 1.0, 1.0, 5.0]).is_ok());
        assert!(validate_thresholds(&[0.0, 1.0]).is_err());
        assert!(validate_thresholds(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).is_err());
        assert!(validate_thresholds(&[0.0, 3.0, 2.0]).is_err());
        assert!(validate_thresholds(&[0.0, f64::NAN, 2.0]).is_err());
    }
}
