//! ColorBrewer sequential palettes and the threshold colour scale.

use crate::Result;
use crate::config::validate_thresholds;
use crate::diagnostics;

use anyhow::anyhow;
use serde::Serialize;

/// Colours for 3, 4, 5 and 6 classes, lightest first.
type Ramp = [&'static [&'static str]; 4];

const YL_GN: Ramp = [
    &["#f7fcb9", "#addd8e", "#31a354"],
    &["#ffffcc", "#c2e699", "#78c679", "#238443"],
    &["#ffffcc", "#c2e699", "#78c679", "#31a354", "#006837"],
    &["#ffffcc", "#d9f0a3", "#addd8e", "#78c679", "#31a354", "#006837"],
];

const YL_GN_BU: Ramp = [
    &["#edf8b1", "#7fcdbb", "#2c7fb8"],
    &["#ffffcc", "#a1dab4", "#41b6c4", "#225ea8"],
    &["#ffffcc", "#a1dab4", "#41b6c4", "#2c7fb8", "#253494"],
    &["#ffffcc", "#c7e9b4", "#7fcdbb", "#41b6c4", "#2c7fb8", "#253494"],
];

const BU_GN: Ramp = [
    &["#e5f5f9", "#99d8c9", "#2ca25f"],
    &["#edf8fb", "#b2e2e2", "#66c2a4", "#238b45"],
    &["#edf8fb", "#b2e2e2", "#66c2a4", "#2ca25f", "#006d2c"],
    &["#edf8fb", "#ccece6", "#99d8c9", "#66c2a4", "#2ca25f", "#006d2c"],
];

const OR_RD: Ramp = [
    &["#fee8c8", "#fdbb84", "#e34a33"],
    &["#fef0d9", "#fdcc8a", "#fc8d59", "#d7301f"],
    &["#fef0d9", "#fdcc8a", "#fc8d59", "#e34a33", "#b30000"],
    &["#fef0d9", "#fdd49e", "#fdbb84", "#fc8d59", "#e34a33", "#b30000"],
];

const PU_BU: Ramp = [
    &["#ece7f2", "#a6bddb", "#2b8cbe"],
    &["#f1eef6", "#bdc9e1", "#74a9cf", "#0570b0"],
    &["#f1eef6", "#bdc9e1", "#74a9cf", "#2b8cbe", "#045a8d"],
    &["#f1eef6", "#d0d1e6", "#a6bddb", "#74a9cf", "#2b8cbe", "#045a8d"],
];

const YL_OR_RD: Ramp = [
    &["#ffeda0", "#feb24c", "#f03b20"],
    &["#ffffb2", "#fecc5c", "#fd8d3c", "#e31a1c"],
    &["#ffffb2", "#fecc5c", "#fd8d3c", "#f03b20", "#bd0026"],
    &["#ffffb2", "#fed976", "#feb24c", "#fd8d3c", "#f03b20", "#bd0026"],
];

const PALETTES: [(&str, Ramp); 6] = [
    ("YlGn", YL_GN),
    ("YlGnBu", YL_GN_BU),
    ("BuGn", BU_GN),
    ("OrRd", OR_RD),
    ("PuBu", PU_BU),
    ("YlOrRd", YL_OR_RD),
];

pub fn palette_names() -> impl Iterator<Item = &'static str> {
    PALETTES.iter().map(|(name, _)| *name)
}

/// Look up `classes` colours of a named palette.
pub fn color_brewer(name: &str, classes: usize) -> Result<&'static [&'static str]> {
    let ramp = PALETTES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, r)| r)
        .ok_or_else(|| {
            anyhow!(diagnostics::error_message(format!(
                "unknown palette {:?} (known: {})",
                name,
                palette_names().collect::<Vec<_>>().join(", ")
            )))
        })?;

    classes
        .checked_sub(3)
        .and_then(|i| ramp.get(i))
        .copied()
        .ok_or_else(|| {
            anyhow!(diagnostics::error_message(format!(
                "palette {} supports 3 to 6 classes, asked for {}",
                name, classes
            )))
        })
}

/// Maps a value to the colour of the highest threshold it reaches.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdScale {
    pub thresholds: Vec<f64>,
    pub colors: Vec<String>,
}

impl ThresholdScale {
    pub fn new(thresholds: Vec<f64>, palette: &str) -> Result<Self> {
        validate_thresholds(&thresholds)?;
        let colors = color_brewer(palette, thresholds.len())?
            .iter()
            .map(|c| c.to_string())
            .collect();
        Ok(Self { thresholds, colors })
    }

    /// Values under the first threshold share the first colour.
    pub fn color_for(&self, value: f64) -> &str {
        let idx = self
            .thresholds
            .iter()
            .rposition(|t| value >= *t)
            .unwrap_or(0);
        &self.colors[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_palettes_cover_three_to_six_classes() {
        for name in palette_names() {
            for n in 3..=6 {
                let colors = color_brewer(name, n).unwrap();
                assert_eq!(colors.len(), n, "{name} {n}");
            }
            assert!(color_brewer(name, 2).is_err());
            assert!(color_brewer(name, 7).is_err());
        }
        assert!(color_brewer("Rainbow", 5).is_err());
    }

    #[test]
    fn color_for_picks_highest_reached_threshold() {
        let scale = ThresholdScale::new(vec![0.0, 100.0, 200.0], "YlGn").unwrap();
        assert_eq!(scale.color_for(-5.0), "#f7fcb9");
        assert_eq!(scale.color_for(0.0), "#f7fcb9");
        assert_eq!(scale.color_for(99.9), "#f7fcb9");
        assert_eq!(scale.color_for(100.0), "#addd8e");
        assert_eq!(scale.color_for(1e9), "#31a354");
    }

    #[test]
    fn repeated_thresholds_skip_to_the_last_match() {
        let scale = ThresholdScale::new(vec![0.0, 5.0, 5.0, 9.0], "OrRd").unwrap();
        assert_eq!(scale.color_for(5.0), "#fc8d59");
    }

    #[test]
    fn bad_scales_are_rejected() {
        assert!(ThresholdScale::new(vec![0.0, 1.0], "YlGn").is_err());
        assert!(ThresholdScale::new(vec![0.0, 1.0, 2.0], "Nope").is_err());
    }
}
