//! Summary statistics: centre, quartile tiers, choropleth thresholds.

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Quantile of an ascending slice using linear interpolation between the
/// closest ranks (`pos = q * (n - 1)`).
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

fn sorted_f64<I: IntoIterator<Item = f64>>(values: I) -> Vec<f64> {
    let mut v: Vec<f64> = values.into_iter().collect();
    v.sort_by(f64::total_cmp);
    v
}

/// Cut points splitting city populations into four marker tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuartileCuts {
    pub min: u64,
    pub lower: u64,
    pub median: u64,
    pub upper: u64,
}

impl QuartileCuts {
    /// Quartiles are truncated toward zero to whole people.
    pub fn from_populations(populations: &[u64]) -> Option<Self> {
        let sorted = sorted_f64(populations.iter().map(|&p| p as f64));
        Some(Self {
            min: *populations.iter().min()?,
            lower: quantile(&sorted, 0.25)? as u64,
            median: quantile(&sorted, 0.5)? as u64,
            upper: quantile(&sorted, 0.75)? as u64,
        })
    }

    /// Half-open buckets; anything that falls outside the first three
    /// lands in the top tier.
    pub fn classify(&self, population: u64) -> Tier {
        if (self.min..self.lower).contains(&population) {
            Tier::LightGreen
        } else if (self.lower..self.median).contains(&population) {
            Tier::Green
        } else if (self.median..self.upper).contains(&population) {
            Tier::Orange
        } else {
            Tier::DarkRed
        }
    }
}

/// Marker colour tier, lowest population first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    LightGreen,
    Green,
    Orange,
    DarkRed,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::LightGreen, Tier::Green, Tier::Orange, Tier::DarkRed];

    pub fn name(self) -> &'static str {
        match self {
            Tier::LightGreen => "lightgreen",
            Tier::Green => "green",
            Tier::Orange => "orange",
            Tier::DarkRed => "darkred",
        }
    }

    /// Fill colour used for the marker pin.
    pub fn hex(self) -> &'static str {
        match self {
            Tier::LightGreen => "#bbf970",
            Tier::Green => "#72b026",
            Tier::Orange => "#f69730",
            Tier::DarkRed => "#a23336",
        }
    }
}

const SPLIT_PERCENTILES: [f64; 5] = [0.0, 50.0, 75.0, 85.0, 90.0];

/// Threshold scale for the choropleth: selected percentiles of `values`,
/// each rounded to one significant figure.
pub fn split_six(values: &[f64]) -> Vec<f64> {
    let sorted = sorted_f64(values.iter().copied());
    SPLIT_PERCENTILES
        .iter()
        .filter_map(|p| quantile(&sorted, p / 100.0))
        .map(round_to_magnitude)
        .collect()
}

/// Round to one significant figure, ties to even. Non-positive input maps to 0.
pub fn round_to_magnitude(x: f64) -> f64 {
    if !x.is_finite() || x <= 0.0 {
        return 0.0;
    }
    let mut exp = x.log10().floor() as i32;
    // log10 can land a hair off for exact powers of ten.
    if 10f64.powi(exp + 1) <= x {
        exp += 1;
    } else if 10f64.powi(exp) > x {
        exp -= 1;
    }
    let base = 10f64.powi(exp);
    (x / base).round_ties_even() * base
}

/// `1234567` -> `"1,234,567"`.
pub fn format_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Whole non-negative values get separators; anything else prints as-is.
pub fn format_scale_value(x: f64) -> String {
    if x >= 0.0 && x.fract() == 0.0 && x <= u64::MAX as f64 {
        format_thousands(x as u64)
    } else {
        x.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn mean_of_values() {
        assert_eq!(mean(&[]), None);
        assert!(close(mean(&[1.0, 2.0, 6.0]).unwrap(), 3.0));
    }

    #[test]
    fn quantile_interpolates_like_pandas() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert!(close(quantile(&v, 0.25).unwrap(), 1.75));
        assert!(close(quantile(&v, 0.5).unwrap(), 2.5));
        assert!(close(quantile(&v, 0.75).unwrap(), 3.25));
        assert!(close(quantile(&v, 0.0).unwrap(), 1.0));
        assert!(close(quantile(&v, 1.0).unwrap(), 4.0));
        assert!(close(quantile(&[7.0], 0.3).unwrap(), 7.0));
        assert_eq!(quantile(&[], 0.5), None);
        assert_eq!(quantile(&v, 1.5), None);
    }

    #[test]
    fn quartile_cuts_truncate() {
        let cuts = QuartileCuts::from_populations(&[400, 100, 300, 200]).unwrap();
        assert_eq!(
            cuts,
            QuartileCuts {
                min: 100,
                lower: 175,
                median: 250,
                upper: 325,
            }
        );
        assert_eq!(QuartileCuts::from_populations(&[]), None);
    }

    #[test]
    fn classify_uses_half_open_buckets() {
        let cuts = QuartileCuts {
            min: 100,
            lower: 175,
            median: 250,
            upper: 325,
        };
        assert_eq!(cuts.classify(100), Tier::LightGreen);
        assert_eq!(cuts.classify(174), Tier::LightGreen);
        assert_eq!(cuts.classify(175), Tier::Green);
        assert_eq!(cuts.classify(250), Tier::Orange);
        assert_eq!(cuts.classify(324), Tier::Orange);
        assert_eq!(cuts.classify(325), Tier::DarkRed);
        assert_eq!(cuts.classify(10_000), Tier::DarkRed);
        // Below the minimum is outside every bucket and falls through.
        assert_eq!(cuts.classify(5), Tier::DarkRed);
    }

    #[test]
    fn equal_cuts_leave_empty_tiers() {
        let cuts = QuartileCuts::from_populations(&[50, 50, 50, 50]).unwrap();
        assert_eq!(cuts.classify(50), Tier::DarkRed);
    }

    #[test]
    fn magnitude_rounding() {
        assert_eq!(round_to_magnitude(2100.0), 2000.0);
        assert_eq!(round_to_magnitude(2790.0), 3000.0);
        assert_eq!(round_to_magnitude(1000.0), 1000.0);
        assert_eq!(round_to_magnitude(0.0), 0.0);
        assert_eq!(round_to_magnitude(-5.0), 0.0);
        // Ties go to even.
        assert_eq!(round_to_magnitude(2500.0), 2000.0);
        assert_eq!(round_to_magnitude(3500.0), 4000.0);
        assert_eq!(round_to_magnitude(96_000.0), 100_000.0);
    }

    #[test]
    fn split_six_is_monotone() {
        let pops: Vec<f64> = (1..=50).map(|i| (i * i * 10_000) as f64).collect();
        let scale = split_six(&pops);
        assert_eq!(scale.len(), 5);
        assert_eq!(scale[0], 10_000.0);
        assert!(scale.windows(2).all(|w| w[0] <= w[1]), "{scale:?}");
        assert!(split_six(&[]).is_empty());
    }

    #[test]
    fn thousands_separator() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1000), "1,000");
        assert_eq!(format_thousands(8_405_837), "8,405,837");
        assert_eq!(format_thousands(123_456), "123,456");
    }

    #[test]
    fn scale_values_keep_sign_and_fraction() {
        assert_eq!(format_scale_value(20_000_000.0), "20,000,000");
        assert_eq!(format_scale_value(0.0), "0");
        assert_eq!(format_scale_value(-2_500_000.0), "-2500000");
        assert_eq!(format_scale_value(0.5), "0.5");
        assert_eq!(format_scale_value(1.5), "1.5");
    }

    #[test]
    fn tier_names() {
        let names: Vec<_> = Tier::ALL.iter().map(|t| t.name()).collect();
        assert_eq!(names, ["lightgreen", "green", "orange", "darkred"]);
    }
}
