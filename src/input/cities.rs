//! City table: `rank,place,population,lat,lon`.

use crate::Result;
use crate::diagnostics;

use anyhow::{Context, bail};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// One city row. Extra CSV columns are ignored; order does not matter.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CityRow {
    pub rank: u32,
    pub place: String,
    pub population: u64,
    pub lat: f64,
    pub lon: f64,
}

pub fn load_cities(path: &Path) -> Result<Vec<CityRow>> {
    let file = File::open(path).with_context(|| {
        diagnostics::error_message(format!("open city table {}", path.display()))
    })?;
    read_cities(file, &path.display().to_string())
}

/// Parse a city table from any reader; `source` only labels error messages.
pub fn read_cities<R: Read>(rdr: R, source: &str) -> Result<Vec<CityRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(rdr);

    let mut out = Vec::new();
    for (idx, record) in reader.deserialize::<CityRow>().enumerate() {
        let row_no = idx + 1;
        let row = record.with_context(|| {
            diagnostics::error_message(format!("city parse error at {} row {}", source, row_no))
        })?;

        if !row.lat.is_finite() || !row.lon.is_finite() {
            bail!(
                "{}",
                diagnostics::error_message(format!(
                    "non-finite coordinate at {} row {}: {}",
                    source, row_no, row.place
                ))
            );
        }
        if !(-90.0..=90.0).contains(&row.lat) || !(-180.0..=180.0).contains(&row.lon) {
            bail!(
                "{}",
                diagnostics::error_message(format!(
                    "coordinate out of range at {} row {}: ({}, {})",
                    source, row_no, row.lat, row.lon
                ))
            );
        }

        out.push(row);
    }

    if out.is_empty() {
        bail!(
            "{}",
            diagnostics::error_message(format!("city table {} has no rows", source))
        );
    }

    Ok(out)
}
