//! State population table: `name,pop`.

use crate::Result;
use crate::diagnostics;

use anyhow::{Context, bail};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StateRow {
    pub name: String,
    pub pop: u64,
}

pub fn load_states(path: &Path) -> Result<Vec<StateRow>> {
    let file = File::open(path).with_context(|| {
        diagnostics::error_message(format!("open state table {}", path.display()))
    })?;
    read_states(file, &path.display().to_string())
}

/// Parse a state table; names must be unique since they are the join key.
pub fn read_states<R: Read>(rdr: R, source: &str) -> Result<Vec<StateRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(rdr);

    let mut seen: BTreeMap<String, usize> = BTreeMap::new();
    let mut out = Vec::new();
    for (idx, record) in reader.deserialize::<StateRow>().enumerate() {
        let row_no = idx + 1;
        let row = record.with_context(|| {
            diagnostics::error_message(format!("state parse error at {} row {}", source, row_no))
        })?;

        if let Some(prev) = seen.insert(row.name.clone(), row_no) {
            bail!(
                "{}",
                diagnostics::error_message(format!(
                    "duplicate state {:?} at {} rows {} and {}",
                    row.name, source, prev, row_no
                ))
            );
        }

        out.push(row);
    }

    if out.is_empty() {
        bail!(
            "{}",
            diagnostics::error_message(format!("state table {} has no rows", source))
        );
    }

    Ok(out)
}
