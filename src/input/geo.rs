//! GeoJSON documents. Geometry is kept opaque and passed to the page as-is.

use crate::Result;
use crate::diagnostics;

use anyhow::{Context, anyhow, bail};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

const BOM: char = '\u{feff}';

/// A validated `FeatureCollection`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct GeoDocument(Value);

impl GeoDocument {
    pub fn parse(text: &str, source: &str) -> Result<Self> {
        // Some exports carry a UTF-8 BOM.
        let text = text.strip_prefix(BOM).unwrap_or(text);

        let value: Value = serde_json::from_str(text)
            .with_context(|| diagnostics::error_message(format!("parse GeoJSON {}", source)))?;

        let kind = value.get("type").and_then(Value::as_str);
        if kind != Some("FeatureCollection") {
            bail!(
                "{}",
                diagnostics::error_message(format!(
                    "{} is not a FeatureCollection (type: {:?})",
                    source, kind
                ))
            );
        }
        if !value.get("features").is_some_and(Value::is_array) {
            bail!(
                "{}",
                diagnostics::error_message(format!("{} has no features array", source))
            );
        }

        Ok(Self(value))
    }

    pub fn features(&self) -> &[Value] {
        self.0
            .get("features")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Resolve a dotted `feature.a.b` path against every feature.
    ///
    /// Strings are returned verbatim and numbers in their JSON form; anything
    /// else (missing, null, object) yields `None` for that feature.
    pub fn feature_keys(&self, key_on: &str) -> Result<Vec<Option<String>>> {
        let path = key_on
            .strip_prefix("feature.")
            .ok_or_else(|| {
                anyhow!(diagnostics::error_message(format!(
                    "key_on must start with \"feature.\": {}",
                    key_on
                )))
            })?
            .split('.')
            .collect::<Vec<_>>();

        Ok(self
            .features()
            .iter()
            .map(|feature| {
                let found = path.iter().try_fold(feature, |v, seg| v.get(*seg))?;
                match found {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                }
            })
            .collect())
    }
}

pub fn load_geojson(path: &Path) -> Result<GeoDocument> {
    let text = fs::read_to_string(path)
        .with_context(|| diagnostics::error_message(format!("read GeoJSON {}", path.display())))?;
    GeoDocument::parse(&text, &path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "id": "AL", "properties": {"name": "Alabama"},
             "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]]}},
            {"type": "Feature", "id": "AK", "properties": {"name": 7},
             "geometry": null},
            {"type": "Feature", "properties": {},
             "geometry": null}
        ]
    }"#;

    #[test]
    fn reads_keys_by_dotted_path() {
        let doc = GeoDocument::parse(STATES, "inline").unwrap();
        assert_eq!(doc.features().len(), 3);
        assert_eq!(
            doc.feature_keys("feature.properties.name").unwrap(),
            vec![Some("Alabama".to_string()), Some("7".to_string()), None]
        );
        assert_eq!(
            doc.feature_keys("feature.id").unwrap(),
            vec![Some("AL".to_string()), Some("AK".to_string()), None]
        );
        assert!(doc.feature_keys("properties.name").is_err());
    }

    #[test]
    fn strips_byte_order_mark() {
        let text = format!("{}{}", BOM, r#"{"type":"FeatureCollection","features":[]}"#);
        let doc = GeoDocument::parse(&text, "oceans.json").unwrap();
        assert!(doc.features().is_empty());
    }

    #[test]
    fn rejects_non_collections() {
        assert!(GeoDocument::parse(r#"{"type":"Feature","properties":{}}"#, "x").is_err());
        assert!(GeoDocument::parse(r#"{"type":"FeatureCollection"}"#, "x").is_err());
        assert!(GeoDocument::parse("[1, 2]", "x").is_err());
        assert!(GeoDocument::parse("not json", "x").is_err());
    }

    #[test]
    fn serializes_unchanged() {
        let doc = GeoDocument::parse(STATES, "inline").unwrap();
        let original: Value = serde_json::from_str(STATES).unwrap();
        assert_eq!(serde_json::to_value(&doc).unwrap(), original);
    }
}
