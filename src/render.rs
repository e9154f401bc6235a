//! Page rendering (HTML).

mod html;

pub use html::render_html;

use crate::Result;
use crate::diagnostics;

use anyhow::Context;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Serialize `data` so it can sit inside a `<script>` element unchanged.
///
/// `<`, `>` and `&` only ever occur inside JSON strings, where the `\u` forms
/// decode to the same text.
pub fn embed_json<T: Serialize>(data: &T) -> Result<String> {
    let json = serde_json::to_string(data)?;
    Ok(json
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026"))
}

pub fn write_report(path: &Path, html: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| {
            diagnostics::error_message(format!("create output dir {}", parent.display()))
        })?;
    }
    fs::write(path, html)
        .with_context(|| diagnostics::error_message(format!("write {}", path.display())))
}
