use std::fs;
use std::path::Path;

use tracing::info;
use tts_core::core_api::{CoreError, CoreErrorCode, ImageEntry};

pub const OUTPUT_MANIFEST_NAME: &str = "tts_extract_out_manifest.csv";

/// One-column CSV listing every entry key in emission order.
pub fn render_manifest(entries: &[ImageEntry]) -> String {
    let mut out = String::from("image_id\n");
    for entry in entries {
        out.push_str(&csv_field(&entry.key.to_string()));
        out.push('\n');
    }
    out
}

pub fn write_manifest(path: &Path, entries: &[ImageEntry]) -> Result<(), CoreError> {
    fs::write(path, render_manifest(entries)).map_err(|e| {
        CoreError::new(
            CoreErrorCode::Io,
            format!("failed to write {}: {e}", path.display()),
        )
    })?;
    info!("Manifest written: {}", path.display());
    Ok(())
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
