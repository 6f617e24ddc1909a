//! JSON rendering and persistence for the indicator lookup.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Serializes `value` as UTF-8 JSON indented with four spaces.
///
/// Non-ASCII characters are written as-is, never escaped.
pub fn to_pretty_json(value: &impl Serialize) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    Ok(buf)
}

/// Writes `value` as indented JSON to `path`, replacing any existing file.
///
/// Returns the rendered bytes so callers can publish the same document.
pub fn write_json(path: &str, value: &impl Serialize) -> Result<Vec<u8>> {
    let body = to_pretty_json(value)?;

    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating output directory '{}'", parent.display()))?;
        }
    }
    debug!(path, bytes = body.len(), "Writing JSON document");
    fs::write(path, &body).with_context(|| format!("writing '{path}'"))?;
    info!(path, "JSON document written");

    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn sample() -> BTreeMap<String, BTreeMap<String, f64>> {
        let mut inner = BTreeMap::new();
        inner.insert("Cartões".to_string(), 50.0);
        let mut outer = BTreeMap::new();
        outer.insert("Especial".to_string(), inner);
        outer
    }

    #[test]
    fn test_pretty_json_uses_four_spaces_and_raw_utf8() {
        let body = String::from_utf8(to_pretty_json(&sample()).unwrap()).unwrap();
        assert!(body.contains("\n    \"Especial\": {\n        \"Cartões\": 50.0"));
        assert!(!body.contains("\\u"));
    }

    #[test]
    fn test_write_json_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/dict_indicadores.json");
        let path = path.to_str().unwrap();

        let body = write_json(path, &sample()).unwrap();

        let on_disk = fs::read(path).unwrap();
        assert_eq!(on_disk, body);
        let parsed: serde_json::Value = serde_json::from_slice(&on_disk).unwrap();
        assert_eq!(parsed["Especial"]["Cartões"], 50.0);
    }

    #[test]
    fn test_write_json_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dict_indicadores.json");
        let path = path.to_str().unwrap();

        fs::write(path, "stale").unwrap();
        write_json(path, &sample()).unwrap();

        let content = fs::read_to_string(path).unwrap();
        assert!(content.starts_with('{'));
    }
}
