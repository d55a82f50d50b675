pub mod crossref;
pub mod dataset;
pub mod status;
pub mod timeline;
pub mod validate;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

use crate::dataset::{CatalogConfig, CatalogEntry};

pub fn read_json_value(path: &Path) -> Result<Value> {
    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_slice(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

// The preloaded catalog ships as a JSON file next to the cache; a missing
// file just means no preloaded datasets.
pub fn load_catalog(cache_root: &Path, catalog_path: Option<&Path>) -> Result<CatalogConfig> {
    let path = catalog_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| cache_root.join("catalog.json"));

    if !path.exists() {
        return Ok(CatalogConfig::default());
    }

    let raw = fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
    let catalog: CatalogConfig = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    // Relative dataset directories resolve against the catalog file.
    let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let datasets = catalog
        .datasets
        .into_iter()
        .map(|entry| CatalogEntry {
            directory: if entry.directory.is_relative() {
                base.join(&entry.directory)
            } else {
                entry.directory
            },
            ..entry
        })
        .collect();

    Ok(CatalogConfig { datasets })
}
