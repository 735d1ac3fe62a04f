//! Shared YAML/JSON loading for content files.
//!
//! Catalogs, profiles and the registry may be authored in either format.
//! The format is chosen by file extension and every failure carries the
//! offending path.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::error::{CatalogError, CatalogResult};

fn read(path: &Path) -> CatalogResult<String> {
    std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            CatalogError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            CatalogError::Io(e)
        }
    })
}

/// Load a YAML file into a strongly-typed struct.
pub fn load_yaml_typed<T: DeserializeOwned>(path: &Path) -> CatalogResult<T> {
    let content = read(path)?;
    serde_yaml::from_str(&content).map_err(|e| CatalogError::YamlParse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Load a JSON file into a strongly-typed struct.
pub fn load_json_typed<T: DeserializeOwned>(path: &Path) -> CatalogResult<T> {
    let content = read(path)?;
    serde_json::from_str(&content).map_err(|e| CatalogError::JsonParse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Returns true for `.yaml`, `.yml` and `.json` files.
pub fn is_content_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml" | "json")
    )
}

/// Load a content file, picking the parser from its extension.
pub fn load_content_typed<T: DeserializeOwned>(path: &Path) -> CatalogResult<T> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml" | "yml") => load_yaml_typed(path),
        Some("json") => load_json_typed(path),
        _ => Err(CatalogError::UnsupportedFile {
            path: path.to_path_buf(),
        }),
    }
}

/// Content files directly inside `dir`, sorted by file name.
///
/// A missing directory yields an empty list.
pub fn content_files(dir: &Path) -> CatalogResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_content_file(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// The first of `stem.yaml`, `stem.yml`, `stem.json` that exists in `dir`.
pub fn find_content_file(dir: &Path, stem: &str) -> Option<PathBuf> {
    ["yaml", "yml", "json"]
        .iter()
        .map(|ext| dir.join(format!("{stem}.{ext}")))
        .find(|p| p.is_file())
}
