//! Geometry layer storage.
//!
//! The model never touches a concrete geospatial file format. Layers are
//! opened and saved through the [`GeoStore`] trait:
//!
//! - [`JsonGeoStore`] keeps each layer as a JSON document at `<path>.json`,
//!   with the same shape as [`GeoLayer`].
//! - [`MemoryGeoStore`] keeps layers in a map, for tests and embedding.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use cascade_types::GeoLayer;
use tracing::debug;

/// Errors raised by a [`GeoStore`].
#[derive(Debug, thiserror::Error)]
pub enum GeoStoreError {
    /// Reading or writing the backing file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// The backing file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The backing file is not a valid layer document.
    #[error("invalid layer document {}: {source}", path.display())]
    Json {
        /// The backing file.
        path: PathBuf,
        /// The underlying JSON error.
        source: serde_json::Error,
    },

    /// No layer exists at the path.
    #[error("no layer stored at {}", .0.display())]
    NotFound(PathBuf),
}

/// Opens and saves geometry layers by path.
///
/// Paths name a layer without its storage extension, the way a scenario
/// file refers to it.
pub trait GeoStore {
    /// Read the layer at `path`.
    fn open(&self, path: &Path) -> Result<GeoLayer, GeoStoreError>;

    /// Write `layer` to `path`, replacing any existing layer.
    fn save(&mut self, path: &Path, layer: &GeoLayer) -> Result<(), GeoStoreError>;
}

/// A [`GeoStore`] over JSON files on disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonGeoStore;

impl JsonGeoStore {
    /// Create a store.
    pub const fn new() -> Self {
        Self
    }

    /// The file backing the layer at `path`.
    pub fn file_for(path: &Path) -> PathBuf {
        let mut name = OsString::from(path.as_os_str());
        name.push(".json");
        PathBuf::from(name)
    }
}

impl GeoStore for JsonGeoStore {
    fn open(&self, path: &Path) -> Result<GeoLayer, GeoStoreError> {
        let file = Self::file_for(path);
        let text = std::fs::read_to_string(&file).map_err(|source| GeoStoreError::Io {
            path: file.clone(),
            source,
        })?;
        let layer: GeoLayer =
            serde_json::from_str(&text).map_err(|source| GeoStoreError::Json {
                path: file.clone(),
                source,
            })?;
        debug!(path = %file.display(), records = layer.len(), "Layer opened");
        Ok(layer)
    }

    fn save(&mut self, path: &Path, layer: &GeoLayer) -> Result<(), GeoStoreError> {
        let file = Self::file_for(path);
        let text = serde_json::to_string_pretty(layer).map_err(|source| GeoStoreError::Json {
            path: file.clone(),
            source,
        })?;
        std::fs::write(&file, text).map_err(|source| GeoStoreError::Io {
            path: file.clone(),
            source,
        })?;
        debug!(path = %file.display(), records = layer.len(), "Layer saved");
        Ok(())
    }
}

/// A [`GeoStore`] backed by an in-memory map.
#[derive(Debug, Clone, Default)]
pub struct MemoryGeoStore {
    layers: BTreeMap<PathBuf, GeoLayer>,
}

impl MemoryGeoStore {
    /// Create an empty store.
    pub const fn new() -> Self {
        Self {
            layers: BTreeMap::new(),
        }
    }

    /// Put a layer at `path`.
    pub fn insert(&mut self, path: impl Into<PathBuf>, layer: GeoLayer) {
        self.layers.insert(path.into(), layer);
    }

    /// The layer at `path`, if any.
    pub fn get(&self, path: &Path) -> Option<&GeoLayer> {
        self.layers.get(path)
    }

    /// Stored paths in order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.layers.keys().map(PathBuf::as_path)
    }
}

impl GeoStore for MemoryGeoStore {
    fn open(&self, path: &Path) -> Result<GeoLayer, GeoStoreError> {
        self.layers
            .get(path)
            .cloned()
            .ok_or_else(|| GeoStoreError::NotFound(path.to_path_buf()))
    }

    fn save(&mut self, path: &Path, layer: &GeoLayer) -> Result<(), GeoStoreError> {
        self.layers.insert(path.to_path_buf(), layer.clone());
        Ok(())
    }
}
