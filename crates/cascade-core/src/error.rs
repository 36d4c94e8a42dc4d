//! Error types for scenario loading, linking, and consequence generation.
//!
//! [`CoreError`] wraps the grammar and hazard errors of the lower crates and
//! adds the failures that only show up once files reference each other:
//! missing files, unresolved names, and evaluation on an unlinked graph.

use std::path::PathBuf;

use cascade_hazard::HazardError;
use cascade_types::{BlockError, UnknownKind};

use crate::geostore::GeoStoreError;

/// Errors that can occur while building or running a coupled scenario.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A configuration file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// The file that failed.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration file violates the record grammar.
    #[error("format error: {0}")]
    Block(#[from] BlockError),

    /// A fragility, disaster, or wind table failed to build.
    #[error("hazard model error: {0}")]
    Hazard(#[from] HazardError),

    /// A geometry layer could not be opened or saved.
    #[error("geometry store error: {0}")]
    GeoStore(#[from] GeoStoreError),

    /// A type name was not part of its closed set.
    #[error(transparent)]
    UnknownKind(#[from] UnknownKind),

    /// A value could not be interpreted for its key.
    #[error("line {line}: invalid value {value:?} for key '{key}'")]
    InvalidValue {
        /// 1-based line number.
        line: usize,
        /// The key being populated.
        key: String,
        /// The offending value.
        value: String,
    },

    /// A record is missing a key required to build its object.
    #[error("record starting at line {line}: missing required key '{key}'")]
    MissingKey {
        /// 1-based line number of the record's `version` line.
        line: usize,
        /// The required key.
        key: &'static str,
    },

    /// A fragility names a disaster type that no loaded layer provides.
    #[error("fragility '{fragility}' refers to disaster type '{disaster}', which is not loaded")]
    UnresolvedDisaster {
        /// Fragility class.
        fragility: String,
        /// The disaster type it names.
        disaster: String,
    },

    /// An asset names a fragility that is neither a class nor a type with
    /// matching entries.
    #[error("asset '{asset}' refers to fragility '{fragility}' for '{disaster}', which is not loaded")]
    UnresolvedFragility {
        /// Asset name.
        asset: String,
        /// Disaster side of the pair.
        disaster: String,
        /// Fragility side of the pair.
        fragility: String,
    },

    /// An element or asset refers to a registry entry that no longer exists.
    #[error("'{owner}' refers to missing {family} '{name}'")]
    Dangling {
        /// Name of the referring object.
        owner: String,
        /// Registry the name should be in.
        family: &'static str,
        /// The missing name.
        name: String,
    },

    /// Consequences were requested before the link passes ran.
    #[error("scenario '{0}' has not been linked")]
    NotLinked(String),
}

impl CoreError {
    /// Wrap an I/O error with the path that produced it.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
