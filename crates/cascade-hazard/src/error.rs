//! Error types for the `cascade-hazard` crate.
//!
//! All fallible operations in this crate return [`HazardError`] through the
//! standard `Result` type.

use cascade_types::{BlockError, UnknownKind};

/// Errors that can occur while building or querying hazard models.
#[derive(Debug, thiserror::Error)]
pub enum HazardError {
    /// The record grammar itself was malformed.
    #[error("format error: {0}")]
    Block(#[from] BlockError),

    /// A type name was not part of its closed set.
    #[error(transparent)]
    UnknownKind(#[from] UnknownKind),

    /// A numeric token could not be parsed.
    #[error("line {line}: cannot parse {token:?} as a number for key '{key}'")]
    InvalidNumber {
        /// 1-based line number.
        line: usize,
        /// The key being populated.
        key: String,
        /// The offending token.
        token: String,
    },

    /// A key needs more tokens than the value provides.
    #[error("line {line}: key '{key}' expects {expected} values")]
    MissingValues {
        /// 1-based line number.
        line: usize,
        /// The key being populated.
        key: String,
        /// How many values the key expects.
        expected: usize,
    },

    /// A per-curve key appeared before any `curve number` line.
    #[error("line {line}: key '{key}' appears before any 'curve number'")]
    CurveKeyBeforeCurve {
        /// 1-based line number.
        line: usize,
        /// The per-curve key.
        key: String,
    },

    /// A record is missing a key required to build its object.
    #[error("record starting at line {line}: missing required key '{key}'")]
    MissingKey {
        /// 1-based line number of the record's `version` line.
        line: usize,
        /// The required key.
        key: &'static str,
    },

    /// A curve family has fewer curves than isoline values.
    #[error("fragility '{fragility}' has {found} curves but {needed} isoline values")]
    InsufficientCurves {
        /// Fragility class name.
        fragility: String,
        /// Curves required.
        needed: usize,
        /// Curves present.
        found: usize,
    },

    /// A generic curve fragility has no isoline values configured.
    #[error("fragility '{0}' has no 'isolines' configured")]
    MissingIsolines(String),

    /// A named intensity attribute does not exist in a hazard layer.
    #[error("disaster layer '{layer}' has no attribute named '{field}'")]
    UnknownField {
        /// Disaster layer name.
        layer: String,
        /// The requested attribute name.
        field: String,
    },

    /// A hazard geometry layer lacks the attribute an intensity is read from.
    #[error("record {record} of disaster layer '{layer}' has no intensity attribute")]
    MissingIntensity {
        /// Disaster layer name.
        layer: String,
        /// Record index.
        record: usize,
    },
}
