//! Run identifiers.
//!
//! Scenario entities (assets, fragilities, layers) are keyed by the names
//! their configuration files give them. Only runs get a generated
//! identifier, so that reports from repeated runs of the same scenario can
//! be told apart. Run ids are UUID v7, so they sort by start time.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for one consequence-generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(Uuid);

impl RunId {
    /// A fresh, time-ordered run id.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// The underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for RunId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.0.fmt(f)
    }
}
