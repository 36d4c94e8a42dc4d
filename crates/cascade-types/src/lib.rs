//! Shared type definitions for the Cascade infrastructure failure model.
//!
//! This crate holds the value types every other crate agrees on: positions
//! and geospatial layers, the closed sets of disaster/fragility/network
//! kinds, run identifiers, consequence reports, and the block-record text
//! grammar that all configuration files are written in.
//!
//! # Modules
//!
//! - [`block`] -- `version` .. `end` record grammar and [`BlockError`].
//! - [`enums`] -- Closed-set kinds parsed from configuration type names.
//! - [`geo`] -- [`LatLon`], [`Shape`], and the [`GeoLayer`] attribute table.
//! - [`ids`] -- UUID-backed identifiers.
//! - [`report`] -- [`ConsequenceReport`] and per-layer outcomes.

pub mod block;
pub mod enums;
pub mod geo;
pub mod ids;
pub mod report;

// Re-export primary types at crate root.
pub use block::{BlockError, Entry, Record};
pub use enums::{DestructionMode, DisasterKind, FragilityKind, InfrastructureKind, UnknownKind};
pub use geo::{AttributeValue, FieldDescriptor, FieldKind, GeoLayer, LatLon, Shape, ShapeKind};
pub use ids::RunId;
pub use report::{AssetOutcome, ConsequenceReport, LayerOutcome};
