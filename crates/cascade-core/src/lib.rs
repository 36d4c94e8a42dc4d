//! Scenario loading, linking, and consequence generation for Cascade.
//!
//! This crate turns a scenario file into a linked graph of disasters,
//! fragilities, assets, and infrastructure networks, then decides which
//! network elements a disaster takes out.
//!
//! # Modules
//!
//! - [`asset`] -- [`Asset`] records, fragility binding, and the destruction
//!   decision in its three modes.
//! - [`config`] -- [`EngineSettings`] loaded from `cascade-config.yaml`.
//! - [`consequence`] -- The first-order consequence pass and its
//!   [`ConsequenceReport`](cascade_types::ConsequenceReport).
//! - [`context`] -- [`CoupledContext`]: scenario parsing and the three link
//!   passes.
//! - [`error`] -- Error types for loading, linking, and evaluation.
//! - [`geostore`] -- The [`GeoStore`] trait with JSON and in-memory stores.
//! - [`infrastructure`] -- Network layers, their elements, and outage
//!   marking.
//! - [`render`] -- The [`Renderer`] drawing collaborator.

pub mod asset;
pub mod config;
pub mod consequence;
pub mod context;
pub mod error;
pub mod geostore;
pub mod infrastructure;
pub mod render;

// Re-export primary types at crate root.
pub use asset::{Asset, AssetList, EvaluationContext, FragilityPair};
pub use config::{ConfigError, EngineSettings};
pub use context::CoupledContext;
pub use error::CoreError;
pub use geostore::{GeoStore, GeoStoreError, JsonGeoStore, MemoryGeoStore};
pub use infrastructure::{InfrastructureElement, InfrastructureLayer, InfrastructureList};
pub use render::{AssetMarker, LogRenderer, Renderer};
