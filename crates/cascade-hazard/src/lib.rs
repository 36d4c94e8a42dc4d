//! Hazard fields and fragility models for the Cascade failure model.
//!
//! This crate answers two questions for a position and an asset class: how
//! strong is the hazard here, and how much hazard can the asset take before
//! it fails. Everything here is read-only once built.
//!
//! # Modules
//!
//! - [`curve`] -- Sampled curves and the clamp-and-scan [`a_from_b`]
//!   interpolation behind every lookup.
//! - [`disaster`] -- [`Hurricane`] and [`Flood`] fields, the
//!   [`DisasterLayer`] sum type, and the per-kind [`DisasterList`].
//! - [`error`] -- Error types for record parsing and hazard queries.
//! - [`fragility`] -- Curve-family and threshold fragilities and the
//!   class-keyed [`FragilityList`].
//! - [`geometry`] -- Point-in-polygon with inclusive boundaries.
//! - [`triangulation`] -- Delaunay triangulation and the linear interpolant
//!   used by flood fields.
//! - [`wind_table`] -- Offline ASCE 7 design wind speeds by position.

pub mod curve;
pub mod disaster;
pub mod error;
pub mod fragility;
pub mod geometry;
pub mod triangulation;
pub mod wind_table;

// Re-export primary types at crate root.
pub use curve::{Curve, a_from_b};
pub use disaster::{
    DisasterDescription, DisasterLayer, DisasterList, Flood, Hurricane, KNOTS_TO_MPH,
    WIND_TO_GUST, WindSwath, knots_to_gust_mph,
};
pub use error::HazardError;
pub use fragility::{
    Fragility, FragilityCurve, FragilityList, FragilityModel, FragilityThreshold,
    WIND_ROUGHNESS_ISOLINES,
};
pub use geometry::point_in_polygon;
pub use triangulation::{LinearInterpolator, Triangulation};
pub use wind_table::{CodeWindRow, CodeWindTable};
