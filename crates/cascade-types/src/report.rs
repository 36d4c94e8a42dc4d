//! Consequence report structures.
//!
//! A [`ConsequenceReport`] summarizes one first-order consequence pass: which
//! assets were destroyed, which infrastructure elements were removed in each
//! layer, and where each updated layer was written.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{DestructionMode, InfrastructureKind};
use crate::geo::LatLon;
use crate::ids::RunId;

/// Outcome for one destroyed asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetOutcome {
    /// Asset name (its key in the asset registry).
    pub name: String,
    /// Asset class label.
    pub asset_class: String,
    /// Asset position.
    pub location: LatLon,
    /// Building-code design wind speeds `(ASCE 7-05, ASCE 7-10)` in mph,
    /// when a code wind table was loaded and covers the asset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub design_wind_mph: Option<(f64, f64)>,
}

/// Outcome for one infrastructure layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerOutcome {
    /// Source path the layer was loaded from (its registry key).
    pub source: String,
    /// Network kind.
    pub kind: InfrastructureKind,
    /// Number of elements evaluated.
    pub elements_total: usize,
    /// Names of elements marked removed, in layer order.
    pub removed: Vec<String>,
    /// Path the updated layer was written to.
    pub output: String,
}

impl LayerOutcome {
    /// Number of removed elements.
    pub fn removed_count(&self) -> usize {
        self.removed.len()
    }
}

/// Summary of one consequence-generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsequenceReport {
    /// Unique run identifier.
    pub run_id: RunId,
    /// Scenario name from the configuration file.
    pub scenario: String,
    /// Loss-ratio criteria used to derive wind thresholds.
    pub criteria: f64,
    /// Destruction decision mode.
    pub mode: DestructionMode,
    /// When the pass started.
    pub started_at: DateTime<Utc>,
    /// When the pass finished, after every layer was saved.
    pub finished_at: DateTime<Utc>,
    /// Per-layer outcomes, in registry order.
    pub layers: Vec<LayerOutcome>,
    /// Assets found destroyed during the pass, in evaluation order.
    pub destroyed_assets: Vec<AssetOutcome>,
}

impl ConsequenceReport {
    /// Total elements removed across all layers.
    pub fn total_removed(&self) -> usize {
        self.layers.iter().map(LayerOutcome::removed_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_removed_sums_layers() {
        let layer = |n: usize| LayerOutcome {
            source: "buses".to_owned(),
            kind: InfrastructureKind::ElectricPowerGrid,
            elements_total: 10,
            removed: (0..n).map(|i| format!("bus{i}")).collect(),
            output: "buses_analyzed".to_owned(),
        };
        let now = Utc::now();
        let report = ConsequenceReport {
            run_id: RunId::new(),
            scenario: "test".to_owned(),
            criteria: 0.5,
            mode: DestructionMode::SimpleThreshold,
            started_at: now,
            finished_at: now,
            layers: vec![layer(2), layer(3)],
            destroyed_assets: Vec::new(),
        };
        assert_eq!(report.total_removed(), 5);
    }

    #[test]
    fn design_wind_is_omitted_when_absent() {
        let outcome = AssetOutcome {
            name: "a".to_owned(),
            asset_class: "substation".to_owned(),
            location: LatLon::new(30.0, -85.0),
            design_wind_mph: None,
        };
        let json = serde_json::to_string(&outcome).unwrap_or_default();
        assert!(!json.contains("design_wind_mph"));
    }
}
