//! First-order consequence generation.
//!
//! For every infrastructure layer, every element is checked against its
//! attached assets in order. The first asset found destroyed removes the
//! element and ends that element's scan. Once every element of a layer has
//! been evaluated the layer is saved with its outage column updated.
//!
//! Any evaluation error aborts the pass: an asset that cannot be evaluated
//! might have been destroyed, so skipping it would under-report damage.

use cascade_types::{AssetOutcome, ConsequenceReport, DestructionMode, LayerOutcome, RunId};
use chrono::Utc;
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use tracing::info;

use crate::asset::EvaluationContext;
use crate::context::CoupledContext;
use crate::error::CoreError;
use crate::geostore::GeoStore;

impl CoupledContext {
    /// Run the pass in simple-threshold mode at `criteria`.
    pub fn generate_first_order_consequences(
        &mut self,
        criteria: f64,
        store: &mut dyn GeoStore,
    ) -> Result<ConsequenceReport, CoreError> {
        let mut rng = StdRng::seed_from_u64(self.settings.analysis.seed);
        self.generate_consequences(criteria, DestructionMode::SimpleThreshold, &mut rng, store)
    }

    /// Run the pass with the criteria, mode, and seed from the settings.
    pub fn generate_configured_consequences(
        &mut self,
        store: &mut dyn GeoStore,
    ) -> Result<ConsequenceReport, CoreError> {
        let analysis = self.settings.analysis.clone();
        let mut rng = StdRng::seed_from_u64(analysis.seed);
        self.generate_consequences(analysis.criteria, analysis.mode, &mut rng, store)
    }

    /// Evaluate every element of every layer, save each layer, and report.
    pub fn generate_consequences<R: Rng>(
        &mut self,
        criteria: f64,
        mode: DestructionMode,
        rng: &mut R,
        store: &mut dyn GeoStore,
    ) -> Result<ConsequenceReport, CoreError> {
        if !self.linked {
            return Err(CoreError::NotLinked(self.name.clone()));
        }
        let started_at = Utc::now();
        let run_id = RunId::new();
        info!(%run_id, scenario = self.name, criteria, %mode, "Consequence pass started");

        let ctx = EvaluationContext {
            fragilities: &self.fragilities,
            disasters: &self.disasters,
            thresholds: &self.settings.thresholds,
        };
        let suffix = self.settings.output.suffix.as_str();
        let mut layers = Vec::new();
        let mut destroyed_assets = Vec::new();

        for layer in self.infrastructures.iter_mut() {
            for element in layer.elements_mut() {
                if element.is_removed() {
                    continue;
                }
                let mut failing = None;
                for name in element.assets() {
                    let asset = self.assets.get_mut(name).ok_or_else(|| CoreError::Dangling {
                        owner: element.name.clone(),
                        family: "asset",
                        name: name.clone(),
                    })?;
                    let already = asset.destroyed();
                    if asset.is_destroyed(&ctx, criteria, mode, rng)? {
                        if !already {
                            destroyed_assets.push(AssetOutcome {
                                name: asset.name.clone(),
                                asset_class: asset.asset_class.clone(),
                                location: asset.location,
                                design_wind_mph: self
                                    .code_winds
                                    .as_ref()
                                    .map(|table| table.lookup(asset.location.lat, asset.location.lon)),
                            });
                        }
                        failing = Some(name.clone());
                        break;
                    }
                }
                if let Some(asset) = failing {
                    element.remove();
                    info!(element = element.name, asset, "Element removed");
                }
            }

            let output = layer.save(store, suffix)?;
            layers.push(LayerOutcome {
                source: layer.source().display().to_string(),
                kind: layer.kind(),
                elements_total: layer.elements().len(),
                removed: layer.removed_names(),
                output: output.display().to_string(),
            });
        }

        let report = ConsequenceReport {
            run_id,
            scenario: self.name.clone(),
            criteria,
            mode,
            started_at,
            finished_at: Utc::now(),
            layers,
            destroyed_assets,
        };
        info!(
            %run_id,
            layers = report.layers.len(),
            removed = report.total_removed(),
            destroyed = report.destroyed_assets.len(),
            "Consequence pass finished"
        );
        Ok(report)
    }
}
