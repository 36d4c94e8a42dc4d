//! Consequence engine binary for the Cascade infrastructure failure model.
//!
//! Loads a scenario, links disasters, fragilities, assets, and
//! infrastructure, runs one first-order consequence pass, and writes the
//! analyzed layers plus an optional JSON report.
//!
//! # Startup Sequence
//!
//! 1. Load settings from `cascade-config.yaml` (defaults if absent)
//! 2. Initialize structured logging (tracing)
//! 3. Resolve the scenario path (first argument, else `scenario` setting)
//! 4. Load and link the scenario through the JSON layer store
//! 5. Run the consequence pass with the configured criteria and mode
//! 6. Hand the result to the renderer
//! 7. Write the JSON report if `output.report` is set
//! 8. Log the summary

mod error;

use std::path::{Path, PathBuf};

use cascade_core::{CoupledContext, EngineSettings, JsonGeoStore, LogRenderer};
use cascade_types::ConsequenceReport;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Settings file looked up in the working directory.
const CONFIG_FILE: &str = "cascade-config.yaml";

/// Application entry point for the consequence engine.
///
/// # Errors
///
/// Returns an error if settings, the scenario, the consequence pass, or
/// the report fails.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load settings.
    let (settings, from_file) = load_config()?;

    // 2. Initialize structured logging.
    let level = settings.logging.level.clone();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_target(true)
        .init();

    info!("cascade-engine starting");
    if from_file {
        info!(path = CONFIG_FILE, "Configuration loaded");
    } else {
        info!("Config file not found, using defaults");
    }

    // 3. Resolve the scenario.
    let scenario = scenario_path(&settings)?;
    info!(
        scenario = %scenario.display(),
        criteria = settings.analysis.criteria,
        mode = %settings.analysis.mode,
        seed = settings.analysis.seed,
        "Scenario selected"
    );

    // 4. Load and link.
    let mut store = JsonGeoStore::new();
    let report_path = settings.output.report.clone();
    let mut context =
        CoupledContext::load(&scenario, &store, settings).map_err(EngineError::from)?;
    info!(
        name = context.name,
        disasters = context.disasters().len(),
        fragilities = context.fragilities().len(),
        assets = context.assets().len(),
        layers = context.infrastructures().len(),
        "Scenario linked"
    );

    // 5. Consequence pass.
    let report = context
        .generate_configured_consequences(&mut store)
        .map_err(EngineError::from)?;

    // 6. Display.
    context.display(&mut LogRenderer);

    // 7. Report.
    if let Some(path) = report_path {
        write_report(&path, &report)?;
        info!(path = %path.display(), "Report written");
    }

    // 8. Summary.
    for layer in &report.layers {
        info!(
            layer = layer.source,
            kind = %layer.kind,
            elements = layer.elements_total,
            removed = layer.removed.len(),
            output = layer.output,
            "Layer analyzed"
        );
    }
    info!(
        run_id = %report.run_id,
        removed = report.total_removed(),
        destroyed = report.destroyed_assets.len(),
        "cascade-engine finished"
    );
    Ok(())
}

/// Load settings from `cascade-config.yaml`, falling back to defaults.
///
/// The flag reports whether the file was present.
fn load_config() -> Result<(EngineSettings, bool), EngineError> {
    let config_path = Path::new(CONFIG_FILE);
    if config_path.exists() {
        let settings = EngineSettings::from_file(config_path)?;
        Ok((settings, true))
    } else {
        Ok((EngineSettings::default(), false))
    }
}

/// The scenario named by the first argument, else by the settings.
fn scenario_path(settings: &EngineSettings) -> Result<PathBuf, EngineError> {
    std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| settings.scenario.clone())
        .ok_or(EngineError::NoScenario)
}

/// Serialize `report` as pretty JSON to `path`.
fn write_report(path: &Path, report: &ConsequenceReport) -> Result<(), EngineError> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json).map_err(|source| EngineError::ReportIo {
        path: path.to_path_buf(),
        source,
    })
}
