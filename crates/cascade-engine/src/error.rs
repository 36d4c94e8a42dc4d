//! Error types for the consequence engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during engine startup and the consequence pass.

use std::path::PathBuf;

/// Top-level error for the consequence engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Settings loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: cascade_core::ConfigError,
    },

    /// Scenario loading, linking, or evaluation failed.
    #[error("scenario error: {source}")]
    Core {
        /// The underlying model error.
        #[from]
        source: cascade_core::CoreError,
    },

    /// No scenario was given on the command line or in the settings.
    #[error("no scenario: pass a scenario file or set `scenario` in cascade-config.yaml")]
    NoScenario,

    /// Writing the consequence report failed.
    #[error("failed to write report {}: {source}", path.display())]
    ReportIo {
        /// The report path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Serializing the consequence report failed.
    #[error("failed to serialize report: {source}")]
    ReportJson {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },
}
