//! Engine settings loaded from `cascade-config.yaml`.
//!
//! The scenario itself is described by the block-record text files; this
//! module only holds the knobs around a run: which scenario to load, how
//! destruction is decided, linking and threshold constants, where output
//! goes, and the log level. Every field has a default, so an empty or
//! missing file is a valid configuration.

use std::path::{Path, PathBuf};

use cascade_types::DestructionMode;
use serde::Deserialize;

/// Errors raised while reading engine settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The settings file could not be read.
    #[error("cannot read settings file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The settings file is not valid YAML for [`EngineSettings`].
    #[error("invalid settings YAML: {source}")]
    Yaml {
        /// The YAML error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level engine settings.
///
/// Mirrors the structure of `cascade-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EngineSettings {
    /// Scenario file to load when none is given on the command line.
    #[serde(default)]
    pub scenario: Option<PathBuf>,

    /// Destruction decision parameters.
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Proximity linking parameters.
    #[serde(default)]
    pub linking: LinkingConfig,

    /// Threshold derivation constants.
    #[serde(default)]
    pub thresholds: ThresholdConfig,

    /// Output locations.
    #[serde(default)]
    pub output: OutputConfig,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl EngineSettings {
    /// Load settings from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse settings from a YAML string. Blank input yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }
}

/// How assets are judged destroyed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnalysisConfig {
    /// Loss-ratio criteria used to read wind thresholds off the curves.
    #[serde(default = "default_criteria")]
    pub criteria: f64,

    /// Destruction decision mode.
    #[serde(default)]
    pub mode: DestructionMode,

    /// Seed for the stochastic mode's uniform draws.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            criteria: default_criteria(),
            mode: DestructionMode::default(),
            seed: default_seed(),
        }
    }
}

/// Infrastructure-to-asset linking.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct LinkingConfig {
    /// Assets strictly closer than this (in degrees) to an element's
    /// location belong to the element.
    #[serde(default = "default_proximity_radius_deg")]
    pub proximity_radius_deg: f64,
}

impl Default for LinkingConfig {
    fn default() -> Self {
        Self {
            proximity_radius_deg: default_proximity_radius_deg(),
        }
    }
}

/// Constants used when deriving destruction thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ThresholdConfig {
    /// Terrain roughness `Zo` (m) at which curve families are read.
    #[serde(default = "default_wind_roughness")]
    pub wind_roughness: f64,

    /// Fixed surge probability above which flood fragilities fail.
    #[serde(default = "default_flood_threshold")]
    pub flood_threshold: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            wind_roughness: default_wind_roughness(),
            flood_threshold: default_flood_threshold(),
        }
    }
}

/// Where results are written.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OutputConfig {
    /// Appended to each infrastructure layer's source path on save. An
    /// empty suffix overwrites the source layer.
    #[serde(default = "default_suffix")]
    pub suffix: String,

    /// Optional path for the JSON consequence report.
    #[serde(default)]
    pub report: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            suffix: default_suffix(),
            report: None,
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Fallback `EnvFilter` directive when `RUST_LOG` is unset, e.g. `info`
    /// or `cascade_core=debug`.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

const fn default_criteria() -> f64 {
    0.5
}

const fn default_seed() -> u64 {
    42
}

const fn default_proximity_radius_deg() -> f64 {
    0.1
}

const fn default_wind_roughness() -> f64 {
    0.03
}

const fn default_flood_threshold() -> f64 {
    0.5
}

fn default_suffix() -> String {
    "_analyzed".to_owned()
}

fn default_log_level() -> String {
    "info".to_owned()
}
