//! Closed-set kind enumerations.
//!
//! Configuration files name disaster layers, fragility models, and
//! infrastructure networks by type string. Each string set is closed: the
//! parser maps a name to one of these variants through [`FromStr`] and an
//! unknown name is an error, never a silent default.
//!
//! [`FromStr`]: core::str::FromStr

use serde::{Deserialize, Serialize};

/// Error returned when a type name is not part of a closed set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {family} type name: {name:?}")]
pub struct UnknownKind {
    /// Which closed set was searched ("disaster", "fragility", ...).
    pub family: &'static str,
    /// The name that did not match.
    pub name: String,
}

/// The kinds of hazard field a scenario can load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DisasterKind {
    /// Hurricane wind swath, intensity in gust mph.
    Wind,
    /// Storm-surge probability field.
    Flood,
}

impl DisasterKind {
    /// Every variant, in registration order.
    pub const ALL: [Self; 2] = [Self::Wind, Self::Flood];

    /// The configuration name of this kind.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Wind => "Wind",
            Self::Flood => "Flood",
        }
    }
}

impl core::fmt::Display for DisasterKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

impl core::str::FromStr for DisasterKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownKind {
                family: "disaster",
                name: s.to_owned(),
            })
    }
}

/// The fragility model factory keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FragilityKind {
    /// Generic curve family indexed by caller-supplied isolines.
    Curves,
    /// Wind curve family indexed by terrain roughness.
    WindCurves,
    /// A single fixed threshold.
    Threshold,
}

impl FragilityKind {
    /// Every variant, in registration order.
    pub const ALL: [Self; 3] = [Self::Curves, Self::WindCurves, Self::Threshold];

    /// The factory name of this kind.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Curves => "Curves",
            Self::WindCurves => "WindCurves",
            Self::Threshold => "Threshold",
        }
    }
}

impl core::fmt::Display for FragilityKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

impl core::str::FromStr for FragilityKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Factory keys are matched exactly, like the type names they stand for.
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s.trim())
            .ok_or_else(|| UnknownKind {
                family: "fragility",
                name: s.to_owned(),
            })
    }
}

/// The infrastructure networks a scenario can load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum InfrastructureKind {
    /// Electric buses and lines.
    ElectricPowerGrid,
    /// Gas processing plants and pipelines.
    NaturalGasSystem,
}

impl InfrastructureKind {
    /// Every variant, in registration order.
    pub const ALL: [Self; 2] = [Self::ElectricPowerGrid, Self::NaturalGasSystem];

    /// The configuration name of this kind.
    pub const fn name(self) -> &'static str {
        match self {
            Self::ElectricPowerGrid => "ElectricPowerGrid",
            Self::NaturalGasSystem => "NaturalGasSystem",
        }
    }
}

impl core::fmt::Display for InfrastructureKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

impl core::str::FromStr for InfrastructureKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownKind {
                family: "infrastructure",
                name: s.to_owned(),
            })
    }
}

/// How an asset's hazard exposure is turned into a destroyed/intact decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestructionMode {
    /// Destroyed when intensity strictly exceeds the fragility threshold.
    #[default]
    SimpleThreshold,
    /// Destroyed when a uniform draw falls below the intensity.
    Stochastic,
    /// Always destroyed.
    EverythingMustGo,
}

impl core::fmt::Display for DestructionMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::SimpleThreshold => "simpleThreshold",
            Self::Stochastic => "stochastic",
            Self::EverythingMustGo => "everythingMustGo",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disaster_names_parse_case_insensitively() {
        assert_eq!("wind".parse::<DisasterKind>().ok(), Some(DisasterKind::Wind));
        assert_eq!(" FLOOD ".parse::<DisasterKind>().ok(), Some(DisasterKind::Flood));
    }

    #[test]
    fn unknown_disaster_is_an_error() {
        let err = "Earthquake".parse::<DisasterKind>();
        assert!(err.is_err());
        let msg = err.err().map(|e| e.to_string()).unwrap_or_default();
        assert!(msg.contains("Earthquake"));
    }

    #[test]
    fn fragility_factory_keys_are_exact() {
        assert_eq!(
            "WindCurves".parse::<FragilityKind>().ok(),
            Some(FragilityKind::WindCurves)
        );
        assert!("windcurves".parse::<FragilityKind>().is_err());
    }

    #[test]
    fn infrastructure_names_round_trip_through_display() {
        for kind in InfrastructureKind::ALL {
            assert_eq!(kind.to_string().parse::<InfrastructureKind>().ok(), Some(kind));
        }
    }

    #[test]
    fn destruction_mode_serializes_snake_case() {
        let json = serde_json::to_string(&DestructionMode::EverythingMustGo).ok();
        assert_eq!(json.as_deref(), Some("\"everything_must_go\""));
        assert_eq!(DestructionMode::default(), DestructionMode::SimpleThreshold);
    }
}
