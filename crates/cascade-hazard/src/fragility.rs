//! Fragility models: how much hazard an asset class can take.
//!
//! A [`Fragility`] is built from one record of a fragility file and carries
//! one of three models, selected by the record's `fragility type`:
//!
//! | Type         | Model                                           |
//! |--------------|-------------------------------------------------|
//! | `Curves`     | Curve family indexed by configured `isolines`   |
//! | `WindCurves` | Curve family indexed by terrain roughness `Zo`  |
//! | `Threshold`  | A single fixed threshold                        |
//!
//! Curve families answer "given loss ratio `Y` and isoline `Z`, what hazard
//! level `X` produces it" through [`FragilityCurve::x_from_yz`]: each curve
//! is inverted at `Y`, the resulting `X` values are paired with the isoline
//! values into a synthetic `Z(X)` curve, and that curve is read at `Z`.
//!
//! Each fragility names the disaster type it responds to. The link to the
//! concrete disaster layer is a key set by the linker, not a reference.

use std::collections::BTreeMap;

use cascade_types::block::{self, Entry, Record};
use cascade_types::{DisasterKind, FragilityKind};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::curve::Curve;
use crate::error::HazardError;

/// Terrain roughness lengths (m) of the four wind curves, in curve order.
pub const WIND_ROUGHNESS_ISOLINES: [f64; 4] = [0.03, 0.35, 0.70, 1.00];

/// A family of curves `Y = f(X)` indexed by an isoline value `Z`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FragilityCurve {
    /// Plot range of the hazard axis, if declared.
    pub x_range: Option<(f64, f64)>,
    /// Plot range of the loss axis, if declared.
    pub y_range: Option<(f64, f64)>,
    /// Hazard axis unit label.
    pub x_unit: String,
    /// Loss axis unit label.
    pub y_unit: String,
    /// Curves in isoline order.
    pub curves: Vec<Curve>,
    /// Isoline values for a generic family; wind families use
    /// [`WIND_ROUGHNESS_ISOLINES`] instead.
    pub isolines: Vec<f64>,
}

impl FragilityCurve {
    /// Find `X` for loss `y` on isoline `z`.
    ///
    /// The first `isolines.len()` curves are used, one per isoline value.
    pub fn x_from_yz(
        &self,
        owner: &str,
        isolines: &[f64],
        y: f64,
        z: f64,
    ) -> Result<f64, HazardError> {
        let Some(curves) = self.curves.get(..isolines.len()) else {
            return Err(HazardError::InsufficientCurves {
                fragility: owner.to_owned(),
                needed: isolines.len(),
                found: self.curves.len(),
            });
        };
        let crossings: Vec<f64> = curves.iter().map(|c| c.x_from_y(y)).collect();
        // Z(X): isoline values on the x axis, crossings on the y axis.
        let cross_section = Curve::new(isolines.to_vec(), crossings);
        Ok(cross_section.y_from_x(z))
    }

    /// Wind speed (mph) at which loss ratio `loss_ratio` is reached for
    /// terrain roughness `roughness`.
    pub fn wind_speed_mph(
        &self,
        owner: &str,
        roughness: f64,
        loss_ratio: f64,
    ) -> Result<f64, HazardError> {
        self.x_from_yz(owner, &WIND_ROUGHNESS_ISOLINES, loss_ratio, roughness)
    }
}

/// A fragility that fails at a single configured hazard level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FragilityThreshold {
    /// Hazard level at which the asset fails.
    pub threshold: f64,
    /// Unit label of `threshold`.
    pub units: String,
}

/// The model carried by a [`Fragility`], one variant per factory key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FragilityModel {
    /// Generic curve family.
    Curves(FragilityCurve),
    /// Wind curve family indexed by terrain roughness.
    WindCurves(FragilityCurve),
    /// Single threshold.
    Threshold(FragilityThreshold),
}

/// A vulnerability model for one asset class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragility {
    /// Optional display name.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Format version string from the record.
    pub version: String,
    /// Creation date string from the record.
    pub date: String,
    /// Vulnerability class; also the registry key.
    pub vulnerability_class: String,
    /// Disaster type name this fragility responds to (e.g. `Wind`).
    pub disaster_type: String,
    /// The model.
    pub model: FragilityModel,
    /// Disaster layer key resolved at link time.
    #[serde(skip)]
    disaster: Option<DisasterKind>,
}

impl Fragility {
    /// The factory key of this fragility's model.
    pub const fn kind(&self) -> FragilityKind {
        match self.model {
            FragilityModel::Curves(_) => FragilityKind::Curves,
            FragilityModel::WindCurves(_) => FragilityKind::WindCurves,
            FragilityModel::Threshold(_) => FragilityKind::Threshold,
        }
    }

    /// The linked disaster layer key, if linking has run.
    pub const fn disaster(&self) -> Option<DisasterKind> {
        self.disaster
    }

    /// Record the disaster layer key resolved by the linker.
    pub const fn link_disaster(&mut self, kind: DisasterKind) {
        self.disaster = Some(kind);
    }

    /// Derive the failure threshold for loss-ratio `criteria`.
    ///
    /// Curve families are read at isoline `roughness`; wind families use
    /// the four fixed roughness curves. Threshold models ignore both.
    pub fn curve_threshold(&self, criteria: f64, roughness: f64) -> Result<f64, HazardError> {
        match &self.model {
            FragilityModel::WindCurves(c) => {
                c.wind_speed_mph(&self.vulnerability_class, roughness, criteria)
            }
            FragilityModel::Curves(c) => {
                if c.isolines.is_empty() {
                    return Err(HazardError::MissingIsolines(
                        self.vulnerability_class.clone(),
                    ));
                }
                c.x_from_yz(&self.vulnerability_class, &c.isolines, criteria, roughness)
            }
            FragilityModel::Threshold(t) => Ok(t.threshold),
        }
    }

    /// Build a fragility from one fragility-file record.
    ///
    /// Keys are folded in file order into a builder, so a repeated key keeps
    /// its last value. `fragility type` and `fragility class` are required.
    pub fn from_record(record: &Record) -> Result<Self, HazardError> {
        let mut builder = FragilityBuilder::default();
        for entry in record.iter() {
            builder.apply(entry)?;
        }
        builder.build(record.start_line)
    }
}

/// Accumulates fragility keys in file order.
#[derive(Debug, Default)]
struct FragilityBuilder {
    kind: Option<String>,
    class: Option<String>,
    name: String,
    description: String,
    version: String,
    date: String,
    disaster_type: Option<String>,
    curve: FragilityCurve,
    threshold: FragilityThreshold,
}

impl FragilityBuilder {
    fn apply(&mut self, entry: &Entry) -> Result<(), HazardError> {
        let value = entry.value.as_str();
        match entry.key.as_str() {
            "version" => self.version = value.to_owned(),
            "date" => self.date = value.to_owned(),
            "name" => self.name = block::unquote(value).to_owned(),
            "description" => self.description = value.to_owned(),
            "fragility type" => self.kind = Some(block::unquote(value).to_owned()),
            "fragility class" => self.class = Some(block::unquote(value).to_owned()),
            "disaster type" => self.disaster_type = Some(block::unquote(value).to_owned()),
            "x range" => {
                let (range, unit) = parse_range(entry)?;
                self.curve.x_range = Some(range);
                self.curve.x_unit = unit;
            }
            "y range" => {
                let (range, unit) = parse_range(entry)?;
                self.curve.y_range = Some(range);
                self.curve.y_unit = unit;
            }
            "isolines" => self.curve.isolines = parse_list(entry)?,
            "curve number" => self.curve.curves.push(Curve {
                number: value.to_owned(),
                ..Curve::default()
            }),
            "curve name" => self.current_curve(entry)?.name = value.to_owned(),
            "number of points" => {
                let count: usize = value.parse().map_err(|_| invalid_number(entry, value))?;
                self.current_curve(entry)?.declared_points = Some(count);
            }
            "x" => {
                let xs = parse_list(entry)?;
                self.current_curve(entry)?.x = xs;
            }
            "y" => {
                let ys = parse_list(entry)?;
                self.current_curve(entry)?.y = ys;
            }
            "threshold" => self.threshold.threshold = parse_number(entry, value)?,
            "units" => self.threshold.units = block::unquote(value).to_owned(),
            other => debug!(line = entry.line, key = other, "ignoring unknown fragility key"),
        }
        Ok(())
    }

    fn current_curve(&mut self, entry: &Entry) -> Result<&mut Curve, HazardError> {
        self.curve
            .curves
            .last_mut()
            .ok_or_else(|| HazardError::CurveKeyBeforeCurve {
                line: entry.line,
                key: entry.key.clone(),
            })
    }

    fn build(self, line: usize) -> Result<Fragility, HazardError> {
        let kind: FragilityKind = self
            .kind
            .ok_or(HazardError::MissingKey {
                line,
                key: "fragility type",
            })?
            .parse()?;
        let class = self.class.ok_or(HazardError::MissingKey {
            line,
            key: "fragility class",
        })?;

        let model = match kind {
            FragilityKind::Curves => FragilityModel::Curves(self.curve),
            FragilityKind::WindCurves => FragilityModel::WindCurves(self.curve),
            FragilityKind::Threshold => FragilityModel::Threshold(self.threshold),
        };
        if let FragilityModel::Curves(c) | FragilityModel::WindCurves(c) = &model {
            for curve in &c.curves {
                curve.check(&class);
            }
        }

        let default_disaster = match kind {
            FragilityKind::WindCurves => DisasterKind::Wind.name().to_owned(),
            FragilityKind::Curves | FragilityKind::Threshold => String::new(),
        };

        Ok(Fragility {
            name: self.name,
            description: self.description,
            version: self.version,
            date: self.date,
            vulnerability_class: class,
            disaster_type: self.disaster_type.unwrap_or(default_disaster),
            model,
            disaster: None,
        })
    }
}

fn invalid_number(entry: &Entry, token: &str) -> HazardError {
    HazardError::InvalidNumber {
        line: entry.line,
        key: entry.key.clone(),
        token: token.to_owned(),
    }
}

fn parse_number(entry: &Entry, token: &str) -> Result<f64, HazardError> {
    block::unquote(token)
        .parse()
        .map_err(|_| invalid_number(entry, token))
}

/// Parse a whitespace-separated list of numbers.
fn parse_list(entry: &Entry) -> Result<Vec<f64>, HazardError> {
    entry
        .value
        .split_whitespace()
        .map(|token| parse_number(entry, token))
        .collect()
}

/// Parse `lo hi 'unit'`.
fn parse_range(entry: &Entry) -> Result<((f64, f64), String), HazardError> {
    let (numbers, unit) = match entry.value.split_once('\'') {
        Some((numbers, rest)) => (numbers, rest.split('\'').next().unwrap_or_default()),
        None => (entry.value.as_str(), ""),
    };
    let mut tokens = numbers.split_whitespace();
    let (Some(lo), Some(hi)) = (tokens.next(), tokens.next()) else {
        return Err(HazardError::MissingValues {
            line: entry.line,
            key: entry.key.clone(),
            expected: 2,
        });
    };
    Ok((
        (parse_number(entry, lo)?, parse_number(entry, hi)?),
        unit.trim().to_owned(),
    ))
}

/// All fragilities of a scenario, keyed by vulnerability class.
#[derive(Debug, Clone, Default)]
pub struct FragilityList {
    entries: BTreeMap<String, Fragility>,
}

impl FragilityList {
    /// Create an empty list.
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Parse every record of a fragility file and add them to the list.
    ///
    /// All records are built before any is inserted, so a format error
    /// leaves the list unchanged. Returns the number of records added.
    pub fn append_from_text(&mut self, text: &str) -> Result<usize, HazardError> {
        let records = block::parse_records(text)?;
        let built = records
            .iter()
            .map(Fragility::from_record)
            .collect::<Result<Vec<_>, _>>()?;
        let count = built.len();
        for fragility in built {
            self.insert(fragility);
        }
        info!(count, total = self.entries.len(), "Fragilities loaded");
        Ok(count)
    }

    /// Insert a fragility under its vulnerability class, replacing any
    /// previous entry with the same class.
    pub fn insert(&mut self, fragility: Fragility) {
        let key = fragility.vulnerability_class.clone();
        if self.entries.insert(key.clone(), fragility).is_some() {
            debug!(class = key, "fragility class redefined; later definition wins");
        }
    }

    /// Look up a fragility by class.
    pub fn get(&self, class: &str) -> Option<&Fragility> {
        self.entries.get(class)
    }

    /// Whether a class is registered.
    pub fn contains(&self, class: &str) -> bool {
        self.entries.contains_key(class)
    }

    /// Number of fragilities.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(class, fragility)` pairs in class order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Fragility)> {
        self.entries.iter()
    }

    /// Iterate fragilities mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut Fragility)> {
        self.entries.iter_mut()
    }
}
