//! Disaster layers: hazard intensity fields queried by position.
//!
//! Two kinds exist, matching [`DisasterKind`]:
//!
//! - [`Hurricane`] -- wind swath polygons, each with a sustained wind speed
//!   in knots. Intensity is the gust speed in mph of the strongest polygon
//!   containing the query point, or `0.0` outside every polygon.
//! - [`Flood`] -- scattered surge-probability samples interpolated linearly
//!   over their Delaunay triangulation. Intensity is `0.0` outside the
//!   samples' convex hull.
//!
//! Layers are built once from a [`GeoLayer`] and are read-only afterwards.
//! A [`DisasterList`] holds at most one layer per kind.

use std::collections::BTreeMap;

use cascade_types::block::{self, Record};
use cascade_types::{DisasterKind, GeoLayer};
use tracing::{debug, info, warn};

use crate::error::HazardError;
use crate::geometry::point_in_polygon;
use crate::triangulation::LinearInterpolator;

/// Statute miles per hour in one knot.
pub const KNOTS_TO_MPH: f64 = 1.150_779_45;

/// Ratio of peak gust to sustained wind speed.
pub const WIND_TO_GUST: f64 = 1.3;

/// Attribute column read when no `intensity field` is named.
const DEFAULT_INTENSITY_COLUMN: usize = 1;

/// Convert a sustained wind in knots to a gust in mph.
pub fn knots_to_gust_mph(wind_kt: f64) -> f64 {
    wind_kt * KNOTS_TO_MPH * WIND_TO_GUST
}

/// Resolve the column holding each record's intensity value.
fn intensity_column(
    name: &str,
    layer: &GeoLayer,
    field: Option<&str>,
) -> Result<usize, HazardError> {
    match field {
        Some(field) => layer
            .field_index(&[field])
            .ok_or_else(|| HazardError::UnknownField {
                layer: name.to_owned(),
                field: field.to_owned(),
            }),
        None => Ok(DEFAULT_INTENSITY_COLUMN),
    }
}

/// Read the intensity value of one record.
fn record_intensity(
    name: &str,
    layer: &GeoLayer,
    record: usize,
    column: usize,
) -> Result<f64, HazardError> {
    layer
        .attribute(record, column)
        .and_then(cascade_types::AttributeValue::as_f64)
        .ok_or_else(|| HazardError::MissingIntensity {
            layer: name.to_owned(),
            record,
        })
}

// ---------------------------------------------------------------------------
// Hurricane
// ---------------------------------------------------------------------------

/// One wind swath polygon.
#[derive(Debug, Clone, PartialEq)]
pub struct WindSwath {
    /// Polygon ring in `[lon, lat]` order.
    pub ring: Vec<[f64; 2]>,
    /// Sustained wind speed inside the ring, in knots.
    pub wind_kt: f64,
}

/// A hurricane wind field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hurricane {
    name: String,
    swaths: Vec<WindSwath>,
}

impl Hurricane {
    /// Unit label of [`intensity`](Self::intensity).
    pub const UNIT: &'static str = "gust_mph";

    /// Build from a polygon layer, reading wind speeds from `field` or the
    /// second attribute column.
    pub fn from_layer(
        name: &str,
        layer: &GeoLayer,
        field: Option<&str>,
    ) -> Result<Self, HazardError> {
        let column = intensity_column(name, layer, field)?;
        let swaths = layer
            .shapes
            .iter()
            .enumerate()
            .map(|(record, shape)| {
                Ok(WindSwath {
                    ring: shape.points.clone(),
                    wind_kt: record_intensity(name, layer, record, column)?,
                })
            })
            .collect::<Result<Vec<_>, HazardError>>()?;
        debug!(name, swaths = swaths.len(), "Hurricane layer built");
        Ok(Self {
            name: name.to_owned(),
            swaths,
        })
    }

    /// Build directly from swaths.
    pub fn from_swaths(name: &str, swaths: Vec<WindSwath>) -> Self {
        Self {
            name: name.to_owned(),
            swaths,
        }
    }

    /// Gust speed in mph at a position; `0.0` outside every swath.
    pub fn intensity(&self, lat: f64, lon: f64) -> f64 {
        let wind_kt = self
            .swaths
            .iter()
            .filter(|swath| point_in_polygon([lon, lat], &swath.ring))
            .map(|swath| swath.wind_kt)
            .fold(0.0_f64, f64::max);
        knots_to_gust_mph(wind_kt)
    }

    /// The swath polygons.
    pub fn swaths(&self) -> &[WindSwath] {
        &self.swaths
    }
}

// ---------------------------------------------------------------------------
// Flood
// ---------------------------------------------------------------------------

/// A storm surge probability field.
#[derive(Debug, Clone, Default)]
pub struct Flood {
    name: String,
    samples: Vec<([f64; 2], f64)>,
    interpolator: LinearInterpolator,
}

impl Flood {
    /// Unit label of [`intensity`](Self::intensity).
    pub const UNIT: &'static str = "probability";

    /// Build from a point layer: the first vertex of each record is a sample
    /// position, its value comes from `field` or the second attribute column.
    pub fn from_layer(
        name: &str,
        layer: &GeoLayer,
        field: Option<&str>,
    ) -> Result<Self, HazardError> {
        let column = intensity_column(name, layer, field)?;
        let mut samples = Vec::with_capacity(layer.len());
        for (record, shape) in layer.shapes.iter().enumerate() {
            let Some(&position) = shape.points.first() else {
                warn!(name, record, "flood sample has no geometry; skipped");
                continue;
            };
            samples.push((position, record_intensity(name, layer, record, column)?));
        }
        Ok(Self::from_samples(name, samples))
    }

    /// Build from `([lon, lat], probability)` samples.
    pub fn from_samples(name: &str, samples: Vec<([f64; 2], f64)>) -> Self {
        let interpolator = LinearInterpolator::new(&samples);
        debug!(
            name,
            samples = samples.len(),
            triangles = interpolator.triangulation().triangles().len(),
            "Flood layer built"
        );
        Self {
            name: name.to_owned(),
            samples,
            interpolator,
        }
    }

    /// Surge probability at a position; `0.0` outside the sampled hull.
    pub fn intensity(&self, lat: f64, lon: f64) -> f64 {
        self.interpolator.interpolate([lon, lat]).unwrap_or(0.0)
    }

    /// The raw samples in `[lon, lat]` order.
    pub fn samples(&self) -> &[([f64; 2], f64)] {
        &self.samples
    }
}

// ---------------------------------------------------------------------------
// DisasterLayer
// ---------------------------------------------------------------------------

/// A queryable hazard field of either kind.
#[derive(Debug, Clone)]
pub enum DisasterLayer {
    /// Wind swath polygons.
    Hurricane(Hurricane),
    /// Interpolated surge probabilities.
    Flood(Flood),
}

impl DisasterLayer {
    /// Build the layer variant for `kind` from geometry.
    pub fn open(
        kind: DisasterKind,
        name: &str,
        layer: &GeoLayer,
        field: Option<&str>,
    ) -> Result<Self, HazardError> {
        Ok(match kind {
            DisasterKind::Wind => Self::Hurricane(Hurricane::from_layer(name, layer, field)?),
            DisasterKind::Flood => Self::Flood(Flood::from_layer(name, layer, field)?),
        })
    }

    /// The disaster kind this layer answers for.
    pub const fn kind(&self) -> DisasterKind {
        match self {
            Self::Hurricane(_) => DisasterKind::Wind,
            Self::Flood(_) => DisasterKind::Flood,
        }
    }

    /// Layer name.
    pub fn name(&self) -> &str {
        match self {
            Self::Hurricane(h) => &h.name,
            Self::Flood(f) => &f.name,
        }
    }

    /// Unit label of the intensity.
    pub const fn unit(&self) -> &'static str {
        match self {
            Self::Hurricane(_) => Hurricane::UNIT,
            Self::Flood(_) => Flood::UNIT,
        }
    }

    /// Hazard intensity at a position.
    pub fn intensity(&self, lat: f64, lon: f64) -> f64 {
        match self {
            Self::Hurricane(h) => h.intensity(lat, lon),
            Self::Flood(f) => f.intensity(lat, lon),
        }
    }
}

// ---------------------------------------------------------------------------
// Description files
// ---------------------------------------------------------------------------

/// One record of a disaster description file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisasterDescription {
    /// Kind override from the `type` key.
    pub kind: Option<DisasterKind>,
    /// Display name from the `name` key.
    pub name: Option<String>,
    /// Free text from the `description` key.
    pub description: String,
    /// Value of the `version` key.
    pub version: String,
    /// Value of the `date` key.
    pub date: String,
    /// Attribute holding the intensity, from the `intensity field` key.
    pub intensity_field: Option<String>,
}

impl DisasterDescription {
    /// Build from a parsed record. Later keys win.
    pub fn from_record(record: &Record) -> Result<Self, HazardError> {
        let mut desc = Self::default();
        for entry in record.iter() {
            let value = block::unquote(&entry.value);
            match entry.key.as_str() {
                "version" => desc.version = value.to_owned(),
                "date" => desc.date = value.to_owned(),
                "name" => desc.name = Some(value.to_owned()),
                "description" => desc.description = value.to_owned(),
                "type" => desc.kind = Some(value.parse()?),
                "intensity field" => desc.intensity_field = Some(value.to_owned()),
                _ => {}
            }
        }
        Ok(desc)
    }

    /// Parse every record of a description file.
    pub fn parse_all(text: &str) -> Result<Vec<Self>, HazardError> {
        block::parse_records(text)?
            .iter()
            .map(Self::from_record)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// DisasterList
// ---------------------------------------------------------------------------

/// All disaster layers of a scenario, one per kind.
#[derive(Debug, Clone, Default)]
pub struct DisasterList {
    entries: BTreeMap<DisasterKind, DisasterLayer>,
}

impl DisasterList {
    /// Create an empty list.
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Build one layer per description record over the same geometry.
    ///
    /// `kind` is the kind implied by the scenario key; a record's `type`
    /// overrides it. Returns the number of layers added.
    pub fn append_from_description(
        &mut self,
        text: &str,
        kind: DisasterKind,
        layer: &GeoLayer,
    ) -> Result<usize, HazardError> {
        let descriptions = DisasterDescription::parse_all(text)?;
        let built = descriptions
            .iter()
            .map(|desc| {
                let kind = desc.kind.unwrap_or(kind);
                let name = desc.name.clone().unwrap_or_else(|| kind.name().to_owned());
                DisasterLayer::open(kind, &name, layer, desc.intensity_field.as_deref())
            })
            .collect::<Result<Vec<_>, _>>()?;
        let count = built.len();
        for entry in built {
            self.insert(entry);
        }
        info!(count, total = self.entries.len(), "Disaster layers loaded");
        Ok(count)
    }

    /// Insert a layer under its kind, replacing any previous one.
    pub fn insert(&mut self, layer: DisasterLayer) {
        let kind = layer.kind();
        if self.entries.insert(kind, layer).is_some() {
            debug!(%kind, "disaster layer replaced; one event per kind");
        }
    }

    /// Look up the layer for a kind.
    pub fn get(&self, kind: DisasterKind) -> Option<&DisasterLayer> {
        self.entries.get(&kind)
    }

    /// Whether a layer of this kind exists.
    pub fn contains(&self, kind: DisasterKind) -> bool {
        self.entries.contains_key(&kind)
    }

    /// Number of layers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate layers in kind order.
    pub fn iter(&self) -> impl Iterator<Item = &DisasterLayer> {
        self.entries.values()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use cascade_types::{AttributeValue, FieldDescriptor, FieldKind, LatLon, Shape};

    use super::*;

    fn numeric(name: &str) -> FieldDescriptor {
        FieldDescriptor {
            name: name.to_owned(),
            kind: FieldKind::Float,
            size: 10,
            decimals: 2,
        }
    }

    fn swath_layer() -> GeoLayer {
        // Squares centred on (30 N, 85 W).
        let square = |lo: f64, hi: f64| {
            let (west, east) = (lo - 85.0, hi - 85.0);
            let (south, north) = (lo + 30.0, hi + 30.0);
            Shape::polygon(vec![[west, south], [east, south], [east, north], [west, north]])
        };
        GeoLayer {
            fields: vec![FieldDescriptor::text("ID", 8), numeric("WIND_KT")],
            shapes: vec![square(-2.0, 2.0), square(-1.0, 1.0)],
            records: vec![
                vec![AttributeValue::from("outer"), AttributeValue::from(64.0)],
                vec![AttributeValue::from("inner"), AttributeValue::from(100.0)],
            ],
        }
    }

    fn surge_layer() -> GeoLayer {
        let corners = [[-86.0, 29.0], [-84.0, 29.0], [-86.0, 31.0], [-84.0, 31.0]];
        let values = [0.0, 1.0, 0.0, 1.0];
        GeoLayer {
            fields: vec![FieldDescriptor::text("ID", 8), numeric("PROB")],
            shapes: corners
                .iter()
                .map(|&[lon, lat]| Shape::point(LatLon::new(lat, lon)))
                .collect(),
            records: values
                .iter()
                .map(|&v| vec![AttributeValue::from("p"), AttributeValue::from(v)])
                .collect(),
        }
    }

    #[test]
    fn gust_conversion() {
        assert!((knots_to_gust_mph(100.0) - 149.601_328_5).abs() < 1e-6);
        assert!(knots_to_gust_mph(0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn hurricane_takes_strongest_containing_swath() {
        let h = Hurricane::from_layer("Wind", &swath_layer(), None).unwrap();
        assert!((h.intensity(30.0, -85.0) - knots_to_gust_mph(100.0)).abs() < 1e-9);
        assert!((h.intensity(31.5, -85.0) - knots_to_gust_mph(64.0)).abs() < 1e-9);
    }

    #[test]
    fn hurricane_outside_every_swath_is_zero() {
        let h = Hurricane::from_layer("Wind", &swath_layer(), None).unwrap();
        assert!(h.intensity(40.0, -85.0).abs() < f64::EPSILON);
    }

    #[test]
    fn named_intensity_field_is_used() {
        let mut layer = swath_layer();
        layer.fields.swap(0, 1);
        for record in &mut layer.records {
            record.swap(0, 1);
        }
        let h = Hurricane::from_layer("Wind", &layer, Some("wind_kt")).unwrap();
        assert!((h.intensity(30.0, -85.0) - knots_to_gust_mph(100.0)).abs() < 1e-9);
    }

    #[test]
    fn unknown_intensity_field_is_rejected() {
        let err = Hurricane::from_layer("Wind", &swath_layer(), Some("SPEED")).unwrap_err();
        assert!(matches!(err, HazardError::UnknownField { .. }));
    }

    #[test]
    fn non_numeric_intensity_is_rejected() {
        let mut layer = swath_layer();
        layer.records[1][1] = AttributeValue::from("strong");
        let err = Hurricane::from_layer("Wind", &layer, None).unwrap_err();
        assert!(matches!(err, HazardError::MissingIntensity { record: 1, .. }));
    }

    #[test]
    fn flood_interpolates_inside_hull() {
        let f = Flood::from_layer("Flood", &surge_layer(), None).unwrap();
        assert!((f.intensity(30.0, -85.0) - 0.5).abs() < 1e-9);
        assert!((f.intensity(29.5, -84.5) - 0.75).abs() < 1e-9);
    }

    #[test]
    fn flood_outside_hull_is_zero() {
        let f = Flood::from_layer("Flood", &surge_layer(), None).unwrap();
        assert!(f.intensity(35.0, -85.0).abs() < f64::EPSILON);
    }

    #[test]
    fn description_type_overrides_scenario_key() {
        let text = "version = 1\nname = 'Surge'\ntype = 'Flood'\nend\n";
        let mut list = DisasterList::new();
        let count = list
            .append_from_description(text, DisasterKind::Wind, &surge_layer())
            .unwrap();
        assert_eq!(count, 1);
        let layer = list.get(DisasterKind::Flood).unwrap();
        assert_eq!(layer.name(), "Surge");
        assert_eq!(layer.unit(), "probability");
        assert!(!list.contains(DisasterKind::Wind));
    }

    #[test]
    fn description_without_name_uses_kind_name() {
        let text = "version = 1\ndate = 2015-08-25\nend\n";
        let mut list = DisasterList::new();
        list.append_from_description(text, DisasterKind::Wind, &swath_layer())
            .unwrap();
        let layer = list.get(DisasterKind::Wind).unwrap();
        assert_eq!(layer.name(), "Wind");
        assert_eq!(layer.kind(), DisasterKind::Wind);
        assert_eq!(layer.unit(), "gust_mph");
    }

    #[test]
    fn unknown_disaster_type_is_an_error() {
        let text = "version = 1\ntype = 'Earthquake'\nend\n";
        let mut list = DisasterList::new();
        let err = list
            .append_from_description(text, DisasterKind::Wind, &swath_layer())
            .unwrap_err();
        assert!(matches!(err, HazardError::UnknownKind(_)));
        assert!(list.is_empty());
    }
}
