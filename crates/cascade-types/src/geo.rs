//! Geolocation and geospatial layer types.
//!
//! [`GeoLayer`] is the in-memory form of one point/line/polygon file with its
//! attribute table: parallel lists of shapes and attribute rows, described by
//! a field schema. Stored vertices use `(lon, lat)` order; asset and element
//! positions use [`LatLon`].

use serde::{Deserialize, Serialize};

/// A geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    /// Latitude, positive north.
    pub lat: f64,
    /// Longitude, positive east.
    pub lon: f64,
}

impl LatLon {
    /// Build a position from latitude and longitude.
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Euclidean distance in degree space.
    ///
    /// This is not a geodesic distance; proximity linking uses it on
    /// purpose as a cheap radius test.
    pub fn degree_distance(self, other: Self) -> f64 {
        (self.lat - other.lat).hypot(self.lon - other.lon)
    }
}

/// Geometry type of a shape record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    /// A single position.
    #[default]
    Point,
    /// An open polyline.
    Line,
    /// A closed ring.
    Polygon,
}

/// One geometry record: a kind and its vertices as `[lon, lat]` pairs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    /// Geometry type.
    #[serde(default)]
    pub kind: ShapeKind,
    /// Vertices in `[lon, lat]` order.
    pub points: Vec<[f64; 2]>,
}

impl Shape {
    /// A point shape at the given position.
    pub fn point(at: LatLon) -> Self {
        Self {
            kind: ShapeKind::Point,
            points: vec![[at.lon, at.lat]],
        }
    }

    /// A polygon shape from `[lon, lat]` vertices.
    pub const fn polygon(points: Vec<[f64; 2]>) -> Self {
        Self {
            kind: ShapeKind::Polygon,
            points,
        }
    }

    /// The first vertex as a [`LatLon`], if the shape has any.
    pub fn first_position(&self) -> Option<LatLon> {
        self.points.first().map(|&[lon, lat]| LatLon::new(lat, lon))
    }
}

/// Storage type of an attribute field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Text.
    Character,
    /// Integer number.
    Numeric,
    /// Floating-point number.
    Float,
}

/// Schema entry for one attribute column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Column name.
    pub name: String,
    /// Storage type.
    pub kind: FieldKind,
    /// Declared width.
    #[serde(default)]
    pub size: u16,
    /// Declared decimal places.
    #[serde(default)]
    pub decimals: u8,
}

impl FieldDescriptor {
    /// A text column of the given width.
    pub fn text(name: &str, size: u16) -> Self {
        Self {
            name: name.to_owned(),
            kind: FieldKind::Character,
            size,
            decimals: 0,
        }
    }
}

/// A single attribute cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// Numeric cell.
    Number(f64),
    /// Text cell.
    Text(String),
}

impl AttributeValue {
    /// Numeric view of the cell; text cells are parsed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }

    /// Text view of the cell, if it holds text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            Self::Number(_) => None,
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<f64> for AttributeValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

/// One geometry file with its attribute table.
///
/// `shapes[i]` corresponds to `records[i]`; each record holds one cell per
/// entry of `fields`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoLayer {
    /// Attribute schema.
    pub fields: Vec<FieldDescriptor>,
    /// Geometry records.
    pub shapes: Vec<Shape>,
    /// Attribute rows, parallel to `shapes`.
    pub records: Vec<Vec<AttributeValue>>,
}

impl GeoLayer {
    /// Number of geometry records.
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Whether the layer holds no records.
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Index of the first field whose name matches one of `names`,
    /// ignoring ASCII case.
    pub fn field_index(&self, names: &[&str]) -> Option<usize> {
        self.fields
            .iter()
            .position(|f| names.iter().any(|n| f.name.eq_ignore_ascii_case(n)))
    }

    /// Cell `field` of record `record`, if both exist.
    pub fn attribute(&self, record: usize, field: usize) -> Option<&AttributeValue> {
        self.records.get(record).and_then(|row| row.get(field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degree_distance_is_euclidean() {
        let a = LatLon::new(30.0, -85.0);
        let b = LatLon::new(30.03, -85.04);
        assert!((a.degree_distance(b) - 0.05).abs() < 1e-12);
    }

    #[test]
    fn first_position_swaps_storage_order() {
        let shape = Shape::point(LatLon::new(30.0, -85.0));
        assert_eq!(shape.points, vec![[-85.0, 30.0]]);
        assert_eq!(shape.first_position(), Some(LatLon::new(30.0, -85.0)));
    }

    #[test]
    fn attribute_values_deserialize_untagged() {
        let row: Vec<AttributeValue> = serde_json::from_str(r#"["Bus 1", 100.5, "7"]"#)
            .unwrap_or_default();
        assert_eq!(row.len(), 3);
        assert_eq!(row.first().and_then(AttributeValue::as_text), Some("Bus 1"));
        assert_eq!(row.get(1).and_then(AttributeValue::as_f64), Some(100.5));
        assert_eq!(row.get(2).and_then(AttributeValue::as_f64), Some(7.0));
    }

    #[test]
    fn field_index_ignores_case() {
        let layer = GeoLayer {
            fields: vec![FieldDescriptor::text("Name", 60), FieldDescriptor::text("Outaged", 60)],
            ..GeoLayer::default()
        };
        assert_eq!(layer.field_index(&["outage", "outaged"]), Some(1));
        assert_eq!(layer.field_index(&["missing"]), None);
    }
}
