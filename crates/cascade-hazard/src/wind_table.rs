//! Offline table of ASCE 7 design wind speeds at asset positions.
//!
//! The table is plain text: descriptive header lines, then one row per
//! position of the form `lat lon v705 v710 name...`. Speeds are 3-second
//! gusts in mph; `NaN` marks positions that are not over land. Header lines
//! are recognised by not starting with two numbers.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::HazardError;

/// Default match radius for [`CodeWindTable::lookup`], in degrees.
pub const DEFAULT_TOLERANCE_DEG: f64 = 1e-3;

/// One row of the design wind table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeWindRow {
    /// Latitude in degrees, positive north.
    pub lat: f64,
    /// Longitude in degrees, positive east.
    pub lon: f64,
    /// ASCE 7-05 design gust (50-year recurrence), mph.
    pub asce705_mph: f64,
    /// ASCE 7-10 design gust (risk category III-IV), mph.
    pub asce710_mph: f64,
    /// Asset name recorded with the row.
    pub name: String,
}

/// Design wind speeds keyed by position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodeWindTable {
    rows: Vec<CodeWindRow>,
}

impl CodeWindTable {
    /// Parse a table file. Malformed speed tokens on a data row are errors.
    pub fn parse(text: &str) -> Result<Self, HazardError> {
        let mut rows = Vec::new();
        let mut headers = 0_usize;
        for (index, line) in text.lines().enumerate() {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            let position = match tokens.as_slice() {
                [lat, lon, ..] => lat.parse::<f64>().ok().zip(lon.parse::<f64>().ok()),
                _ => None,
            };
            let Some((lat, lon)) = position.filter(|(lat, lon)| lat.is_finite() && lon.is_finite())
            else {
                headers = headers.saturating_add(1);
                continue;
            };

            let line_no = index.saturating_add(1);
            let speed = |at: usize, key: &str| -> Result<f64, HazardError> {
                let token = tokens.get(at).ok_or_else(|| HazardError::MissingValues {
                    line: line_no,
                    key: key.to_owned(),
                    expected: 4,
                })?;
                token.parse().map_err(|_| HazardError::InvalidNumber {
                    line: line_no,
                    key: key.to_owned(),
                    token: (*token).to_owned(),
                })
            };

            rows.push(CodeWindRow {
                lat,
                lon,
                asce705_mph: speed(2, "asce 7-05")?,
                asce710_mph: speed(3, "asce 7-10")?,
                name: tokens.get(4..).map(|rest| rest.join(" ")).unwrap_or_default(),
            });
        }
        debug!(headers, "skipped wind table header lines");
        info!(rows = rows.len(), "Code wind table loaded");
        Ok(Self { rows })
    }

    /// The parsed rows, in file order.
    pub fn rows(&self) -> &[CodeWindRow] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// `(asce705, asce710)` speeds of the nearest row within
    /// [`DEFAULT_TOLERANCE_DEG`], or `(NaN, NaN)`.
    pub fn lookup(&self, lat: f64, lon: f64) -> (f64, f64) {
        self.rows
            .iter()
            .map(|row| ((row.lat - lat).hypot(row.lon - lon), row))
            .filter(|(distance, _)| *distance <= DEFAULT_TOLERANCE_DEG)
            .min_by(|(a, _), (b, _)| a.total_cmp(b))
            .map_or((f64::NAN, f64::NAN), |(_, row)| {
                (row.asce705_mph, row.asce710_mph)
            })
    }
}
