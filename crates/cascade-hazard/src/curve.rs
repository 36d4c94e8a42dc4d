//! Piecewise-linear curves with inverse lookup.
//!
//! A [`Curve`] stores sampled `(x, y)` pairs. [`a_from_b`] is the single
//! interpolation routine behind both lookup directions: given a domain `A`,
//! a codomain `B`, and a query `b`, it clamps outside `[B[0], B[last]]` and
//! otherwise interpolates linearly on the first segment whose upper end
//! reaches `b`.
//!
//! The scan assumes `B` is increasing. Non-monotonic data is accepted and
//! reported through [`Curve::check`], never corrected.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Return the `A` value that maps to `b_val` under `B(A)`.
///
/// - `b_val <= B[0]` returns `A[0]`.
/// - `b_val > B[last]` returns `A[last]`.
/// - Otherwise the first index `i` with `b_val <= B[i]` selects the segment
///   `(A[i-1], B[i-1]) .. (A[i], B[i])`.
///
/// Unequal lengths are reported and the common prefix is used. An empty
/// input yields NaN.
pub fn a_from_b(a: &[f64], b: &[f64], b_val: f64) -> f64 {
    if a.len() != b.len() {
        warn!(
            a_len = a.len(),
            b_len = b.len(),
            "B(A) must be represented by equal length vectors: proceeding anyway"
        );
    }
    let n = a.len().min(b.len());
    let (Some(a), Some(b)) = (a.get(..n), b.get(..n)) else {
        return f64::NAN;
    };
    let (Some(&a_first), Some(&b_first), Some(&a_last), Some(&b_last)) =
        (a.first(), b.first(), a.last(), b.last())
    else {
        return f64::NAN;
    };

    if b_val <= b_first {
        return a_first;
    }
    if b_val > b_last {
        return a_last;
    }

    for (a_pair, b_pair) in a.windows(2).zip(b.windows(2)) {
        let (&[a0, a1], &[b0, b1]) = (a_pair, b_pair) else {
            continue;
        };
        if b_val <= b1 {
            let frac = (b_val - b0) / (b1 - b0);
            return a0 + frac * (a1 - a0);
        }
    }
    // b_val <= B[last] guarantees the scan returns; NaN data can fall through.
    a_last
}

/// One sampled curve of a fragility family.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    /// Display name (`curve name`).
    pub name: String,
    /// Label from the `curve number` line; informational only.
    pub number: String,
    /// Point count declared by `number of points`, if any.
    pub declared_points: Option<usize>,
    /// Domain samples.
    pub x: Vec<f64>,
    /// Codomain samples.
    pub y: Vec<f64>,
}

impl Curve {
    /// Build a curve from its two sample vectors.
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Self {
        Self {
            x,
            y,
            ..Self::default()
        }
    }

    /// Return the `x` that maps to `y_val`.
    pub fn x_from_y(&self, y_val: f64) -> f64 {
        a_from_b(&self.x, &self.y, y_val)
    }

    /// Return the `y` that maps to `x_val`.
    pub fn y_from_x(&self, x_val: f64) -> f64 {
        a_from_b(&self.y, &self.x, x_val)
    }

    /// Whether `values` never decreases.
    fn is_non_decreasing(values: &[f64]) -> bool {
        values.windows(2).all(|w| match w {
            [lo, hi] => lo <= hi,
            _ => true,
        })
    }

    /// Report degenerate sample data. Returns `true` if the curve is clean.
    ///
    /// Checks for unequal axis lengths, a `number of points` declaration that
    /// disagrees with the samples, and non-monotonic axes. Nothing is fixed;
    /// interpolation proceeds on the data as given.
    pub fn check(&self, owner: &str) -> bool {
        let mut clean = true;
        if self.x.len() != self.y.len() {
            warn!(
                owner,
                curve = self.number,
                x_len = self.x.len(),
                y_len = self.y.len(),
                "curve axes have unequal lengths"
            );
            clean = false;
        }
        if let Some(declared) = self.declared_points {
            if declared != self.x.len() {
                warn!(
                    owner,
                    curve = self.number,
                    declared,
                    actual = self.x.len(),
                    "declared number of points does not match samples"
                );
                clean = false;
            }
        }
        if !Self::is_non_decreasing(&self.x) || !Self::is_non_decreasing(&self.y) {
            warn!(
                owner,
                curve = self.number,
                "curve is not monotonic; lookups assume increasing samples"
            );
            clean = false;
        }
        clean
    }
}
