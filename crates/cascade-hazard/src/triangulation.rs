//! Delaunay triangulation and linear interpolation over scattered samples.
//!
//! [`Triangulation`] is built incrementally with the Bowyer-Watson algorithm
//! inside an enclosing super-triangle that is discarded at the end, leaving
//! a triangulation of the samples' convex hull. [`LinearInterpolator`]
//! evaluates the piecewise-linear surface over it and reports `None` for
//! queries outside the hull.

use std::collections::BTreeMap;

use tracing::debug;

/// Tolerance for treating two samples as the same position.
const DUPLICATE_EPSILON: f64 = 1e-12;

/// Tolerance for barycentric coordinates on triangle edges.
const EDGE_EPSILON: f64 = 1e-9;

/// Twice-area below which a triangle is treated as degenerate.
const DEGENERATE_EPSILON: f64 = 1e-14;

/// A working triangle with its cached circumcircle.
#[derive(Debug, Clone, Copy)]
struct Working {
    vertices: [usize; 3],
    center: [f64; 2],
    radius_sq: f64,
}

impl Working {
    fn new(vertices: [usize; 3], points: &[[f64; 2]]) -> Self {
        let [a, b, c] = vertices.map(|i| points.get(i).copied().unwrap_or([f64::NAN; 2]));
        let (center, radius_sq) = circumcircle(a, b, c);
        Self {
            vertices,
            center,
            radius_sq,
        }
    }

    fn circumcircle_contains(&self, p: [f64; 2]) -> bool {
        if self.radius_sq.is_infinite() {
            return true;
        }
        let dx = p[0] - self.center[0];
        let dy = p[1] - self.center[1];
        dx.mul_add(dx, dy * dy) < self.radius_sq
    }

    fn edges(&self) -> [(usize, usize); 3] {
        let [a, b, c] = self.vertices;
        [ordered(a, b), ordered(b, c), ordered(c, a)]
    }
}

const fn ordered(a: usize, b: usize) -> (usize, usize) {
    if a < b { (a, b) } else { (b, a) }
}

/// Circumcenter and squared radius; collinear input yields an infinite circle.
fn circumcircle(a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> ([f64; 2], f64) {
    let [ax, ay] = a;
    let [bx, by] = b;
    let [cx, cy] = c;
    let d = 2.0 * (ax * (by - cy) + bx * (cy - ay) + cx * (ay - by));
    if d.abs() < DEGENERATE_EPSILON {
        return ([f64::NAN; 2], f64::INFINITY);
    }
    let a2 = ax.mul_add(ax, ay * ay);
    let b2 = bx.mul_add(bx, by * by);
    let c2 = cx.mul_add(cx, cy * cy);
    let ux = (a2 * (by - cy) + b2 * (cy - ay) + c2 * (ay - by)) / d;
    let uy = (a2 * (cx - bx) + b2 * (ax - cx) + c2 * (bx - ax)) / d;
    let r = (ax - ux).hypot(ay - uy);
    ([ux, uy], r * r)
}

/// Barycentric coordinates of `p` in triangle `(a, b, c)`, or `None` if the
/// triangle is degenerate.
fn barycentric(p: [f64; 2], a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> Option<[f64; 3]> {
    let det = (b[1] - c[1]) * (a[0] - c[0]) + (c[0] - b[0]) * (a[1] - c[1]);
    if det.abs() < DEGENERATE_EPSILON {
        return None;
    }
    let l1 = ((b[1] - c[1]) * (p[0] - c[0]) + (c[0] - b[0]) * (p[1] - c[1])) / det;
    let l2 = ((c[1] - a[1]) * (p[0] - c[0]) + (a[0] - c[0]) * (p[1] - c[1])) / det;
    Some([l1, l2, 1.0 - l1 - l2])
}

/// A Delaunay triangulation of distinct planar points.
#[derive(Debug, Clone, Default)]
pub struct Triangulation {
    points: Vec<[f64; 2]>,
    triangles: Vec<[usize; 3]>,
}

impl Triangulation {
    /// Triangulate `points`. Exact duplicates are dropped (first kept).
    ///
    /// Fewer than three distinct, non-collinear points produce no triangles.
    pub fn new(points: &[[f64; 2]]) -> Self {
        let (unique, _) = dedup(points);
        let triangles = bowyer_watson(&unique);
        debug!(
            points = unique.len(),
            triangles = triangles.len(),
            "Triangulation built"
        );
        Self {
            points: unique,
            triangles,
        }
    }

    /// The distinct points, in first-seen order.
    pub fn points(&self) -> &[[f64; 2]] {
        &self.points
    }

    /// Triangles as index triples into [`points`](Self::points).
    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    /// Find a triangle containing `p` (edges included) and the barycentric
    /// weights of `p` in it.
    pub fn locate(&self, p: [f64; 2]) -> Option<([usize; 3], [f64; 3])> {
        self.triangles.iter().find_map(|&tri| {
            let [a, b, c] = tri.map(|i| self.points.get(i).copied());
            let weights = barycentric(p, a?, b?, c?)?;
            weights
                .iter()
                .all(|&w| w >= -EDGE_EPSILON)
                .then_some((tri, weights))
        })
    }
}

/// Drop exact duplicates; returns the unique points and, for each input
/// index, whether it was kept.
fn dedup(points: &[[f64; 2]]) -> (Vec<[f64; 2]>, Vec<bool>) {
    let mut unique: Vec<[f64; 2]> = Vec::with_capacity(points.len());
    let mut kept = Vec::with_capacity(points.len());
    for &p in points {
        let duplicate = unique.iter().any(|q| {
            (q[0] - p[0]).abs() <= DUPLICATE_EPSILON && (q[1] - p[1]).abs() <= DUPLICATE_EPSILON
        });
        if duplicate {
            debug!(lon = p[0], lat = p[1], "dropping duplicate sample position");
        } else {
            unique.push(p);
        }
        kept.push(!duplicate);
    }
    (unique, kept)
}

fn bowyer_watson(points: &[[f64; 2]]) -> Vec<[usize; 3]> {
    let n = points.len();
    if n < 3 {
        return Vec::new();
    }

    let (mut min_x, mut min_y, mut max_x, mut max_y) =
        (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);
    for &[x, y] in points {
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }
    let span = (max_x - min_x).max(max_y - min_y).max(1.0);
    let mid_x = (min_x + max_x) / 2.0;
    let mid_y = (min_y + max_y) / 2.0;

    // Working vertex set: samples followed by the three super-triangle corners.
    let mut all: Vec<[f64; 2]> = points.to_vec();
    all.push([mid_x - 50.0 * span, mid_y - 20.0 * span]);
    all.push([mid_x, mid_y + 50.0 * span]);
    all.push([mid_x + 50.0 * span, mid_y - 20.0 * span]);
    let super_start = n;

    let mut working = vec![Working::new(
        [n, n.saturating_add(1), n.saturating_add(2)],
        &all,
    )];

    for (index, &p) in points.iter().enumerate() {
        let (bad, good): (Vec<Working>, Vec<Working>) =
            working.into_iter().partition(|t| t.circumcircle_contains(p));

        // Cavity boundary: edges used by exactly one bad triangle.
        let mut edge_use: BTreeMap<(usize, usize), u32> = BTreeMap::new();
        for tri in &bad {
            for edge in tri.edges() {
                let count = edge_use.entry(edge).or_insert(0);
                *count = count.saturating_add(1);
            }
        }

        working = good;
        for ((a, b), count) in edge_use {
            if count == 1 {
                working.push(Working::new([a, b, index], &all));
            }
        }
    }

    working
        .into_iter()
        .map(|t| t.vertices)
        .filter(|v| v.iter().all(|&i| i < super_start))
        .filter(|&[a, b, c]| {
            let corners = [a, b, c].map(|i| all.get(i).copied().unwrap_or([f64::NAN; 2]));
            let [pa, pb, pc] = corners;
            barycentric(pa, pa, pb, pc).is_some()
        })
        .collect()
}

/// Piecewise-linear interpolant over a [`Triangulation`].
#[derive(Debug, Clone, Default)]
pub struct LinearInterpolator {
    triangulation: Triangulation,
    values: Vec<f64>,
}

impl LinearInterpolator {
    /// Build the interpolant for `(position, value)` samples.
    ///
    /// When two samples share a position the first value is kept.
    pub fn new(samples: &[([f64; 2], f64)]) -> Self {
        let positions: Vec<[f64; 2]> = samples.iter().map(|(p, _)| *p).collect();
        let (_, kept) = dedup(&positions);
        let values = samples
            .iter()
            .zip(kept)
            .filter_map(|((_, v), keep)| keep.then_some(*v))
            .collect();
        Self {
            triangulation: Triangulation::new(&positions),
            values,
        }
    }

    /// The underlying triangulation.
    pub const fn triangulation(&self) -> &Triangulation {
        &self.triangulation
    }

    /// Interpolated value at `p`, or `None` outside the convex hull.
    pub fn interpolate(&self, p: [f64; 2]) -> Option<f64> {
        let (tri, weights) = self.triangulation.locate(p)?;
        let mut total = 0.0;
        for (index, weight) in tri.into_iter().zip(weights) {
            total += weight * self.values.get(index)?;
        }
        Some(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> Vec<([f64; 2], f64)> {
        // value = x, so any triangulation reproduces it exactly.
        vec![
            ([0.0, 0.0], 0.0),
            ([1.0, 0.0], 1.0),
            ([0.0, 1.0], 0.0),
            ([1.0, 1.0], 1.0),
        ]
    }

    #[test]
    fn square_triangulates_into_two_triangles() {
        let positions: Vec<[f64; 2]> = unit_square().iter().map(|(p, _)| *p).collect();
        let t = Triangulation::new(&positions);
        assert_eq!(t.triangles().len(), 2);
    }

    #[test]
    fn interpolates_linear_field_exactly() {
        let interp = LinearInterpolator::new(&unit_square());
        for (p, expected) in [([0.5, 0.5], 0.5), ([0.25, 0.75], 0.25), ([0.9, 0.1], 0.9)] {
            let v = interp.interpolate(p).unwrap_or(f64::NAN);
            assert!((v - expected).abs() < 1e-9, "at {p:?}: {v}");
        }
    }

    #[test]
    fn sample_positions_return_sample_values() {
        let interp = LinearInterpolator::new(&unit_square());
        for (p, expected) in unit_square() {
            let v = interp.interpolate(p).unwrap_or(f64::NAN);
            assert!((v - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn outside_hull_is_none() {
        let interp = LinearInterpolator::new(&unit_square());
        assert!(interp.interpolate([2.0, 2.0]).is_none());
        assert!(interp.interpolate([-0.1, 0.5]).is_none());
    }

    #[test]
    fn hull_of_scattered_points_is_covered() {
        let samples: Vec<([f64; 2], f64)> = (0..5)
            .flat_map(|i| (0..5).map(move |j| (i, j)))
            .map(|(i, j)| {
                let x = f64::from(i) * 0.5;
                let y = f64::from(j) * 0.5 + f64::from(i) * 0.01;
                ([x, y], 2.0 * x + y)
            })
            .collect();
        let interp = LinearInterpolator::new(&samples);
        let v = interp.interpolate([1.1, 1.0]).unwrap_or(f64::NAN);
        assert!((v - 3.2).abs() < 1e-9);
    }

    #[test]
    fn duplicates_keep_first_value() {
        let mut samples = unit_square();
        samples.push(([0.0, 0.0], 99.0));
        let interp = LinearInterpolator::new(&samples);
        let v = interp.interpolate([0.0, 0.0]).unwrap_or(f64::NAN);
        assert!(v.abs() < 1e-9);
    }

    #[test]
    fn too_few_points_have_no_triangles() {
        let interp = LinearInterpolator::new(&[([0.0, 0.0], 1.0), ([1.0, 0.0], 2.0)]);
        assert!(interp.triangulation().triangles().is_empty());
        assert!(interp.interpolate([0.5, 0.0]).is_none());
    }

    #[test]
    fn collinear_points_have_no_triangles() {
        let positions = [[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]];
        assert!(Triangulation::new(&positions).triangles().is_empty());
    }
}
