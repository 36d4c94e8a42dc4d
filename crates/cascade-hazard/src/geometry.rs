//! Planar point-in-polygon tests on `[lon, lat]` vertex rings.
//!
//! Containment uses ray crossing with explicit boundary handling: a point
//! exactly on an edge or vertex counts as inside. Rings may be given open or
//! closed (first vertex repeated).

/// Collinearity tolerance for boundary tests, in squared degrees.
const BOUNDARY_EPSILON: f64 = 1e-12;

/// Whether `p` lies on the segment `a`-`b` (endpoints included).
pub fn on_segment(p: [f64; 2], a: [f64; 2], b: [f64; 2]) -> bool {
    let [px, py] = p;
    let [ax, ay] = a;
    let [bx, by] = b;
    let cross = (bx - ax) * (py - ay) - (by - ay) * (px - ax);
    if cross.abs() > BOUNDARY_EPSILON {
        return false;
    }
    px >= ax.min(bx) && px <= ax.max(bx) && py >= ay.min(by) && py <= ay.max(by)
}

/// Whether `p` is inside or on the boundary of the polygon `ring`.
///
/// Fewer than three vertices never contain anything except their own
/// boundary points.
pub fn point_in_polygon(p: [f64; 2], ring: &[[f64; 2]]) -> bool {
    let [px, py] = p;
    let Some(&last) = ring.last() else {
        return false;
    };

    let mut inside = false;
    let mut prev = last;
    for &current in ring {
        if on_segment(p, prev, current) {
            return true;
        }
        let [x0, y0] = prev;
        let [x1, y1] = current;
        // Half-open rule on y so a ray through a vertex counts once.
        if (y1 > py) != (y0 > py) {
            let x_cross = x1 + (py - y1) * (x0 - x1) / (y0 - y1);
            if px < x_cross {
                inside = !inside;
            }
        }
        prev = current;
    }
    inside && ring.len() >= 3
}
