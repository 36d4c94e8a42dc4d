//! Drawing collaborator for scenario display.
//!
//! The model does not plot anything itself. [`CoupledContext::display`]
//! walks the loaded layers and hands geometry to a [`Renderer`]; a plotting
//! front end implements the trait. [`LogRenderer`] writes a summary of each
//! call to the trace log.
//!
//! [`CoupledContext::display`]: crate::context::CoupledContext::display

use cascade_types::LatLon;
use tracing::debug;

/// One asset marker.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetMarker {
    /// Asset name.
    pub name: String,
    /// Asset position.
    pub location: LatLon,
    /// Whether the asset has been destroyed.
    pub destroyed: bool,
}

/// Receives scenario geometry for drawing.
pub trait Renderer {
    /// Draw a closed ring of `[lon, lat]` vertices, e.g. a wind swath.
    fn draw_lines(&mut self, layer: &str, ring: &[[f64; 2]]);

    /// Draw a contour plot over scattered `([lon, lat], value)` samples.
    fn draw_contours(&mut self, layer: &str, samples: &[([f64; 2], f64)]);

    /// Draw asset markers, distinguishing destroyed from intact.
    fn draw_points(&mut self, layer: &str, markers: &[AssetMarker]);
}

/// A [`Renderer`] that logs what it is asked to draw.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogRenderer;

impl Renderer for LogRenderer {
    fn draw_lines(&mut self, layer: &str, ring: &[[f64; 2]]) {
        debug!(layer, vertices = ring.len(), "draw swath");
    }

    fn draw_contours(&mut self, layer: &str, samples: &[([f64; 2], f64)]) {
        let peak = samples.iter().map(|(_, v)| *v).fold(0.0_f64, f64::max);
        debug!(layer, samples = samples.len(), peak, "draw contours");
    }

    fn draw_points(&mut self, layer: &str, markers: &[AssetMarker]) {
        let destroyed = markers.iter().filter(|m| m.destroyed).count();
        debug!(layer, markers = markers.len(), destroyed, "draw assets");
    }
}
