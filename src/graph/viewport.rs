//! Zoom and pan for the rendered graph
//!
//! An affine transform applied to the whole rendered group, independent of
//! the force simulation: zooming never perturbs node positions, only how
//! layout space maps to screen space.

use crate::config::GraphConfig;

/// Screen-space transform `(x, y) -> (x * k + tx, y * k + ty)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    /// Scale factor, clamped to the configured extent
    pub k: f64,
    pub tx: f64,
    pub ty: f64,
    scale_min: f64,
    scale_max: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        let graph = GraphConfig::default();
        Self::new(graph.scale_min, graph.scale_max)
    }
}

impl ViewTransform {
    /// Identity transform with the given scale extent.
    pub fn new(scale_min: f64, scale_max: f64) -> Self {
        Self {
            k: 1.0,
            tx: 0.0,
            ty: 0.0,
            scale_min,
            scale_max,
        }
    }

    /// Map a layout-space point to screen space.
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (x * self.k + self.tx, y * self.k + self.ty)
    }

    /// Map a screen-space point back to layout space.
    pub fn invert(&self, x: f64, y: f64) -> (f64, f64) {
        ((x - self.tx) / self.k, (y - self.ty) / self.k)
    }

    /// Scale by `factor` about a screen-space pivot; the layout point under
    /// the pivot stays put. The resulting scale clamps to the extent.
    pub fn zoom_by(&mut self, factor: f64, pivot_x: f64, pivot_y: f64) {
        let (layout_x, layout_y) = self.invert(pivot_x, pivot_y);
        self.k = (self.k * factor).clamp(self.scale_min, self.scale_max);
        self.tx = pivot_x - layout_x * self.k;
        self.ty = pivot_y - layout_y * self.k;
    }

    /// Translate the view by a screen-space delta.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.tx += dx;
        self.ty += dy;
    }
}
