//! Viewport module for zoom/pan over the logical canvas.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Default minimum zoom.
pub const DEFAULT_MIN_ZOOM: f64 = 0.1;
/// Default maximum zoom.
pub const DEFAULT_MAX_ZOOM: f64 = 10.0;
/// Factor applied by a single zoom in/out step.
pub const ZOOM_STEP: f64 = 1.25;
/// Margin added around content by `zoom_to_fit`, as a fraction of its size.
pub const FIT_MARGIN: f64 = 0.1;
/// Default overscroll allowance, as a fraction of the visible size.
pub const DEFAULT_OVERSCROLL: f64 = 0.2;

/// Zoom and pan state of the canvas view.
///
/// `pan` is the world coordinate shown at the logical origin, so
/// `world = logical / zoom + pan`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Current zoom level (1.0 = 100%).
    zoom: f64,
    /// World coordinate at the logical origin.
    pan: Vec2,
    /// Minimum allowed zoom level.
    min_zoom: f64,
    /// Maximum allowed zoom level.
    max_zoom: f64,
    /// Logical canvas extents.
    canvas: Size,
    /// How far the view may leave the canvas, as a fraction of the visible size.
    overscroll: f64,
}

impl Viewport {
    /// Create a viewport over a canvas of the given logical size.
    pub fn new(canvas: Size) -> Self {
        Self {
            zoom: 1.0,
            pan: Vec2::ZERO,
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            canvas,
            overscroll: DEFAULT_OVERSCROLL,
        }
    }

    /// Set the zoom bounds. Swapped or non-positive bounds fall back to the defaults.
    pub fn with_zoom_bounds(mut self, min_zoom: f64, max_zoom: f64) -> Self {
        if min_zoom.is_finite() && max_zoom.is_finite() && min_zoom > 0.0 && min_zoom <= max_zoom {
            self.min_zoom = min_zoom;
            self.max_zoom = max_zoom;
        } else {
            log::warn!("invalid zoom bounds [{min_zoom}, {max_zoom}], using defaults");
        }
        self.zoom = self.zoom.clamp(self.min_zoom, self.max_zoom);
        self
    }

    /// Set the overscroll fraction (clamped to `[0, 1]`).
    pub fn with_overscroll(mut self, overscroll: f64) -> Self {
        self.overscroll = if overscroll.is_finite() { overscroll.clamp(0.0, 1.0) } else { DEFAULT_OVERSCROLL };
        self
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn pan(&self) -> Vec2 {
        self.pan
    }

    pub fn min_zoom(&self) -> f64 {
        self.min_zoom
    }

    pub fn max_zoom(&self) -> f64 {
        self.max_zoom
    }

    pub fn canvas_size(&self) -> Size {
        self.canvas
    }

    /// Zoom as a whole percentage, for display.
    pub fn zoom_percent(&self) -> u32 {
        (self.zoom * 100.0).round() as u32
    }

    /// Update the canvas extents after a resize and re-clamp the pan.
    pub fn set_canvas_size(&mut self, canvas: Size) {
        self.canvas = canvas;
        self.constrain_pan();
    }

    /// World → logical transform, used for rendering.
    pub fn transform(&self) -> Affine {
        Affine::scale(self.zoom) * Affine::translate(-self.pan)
    }

    /// Logical → world transform, used for input handling.
    pub fn inverse_transform(&self) -> Affine {
        Affine::translate(self.pan) * Affine::scale(1.0 / self.zoom)
    }

    /// Convert a logical point to world coordinates.
    pub fn to_world(&self, logical: Point) -> Point {
        Point::new(logical.x / self.zoom + self.pan.x, logical.y / self.zoom + self.pan.y)
    }

    /// Convert a world point to logical coordinates.
    pub fn to_logical(&self, world: Point) -> Point {
        Point::new((world.x - self.pan.x) * self.zoom, (world.y - self.pan.y) * self.zoom)
    }

    /// The part of the world currently visible.
    pub fn visible_world_rect(&self) -> Rect {
        let origin = self.pan.to_point();
        Rect::from_origin_size(
            origin,
            Size::new(self.canvas.width / self.zoom, self.canvas.height / self.zoom),
        )
    }

    /// Zoom to `target_zoom`, keeping the world point under `logical_point` fixed.
    pub fn zoom_to_point(&mut self, logical_point: Point, target_zoom: f64) {
        if !target_zoom.is_finite() || !logical_point.is_finite() {
            log::warn!("ignoring zoom to {target_zoom} at {logical_point:?}");
            return;
        }
        let world = self.to_world(logical_point);
        self.zoom = target_zoom.clamp(self.min_zoom, self.max_zoom);
        self.pan = Vec2::new(
            world.x - logical_point.x / self.zoom,
            world.y - logical_point.y / self.zoom,
        );
        self.constrain_pan();
    }

    /// Multiply the zoom by `ZOOM_STEP` around the canvas centre.
    pub fn zoom_in(&mut self) {
        self.zoom_to_point(self.center(), self.zoom * ZOOM_STEP);
    }

    /// Divide the zoom by `ZOOM_STEP` around the canvas centre.
    pub fn zoom_out(&mut self) {
        self.zoom_to_point(self.center(), self.zoom / ZOOM_STEP);
    }

    /// Pan by a delta in logical units (content follows the pointer).
    pub fn pan_by(&mut self, logical_delta: Vec2) {
        if !logical_delta.is_finite() {
            return;
        }
        self.pan -= logical_delta / self.zoom;
        self.constrain_pan();
    }

    /// Reset to 100% with no pan.
    pub fn reset_zoom(&mut self) {
        self.zoom = 1.0f64.clamp(self.min_zoom, self.max_zoom);
        self.pan = Vec2::ZERO;
    }

    /// Fit `content` (world coordinates) inside the canvas with a margin.
    /// Without content this is the default view.
    pub fn zoom_to_fit(&mut self, content: Option<Rect>) {
        let Some(bounds) = content.filter(|b| b.is_finite() && b.width() > 0.0 && b.height() > 0.0) else {
            self.reset_zoom();
            return;
        };

        let padded = Size::new(
            bounds.width() * (1.0 + FIT_MARGIN),
            bounds.height() * (1.0 + FIT_MARGIN),
        );
        let scale_x = self.canvas.width / padded.width;
        let scale_y = self.canvas.height / padded.height;
        self.zoom = scale_x.min(scale_y).clamp(self.min_zoom, self.max_zoom);

        // Centre the bounds in the view
        let center = bounds.center();
        self.pan = Vec2::new(
            center.x - self.canvas.width / (2.0 * self.zoom),
            center.y - self.canvas.height / (2.0 * self.zoom),
        );
        self.constrain_pan();
    }

    /// Keep the visible rect within the canvas extents plus the overscroll margin.
    pub fn constrain_pan(&mut self) {
        let visible = Size::new(self.canvas.width / self.zoom, self.canvas.height / self.zoom);
        self.pan = Vec2::new(
            clamp_axis(self.pan.x, self.canvas.width, visible.width, self.overscroll),
            clamp_axis(self.pan.y, self.canvas.height, visible.height, self.overscroll),
        );
    }

    fn center(&self) -> Point {
        Point::new(self.canvas.width / 2.0, self.canvas.height / 2.0)
    }
}

/// Clamp one pan axis. When the view is smaller than the canvas it may leave
/// the canvas by the margin; when larger, the canvas must stay inside the
/// view widened by the margin.
fn clamp_axis(pan: f64, extent: f64, visible: f64, overscroll: f64) -> f64 {
    let margin = visible * overscroll;
    let (lo, hi) = if visible <= extent {
        (-margin, extent - visible + margin)
    } else {
        (extent - visible - margin, margin)
    };
    pan.clamp(lo, hi)
}
