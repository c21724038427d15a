//! Screen ↔ logical canvas coordinate mapping.
//!
//! The hosting element is displayed at some CSS size on a screen with some
//! device pixel ratio, while the canvas content lives in logical units. The
//! element's geometry can change at any time (resize, scroll, orientation
//! change), so it is re-read before every input event is mapped.

use kurbo::{Affine, Point, Size, Vec2};

/// Geometry of the hosting element as laid out on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayGeometry {
    /// Top-left corner of the element in screen pixels.
    pub origin: Point,
    /// Displayed size of the element in CSS pixels.
    pub css_size: Size,
    /// Physical pixels per CSS pixel.
    pub device_pixel_ratio: f64,
}

impl DisplayGeometry {
    pub fn new(origin: Point, css_size: Size, device_pixel_ratio: f64) -> Self {
        Self {
            origin,
            css_size,
            device_pixel_ratio,
        }
    }

    /// Geometry of an element displayed 1:1 at the screen origin.
    pub fn identity(size: Size) -> Self {
        Self::new(Point::ZERO, size, 1.0)
    }

    /// Whether this geometry can be used for mapping.
    pub fn is_usable(&self) -> bool {
        self.origin.is_finite()
            && self.css_size.is_finite()
            && self.css_size.width > 0.0
            && self.css_size.height > 0.0
            && self.device_pixel_ratio.is_finite()
            && self.device_pixel_ratio > 0.0
    }
}

/// Reads the current geometry of the hosting element.
///
/// Returns `None` when the element is detached from layout.
pub trait GeometrySource {
    fn read_geometry(&self) -> Option<DisplayGeometry>;
}

/// A fixed geometry, for hosts without layout (and for tests).
impl GeometrySource for DisplayGeometry {
    fn read_geometry(&self) -> Option<DisplayGeometry> {
        Some(*self)
    }
}

impl<F> GeometrySource for F
where
    F: Fn() -> Option<DisplayGeometry>,
{
    fn read_geometry(&self) -> Option<DisplayGeometry> {
        self()
    }
}

/// Maps between screen pixels and logical canvas units.
#[derive(Debug, Clone)]
pub struct CoordinateTransform {
    logical_size: Size,
    geometry: DisplayGeometry,
}

impl CoordinateTransform {
    /// Create a transform for a canvas of `logical_size`, initially displayed
    /// with `geometry`. Unusable initial geometry falls back to a 1:1 display.
    pub fn new(logical_size: Size, geometry: DisplayGeometry) -> Self {
        let geometry = if geometry.is_usable() {
            geometry
        } else {
            log::warn!("initial display geometry {geometry:?} is unusable, assuming 1:1");
            DisplayGeometry::identity(logical_size)
        };
        Self {
            logical_size,
            geometry,
        }
    }

    /// Re-read geometry from the host. Keeps the last known good geometry
    /// (and logs) when the read fails or is degenerate. Returns whether the
    /// geometry changed.
    pub fn refresh(&mut self, source: &dyn GeometrySource) -> bool {
        match source.read_geometry() {
            Some(geometry) if geometry.is_usable() => {
                let changed = geometry != self.geometry;
                self.geometry = geometry;
                changed
            }
            Some(geometry) => {
                log::warn!("degenerate display geometry {geometry:?}, keeping last known");
                false
            }
            None => {
                log::warn!("display geometry unavailable, keeping last known");
                false
            }
        }
    }

    pub fn geometry(&self) -> DisplayGeometry {
        self.geometry
    }

    pub fn logical_size(&self) -> Size {
        self.logical_size
    }

    pub fn set_logical_size(&mut self, size: Size) {
        if size.is_finite() && size.width > 0.0 && size.height > 0.0 {
            self.logical_size = size;
        } else {
            log::warn!("ignoring invalid logical size {size:?}");
        }
    }

    /// CSS pixels per logical unit, per axis.
    pub fn display_scale(&self) -> Vec2 {
        Vec2::new(
            self.geometry.css_size.width / self.logical_size.width,
            self.geometry.css_size.height / self.logical_size.height,
        )
    }

    /// Backing-store pixels per logical unit.
    pub fn backing_scale(&self) -> f64 {
        self.geometry.device_pixel_ratio
    }

    /// Backing-store dimensions for the current logical size and pixel ratio.
    pub fn backing_size(&self) -> (u32, u32) {
        backing_dimensions(self.logical_size, self.backing_scale())
    }

    /// Screen pixel → logical canvas unit.
    pub fn to_logical(&self, screen: Point) -> Point {
        let scale = self.display_scale();
        Point::new(
            (screen.x - self.geometry.origin.x) / scale.x,
            (screen.y - self.geometry.origin.y) / scale.y,
        )
    }

    /// Logical canvas unit → screen pixel.
    pub fn to_screen(&self, logical: Point) -> Point {
        let scale = self.display_scale();
        Point::new(
            logical.x * scale.x + self.geometry.origin.x,
            logical.y * scale.y + self.geometry.origin.y,
        )
    }

    /// Affine form of [`Self::to_screen`].
    pub fn logical_to_screen(&self) -> Affine {
        let scale = self.display_scale();
        Affine::translate(self.geometry.origin.to_vec2()) * Affine::scale_non_uniform(scale.x, scale.y)
    }
}

/// Pixel dimensions of a surface covering `logical` at `scale` pixels per unit.
pub fn backing_dimensions(logical: Size, scale: f64) -> (u32, u32) {
    let to_px = |v: f64| (v * scale).ceil().clamp(0.0, u32::MAX as f64) as u32;
    (to_px(logical.width), to_px(logical.height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn scaled_geometry() -> DisplayGeometry {
        // 400x300 canvas displayed at 200x150 CSS px, offset by the page layout
        DisplayGeometry::new(Point::new(30.0, 45.0), Size::new(200.0, 150.0), 2.0)
    }

    #[test]
    fn test_identity_mapping() {
        let t = CoordinateTransform::new(Size::new(200.0, 200.0), DisplayGeometry::identity(Size::new(200.0, 200.0)));
        let p = t.to_logical(Point::new(12.5, 99.0));
        assert!((p.x - 12.5).abs() < 1e-12);
        assert!((p.y - 99.0).abs() < 1e-12);
    }

    #[test]
    fn test_css_scaling_and_origin() {
        let t = CoordinateTransform::new(Size::new(400.0, 300.0), scaled_geometry());
        let p = t.to_logical(Point::new(130.0, 120.0));
        assert!((p.x - 200.0).abs() < 1e-9);
        assert!((p.y - 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_roundtrip_within_tolerance() {
        let t = CoordinateTransform::new(Size::new(400.0, 300.0), scaled_geometry());
        for &(x, y) in &[(0.0, 0.0), (400.0, 300.0), (123.456, 7.89), (399.999, 0.001)] {
            let p = Point::new(x, y);
            let back = t.to_logical(t.to_screen(p));
            assert!((back.x - p.x).abs() < 1e-6);
            assert!((back.y - p.y).abs() < 1e-6);
        }
    }

    #[test]
    fn test_affine_matches_to_screen() {
        let t = CoordinateTransform::new(Size::new(400.0, 300.0), scaled_geometry());
        let p = Point::new(50.0, 60.0);
        let a = t.logical_to_screen() * p;
        let b = t.to_screen(p);
        assert!((a - b).hypot() < 1e-9);
    }

    #[test]
    fn test_refresh_picks_up_new_geometry() {
        let mut t = CoordinateTransform::new(Size::new(400.0, 300.0), scaled_geometry());
        let moved = DisplayGeometry::new(Point::new(0.0, 0.0), Size::new(400.0, 300.0), 1.0);
        assert!(t.refresh(&moved));
        let p = t.to_logical(Point::new(10.0, 10.0));
        assert!((p.x - 10.0).abs() < 1e-12);
        assert!(!t.refresh(&moved));
    }

    #[test]
    fn test_refresh_keeps_last_known_on_failure() {
        let mut t = CoordinateTransform::new(Size::new(400.0, 300.0), scaled_geometry());
        let detached = || None;
        assert!(!t.refresh(&detached));
        assert_eq!(t.geometry(), scaled_geometry());

        let degenerate = DisplayGeometry::new(Point::ZERO, Size::new(0.0, 150.0), 2.0);
        assert!(!t.refresh(&degenerate));
        assert_eq!(t.geometry(), scaled_geometry());
    }

    #[test]
    fn test_geometry_reread_every_refresh() {
        let reads = Cell::new(0);
        let source = || {
            reads.set(reads.get() + 1);
            Some(DisplayGeometry::identity(Size::new(100.0, 100.0)))
        };
        let mut t = CoordinateTransform::new(Size::new(100.0, 100.0), DisplayGeometry::identity(Size::new(100.0, 100.0)));
        t.refresh(&source);
        t.refresh(&source);
        assert_eq!(reads.get(), 2);
    }

    #[test]
    fn test_backing_dimensions() {
        assert_eq!(backing_dimensions(Size::new(200.0, 100.0), 1.5), (300, 150));
        assert_eq!(backing_dimensions(Size::new(10.1, 10.0), 1.0), (11, 10));
    }

    #[test]
    fn test_unusable_initial_geometry() {
        let bad = DisplayGeometry::new(Point::ZERO, Size::ZERO, 0.0);
        let t = CoordinateTransform::new(Size::new(50.0, 50.0), bad);
        assert!((t.backing_scale() - 1.0).abs() < f64::EPSILON);
    }
}
