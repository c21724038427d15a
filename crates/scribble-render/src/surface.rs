//! A persistent raster buffer holding world-space content.

use crate::{RenderError, RenderResult};
use kurbo::{Affine, BezPath, PathEl, Point, Size};
use scribble_core::smoothing::Segment;
use scribble_core::style::{BrushStyle, Composite, Rgba};
use scribble_core::transform::backing_dimensions;
use tiny_skia::{
    BlendMode, Color, FillRule, FilterQuality, LineCap, LineJoin, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke,
    Transform,
};

/// Largest pixel edge of a surface.
pub const MAX_SURFACE_DIMENSION: u32 = 16_384;

/// Raster surface covering the world rect `(0, 0)..logical_size` at `scale`
/// pixels per world unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pixmap: Pixmap,
    scale: f64,
    logical_size: Size,
}

impl Surface {
    /// Create a transparent surface.
    pub fn new(logical_size: Size, scale: f64) -> RenderResult<Self> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(RenderError::InvalidScale(scale));
        }
        let (width, height) = backing_dimensions(logical_size, scale);
        if width == 0 || height == 0 || width > MAX_SURFACE_DIMENSION || height > MAX_SURFACE_DIMENSION {
            return Err(RenderError::InvalidDimensions { width, height });
        }
        let pixmap = Pixmap::new(width, height).ok_or(RenderError::InvalidDimensions { width, height })?;
        Ok(Self {
            pixmap,
            scale,
            logical_size,
        })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Pixels per world unit.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn logical_size(&self) -> Size {
        self.logical_size
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// World → surface pixel transform.
    pub fn world_transform(&self) -> Affine {
        Affine::scale(self.scale)
    }

    /// Replace every pixel with `background`, or transparency for `None`.
    pub fn fill(&mut self, background: Option<Rgba>) {
        self.pixmap.fill(skia_color(background));
    }

    /// A filled circle of the brush width.
    pub fn draw_dot(&mut self, center: Point, style: &BrushStyle) {
        let radius = (style.width / 2.0) as f32;
        let Some(path) = PathBuilder::from_circle(center.x as f32, center.y as f32, radius) else {
            log::warn!("skipping degenerate dot at {center:?}");
            return;
        };
        let transform = to_skia(self.world_transform());
        self.pixmap
            .fill_path(&path, &paint_for(style), FillRule::Winding, transform, None);
    }

    /// Stroke one segment with round caps and joins.
    pub fn draw_segment(&mut self, segment: &Segment, style: &BrushStyle) {
        let transform = to_skia(self.world_transform());
        stroke_bez_path(&mut self.pixmap, &segment.to_path(), style, transform);
    }

    /// Straight-alpha color of the pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        let color = self.pixmap.pixel(x, y)?.demultiply();
        Some(Rgba::new(color.red(), color.green(), color.blue(), color.alpha()))
    }

    /// Straight-alpha color of the pixel covering the world point.
    pub fn pixel_at(&self, world: Point) -> Option<Rgba> {
        let px = self.world_transform() * world;
        if !(px.x >= 0.0 && px.y >= 0.0) {
            return None;
        }
        self.pixel(px.x.floor() as u32, px.y.floor() as u32)
    }

    /// Copy the content of `other`. When its geometry differs, the overlapping
    /// world area is re-rastered at this surface's scale and the rest is
    /// filled with `background`.
    pub fn copy_from(&mut self, other: &Surface, background: Option<Rgba>) {
        if self.same_geometry(other) {
            self.pixmap.data_mut().copy_from_slice(other.pixmap.data());
            return;
        }
        self.fill(background);
        let ratio = (self.scale / other.scale) as f32;
        let paint = PixmapPaint {
            opacity: 1.0,
            blend_mode: BlendMode::Source,
            quality: FilterQuality::Bilinear,
        };
        self.pixmap
            .draw_pixmap(0, 0, other.pixmap.as_ref(), &paint, Transform::from_scale(ratio, ratio), None);
    }

    /// A new surface with the given geometry holding this surface's content.
    pub fn resized(&self, logical_size: Size, scale: f64, background: Option<Rgba>) -> RenderResult<Surface> {
        let mut surface = Surface::new(logical_size, scale)?;
        surface.copy_from(self, background);
        Ok(surface)
    }

    fn same_geometry(&self, other: &Surface) -> bool {
        self.width() == other.width() && self.height() == other.height() && self.scale == other.scale
    }
}

/// Stroke `path` (world units) onto `pixmap` with the brush's paint.
pub(crate) fn stroke_bez_path(pixmap: &mut Pixmap, path: &BezPath, style: &BrushStyle, transform: Transform) {
    let Some(path) = to_skia_path(path) else {
        return;
    };
    let stroke = Stroke {
        width: style.width as f32,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Default::default()
    };
    pixmap.stroke_path(&path, &paint_for(style), &stroke, transform, None);
}

/// Paint for a brush: source-over at the brush color and opacity, or
/// destination-out for the eraser.
pub(crate) fn paint_for(style: &BrushStyle) -> Paint<'static> {
    let opacity = if style.opacity.is_finite() { style.opacity.clamp(0.0, 1.0) } else { 1.0 };
    let mut paint = Paint {
        anti_alias: true,
        ..Default::default()
    };
    match style.composite() {
        Composite::Paint => {
            let c = style.color;
            let alpha = (f64::from(c.a) * opacity).round() as u8;
            paint.set_color_rgba8(c.r, c.g, c.b, alpha);
            paint.blend_mode = BlendMode::SourceOver;
        }
        Composite::CutOut => {
            paint.set_color_rgba8(0, 0, 0, (255.0 * opacity).round() as u8);
            paint.blend_mode = BlendMode::DestinationOut;
        }
    }
    paint
}

pub(crate) fn skia_color(color: Option<Rgba>) -> Color {
    match color {
        Some(c) => Color::from_rgba8(c.r, c.g, c.b, c.a),
        None => Color::TRANSPARENT,
    }
}

/// Convert a kurbo affine into a tiny-skia transform.
pub(crate) fn to_skia(affine: Affine) -> Transform {
    let [a, b, c, d, e, f] = affine.as_coeffs();
    Transform::from_row(a as f32, b as f32, c as f32, d as f32, e as f32, f as f32)
}

fn to_skia_path(path: &BezPath) -> Option<tiny_skia::Path> {
    let mut builder = PathBuilder::new();
    for element in path.elements() {
        match *element {
            PathEl::MoveTo(p) => builder.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => builder.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(c, p) => builder.quad_to(c.x as f32, c.y as f32, p.x as f32, p.y as f32),
            PathEl::CurveTo(c1, c2, p) => builder.cubic_to(
                c1.x as f32,
                c1.y as f32,
                c2.x as f32,
                c2.y as f32,
                p.x as f32,
                p.y as f32,
            ),
            PathEl::ClosePath => builder.close(),
        }
    }
    builder.finish()
}
