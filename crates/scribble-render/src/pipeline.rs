//! Drawing-command pipeline over the display and export surfaces.

use crate::surface::{Surface, stroke_bez_path, to_skia};
use crate::{RenderError, RenderResult};
use kurbo::{Affine, BezPath, Point, Size};
use scribble_core::smoothing::Segment;
use scribble_core::style::{BrushStyle, Rgba, ToolKind};
use scribble_core::transform::backing_dimensions;
use scribble_core::viewport::Viewport;
use tiny_skia::{BlendMode, FilterQuality, Pixmap, PixmapPaint};

/// Opacity multiplier of the prediction overlay.
const PREDICTION_OPACITY: f64 = 0.5;

/// One unit of drawing work, in world coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Fill with the background color, or transparency for `None`.
    Clear { background: Option<Rgba> },
    Dot { center: Point, style: BrushStyle },
    Segment { segment: Segment, style: BrushStyle },
}

/// Predicted stroke extension, shown on the composed view only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub from: Point,
    pub to: Point,
    pub style: BrushStyle,
}

/// Pixels of both surfaces at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceSnapshot {
    display: Surface,
    export: Option<Surface>,
}

impl SurfaceSnapshot {
    pub fn display(&self) -> &Surface {
        &self.display
    }

    pub fn export(&self) -> Option<&Surface> {
        self.export.as_ref()
    }
}

/// Owns the surfaces and applies every command to all of them.
#[derive(Debug)]
pub struct RenderPipeline {
    display: Surface,
    export: Option<Surface>,
    /// Export pixels per world unit.
    export_scale: Option<f64>,
    /// Fill for areas a resize or restore exposes.
    background: Option<Rgba>,
    prediction: Option<Prediction>,
}

impl RenderPipeline {
    /// Create the surfaces, filled with `background`.
    pub fn new(
        logical_size: Size,
        device_pixel_ratio: f64,
        export_scale: Option<f64>,
        background: Option<Rgba>,
    ) -> RenderResult<Self> {
        let display = Surface::new(logical_size, device_pixel_ratio)?;
        let export = export_scale.map(|scale| Surface::new(logical_size, scale)).transpose()?;
        let mut pipeline = Self {
            display,
            export,
            export_scale,
            background,
            prediction: None,
        };
        pipeline.apply(&DrawCommand::Clear { background });
        log::debug!(
            "render pipeline: display {}x{}, export {:?}",
            pipeline.display.width(),
            pipeline.display.height(),
            pipeline.export.as_ref().map(|e| (e.width(), e.height()))
        );
        Ok(pipeline)
    }

    pub fn display(&self) -> &Surface {
        &self.display
    }

    pub fn export(&self) -> Option<&Surface> {
        self.export.as_ref()
    }

    /// The highest-resolution surface: export when present.
    pub fn output(&self) -> &Surface {
        self.export.as_ref().unwrap_or(&self.display)
    }

    pub fn background(&self) -> Option<Rgba> {
        self.background
    }

    pub fn set_background(&mut self, background: Option<Rgba>) {
        self.background = background;
    }

    /// Apply a command to the display surface, then the export surface.
    pub fn apply(&mut self, command: &DrawCommand) {
        for surface in std::iter::once(&mut self.display).chain(self.export.as_mut()) {
            match command {
                DrawCommand::Clear { background } => surface.fill(*background),
                DrawCommand::Dot { center, style } => surface.draw_dot(*center, style),
                DrawCommand::Segment { segment, style } => surface.draw_segment(segment, style),
            }
        }
    }

    pub fn snapshot(&self) -> SurfaceSnapshot {
        SurfaceSnapshot {
            display: self.display.clone(),
            export: self.export.clone(),
        }
    }

    /// Restore pixels from a snapshot, re-rastering when it was taken at
    /// other dimensions.
    pub fn restore(&mut self, snapshot: &SurfaceSnapshot) {
        self.display.copy_from(&snapshot.display, self.background);
        if let Some(export) = self.export.as_mut() {
            export.copy_from(snapshot.export.as_ref().unwrap_or(&snapshot.display), self.background);
        }
    }

    /// Recreate the surfaces for a new logical size or pixel ratio, keeping
    /// their content at the same world positions.
    pub fn resize(&mut self, logical_size: Size, device_pixel_ratio: f64) -> RenderResult<()> {
        let display = self.display.resized(logical_size, device_pixel_ratio, self.background)?;
        let export = match (&self.export, self.export_scale) {
            (Some(export), Some(scale)) => Some(export.resized(logical_size, scale, self.background)?),
            _ => None,
        };
        self.display = display;
        self.export = export;
        log::debug!(
            "surfaces resized to {}x{} logical at {device_pixel_ratio}x",
            logical_size.width,
            logical_size.height
        );
        Ok(())
    }

    pub fn set_prediction(&mut self, prediction: Option<Prediction>) {
        self.prediction = prediction;
    }

    pub fn prediction(&self) -> Option<&Prediction> {
        self.prediction.as_ref()
    }

    /// Render the display surface through the viewport into a new pixmap of
    /// the display's size, with the prediction overlay on top.
    pub fn compose_view(&self, viewport: &Viewport) -> RenderResult<Pixmap> {
        let scale = self.display.scale();
        let (width, height) = backing_dimensions(self.display.logical_size(), scale);
        let mut view = Pixmap::new(width, height).ok_or(RenderError::InvalidDimensions { width, height })?;

        let world_to_view = Affine::scale(scale) * viewport.transform();
        let surface_to_view = world_to_view * Affine::scale(1.0 / scale);
        let quality = if viewport.zoom() == 1.0 {
            FilterQuality::Nearest
        } else {
            FilterQuality::Bilinear
        };
        let paint = PixmapPaint {
            opacity: 1.0,
            blend_mode: BlendMode::SourceOver,
            quality,
        };
        view.draw_pixmap(0, 0, self.display.pixmap().as_ref(), &paint, to_skia(surface_to_view), None);

        if let Some(prediction) = self.prediction.filter(|p| p.style.tool == ToolKind::Brush) {
            let style = BrushStyle {
                opacity: prediction.style.opacity * PREDICTION_OPACITY,
                ..prediction.style
            };
            let mut path = BezPath::new();
            path.move_to(prediction.from);
            path.line_to(prediction.to);
            stroke_bez_path(&mut view, &path, &style, to_skia(world_to_view));
        }
        Ok(view)
    }

    /// Straight-alpha display pixel covering a world point.
    pub fn pixel(&self, world: Point) -> Option<Rgba> {
        self.display.pixel_at(world)
    }

    /// PNG bytes of the highest-resolution surface.
    pub fn encode_png(&self) -> RenderResult<Vec<u8>> {
        crate::export::encode_png(self.output().pixmap())
    }
}
