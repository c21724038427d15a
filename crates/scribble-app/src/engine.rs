//! The drawing engine: composition root for transform, viewport, capture,
//! history and rendering, and the API a hosting application talks to.

use crate::event_handler::EventHandler;
use kurbo::{Point, Size, Vec2};
use scribble_core::config::{ConfigError, ConfigUpdate, EngineConfig};
use scribble_core::history::History;
use scribble_core::input::PointerEvent;
use scribble_core::scheduler::{Debounce, Scheduler, Throttle};
use scribble_core::stroke::{InputPoint, Stroke, content_bounds};
use scribble_core::style::{Rgba, ToolKind};
use scribble_core::transform::{CoordinateTransform, DisplayGeometry, GeometrySource};
use scribble_core::viewport::Viewport;
use scribble_render::{DrawCommand, Pixmap, RenderError, RenderPipeline, SurfaceSnapshot, to_data_uri};
use std::time::Duration;
use thiserror::Error;

/// Engine errors.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("Engine has been disposed")]
    Disposed,
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

type SaveCallback = Box<dyn FnMut(&str)>;
type ClearCallback = Box<dyn FnMut()>;
type DrawingChangeCallback = Box<dyn FnMut(bool)>;

/// Notifications delivered to the host.
#[derive(Default)]
pub struct EngineCallbacks {
    /// Receives the data URI produced by [`Engine::save`].
    pub on_save: Option<SaveCallback>,
    /// Called after [`Engine::clear`].
    pub on_clear: Option<ClearCallback>,
    /// Called when the canvas goes from empty to non-empty or back.
    pub on_drawing_change: Option<DrawingChangeCallback>,
}

impl EngineCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_on_save(mut self, f: impl FnMut(&str) + 'static) -> Self {
        self.on_save = Some(Box::new(f));
        self
    }

    pub fn with_on_clear(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_clear = Some(Box::new(f));
        self
    }

    pub fn with_on_drawing_change(mut self, f: impl FnMut(bool) + 'static) -> Self {
        self.on_drawing_change = Some(Box::new(f));
        self
    }
}

impl std::fmt::Debug for EngineCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineCallbacks")
            .field("on_save", &self.on_save.is_some())
            .field("on_clear", &self.on_clear.is_some())
            .field("on_drawing_change", &self.on_drawing_change.is_some())
            .finish()
    }
}

/// Read-only state reported to the host.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasInfo {
    pub zoom_percent: u32,
    /// Logical canvas width.
    pub width: f64,
    /// Logical canvas height.
    pub height: f64,
    pub has_content: bool,
    /// Time since the engine was created.
    pub elapsed: Duration,
    pub tool: ToolKind,
    pub can_undo: bool,
    pub can_redo: bool,
}

/// Result of a frame callback.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutcome {
    /// The composed view changed and the frame interval has elapsed.
    pub redraw: bool,
    /// Periodic info refresh, at most once per second.
    pub info: Option<CanvasInfo>,
}

/// A committed state: surface pixels plus the strokes that produced them.
#[derive(Debug, Clone)]
struct Checkpoint {
    surfaces: SurfaceSnapshot,
    strokes: Vec<Stroke>,
}

/// A freehand drawing engine instance.
pub struct Engine {
    config: EngineConfig,
    geometry_source: Box<dyn GeometrySource>,
    transform: CoordinateTransform,
    viewport: Viewport,
    handler: EventHandler,
    pipeline: RenderPipeline,
    history: History<Checkpoint>,
    /// Committed strokes of the current state.
    strokes: Vec<Stroke>,
    callbacks: EngineCallbacks,
    scheduler: Scheduler,
    frame: Throttle,
    info_refresh: Throttle,
    resize_debounce: Debounce,
    pending_size: Option<Size>,
    created_at: Duration,
    /// Content or view changed since the last redraw.
    dirty: bool,
    /// Last has-content value reported through `on_drawing_change`.
    reported_content: bool,
    disposed: bool,
}

impl Engine {
    /// Build an engine. The surfaces are filled with the background and the
    /// initial state becomes the first history entry.
    pub fn new(
        mut config: EngineConfig,
        geometry_source: Box<dyn GeometrySource>,
        callbacks: EngineCallbacks,
        scheduler: Scheduler,
    ) -> EngineResult<Self> {
        config.validate()?;
        config.brush = config.brush.clamped();

        let logical = Size::new(config.width, config.height);
        let fallback = DisplayGeometry::new(Point::ZERO, logical, config.device_pixel_ratio);
        let geometry = geometry_source
            .read_geometry()
            .filter(DisplayGeometry::is_usable)
            .unwrap_or(fallback);
        let transform = CoordinateTransform::new(logical, geometry);

        let viewport = Viewport::new(logical)
            .with_zoom_bounds(config.min_zoom, config.max_zoom)
            .with_overscroll(config.overscroll);
        let settings = config.profile.settings();
        let handler = EventHandler::new(settings, config.smoothing, config.prediction);
        let pipeline = RenderPipeline::new(
            logical,
            transform.backing_scale(),
            config.export_scale,
            config.background_color,
        )?;

        let mut history = History::new(config.effective_history_capacity());
        history.commit(Checkpoint {
            surfaces: pipeline.snapshot(),
            strokes: Vec::new(),
        });

        let frame = scheduler.frame_throttle(settings.frame_interval);
        let info_refresh = scheduler.info_refresh();
        let resize_debounce = scheduler.resize_debounce();
        let created_at = scheduler.now();

        log::info!(
            "engine created: {}x{} at {}x, profile {:?}, export {:?}",
            config.width,
            config.height,
            transform.backing_scale(),
            config.profile,
            config.export_scale
        );

        Ok(Self {
            config,
            geometry_source,
            transform,
            viewport,
            handler,
            pipeline,
            history,
            strokes: Vec::new(),
            callbacks,
            scheduler,
            frame,
            info_refresh,
            resize_debounce,
            pending_size: None,
            created_at,
            dirty: true,
            reported_content: false,
            disposed: false,
        })
    }

    /// An engine on a fixed 1:1 display and the system clock.
    pub fn with_config(config: EngineConfig) -> EngineResult<Self> {
        let geometry = DisplayGeometry::new(
            Point::ZERO,
            Size::new(config.width, config.height),
            config.device_pixel_ratio,
        );
        Self::new(config, Box::new(geometry), EngineCallbacks::default(), Scheduler::system())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn transform(&self) -> &CoordinateTransform {
        &self.transform
    }

    pub fn pipeline(&self) -> &RenderPipeline {
        &self.pipeline
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Whether a stroke is being captured.
    pub fn is_drawing(&self) -> bool {
        self.handler.is_drawing()
    }

    // --- Input ---

    /// Feed one pointer or touch event, in screen pixels.
    pub fn handle_pointer(&mut self, event: &PointerEvent) {
        if !self.live("handle_pointer") {
            return;
        }
        self.refresh_geometry();
        if self.config.disabled {
            return;
        }

        let logical = self.transform.to_logical(event.position);
        let world = self.viewport.to_world(logical);
        let mut point = InputPoint::new(world);
        point.timestamp_ms = event.timestamp_ms;
        if let Some(pressure) = event.pressure {
            point = point.with_pressure(pressure);
        }

        let outcome = self.handler.handle(event, point, self.config.brush);
        for command in &outcome.commands {
            self.pipeline.apply(command);
            self.dirty = true;
        }
        self.update_prediction();
        if let Some(stroke) = outcome.finished {
            self.commit_stroke(stroke);
        }
    }

    // --- Tools and brush ---

    pub fn set_tool(&mut self, tool: ToolKind) {
        self.apply(&ConfigUpdate {
            brush_tool: Some(tool),
            ..ConfigUpdate::default()
        });
    }

    /// Brush width in world units, clamped to the supported range.
    pub fn set_brush_size(&mut self, size: f64) {
        self.apply(&ConfigUpdate {
            brush_size: Some(size),
            ..ConfigUpdate::default()
        });
    }

    /// Brush color as `#rgb`, `#rrggbb` or `#rrggbbaa`. Anything else is
    /// logged and ignored.
    pub fn set_brush_color(&mut self, color: &str) {
        let Some(color) = Rgba::from_hex(color) else {
            log::warn!("ignoring invalid brush color {color:?}");
            return;
        };
        self.apply(&ConfigUpdate {
            brush_color: Some(color),
            ..ConfigUpdate::default()
        });
    }

    pub fn set_brush_opacity(&mut self, opacity: f64) {
        self.apply(&ConfigUpdate {
            brush_opacity: Some(opacity),
            ..ConfigUpdate::default()
        });
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.apply(&ConfigUpdate {
            disabled: Some(disabled),
            ..ConfigUpdate::default()
        });
    }

    /// Apply a partial configuration update; see [`EngineConfig::apply`].
    pub fn apply(&mut self, update: &ConfigUpdate) {
        if !self.live("apply") {
            return;
        }
        let changes = self.config.apply(update);
        if !changes.any() {
            return;
        }

        if changes.disabled && self.config.disabled {
            log::debug!("input disabled");
            self.finish_stroke();
        }
        if changes.zoom && !self.config.enable_zoom {
            self.viewport.reset_zoom();
            self.dirty = true;
        }
        if changes.background {
            self.pipeline.set_background(self.config.background_color);
        }
        if changes.capture {
            let settings = self.config.profile.settings();
            self.handler
                .configure(settings, self.config.smoothing, self.config.prediction);
            self.frame.set_interval(settings.frame_interval);
            self.update_prediction();
        }
    }

    // --- History ---

    /// Step back one entry. An in-flight stroke is committed first.
    pub fn undo(&mut self) {
        if !self.live("undo") {
            return;
        }
        self.finish_stroke();
        match self.history.undo().cloned() {
            Some(checkpoint) => {
                log::debug!("undo to entry {}", self.history.cursor());
                self.restore(checkpoint);
            }
            None => log::debug!("nothing to undo"),
        }
    }

    /// Step forward one entry.
    pub fn redo(&mut self) {
        if !self.live("redo") {
            return;
        }
        self.finish_stroke();
        match self.history.redo().cloned() {
            Some(checkpoint) => {
                log::debug!("redo to entry {}", self.history.cursor());
                self.restore(checkpoint);
            }
            None => log::debug!("nothing to redo"),
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.disposed && self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        !self.disposed && self.history.can_redo()
    }

    /// Fill both surfaces with the background, drop all strokes and record
    /// the empty state.
    pub fn clear(&mut self) {
        if !self.live("clear") {
            return;
        }
        self.finish_stroke();
        self.pipeline.apply(&DrawCommand::Clear {
            background: self.config.background_color,
        });
        self.strokes.clear();
        self.checkpoint();
        self.dirty = true;
        log::debug!("canvas cleared");

        if let Some(on_clear) = self.callbacks.on_clear.as_mut() {
            on_clear();
        }
        self.notify_content_change();
    }

    // --- Export ---

    /// Encode the highest-resolution surface as a PNG data URI and pass it to
    /// `on_save`.
    pub fn save(&mut self) -> EngineResult<String> {
        if !self.live("save") {
            return Err(EngineError::Disposed);
        }
        let png = self.pipeline.encode_png()?;
        let uri = to_data_uri(&png);
        log::info!("saved {} byte PNG", png.len());
        if let Some(on_save) = self.callbacks.on_save.as_mut() {
            on_save(&uri);
        }
        Ok(uri)
    }

    /// Raw PNG bytes of the highest-resolution surface.
    pub fn save_png(&self) -> EngineResult<Vec<u8>> {
        if !self.live("save_png") {
            return Err(EngineError::Disposed);
        }
        Ok(self.pipeline.encode_png()?)
    }

    // --- Zoom and pan ---

    pub fn zoom_in(&mut self) {
        if self.zoom_allowed("zoom_in") {
            self.viewport.zoom_in();
            self.view_changed();
        }
    }

    pub fn zoom_out(&mut self) {
        if self.zoom_allowed("zoom_out") {
            self.viewport.zoom_out();
            self.view_changed();
        }
    }

    pub fn reset_zoom(&mut self) {
        if self.zoom_allowed("reset_zoom") {
            self.viewport.reset_zoom();
            self.view_changed();
        }
    }

    /// Fit the committed strokes into the view.
    pub fn zoom_to_fit(&mut self) {
        if self.zoom_allowed("zoom_to_fit") {
            self.viewport.zoom_to_fit(content_bounds(&self.strokes));
            self.view_changed();
        }
    }

    /// Zoom to `zoom`, keeping the content under the screen point fixed.
    pub fn zoom_to_point(&mut self, screen: Point, zoom: f64) {
        if self.zoom_allowed("zoom_to_point") {
            self.refresh_geometry();
            let logical = self.transform.to_logical(screen);
            self.viewport.zoom_to_point(logical, zoom);
            self.view_changed();
        }
    }

    /// Pan by a delta in screen pixels.
    pub fn pan_by(&mut self, screen_delta: Vec2) {
        if self.zoom_allowed("pan_by") {
            self.refresh_geometry();
            let scale = self.transform.display_scale();
            self.viewport
                .pan_by(Vec2::new(screen_delta.x / scale.x, screen_delta.y / scale.y));
            self.view_changed();
        }
    }

    // --- Sizing and frames ---

    /// Request a new logical canvas size. Applied by [`Engine::tick`] once
    /// resize requests have been quiet for the debounce period.
    pub fn resize(&mut self, width: f64, height: f64) {
        if !self.live("resize") {
            return;
        }
        let size = Size::new(width, height);
        if !(size.is_finite() && width > 0.0 && height > 0.0) {
            log::warn!("ignoring resize to {width}x{height}");
            return;
        }
        self.pending_size = Some(size);
        self.resize_debounce.trigger(self.scheduler.now());
    }

    /// Frame callback: applies a settled resize, reports whether a redraw is
    /// due and periodically refreshes the canvas info.
    pub fn tick(&mut self) -> TickOutcome {
        if self.disposed {
            return TickOutcome::default();
        }
        let now = self.scheduler.now();
        if self.resize_debounce.poll(now) {
            if let Some(size) = self.pending_size.take() {
                self.apply_resize(size, self.transform.backing_scale());
            }
        }

        let redraw = self.dirty && self.frame.ready(now);
        if redraw {
            self.dirty = false;
        }
        let info = self.info_refresh.ready(now).then(|| self.get_canvas_info());
        TickOutcome { redraw, info }
    }

    /// The display surface composed through the viewport, with the motion
    /// prediction overlay.
    pub fn render_view(&self) -> EngineResult<Pixmap> {
        if !self.live("render_view") {
            return Err(EngineError::Disposed);
        }
        Ok(self.pipeline.compose_view(&self.viewport)?)
    }

    // --- Queries ---

    pub fn get_canvas_info(&self) -> CanvasInfo {
        CanvasInfo {
            zoom_percent: self.viewport.zoom_percent(),
            width: self.config.width,
            height: self.config.height,
            has_content: self.has_content(),
            elapsed: self.scheduler.now().saturating_sub(self.created_at),
            tool: self.config.brush.tool,
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
        }
    }

    /// Whether any stroke (eraser strokes included) is committed.
    pub fn has_content(&self) -> bool {
        !self.strokes.is_empty()
    }

    /// Straight-alpha display pixel covering a world point.
    pub fn pixel(&self, world: Point) -> Option<Rgba> {
        self.pipeline.pixel(world)
    }

    /// Committed strokes, oldest first.
    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    // --- Lifecycle ---

    /// Drop callbacks, cancel timers and abandon any gesture. Later calls are
    /// logged no-ops.
    pub fn dispose(&mut self) {
        if self.disposed {
            log::debug!("engine already disposed");
            return;
        }
        self.handler.abandon();
        self.pipeline.set_prediction(None);
        self.callbacks = EngineCallbacks::default();
        self.resize_debounce.cancel();
        self.pending_size = None;
        self.disposed = true;
        log::info!("engine disposed");
    }

    // --- Internals ---

    fn live(&self, operation: &str) -> bool {
        if self.disposed {
            log::warn!("{operation} called on a disposed engine");
        }
        !self.disposed
    }

    fn zoom_allowed(&self, operation: &str) -> bool {
        if !self.live(operation) {
            return false;
        }
        if !self.config.enable_zoom {
            log::debug!("{operation} ignored, zoom is disabled");
        }
        self.config.enable_zoom
    }

    fn view_changed(&mut self) {
        self.dirty = true;
    }

    /// Re-read the host geometry. A pixel-ratio change rebuilds the surfaces
    /// immediately.
    fn refresh_geometry(&mut self) {
        if self.transform.refresh(self.geometry_source.as_ref())
            && self.transform.backing_scale() != self.pipeline.display().scale()
        {
            let logical = self.transform.logical_size();
            self.apply_resize(logical, self.transform.backing_scale());
        }
    }

    fn apply_resize(&mut self, logical: Size, scale: f64) {
        if let Err(err) = self.pipeline.resize(logical, scale) {
            log::warn!("resize to {}x{} failed: {err}", logical.width, logical.height);
            return;
        }
        self.transform.set_logical_size(logical);
        self.viewport.set_canvas_size(logical);
        self.config.width = logical.width;
        self.config.height = logical.height;
        self.dirty = true;
    }

    fn update_prediction(&mut self) {
        let prediction = self.handler.prediction();
        if prediction.is_some() || self.pipeline.prediction().is_some() {
            self.dirty = true;
        }
        self.pipeline.set_prediction(prediction);
    }

    fn finish_stroke(&mut self) {
        let outcome = self.handler.finish();
        for command in &outcome.commands {
            self.pipeline.apply(command);
        }
        self.update_prediction();
        if let Some(stroke) = outcome.finished {
            self.commit_stroke(stroke);
        }
    }

    fn commit_stroke(&mut self, stroke: Stroke) {
        self.strokes.push(stroke);
        self.checkpoint();
        self.dirty = true;
        self.notify_content_change();
    }

    fn checkpoint(&mut self) {
        let index = self.history.commit(Checkpoint {
            surfaces: self.pipeline.snapshot(),
            strokes: self.strokes.clone(),
        });
        log::debug!("history entry {index} ({} kept)", self.history.len());
    }

    fn restore(&mut self, checkpoint: Checkpoint) {
        self.pipeline.restore(&checkpoint.surfaces);
        self.strokes = checkpoint.strokes;
        self.dirty = true;
        self.notify_content_change();
    }

    fn notify_content_change(&mut self) {
        let has_content = self.has_content();
        if has_content == self.reported_content {
            return;
        }
        self.reported_content = has_content;
        if let Some(on_drawing_change) = self.callbacks.on_drawing_change.as_mut() {
            on_drawing_change(has_content);
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("viewport", &self.viewport)
            .field("strokes", &self.strokes.len())
            .field("history", &self.history.len())
            .field("disposed", &self.disposed)
            .finish()
    }
}
