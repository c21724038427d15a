//! Scribble Core Library
//!
//! Platform-agnostic drawing engine logic: coordinate mapping, zoom/pan,
//! stroke capture and smoothing, undo history, configuration and timing.

pub mod capture;
pub mod config;
pub mod history;
pub mod input;
pub mod scheduler;
pub mod smoothing;
pub mod stroke;
pub mod style;
pub mod transform;
pub mod viewport;

pub use capture::{CaptureStep, FinishedStroke, StrokeCapture};
pub use config::{AppliedChanges, ConfigError, ConfigResult, ConfigUpdate, EngineConfig, Profile, ProfileSettings};
pub use history::History;
pub use input::{MouseButton, PointerEvent, PointerId, PointerKind, PointerPhase};
pub use scheduler::{Clock, Debounce, ManualClock, Scheduler, SystemClock, Throttle};
pub use smoothing::{MotionPredictor, Segment, SplineParams};
pub use stroke::{InputPoint, Stroke, StrokeId};
pub use style::{BrushStyle, Composite, Rgba, ToolKind};
pub use transform::{CoordinateTransform, DisplayGeometry, GeometrySource};
pub use viewport::Viewport;
