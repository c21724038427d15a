//! Pointer and touch events delivered by the host.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Identifies one contact (mouse, pen, or a single finger).
pub type PointerId = u64;

/// Device that produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerKind {
    #[default]
    Mouse,
    Pen,
    Touch,
}

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    #[default]
    Primary,
    Secondary,
    Middle,
}

/// Phase of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    /// The pointer left the tracked element.
    Leave,
    /// The platform cancelled the contact (e.g. a touch turned into a scroll).
    Cancel,
}

/// A pointer or touch event in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    #[serde(default)]
    pub pointer_id: PointerId,
    #[serde(default)]
    pub kind: PointerKind,
    #[serde(default)]
    pub button: MouseButton,
    /// Position in screen pixels.
    pub position: Point,
    #[serde(default)]
    pub pressure: Option<f64>,
    /// Event time in milliseconds on the host clock.
    #[serde(default)]
    pub timestamp_ms: Option<f64>,
}

impl PointerEvent {
    /// A primary-button mouse event with pointer id 0.
    pub fn new(phase: PointerPhase, position: Point) -> Self {
        Self {
            phase,
            pointer_id: 0,
            kind: PointerKind::Mouse,
            button: MouseButton::Primary,
            position,
            pressure: None,
            timestamp_ms: None,
        }
    }

    pub fn down(position: Point) -> Self {
        Self::new(PointerPhase::Down, position)
    }

    pub fn moved(position: Point) -> Self {
        Self::new(PointerPhase::Move, position)
    }

    pub fn up(position: Point) -> Self {
        Self::new(PointerPhase::Up, position)
    }

    pub fn leave(position: Point) -> Self {
        Self::new(PointerPhase::Leave, position)
    }

    pub fn cancel(position: Point) -> Self {
        Self::new(PointerPhase::Cancel, position)
    }

    /// A touch event for the finger identified by `pointer_id`.
    pub fn touch(phase: PointerPhase, pointer_id: PointerId, position: Point) -> Self {
        Self {
            pointer_id,
            kind: PointerKind::Touch,
            ..Self::new(phase, position)
        }
    }

    pub fn with_timestamp(mut self, timestamp_ms: f64) -> Self {
        self.timestamp_ms = Some(timestamp_ms);
        self
    }

    pub fn with_pressure(mut self, pressure: f64) -> Self {
        self.pressure = Some(pressure);
        self
    }

    pub fn with_button(mut self, button: MouseButton) -> Self {
        self.button = button;
        self
    }

    /// Whether this event ends the gesture of its pointer.
    pub fn ends_gesture(&self) -> bool {
        matches!(self.phase, PointerPhase::Up | PointerPhase::Leave | PointerPhase::Cancel)
    }

    /// Whether the event can start a stroke: mouse events need the primary button.
    pub fn is_drawing_button(&self) -> bool {
        self.kind != PointerKind::Mouse || self.button == MouseButton::Primary
    }
}
