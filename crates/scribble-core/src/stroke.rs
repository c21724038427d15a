//! Strokes: finalized point sequences with their style.

use crate::style::{BrushStyle, ToolKind};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for strokes.
pub type StrokeId = Uuid;

/// A recorded input sample in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputPoint {
    pub position: Point,
    /// Pen pressure in `[0, 1]`, when the device reports one.
    #[serde(default)]
    pub pressure: Option<f64>,
    /// Milliseconds on the host clock.
    #[serde(default)]
    pub timestamp_ms: Option<f64>,
    /// World units per millisecond, relative to the previous sample.
    #[serde(default)]
    pub velocity: Option<f64>,
}

impl InputPoint {
    pub fn new(position: Point) -> Self {
        Self {
            position,
            pressure: None,
            timestamp_ms: None,
            velocity: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp_ms: f64) -> Self {
        self.timestamp_ms = Some(timestamp_ms);
        self
    }

    pub fn with_pressure(mut self, pressure: f64) -> Self {
        self.pressure = Some(pressure.clamp(0.0, 1.0));
        self
    }

    pub fn distance(&self, other: &InputPoint) -> f64 {
        self.position.distance(other.position)
    }
}

/// One continuous paint or erase gesture.
///
/// Strokes are immutable once built: the capture state machine assembles the
/// point list and hands over a finished stroke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    id: StrokeId,
    points: Vec<InputPoint>,
    style: BrushStyle,
    smoothed: bool,
}

impl Stroke {
    /// Build a finalized stroke. An empty point list is not a stroke.
    pub fn new(points: Vec<InputPoint>, style: BrushStyle, smoothed: bool) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        Some(Self {
            id: Uuid::new_v4(),
            points,
            style,
            smoothed,
        })
    }

    pub fn id(&self) -> StrokeId {
        self.id
    }

    pub fn points(&self) -> &[InputPoint] {
        &self.points
    }

    pub fn style(&self) -> &BrushStyle {
        &self.style
    }

    pub fn tool(&self) -> ToolKind {
        self.style.tool
    }

    pub fn is_smoothed(&self) -> bool {
        self.smoothed
    }

    /// A single-point stroke, rendered as a round dot.
    pub fn is_dot(&self) -> bool {
        self.points.len() == 1
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Area covered by the stroke, including half the brush width on each side.
    pub fn bounds(&self) -> Rect {
        let mut min_x = f64::MAX;
        let mut min_y = f64::MAX;
        let mut max_x = f64::MIN;
        let mut max_y = f64::MIN;

        for point in &self.points {
            min_x = min_x.min(point.position.x);
            min_y = min_y.min(point.position.y);
            max_x = max_x.max(point.position.x);
            max_y = max_y.max(point.position.y);
        }

        Rect::new(min_x, min_y, max_x, max_y).inflate(self.style.width / 2.0, self.style.width / 2.0)
    }
}

/// Union of the bounds of `strokes`, or `None` when there are none.
pub fn content_bounds<'a>(strokes: impl IntoIterator<Item = &'a Stroke>) -> Option<Rect> {
    strokes
        .into_iter()
        .map(Stroke::bounds)
        .reduce(|acc, bounds| acc.union(bounds))
}
