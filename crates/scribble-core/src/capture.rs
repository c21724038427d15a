//! Stroke capture state machine: Idle → Capturing → Idle.
//!
//! The capture receives points already mapped to world coordinates, filters
//! them, and reports what has to be drawn for each accepted point. A finished
//! gesture is handed back as an immutable [`Stroke`].

use crate::config::ProfileSettings;
use crate::input::PointerId;
use crate::smoothing::{Segment, catmull_rom, closing_segment, live_segment};
use crate::stroke::{InputPoint, Stroke};
use crate::style::BrushStyle;
use kurbo::Point;

/// Drawing work produced by one accepted input point.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureStep {
    /// First point of a stroke, drawn as a round dot of the brush width.
    Dot { center: Point, style: BrushStyle },
    /// A new piece of the stroke.
    Segment { segment: Segment, style: BrushStyle },
}

/// A finalized gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct FinishedStroke {
    pub stroke: Stroke,
    /// Remaining geometry to draw (the tail of a smoothed stroke).
    pub tail: Option<Segment>,
}

#[derive(Debug, Clone)]
struct ActiveStroke {
    pointer_id: PointerId,
    points: Vec<InputPoint>,
    style: BrushStyle,
    smoothed: bool,
}

/// State of the capture.
#[derive(Debug, Clone, Default)]
enum CaptureState {
    #[default]
    Idle,
    Capturing(ActiveStroke),
}

/// Turns a pointer gesture into a stroke.
#[derive(Debug, Clone)]
pub struct StrokeCapture {
    state: CaptureState,
    settings: ProfileSettings,
    smoothing: bool,
    prediction: bool,
}

impl StrokeCapture {
    pub fn new(settings: ProfileSettings, smoothing: bool, prediction: bool) -> Self {
        Self {
            state: CaptureState::Idle,
            settings,
            smoothing,
            prediction,
        }
    }

    /// Swap tuning values. An in-flight stroke keeps its smoothing flag.
    pub fn set_settings(&mut self, settings: ProfileSettings) {
        self.settings = settings;
    }

    pub fn settings(&self) -> &ProfileSettings {
        &self.settings
    }

    pub fn set_smoothing(&mut self, smoothing: bool) {
        self.smoothing = smoothing;
    }

    pub fn set_prediction(&mut self, prediction: bool) {
        self.prediction = prediction;
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self.state, CaptureState::Capturing(_))
    }

    /// Pointer that owns the current stroke.
    pub fn active_pointer(&self) -> Option<PointerId> {
        match &self.state {
            CaptureState::Capturing(active) => Some(active.pointer_id),
            CaptureState::Idle => None,
        }
    }

    /// Points accepted so far in the current stroke.
    pub fn points(&self) -> &[InputPoint] {
        match &self.state {
            CaptureState::Capturing(active) => &active.points,
            CaptureState::Idle => &[],
        }
    }

    /// Start a stroke. Ignored while another stroke is being captured and for
    /// non-finite positions.
    pub fn begin(&mut self, pointer_id: PointerId, point: InputPoint, style: BrushStyle) -> Option<CaptureStep> {
        if let CaptureState::Capturing(active) = &self.state {
            log::debug!(
                "pointer {pointer_id} ignored, pointer {} is already drawing",
                active.pointer_id
            );
            return None;
        }
        if !point.position.is_finite() {
            log::warn!("rejecting non-finite stroke start {:?}", point.position);
            return None;
        }

        let style = style.clamped();
        log::debug!("stroke begin: pointer {pointer_id}, {} at {:?}", style.tool.name(), point.position);
        self.state = CaptureState::Capturing(ActiveStroke {
            pointer_id,
            points: vec![point],
            style,
            smoothed: self.smoothing,
        });
        Some(CaptureStep::Dot {
            center: point.position,
            style,
        })
    }

    /// Add a point to the current stroke. Points closer than the profile's
    /// minimum distance, from another pointer, or non-finite are dropped.
    pub fn update(&mut self, pointer_id: PointerId, mut point: InputPoint) -> Option<CaptureStep> {
        let min_distance = self.settings.min_point_distance;
        let CaptureState::Capturing(active) = &mut self.state else {
            return None;
        };
        if active.pointer_id != pointer_id {
            return None;
        }
        if !point.position.is_finite() {
            log::warn!("rejecting non-finite stroke point {:?}", point.position);
            return None;
        }

        let n = active.points.len();
        let previous = active.points[n - 1];
        let distance = previous.distance(&point);
        if distance <= min_distance {
            return None;
        }
        if let (Some(t0), Some(t1)) = (previous.timestamp_ms, point.timestamp_ms) {
            let dt = t1 - t0;
            if dt > 0.0 {
                point.velocity = Some(distance / dt);
            }
        }

        let before = n.checked_sub(2).map(|i| active.points[i].position);
        let segment = live_segment(before, previous.position, point.position, active.smoothed);
        active.points.push(point);
        Some(CaptureStep::Segment {
            segment,
            style: active.style,
        })
    }

    /// End the stroke owned by `pointer_id`. Events from other pointers are ignored.
    pub fn end(&mut self, pointer_id: PointerId) -> Option<FinishedStroke> {
        if self.active_pointer() != Some(pointer_id) {
            return None;
        }
        self.finish()
    }

    /// End the current stroke whichever pointer owns it.
    pub fn finish(&mut self) -> Option<FinishedStroke> {
        let CaptureState::Capturing(active) = std::mem::take(&mut self.state) else {
            return None;
        };

        let n = active.points.len();
        let tail = (active.smoothed && n >= 2)
            .then(|| closing_segment(active.points[n - 2].position, active.points[n - 1].position));

        let points = if active.smoothed && self.settings.spline_refit {
            catmull_rom(&active.points, self.settings.spline)
        } else {
            active.points
        };
        let stroke = Stroke::new(points, active.style, active.smoothed)?;
        log::debug!("stroke commit: {} points, id {}", stroke.len(), stroke.id());
        Some(FinishedStroke { stroke, tail })
    }

    /// Drop the current stroke without producing anything.
    pub fn abandon(&mut self) {
        if self.is_capturing() {
            log::debug!("stroke abandoned");
        }
        self.state = CaptureState::Idle;
    }

    /// Predicted extension of the current stroke, with its style.
    pub fn prediction(&self) -> Option<(Point, Point, BrushStyle)> {
        if !self.prediction {
            return None;
        }
        let CaptureState::Capturing(active) = &self.state else {
            return None;
        };
        let predictor = self.settings.predictor?;
        let (from, to) = predictor.predict(&active.points)?;
        Some((from, to, active.style))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Profile;
    use crate::style::ToolKind;

    fn capture() -> StrokeCapture {
        StrokeCapture::new(Profile::Balanced.settings(), false, true)
    }

    fn at(x: f64, y: f64) -> InputPoint {
        InputPoint::new(Point::new(x, y))
    }

    #[test]
    fn test_begin_emits_dot() {
        let mut capture = capture();
        let step = capture.begin(1, at(5.0, 5.0), BrushStyle::default());
        assert!(matches!(step, Some(CaptureStep::Dot { center, .. }) if center == Point::new(5.0, 5.0)));
        assert!(capture.is_capturing());
        assert_eq!(capture.active_pointer(), Some(1));
    }

    #[test]
    fn test_second_contact_ignored() {
        let mut capture = capture();
        capture.begin(1, at(0.0, 0.0), BrushStyle::default());
        assert!(capture.begin(2, at(50.0, 50.0), BrushStyle::default()).is_none());
        assert!(capture.update(2, at(60.0, 60.0)).is_none());
        assert!(capture.end(2).is_none());
        assert!(capture.is_capturing());
        assert_eq!(capture.points().len(), 1);
    }

    #[test]
    fn test_min_distance_filter() {
        let mut capture = capture();
        capture.begin(0, at(0.0, 0.0), BrushStyle::default());
        // Balanced keeps points further than 0.5 apart
        assert!(capture.update(0, at(0.3, 0.0)).is_none());
        assert!(capture.update(0, at(0.5, 0.0)).is_none());
        assert!(capture.update(0, at(1.0, 0.0)).is_some());
        assert_eq!(capture.points().len(), 2);
    }

    #[test]
    fn test_non_finite_point_rejected_without_abort() {
        let mut capture = capture();
        capture.begin(0, at(0.0, 0.0), BrushStyle::default());
        assert!(capture.update(0, at(f64::NAN, 3.0)).is_none());
        assert!(capture.is_capturing());
        assert!(capture.update(0, at(10.0, 0.0)).is_some());

        let mut idle = StrokeCapture::new(Profile::Balanced.settings(), false, false);
        assert!(idle.begin(0, at(f64::INFINITY, 0.0), BrushStyle::default()).is_none());
        assert!(!idle.is_capturing());
    }

    #[test]
    fn test_unsmoothed_emits_lines() {
        let mut capture = capture();
        capture.begin(0, at(0.0, 0.0), BrushStyle::default());
        let step = capture.update(0, at(10.0, 0.0));
        assert!(matches!(
            step,
            Some(CaptureStep::Segment { segment: Segment::Line { .. }, .. })
        ));
        let finished = capture.end(0).unwrap();
        assert!(finished.tail.is_none());
        assert_eq!(finished.stroke.len(), 2);
        assert!(!capture.is_capturing());
    }

    #[test]
    fn test_smoothed_stroke_is_refit() {
        let mut capture = StrokeCapture::new(Profile::Quality.settings(), true, false);
        capture.begin(0, at(0.0, 0.0), BrushStyle::default());
        capture.update(0, at(10.0, 10.0));
        let step = capture.update(0, at(20.0, 0.0));
        assert!(matches!(
            step,
            Some(CaptureStep::Segment { segment: Segment::Quad { .. }, .. })
        ));

        let finished = capture.end(0).unwrap();
        assert_eq!(
            finished.tail,
            Some(Segment::Line { from: Point::new(15.0, 5.0), to: Point::new(20.0, 0.0) })
        );
        let stroke = finished.stroke;
        assert!(stroke.is_smoothed());
        // Two segments of ten samples plus the start
        assert_eq!(stroke.len(), 21);
        assert_eq!(stroke.points()[0].position, Point::new(0.0, 0.0));
        assert_eq!(stroke.points()[20].position, Point::new(20.0, 0.0));
    }

    #[test]
    fn test_tap_yields_dot_stroke() {
        let mut capture = capture();
        capture.begin(0, at(50.0, 50.0), BrushStyle::default());
        let finished = capture.end(0).unwrap();
        assert!(finished.stroke.is_dot());
        assert!(finished.tail.is_none());
    }

    #[test]
    fn test_finish_ends_any_pointer() {
        let mut capture = capture();
        capture.begin(4, at(0.0, 0.0), BrushStyle::default());
        assert!(capture.finish().is_some());
        assert!(capture.finish().is_none());
        assert!(capture.update(4, at(10.0, 10.0)).is_none());
    }

    #[test]
    fn test_velocity_from_timestamps() {
        let mut capture = capture();
        capture.begin(0, at(0.0, 0.0).with_timestamp(0.0), BrushStyle::default());
        capture.update(0, at(10.0, 0.0).with_timestamp(5.0));
        let velocity = capture.points()[1].velocity.unwrap();
        assert!((velocity - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_prediction_only_while_capturing() {
        let mut capture = capture();
        assert!(capture.prediction().is_none());
        capture.begin(0, at(0.0, 0.0).with_timestamp(0.0), BrushStyle::default());
        capture.update(0, at(10.0, 0.0).with_timestamp(10.0));
        capture.update(0, at(20.0, 0.0).with_timestamp(20.0));
        let (from, to, _) = capture.prediction().unwrap();
        assert_eq!(from, Point::new(20.0, 0.0));
        assert!(to.x > from.x);

        capture.set_prediction(false);
        assert!(capture.prediction().is_none());
        capture.abandon();
        assert!(!capture.is_capturing());
    }

    #[test]
    fn test_style_is_captured_at_begin() {
        let mut capture = capture();
        let style = BrushStyle {
            tool: ToolKind::Eraser,
            width: 1_000.0,
            ..BrushStyle::default()
        };
        capture.begin(0, at(0.0, 0.0), style);
        let finished = capture.finish().unwrap();
        assert_eq!(finished.stroke.tool(), ToolKind::Eraser);
        assert!((finished.stroke.style().width - crate::style::MAX_BRUSH_SIZE).abs() < f64::EPSILON);
    }
}
