//! Stroke smoothing and motion prediction.
//!
//! Live rendering uses quadratic curves through the midpoints of consecutive
//! raw points. When a smoothed stroke is finalized its raw points are re-fit
//! with a centripetal Catmull-Rom spline; the endpoints are preserved exactly.

use crate::stroke::InputPoint;
use kurbo::{BezPath, Point, Vec2};

/// Number of control points a Catmull-Rom segment is evaluated from.
pub const SPLINE_WINDOW: usize = 4;
/// Default parameter increment when sampling a spline segment.
pub const DEFAULT_SPLINE_STEP: f64 = 0.1;
/// Knot exponent: 0.0 uniform, 0.5 centripetal, 1.0 chordal.
pub const CENTRIPETAL_ALPHA: f64 = 0.5;
/// Number of trailing points used to estimate velocity for prediction.
pub const PREDICTION_WINDOW: usize = 4;

/// A piece of stroke geometry ready to be rasterized, in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment {
    Line { from: Point, to: Point },
    Quad { from: Point, ctrl: Point, to: Point },
}

impl Segment {
    pub fn start(&self) -> Point {
        match *self {
            Segment::Line { from, .. } | Segment::Quad { from, .. } => from,
        }
    }

    pub fn end(&self) -> Point {
        match *self {
            Segment::Line { to, .. } | Segment::Quad { to, .. } => to,
        }
    }

    pub fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        match *self {
            Segment::Line { from, to } => {
                path.move_to(from);
                path.line_to(to);
            }
            Segment::Quad { from, ctrl, to } => {
                path.move_to(from);
                path.quad_to(ctrl, to);
            }
        }
        path
    }
}

/// Segment to draw when `current` is accepted after `previous` (and the point
/// before it, if any). Smoothed strokes curve through the raw points, ending
/// at the midpoint of the newest pair; [`closing_segment`] finishes the tail.
pub fn live_segment(before: Option<Point>, previous: Point, current: Point, smoothed: bool) -> Segment {
    if !smoothed {
        return Segment::Line { from: previous, to: current };
    }
    let from = before.map_or(previous, |b| b.midpoint(previous));
    Segment::Quad {
        from,
        ctrl: previous,
        to: previous.midpoint(current),
    }
}

/// The straight tail from the last midpoint to the last raw point of a
/// smoothed stroke.
pub fn closing_segment(previous: Point, last: Point) -> Segment {
    Segment::Line {
        from: previous.midpoint(last),
        to: last,
    }
}

/// Parameters of the finalization spline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplineParams {
    /// Parameter increment within each segment, in `(0, 1]`.
    pub step: f64,
    /// Knot exponent.
    pub alpha: f64,
}

impl Default for SplineParams {
    fn default() -> Self {
        Self {
            step: DEFAULT_SPLINE_STEP,
            alpha: CENTRIPETAL_ALPHA,
        }
    }
}

/// Re-fit `points` with a Catmull-Rom spline.
///
/// Coincident consecutive points are dropped first. Fewer than three distinct
/// points are returned unchanged. The first and last points are kept as-is.
pub fn catmull_rom(points: &[InputPoint], params: SplineParams) -> Vec<InputPoint> {
    let distinct = dedup_coincident(points);
    if distinct.len() < 3 {
        return points.to_vec();
    }

    let step = if params.step.is_finite() && params.step > 0.0 { params.step.min(1.0) } else { DEFAULT_SPLINE_STEP };
    let samples = (1.0 / step).round().max(1.0) as usize;

    // Phantom control points extend the first and last segments linearly.
    let n = distinct.len();
    let head = reflect(distinct[1].position, distinct[0].position);
    let tail = reflect(distinct[n - 2].position, distinct[n - 1].position);

    let mut out = Vec::with_capacity((n - 1) * samples + 1);
    out.push(distinct[0]);

    for i in 0..n - 1 {
        let p0 = if i == 0 { head } else { distinct[i - 1].position };
        let p1 = distinct[i].position;
        let p2 = distinct[i + 1].position;
        let p3 = if i + 2 < n { distinct[i + 2].position } else { tail };
        let window: [Point; SPLINE_WINDOW] = [p0, p1, p2, p3];

        for s in 1..=samples {
            let u = s as f64 / samples as f64;
            let position = if s == samples { p2 } else { evaluate(window, params.alpha, u) };
            out.push(interpolate_sample(&distinct[i], &distinct[i + 1], position, u));
        }
    }

    if let (Some(last), Some(raw_last)) = (out.last_mut(), distinct.last()) {
        *last = *raw_last;
    }
    out
}

/// Evaluate one Catmull-Rom segment between `p[1]` and `p[2]` at `u ∈ [0, 1]`
/// using the Barry-Goldman pyramid.
fn evaluate(p: [Point; SPLINE_WINDOW], alpha: f64, u: f64) -> Point {
    let knot = |a: Point, b: Point| a.distance(b).powf(alpha).max(1e-9);
    let t0 = 0.0;
    let t1 = t0 + knot(p[0], p[1]);
    let t2 = t1 + knot(p[1], p[2]);
    let t3 = t2 + knot(p[2], p[3]);
    let t = t1 + (t2 - t1) * u;

    let a1 = p[0].lerp(p[1], (t - t0) / (t1 - t0));
    let a2 = p[1].lerp(p[2], (t - t1) / (t2 - t1));
    let a3 = p[2].lerp(p[3], (t - t2) / (t3 - t2));
    let b1 = a1.lerp(a2, (t - t0) / (t2 - t0));
    let b2 = a2.lerp(a3, (t - t1) / (t3 - t1));
    b1.lerp(b2, (t - t1) / (t2 - t1))
}

fn reflect(inner: Point, edge: Point) -> Point {
    edge + (edge - inner)
}

fn dedup_coincident(points: &[InputPoint]) -> Vec<InputPoint> {
    let mut out: Vec<InputPoint> = Vec::with_capacity(points.len());
    for point in points {
        match out.last() {
            Some(last) if last.distance(point) < 1e-9 => {}
            _ => out.push(*point),
        }
    }
    out
}

fn interpolate_sample(a: &InputPoint, b: &InputPoint, position: Point, u: f64) -> InputPoint {
    let lerp = |x: Option<f64>, y: Option<f64>| match (x, y) {
        (Some(x), Some(y)) => Some(x + (y - x) * u),
        _ => None,
    };
    InputPoint {
        position,
        pressure: lerp(a.pressure, b.pressure),
        timestamp_ms: lerp(a.timestamp_ms, b.timestamp_ms),
        velocity: lerp(a.velocity, b.velocity),
    }
}

/// Short-horizon extrapolation of the pointer, drawn ahead of the last point
/// to hide input latency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionPredictor {
    /// Minimum speed (world units per ms) before anything is predicted.
    pub min_velocity: f64,
    /// How far ahead to extrapolate, in ms.
    pub horizon_ms: f64,
    /// Upper bound on the extension length, in world units.
    pub max_length: f64,
}

impl Default for MotionPredictor {
    fn default() -> Self {
        Self {
            min_velocity: 0.3,
            horizon_ms: 16.0,
            max_length: 24.0,
        }
    }
}

impl MotionPredictor {
    /// Predicted extension `(from, to)` beyond the newest point, if the
    /// pointer is moving fast enough. Needs timestamps on the trailing points.
    pub fn predict(&self, points: &[InputPoint]) -> Option<(Point, Point)> {
        if points.len() < 2 {
            return None;
        }
        let window = &points[points.len().saturating_sub(PREDICTION_WINDOW)..];
        let first = window.first()?;
        let last = window.last()?;
        let dt = last.timestamp_ms? - first.timestamp_ms?;
        if !(dt > 0.0) {
            return None;
        }

        let travelled: f64 = window.windows(2).map(|w| w[0].distance(&w[1])).sum();
        let velocity = travelled / dt;
        if velocity < self.min_velocity {
            return None;
        }

        let before = window[window.len() - 2].position;
        let direction: Vec2 = last.position - before;
        let len = direction.hypot();
        if len < 1e-9 {
            return None;
        }
        let extension = (velocity * self.horizon_ms).min(self.max_length);
        Some((last.position, last.position + direction * (extension / len)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Segments a point list renders as, in capture order.
    fn segments_for(points: &[Point], smoothed: bool) -> Vec<Segment> {
        let mut segments = Vec::with_capacity(points.len());
        for i in 1..points.len() {
            let before = i.checked_sub(2).map(|j| points[j]);
            segments.push(live_segment(before, points[i - 1], points[i], smoothed));
        }
        if smoothed && points.len() >= 2 {
            segments.push(closing_segment(points[points.len() - 2], points[points.len() - 1]));
        }
        segments
    }

    fn raw(coords: &[(f64, f64)]) -> Vec<InputPoint> {
        coords.iter().map(|&(x, y)| InputPoint::new(Point::new(x, y))).collect()
    }

    fn timed(coords: &[(f64, f64, f64)]) -> Vec<InputPoint> {
        coords
            .iter()
            .map(|&(x, y, t)| InputPoint::new(Point::new(x, y)).with_timestamp(t))
            .collect()
    }

    #[test]
    fn test_live_segment_unsmoothed_is_straight() {
        let seg = live_segment(None, Point::new(0.0, 0.0), Point::new(10.0, 0.0), false);
        assert_eq!(seg, Segment::Line { from: Point::new(0.0, 0.0), to: Point::new(10.0, 0.0) });
    }

    #[test]
    fn test_live_segments_chain_through_midpoints() {
        let pts = [Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 10.0)];
        let segments = segments_for(&pts, true);
        assert_eq!(segments.len(), 3);
        // Each segment starts where the previous one ended
        for pair in segments.windows(2) {
            assert!((pair[0].end() - pair[1].start()).hypot() < 1e-12);
        }
        assert_eq!(segments[0].start(), pts[0]);
        assert_eq!(segments[2].end(), pts[2]);
        assert_eq!(segments[1], Segment::Quad {
            from: Point::new(5.0, 0.0),
            ctrl: Point::new(10.0, 0.0),
            to: Point::new(10.0, 5.0),
        });
    }

    #[test]
    fn test_catmull_rom_preserves_endpoints() {
        let points = raw(&[(0.0, 0.0), (10.0, 5.0), (20.0, -5.0), (30.0, 0.0), (40.0, 8.0)]);
        let fitted = catmull_rom(&points, SplineParams::default());
        assert_eq!(fitted.first().unwrap().position, points[0].position);
        assert_eq!(fitted.last().unwrap().position, points[4].position);
        // 4 segments, 10 samples each, plus the start
        assert_eq!(fitted.len(), 41);
    }

    #[test]
    fn test_catmull_rom_passes_through_control_points() {
        let points = raw(&[(0.0, 0.0), (10.0, 10.0), (20.0, 0.0), (30.0, 10.0)]);
        let fitted = catmull_rom(&points, SplineParams::default());
        for (i, p) in points.iter().enumerate() {
            let sample = fitted[i * 10].position;
            assert!((sample - p.position).hypot() < 1e-9, "sample {i} = {sample:?}");
        }
    }

    #[test]
    fn test_catmull_rom_keeps_straight_lines_straight() {
        let points = raw(&[(0.0, 0.0), (1.0, 0.0), (3.0, 0.0), (6.0, 0.0)]);
        let fitted = catmull_rom(&points, SplineParams::default());
        assert!(fitted.iter().all(|p| p.position.y.abs() < 1e-9));
    }

    #[test]
    fn test_catmull_rom_short_input_unchanged() {
        let points = raw(&[(0.0, 0.0), (5.0, 5.0)]);
        assert_eq!(catmull_rom(&points, SplineParams::default()), points);

        let dupes = raw(&[(1.0, 1.0), (1.0, 1.0), (1.0, 1.0)]);
        assert_eq!(catmull_rom(&dupes, SplineParams::default()), dupes);
    }

    #[test]
    fn test_catmull_rom_interpolates_timestamps() {
        let points = timed(&[(0.0, 0.0, 0.0), (10.0, 0.0, 10.0), (20.0, 5.0, 20.0)]);
        let fitted = catmull_rom(&points, SplineParams { step: 0.5, ..SplineParams::default() });
        assert_eq!(fitted.len(), 5);
        assert_eq!(fitted[1].timestamp_ms, Some(5.0));
    }

    #[test]
    fn test_prediction_requires_speed() {
        let predictor = MotionPredictor::default();
        let slow = timed(&[(0.0, 0.0, 0.0), (1.0, 0.0, 100.0), (2.0, 0.0, 200.0)]);
        assert!(predictor.predict(&slow).is_none());

        let fast = timed(&[(0.0, 0.0, 0.0), (10.0, 0.0, 10.0), (20.0, 0.0, 20.0)]);
        let (from, to) = predictor.predict(&fast).unwrap();
        assert_eq!(from, Point::new(20.0, 0.0));
        // 1 unit/ms over 16 ms
        assert!((to.x - 36.0).abs() < 1e-9);
        assert!(to.y.abs() < 1e-12);
    }

    #[test]
    fn test_prediction_is_capped() {
        let predictor = MotionPredictor::default();
        let very_fast = timed(&[(0.0, 0.0, 0.0), (0.0, 100.0, 1.0)]);
        let (from, to) = predictor.predict(&very_fast).unwrap();
        assert!((from.distance(to) - predictor.max_length).abs() < 1e-9);
    }

    #[test]
    fn test_prediction_without_timestamps() {
        let predictor = MotionPredictor::default();
        assert!(predictor.predict(&raw(&[(0.0, 0.0), (50.0, 0.0)])).is_none());
    }
}
