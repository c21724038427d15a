//! Routes pointer events into the stroke capture and turns its output into
//! drawing commands.

use scribble_core::capture::{CaptureStep, FinishedStroke, StrokeCapture};
use scribble_core::config::ProfileSettings;
use scribble_core::input::{PointerEvent, PointerPhase};
use scribble_core::stroke::{InputPoint, Stroke};
use scribble_core::style::BrushStyle;
use scribble_render::{DrawCommand, Prediction};

/// What one event produced.
#[derive(Debug, Default)]
pub struct HandleOutcome {
    /// Commands to apply, in order.
    pub commands: Vec<DrawCommand>,
    /// A stroke that was finalized by this event.
    pub finished: Option<Stroke>,
}

impl HandleOutcome {
    fn from_step(step: Option<CaptureStep>) -> Self {
        Self {
            commands: step.map(step_command).into_iter().collect(),
            finished: None,
        }
    }

    fn push_finished(&mut self, finished: Option<FinishedStroke>) {
        if let Some(FinishedStroke { stroke, tail }) = finished {
            if let Some(segment) = tail {
                self.commands.push(DrawCommand::Segment {
                    segment,
                    style: *stroke.style(),
                });
            }
            self.finished = Some(stroke);
        }
    }
}

/// Pointer routing for a single drawing session.
#[derive(Debug, Clone)]
pub struct EventHandler {
    capture: StrokeCapture,
}

impl EventHandler {
    pub fn new(settings: ProfileSettings, smoothing: bool, prediction: bool) -> Self {
        Self {
            capture: StrokeCapture::new(settings, smoothing, prediction),
        }
    }

    /// Swap capture tuning; applies from the next accepted point.
    pub fn configure(&mut self, settings: ProfileSettings, smoothing: bool, prediction: bool) {
        self.capture.set_settings(settings);
        self.capture.set_smoothing(smoothing);
        self.capture.set_prediction(prediction);
    }

    pub fn is_drawing(&self) -> bool {
        self.capture.is_capturing()
    }

    /// Handle an event whose position has already been mapped to `point`
    /// (world coordinates).
    pub fn handle(&mut self, event: &PointerEvent, point: InputPoint, style: BrushStyle) -> HandleOutcome {
        let id = event.pointer_id;
        if event.ends_gesture() {
            // Release and exit positions are the last point of the stroke
            let mut outcome = match event.phase {
                PointerPhase::Cancel => HandleOutcome::default(),
                _ => HandleOutcome::from_step(self.capture.update(id, point)),
            };
            outcome.push_finished(self.capture.end(id));
            return outcome;
        }
        match event.phase {
            PointerPhase::Down => {
                if !event.is_drawing_button() {
                    log::debug!("ignoring {:?} button press", event.button);
                    return HandleOutcome::default();
                }
                HandleOutcome::from_step(self.capture.begin(id, point, style))
            }
            _ => HandleOutcome::from_step(self.capture.update(id, point)),
        }
    }

    /// Finalize the current stroke regardless of its pointer.
    pub fn finish(&mut self) -> HandleOutcome {
        let mut outcome = HandleOutcome::default();
        outcome.push_finished(self.capture.finish());
        outcome
    }

    /// Drop the current stroke.
    pub fn abandon(&mut self) {
        self.capture.abandon();
    }

    pub fn prediction(&self) -> Option<Prediction> {
        self.capture
            .prediction()
            .map(|(from, to, style)| Prediction { from, to, style })
    }
}

fn step_command(step: CaptureStep) -> DrawCommand {
    match step {
        CaptureStep::Dot { center, style } => DrawCommand::Dot { center, style },
        CaptureStep::Segment { segment, style } => DrawCommand::Segment { segment, style },
    }
}
