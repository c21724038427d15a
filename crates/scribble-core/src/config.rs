//! Engine configuration.
//!
//! The configuration is a closed struct: every recognised option is a field.
//! Hosts change a running engine through [`ConfigUpdate`], whose fields are
//! all optional; see [`EngineConfig::apply`] for what each one affects.

use crate::history::{DEFAULT_HISTORY_CAPACITY, MAX_HISTORY_CAPACITY, MIN_HISTORY_CAPACITY};
use crate::smoothing::{MotionPredictor, SplineParams};
use crate::style::{BrushStyle, Rgba};
use crate::viewport::{DEFAULT_MAX_ZOOM, DEFAULT_MIN_ZOOM, DEFAULT_OVERSCROLL};
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Largest logical canvas edge accepted.
pub const MAX_CANVAS_EDGE: f64 = 16_384.0;
/// Largest export resolution multiplier accepted.
pub const MAX_EXPORT_SCALE: f64 = 8.0;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Performance profile, chosen once at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Dense sampling, 120 Hz redraw, spline refit and prediction.
    Quality,
    /// 60 Hz redraw, moderate sampling.
    #[default]
    Balanced,
    /// Sparse sampling, no refit or prediction.
    Performance,
}

/// Tuning values selected by a [`Profile`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileSettings {
    /// Minimum world distance between accepted points.
    pub min_point_distance: f64,
    /// Target interval between redraws.
    pub frame_interval: Duration,
    /// Whether finalized smoothed strokes are re-fit with a spline.
    pub spline_refit: bool,
    pub spline: SplineParams,
    /// `None` disables motion prediction.
    pub predictor: Option<MotionPredictor>,
}

impl Profile {
    pub fn settings(self) -> ProfileSettings {
        match self {
            Profile::Quality => ProfileSettings {
                min_point_distance: 0.25,
                frame_interval: Duration::from_millis(8),
                spline_refit: true,
                spline: SplineParams::default(),
                predictor: Some(MotionPredictor::default()),
            },
            Profile::Balanced => ProfileSettings {
                min_point_distance: 0.5,
                frame_interval: Duration::from_millis(16),
                spline_refit: true,
                spline: SplineParams::default(),
                predictor: Some(MotionPredictor::default()),
            },
            Profile::Performance => ProfileSettings {
                min_point_distance: 1.0,
                frame_interval: Duration::from_millis(33),
                spline_refit: false,
                spline: SplineParams::default(),
                predictor: None,
            },
        }
    }
}

/// Construction-time configuration of a drawing engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Logical canvas width.
    pub width: f64,
    /// Logical canvas height.
    pub height: f64,
    /// Initial device pixel ratio (backing pixels per logical unit).
    pub device_pixel_ratio: f64,
    /// Fill applied on init and clear; `None` leaves the surface transparent.
    pub background_color: Option<Rgba>,
    /// Suppress all input.
    pub disabled: bool,
    /// Enable the zoom/pan subsystem.
    pub enable_zoom: bool,
    /// Resolution multiplier of the export surface; `None` exports the display surface.
    pub export_scale: Option<f64>,
    pub history_capacity: usize,
    pub profile: Profile,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Overscroll allowance as a fraction of the visible size.
    pub overscroll: f64,
    /// Render brush strokes through midpoint curves.
    pub smoothing: bool,
    /// Draw the predicted extension while capturing.
    pub prediction: bool,
    /// Brush used for new strokes.
    pub brush: BrushStyle,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            device_pixel_ratio: 1.0,
            background_color: Some(Rgba::white()),
            disabled: false,
            enable_zoom: true,
            export_scale: None,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            profile: Profile::default(),
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            overscroll: DEFAULT_OVERSCROLL,
            smoothing: true,
            prediction: true,
            brush: BrushStyle::default(),
        }
    }
}

impl EngineConfig {
    /// A default configuration for a canvas of the given logical size.
    pub fn with_size(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Parse from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no engine can be built from. Values that can be
    /// clamped (brush, history capacity, overscroll) are clamped instead.
    pub fn validate(&self) -> ConfigResult<()> {
        let edge_ok = |v: f64| v.is_finite() && v > 0.0 && v <= MAX_CANVAS_EDGE;
        if !edge_ok(self.width) || !edge_ok(self.height) {
            return Err(ConfigError::Invalid(format!(
                "canvas size {}x{} outside (0, {MAX_CANVAS_EDGE}]",
                self.width, self.height
            )));
        }
        if !(self.device_pixel_ratio.is_finite() && self.device_pixel_ratio > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "device pixel ratio {} must be positive",
                self.device_pixel_ratio
            )));
        }
        if let Some(scale) = self.export_scale {
            if !(scale.is_finite() && scale > 0.0 && scale <= MAX_EXPORT_SCALE) {
                return Err(ConfigError::Invalid(format!(
                    "export scale {scale} outside (0, {MAX_EXPORT_SCALE}]"
                )));
            }
        }
        if !(self.min_zoom > 0.0 && self.min_zoom <= self.max_zoom && self.max_zoom.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "zoom bounds [{}, {}] are not a valid range",
                self.min_zoom, self.max_zoom
            )));
        }
        Ok(())
    }

    /// History capacity clamped to the supported range.
    pub fn effective_history_capacity(&self) -> usize {
        self.history_capacity.clamp(MIN_HISTORY_CAPACITY, MAX_HISTORY_CAPACITY)
    }

    /// Apply a partial update and report what changed.
    ///
    /// Per-field effects on a running engine:
    /// - `background_color`: used by the next clear; existing pixels are kept.
    /// - `disabled`: `true` finalizes an in-flight stroke and blocks new ones.
    /// - `enable_zoom`: `false` resets the viewport to 100% and ignores zoom calls.
    /// - `profile`: new sampling thresholds apply from the next stroke.
    /// - `smoothing` / `prediction`: apply from the next stroke.
    /// - `brush_*`: clamped, apply from the next stroke.
    pub fn apply(&mut self, update: &ConfigUpdate) -> AppliedChanges {
        let mut changes = AppliedChanges::default();

        if let Some(background) = update.background_color {
            changes.background |= self.background_color != background;
            self.background_color = background;
        }
        if let Some(disabled) = update.disabled {
            changes.disabled |= self.disabled != disabled;
            self.disabled = disabled;
        }
        if let Some(enable_zoom) = update.enable_zoom {
            changes.zoom |= self.enable_zoom != enable_zoom;
            self.enable_zoom = enable_zoom;
        }
        if let Some(profile) = update.profile {
            changes.capture |= self.profile != profile;
            self.profile = profile;
        }
        if let Some(smoothing) = update.smoothing {
            changes.capture |= self.smoothing != smoothing;
            self.smoothing = smoothing;
        }
        if let Some(prediction) = update.prediction {
            changes.capture |= self.prediction != prediction;
            self.prediction = prediction;
        }

        let before = self.brush;
        if let Some(tool) = update.brush_tool {
            self.brush.tool = tool;
        }
        if let Some(color) = update.brush_color {
            self.brush.color = color;
        }
        if let Some(size) = update.brush_size {
            self.brush.set_width(size);
        }
        if let Some(opacity) = update.brush_opacity {
            self.brush.set_opacity(opacity);
        }
        changes.brush = before != self.brush;

        changes
    }
}

/// A partial configuration update. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfigUpdate {
    /// `Some(None)` switches to a transparent background.
    #[serde(deserialize_with = "present_or_null", skip_serializing_if = "Option::is_none")]
    pub background_color: Option<Option<Rgba>>,
    pub disabled: Option<bool>,
    pub enable_zoom: Option<bool>,
    pub profile: Option<Profile>,
    pub smoothing: Option<bool>,
    pub prediction: Option<bool>,
    pub brush_tool: Option<crate::style::ToolKind>,
    pub brush_color: Option<Rgba>,
    pub brush_size: Option<f64>,
    pub brush_opacity: Option<f64>,
}

impl ConfigUpdate {
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Distinguishes an explicit `null` (`Some(None)`) from a missing field (`None`).
fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<Rgba>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Rgba>::deserialize(deserializer).map(Some)
}

/// Which parts of the configuration an [`EngineConfig::apply`] call changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppliedChanges {
    pub background: bool,
    pub disabled: bool,
    pub zoom: bool,
    pub capture: bool,
    pub brush: bool,
}

impl AppliedChanges {
    pub fn any(&self) -> bool {
        self.background || self.disabled || self.zoom || self.capture || self.brush
    }
}
