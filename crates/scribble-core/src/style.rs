//! Brush style, tool kinds and colors.

use peniko::Color;
use serde::{Deserialize, Serialize};

/// Smallest brush width in logical units.
pub const MIN_BRUSH_SIZE: f64 = 0.5;
/// Largest brush width in logical units.
pub const MAX_BRUSH_SIZE: f64 = 200.0;

/// RGBA8 color, serialized as a `#rrggbbaa` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub const fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    pub const fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`. Returns `None` for anything else.
    pub fn from_hex(color: &str) -> Option<Self> {
        let hex = color.trim().strip_prefix('#')?;
        if !hex.is_ascii() {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            3 => {
                let r = channel(&hex[0..1])? * 17;
                let g = channel(&hex[1..2])? * 17;
                let b = channel(&hex[2..3])? * 17;
                Some(Self::new(r, g, b, 255))
            }
            6 => Some(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
                255,
            )),
            8 => Some(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
                channel(&hex[6..8])?,
            )),
            _ => None,
        }
    }

    /// Format as `#rrggbbaa`.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }

    pub fn is_transparent(self) -> bool {
        self.a == 0
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::black()
    }
}

impl TryFrom<String> for Rgba {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value).ok_or_else(|| format!("invalid color {value:?}, expected #rgb, #rrggbb or #rrggbbaa"))
    }
}

impl From<Rgba> for String {
    fn from(color: Rgba) -> Self {
        color.to_hex()
    }
}

impl From<Color> for Rgba {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self::new(rgba.r, rgba.g, rgba.b, rgba.a)
    }
}

impl From<Rgba> for Color {
    fn from(color: Rgba) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Drawing tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    #[default]
    Brush,
    Eraser,
}

impl ToolKind {
    pub fn name(self) -> &'static str {
        match self {
            ToolKind::Brush => "brush",
            ToolKind::Eraser => "eraser",
        }
    }
}

/// How a stroke is applied to the surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Composite {
    /// Paint over existing content (source-over).
    Paint,
    /// Remove existing content (destination-out).
    CutOut,
}

impl From<ToolKind> for Composite {
    fn from(tool: ToolKind) -> Self {
        match tool {
            ToolKind::Brush => Composite::Paint,
            ToolKind::Eraser => Composite::CutOut,
        }
    }
}

/// Style applied to new strokes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrushStyle {
    pub tool: ToolKind,
    pub color: Rgba,
    /// Stroke width in world units.
    pub width: f64,
    /// 0.0 = invisible, 1.0 = fully opaque.
    pub opacity: f64,
}

impl Default for BrushStyle {
    fn default() -> Self {
        Self {
            tool: ToolKind::Brush,
            color: Rgba::black(),
            width: 4.0,
            opacity: 1.0,
        }
    }
}

impl BrushStyle {
    /// Set the width, clamped to `[MIN_BRUSH_SIZE, MAX_BRUSH_SIZE]`.
    /// Non-finite input keeps the current width.
    pub fn set_width(&mut self, width: f64) {
        if width.is_finite() {
            self.width = width.clamp(MIN_BRUSH_SIZE, MAX_BRUSH_SIZE);
        } else {
            log::warn!("ignoring non-finite brush size {width}");
        }
    }

    /// Set the opacity, clamped to `[0, 1]`.
    pub fn set_opacity(&mut self, opacity: f64) {
        if opacity.is_finite() {
            self.opacity = opacity.clamp(0.0, 1.0);
        } else {
            log::warn!("ignoring non-finite brush opacity {opacity}");
        }
    }

    pub fn composite(&self) -> Composite {
        self.tool.into()
    }

    /// Clamp every field into its valid range.
    pub fn clamped(mut self) -> Self {
        let width = if self.width.is_finite() { self.width } else { Self::default().width };
        let opacity = if self.opacity.is_finite() { self.opacity } else { 1.0 };
        self.width = width.clamp(MIN_BRUSH_SIZE, MAX_BRUSH_SIZE);
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }
}
