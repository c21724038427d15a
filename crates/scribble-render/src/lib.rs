//! Scribble Render Library
//!
//! CPU raster surfaces for the Scribble drawing engine. Drawing commands are
//! applied to a display surface and, when configured, to a higher-resolution
//! export surface; the display surface is composed through the viewport for
//! presentation and the export surface is encoded for saving.

mod export;
mod pipeline;
mod surface;

pub use export::{PNG_DATA_URI_PREFIX, demultiplied_rgba, encode_png, to_data_uri};
pub use pipeline::{DrawCommand, Prediction, RenderPipeline, SurfaceSnapshot};
pub use surface::{MAX_SURFACE_DIMENSION, Surface};
pub use tiny_skia::Pixmap;

use thiserror::Error;

/// Render errors.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Invalid surface dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("Invalid surface scale: {0}")]
    InvalidScale(f64),
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] png::EncodingError),
}

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;
