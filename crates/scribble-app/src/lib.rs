//! Scribble Application
//!
//! The drawing engine a hosting application embeds: pointer routing,
//! history, zoom and export wired over the core and render crates.

pub mod demo;
mod engine;
mod event_handler;

pub use engine::{CanvasInfo, Engine, EngineCallbacks, EngineError, EngineResult, TickOutcome};
pub use event_handler::{EventHandler, HandleOutcome};
