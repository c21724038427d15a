//! Scripted drawing session used by the `scribble` binary.

use crate::engine::{Engine, EngineError};
use kurbo::Point;
use scribble_core::config::{ConfigError, EngineConfig};
use scribble_core::input::PointerEvent;
use scribble_core::style::ToolKind;
use std::f64::consts::TAU;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DemoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Load a configuration file, or the default configuration when `path` is `None`.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig, DemoError> {
    match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)?;
            log::info!("loaded configuration from {}", path.display());
            Ok(EngineConfig::from_json(&json)?)
        }
        None => Ok(EngineConfig::default()),
    }
}

/// Draw a signature-like loop, a baseline and an erased notch, then return
/// the exported PNG.
pub fn render_demo(config: EngineConfig) -> Result<Vec<u8>, DemoError> {
    let mut engine = Engine::with_config(config)?;
    let size = engine.transform().logical_size();
    let (w, h) = (size.width, size.height);
    let mut t = 0.0;

    // Looping flourish across the middle third
    let flourish: Vec<Point> = (0..=240)
        .map(|i| {
            let u = f64::from(i) / 240.0;
            let x = w * (0.15 + 0.7 * u) + (u * TAU * 4.0).sin() * w * 0.03;
            let y = h * 0.45 + (u * TAU * 4.0).cos() * h * 0.12 * (1.0 - u * 0.5);
            Point::new(x, y)
        })
        .collect();
    engine.set_brush_size(3.0);
    gesture(&mut engine, &flourish, &mut t);

    let baseline: Vec<Point> = (0..=60)
        .map(|i| Point::new(w * (0.1 + 0.8 * f64::from(i) / 60.0), h * 0.7))
        .collect();
    engine.set_brush_size(2.0);
    engine.set_brush_color("#1a3c8f");
    gesture(&mut engine, &baseline, &mut t);

    engine.set_tool(ToolKind::Eraser);
    engine.set_brush_size(12.0);
    gesture(&mut engine, &[Point::new(w * 0.5, h * 0.7)], &mut t);

    let png = engine.save_png()?;
    engine.dispose();
    Ok(png)
}

/// Render the demo and write it to `output`.
pub fn run(config_path: Option<&Path>, output: &Path) -> Result<(), DemoError> {
    let png = render_demo(load_config(config_path)?)?;
    std::fs::write(output, &png)?;
    log::info!("wrote {} bytes to {}", png.len(), output.display());
    Ok(())
}

/// Press, drag through `points` at 8 ms intervals and release.
fn gesture(engine: &mut Engine, points: &[Point], t: &mut f64) {
    let Some((&first, rest)) = points.split_first() else {
        return;
    };
    engine.handle_pointer(&PointerEvent::down(first).with_timestamp(*t));
    let mut last = first;
    for &p in rest {
        *t += 8.0;
        engine.handle_pointer(&PointerEvent::moved(p).with_timestamp(*t));
        last = p;
    }
    *t += 8.0;
    engine.handle_pointer(&PointerEvent::up(last).with_timestamp(*t));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_demo_produces_png() {
        let config = EngineConfig::with_size(300.0, 200.0);
        let png = render_demo(config).unwrap();
        let reader = png::Decoder::new(png.as_slice()).read_info().unwrap();
        assert_eq!((reader.info().width, reader.info().height), (300, 200));
    }

    #[test]
    fn test_run_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        std::fs::write(&config_path, r#"{"width": 120, "height": 80, "exportScale": 2}"#).unwrap();
        let output = dir.path().join("out.png");

        run(Some(&config_path), &output).unwrap();
        let bytes = std::fs::read(&output).unwrap();
        let reader = png::Decoder::new(bytes.as_slice()).read_info().unwrap();
        assert_eq!((reader.info().width, reader.info().height), (240, 160));
    }

    #[test]
    fn test_missing_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config(Some(&dir.path().join("missing.json")));
        assert!(matches!(result, Err(DemoError::Io(_))));
    }
}
