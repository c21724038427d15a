//! Demo entry point: `scribble [config.json] <output.png>`.

use std::path::PathBuf;

#[cfg(feature = "native")]
fn init_logging() {
    env_logger::init();
}

#[cfg(not(feature = "native"))]
fn init_logging() {}

fn main() {
    init_logging();

    let mut args: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();
    let Some(output) = args.pop() else {
        eprintln!("usage: scribble [config.json] <output.png>");
        std::process::exit(2);
    };
    let config = args.pop();

    if let Err(e) = scribble_app::demo::run(config.as_deref(), &output) {
        log::error!("demo failed: {e}");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
