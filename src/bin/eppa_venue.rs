//! EPPA 2025 venue guide in the terminal.
//!
//! `eppa-venue [--config <path>]`. Set `HEADLESS` or `CI` (or
//! `EPPA_HEADLESS_TICKS`) to render a few ticks to stdout without a terminal.

use std::path::PathBuf;

use eppa_venue::app::{build_runtime, spawn_chat};
use eppa_venue::config::AppConfig;
use eppa_venue::logging::FileSink;
use eppa_venue::{CliDriver, Logger, Size};

fn config_path() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
        if let Some(path) = arg.strip_prefix("--config=") {
            return Some(PathBuf::from(path));
        }
    }
    std::env::var_os("EPPA_CONFIG").map(PathBuf::from)
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env(config_path().as_deref())?;

    let logger = match &config.log_path {
        Some(path) => Some(Logger::new(FileSink::new(path, config.log_max_bytes)?)),
        None => None,
    };

    let chat = spawn_chat(&config, logger.clone())?;
    let mut runtime = build_runtime(&config, logger, chat, Size::new(120, 36))?;

    match config.headless_ticks {
        Some(ticks) => {
            let mut buffer = Vec::new();
            runtime.run_headless(&mut buffer, ticks)?;
            println!("{}", String::from_utf8_lossy(&buffer));
        }
        None => CliDriver::new(runtime).run()?,
    }
    Ok(())
}
