//! VoxRing entrypoint: an audio-reactive ring driven by a host over JSON lines.
//!
//! # Architecture
//!
//! - Stdin reader: parses host commands
//! - Render thread: mic amplitude, animation machine, ring drawing
//! - Capture thread: camera frames through the perceptual-hash gate
//! - Main thread: relays runtime events to stdout

mod cli_utils;

use anyhow::Result;
use std::panic;
use std::process;
use voxring::config::AppConfig;
use voxring::ipc::run_host_mode;
use voxring::{init_logging, log_debug, log_file_path, log_panic};

use crate::cli_utils::list_input_devices;

fn main() -> Result<()> {
    let config = match AppConfig::parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("voxring: {err:#}");
            process::exit(2);
        }
    };

    if config.list_input_devices {
        list_input_devices()?;
        return Ok(());
    }

    init_logging(&config);
    install_panic_hook();
    log_debug("=== VoxRing Started ===");
    log_debug(&format!("Log file: {:?}", log_file_path()));

    run_host_mode(config)
}

fn install_panic_hook() {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        log_panic(info);
        let location = info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        log_debug(&format!("panic at {location}"));
        previous(info);
    }));
}
