use crate::audio::{CuePlayer, MicSourceFactory, NoCue, ToneCue};
use crate::capture::{DirectorySink, FrameSink, ImageSequenceFactory, VideoSourceFactory};
use crate::config::AppConfig;
use crate::log_debug;
use crate::runtime::{Runtime, RuntimeParts};
use anyhow::{Context, Result};
use crossbeam_channel::{bounded, select, Receiver, Sender};
use std::io::{self, BufRead, Write};
use std::thread;
use std::time::Duration;

use super::protocol::{Dispatch, HostCommand, HostEvent};

const COMMAND_CHANNEL_CAPACITY: usize = 64;

// ============================================================================
// Event Sending
// ============================================================================

pub(super) fn write_event<W: Write>(out: &mut W, event: &HostEvent) -> io::Result<()> {
    let json = serde_json::to_string(event).map_err(io::Error::other)?;
    writeln!(out, "{json}")?;
    out.flush()
}

pub(super) fn send_event(event: &HostEvent) {
    let mut stdout = io::stdout().lock();
    let _ = write_event(&mut stdout, event);
}

// ============================================================================
// Stdin Reader Thread
// ============================================================================

fn spawn_stdin_reader(tx: Sender<HostCommand>) -> Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("voxring-stdin".to_string())
        .spawn(move || {
            let stdin = io::stdin();
            read_commands(stdin.lock(), &tx);
            log_debug("Stdin reader thread exiting");
        })
        .context("failed to spawn stdin reader")
}

/// Parse JSON lines until EOF or until the main loop hangs up.
pub(super) fn read_commands<R: BufRead>(reader: R, tx: &Sender<HostCommand>) {
    for line in reader.lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match serde_json::from_str::<HostCommand>(trimmed) {
            Ok(cmd) => {
                if tx.send(cmd).is_err() {
                    break; // Main loop has exited
                }
            }
            Err(e) => {
                send_event(&HostEvent::Error {
                    kind: "invalid_command".to_string(),
                    message: format!("Invalid command: {e}"),
                });
            }
        }
    }
}

// ============================================================================
// Host Mode
// ============================================================================

/// Wire real devices from the validated config.
pub fn build_parts(config: &AppConfig) -> Result<RuntimeParts> {
    let cue: Box<dyn CuePlayer> = if config.no_sounds {
        Box::new(NoCue)
    } else {
        Box::new(ToneCue::new(Duration::from_millis(config.pulse_ms)))
    };
    let video: Option<Box<dyn VideoSourceFactory>> = config.frames_dir.as_ref().map(|dir| {
        Box::new(ImageSequenceFactory::new(dir.clone(), config.hash_width))
            as Box<dyn VideoSourceFactory>
    });
    let sink: Option<Box<dyn FrameSink>> = match &config.output_dir {
        Some(dir) => Some(Box::new(DirectorySink::create(dir)?)),
        None => None,
    };
    Ok(RuntimeParts {
        audio: Box::new(MicSourceFactory {
            preferred_device: config.input_device.clone(),
            window_samples: config.window_samples,
        }),
        cue,
        control: None,
        video,
        sink,
    })
}

pub(super) fn ready_event(config: &AppConfig) -> HostEvent {
    HostEvent::Ready {
        version: env!("CARGO_PKG_VERSION").to_string(),
        size: config.size,
        pixel_ratio: config.pixel_ratio,
        capture_enabled: config.frames_dir.is_some(),
        session_id: config.session_id.clone(),
    }
}

/// Run the indicator until the host sends `quit` or closes stdin.
pub fn run_host_mode(config: AppConfig) -> Result<()> {
    log_debug("Starting JSON host mode");

    let parts = build_parts(&config)?;
    let runtime = Runtime::start(config.runtime_options(), parts)?;
    send_event(&ready_event(&config));

    let (cmd_tx, cmd_rx) = bounded(COMMAND_CHANNEL_CAPACITY);
    // The reader blocks on stdin; it is left detached and ends with the process.
    let _stdin_handle = spawn_stdin_reader(cmd_tx)?;

    let result = {
        let mut stdout = io::stdout();
        run_host_loop(&runtime, &cmd_rx, &mut stdout)
    };
    runtime.shutdown();
    log_debug("Host mode finished");
    result
}

/// Forward host commands to the runtime and runtime events to `out`.
pub fn run_host_loop<W: Write>(
    runtime: &Runtime,
    commands: &Receiver<HostCommand>,
    out: &mut W,
) -> Result<()> {
    let events = runtime.events();
    loop {
        select! {
            recv(commands) -> cmd => {
                let cmd = match cmd {
                    Ok(cmd) => cmd,
                    Err(_) => {
                        log_debug("Host closed stdin");
                        break;
                    }
                };
                match cmd.dispatch() {
                    Dispatch::Runtime(command) => runtime.send(command)?,
                    Dispatch::Status => {
                        let event =
                            HostEvent::from_status(runtime.status(), runtime.dropped_events());
                        write_event(out, &event).context("failed to write host event")?;
                    }
                    Dispatch::Quit => {
                        log_debug("Host requested quit");
                        break;
                    }
                }
            }
            recv(events) -> event => {
                match event {
                    Ok(event) => write_event(out, &HostEvent::from(event))
                        .context("failed to write host event")?,
                    Err(_) => break,
                }
            }
        }
    }

    for event in events.try_iter() {
        write_event(out, &HostEvent::from(event)).context("failed to write host event")?;
    }
    Ok(())
}
