//! Render and capture loops wired to the session router.
//!
//! Architecture:
//! - Render thread: drains inbound commands, samples the mic, advances the
//!   animation machine, and redraws the ring at `tick_hz`.
//! - Capture thread: pulls camera frames every `capture_interval_ms`, hashes
//!   them, and forwards novel ones to the sink.
//! - Both threads read session flags from a shared [`StatusCell`] and exit
//!   when the shutdown channel closes.

mod capture_loop;
mod clock;
mod render_loop;

pub use capture_loop::CaptureLoop;
pub use clock::{unix_ms, MonotonicClock};
pub use render_loop::RenderLoop;

use crate::animation::{AnimationConfig, GeometryDescriptor};
use crate::audio::{AudioSourceFactory, CuePlayer};
use crate::capture::{CaptureConfig, FrameSink, VideoSourceFactory};
use crate::error::{Result as CoreResult, VoxringError};
use crate::log_debug;
use crate::router::{SessionControl, SessionEvent, SessionStatus, StatusCell};
use anyhow::{anyhow, Context, Result};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

const COMMAND_CHANNEL_CAPACITY: usize = 64;
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Inbound messages for the render loop.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeCommand {
    Session(SessionEvent),
    Resize { logical_size: u32 },
    PixelRatio { pixel_ratio: f32 },
    Visibility { active: bool },
    Snapshot { path: PathBuf },
}

/// Outbound notifications from both loops.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeEvent {
    Geometry {
        state: &'static str,
        geometry: GeometryDescriptor,
    },
    SessionStartRequested,
    SessionStopRequested,
    Captured {
        file_name: String,
        timestamp_ms: u64,
        width: u32,
        height: u32,
        bytes: usize,
        difference: f32,
        signature: String,
    },
    SnapshotSaved {
        path: PathBuf,
    },
    SnapshotFailed {
        path: PathBuf,
        message: String,
    },
    SinkFailed {
        message: String,
    },
    Error(VoxringError),
}

/// Bounded outbound channel that never blocks a loop; overflow is counted.
#[derive(Debug, Clone)]
pub struct EventOutlet {
    sender: Sender<RuntimeEvent>,
    dropped: Arc<AtomicUsize>,
}

impl EventOutlet {
    pub fn new(sender: Sender<RuntimeEvent>) -> Self {
        Self {
            sender,
            dropped: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn emit(&self, event: RuntimeEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                if dropped == 1 || dropped % 100 == 0 {
                    log_debug(&format!("runtime event channel full, {dropped} dropped"));
                }
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Session control that forwards start/stop requests to the host as events.
#[derive(Debug, Clone)]
pub struct EventSessionControl {
    outlet: EventOutlet,
}

impl EventSessionControl {
    pub fn new(outlet: EventOutlet) -> Self {
        Self { outlet }
    }

    fn request(&self, event: RuntimeEvent) -> CoreResult<()> {
        if self.outlet.emit(event) {
            Ok(())
        } else {
            Err(VoxringError::Session(
                "host did not accept the session request".to_string(),
            ))
        }
    }
}

impl SessionControl for EventSessionControl {
    fn start_session(&mut self) -> CoreResult<()> {
        self.request(RuntimeEvent::SessionStartRequested)
    }

    fn stop_session(&mut self) -> CoreResult<()> {
        self.request(RuntimeEvent::SessionStopRequested)
    }
}

/// Scalar settings for both loops.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeOptions {
    pub logical_size: u32,
    pub pixel_ratio: f32,
    pub tick_hz: u32,
    pub amplitude_norm: f32,
    /// Minimum spacing of geometry events; 0 disables them.
    pub geometry_emit_ms: u64,
    pub animation: AnimationConfig,
    /// `None` leaves the capture thread off.
    pub capture: Option<CaptureConfig>,
    pub start_visible: bool,
    pub log_timings: bool,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            logical_size: 120,
            pixel_ratio: 1.0,
            tick_hz: 60,
            amplitude_norm: crate::audio::DEFAULT_AMPLITUDE_NORM,
            geometry_emit_ms: 0,
            animation: AnimationConfig::default(),
            capture: None,
            start_visible: true,
            log_timings: false,
        }
    }
}

/// Device and collaborator hooks handed to the loops.
pub struct RuntimeParts {
    pub audio: Box<dyn AudioSourceFactory>,
    pub cue: Box<dyn CuePlayer>,
    /// `None` forwards start/stop requests as [`RuntimeEvent`]s.
    pub control: Option<Box<dyn SessionControl>>,
    pub video: Option<Box<dyn VideoSourceFactory>>,
    pub sink: Option<Box<dyn FrameSink>>,
}

/// Handle to the running loops.
pub struct Runtime {
    commands: Sender<RuntimeCommand>,
    events: Receiver<RuntimeEvent>,
    status: Arc<StatusCell>,
    outlet: EventOutlet,
    shutdown: Option<Sender<()>>,
    handles: Vec<thread::JoinHandle<()>>,
}

impl Runtime {
    pub fn start(options: RuntimeOptions, parts: RuntimeParts) -> Result<Self> {
        let (command_tx, command_rx) = bounded(COMMAND_CHANNEL_CAPACITY);
        let (event_tx, event_rx) = bounded(EVENT_CHANNEL_CAPACITY);
        let (shutdown_tx, shutdown_rx) = bounded::<()>(0);
        let outlet = EventOutlet::new(event_tx);
        let status = Arc::new(StatusCell::new());
        let capture_generation = Arc::new(AtomicU64::new(0));
        let clock = MonotonicClock::new();

        let control: Box<dyn SessionControl> = match parts.control {
            Some(control) => control,
            None => Box::new(EventSessionControl::new(outlet.clone())),
        };

        // Loops hold device handles that may not be `Send`, so each one is
        // built on its own thread.
        let mut handles = Vec::with_capacity(2);
        let render_options = options.clone();
        let render_status = status.clone();
        let render_generation = capture_generation.clone();
        let render_outlet = outlet.clone();
        let render_shutdown = shutdown_rx.clone();
        let (audio, cue) = (parts.audio, parts.cue);
        handles.push(
            thread::Builder::new()
                .name("voxring-render".to_string())
                .spawn(move || {
                    RenderLoop::new(
                        &render_options,
                        audio,
                        cue,
                        control,
                        render_status,
                        render_generation,
                        render_outlet,
                    )
                    .run(render_options.tick_hz, clock, command_rx, render_shutdown)
                })
                .context("failed to spawn render thread")?,
        );

        match (options.capture.clone(), parts.video) {
            (Some(config), Some(video)) => {
                let capture_status = status.clone();
                let capture_outlet = outlet.clone();
                let sink = parts.sink;
                handles.push(
                    thread::Builder::new()
                        .name("voxring-capture".to_string())
                        .spawn(move || {
                            CaptureLoop::new(
                                config,
                                video,
                                sink,
                                capture_status,
                                capture_generation,
                                capture_outlet,
                            )
                            .run(clock, shutdown_rx)
                        })
                        .context("failed to spawn capture thread")?,
                );
            }
            (Some(_), None) => log_debug("capture configured without a video source; skipped"),
            _ => {}
        }

        log_debug(&format!(
            "runtime started: {} thread(s), size {} @ {}x, {} Hz",
            handles.len(),
            options.logical_size,
            options.pixel_ratio,
            options.tick_hz
        ));

        Ok(Self {
            commands: command_tx,
            events: event_rx,
            status,
            outlet,
            shutdown: Some(shutdown_tx),
            handles,
        })
    }

    pub fn send(&self, command: RuntimeCommand) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| anyhow!("render loop has stopped"))
    }

    pub fn events(&self) -> &Receiver<RuntimeEvent> {
        &self.events
    }

    pub fn status(&self) -> SessionStatus {
        self.status.snapshot()
    }

    pub fn dropped_events(&self) -> usize {
        self.outlet.dropped()
    }

    /// Close the shutdown channel and join both loops.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        drop(self.shutdown.take());
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                log_debug("runtime thread panicked during shutdown");
            }
        }
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        self.stop();
    }
}
