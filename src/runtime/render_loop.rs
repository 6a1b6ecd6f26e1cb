use super::{EventOutlet, MonotonicClock, RuntimeCommand, RuntimeEvent, RuntimeOptions};
use crate::animation::{AnimationMachine, GeometryDescriptor};
use crate::audio::{AmplitudeSampler, AudioSampleSource, AudioSourceFactory, CuePlayer};
use crate::log_debug;
use crate::render::{render_ring, RasterSurface, RingLayout};
use crate::router::{EventRouter, RouteAction, SessionControl, StatusCell};
use crossbeam_channel::{select, tick, Receiver};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const TIMING_LOG_EVERY_TICKS: u64 = 600;

/// State owned by the render thread.
///
/// Commands and ticks are plain method calls so tests can drive the loop
/// with a fake clock; [`RenderLoop::run`] only adds the channel plumbing.
pub struct RenderLoop {
    machine: AnimationMachine,
    sampler: AmplitudeSampler,
    layout: RingLayout,
    surface: RasterSurface,
    audio_factory: Box<dyn AudioSourceFactory>,
    audio: Option<Box<dyn AudioSampleSource>>,
    cue: Box<dyn CuePlayer>,
    control: Box<dyn SessionControl>,
    status: Arc<StatusCell>,
    capture_generation: Arc<AtomicU64>,
    outlet: EventOutlet,
    geometry_emit_ms: u64,
    last_emit_ms: Option<u64>,
    last_geometry: GeometryDescriptor,
    log_timings: bool,
    ticks: u64,
}

impl RenderLoop {
    pub fn new(
        options: &RuntimeOptions,
        audio_factory: Box<dyn AudioSourceFactory>,
        cue: Box<dyn CuePlayer>,
        control: Box<dyn SessionControl>,
        status: Arc<StatusCell>,
        capture_generation: Arc<AtomicU64>,
        outlet: EventOutlet,
    ) -> Self {
        let layout = RingLayout::new(options.logical_size, options.pixel_ratio);
        let side = layout.physical_size();
        let mut render = Self {
            machine: AnimationMachine::new(options.animation.clone()),
            sampler: AmplitudeSampler::new(options.amplitude_norm),
            layout,
            surface: RasterSurface::new(side, side),
            audio_factory,
            audio: None,
            cue,
            control,
            status,
            capture_generation,
            outlet,
            geometry_emit_ms: options.geometry_emit_ms,
            last_emit_ms: None,
            last_geometry: GeometryDescriptor::neutral(&options.animation),
            log_timings: options.log_timings,
            ticks: 0,
        };
        if options.start_visible {
            render.on_visibility_change(true, 0);
        }
        render
    }

    pub fn machine(&self) -> &AnimationMachine {
        &self.machine
    }

    pub fn layout(&self) -> &RingLayout {
        &self.layout
    }

    pub fn surface(&self) -> &RasterSurface {
        &self.surface
    }

    pub fn last_geometry(&self) -> GeometryDescriptor {
        self.last_geometry
    }

    pub fn mic_active(&self) -> bool {
        self.audio.is_some()
    }

    pub fn handle(&mut self, command: RuntimeCommand, now_ms: u64) {
        match command {
            RuntimeCommand::Session(event) => {
                let mut router =
                    EventRouter::new(&self.status, self.control.as_mut(), self.cue.as_mut());
                match router.route(event, now_ms, &mut self.machine) {
                    Ok(RouteAction::Pulsed | RouteAction::ContinuousStarted) => {
                        self.last_emit_ms = None;
                    }
                    Ok(_) => {}
                    Err(err) => {
                        log_debug(&format!("session event {} failed: {err}", event.label()));
                        self.outlet.emit(RuntimeEvent::Error(err));
                    }
                }
            }
            RuntimeCommand::Resize { logical_size } => self.on_resize(logical_size),
            RuntimeCommand::PixelRatio { pixel_ratio } => {
                self.layout.on_pixel_ratio_change(pixel_ratio);
            }
            RuntimeCommand::Visibility { active } => self.on_visibility_change(active, now_ms),
            RuntimeCommand::Snapshot { path } => self.snapshot(&path),
        }
    }

    pub fn on_resize(&mut self, logical_size: u32) {
        self.layout.on_resize(logical_size);
        log_debug(&format!(
            "indicator resized: logical={} physical={}",
            self.layout.logical_size(),
            self.layout.physical_size()
        ));
    }

    /// Acquire the mic when shown; release it and cancel capture when hidden.
    ///
    /// A remote party still speaking when the ring reappears resumes the
    /// continuous pulse.
    pub fn on_visibility_change(&mut self, active: bool, now_ms: u64) {
        let status = self.status.snapshot();
        self.status.set_visible(active);
        if active {
            if status.remote_speaking && self.machine.enter_continuous(now_ms) {
                self.last_emit_ms = None;
            }
            if self.audio.is_none() {
                match self.audio_factory.open() {
                    Ok(source) => {
                        log_debug(&format!("mic acquired: {}", source.name()));
                        self.audio = Some(source);
                    }
                    Err(err) => {
                        log_debug(&format!("mic unavailable, ring stays neutral: {err}"));
                        self.outlet.emit(RuntimeEvent::Error(err));
                    }
                }
            }
        } else {
            self.audio = None;
            self.machine.cancel();
            self.last_geometry = GeometryDescriptor::neutral(self.machine.config());
            if status.visible {
                self.capture_generation.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    /// One frame: sample, advance, draw. Hidden indicators skip all work.
    pub fn tick(&mut self, now_ms: u64) -> Option<GeometryDescriptor> {
        if !self.status.snapshot().visible {
            return None;
        }
        let started = Instant::now();
        let amplitude = match self.audio.as_mut() {
            Some(source) => self.sampler.amplitude(&source.read_window()),
            None => 0.0,
        };
        let geometry = self.machine.tick(now_ms, amplitude);
        render_ring(&self.layout, &geometry, &mut self.surface);
        self.last_geometry = geometry;
        self.maybe_emit(now_ms, geometry);

        self.ticks += 1;
        if self.log_timings && self.ticks % TIMING_LOG_EVERY_TICKS == 0 {
            log_debug(&format!(
                "timing|phase=render_tick|tick_ms={:.3}|amplitude={amplitude:.3}|state={}",
                started.elapsed().as_secs_f64() * 1_000.0,
                self.machine.state().label()
            ));
        }
        Some(geometry)
    }

    fn maybe_emit(&mut self, now_ms: u64, geometry: GeometryDescriptor) {
        if self.geometry_emit_ms == 0 {
            return;
        }
        let due = self
            .last_emit_ms
            .map_or(true, |last| now_ms.saturating_sub(last) >= self.geometry_emit_ms);
        if due {
            self.last_emit_ms = Some(now_ms);
            self.outlet.emit(RuntimeEvent::Geometry {
                state: self.machine.state().label(),
                geometry,
            });
        }
    }

    fn snapshot(&mut self, path: &Path) {
        match self.surface.save_png(path) {
            Ok(()) => {
                log_debug(&format!("snapshot saved to {}", path.display()));
                self.outlet.emit(RuntimeEvent::SnapshotSaved {
                    path: path.to_path_buf(),
                });
            }
            Err(err) => {
                log_debug(&format!("snapshot to {} failed: {err}", path.display()));
                self.outlet.emit(RuntimeEvent::SnapshotFailed {
                    path: path.to_path_buf(),
                    message: err.to_string(),
                });
            }
        }
    }

    pub fn run(
        mut self,
        tick_hz: u32,
        clock: MonotonicClock,
        commands: Receiver<RuntimeCommand>,
        shutdown: Receiver<()>,
    ) {
        let period = Duration::from_secs_f64(1.0 / f64::from(tick_hz.max(1)));
        let ticker = tick(period);
        log_debug(&format!("render loop running at {tick_hz} Hz"));
        loop {
            select! {
                recv(commands) -> msg => match msg {
                    Ok(command) => self.handle(command, clock.now_ms()),
                    Err(_) => break,
                },
                recv(ticker) -> _ => {
                    self.tick(clock.now_ms());
                }
                recv(shutdown) -> _ => break,
            }
        }
        self.audio = None;
        log_debug(&format!(
            "render loop exiting after {} tick(s), {} dropped event(s)",
            self.ticks,
            self.outlet.dropped()
        ));
    }
}
