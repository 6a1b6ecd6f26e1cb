use super::{unix_ms, EventOutlet, MonotonicClock, RuntimeEvent};
use crate::capture::{
    CaptureConfig, CaptureOutcome, CapturePipeline, FrameSink, VideoFrameSource,
    VideoSourceFactory,
};
use crate::log_debug;
use crate::router::StatusCell;
use crossbeam_channel::{select, tick, Receiver};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// State owned by the capture thread.
pub struct CaptureLoop {
    config: CaptureConfig,
    pipeline: CapturePipeline,
    factory: Box<dyn VideoSourceFactory>,
    source: Option<Box<dyn VideoFrameSource>>,
    sink: Option<Box<dyn FrameSink>>,
    status: Arc<StatusCell>,
    generation: Arc<AtomicU64>,
    seen_generation: u64,
    /// Generation whose camera open already failed; not retried until it changes.
    failed_generation: Option<u64>,
    outlet: EventOutlet,
    captured: u64,
}

impl CaptureLoop {
    pub fn new(
        config: CaptureConfig,
        factory: Box<dyn VideoSourceFactory>,
        sink: Option<Box<dyn FrameSink>>,
        status: Arc<StatusCell>,
        generation: Arc<AtomicU64>,
        outlet: EventOutlet,
    ) -> Self {
        let seen_generation = generation.load(Ordering::SeqCst);
        Self {
            pipeline: CapturePipeline::new(&config),
            config,
            factory,
            source: None,
            sink,
            status,
            generation,
            seen_generation,
            failed_generation: None,
            outlet,
            captured: 0,
        }
    }

    pub fn pipeline(&self) -> &CapturePipeline {
        &self.pipeline
    }

    pub fn camera_active(&self) -> bool {
        self.source.is_some()
    }

    pub fn captured(&self) -> u64 {
        self.captured
    }

    fn enabled(&self) -> bool {
        let status = self.status.snapshot();
        status.visible && (status.connected || !self.config.require_connection)
    }

    fn release(&mut self, reason: &str) {
        if self.source.take().is_some() {
            log_debug(&format!("camera released: {reason}"));
        }
        self.pipeline.reset();
    }

    /// One capture attempt. Returns the outcome when a frame reached the gate.
    pub fn tick(&mut self, now_ms: u64, unix_ms: u64) -> Option<CaptureOutcome> {
        let generation = self.generation.load(Ordering::SeqCst);
        if generation != self.seen_generation {
            self.seen_generation = generation;
            self.release("indicator deactivated");
        }
        if !self.enabled() {
            if self.source.is_some() {
                self.release("capture disabled");
            }
            return None;
        }
        self.pipeline.expire(now_ms);

        if self.source.is_none() {
            if self.failed_generation == Some(generation) {
                return None;
            }
            match self.factory.open() {
                Ok(source) => {
                    log_debug(&format!("camera acquired: {}", source.name()));
                    self.source = Some(source);
                }
                Err(err) => {
                    log_debug(&format!("camera unavailable, capture skipped: {err}"));
                    self.failed_generation = Some(generation);
                    self.outlet.emit(RuntimeEvent::Error(err));
                    return None;
                }
            }
        }
        let source = self.source.as_mut()?;

        let frame = match source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => return None,
            Err(err) => {
                self.outlet.emit(RuntimeEvent::Error(err));
                return None;
            }
        };
        let signature = match self.pipeline.signature(&frame) {
            Ok(signature) => signature,
            Err(err) => {
                tracing::debug!(error = %err, "capture candidate rejected: hash failed");
                self.outlet.emit(RuntimeEvent::Error(err));
                return None;
            }
        };
        if self.generation.load(Ordering::SeqCst) != generation {
            log_debug("discarding hash computed before deactivation");
            return None;
        }

        let outcome = match self.pipeline.admit(&frame, signature, now_ms, unix_ms) {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(error = %err, "accepted frame could not be encoded");
                self.outlet.emit(RuntimeEvent::Error(err));
                return None;
            }
        };
        match &outcome {
            CaptureOutcome::Captured {
                frame: captured,
                signature,
                difference,
            } => {
                self.captured += 1;
                tracing::info!(
                    file = %captured.file_name,
                    difference = *difference,
                    bytes = captured.bytes.len(),
                    width = captured.width,
                    height = captured.height,
                    "frame captured"
                );
                if let Some(sink) = self.sink.as_mut() {
                    if let Err(err) = sink.submit(
                        captured,
                        captured.timestamp_ms,
                        self.config.session_id.as_deref(),
                    ) {
                        log_debug(&format!("frame sink failed: {err:#}"));
                        self.outlet.emit(RuntimeEvent::SinkFailed {
                            message: format!("{err:#}"),
                        });
                    }
                }
                self.outlet.emit(RuntimeEvent::Captured {
                    file_name: captured.file_name.clone(),
                    timestamp_ms: captured.timestamp_ms,
                    width: captured.width,
                    height: captured.height,
                    bytes: captured.bytes.len(),
                    difference: *difference,
                    signature: signature.to_string(),
                });
            }
            CaptureOutcome::Rejected(decision) => {
                tracing::debug!(decision = decision.label(), "capture candidate rejected");
            }
        }
        Some(outcome)
    }

    pub fn run(mut self, clock: MonotonicClock, shutdown: Receiver<()>) {
        let interval = Duration::from_millis(self.config.capture_interval_ms.max(1));
        let ticker = tick(interval);
        log_debug(&format!(
            "capture loop running every {} ms",
            interval.as_millis()
        ));
        loop {
            select! {
                recv(ticker) -> _ => {
                    self.tick(clock.now_ms(), unix_ms());
                }
                recv(shutdown) -> _ => break,
            }
        }
        self.release("shutdown");
        log_debug(&format!(
            "capture loop exiting after {} capture(s)",
            self.captured
        ));
    }
}
