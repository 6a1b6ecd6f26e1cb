use super::defaults::{
    MAX_CAPTURE_INTERVAL_MS, MAX_DEVICE_NAME_BYTES, MAX_HASH_WIDTH, MAX_INDICATOR_SIZE,
    MAX_PIXEL_RATIO, MAX_SESSION_ID_BYTES, MAX_TICK_HZ, MAX_WINDOW_SAMPLES,
};
use super::AppConfig;
use crate::animation::AnimationConfig;
use crate::capture::{CaptureConfig, GateConfig};
use crate::runtime::RuntimeOptions;
use anyhow::{bail, Context, Result};
use clap::Parser;

impl AppConfig {
    /// Parse CLI arguments and validate them right away.
    pub fn parse_args() -> Result<Self> {
        let mut config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    /// Check CLI values and normalize paths.
    pub fn validate(&mut self) -> Result<()> {
        if !(8..=MAX_INDICATOR_SIZE).contains(&self.size) {
            bail!(
                "--size must be between 8 and {MAX_INDICATOR_SIZE}, got {}",
                self.size
            );
        }
        if !self.pixel_ratio.is_finite()
            || self.pixel_ratio <= 0.0
            || self.pixel_ratio > MAX_PIXEL_RATIO
        {
            bail!(
                "--pixel-ratio must be greater than 0 and at most {MAX_PIXEL_RATIO}, got {}",
                self.pixel_ratio
            );
        }
        if !(1..=MAX_TICK_HZ).contains(&self.tick_hz) {
            bail!(
                "--tick-hz must be between 1 and {MAX_TICK_HZ}, got {}",
                self.tick_hz
            );
        }
        if !(100..=10_000).contains(&self.pulse_ms) {
            bail!(
                "--pulse-ms must be between 100 and 10000, got {}",
                self.pulse_ms
            );
        }
        if !self.amplitude_norm.is_finite()
            || self.amplitude_norm <= 0.0
            || self.amplitude_norm > 128.0
        {
            bail!(
                "--amplitude-norm must be greater than 0 and at most 128, got {}",
                self.amplitude_norm
            );
        }
        if !(32..=MAX_WINDOW_SAMPLES).contains(&self.window_samples) {
            bail!(
                "--window-samples must be between 32 and {MAX_WINDOW_SAMPLES}, got {}",
                self.window_samples
            );
        }
        if !(100..=MAX_CAPTURE_INTERVAL_MS).contains(&self.capture_interval_ms) {
            bail!(
                "--capture-interval-ms must be between 100 and {MAX_CAPTURE_INTERVAL_MS}, got {}",
                self.capture_interval_ms
            );
        }
        if !(0.0..=100.0).contains(&self.similarity_threshold) {
            bail!(
                "--similarity-threshold must be between 0 and 100, got {}",
                self.similarity_threshold
            );
        }
        if self.hash_reset_ms < self.capture_interval_ms || self.hash_reset_ms > 600_000 {
            bail!(
                "--hash-reset-ms must be between --capture-interval-ms ({}) and 600000",
                self.capture_interval_ms
            );
        }
        if !(4..=MAX_HASH_WIDTH).contains(&self.hash_width) {
            bail!(
                "--hash-width must be between 4 and {MAX_HASH_WIDTH}, got {}",
                self.hash_width
            );
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            bail!(
                "--jpeg-quality must be between 1 and 100, got {}",
                self.jpeg_quality
            );
        }
        if self.geometry_emit_ms > 60_000 {
            bail!(
                "--geometry-emit-ms must be at most 60000, got {}",
                self.geometry_emit_ms
            );
        }

        if let Some(device) = &self.input_device {
            if device.trim().is_empty()
                || device.len() > MAX_DEVICE_NAME_BYTES
                || device.chars().any(char::is_control)
            {
                bail!(
                    "--input-device must be 1-{MAX_DEVICE_NAME_BYTES} characters with no control characters"
                );
            }
        }

        if let Some(id) = &self.session_id {
            if id.is_empty()
                || id.len() > MAX_SESSION_ID_BYTES
                || !id
                    .chars()
                    .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | ':'))
            {
                bail!(
                    "--session-id must be 1-{MAX_SESSION_ID_BYTES} characters of [A-Za-z0-9-_.:]"
                );
            }
        }

        if let Some(dir) = &mut self.frames_dir {
            let canonical = dir
                .canonicalize()
                .with_context(|| format!("failed to canonicalize --frames-dir '{}'", dir.display()))?;
            if !canonical.is_dir() {
                bail!("--frames-dir '{}' is not a directory", canonical.display());
            }
            *dir = canonical;
        }
        if self.output_dir.is_some() && self.frames_dir.is_none() {
            bail!("--output-dir requires --frames-dir");
        }
        if let Some(dir) = &self.output_dir {
            if dir.exists() && !dir.is_dir() {
                bail!("--output-dir '{}' is not a directory", dir.display());
            }
        }

        Ok(())
    }

    /// Whether any file logging was requested.
    pub fn logging_enabled(&self) -> bool {
        (self.logs || self.log_timings) && !self.no_logs
    }

    /// Snapshot the animation tunables for the render loop.
    pub fn animation_config(&self) -> AnimationConfig {
        AnimationConfig {
            pulse_duration_ms: self.pulse_ms,
            ..AnimationConfig::default()
        }
    }

    /// Capture settings, or `None` when no frame source was configured.
    pub fn capture_config(&self) -> Option<CaptureConfig> {
        self.frames_dir.as_ref()?;
        Some(CaptureConfig {
            gate: GateConfig {
                min_interval_ms: self.capture_interval_ms,
                threshold: self.similarity_threshold,
                reset_after_ms: self.hash_reset_ms,
            },
            capture_interval_ms: self.capture_interval_ms,
            hash_width: self.hash_width,
            jpeg_quality: self.jpeg_quality,
            require_connection: !self.capture_without_connection,
            session_id: self.session_id.clone(),
        })
    }

    pub fn runtime_options(&self) -> RuntimeOptions {
        RuntimeOptions {
            logical_size: self.size,
            pixel_ratio: self.pixel_ratio,
            tick_hz: self.tick_hz,
            amplitude_norm: self.amplitude_norm,
            geometry_emit_ms: self.geometry_emit_ms,
            animation: self.animation_config(),
            capture: self.capture_config(),
            start_visible: true,
            log_timings: self.log_timings,
        }
    }
}
