//! Command-line parsing and validation helpers.

mod defaults;
mod validation;

use clap::Parser;
use std::path::PathBuf;

pub use defaults::{
    DEFAULT_AMPLITUDE_NORM, DEFAULT_CAPTURE_INTERVAL_MS, DEFAULT_GEOMETRY_EMIT_MS,
    DEFAULT_HASH_RESET_MS, DEFAULT_HASH_WIDTH, DEFAULT_INDICATOR_SIZE, DEFAULT_JPEG_QUALITY,
    DEFAULT_PIXEL_RATIO, DEFAULT_PULSE_MS, DEFAULT_SIMILARITY_THRESHOLD, DEFAULT_TICK_HZ,
    DEFAULT_WINDOW_SAMPLES,
};

/// CLI options for the VoxRing indicator. Validated values keep the loops in range.
#[derive(Debug, Parser, Clone)]
#[command(about = "VoxRing audio-reactive indicator and capture gate", author, version)]
pub struct AppConfig {
    /// Preferred audio input device name
    #[arg(long)]
    pub input_device: Option<String>,

    /// Print detected audio input devices and exit
    #[arg(long = "list-input-devices", default_value_t = false)]
    pub list_input_devices: bool,

    /// Logical indicator size (pixels)
    #[arg(long, default_value_t = DEFAULT_INDICATOR_SIZE)]
    pub size: u32,

    /// Device pixel ratio of the drawing surface
    #[arg(long = "pixel-ratio", default_value_t = DEFAULT_PIXEL_RATIO)]
    pub pixel_ratio: f32,

    /// Render loop frequency (Hz)
    #[arg(long = "tick-hz", default_value_t = DEFAULT_TICK_HZ)]
    pub tick_hz: u32,

    /// Pulse duration for connect and speech animations (milliseconds)
    #[arg(long = "pulse-ms", default_value_t = DEFAULT_PULSE_MS)]
    pub pulse_ms: u64,

    /// Mean sample deviation that maps to full amplitude
    #[arg(long = "amplitude-norm", default_value_t = DEFAULT_AMPLITUDE_NORM)]
    pub amplitude_norm: f32,

    /// Samples per analysis window
    #[arg(long = "window-samples", default_value_t = DEFAULT_WINDOW_SAMPLES)]
    pub window_samples: usize,

    /// Disable the connect chime
    #[arg(long = "no-sounds", env = "VOXRING_NO_SOUNDS", default_value_t = false)]
    pub no_sounds: bool,

    /// Directory of camera frames to replay; enables the capture gate
    #[arg(long = "frames-dir")]
    pub frames_dir: Option<PathBuf>,

    /// Directory that receives accepted captures
    #[arg(long = "output-dir")]
    pub output_dir: Option<PathBuf>,

    /// Capture loop period and minimum spacing of accepted frames (milliseconds)
    #[arg(long = "capture-interval-ms", default_value_t = DEFAULT_CAPTURE_INTERVAL_MS)]
    pub capture_interval_ms: u64,

    /// Minimum signature difference (0-100) for a frame to count as new
    #[arg(
        long = "similarity-threshold",
        default_value_t = DEFAULT_SIMILARITY_THRESHOLD
    )]
    pub similarity_threshold: f32,

    /// Forget the last accepted frame after this long (milliseconds)
    #[arg(long = "hash-reset-ms", default_value_t = DEFAULT_HASH_RESET_MS)]
    pub hash_reset_ms: u64,

    /// Width of the downsampled copy used for hashing (pixels)
    #[arg(long = "hash-width", default_value_t = DEFAULT_HASH_WIDTH)]
    pub hash_width: u32,

    /// JPEG quality of accepted captures (1-100)
    #[arg(long = "jpeg-quality", default_value_t = DEFAULT_JPEG_QUALITY)]
    pub jpeg_quality: u8,

    /// Capture even while no session is connected
    #[arg(long = "capture-without-connection", default_value_t = false)]
    pub capture_without_connection: bool,

    /// Session id attached to every capture
    #[arg(long = "session-id", env = "VOXRING_SESSION_ID")]
    pub session_id: Option<String>,

    /// Minimum spacing of geometry events on stdout; 0 disables them (milliseconds)
    #[arg(long = "geometry-emit-ms", default_value_t = DEFAULT_GEOMETRY_EMIT_MS)]
    pub geometry_emit_ms: u64,

    /// Enable file logging (debug)
    #[arg(long = "logs", env = "VOXRING_LOGS", default_value_t = false)]
    pub logs: bool,

    /// Disable all file logging (overrides --logs and log env vars)
    #[arg(long = "no-logs", env = "VOXRING_NO_LOGS", default_value_t = false)]
    pub no_logs: bool,

    /// Enable verbose timing logs
    #[arg(long)]
    pub log_timings: bool,
}
