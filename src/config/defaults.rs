use crate::{animation, audio, capture};

pub const DEFAULT_INDICATOR_SIZE: u32 = 120;
pub const DEFAULT_PIXEL_RATIO: f32 = 1.0;
pub const DEFAULT_TICK_HZ: u32 = 60;
pub const DEFAULT_PULSE_MS: u64 = animation::DEFAULT_PULSE_MS;
pub const DEFAULT_AMPLITUDE_NORM: f32 = audio::DEFAULT_AMPLITUDE_NORM;
pub const DEFAULT_WINDOW_SAMPLES: usize = audio::DEFAULT_WINDOW_SAMPLES;
pub const DEFAULT_CAPTURE_INTERVAL_MS: u64 = capture::DEFAULT_MIN_INTERVAL_MS;
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = capture::DEFAULT_SIMILARITY_THRESHOLD;
pub const DEFAULT_HASH_RESET_MS: u64 = capture::DEFAULT_RESET_AFTER_MS;
pub const DEFAULT_HASH_WIDTH: u32 = capture::DEFAULT_HASH_WIDTH;
pub const DEFAULT_JPEG_QUALITY: u8 = capture::DEFAULT_JPEG_QUALITY;
pub const DEFAULT_GEOMETRY_EMIT_MS: u64 = 100;

pub(super) const MAX_INDICATOR_SIZE: u32 = 4096;
pub(super) const MAX_PIXEL_RATIO: f32 = 8.0;
pub(super) const MAX_TICK_HZ: u32 = 240;
pub(super) const MAX_WINDOW_SAMPLES: usize = 32_768;
pub(super) const MAX_CAPTURE_INTERVAL_MS: u64 = 60_000;
pub(super) const MAX_HASH_WIDTH: u32 = 256;
pub(super) const MAX_SESSION_ID_BYTES: usize = 128;
pub(super) const MAX_DEVICE_NAME_BYTES: usize = 256;
