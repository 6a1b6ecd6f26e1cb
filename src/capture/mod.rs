//! Camera capture gate: hash each frame, forward only novel ones.

mod capturer;
mod gate;
mod hash;
mod pipeline;
mod sink;
mod source;

pub use capturer::{
    capture_file_name, encode_jpeg, CapturedFrame, FrameCapturer, DEFAULT_JPEG_QUALITY,
};
pub use gate::{
    CaptureGate, GateConfig, GateDecision, DEFAULT_MIN_INTERVAL_MS, DEFAULT_RESET_AFTER_MS,
    DEFAULT_SIMILARITY_THRESHOLD,
};
pub use hash::{
    difference, downsample, FrameSignature, PerceptualHasher, DEFAULT_COMPONENTS,
    DEFAULT_HASH_WIDTH, MAX_PREVIEW_ASPECT,
};
pub use pipeline::{CaptureOutcome, CapturePipeline};
pub use sink::{DirectorySink, FrameSink, CAPTURE_INDEX_FILE};
pub use source::{
    ImageSequenceFactory, ImageSequenceSource, SourceFrame, VideoFrameSource, VideoSourceFactory,
};

/// Validated capture settings handed to the capture loop.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureConfig {
    pub gate: GateConfig,
    /// Period of the capture loop.
    pub capture_interval_ms: u64,
    pub hash_width: u32,
    pub jpeg_quality: u8,
    /// Only capture while the session reports connected.
    pub require_connection: bool,
    pub session_id: Option<String>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            gate: GateConfig::default(),
            capture_interval_ms: DEFAULT_MIN_INTERVAL_MS,
            hash_width: DEFAULT_HASH_WIDTH,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            require_connection: true,
            session_id: None,
        }
    }
}
