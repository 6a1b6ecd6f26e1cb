use crate::error::{Result, VoxringError};
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage, RgbaImage};

pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// An accepted frame ready for the sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedFrame {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Wall-clock capture time in unix milliseconds.
    pub timestamp_ms: u64,
    pub file_name: String,
}

pub fn capture_file_name(unix_ms: u64) -> String {
    format!("camera-capture-{unix_ms}.jpg")
}

/// Encodes accepted frames at full resolution, at most once per `min_interval_ms`.
#[derive(Debug, Clone)]
pub struct FrameCapturer {
    min_interval_ms: u64,
    jpeg_quality: u8,
    last_run_ms: Option<u64>,
}

impl FrameCapturer {
    pub fn new(min_interval_ms: u64, jpeg_quality: u8) -> Self {
        Self {
            min_interval_ms,
            jpeg_quality: jpeg_quality.clamp(1, 100),
            last_run_ms: None,
        }
    }

    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }

    pub fn ready(&self, now_ms: u64) -> bool {
        self.last_run_ms
            .map_or(true, |last| now_ms.saturating_sub(last) >= self.min_interval_ms)
    }

    /// Encode `frame`. Returns `Ok(None)` while the capturer is cooling down.
    /// A failed encode still counts as a run.
    pub fn capture(
        &mut self,
        frame: &RgbaImage,
        now_ms: u64,
        unix_ms: u64,
    ) -> Result<Option<CapturedFrame>> {
        if !self.ready(now_ms) {
            return Ok(None);
        }
        self.last_run_ms = Some(now_ms);
        let bytes = encode_jpeg(frame, self.jpeg_quality)?;
        Ok(Some(CapturedFrame {
            bytes,
            width: frame.width(),
            height: frame.height(),
            timestamp_ms: unix_ms,
            file_name: capture_file_name(unix_ms),
        }))
    }

    pub fn reset(&mut self) {
        self.last_run_ms = None;
    }
}

impl Default for FrameCapturer {
    fn default() -> Self {
        Self::new(super::gate::DEFAULT_MIN_INTERVAL_MS, DEFAULT_JPEG_QUALITY)
    }
}

pub fn encode_jpeg(frame: &RgbaImage, quality: u8) -> Result<Vec<u8>> {
    let (width, height) = frame.dimensions();
    if width == 0 || height == 0 {
        return Err(VoxringError::EncodingFailure(format!(
            "cannot encode empty {width}x{height} frame"
        )));
    }
    // JPEG has no alpha channel.
    let rgb = DynamicImage::ImageRgba8(frame.clone()).into_rgb8();
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality)
        .encode(rgb.as_raw(), width, height, ColorType::Rgb8)
        .map_err(|err| VoxringError::EncodingFailure(err.to_string()))?;
    Ok(bytes)
}
