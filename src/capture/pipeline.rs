use super::capturer::{CapturedFrame, FrameCapturer};
use super::gate::{CaptureGate, GateDecision};
use super::hash::{FrameSignature, PerceptualHasher};
use super::source::SourceFrame;
use super::CaptureConfig;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    Captured {
        frame: CapturedFrame,
        signature: FrameSignature,
        difference: f32,
    },
    Rejected(GateDecision),
}

/// Hash, gate, and encode for one capture tick.
///
/// The gate only commits after the JPEG encode succeeded, so a failed encode
/// leaves the reference and cooldown where they were.
#[derive(Debug, Clone)]
pub struct CapturePipeline {
    hasher: PerceptualHasher,
    gate: CaptureGate,
    capturer: FrameCapturer,
}

impl CapturePipeline {
    pub fn new(config: &CaptureConfig) -> Self {
        Self {
            hasher: PerceptualHasher::new(config.hash_width),
            gate: CaptureGate::new(config.gate),
            capturer: FrameCapturer::new(config.gate.min_interval_ms, config.jpeg_quality),
        }
    }

    pub fn gate(&self) -> &CaptureGate {
        &self.gate
    }

    pub fn signature(&self, frame: &SourceFrame) -> Result<FrameSignature> {
        self.hasher.hash_preview(&frame.preview)
    }

    /// Clear an expired reference even when no frame arrives.
    pub fn expire(&mut self, now_ms: u64) -> bool {
        self.gate.expire(now_ms)
    }

    pub fn admit(
        &mut self,
        frame: &SourceFrame,
        signature: FrameSignature,
        now_ms: u64,
        unix_ms: u64,
    ) -> Result<CaptureOutcome> {
        self.gate.expire(now_ms);
        let decision = self.gate.evaluate(&signature, now_ms);
        let GateDecision::Accept { difference } = decision else {
            return Ok(CaptureOutcome::Rejected(decision));
        };
        let Some(captured) = self.capturer.capture(&frame.full, now_ms, unix_ms)? else {
            return Ok(CaptureOutcome::Rejected(GateDecision::RejectCooldown {
                remaining_ms: 0,
            }));
        };
        self.gate.commit(signature.clone(), now_ms);
        Ok(CaptureOutcome::Captured {
            frame: captured,
            signature,
            difference,
        })
    }

    /// Hash and admit in one step.
    pub fn process(
        &mut self,
        frame: &SourceFrame,
        now_ms: u64,
        unix_ms: u64,
    ) -> Result<CaptureOutcome> {
        let signature = self.signature(frame)?;
        self.admit(frame, signature, now_ms, unix_ms)
    }

    /// Discard gate state when capture is disabled.
    pub fn reset(&mut self) {
        self.gate.reset();
        self.capturer.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn frame(full: RgbaImage) -> SourceFrame {
        SourceFrame::new(full, 32).expect("frame")
    }

    fn checker(shift: u32) -> SourceFrame {
        frame(RgbaImage::from_fn(96, 64, |x, y| {
            if ((x + shift) / 16 + y / 16) % 2 == 0 {
                Rgba([240, 240, 240, 255])
            } else {
                Rgba([20, 30, 200, 255])
            }
        }))
    }

    fn solid(rgb: [u8; 3]) -> SourceFrame {
        frame(RgbaImage::from_pixel(96, 64, Rgba([rgb[0], rgb[1], rgb[2], 255])))
    }

    #[test]
    fn first_frame_is_captured_then_duplicates_are_rejected() {
        let mut pipeline = CapturePipeline::new(&CaptureConfig::default());
        let outcome = pipeline.process(&checker(0), 0, 1_700).expect("process");
        let CaptureOutcome::Captured { frame, difference, .. } = outcome else {
            panic!("first frame must be captured");
        };
        assert_eq!(difference, 100.0);
        assert_eq!(frame.file_name, "camera-capture-1700.jpg");

        let again = pipeline.process(&checker(0), 1_000, 2_700).expect("process");
        assert_eq!(
            again,
            CaptureOutcome::Rejected(GateDecision::RejectSimilar { difference: 0.0 })
        );
    }

    #[test]
    fn changed_scene_is_captured_after_cooldown() {
        let mut pipeline = CapturePipeline::new(&CaptureConfig::default());
        pipeline.process(&solid([250, 250, 250]), 0, 0).expect("process");
        let early = pipeline.process(&checker(0), 500, 0).expect("process");
        assert!(matches!(
            early,
            CaptureOutcome::Rejected(GateDecision::RejectCooldown { .. })
        ));
        let later = pipeline.process(&checker(0), 1_000, 0).expect("process");
        assert!(matches!(later, CaptureOutcome::Captured { .. }));
    }

    #[test]
    fn identical_frame_is_recaptured_after_reset_window() {
        let mut pipeline = CapturePipeline::new(&CaptureConfig::default());
        pipeline.process(&checker(0), 0, 0).expect("process");
        assert!(pipeline.expire(5_000));
        let outcome = pipeline.process(&checker(0), 5_000, 0).expect("process");
        assert!(matches!(outcome, CaptureOutcome::Captured { .. }));
    }

    #[test]
    fn encoding_failure_leaves_gate_unchanged() {
        let mut pipeline = CapturePipeline::new(&CaptureConfig::default());
        pipeline.process(&checker(0), 0, 0).expect("process");
        let reference = pipeline.gate().reference().cloned();

        let broken = SourceFrame {
            full: RgbaImage::new(0, 0),
            preview: solid([0, 0, 0]).preview,
        };
        let err = pipeline.process(&broken, 2_000, 0).unwrap_err();
        assert_eq!(err.label(), "encoding_failure");
        assert_eq!(pipeline.gate().reference().cloned(), reference);
        assert_eq!(pipeline.gate().last_accepted_ms(), Some(0));
    }

    #[test]
    fn hash_failure_rejects_candidate() {
        let mut pipeline = CapturePipeline::new(&CaptureConfig::default());
        let broken = SourceFrame {
            full: RgbaImage::from_pixel(4, 4, Rgba([1, 2, 3, 255])),
            preview: RgbaImage::new(0, 0),
        };
        let err = pipeline.process(&broken, 0, 0).unwrap_err();
        assert_eq!(err.label(), "hash_failure");
        assert!(pipeline.gate().reference().is_none());
    }

    #[test]
    fn reset_discards_state() {
        let mut pipeline = CapturePipeline::new(&CaptureConfig::default());
        pipeline.process(&checker(0), 0, 0).expect("process");
        pipeline.reset();
        let outcome = pipeline.process(&checker(0), 10, 0).expect("process");
        assert!(matches!(outcome, CaptureOutcome::Captured { .. }));
    }
}
