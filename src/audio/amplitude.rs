//! Reduces one analysis buffer of microphone samples to a loudness scalar.

/// Byte-domain value that represents zero signal.
pub const SAMPLE_MIDPOINT: u8 = 128;

/// Mean deviation (in byte steps) that maps to full amplitude. Tuned so that
/// conversational speech lands around 0.3-0.6.
pub const DEFAULT_AMPLITUDE_NORM: f32 = 50.0;

/// One analysis buffer of time-domain samples centered at [`SAMPLE_MIDPOINT`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudioWindow {
    samples: Vec<u8>,
}

impl AudioWindow {
    pub fn new(samples: Vec<u8>) -> Self {
        Self { samples }
    }

    /// A window of `len` samples sitting exactly on the midpoint.
    pub fn silent(len: usize) -> Self {
        Self {
            samples: vec![SAMPLE_MIDPOINT; len],
        }
    }

    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Mean absolute distance from the midpoint, in byte steps.
    pub fn mean_deviation(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let total: u64 = self
            .samples
            .iter()
            .map(|&s| u64::from(s.abs_diff(SAMPLE_MIDPOINT)))
            .sum();
        total as f32 / self.samples.len() as f32
    }
}

/// Convert a normalized float sample (-1.0..=1.0) into the byte domain.
#[inline]
pub fn sample_to_byte(sample: f32) -> u8 {
    let value = sample.clamp(-1.0, 1.0) * 128.0 + f32::from(SAMPLE_MIDPOINT);
    value.round().clamp(0.0, 255.0) as u8
}

/// Loudness estimator applied once per render tick.
#[derive(Debug, Clone, Copy)]
pub struct AmplitudeSampler {
    norm: f32,
}

impl AmplitudeSampler {
    pub fn new(norm: f32) -> Self {
        Self {
            norm: if norm > 0.0 { norm } else { DEFAULT_AMPLITUDE_NORM },
        }
    }

    pub fn norm(&self) -> f32 {
        self.norm
    }

    /// `clamp(mean(|sample - M|) / K, 0, 1)`; silent or empty windows yield 0.
    pub fn amplitude(&self, window: &AudioWindow) -> f32 {
        (window.mean_deviation() / self.norm).clamp(0.0, 1.0)
    }
}

impl Default for AmplitudeSampler {
    fn default() -> Self {
        Self::new(DEFAULT_AMPLITUDE_NORM)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window_with_deviation(dev: u8, len: usize) -> AudioWindow {
        // Alternate above/below the midpoint so the mean stays centered.
        let samples = (0..len)
            .map(|i| {
                if i % 2 == 0 {
                    SAMPLE_MIDPOINT.saturating_add(dev)
                } else {
                    SAMPLE_MIDPOINT.saturating_sub(dev)
                }
            })
            .collect();
        AudioWindow::new(samples)
    }

    #[test]
    fn silent_window_has_zero_amplitude() {
        let sampler = AmplitudeSampler::default();
        assert_eq!(sampler.amplitude(&AudioWindow::silent(1024)), 0.0);
    }

    #[test]
    fn empty_window_has_zero_amplitude() {
        let sampler = AmplitudeSampler::default();
        assert_eq!(sampler.amplitude(&AudioWindow::default()), 0.0);
    }

    #[test]
    fn amplitude_is_clipped_to_one() {
        let sampler = AmplitudeSampler::default();
        let loud = AudioWindow::new(vec![255, 0, 255, 0]);
        assert_eq!(sampler.amplitude(&loud), 1.0);
    }

    #[test]
    fn amplitude_is_monotonic_in_deviation() {
        let sampler = AmplitudeSampler::default();
        let mut previous = 0.0f32;
        for dev in 0..=127u8 {
            let value = sampler.amplitude(&window_with_deviation(dev, 64));
            assert!((0.0..=1.0).contains(&value));
            assert!(value >= previous, "dev {dev}: {value} < {previous}");
            previous = value;
        }
    }

    #[test]
    fn typical_speech_lands_mid_range() {
        let sampler = AmplitudeSampler::default();
        let value = sampler.amplitude(&window_with_deviation(22, 1024));
        assert!((0.3..=0.6).contains(&value), "got {value}");
    }

    #[test]
    fn non_positive_norm_falls_back_to_default() {
        assert_eq!(AmplitudeSampler::new(0.0).norm(), DEFAULT_AMPLITUDE_NORM);
        assert_eq!(AmplitudeSampler::new(-3.0).norm(), DEFAULT_AMPLITUDE_NORM);
    }

    #[test]
    fn float_samples_map_onto_byte_domain() {
        assert_eq!(sample_to_byte(0.0), SAMPLE_MIDPOINT);
        assert_eq!(sample_to_byte(1.0), 255);
        assert_eq!(sample_to_byte(-1.0), 0);
        assert_eq!(sample_to_byte(4.0), 255);
    }
}
