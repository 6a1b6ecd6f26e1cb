//! Visual state of the radial indicator.
//!
//! The machine holds exactly one [`AnimationState`] and turns it, together
//! with the current mic amplitude, into a [`GeometryDescriptor`] every tick.
//! Time is passed in as milliseconds on a monotonic clock so every curve is
//! reproducible in tests.

mod envelope;
mod geometry;
mod machine;

pub use envelope::{continuous_envelope, one_shot_envelope, ThreePhaseCurve};
pub use geometry::GeometryDescriptor;
pub use machine::AnimationMachine;

/// Default pulse length `D`.
pub const DEFAULT_PULSE_MS: u64 = 800;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseMode {
    /// Decays to idle after one pulse length.
    OneShot,
    /// Breathes until cancelled (remote party speaking).
    Continuous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnimationState {
    #[default]
    Idle,
    Pulse { start_ms: u64, mode: PulseMode },
}

impl AnimationState {
    pub fn mode(&self) -> Option<PulseMode> {
        match self {
            AnimationState::Idle => None,
            AnimationState::Pulse { mode, .. } => Some(*mode),
        }
    }

    pub fn label(&self) -> &'static str {
        match self.mode() {
            None => "idle",
            Some(PulseMode::OneShot) => "one_shot",
            Some(PulseMode::Continuous) => "continuous",
        }
    }
}

/// Tunables for envelopes and scale mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationConfig {
    pub pulse_duration_ms: u64,
    pub pulse_curve: ThreePhaseCurve,
    pub shadow_curve: ThreePhaseCurve,
    pub glow_base: f32,
    pub glow_gain: f32,
    pub pulse_scale_gain: f32,
    pub voice_scale_gain: f32,
    /// Amplitude below which the idle ring stays at rest.
    pub voice_gate: f32,
    pub continuous_center: f32,
    pub continuous_depth: f32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            pulse_duration_ms: DEFAULT_PULSE_MS,
            pulse_curve: ThreePhaseCurve::PULSE,
            shadow_curve: ThreePhaseCurve::SHADOW,
            glow_base: 0.9,
            glow_gain: 0.125,
            pulse_scale_gain: 0.05,
            voice_scale_gain: 0.15,
            voice_gate: 0.05,
            continuous_center: 0.4,
            continuous_depth: 0.2,
        }
    }
}
