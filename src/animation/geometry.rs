use super::envelope::{continuous_envelope, one_shot_envelope};
use super::{AnimationConfig, AnimationState, PulseMode};

/// Per-tick drawing parameters handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryDescriptor {
    /// Multiplier applied to every ring radius.
    pub scale: f32,
    /// Opacity of the lower-right ambient shadow.
    pub shadow_intensity: f32,
    /// Opacity of the upper-left highlight glow.
    pub glow_intensity: f32,
    /// Active envelope: mic amplitude while idle, pulse curve otherwise.
    pub envelope: f32,
    pub pulsing: bool,
}

impl GeometryDescriptor {
    /// Resting ring used when no device is available.
    pub fn neutral(config: &AnimationConfig) -> Self {
        Self {
            scale: 1.0,
            shadow_intensity: config.shadow_curve.base,
            glow_intensity: config.glow_base,
            envelope: 0.0,
            pulsing: false,
        }
    }
}

/// Envelope for `state` at `now_ms`.
pub(super) fn envelope_at(
    config: &AnimationConfig,
    state: AnimationState,
    now_ms: u64,
    amplitude: f32,
) -> f32 {
    match state {
        AnimationState::Idle => amplitude.clamp(0.0, 1.0),
        AnimationState::Pulse {
            start_ms,
            mode: PulseMode::OneShot,
        } => one_shot_envelope(
            &config.pulse_curve,
            now_ms.saturating_sub(start_ms),
            config.pulse_duration_ms,
        ),
        AnimationState::Pulse {
            mode: PulseMode::Continuous,
            ..
        } => continuous_envelope(
            now_ms,
            config.pulse_duration_ms,
            config.continuous_center,
            config.continuous_depth,
        ),
    }
}

/// Derive the descriptor. Voice input contracts the ring; synthetic pulses
/// expand it. The two regimes never mix within one tick.
pub(super) fn describe(
    config: &AnimationConfig,
    state: AnimationState,
    now_ms: u64,
    amplitude: f32,
) -> GeometryDescriptor {
    let envelope = envelope_at(config, state, now_ms, amplitude);
    match state {
        AnimationState::Idle => {
            let scale = if envelope > config.voice_gate {
                1.0 - envelope * config.voice_scale_gain
            } else {
                1.0
            };
            GeometryDescriptor {
                scale,
                shadow_intensity: config.shadow_curve.base,
                glow_intensity: config.glow_base,
                envelope,
                pulsing: false,
            }
        }
        AnimationState::Pulse { start_ms, .. } => {
            let progress = if config.pulse_duration_ms == 0 {
                1.0
            } else {
                now_ms.saturating_sub(start_ms) as f32 / config.pulse_duration_ms as f32
            };
            GeometryDescriptor {
                scale: 1.0 + envelope * config.pulse_scale_gain,
                shadow_intensity: config.shadow_curve.at(progress).min(1.0),
                glow_intensity: (config.glow_base + envelope * config.glow_gain).min(1.0),
                envelope,
                pulsing: true,
            }
        }
    }
}
