//! Time curves that drive the ring during a pulse.

use std::f32::consts::TAU;

/// Ramp / fade / hold curve over normalized progress.
///
/// From `base` the value climbs to `peak` across the first `ramp_fraction` of
/// the pulse (shaped by `ramp_exponent`), falls back linearly to `base` by the
/// end of the pulse, and holds at `base` afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThreePhaseCurve {
    pub base: f32,
    pub peak: f32,
    pub ramp_fraction: f32,
    pub ramp_exponent: f32,
}

impl ThreePhaseCurve {
    /// Envelope of a one-shot pulse: 0 -> 0.8 over 20%, linear fade after.
    pub const PULSE: Self = Self {
        base: 0.0,
        peak: 0.8,
        ramp_fraction: 0.2,
        ramp_exponent: 1.0,
    };

    /// Ambient shadow opacity: eased 0.7 -> 1.0, then back to 0.7.
    pub const SHADOW: Self = Self {
        base: 0.7,
        peak: 1.0,
        ramp_fraction: 0.2,
        ramp_exponent: 2.0,
    };

    pub fn at(&self, progress: f32) -> f32 {
        let range = self.peak - self.base;
        let ramp = self.ramp_fraction.clamp(f32::EPSILON, 1.0);
        if !(0.0..1.0).contains(&progress) {
            return self.base;
        }
        if progress < ramp {
            let rise = (progress / ramp).powf(self.ramp_exponent.max(f32::EPSILON));
            return self.base + rise * range;
        }
        let fade_span = (1.0 - ramp).max(f32::EPSILON);
        let fade = (progress - ramp) / fade_span;
        self.peak - fade * range
    }
}

/// Envelope of a one-shot pulse `elapsed_ms` into a pulse of `duration_ms`.
pub fn one_shot_envelope(curve: &ThreePhaseCurve, elapsed_ms: u64, duration_ms: u64) -> f32 {
    if duration_ms == 0 {
        return curve.base;
    }
    curve.at(elapsed_ms as f32 / duration_ms as f32)
}

/// Steady breathing pulse: `center + depth * sin(2π * (now mod D) / D)`.
pub fn continuous_envelope(now_ms: u64, duration_ms: u64, center: f32, depth: f32) -> f32 {
    if duration_ms == 0 {
        return center;
    }
    let phase = (now_ms % duration_ms) as f32 / duration_ms as f32;
    center + depth * (TAU * phase).sin()
}

#[cfg(test)]
mod tests {
    use super::*;

    const D: u64 = 800;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn one_shot_starts_at_zero() {
        assert_eq!(one_shot_envelope(&ThreePhaseCurve::PULSE, 0, D), 0.0);
    }

    #[test]
    fn one_shot_peaks_at_twenty_percent() {
        let peak = one_shot_envelope(&ThreePhaseCurve::PULSE, 160, D);
        assert!(approx(peak, 0.8));
        for t in (0..D).step_by(10) {
            assert!(one_shot_envelope(&ThreePhaseCurve::PULSE, t, D) <= peak + 1e-6);
        }
    }

    #[test]
    fn one_shot_returns_to_zero_at_duration() {
        assert_eq!(one_shot_envelope(&ThreePhaseCurve::PULSE, D, D), 0.0);
        assert_eq!(one_shot_envelope(&ThreePhaseCurve::PULSE, D * 3, D), 0.0);
        let near_end = one_shot_envelope(&ThreePhaseCurve::PULSE, D - 1, D);
        assert!(near_end < 0.01);
    }

    #[test]
    fn one_shot_ramp_is_linear() {
        let quarter = one_shot_envelope(&ThreePhaseCurve::PULSE, 40, D);
        assert!(approx(quarter, 0.2));
        let mid_fade = one_shot_envelope(&ThreePhaseCurve::PULSE, 480, D);
        assert!(approx(mid_fade, 0.4));
    }

    #[test]
    fn shadow_curve_eases_in_and_holds_base() {
        let curve = ThreePhaseCurve::SHADOW;
        assert!(approx(curve.at(0.0), 0.7));
        assert!(approx(curve.at(0.1), 0.775));
        assert!(approx(curve.at(0.2), 1.0));
        assert!(approx(curve.at(0.6), 0.85));
        assert!(approx(curve.at(1.5), 0.7));
    }

    #[test]
    fn continuous_stays_within_band() {
        for now in (0..10_000u64).step_by(7) {
            let value = continuous_envelope(now, D, 0.4, 0.2);
            assert!((0.2 - 1e-6..=0.6 + 1e-6).contains(&value), "{now}: {value}");
        }
    }

    #[test]
    fn continuous_crests_at_quarter_period() {
        assert!(approx(continuous_envelope(200, D, 0.4, 0.2), 0.6));
        assert!(approx(continuous_envelope(600, D, 0.4, 0.2), 0.2));
        assert!(approx(continuous_envelope(800, D, 0.4, 0.2), 0.4));
    }

    #[test]
    fn zero_duration_is_inert() {
        assert_eq!(one_shot_envelope(&ThreePhaseCurve::PULSE, 5, 0), 0.0);
        assert_eq!(continuous_envelope(5, 0, 0.4, 0.2), 0.4);
    }
}
