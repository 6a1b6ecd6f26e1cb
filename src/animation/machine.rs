use super::geometry::{describe, envelope_at};
use super::{AnimationConfig, AnimationState, GeometryDescriptor, PulseMode};

/// One-shot expiry scheduled by a trigger. It only fires while `generation`
/// still matches the machine's counter; any later trigger supersedes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScheduledExpiry {
    generation: u64,
    deadline_ms: u64,
}

/// Owns the indicator's animation state. Only the render tick mutates it.
#[derive(Debug, Clone)]
pub struct AnimationMachine {
    config: AnimationConfig,
    state: AnimationState,
    generation: u64,
    expiry: Option<ScheduledExpiry>,
}

impl AnimationMachine {
    pub fn new(config: AnimationConfig) -> Self {
        Self {
            config,
            state: AnimationState::Idle,
            generation: 0,
            expiry: None,
        }
    }

    pub fn config(&self) -> &AnimationConfig {
        &self.config
    }

    pub fn state(&self) -> AnimationState {
        self.state
    }

    /// Number of triggers accepted so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_continuous(&self) -> bool {
        self.state.mode() == Some(PulseMode::Continuous)
    }

    /// Start (or restart) a decaying pulse. Ignored while a continuous pulse
    /// is running, since continuous mode has priority.
    pub fn trigger_one_shot(&mut self, now_ms: u64) -> bool {
        if self.is_continuous() {
            return false;
        }
        self.generation += 1;
        self.state = AnimationState::Pulse {
            start_ms: now_ms,
            mode: PulseMode::OneShot,
        };
        self.expiry = Some(ScheduledExpiry {
            generation: self.generation,
            deadline_ms: now_ms.saturating_add(self.config.pulse_duration_ms),
        });
        true
    }

    /// Enter the breathing pulse. Replaces a running one-shot; a second rising
    /// edge while already continuous keeps the original phase.
    pub fn enter_continuous(&mut self, now_ms: u64) -> bool {
        if self.is_continuous() {
            return false;
        }
        self.generation += 1;
        self.state = AnimationState::Pulse {
            start_ms: now_ms,
            mode: PulseMode::Continuous,
        };
        self.expiry = None;
        true
    }

    /// Leave continuous mode. A one-shot or idle state is left untouched.
    pub fn exit_continuous(&mut self) -> bool {
        if !self.is_continuous() {
            return false;
        }
        self.generation += 1;
        self.state = AnimationState::Idle;
        true
    }

    /// Drop any pulse, e.g. when the indicator is deactivated.
    pub fn cancel(&mut self) {
        if self.state != AnimationState::Idle {
            self.generation += 1;
        }
        self.state = AnimationState::Idle;
        self.expiry = None;
    }

    /// Advance to `now_ms`, firing the one-shot expiry if it is still current.
    pub fn advance(&mut self, now_ms: u64) {
        let Some(expiry) = self.expiry else {
            return;
        };
        if now_ms < expiry.deadline_ms {
            return;
        }
        self.expiry = None;
        if expiry.generation == self.generation
            && self.state.mode() == Some(PulseMode::OneShot)
        {
            self.state = AnimationState::Idle;
        }
    }

    pub fn envelope(&self, now_ms: u64, amplitude: f32) -> f32 {
        envelope_at(&self.config, self.state, now_ms, amplitude)
    }

    /// Advance and describe the ring for this tick.
    pub fn tick(&mut self, now_ms: u64, amplitude: f32) -> GeometryDescriptor {
        self.advance(now_ms);
        describe(&self.config, self.state, now_ms, amplitude)
    }
}

impl Default for AnimationMachine {
    fn default() -> Self {
        Self::new(AnimationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32, tol: f32) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn idle_tracks_mic_amplitude() {
        let mut machine = AnimationMachine::default();
        let geometry = machine.tick(10, 0.4);
        assert_eq!(machine.state(), AnimationState::Idle);
        assert!(approx(geometry.envelope, 0.4, 1e-6));
        assert!(approx(geometry.scale, 1.0 - 0.4 * 0.15, 1e-6));
        assert!(!geometry.pulsing);
    }

    #[test]
    fn quiet_idle_ring_stays_at_rest() {
        let mut machine = AnimationMachine::default();
        assert_eq!(machine.tick(0, 0.04).scale, 1.0);
    }

    #[test]
    fn connect_pulse_scale_matches_ramp() {
        let mut machine = AnimationMachine::default();
        machine.tick(1_000, 0.1);
        assert!(machine.trigger_one_shot(1_000));
        let geometry = machine.tick(1_100, 0.1);
        assert_eq!(machine.state().mode(), Some(PulseMode::OneShot));
        assert!(approx(geometry.scale, 1.025, 1e-4), "{}", geometry.scale);
        assert!(geometry.pulsing);
    }

    #[test]
    fn one_shot_expires_after_duration() {
        let mut machine = AnimationMachine::default();
        machine.trigger_one_shot(0);
        machine.tick(799, 0.0);
        assert_eq!(machine.state().mode(), Some(PulseMode::OneShot));
        machine.tick(800, 0.0);
        assert_eq!(machine.state(), AnimationState::Idle);
    }

    #[test]
    fn retrigger_restarts_timer_and_supersedes_old_expiry() {
        let mut machine = AnimationMachine::default();
        machine.trigger_one_shot(0);
        machine.trigger_one_shot(500);
        machine.tick(800, 0.0);
        assert_eq!(
            machine.state(),
            AnimationState::Pulse {
                start_ms: 500,
                mode: PulseMode::OneShot
            }
        );
        machine.tick(1_300, 0.0);
        assert_eq!(machine.state(), AnimationState::Idle);
    }

    #[test]
    fn continuous_overrides_one_shot() {
        let mut machine = AnimationMachine::default();
        machine.trigger_one_shot(0);
        assert!(machine.enter_continuous(100));
        machine.tick(2_000, 0.0);
        assert!(machine.is_continuous());
    }

    #[test]
    fn one_shot_cannot_replace_continuous() {
        let mut machine = AnimationMachine::default();
        machine.enter_continuous(0);
        assert!(!machine.trigger_one_shot(50));
        assert!(machine.is_continuous());
    }

    #[test]
    fn speech_start_then_stop_returns_to_mic_driven_idle() {
        let mut machine = AnimationMachine::default();
        machine.enter_continuous(0);
        let pulsing = machine.tick(100, 0.3);
        assert!(pulsing.pulsing);
        assert!(machine.exit_continuous());
        assert_eq!(machine.state(), AnimationState::Idle);
        let idle = machine.tick(116, 0.3);
        assert!(approx(idle.envelope, 0.3, 1e-6));
        assert!(idle.scale < 1.0);
    }

    #[test]
    fn exit_continuous_leaves_one_shot_alone() {
        let mut machine = AnimationMachine::default();
        machine.trigger_one_shot(0);
        assert!(!machine.exit_continuous());
        assert_eq!(machine.state().mode(), Some(PulseMode::OneShot));
    }

    #[test]
    fn continuous_envelope_ignores_amplitude() {
        let mut machine = AnimationMachine::default();
        machine.enter_continuous(0);
        for now in (0..4_000u64).step_by(13) {
            let geometry = machine.tick(now, 1.0);
            assert!((0.2 - 1e-6..=0.6 + 1e-6).contains(&geometry.envelope));
            assert!(geometry.scale >= 1.0);
        }
    }

    #[test]
    fn repeated_rising_edge_keeps_phase() {
        let mut machine = AnimationMachine::default();
        machine.enter_continuous(10);
        let generation = machine.generation();
        assert!(!machine.enter_continuous(400));
        assert_eq!(machine.generation(), generation);
    }

    #[test]
    fn pulse_intensities_stay_in_unit_range() {
        let mut machine = AnimationMachine::default();
        machine.trigger_one_shot(0);
        for now in (0..=800u64).step_by(20) {
            let geometry = machine.tick(now, 0.0);
            assert!((0.7 - 1e-6..=1.0).contains(&geometry.shadow_intensity));
            assert!((0.9 - 1e-6..=1.0).contains(&geometry.glow_intensity));
        }
    }

    #[test]
    fn cancel_drops_pending_expiry() {
        let mut machine = AnimationMachine::default();
        machine.trigger_one_shot(0);
        machine.cancel();
        assert_eq!(machine.state(), AnimationState::Idle);
        assert!(approx(machine.tick(900, 0.2).envelope, 0.2, 1e-6));
    }
}
