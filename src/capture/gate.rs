use super::hash::{difference, FrameSignature};

pub const DEFAULT_MIN_INTERVAL_MS: u64 = 1_000;
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 10.0;
pub const DEFAULT_RESET_AFTER_MS: u64 = 5_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateConfig {
    /// Minimum spacing between accepted frames.
    pub min_interval_ms: u64,
    /// Minimum difference (0-100) a candidate needs against the reference.
    pub threshold: f32,
    /// How long a reference stays valid after it was accepted.
    pub reset_after_ms: u64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: DEFAULT_MIN_INTERVAL_MS,
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
            reset_after_ms: DEFAULT_RESET_AFTER_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateDecision {
    Accept { difference: f32 },
    RejectCooldown { remaining_ms: u64 },
    RejectSimilar { difference: f32 },
}

impl GateDecision {
    pub fn is_accept(&self) -> bool {
        matches!(self, GateDecision::Accept { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            GateDecision::Accept { .. } => "accept",
            GateDecision::RejectCooldown { .. } => "cooldown",
            GateDecision::RejectSimilar { .. } => "similar",
        }
    }
}

/// Decides which frames are novel enough to forward.
///
/// Acceptance is split in two: [`CaptureGate::evaluate`] only reads, and
/// [`CaptureGate::commit`] records the accepted frame. A caller that fails to
/// encode the frame in between simply never commits, leaving the gate as it was.
#[derive(Debug, Clone)]
pub struct CaptureGate {
    config: GateConfig,
    last_signature: Option<FrameSignature>,
    last_accepted_ms: Option<u64>,
    reset_deadline_ms: Option<u64>,
}

impl CaptureGate {
    pub fn new(config: GateConfig) -> Self {
        Self {
            config,
            last_signature: None,
            last_accepted_ms: None,
            reset_deadline_ms: None,
        }
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn reference(&self) -> Option<&FrameSignature> {
        self.last_signature.as_ref()
    }

    pub fn last_accepted_ms(&self) -> Option<u64> {
        self.last_accepted_ms
    }

    pub fn reset_deadline_ms(&self) -> Option<u64> {
        self.reset_deadline_ms
    }

    /// Drop the reference once its deadline passed. Returns true if it was cleared.
    pub fn expire(&mut self, now_ms: u64) -> bool {
        match self.reset_deadline_ms {
            Some(deadline) if now_ms >= deadline => {
                self.last_signature = None;
                self.reset_deadline_ms = None;
                true
            }
            _ => false,
        }
    }

    pub fn evaluate(&self, candidate: &FrameSignature, now_ms: u64) -> GateDecision {
        if let Some(last) = self.last_accepted_ms {
            let elapsed = now_ms.saturating_sub(last);
            if elapsed < self.config.min_interval_ms {
                return GateDecision::RejectCooldown {
                    remaining_ms: self.config.min_interval_ms - elapsed,
                };
            }
        }
        let reference = self.live_reference(now_ms);
        let difference = difference(candidate, reference);
        if reference.is_none() || difference >= self.config.threshold {
            GateDecision::Accept { difference }
        } else {
            GateDecision::RejectSimilar { difference }
        }
    }

    /// Record `candidate` as the new reference and arm the reset deadline.
    pub fn commit(&mut self, candidate: FrameSignature, now_ms: u64) {
        self.last_signature = Some(candidate);
        self.last_accepted_ms = Some(now_ms);
        self.reset_deadline_ms = Some(now_ms.saturating_add(self.config.reset_after_ms));
    }

    /// Expire, evaluate and commit in one step.
    pub fn offer(&mut self, candidate: &FrameSignature, now_ms: u64) -> GateDecision {
        self.expire(now_ms);
        let decision = self.evaluate(candidate, now_ms);
        if decision.is_accept() {
            self.commit(candidate.clone(), now_ms);
        }
        decision
    }

    /// Forget everything; used when capture is disabled.
    pub fn reset(&mut self) {
        self.last_signature = None;
        self.last_accepted_ms = None;
        self.reset_deadline_ms = None;
    }

    fn live_reference(&self, now_ms: u64) -> Option<&FrameSignature> {
        match self.reset_deadline_ms {
            Some(deadline) if now_ms >= deadline => None,
            _ => self.last_signature.as_ref(),
        }
    }
}

impl Default for CaptureGate {
    fn default() -> Self {
        Self::new(GateConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(text: &str) -> FrameSignature {
        FrameSignature::new(text)
    }

    fn gate(threshold: f32) -> CaptureGate {
        CaptureGate::new(GateConfig {
            threshold,
            ..GateConfig::default()
        })
    }

    #[test]
    fn first_candidate_is_accepted() {
        let mut gate = CaptureGate::default();
        let decision = gate.offer(&sig("AAAA"), 0);
        assert_eq!(decision, GateDecision::Accept { difference: 100.0 });
        assert_eq!(gate.reference(), Some(&sig("AAAA")));
        assert_eq!(gate.reset_deadline_ms(), Some(5_000));
    }

    #[test]
    fn never_accepts_twice_within_min_interval() {
        let mut gate = CaptureGate::default();
        assert!(gate.offer(&sig("AAAA"), 100).is_accept());
        assert_eq!(
            gate.offer(&sig("ZZZZ"), 600),
            GateDecision::RejectCooldown { remaining_ms: 500 }
        );
        assert_eq!(
            gate.offer(&sig("ZZZZ"), 1_099),
            GateDecision::RejectCooldown { remaining_ms: 1 }
        );
        assert!(gate.offer(&sig("ZZZZ"), 1_100).is_accept());
    }

    #[test]
    fn similar_candidate_is_rejected() {
        let mut gate = CaptureGate::default();
        gate.offer(&sig("ABCDEFGHIJKL"), 0);
        let decision = gate.offer(&sig("ABCDEFGHIJKL"), 2_000);
        assert_eq!(decision, GateDecision::RejectSimilar { difference: 0.0 });
        assert_eq!(gate.last_accepted_ms(), Some(0));
    }

    #[test]
    fn exact_formula_sequence() {
        let mut gate = gate(20.0);
        assert!(gate.offer(&sig("AAAA"), 0).is_accept());
        // One differing position out of four is 25, which meets a threshold of 20.
        assert_eq!(
            gate.offer(&sig("AAAB"), 1_000),
            GateDecision::Accept { difference: 25.0 }
        );
        assert_eq!(
            gate.offer(&sig("ZZZZ"), 2_000),
            GateDecision::Accept { difference: 100.0 }
        );
    }

    #[test]
    fn small_change_below_threshold_is_rejected() {
        let mut gate = gate(30.0);
        gate.offer(&sig("AAAA"), 0);
        assert_eq!(
            gate.offer(&sig("AAAB"), 1_000),
            GateDecision::RejectSimilar { difference: 25.0 }
        );
        assert!(gate.offer(&sig("ZZZZ"), 2_000).is_accept());
        assert_eq!(gate.reference(), Some(&sig("ZZZZ")));
    }

    #[test]
    fn reference_expires_after_reset_deadline() {
        let mut gate = CaptureGate::default();
        gate.offer(&sig("AAAA"), 0);
        assert!(!gate.offer(&sig("AAAA"), 4_999).is_accept());
        assert!(gate.offer(&sig("AAAA"), 5_000).is_accept());
    }

    #[test]
    fn expire_clears_reference_without_a_candidate() {
        let mut gate = CaptureGate::default();
        gate.offer(&sig("AAAA"), 0);
        assert!(!gate.expire(4_000));
        assert!(gate.reference().is_some());
        assert!(gate.expire(5_000));
        assert!(gate.reference().is_none());
        assert_eq!(gate.last_accepted_ms(), Some(0));
    }

    #[test]
    fn evaluate_without_commit_leaves_gate_unchanged() {
        let mut gate = CaptureGate::default();
        gate.offer(&sig("AAAA"), 0);
        let before = gate.clone();
        assert!(gate.evaluate(&sig("ZZZZ"), 1_500).is_accept());
        assert_eq!(gate.reference(), before.reference());
        assert_eq!(gate.last_accepted_ms(), before.last_accepted_ms());
        assert_eq!(gate.reset_deadline_ms(), before.reset_deadline_ms());
    }

    #[test]
    fn reset_forgets_cooldown_and_reference() {
        let mut gate = CaptureGate::default();
        gate.offer(&sig("AAAA"), 0);
        gate.reset();
        assert!(gate.offer(&sig("AAAA"), 10).is_accept());
    }

    #[test]
    fn empty_signatures_compare_by_overlap() {
        let mut gate = CaptureGate::default();
        gate.offer(&sig(""), 0);
        assert_eq!(
            gate.offer(&sig(""), 1_000),
            GateDecision::RejectSimilar { difference: 0.0 }
        );
        assert_eq!(
            gate.offer(&sig("A"), 2_000),
            GateDecision::Accept { difference: 100.0 }
        );
    }
}
