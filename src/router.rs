//! Maps session events onto animation triggers and session side effects.

use crate::animation::AnimationMachine;
use crate::audio::CuePlayer;
use crate::error::Result;
use crate::log_debug;
use std::sync::atomic::{AtomicBool, Ordering};

/// Discrete events reported by the session collaborator or the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Connecting,
    Connected,
    Disconnected,
    RemoteSpeechStarted,
    RemoteSpeechStopped,
    UserClick,
}

impl SessionEvent {
    pub fn label(&self) -> &'static str {
        match self {
            SessionEvent::Connecting => "connecting",
            SessionEvent::Connected => "connected",
            SessionEvent::Disconnected => "disconnected",
            SessionEvent::RemoteSpeechStarted => "remote_speech_started",
            SessionEvent::RemoteSpeechStopped => "remote_speech_stopped",
            SessionEvent::UserClick => "user_click",
        }
    }
}

/// Start/stop hooks of the external session owner.
pub trait SessionControl: Send {
    fn start_session(&mut self) -> Result<()>;
    fn stop_session(&mut self) -> Result<()>;
}

/// Point-in-time copy of [`StatusCell`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStatus {
    pub connected: bool,
    pub connecting: bool,
    pub remote_speaking: bool,
    pub visible: bool,
}

/// Session flags shared between the render and capture loops.
///
/// Only the render thread writes; readers take a relaxed snapshot, which is
/// enough since each flag is independent.
#[derive(Debug, Default)]
pub struct StatusCell {
    connected: AtomicBool,
    connecting: AtomicBool,
    remote_speaking: AtomicBool,
    visible: AtomicBool,
}

impl StatusCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> SessionStatus {
        SessionStatus {
            connected: self.connected.load(Ordering::Relaxed),
            connecting: self.connecting.load(Ordering::Relaxed),
            remote_speaking: self.remote_speaking.load(Ordering::Relaxed),
            visible: self.visible.load(Ordering::Relaxed),
        }
    }

    pub fn set_connected(&self, value: bool) {
        self.connected.store(value, Ordering::Relaxed);
    }

    pub fn set_connecting(&self, value: bool) {
        self.connecting.store(value, Ordering::Relaxed);
    }

    pub fn set_remote_speaking(&self, value: bool) {
        self.remote_speaking.store(value, Ordering::Relaxed);
    }

    pub fn set_visible(&self, value: bool) {
        self.visible.store(value, Ordering::Relaxed);
    }
}

/// What the router did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAction {
    Pulsed,
    ContinuousStarted,
    ContinuousStopped,
    SessionStartRequested,
    SessionStopRequested,
    StatusUpdated,
    Ignored,
}

pub struct EventRouter<'a> {
    status: &'a StatusCell,
    control: &'a mut dyn SessionControl,
    cue: &'a mut dyn CuePlayer,
}

impl<'a> EventRouter<'a> {
    pub fn new(
        status: &'a StatusCell,
        control: &'a mut dyn SessionControl,
        cue: &'a mut dyn CuePlayer,
    ) -> Self {
        Self {
            status,
            control,
            cue,
        }
    }

    pub fn route(
        &mut self,
        event: SessionEvent,
        now_ms: u64,
        machine: &mut AnimationMachine,
    ) -> Result<RouteAction> {
        let status = self.status.snapshot();
        let action = match event {
            SessionEvent::Connecting => {
                self.status.set_connecting(true);
                RouteAction::StatusUpdated
            }
            SessionEvent::Connected => {
                self.status.set_connecting(false);
                self.status.set_connected(true);
                self.cue.play_connect_cue();
                if machine.trigger_one_shot(now_ms) {
                    RouteAction::Pulsed
                } else {
                    RouteAction::StatusUpdated
                }
            }
            SessionEvent::Disconnected => {
                self.status.set_connecting(false);
                self.status.set_connected(false);
                self.status.set_remote_speaking(false);
                if machine.exit_continuous() {
                    RouteAction::ContinuousStopped
                } else {
                    RouteAction::StatusUpdated
                }
            }
            SessionEvent::RemoteSpeechStarted => {
                self.status.set_remote_speaking(true);
                if machine.enter_continuous(now_ms) {
                    RouteAction::ContinuousStarted
                } else {
                    RouteAction::Ignored
                }
            }
            SessionEvent::RemoteSpeechStopped => {
                self.status.set_remote_speaking(false);
                if machine.exit_continuous() {
                    RouteAction::ContinuousStopped
                } else {
                    RouteAction::Ignored
                }
            }
            SessionEvent::UserClick => self.route_click(status, now_ms, machine)?,
        };
        log_debug(&format!(
            "router: {} -> {action:?} (generation {})",
            event.label(),
            machine.generation()
        ));
        Ok(action)
    }

    fn route_click(
        &mut self,
        status: SessionStatus,
        now_ms: u64,
        machine: &mut AnimationMachine,
    ) -> Result<RouteAction> {
        if status.connecting {
            return Ok(RouteAction::Ignored);
        }
        if status.connected {
            self.control.stop_session()?;
            return Ok(RouteAction::SessionStopRequested);
        }
        self.control.start_session()?;
        machine.trigger_one_shot(now_ms);
        Ok(RouteAction::SessionStartRequested)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{AnimationState, PulseMode};
    use crate::error::VoxringError;

    #[derive(Default)]
    struct FakeControl {
        starts: usize,
        stops: usize,
        fail: bool,
    }

    impl SessionControl for FakeControl {
        fn start_session(&mut self) -> Result<()> {
            if self.fail {
                return Err(VoxringError::Session("offline".into()));
            }
            self.starts += 1;
            Ok(())
        }

        fn stop_session(&mut self) -> Result<()> {
            if self.fail {
                return Err(VoxringError::Session("offline".into()));
            }
            self.stops += 1;
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingCue(usize);

    impl CuePlayer for CountingCue {
        fn play_connect_cue(&mut self) {
            self.0 += 1;
        }
    }

    struct Harness {
        status: StatusCell,
        control: FakeControl,
        cue: CountingCue,
        machine: AnimationMachine,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                status: StatusCell::new(),
                control: FakeControl::default(),
                cue: CountingCue::default(),
                machine: AnimationMachine::default(),
            }
        }

        fn send(&mut self, event: SessionEvent, now_ms: u64) -> Result<RouteAction> {
            EventRouter::new(&self.status, &mut self.control, &mut self.cue).route(
                event,
                now_ms,
                &mut self.machine,
            )
        }
    }

    #[test]
    fn connect_pulses_and_plays_cue() {
        let mut h = Harness::new();
        assert_eq!(h.send(SessionEvent::Connected, 100), Ok(RouteAction::Pulsed));
        assert_eq!(h.cue.0, 1);
        assert_eq!(h.machine.state().mode(), Some(PulseMode::OneShot));
        assert!(h.status.snapshot().connected);
    }

    #[test]
    fn click_while_idle_starts_session_and_pulses() {
        let mut h = Harness::new();
        assert_eq!(
            h.send(SessionEvent::UserClick, 0),
            Ok(RouteAction::SessionStartRequested)
        );
        assert_eq!(h.control.starts, 1);
        assert_eq!(h.machine.state().mode(), Some(PulseMode::OneShot));
    }

    #[test]
    fn click_while_connected_stops_without_pulse() {
        let mut h = Harness::new();
        h.send(SessionEvent::Connected, 0).expect("route");
        h.machine.cancel();
        assert_eq!(
            h.send(SessionEvent::UserClick, 2_000),
            Ok(RouteAction::SessionStopRequested)
        );
        assert_eq!(h.control.stops, 1);
        assert_eq!(h.machine.state(), AnimationState::Idle);
    }

    #[test]
    fn click_while_connecting_is_ignored() {
        let mut h = Harness::new();
        h.send(SessionEvent::Connecting, 0).expect("route");
        assert_eq!(h.send(SessionEvent::UserClick, 10), Ok(RouteAction::Ignored));
        assert_eq!(h.control.starts + h.control.stops, 0);
        assert_eq!(h.machine.state(), AnimationState::Idle);
    }

    #[test]
    fn start_failure_is_returned_without_pulse() {
        let mut h = Harness::new();
        h.control.fail = true;
        let err = h.send(SessionEvent::UserClick, 0).unwrap_err();
        assert_eq!(err.label(), "session");
        assert_eq!(h.machine.state(), AnimationState::Idle);
    }

    #[test]
    fn remote_speech_toggles_continuous() {
        let mut h = Harness::new();
        assert_eq!(
            h.send(SessionEvent::RemoteSpeechStarted, 0),
            Ok(RouteAction::ContinuousStarted)
        );
        assert!(h.status.snapshot().remote_speaking);
        assert_eq!(
            h.send(SessionEvent::RemoteSpeechStarted, 50),
            Ok(RouteAction::Ignored)
        );
        assert_eq!(
            h.send(SessionEvent::RemoteSpeechStopped, 100),
            Ok(RouteAction::ContinuousStopped)
        );
        assert_eq!(h.machine.state(), AnimationState::Idle);
    }

    #[test]
    fn speech_stop_without_continuous_keeps_one_shot() {
        let mut h = Harness::new();
        h.send(SessionEvent::Connected, 0).expect("route");
        assert_eq!(
            h.send(SessionEvent::RemoteSpeechStopped, 10),
            Ok(RouteAction::Ignored)
        );
        assert_eq!(h.machine.state().mode(), Some(PulseMode::OneShot));
    }

    #[test]
    fn connect_during_remote_speech_keeps_continuous() {
        let mut h = Harness::new();
        h.send(SessionEvent::RemoteSpeechStarted, 0).expect("route");
        assert_eq!(
            h.send(SessionEvent::Connected, 10),
            Ok(RouteAction::StatusUpdated)
        );
        assert!(h.machine.is_continuous());
        assert_eq!(h.cue.0, 1);
    }

    #[test]
    fn disconnect_clears_status_and_continuous() {
        let mut h = Harness::new();
        h.send(SessionEvent::Connected, 0).expect("route");
        h.send(SessionEvent::RemoteSpeechStarted, 10).expect("route");
        assert_eq!(
            h.send(SessionEvent::Disconnected, 20),
            Ok(RouteAction::ContinuousStopped)
        );
        let status = h.status.snapshot();
        assert!(!status.connected && !status.connecting && !status.remote_speaking);
    }
}
