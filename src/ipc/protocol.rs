//! JSON-lines protocol spoken by the `voxring` binary.
//!
//! The host drives the indicator over stdin and receives events on stdout.
//! Messages are newline-delimited JSON.

use crate::router::{SessionEvent, SessionStatus};
use crate::runtime::{RuntimeCommand, RuntimeEvent};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// Host Events (voxring → host)
// ============================================================================

/// Serialized with an `"event"` tag field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event")]
pub enum HostEvent {
    /// Sent once on startup
    #[serde(rename = "ready")]
    Ready {
        version: String,
        size: u32,
        pixel_ratio: f32,
        capture_enabled: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        session_id: Option<String>,
    },

    /// Throttled per-tick ring parameters
    #[serde(rename = "geometry")]
    Geometry {
        state: String,
        scale: f32,
        shadow: f32,
        glow: f32,
        envelope: f32,
    },

    /// The user asked to start the session; the host owns the transport
    #[serde(rename = "session_start_requested")]
    SessionStartRequested,

    /// The user asked to end the session
    #[serde(rename = "session_stop_requested")]
    SessionStopRequested,

    /// A camera frame passed the gate
    #[serde(rename = "captured")]
    Captured {
        file: String,
        timestamp_ms: u64,
        width: u32,
        height: u32,
        bytes: usize,
        difference: f32,
        signature: String,
    },

    /// Result of a snapshot command
    #[serde(rename = "snapshot")]
    Snapshot {
        path: String,
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    /// Reply to a status command
    #[serde(rename = "status")]
    Status {
        connected: bool,
        connecting: bool,
        remote_speaking: bool,
        visible: bool,
        dropped_events: usize,
    },

    /// Recoverable failure
    #[serde(rename = "error")]
    Error { kind: String, message: String },
}

impl HostEvent {
    pub fn from_status(status: SessionStatus, dropped_events: usize) -> Self {
        HostEvent::Status {
            connected: status.connected,
            connecting: status.connecting,
            remote_speaking: status.remote_speaking,
            visible: status.visible,
            dropped_events,
        }
    }
}

impl From<RuntimeEvent> for HostEvent {
    fn from(event: RuntimeEvent) -> Self {
        match event {
            RuntimeEvent::Geometry { state, geometry } => HostEvent::Geometry {
                state: state.to_string(),
                scale: geometry.scale,
                shadow: geometry.shadow_intensity,
                glow: geometry.glow_intensity,
                envelope: geometry.envelope,
            },
            RuntimeEvent::SessionStartRequested => HostEvent::SessionStartRequested,
            RuntimeEvent::SessionStopRequested => HostEvent::SessionStopRequested,
            RuntimeEvent::Captured {
                file_name,
                timestamp_ms,
                width,
                height,
                bytes,
                difference,
                signature,
            } => HostEvent::Captured {
                file: file_name,
                timestamp_ms,
                width,
                height,
                bytes,
                difference,
                signature,
            },
            RuntimeEvent::SnapshotSaved { path } => HostEvent::Snapshot {
                path: path.display().to_string(),
                success: true,
                error: None,
            },
            RuntimeEvent::SnapshotFailed { path, message } => HostEvent::Snapshot {
                path: path.display().to_string(),
                success: false,
                error: Some(message),
            },
            RuntimeEvent::SinkFailed { message } => HostEvent::Error {
                kind: "sink".to_string(),
                message,
            },
            RuntimeEvent::Error(err) => HostEvent::Error {
                kind: err.label().to_string(),
                message: err.to_string(),
            },
        }
    }
}

// ============================================================================
// Host Commands (host → voxring)
// ============================================================================

/// Parsed from JSON with a `"cmd"` tag field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "cmd")]
pub enum HostCommand {
    #[serde(rename = "connecting")]
    Connecting,

    #[serde(rename = "connected")]
    Connected,

    #[serde(rename = "disconnected")]
    Disconnected,

    #[serde(rename = "remote_speech_started")]
    RemoteSpeechStarted,

    #[serde(rename = "remote_speech_stopped")]
    RemoteSpeechStopped,

    /// User activated the indicator
    #[serde(rename = "click")]
    Click,

    #[serde(rename = "resize")]
    Resize { size: u32 },

    #[serde(rename = "pixel_ratio")]
    PixelRatio { ratio: f32 },

    #[serde(rename = "visibility")]
    Visibility { active: bool },

    /// Save the current ring as PNG
    #[serde(rename = "snapshot")]
    Snapshot { path: PathBuf },

    /// Re-emit session flags
    #[serde(rename = "status")]
    Status,

    #[serde(rename = "quit")]
    Quit,
}

/// Where a host command goes.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    Runtime(RuntimeCommand),
    Status,
    Quit,
}

impl HostCommand {
    pub fn dispatch(self) -> Dispatch {
        let session = |event| Dispatch::Runtime(RuntimeCommand::Session(event));
        match self {
            HostCommand::Connecting => session(SessionEvent::Connecting),
            HostCommand::Connected => session(SessionEvent::Connected),
            HostCommand::Disconnected => session(SessionEvent::Disconnected),
            HostCommand::RemoteSpeechStarted => session(SessionEvent::RemoteSpeechStarted),
            HostCommand::RemoteSpeechStopped => session(SessionEvent::RemoteSpeechStopped),
            HostCommand::Click => session(SessionEvent::UserClick),
            HostCommand::Resize { size } => {
                Dispatch::Runtime(RuntimeCommand::Resize { logical_size: size })
            }
            HostCommand::PixelRatio { ratio } => {
                Dispatch::Runtime(RuntimeCommand::PixelRatio { pixel_ratio: ratio })
            }
            HostCommand::Visibility { active } => {
                Dispatch::Runtime(RuntimeCommand::Visibility { active })
            }
            HostCommand::Snapshot { path } => Dispatch::Runtime(RuntimeCommand::Snapshot { path }),
            HostCommand::Status => Dispatch::Status,
            HostCommand::Quit => Dispatch::Quit,
        }
    }
}
