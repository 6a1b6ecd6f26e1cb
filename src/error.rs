//! Typed failures surfaced by the feedback core.
//!
//! None of these are fatal: the render loop falls back to an idle ring and the
//! capture loop skips the tick. Callers see them as values, never as panics.

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, VoxringError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VoxringError {
    /// Microphone or camera could not be opened (permission or hardware).
    #[error("{device} unavailable: {reason}")]
    DeviceUnavailable { device: DeviceKind, reason: String },

    /// A full-resolution frame could not be turned into a transmittable image.
    #[error("frame encoding failed: {0}")]
    EncodingFailure(String),

    /// The perceptual signature could not be computed for a candidate frame.
    #[error("frame hash failed: {0}")]
    HashComputationFailure(String),

    /// The external start/stop collaborator reported a failure.
    #[error("session control failed: {0}")]
    Session(String),
}

impl VoxringError {
    pub fn device(device: DeviceKind, reason: impl Into<String>) -> Self {
        Self::DeviceUnavailable {
            device,
            reason: reason.into(),
        }
    }

    /// Short machine label for host events and log lines.
    pub fn label(&self) -> &'static str {
        match self {
            VoxringError::DeviceUnavailable { .. } => "device_unavailable",
            VoxringError::EncodingFailure(_) => "encoding_failure",
            VoxringError::HashComputationFailure(_) => "hash_failure",
            VoxringError::Session(_) => "session",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Microphone,
    Camera,
    Speaker,
}

impl std::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DeviceKind::Microphone => "microphone",
            DeviceKind::Camera => "camera",
            DeviceKind::Speaker => "speaker",
        };
        f.write_str(name)
    }
}
