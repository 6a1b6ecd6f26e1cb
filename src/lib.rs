pub mod animation;
pub mod audio;
pub mod capture;
pub mod config;
pub mod error;
pub mod ipc;
mod lock;
pub mod render;
pub mod router;
pub mod runtime;
mod telemetry;

mod app;

pub(crate) use lock::lock_or_recover;
pub use app::*;
pub use animation::{AnimationConfig, AnimationMachine, AnimationState, GeometryDescriptor};
pub use capture::{CaptureConfig, CaptureGate, FrameSignature, GateDecision, PerceptualHasher};
pub use error::{DeviceKind, VoxringError};
pub use render::{render_ring, RingLayout};
pub use router::{EventRouter, SessionControl, SessionEvent, SessionStatus};
pub use runtime::{Runtime, RuntimeCommand, RuntimeEvent, RuntimeOptions, RuntimeParts};
