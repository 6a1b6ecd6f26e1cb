//! Microphone side of the indicator: device input, amplitude reduction, and
//! the connect chime.
//!
//! Audio arrives from CPAL as whatever format the hardware prefers, is downmixed
//! to mono bytes centered at 128, and is reduced once per render tick to a
//! loudness scalar in [0, 1].

mod amplitude;
mod cue;
mod dispatch;
mod mic;
mod source;
mod window;

pub use amplitude::{
    sample_to_byte, AmplitudeSampler, AudioWindow, DEFAULT_AMPLITUDE_NORM, SAMPLE_MIDPOINT,
};
pub use cue::{tone_samples, CuePlayer, NoCue, ToneCue, CUE_FREQUENCY_HZ, CUE_START_GAIN};
pub use mic::{list_input_devices, MicSource, MicSourceFactory};
pub use source::{AudioSampleSource, AudioSourceFactory, SilentSource, SilentSourceFactory};
pub use window::RollingWindow;

/// Samples per analysis buffer.
pub const DEFAULT_WINDOW_SAMPLES: usize = 1024;
