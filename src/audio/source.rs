use super::amplitude::AudioWindow;
use crate::error::Result;

/// Yields the latest analysis buffer on demand.
///
/// Implementations own their device handle; dropping the source releases it.
pub trait AudioSampleSource {
    fn read_window(&mut self) -> AudioWindow;

    fn name(&self) -> &str;
}

/// Opens an [`AudioSampleSource`] on the thread that will use it.
///
/// Device streams are not always `Send`, so the render loop receives a factory
/// and acquires the device itself when the indicator becomes active.
pub trait AudioSourceFactory: Send {
    fn open(&mut self) -> Result<Box<dyn AudioSampleSource>>;
}

/// Source used when no microphone is configured or available.
#[derive(Debug, Clone)]
pub struct SilentSource {
    len: usize,
}

impl SilentSource {
    pub fn new(len: usize) -> Self {
        Self { len }
    }
}

impl AudioSampleSource for SilentSource {
    fn read_window(&mut self) -> AudioWindow {
        AudioWindow::silent(self.len)
    }

    fn name(&self) -> &str {
        "silent"
    }
}

/// Factory that always hands out a [`SilentSource`].
#[derive(Debug, Clone)]
pub struct SilentSourceFactory {
    pub window_samples: usize,
}

impl AudioSourceFactory for SilentSourceFactory {
    fn open(&mut self) -> Result<Box<dyn AudioSampleSource>> {
        Ok(Box::new(SilentSource::new(self.window_samples)))
    }
}
