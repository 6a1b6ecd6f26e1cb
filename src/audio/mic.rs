//! System microphone input via CPAL.
//!
//! The device callback converts whatever sample format the hardware delivers
//! into mono bytes and hands them to the render thread over a bounded channel.
//! The render tick drains that channel into a [`RollingWindow`].

use super::amplitude::AudioWindow;
use super::dispatch::ChunkDispatcher;
use super::source::{AudioSampleSource, AudioSourceFactory};
use super::window::RollingWindow;
use crate::error::{DeviceKind, Result, VoxringError};
use crate::{lock_or_recover, log_debug};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig};
use crossbeam_channel::{bounded, Receiver};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Callback chunks buffered between device and render tick.
const CHUNK_CHANNEL_CAPACITY: usize = 64;

/// List microphone names so the CLI can expose a selector.
pub fn list_input_devices() -> anyhow::Result<Vec<String>> {
    use anyhow::Context;
    let host = cpal::default_host();
    let devices = host.input_devices().context("no input devices available")?;
    let mut names = Vec::new();
    for device in devices {
        if let Ok(name) = device.name() {
            names.push(name);
        }
    }
    Ok(names)
}

fn mic_error(reason: impl Into<String>) -> VoxringError {
    VoxringError::device(DeviceKind::Microphone, reason)
}

fn find_input_device(preferred: Option<&str>) -> Result<cpal::Device> {
    let host = cpal::default_host();
    match preferred {
        Some(name) => {
            let mut devices = host
                .input_devices()
                .map_err(|err| mic_error(format!("cannot enumerate inputs: {err}")))?;
            devices
                .find(|d| d.name().map(|n| n == name).unwrap_or(false))
                .ok_or_else(|| mic_error(format!("input device '{name}' not found")))
        }
        None => host
            .default_input_device()
            .ok_or_else(|| mic_error("no default input device available")),
    }
}

/// Live microphone. Dropping it pauses and releases the device stream.
pub struct MicSource {
    stream: cpal::Stream,
    receiver: Receiver<Vec<u8>>,
    window: RollingWindow,
    dropped: Arc<AtomicUsize>,
    device_name: String,
}

impl MicSource {
    pub fn open(preferred_device: Option<&str>, window_samples: usize) -> Result<Self> {
        let device = find_input_device(preferred_device)?;
        let device_name = device
            .name()
            .unwrap_or_else(|_| "Unknown Device".to_string());
        let default_config = device
            .default_input_config()
            .map_err(|err| mic_error(format!("'{device_name}' has no input config: {err}")))?;
        let format = default_config.sample_format();
        let device_config: StreamConfig = default_config.into();
        let channels = usize::from(device_config.channels.max(1));

        log_debug(&format!(
            "mic config: device={device_name} format={format:?} sample_rate={}Hz channels={channels}",
            device_config.sample_rate.0
        ));

        let (sender, receiver) = bounded::<Vec<u8>>(CHUNK_CHANNEL_CAPACITY);
        let dropped = Arc::new(AtomicUsize::new(0));
        let dispatcher = Arc::new(Mutex::new(ChunkDispatcher::new(sender, dropped.clone())));
        let err_fn = |err| log_debug(&format!("mic_stream_error: {err}"));

        let built = match format {
            SampleFormat::F32 => {
                let dispatcher = dispatcher.clone();
                device.build_input_stream(
                    &device_config,
                    move |data: &[f32], _| {
                        lock_or_recover(&dispatcher, "mic dispatcher").push(data, channels, |s| s);
                    },
                    err_fn,
                    None,
                )
            }
            SampleFormat::I16 => {
                let dispatcher = dispatcher.clone();
                device.build_input_stream(
                    &device_config,
                    move |data: &[i16], _| {
                        lock_or_recover(&dispatcher, "mic dispatcher").push(
                            data,
                            channels,
                            |s| s as f32 / 32_768.0,
                        );
                    },
                    err_fn,
                    None,
                )
            }
            SampleFormat::U16 => {
                let dispatcher = dispatcher.clone();
                device.build_input_stream(
                    &device_config,
                    move |data: &[u16], _| {
                        lock_or_recover(&dispatcher, "mic dispatcher").push(
                            data,
                            channels,
                            |s| (s as f32 - 32_768.0) / 32_768.0,
                        );
                    },
                    err_fn,
                    None,
                )
            }
            other => return Err(mic_error(format!("unsupported sample format: {other:?}"))),
        };
        let stream = built.map_err(|err| mic_error(format!("cannot open '{device_name}': {err}")))?;
        // A stream that fails to start is dropped here, releasing the device.
        stream
            .play()
            .map_err(|err| mic_error(format!("cannot start '{device_name}': {err}")))?;

        Ok(Self {
            stream,
            receiver,
            window: RollingWindow::new(window_samples),
            dropped,
            device_name,
        })
    }

    pub fn dropped_chunks(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl AudioSampleSource for MicSource {
    fn read_window(&mut self) -> AudioWindow {
        for chunk in self.receiver.try_iter() {
            self.window.extend(&chunk);
        }
        self.window.snapshot()
    }

    fn name(&self) -> &str {
        &self.device_name
    }
}

impl Drop for MicSource {
    fn drop(&mut self) {
        if let Err(err) = self.stream.pause() {
            log_debug(&format!("failed to pause mic stream: {err}"));
        }
        log_debug(&format!(
            "mic released: device={} dropped_chunks={}",
            self.device_name,
            self.dropped_chunks()
        ));
    }
}

/// Opens the configured microphone each time the indicator activates.
#[derive(Debug, Clone)]
pub struct MicSourceFactory {
    pub preferred_device: Option<String>,
    pub window_samples: usize,
}

impl AudioSourceFactory for MicSourceFactory {
    fn open(&mut self) -> Result<Box<dyn AudioSampleSource>> {
        let source = MicSource::open(self.preferred_device.as_deref(), self.window_samples)?;
        Ok(Box::new(source))
    }
}
