//! Short connect chime played alongside the one-shot pulse.
//!
//! Playback is fire-and-forget: the tone runs on a detached thread and every
//! failure is logged and swallowed.

use crate::log_debug;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig};
use std::f32::consts::PI;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// A5, the chime pitch.
pub const CUE_FREQUENCY_HZ: f32 = 880.0;
/// Starting gain; ramps linearly to silence over the cue duration.
pub const CUE_START_GAIN: f32 = 0.5;

/// Side effect hook for discrete audio cues.
pub trait CuePlayer: Send {
    fn play_connect_cue(&mut self);
}

/// Cue player that does nothing; used with `--no-sounds` and in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCue;

impl CuePlayer for NoCue {
    fn play_connect_cue(&mut self) {}
}

/// Mono samples for the chime: a sine whose gain falls linearly to zero.
pub fn tone_samples(sample_rate: u32, duration: Duration) -> Vec<f32> {
    let total = (duration.as_secs_f64() * f64::from(sample_rate)).round() as usize;
    if total == 0 {
        return Vec::new();
    }
    let rate = sample_rate as f32;
    (0..total)
        .map(|i| {
            let t = i as f32 / rate;
            let gain = CUE_START_GAIN * (1.0 - i as f32 / total as f32);
            gain * (2.0 * PI * CUE_FREQUENCY_HZ * t).sin()
        })
        .collect()
}

/// Plays the chime on the default output device.
#[derive(Debug, Clone)]
pub struct ToneCue {
    duration: Duration,
}

impl ToneCue {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl CuePlayer for ToneCue {
    fn play_connect_cue(&mut self) {
        let duration = self.duration;
        let spawned = thread::Builder::new()
            .name("voxring-cue".to_string())
            .spawn(move || {
                if let Err(err) = play_blocking(duration) {
                    log_debug(&format!("connect cue skipped: {err:#}"));
                }
            });
        if let Err(err) = spawned {
            log_debug(&format!("connect cue thread failed to start: {err}"));
        }
    }
}

fn play_blocking(duration: Duration) -> anyhow::Result<()> {
    use anyhow::{anyhow, Context};

    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .context("no default output device")?;
    let default_config = device.default_output_config()?;
    let format = default_config.sample_format();
    let config: StreamConfig = default_config.into();
    let channels = usize::from(config.channels.max(1));
    let samples = Arc::new(tone_samples(config.sample_rate.0, duration));
    let cursor = Arc::new(AtomicUsize::new(0));
    let err_fn = |err| log_debug(&format!("cue_stream_error: {err}"));

    let stream = match format {
        SampleFormat::F32 => {
            let samples = samples.clone();
            let cursor = cursor.clone();
            device.build_output_stream(
                &config,
                move |data: &mut [f32], _| fill_interleaved(data, channels, &samples, &cursor, |s| s),
                err_fn,
                None,
            )?
        }
        SampleFormat::I16 => {
            let samples = samples.clone();
            let cursor = cursor.clone();
            device.build_output_stream(
                &config,
                move |data: &mut [i16], _| {
                    fill_interleaved(data, channels, &samples, &cursor, |s| {
                        (s * i16::MAX as f32) as i16
                    })
                },
                err_fn,
                None,
            )?
        }
        SampleFormat::U16 => {
            let samples = samples.clone();
            let cursor = cursor.clone();
            device.build_output_stream(
                &config,
                move |data: &mut [u16], _| {
                    fill_interleaved(data, channels, &samples, &cursor, |s| {
                        ((s + 1.0) * 32_767.5) as u16
                    })
                },
                err_fn,
                None,
            )?
        }
        other => return Err(anyhow!("unsupported output format: {other:?}")),
    };
    stream.play()?;
    thread::sleep(duration + Duration::from_millis(50));
    drop(stream);
    Ok(())
}

fn fill_interleaved<T, F>(
    data: &mut [T],
    channels: usize,
    samples: &[f32],
    cursor: &AtomicUsize,
    convert: F,
) where
    T: Copy,
    F: Fn(f32) -> T,
{
    let mut index = cursor.load(Ordering::Relaxed);
    for frame in data.chunks_mut(channels) {
        let value = samples.get(index).copied().unwrap_or(0.0);
        index += 1;
        for slot in frame.iter_mut() {
            *slot = convert(value);
        }
    }
    cursor.store(index, Ordering::Relaxed);
}
