use super::amplitude::sample_to_byte;
use crossbeam_channel::{Sender, TrySendError};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

/// Downmix interleaved input to mono bytes so the sampler sees one channel
/// regardless of the microphone layout.
pub(super) fn append_downmixed_bytes<T, F>(
    buf: &mut Vec<u8>,
    data: &[T],
    channels: usize,
    mut convert: F,
) where
    T: Copy,
    F: FnMut(T) -> f32,
{
    if channels <= 1 {
        buf.extend(data.iter().copied().map(|s| sample_to_byte(convert(s))));
        return;
    }

    let mut acc = 0.0f32;
    let mut count = 0usize;
    for sample in data.iter().copied() {
        acc += convert(sample);
        count += 1;
        if count == channels {
            buf.push(sample_to_byte(acc / channels as f32));
            acc = 0.0;
            count = 0;
        }
    }
    if count > 0 {
        buf.push(sample_to_byte(acc / count as f32));
    }
}

/// Forwards device callback data to the render side without blocking the
/// audio thread. Chunks that do not fit in the channel are counted and dropped.
pub(super) struct ChunkDispatcher {
    scratch: Vec<u8>,
    sender: Sender<Vec<u8>>,
    dropped: Arc<AtomicUsize>,
}

impl ChunkDispatcher {
    pub(super) fn new(sender: Sender<Vec<u8>>, dropped: Arc<AtomicUsize>) -> Self {
        Self {
            scratch: Vec::new(),
            sender,
            dropped,
        }
    }

    pub(super) fn push<T, F>(&mut self, data: &[T], channels: usize, convert: F)
    where
        T: Copy,
        F: FnMut(T) -> f32,
    {
        self.scratch.clear();
        append_downmixed_bytes(&mut self.scratch, data, channels, convert);
        if self.scratch.is_empty() {
            return;
        }
        let chunk = std::mem::take(&mut self.scratch);
        match self.sender.try_send(chunk) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
            Err(TrySendError::Disconnected(_)) => {}
        }
    }
}
