use super::amplitude::{AudioWindow, SAMPLE_MIDPOINT};
use std::collections::VecDeque;

/// Keeps the most recent `capacity` byte samples delivered by the device so
/// every tick can read a full analysis buffer, even between callbacks.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    samples: VecDeque<u8>,
    capacity: usize,
}

impl RollingWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::from(vec![SAMPLE_MIDPOINT; capacity]),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn extend(&mut self, chunk: &[u8]) {
        // Only the tail of an oversized chunk can survive.
        let start = chunk.len().saturating_sub(self.capacity);
        for &sample in &chunk[start..] {
            if self.samples.len() == self.capacity {
                self.samples.pop_front();
            }
            self.samples.push_back(sample);
        }
    }

    pub fn snapshot(&self) -> AudioWindow {
        AudioWindow::new(self.samples.iter().copied().collect())
    }
}
