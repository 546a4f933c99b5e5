//! Destinations for rendered stereo blocks.

use std::sync::Arc;

use parking_lot::Mutex;
use rtrb::{Consumer, Producer, RingBuffer};

/// Receives each rendered stereo block.
///
/// Called on the render thread, so implementations must not block for long.
pub trait AudioSink: Send {
    fn write_block(&mut self, left: &[f32], right: &[f32]);
}

/// Collects interleaved stereo samples in memory (offline renders, tests).
#[derive(Clone, Default)]
pub struct BufferSink {
    samples: Arc<Mutex<Vec<f32>>>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything written so far, interleaved L/R.
    pub fn samples(&self) -> Vec<f32> {
        self.samples.lock().clone()
    }

    pub fn frames(&self) -> usize {
        self.samples.lock().len() / 2
    }

    pub fn clear(&self) {
        self.samples.lock().clear();
    }
}

impl AudioSink for BufferSink {
    fn write_block(&mut self, left: &[f32], right: &[f32]) {
        let mut samples = self.samples.lock();
        for (l, r) in left.iter().zip(right) {
            samples.push(*l);
            samples.push(*r);
        }
    }
}

/// Pushes interleaved stereo samples into a lock-free ring for a device callback.
///
/// Samples that don't fit are dropped and counted.
pub struct RingSink {
    producer: Producer<f32>,
    dropped: u64,
}

impl RingSink {
    /// Create a sink holding up to `capacity_frames` stereo frames, plus the
    /// consumer end for the device side.
    pub fn new(capacity_frames: usize) -> (Self, Consumer<f32>) {
        let (producer, consumer) = RingBuffer::new(capacity_frames.max(1) * 2);
        (
            Self {
                producer,
                dropped: 0,
            },
            consumer,
        )
    }

    /// Free space, in stereo frames.
    pub fn free_frames(&self) -> usize {
        self.producer.slots() / 2
    }

    pub fn dropped_samples(&self) -> u64 {
        self.dropped
    }
}

impl AudioSink for RingSink {
    fn write_block(&mut self, left: &[f32], right: &[f32]) {
        for (l, r) in left.iter().zip(right) {
            if self.producer.slots() < 2 {
                self.dropped += 2;
                continue;
            }
            let _ = self.producer.push(*l);
            let _ = self.producer.push(*r);
        }
    }
}
