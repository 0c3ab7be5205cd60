//! Lock-Free Ring Buffer for Landmark Frames
//!
//! Connects the landmark engine (producer) to the capture loop (consumer) as
//! a bounded SPSC queue built on the `rtrb` crate.
//!
//! Architecture:
//! - Producer (engine callback): never blocks, pushes at the camera rate
//! - Consumer (capture loop): drains batches and feeds the recorder/monitor
//!
//! When the buffer is full the incoming frame is dropped and counted; the
//! consumer is expected to drain faster than the nominal 30 Hz frame rate, so
//! drops indicate a stalled loop rather than normal operation.

use crate::landmark::types::StreamFrame;
use rtrb::{Consumer, Producer, RingBuffer};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Default ring buffer capacity (must be a power of 2).
/// Roughly eight seconds of frames at the nominal 30 fps rate.
pub const DEFAULT_CAPACITY: usize = 256;

/// One buffered frame with its capture sequence number.
#[derive(Debug, Clone)]
pub struct FrameSlot {
    pub frame: StreamFrame,
    /// Ordering verification across the producer/consumer boundary
    pub sequence: u64,
}

/// Ring buffer statistics for monitoring
#[derive(Debug, Default)]
pub struct FrameBufferStats {
    /// Total frames pushed
    pub frames_pushed: AtomicU64,
    /// Frames dropped due to a full buffer
    pub frames_dropped: AtomicU64,
    /// Frames successfully consumed
    pub frames_consumed: AtomicU64,
    /// Peak buffer occupancy
    pub peak_occupancy: AtomicU64,
}

/// Lock-free SPSC ring buffer for landmark frames.
pub struct FrameRingBuffer {
    producer: Option<Producer<FrameSlot>>,
    consumer: Option<Consumer<FrameSlot>>,
    sequence: AtomicU64,
    stats: Arc<FrameBufferStats>,
    capacity: usize,
}

impl FrameRingBuffer {
    /// Create a ring buffer with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a ring buffer with the given capacity.
    ///
    /// # Panics
    /// Panics if `capacity` is not a power of 2.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(
            capacity.is_power_of_two(),
            "Ring buffer capacity must be a power of 2"
        );

        let (producer, consumer) = RingBuffer::new(capacity);

        Self {
            producer: Some(producer),
            consumer: Some(consumer),
            sequence: AtomicU64::new(0),
            stats: Arc::new(FrameBufferStats::default()),
            capacity,
        }
    }

    /// Split into producer and consumer halves.
    ///
    /// Called once to hand the producer to the engine callback and the
    /// consumer to the capture loop.
    pub fn split(mut self) -> (FrameProducer, FrameConsumer) {
        let producer = self.producer.take().expect("Producer already taken");
        let consumer = self.consumer.take().expect("Consumer already taken");

        (
            FrameProducer {
                inner: producer,
                sequence: Arc::new(self.sequence),
                stats: Arc::clone(&self.stats),
                capacity: self.capacity,
            },
            FrameConsumer {
                inner: consumer,
                stats: Arc::clone(&self.stats),
            },
        )
    }

    /// Get statistics
    pub fn stats(&self) -> Arc<FrameBufferStats> {
        Arc::clone(&self.stats)
    }
}

impl Default for FrameRingBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Producer half (engine callback side)
pub struct FrameProducer {
    inner: Producer<FrameSlot>,
    sequence: Arc<AtomicU64>,
    stats: Arc<FrameBufferStats>,
    capacity: usize,
}

impl FrameProducer {
    /// Push a frame into the ring buffer.
    ///
    /// Lock-free and never blocks. If the buffer is full the frame is
    /// dropped, the drop counter is incremented, and the sequence number is
    /// rolled back so consumed sequences stay gapless.
    ///
    /// Returns true if the frame was pushed, false if dropped.
    #[inline]
    pub fn push(&mut self, frame: StreamFrame) -> bool {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let slot = FrameSlot { frame, sequence };

        match self.inner.push(slot) {
            Ok(()) => {
                self.stats.frames_pushed.fetch_add(1, Ordering::Relaxed);

                // Update peak occupancy
                let free = self.inner.slots();
                let occupied = (self.capacity - free) as u64;
                let mut peak = self.stats.peak_occupancy.load(Ordering::Relaxed);
                while occupied > peak {
                    match self.stats.peak_occupancy.compare_exchange_weak(
                        peak,
                        occupied,
                        Ordering::Relaxed,
                        Ordering::Relaxed,
                    ) {
                        Ok(_) => break,
                        Err(p) => peak = p,
                    }
                }

                true
            }
            Err(_) => {
                self.stats.frames_dropped.fetch_add(1, Ordering::Relaxed);
                self.sequence.fetch_sub(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Free slots remaining in the buffer.
    #[inline]
    pub fn available_slots(&self) -> usize {
        self.inner.slots()
    }

    /// Whether the buffer is currently full.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.inner.slots() == 0
    }
}

/// Consumer half (capture loop side)
pub struct FrameConsumer {
    inner: Consumer<FrameSlot>,
    stats: Arc<FrameBufferStats>,
}

impl FrameConsumer {
    /// Pop a single frame, if one is available.
    #[inline]
    pub fn pop(&mut self) -> Option<FrameSlot> {
        match self.inner.pop() {
            Ok(slot) => {
                self.stats.frames_consumed.fetch_add(1, Ordering::Relaxed);
                Some(slot)
            }
            Err(_) => None,
        }
    }

    /// Pop up to `max` frames in one drain pass.
    pub fn pop_batch(&mut self, max: usize) -> Vec<FrameSlot> {
        let mut batch = Vec::with_capacity(max.min(self.inner.slots()));
        while batch.len() < max {
            match self.pop() {
                Some(slot) => batch.push(slot),
                None => break,
            }
        }
        batch
    }

    /// Frames currently waiting in the buffer.
    #[inline]
    pub fn pending(&self) -> usize {
        self.inner.slots()
    }
}
