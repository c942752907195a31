//! Single-producer single-consumer sample FIFO between the audio thread and
//! the oscilloscope.
//!
//! Wraps a [`ringbuf`] heap ring. Writes that do not fit are truncated, so the
//! producer never overwrites unread samples and never waits for the reader.

use ringbuf::{HeapConsumer, HeapProducer, HeapRb};

/// Telemetry buffer size in samples.
pub const SCOPE_CAPACITY: usize = 512;

/// Audio-thread half. Never blocks, never allocates.
pub struct ScopeProducer {
    inner: HeapProducer<f32>,
}

/// Scope-thread half.
pub struct ScopeConsumer {
    inner: HeapConsumer<f32>,
}

/// Creates a ring of [`SCOPE_CAPACITY`] samples.
pub fn scope_buffer() -> (ScopeProducer, ScopeConsumer) {
    ring_buffer(SCOPE_CAPACITY)
}

/// Creates a ring holding `capacity` samples.
pub fn ring_buffer(capacity: usize) -> (ScopeProducer, ScopeConsumer) {
    let rb = HeapRb::<f32>::new(capacity.max(1));
    let (producer, consumer) = rb.split();
    (
        ScopeProducer { inner: producer },
        ScopeConsumer { inner: consumer },
    )
}

impl ScopeProducer {
    /// Append as many of `samples` as fit and return how many were written.
    ///
    /// Unread samples are never overwritten; whatever does not fit is dropped.
    #[inline]
    pub fn push(&mut self, samples: &[f32]) -> usize {
        self.inner.push_slice(samples)
    }

    pub fn ready_count(&self) -> usize {
        self.inner.len()
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }
}

impl ScopeConsumer {
    /// Samples currently readable, in `0..=capacity`.
    pub fn ready_count(&self) -> usize {
        self.inner.len()
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    /// Move up to `out.len()` ready samples into `out`, oldest first.
    pub fn pop_into(&mut self, out: &mut [f32]) -> usize {
        self.inner.pop_slice(out)
    }
}
