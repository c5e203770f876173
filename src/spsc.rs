//! Bounded single-producer single-consumer ring
//!
//! One ring sits between the session network thread and each symbol
//! worker. The producer never blocks: a full ring rejects the push and
//! the caller drops the message.

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_utils::CachePadded;

/// Fixed-capacity wait-free SPSC queue.
///
/// Exactly one thread may push and exactly one thread may pop; both may
/// do so concurrently. The indices live on separate cache lines so the
/// producer and consumer do not false-share.
pub struct SpscRing<T> {
    read_idx: CachePadded<AtomicUsize>,
    write_idx: CachePadded<AtomicUsize>,
    // One slot stays unused to tell a full ring from an empty one.
    slots: Box<[UnsafeCell<MaybeUninit<T>>]>,
}

unsafe impl<T: Send> Send for SpscRing<T> {}
unsafe impl<T: Send> Sync for SpscRing<T> {}

impl<T> SpscRing<T> {
    /// Create a ring that holds up to `capacity` elements.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring capacity must be non-zero");
        let slots = (0..capacity + 1)
            .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
            .collect();
        Self {
            read_idx: CachePadded::new(AtomicUsize::new(0)),
            write_idx: CachePadded::new(AtomicUsize::new(0)),
            slots,
        }
    }

    #[inline]
    fn advance(&self, idx: usize) -> usize {
        let next = idx + 1;
        if next == self.slots.len() {
            0
        } else {
            next
        }
    }

    /// Enqueue `value`, handing it back if the ring is full.
    ///
    /// Producer side only.
    #[inline]
    pub fn push(&self, value: T) -> Result<(), T> {
        let write = self.write_idx.load(Ordering::Relaxed);
        let next = self.advance(write);
        if next == self.read_idx.load(Ordering::Acquire) {
            return Err(value);
        }
        unsafe { (*self.slots[write].get()).write(value) };
        self.write_idx.store(next, Ordering::Release);
        Ok(())
    }

    /// Dequeue the oldest element, `None` when the ring is empty.
    ///
    /// Consumer side only.
    #[inline]
    pub fn pop(&self) -> Option<T> {
        let read = self.read_idx.load(Ordering::Relaxed);
        if read == self.write_idx.load(Ordering::Acquire) {
            return None;
        }
        let value = unsafe { (*self.slots[read].get()).assume_init_read() };
        self.read_idx.store(self.advance(read), Ordering::Release);
        Some(value)
    }

    /// Structural emptiness check; may be stale under concurrent use but
    /// never spuriously wrong for the single producer/consumer pair.
    pub fn is_empty(&self) -> bool {
        self.read_idx.load(Ordering::Acquire) == self.write_idx.load(Ordering::Acquire)
    }

    /// Maximum number of elements the ring can hold.
    pub fn capacity(&self) -> usize {
        self.slots.len() - 1
    }
}

impl<T> Drop for SpscRing<T> {
    fn drop(&mut self) {
        while self.pop().is_some() {}
    }
}
