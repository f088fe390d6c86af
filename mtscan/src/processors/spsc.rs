//! Lock-free single-producer/single-consumer bounded queue.
//!
//! Classic ring buffer with two monotonically increasing indices: the
//! producer owns `tail`, the consumer owns `head`, and each side publishes
//! its progress with a Release store that the other side observes with an
//! Acquire load. The pairing makes a popped item's prior writes visible to
//! the consumer. Indices wrap through a power-of-two mask, never in the
//! atomics themselves.
//!
//! Each side also keeps a cached copy of the other side's index and only
//! reloads it when the ring appears full (producer) or empty (consumer),
//! which keeps the hot path free of cross-core cache traffic.

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam_utils::CachePadded;

/// Default slot count for chunk handoff queues.
pub const DEFAULT_CAPACITY: usize = 32_768;

struct Ring<T> {
    buf: Box<[UnsafeCell<MaybeUninit<T>>]>,
    mask: usize,
    /// Consumer's read index; the producer loads it to detect free space.
    head: CachePadded<AtomicUsize>,
    /// Producer's write index; the consumer loads it to detect data.
    tail: CachePadded<AtomicUsize>,
}

impl<T> Ring<T> {
    fn capacity(&self) -> usize {
        self.mask + 1
    }
}

// The SPSC protocol keeps producer and consumer on disjoint slots: a slot is
// written only after `head` proves it free and read only after `tail`
// proves it full. Exclusive use of each handle is enforced by `&mut self`.
unsafe impl<T: Send> Send for Ring<T> {}
unsafe impl<T: Send> Sync for Ring<T> {}

impl<T> Drop for Ring<T> {
    fn drop(&mut self) {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Relaxed);

        let mut index = head;
        while index != tail {
            let slot = index & self.mask;
            // slots in [head, tail) are initialized
            unsafe { self.buf[slot].get_mut().assume_init_drop() };
            index = index.wrapping_add(1);
        }
    }
}

/// Producer handle. `Send` but usable from one thread at a time.
pub struct SpscSender<T> {
    ring: Arc<Ring<T>>,
    /// Snapshot of the consumer's `head`, refreshed on apparent-full only.
    cached_head: usize,
}

/// Consumer handle. `Send` but usable from one thread at a time.
pub struct SpscReceiver<T> {
    ring: Arc<Ring<T>>,
    /// Snapshot of the producer's `tail`, refreshed on apparent-empty only.
    cached_tail: usize,
}

/// Creates a bounded SPSC queue with at least `capacity` slots (rounded up
/// to a power of two, minimum 2).
pub fn channel<T: Send>(capacity: usize) -> (SpscSender<T>, SpscReceiver<T>) {
    let capacity = capacity.max(2).next_power_of_two();
    let buf = (0..capacity)
        .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
        .collect();
    let ring = Arc::new(Ring {
        buf,
        mask: capacity - 1,
        head: CachePadded::new(AtomicUsize::new(0)),
        tail: CachePadded::new(AtomicUsize::new(0)),
    });
    (
        SpscSender {
            ring: Arc::clone(&ring),
            cached_head: 0,
        },
        SpscReceiver {
            ring,
            cached_tail: 0,
        },
    )
}

impl<T: Send> SpscSender<T> {
    /// Attempts to enqueue `value`; hands it back when the queue is full.
    pub fn try_push(&mut self, value: T) -> Result<(), T> {
        let tail = self.ring.tail.load(Ordering::Relaxed);

        if tail.wrapping_sub(self.cached_head) >= self.ring.capacity() {
            self.cached_head = self.ring.head.load(Ordering::Acquire);
            if tail.wrapping_sub(self.cached_head) >= self.ring.capacity() {
                return Err(value);
            }
        }

        let slot = tail & self.ring.mask;
        // the slot is free: it is outside [head, tail) and the consumer will
        // not touch it before the tail store below
        unsafe { (*self.ring.buf[slot].get()).write(value) };

        self.ring.tail.store(tail.wrapping_add(1), Ordering::Release);
        Ok(())
    }
}

impl<T: Send> SpscReceiver<T> {
    /// Attempts to dequeue the oldest item.
    pub fn try_pop(&mut self) -> Option<T> {
        let head = self.ring.head.load(Ordering::Relaxed);

        if head == self.cached_tail {
            self.cached_tail = self.ring.tail.load(Ordering::Acquire);
            if head == self.cached_tail {
                return None;
            }
        }

        let slot = head & self.ring.mask;
        // the slot is initialized: it is inside [head, tail) and the
        // producer will not reuse it before the head store below
        let value = unsafe { (*self.ring.buf[slot].get()).assume_init_read() };

        self.ring.head.store(head.wrapping_add(1), Ordering::Release);
        Some(value)
    }
}
