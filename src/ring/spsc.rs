//! Lock-free byte ring for exactly one writer and one reader.
//!
//! `head` and `tail` are monotonic byte counters; `head - tail` is the fill,
//! so every byte of the arena is usable and equal counters always mean empty.

use super::RingError;
use std::ptr::{self, NonNull};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Largest capacity a [`SpscRingBuffer`] accepts (largest power of two <= 65535).
pub const SPSC_MAX_CAPACITY: usize = 1 << 15;

pub struct SpscRingBuffer {
    // Raw base of a leaked `Box<[u8]>` of `capacity` bytes, freed in `Drop`.
    // Transfers copy through this pointer only, never through a slice
    // reference covering the whole arena.
    buf: NonNull<u8>,
    capacity: usize,
    mask: usize,
    head: AtomicUsize,
    tail: AtomicUsize,
}

// The producer only touches `[head, tail + capacity)` and the consumer only
// `[tail, head)`; the two ranges never overlap.
unsafe impl Send for SpscRingBuffer {}
unsafe impl Sync for SpscRingBuffer {}

impl SpscRingBuffer {
    pub fn new(capacity: usize) -> Result<Self, RingError> {
        if !capacity.is_power_of_two() {
            return Err(RingError::InvalidCapacity {
                capacity,
                reason: "must be a power of two",
            });
        }
        if !(2..=SPSC_MAX_CAPACITY).contains(&capacity) {
            return Err(RingError::InvalidCapacity {
                capacity,
                reason: "must be between 2 and 32768 bytes",
            });
        }

        let mut buf = Vec::new();
        buf.try_reserve_exact(capacity)
            .map_err(|source| RingError::HeapAllocation { capacity, source })?;
        buf.resize(capacity, 0);

        let raw = Box::into_raw(buf.into_boxed_slice()) as *mut u8;
        // SAFETY: `Box::into_raw` never returns null.
        let buf = unsafe { NonNull::new_unchecked(raw) };

        Ok(Self {
            buf,
            capacity,
            mask: capacity - 1,
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        })
    }

    /// Hands out the single producer and consumer. The mutable borrow keeps a
    /// second pair from being created while these are alive.
    pub fn split(&mut self) -> (Producer<'_>, Consumer<'_>) {
        let ring: &Self = self;
        (Producer { ring }, Consumer { ring })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn bytes_filled(&self) -> usize {
        let tail = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Acquire);
        head.wrapping_sub(tail).min(self.capacity)
    }

    #[inline]
    pub fn bytes_available(&self) -> usize {
        self.capacity - self.bytes_filled()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head.load(Ordering::Relaxed) == self.tail.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.bytes_filled() == self.capacity
    }
}

impl Drop for SpscRingBuffer {
    fn drop(&mut self) {
        let slice = ptr::slice_from_raw_parts_mut(self.buf.as_ptr(), self.capacity);
        // SAFETY: `buf` came from `Box::into_raw` of a `[u8]` of `capacity`
        // bytes and is freed exactly once.
        unsafe { drop(Box::from_raw(slice)) };
    }
}

pub struct Producer<'a> {
    ring: &'a SpscRingBuffer,
}

pub struct Consumer<'a> {
    ring: &'a SpscRingBuffer,
}

impl Producer<'_> {
    /// Writes as much of `src` as fits and returns the count.
    #[inline]
    pub fn write(&mut self, src: &[u8]) -> usize {
        let head = self.ring.head.load(Ordering::Relaxed);
        let tail = self.ring.tail.load(Ordering::Acquire);
        let available = self.ring.capacity - head.wrapping_sub(tail);
        let len = src.len().min(available);
        if len == 0 {
            return 0;
        }

        let start = head & self.ring.mask;
        let contiguous = self.ring.capacity - start;
        let first_chunk = len.min(contiguous);

        // SAFETY: `start + first_chunk <= capacity` and the tail end of the
        // copy lands in `[0, len - first_chunk)`, all free space the consumer
        // will not touch until `head` is published below.
        unsafe {
            let buf_ptr = self.ring.buf.as_ptr();
            ptr::copy_nonoverlapping(src.as_ptr(), buf_ptr.add(start), first_chunk);
            if len > first_chunk {
                ptr::copy_nonoverlapping(
                    src.as_ptr().add(first_chunk),
                    buf_ptr,
                    len - first_chunk,
                );
            }
        }

        self.ring
            .head
            .store(head.wrapping_add(len), Ordering::Release);
        len
    }

    #[inline]
    pub fn bytes_available(&self) -> usize {
        self.ring.bytes_available()
    }
}

impl Consumer<'_> {
    /// Reads up to `dst.len()` bytes and returns the count.
    #[inline]
    pub fn read(&mut self, dst: &mut [u8]) -> usize {
        let tail = self.ring.tail.load(Ordering::Relaxed);
        let head = self.ring.head.load(Ordering::Acquire);
        let len = dst.len().min(head.wrapping_sub(tail));
        if len == 0 {
            return 0;
        }

        let start = tail & self.ring.mask;
        let contiguous = self.ring.capacity - start;
        let first_chunk = len.min(contiguous);

        // SAFETY: the copied range lies inside `[tail, head)`, which the
        // producer will not write until `tail` is published below.
        unsafe {
            let buf_ptr = self.ring.buf.as_ptr() as *const u8;
            ptr::copy_nonoverlapping(buf_ptr.add(start), dst.as_mut_ptr(), first_chunk);
            if len > first_chunk {
                ptr::copy_nonoverlapping(
                    buf_ptr,
                    dst.as_mut_ptr().add(first_chunk),
                    len - first_chunk,
                );
            }
        }

        self.ring
            .tail
            .store(tail.wrapping_add(len), Ordering::Release);
        len
    }

    #[inline]
    pub fn bytes_filled(&self) -> usize {
        self.ring.bytes_filled()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }
}
