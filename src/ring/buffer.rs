use super::cursor::Cursors;
use super::transfer;
use super::RingError;
use crate::storage::{Arena, ArenaKind};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Largest capacity a [`RingBuffer`] accepts.
pub const MAX_CAPACITY: usize = u16::MAX as usize;

/// Fixed-capacity byte ring shared between any number of writers and readers.
///
/// `write`, `read`, `reset` and `init` serialize on one mutex that is held
/// for the whole copy. The size queries (`bytes_filled`, `bytes_available`,
/// `is_empty`, `is_full`) do not take the lock: they read the fill count
/// published by the last completed mutation and are only hints while other
/// threads are transferring.
///
/// Requests larger than the free space (or the filled bytes) are truncated;
/// the returned count is the only signal.
///
/// ```
/// use bytering::RingBuffer;
///
/// let ring = RingBuffer::new(8).unwrap();
/// assert_eq!(ring.write(b"ABCDEF"), 6);
///
/// let mut out = [0u8; 4];
/// assert_eq!(ring.read(&mut out), 4);
/// assert_eq!(&out, b"ABCD");
///
/// assert_eq!(ring.write(b"GHIJK"), 5);
/// let mut out = [0u8; 7];
/// assert_eq!(ring.read(&mut out), 7);
/// assert_eq!(&out, b"EFGHIJK");
/// ```
#[derive(Debug)]
pub struct RingBuffer {
    capacity: usize,
    kind: ArenaKind,
    filled: AtomicUsize,
    state: Mutex<RingState>,
}

#[derive(Debug)]
struct RingState {
    arena: Option<Arena>,
    cursors: Cursors,
}

/// Point-in-time copy of the counters, taken under the lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingSnapshot {
    pub capacity: usize,
    pub filled: usize,
    pub read_cursor: usize,
    pub write_cursor: usize,
    pub arena: Option<ArenaKind>,
}

impl RingSnapshot {
    #[inline]
    pub fn usable(&self) -> bool {
        self.arena.is_some()
    }
}

impl RingBuffer {
    /// Creates a heap-backed buffer of `capacity` zeroed bytes.
    pub fn new(capacity: usize) -> Result<Self, RingError> {
        Self::with_arena(capacity, ArenaKind::Heap)
    }

    pub fn with_arena(capacity: usize, kind: ArenaKind) -> Result<Self, RingError> {
        let ring = Self::unallocated_with(capacity, kind)?;
        ring.init()?;
        Ok(ring)
    }

    /// Creates a buffer whose storage is allocated later by [`init`](Self::init).
    ///
    /// Until then every transfer returns 0.
    pub fn unallocated(capacity: usize) -> Result<Self, RingError> {
        Self::unallocated_with(capacity, ArenaKind::Heap)
    }

    pub fn unallocated_with(capacity: usize, kind: ArenaKind) -> Result<Self, RingError> {
        validate_capacity(capacity)?;

        Ok(Self {
            capacity,
            kind,
            filled: AtomicUsize::new(0),
            state: Mutex::new(RingState {
                arena: None,
                cursors: Cursors::new(capacity),
            }),
        })
    }

    /// Allocates the storage. Fails on a second call or when the allocation fails,
    /// in which case the buffer stays unusable.
    pub fn init(&self) -> Result<(), RingError> {
        let mut state = self.state.lock();
        if state.arena.is_some() {
            return Err(RingError::AlreadyInitialized {
                capacity: self.capacity,
            });
        }

        match Arena::allocate(self.capacity, self.kind) {
            Ok(arena) => {
                state.arena = Some(arena);
                state.cursors.clear();
                self.publish(&state.cursors);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(capacity = self.capacity, kind = %self.kind, error = %err, "ring allocation failed");
                Err(err)
            }
        }
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline(always)]
    pub fn bytes_filled(&self) -> usize {
        self.filled.load(Ordering::Acquire)
    }

    #[inline(always)]
    pub fn bytes_available(&self) -> usize {
        self.capacity - self.bytes_filled()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.bytes_filled() == 0
    }

    #[inline(always)]
    pub fn is_full(&self) -> bool {
        self.bytes_filled() == self.capacity
    }

    pub fn is_usable(&self) -> bool {
        self.state.lock().arena.is_some()
    }

    /// Writes as much of `src` as fits.
    #[inline]
    pub fn write(&self, src: &[u8]) -> usize {
        self.write_from(Some(src), src.len())
    }

    /// Writes at most `len` bytes of `src`. A missing source is a no-op.
    pub fn write_from(&self, src: Option<&[u8]>, len: usize) -> usize {
        let Some(src) = src else {
            return 0;
        };
        let src = &src[..len.min(src.len())];
        if src.is_empty() {
            return 0;
        }

        let mut state = self.state.lock();
        let RingState { arena, cursors } = &mut *state;
        let Some(arena) = arena.as_mut() else {
            return 0;
        };
        if !self.verify(cursors) {
            return 0;
        }

        let written = transfer::write_into(arena, cursors, src);
        self.publish(cursors);

        if written < src.len() {
            tracing::trace!(requested = src.len(), written, "short write");
        }
        written
    }

    /// Reads as many bytes as are filled, up to `dst.len()`.
    #[inline]
    pub fn read(&self, dst: &mut [u8]) -> usize {
        let len = dst.len();
        self.read_into(Some(dst), len)
    }

    /// Reads at most `len` bytes into `dst`. A missing destination is a no-op.
    pub fn read_into(&self, dst: Option<&mut [u8]>, len: usize) -> usize {
        let Some(dst) = dst else {
            return 0;
        };
        let len = len.min(dst.len());
        let dst = &mut dst[..len];
        if dst.is_empty() {
            return 0;
        }

        let mut state = self.state.lock();
        let RingState { arena, cursors } = &mut *state;
        let Some(arena) = arena.as_ref() else {
            return 0;
        };
        if !self.verify(cursors) {
            return 0;
        }

        let read = transfer::read_from(arena, cursors, dst);
        self.publish(cursors);

        if read < len {
            tracing::trace!(requested = len, read, "short read");
        }
        read
    }

    /// Empties the buffer and zero-fills the storage. Capacity is unchanged.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        let RingState { arena, cursors } = &mut *state;
        let Some(arena) = arena.as_mut() else {
            return;
        };

        arena.zero();
        cursors.clear();
        self.publish(cursors);
        tracing::debug!(capacity = self.capacity, "ring reset");
    }

    pub fn snapshot(&self) -> RingSnapshot {
        let state = self.state.lock();
        RingSnapshot {
            capacity: self.capacity,
            filled: state.cursors.filled,
            read_cursor: state.cursors.read,
            write_cursor: state.cursors.write,
            arena: state.arena.as_ref().map(Arena::kind),
        }
    }

    /// Verifies the cursor/fill invariants and that the published fill count
    /// matches the locked one.
    pub fn check_consistency(&self) -> Result<(), RingError> {
        let state = self.state.lock();
        if state.arena.is_none() {
            return Err(RingError::Unallocated);
        }
        state.cursors.check()?;

        if self.filled.load(Ordering::Acquire) != state.cursors.filled {
            return Err(RingError::InvariantViolation {
                capacity: self.capacity,
                filled: self.filled.load(Ordering::Acquire),
                read: state.cursors.read,
                write: state.cursors.write,
            });
        }
        Ok(())
    }

    #[inline(always)]
    fn publish(&self, cursors: &Cursors) {
        self.filled.store(cursors.filled, Ordering::Release);
    }

    #[inline]
    fn verify(&self, cursors: &Cursors) -> bool {
        match cursors.check() {
            Ok(()) => true,
            Err(err) => {
                tracing::error!(error = %err, "refusing transfer on inconsistent ring");
                false
            }
        }
    }
}

fn validate_capacity(capacity: usize) -> Result<(), RingError> {
    if capacity == 0 {
        return Err(RingError::InvalidCapacity {
            capacity,
            reason: "must be greater than zero",
        });
    }
    if capacity > MAX_CAPACITY {
        return Err(RingError::InvalidCapacity {
            capacity,
            reason: "must not exceed 65535 bytes",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena_bytes(ring: &RingBuffer) -> Vec<u8> {
        let state = ring.state.lock();
        state.arena.as_deref().map(<[u8]>::to_vec).unwrap_or_default()
    }

    #[test]
    fn reset_zero_fills_storage() {
        for kind in [ArenaKind::Heap, ArenaKind::Anonymous] {
            let ring = RingBuffer::with_arena(8, kind).unwrap();
            ring.write(b"ABCDEF");
            ring.read(&mut [0u8; 4]);
            ring.write(b"GHIJK");
            assert!(arena_bytes(&ring).iter().any(|&b| b != 0));

            ring.reset();
            assert_eq!(arena_bytes(&ring), vec![0u8; 8]);
        }
    }

    #[test]
    fn read_leaves_storage_bytes_in_place() {
        let ring = RingBuffer::new(4).unwrap();
        ring.write(b"wxyz");
        ring.read(&mut [0u8; 4]);
        assert_eq!(arena_bytes(&ring), b"wxyz");
    }
}
