use crate::ring::RingError;
use memmap2::{MmapMut, MmapOptions};
use std::fmt;
use std::ops::{Deref, DerefMut};

/// Where the backing bytes of a ring buffer live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArenaKind {
    /// Plain heap allocation.
    #[default]
    Heap,
    /// Private anonymous mapping, zero-filled by the kernel.
    Anonymous,
}

impl fmt::Display for ArenaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Heap => f.write_str("heap"),
            Self::Anonymous => f.write_str("anonymous"),
        }
    }
}

/// Fixed-size, zero-initialized byte block owned by a single ring buffer.
///
/// The length never changes after [`Arena::allocate`] returns.
pub(crate) struct Arena {
    storage: Storage,
}

enum Storage {
    Heap(Box<[u8]>),
    Anonymous(MmapMut),
}

impl Arena {
    pub fn allocate(capacity: usize, kind: ArenaKind) -> Result<Self, RingError> {
        let storage = match kind {
            ArenaKind::Heap => {
                let mut buf = Vec::new();
                buf.try_reserve_exact(capacity)
                    .map_err(|source| RingError::HeapAllocation { capacity, source })?;
                buf.resize(capacity, 0);
                Storage::Heap(buf.into_boxed_slice())
            }
            ArenaKind::Anonymous => {
                let map = MmapOptions::new()
                    .len(capacity)
                    .map_anon()
                    .map_err(|source| RingError::MapAllocation { capacity, source })?;
                Storage::Anonymous(map)
            }
        };

        tracing::debug!(capacity, %kind, "allocated ring arena");
        Ok(Self { storage })
    }

    #[inline]
    pub fn kind(&self) -> ArenaKind {
        match self.storage {
            Storage::Heap(_) => ArenaKind::Heap,
            Storage::Anonymous(_) => ArenaKind::Anonymous,
        }
    }

    pub fn zero(&mut self) {
        self.fill(0);
    }
}

impl Deref for Arena {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        match &self.storage {
            Storage::Heap(buf) => &buf[..],
            Storage::Anonymous(map) => &map[..],
        }
    }
}

impl DerefMut for Arena {
    #[inline]
    fn deref_mut(&mut self) -> &mut [u8] {
        match &mut self.storage {
            Storage::Heap(buf) => &mut buf[..],
            Storage::Anonymous(map) => &mut map[..],
        }
    }
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("kind", &self.kind())
            .field("len", &self.len())
            .finish()
    }
}
