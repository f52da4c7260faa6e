use std::collections::TryReserveError;
use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RingError {
    #[error("Invalid capacity {capacity}: {reason}")]
    InvalidCapacity {
        capacity: usize,
        reason: &'static str,
    },

    #[error("Failed to allocate {capacity} bytes of heap storage")]
    HeapAllocation {
        capacity: usize,
        #[source]
        source: TryReserveError,
    },

    #[error("Failed to map {capacity} bytes of anonymous memory")]
    MapAllocation {
        capacity: usize,
        #[source]
        source: io::Error,
    },

    #[error("Ring buffer of {capacity} bytes is already initialized")]
    AlreadyInitialized { capacity: usize },

    #[error("Ring buffer has no storage")]
    Unallocated,

    #[error(
        "Ring buffer invariant violated: capacity {capacity}, filled {filled}, read cursor {read}, write cursor {write}"
    )]
    InvariantViolation {
        capacity: usize,
        filled: usize,
        read: usize,
        write: usize,
    },
}
