//! Fixed-capacity byte ring buffer for exchanging a raw byte stream between
//! threads.
//!
//! [`RingBuffer`] serializes writers and readers on a single mutex and never
//! blocks waiting for data: a write into a full buffer or a read from an empty
//! one returns 0, and oversized requests are truncated to what fits. Callers
//! compare the returned count with what they asked for and retry.
//!
//! [`SpscRingBuffer`] is a lock-free alternative for the single-writer,
//! single-reader case.

pub mod ring;
pub mod storage;

pub use ring::{
    Consumer, MAX_CAPACITY, Producer, RingBuffer, RingError, RingSnapshot, SPSC_MAX_CAPACITY,
    SpscRingBuffer,
};
pub use storage::ArenaKind;
