//! `std::io` adapters.
//!
//! A full buffer on write, or an empty one on read, is reported as
//! [`io::ErrorKind::WouldBlock`] the way a non-blocking socket does, so a
//! zero-length read is never mistaken for end of stream.

use super::{RingBuffer, RingError};
use std::io;

fn stalled(ring: &RingBuffer, what: &'static str) -> io::Error {
    if ring.is_usable() {
        io::Error::new(io::ErrorKind::WouldBlock, what)
    } else {
        io::Error::other(RingError::Unallocated)
    }
}

impl io::Write for &RingBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        match RingBuffer::write(*self, buf) {
            0 => Err(stalled(*self, "ring buffer full")),
            n => Ok(n),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl io::Read for &RingBuffer {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        match RingBuffer::read(*self, buf) {
            0 => Err(stalled(*self, "ring buffer empty")),
            n => Ok(n),
        }
    }
}

impl io::Write for RingBuffer {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::Write::write(&mut &*self, buf)
    }

    #[inline]
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl io::Read for RingBuffer {
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        io::Read::read(&mut &*self, buf)
    }
}
