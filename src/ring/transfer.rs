//! Wraparound copies between caller slices and the arena.
//!
//! ```text
//!  0            read                write             end
//!  |-- avail ----|====== filled ======|---- avail ----|   read < write
//!
//!  0            write               read              end
//!  |== filled ===|------ avail -------|=== filled ====|   write <= read
//! ```
//!
//! A transfer is clamped first, then copied as the right block
//! `[cursor, end)` and, if anything is left, the left block starting at 0.

use super::cursor::Cursors;

/// Copies up to `src.len()` bytes into the arena. Returns the bytes copied.
#[inline]
pub(crate) fn write_into(arena: &mut [u8], cursors: &mut Cursors, src: &[u8]) -> usize {
    let len = src.len().min(cursors.available());
    if len == 0 {
        return 0;
    }

    let start = cursors.write;
    let mut written = 0;

    if start < cursors.read {
        arena[start..start + len].copy_from_slice(&src[..len]);
        written += len;
        cursors.write = cursors.advance(start, len);
    } else {
        let contiguous = cursors.capacity - start;
        let first_chunk = len.min(contiguous);

        arena[start..start + first_chunk].copy_from_slice(&src[..first_chunk]);
        written += first_chunk;
        cursors.write = cursors.advance(start, first_chunk);

        let remaining = len - first_chunk;
        if remaining > 0 {
            arena[..remaining].copy_from_slice(&src[first_chunk..len]);
            written += remaining;
            cursors.write = cursors.advance(0, remaining);
        }
    }

    cursors.filled += written;
    written
}

/// Copies up to `dst.len()` bytes out of the arena. Returns the bytes copied.
#[inline]
pub(crate) fn read_from(arena: &[u8], cursors: &mut Cursors, dst: &mut [u8]) -> usize {
    let len = dst.len().min(cursors.filled);
    if len == 0 {
        return 0;
    }

    let start = cursors.read;
    let mut read = 0;

    if start < cursors.write {
        dst[..len].copy_from_slice(&arena[start..start + len]);
        read += len;
        cursors.read = cursors.advance(start, len);
    } else {
        let contiguous = cursors.capacity - start;
        let first_chunk = len.min(contiguous);

        dst[..first_chunk].copy_from_slice(&arena[start..start + first_chunk]);
        read += first_chunk;
        cursors.read = cursors.advance(start, first_chunk);

        let remaining = len - first_chunk;
        if remaining > 0 {
            dst[first_chunk..len].copy_from_slice(&arena[..remaining]);
            read += remaining;
            cursors.read = cursors.advance(0, remaining);
        }
    }

    cursors.filled -= read;
    read
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(capacity: usize) -> (Vec<u8>, Cursors) {
        (vec![0; capacity], Cursors::new(capacity))
    }

    #[test]
    fn write_fills_right_block_from_empty() {
        let (mut arena, mut c) = ring(8);
        assert_eq!(write_into(&mut arena, &mut c, b"abc"), 3);
        assert_eq!(&arena[..3], b"abc");
        assert_eq!((c.read, c.write, c.filled), (0, 3, 3));
    }

    #[test]
    fn write_exactly_to_end_wraps_cursor() {
        let (mut arena, mut c) = ring(4);
        assert_eq!(write_into(&mut arena, &mut c, b"wxyz"), 4);
        assert_eq!(c.write, 0);
        assert_eq!(c.filled, 4);
        assert!(c.check().is_ok());
    }

    #[test]
    fn write_splits_across_end() {
        let (mut arena, mut c) = ring(8);
        c.read = 6;
        c.write = 6;
        assert_eq!(write_into(&mut arena, &mut c, b"12345"), 5);
        assert_eq!(&arena[6..], b"12");
        assert_eq!(&arena[..3], b"345");
        assert_eq!(c.write, 3);
        assert!(c.check().is_ok());
    }

    #[test]
    fn write_behind_read_uses_single_block() {
        let (mut arena, mut c) = ring(8);
        c.read = 5;
        c.write = 1;
        c.filled = 4;
        assert_eq!(write_into(&mut arena, &mut c, b"zzzzzzzz"), 4);
        assert_eq!(&arena[1..5], b"zzzz");
        assert_eq!(c.write, 5);
        assert_eq!(c.filled, 8);
        assert!(c.check().is_ok());
    }

    #[test]
    fn write_into_full_ring_copies_nothing() {
        let (mut arena, mut c) = ring(4);
        write_into(&mut arena, &mut c, b"full");
        let before = c;
        assert_eq!(write_into(&mut arena, &mut c, b"more"), 0);
        assert_eq!(c, before);
    }

    #[test]
    fn read_splits_across_end() {
        let (mut arena, mut c) = ring(8);
        c.read = 6;
        c.write = 6;
        write_into(&mut arena, &mut c, b"12345");

        let mut out = [0u8; 8];
        assert_eq!(read_from(&arena, &mut c, &mut out), 5);
        assert_eq!(&out[..5], b"12345");
        assert_eq!((c.read, c.write, c.filled), (3, 3, 0));
    }

    #[test]
    fn read_from_empty_ring_copies_nothing() {
        let (arena, mut c) = ring(4);
        let mut out = [0u8; 4];
        assert_eq!(read_from(&arena, &mut c, &mut out), 0);
        assert_eq!(c, Cursors::new(4));
    }

    #[test]
    fn partial_read_keeps_remaining_in_order() {
        let (mut arena, mut c) = ring(8);
        write_into(&mut arena, &mut c, b"abcdef");

        let mut out = [0u8; 2];
        assert_eq!(read_from(&arena, &mut c, &mut out), 2);
        assert_eq!(&out, b"ab");
        assert_eq!(c.filled, 4);

        let mut rest = [0u8; 8];
        assert_eq!(read_from(&arena, &mut c, &mut rest), 4);
        assert_eq!(&rest[..4], b"cdef");
    }
}
