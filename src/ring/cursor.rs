use super::RingError;

/// Read/write offsets plus the fill count that tells "empty" from "full"
/// when the two offsets coincide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Cursors {
    pub capacity: usize,
    pub read: usize,
    pub write: usize,
    pub filled: usize,
}

impl Cursors {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            read: 0,
            write: 0,
            filled: 0,
        }
    }

    #[inline(always)]
    pub fn available(&self) -> usize {
        self.capacity - self.filled
    }

    /// Moves `pos` forward by `n` bytes of a block that ends at or before
    /// `capacity`; lands on 0 exactly when the block touches the end.
    #[inline(always)]
    pub fn advance(&self, pos: usize, n: usize) -> usize {
        let next = pos + n;
        if next == self.capacity { 0 } else { next }
    }

    pub fn clear(&mut self) {
        self.read = 0;
        self.write = 0;
        self.filled = 0;
    }

    pub fn check(&self) -> Result<(), RingError> {
        let in_bounds = self.capacity > 0
            && self.filled <= self.capacity
            && self.read < self.capacity
            && self.write < self.capacity;

        if in_bounds && (self.read + self.filled) % self.capacity == self.write {
            Ok(())
        } else {
            Err(RingError::InvariantViolation {
                capacity: self.capacity,
                filled: self.filled,
                read: self.read,
                write: self.write,
            })
        }
    }
}
