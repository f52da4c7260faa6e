pub mod buffer;
mod cursor;
mod io;
pub mod ring_error;
pub mod spsc;
mod transfer;

pub use buffer::{MAX_CAPACITY, RingBuffer, RingSnapshot};
pub use ring_error::*;
pub use spsc::*;
