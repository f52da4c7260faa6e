//! Backing storage for ring buffers.
//!
//! Callers pick a backend through [`ArenaKind`]; the arena itself is only
//! reachable from inside the crate.
//!
//! ```compile_fail
//! use bytering::storage::arena::Arena;
//! ```

pub mod arena;

pub(crate) use arena::Arena;
pub use arena::ArenaKind;
