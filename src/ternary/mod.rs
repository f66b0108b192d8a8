//! Balanced ternary number system primitives.
//!
//! This module provides the core types for working with balanced ternary:
//! - [`Trit`] - A single balanced ternary digit (-1, 0, +1)
//! - [`Tryte`] - A 5-trit value (memory cells, registers, opcodes)
//! - [`Word`] - A 10-trit value made of two trytes (addresses, vectors)

mod trit;
mod tryte;
mod ops;
pub mod arith;
pub mod notation;
pub mod text;

pub use trit::Trit;
pub use tryte::{OutOfRange, Tryte, Word};
pub use ops::TritOps;
pub use arith::{add, dec, inc, AddResult};
pub use notation::NotationError;
