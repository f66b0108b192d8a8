//! Upward-growing stack over memory.
//!
//! `push` writes at the stack pointer and then increments it; `pull`
//! decrements and then reads. Words go on low tryte first and come off
//! high tryte first. There is no overflow or underflow guard beyond the
//! memory's own address check.

use crate::cpu::memory::{Memory, MemoryError};
use crate::ternary::{Tryte, Word};

/// A stack view borrowing memory and a stack pointer.
pub struct Stack<'a> {
    mem: &'a mut Memory,
    ptr: &'a mut i32,
}

impl<'a> Stack<'a> {
    pub fn new(mem: &'a mut Memory, ptr: &'a mut i32) -> Self {
        Self { mem, ptr }
    }

    pub fn push(&mut self, value: Tryte) -> Result<(), MemoryError> {
        self.mem.write(*self.ptr, value)?;
        *self.ptr += 1;
        Ok(())
    }

    pub fn pull(&mut self) -> Result<Tryte, MemoryError> {
        *self.ptr -= 1;
        self.mem.read(*self.ptr)
    }

    pub fn push_word(&mut self, value: Word) -> Result<(), MemoryError> {
        self.push(value.low())?;
        self.push(value.high())
    }

    pub fn pull_word(&mut self) -> Result<Word, MemoryError> {
        let high = self.pull()?;
        let low = self.pull()?;
        Ok(Word::from_trytes(low, high))
    }
}
