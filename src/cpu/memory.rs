//! Tryte memory with memory-mapped I/O traps.
//!
//! Addresses are balanced: a memory of `n` cells (n odd) spans
//! `-(n-1)/2 ..= (n-1)/2`. The default size is 3^10 cells, which covers the
//! full range of a word address.
//!
//! Peripherals register named address ranges. On a read, the first range
//! containing the address may supply a value, which is stored and returned.
//! On a write, the value is stored first and then handed to the range's
//! write trap.

use std::fmt;
use thiserror::Error;
use tracing::debug;
use crate::ternary::{Tryte, Word};

/// The default number of memory cells (3^10).
pub const DEFAULT_TRYTE_COUNT: usize = 59_049;

/// Read trap: returns a value to store and return in place of the cell.
pub type ReadTrap = Box<dyn FnMut(i32) -> Option<Tryte>>;

/// Write trap: observes an address and the value just stored there.
pub type WriteTrap = Box<dyn FnMut(i32, Tryte)>;

/// A memory-mapped address range, inclusive at both ends.
pub struct MemoryMap {
    pub start: i32,
    pub end: i32,
    pub read: Option<ReadTrap>,
    pub write: Option<WriteTrap>,
}

impl MemoryMap {
    pub fn new(start: i32, end: i32) -> Self {
        Self { start, end, read: None, write: None }
    }

    pub fn on_read(mut self, trap: impl FnMut(i32) -> Option<Tryte> + 'static) -> Self {
        self.read = Some(Box::new(trap));
        self
    }

    pub fn on_write(mut self, trap: impl FnMut(i32, Tryte) + 'static) -> Self {
        self.write = Some(Box::new(trap));
        self
    }

    #[inline]
    pub fn contains(&self, address: i32) -> bool {
        (self.start..=self.end).contains(&address)
    }
}

impl fmt::Debug for MemoryMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryMap")
            .field("start", &self.start)
            .field("end", &self.end)
            .field("read", &self.read.is_some())
            .field("write", &self.write.is_some())
            .finish()
    }
}

/// Errors that can occur during memory operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    /// Address is outside the configured range.
    #[error("memory address {address} out of range ({min} to {max})")]
    AddressOutOfRange { address: i32, min: i32, max: i32 },

    /// Balanced addressing needs an odd, non-zero cell count.
    #[error("memory size {0} must be odd")]
    InvalidSize(usize),
}

/// Balanced-address tryte memory.
pub struct Memory {
    cells: Vec<Tryte>,
    max_address: i32,
    maps: Vec<(String, MemoryMap)>,
}

impl Memory {
    /// Create a zeroed memory of `tryte_count` cells.
    pub fn new(tryte_count: usize) -> Result<Self, MemoryError> {
        if tryte_count % 2 == 0 || tryte_count > DEFAULT_TRYTE_COUNT {
            return Err(MemoryError::InvalidSize(tryte_count));
        }
        Ok(Self {
            cells: vec![Tryte::ZERO; tryte_count],
            max_address: ((tryte_count - 1) / 2) as i32,
            maps: Vec::new(),
        })
    }

    #[inline]
    pub fn min_address(&self) -> i32 {
        -self.max_address
    }

    #[inline]
    pub fn max_address(&self) -> i32 {
        self.max_address
    }

    /// Number of cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn index(&self, address: i32) -> Result<usize, MemoryError> {
        if (-self.max_address..=self.max_address).contains(&address) {
            Ok((address + self.max_address) as usize)
        } else {
            Err(MemoryError::AddressOutOfRange {
                address,
                min: self.min_address(),
                max: self.max_address,
            })
        }
    }

    /// Register a named trap range. A map with the same name is replaced.
    pub fn add_memory_map(&mut self, name: impl Into<String>, map: MemoryMap) {
        let name = name.into();
        debug!(%name, start = map.start, end = map.end, "memory map registered");
        match self.maps.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = map,
            None => self.maps.push((name, map)),
        }
    }

    fn map_for(&mut self, address: i32) -> Option<&mut MemoryMap> {
        self.maps
            .iter_mut()
            .map(|(_, map)| map)
            .find(|map| map.contains(address))
    }

    /// Read one tryte, consulting read traps.
    pub fn read(&mut self, address: i32) -> Result<Tryte, MemoryError> {
        let index = self.index(address)?;
        let value = self
            .map_for(address)
            .and_then(|map| map.read.as_mut())
            .and_then(|trap| trap(address));
        if let Some(value) = value {
            self.cells[index] = value;
        }
        Ok(self.cells[index])
    }

    /// Read one tryte without triggering traps.
    pub fn peek(&self, address: i32) -> Result<Tryte, MemoryError> {
        Ok(self.cells[self.index(address)?])
    }

    /// Write one tryte, then notify any write trap.
    pub fn write(&mut self, address: i32, value: Tryte) -> Result<(), MemoryError> {
        let index = self.index(address)?;
        self.cells[index] = value;
        if let Some(trap) = self.map_for(address).and_then(|map| map.write.as_mut()) {
            trap(address, value);
        }
        Ok(())
    }

    /// Read a word stored low tryte first.
    pub fn read_word(&mut self, address: i32) -> Result<Word, MemoryError> {
        let low = self.read(address)?;
        let high = self.read(address + 1)?;
        Ok(Word::from_trytes(low, high))
    }

    /// Write a word, low tryte first.
    pub fn write_word(&mut self, address: i32, value: Word) -> Result<(), MemoryError> {
        self.write(address, value.low())?;
        self.write(address + 1, value.high())
    }

    /// Write consecutive trytes starting at `address`.
    pub fn write_array(&mut self, address: i32, data: &[Tryte]) -> Result<(), MemoryError> {
        for (offset, &tryte) in data.iter().enumerate() {
            self.write(address + offset as i32, tryte)?;
        }
        Ok(())
    }

    /// View the cells in `[start, end)` without triggering traps.
    pub fn subarray(&self, start: i32, end: i32) -> Result<&[Tryte], MemoryError> {
        let from = self.index(start)?;
        if end <= start {
            return Ok(&[]);
        }
        let to = self.index(end - 1)? + 1;
        Ok(&self.cells[from..to])
    }

    /// Zero every cell. Memory maps stay registered.
    pub fn clear(&mut self) {
        self.cells.fill(Tryte::ZERO);
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self {
            cells: vec![Tryte::ZERO; DEFAULT_TRYTE_COUNT],
            max_address: Word::MAX,
            maps: Vec::new(),
        }
    }
}

impl fmt::Debug for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let non_zero = self.cells.iter().filter(|cell| !cell.is_zero()).count();
        let maps: Vec<&str> = self.maps.iter().map(|(name, _)| name.as_str()).collect();

        f.debug_struct("Memory")
            .field("non_zero_cells", &non_zero)
            .field("total_cells", &self.cells.len())
            .field("maps", &maps)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn t(v: i32) -> Tryte {
        Tryte::from_i32(v)
    }

    #[test]
    fn test_memory_read_write() {
        let mut mem = Memory::new(9).unwrap();
        assert_eq!(mem.read(0).unwrap(), 0);

        mem.write(0, t(42)).unwrap();
        assert_eq!(mem.read(0).unwrap(), 42);

        mem.write(-1, t(33)).unwrap();
        assert_eq!(mem.read(-1).unwrap(), 33);
        assert_eq!(mem.read(0).unwrap(), 42);
    }

    #[test]
    fn test_memory_bounds() {
        let mut mem = Memory::new(9).unwrap();
        assert_eq!(mem.min_address(), -4);
        assert_eq!(mem.max_address(), 4);
        assert!(mem.read(4).is_ok());
        assert!(mem.read(-4).is_ok());
        assert_eq!(
            mem.read(5),
            Err(MemoryError::AddressOutOfRange { address: 5, min: -4, max: 4 })
        );
        assert!(mem.write(-5, t(1)).is_err());
        assert_eq!(Memory::new(8).err(), Some(MemoryError::InvalidSize(8)));
    }

    #[test]
    fn test_default_spans_word_range() {
        let mem = Memory::default();
        assert_eq!(mem.len(), DEFAULT_TRYTE_COUNT);
        assert_eq!(mem.min_address(), Word::MIN);
        assert_eq!(mem.max_address(), Word::MAX);
    }

    #[test]
    fn test_memory_maps() {
        let trapped_read = Rc::new(Cell::new(None));
        let trapped_write = Rc::new(Cell::new(None));

        let mut mem = Memory::new(9).unwrap();
        let r = trapped_read.clone();
        let w = trapped_write.clone();
        mem.add_memory_map(
            "trap1",
            MemoryMap::new(3, 4)
                .on_read(move |addr| {
                    r.set(Some(addr));
                    Some(t(42))
                })
                .on_write(move |addr, value| w.set(Some((addr, value.to_i32())))),
        );

        mem.write(0, t(1)).unwrap();
        assert_eq!(mem.read(0).unwrap(), 1);
        assert_eq!(trapped_read.get(), None);
        assert_eq!(trapped_write.get(), None);

        assert_eq!(mem.read(3).unwrap(), 42);
        assert_eq!(trapped_read.get(), Some(3));
        assert_eq!(mem.read(4).unwrap(), 42);
        assert_eq!(trapped_read.get(), Some(4));
        assert_eq!(trapped_write.get(), None);

        mem.write(4, t(33)).unwrap();
        assert_eq!(trapped_write.get(), Some((4, 33)));
        // peek bypasses the read trap
        assert_eq!(mem.peek(4).unwrap(), 33);
    }

    #[test]
    fn test_read_trap_without_override() {
        let mut mem = Memory::new(9).unwrap();
        mem.add_memory_map("quiet", MemoryMap::new(-4, -1).on_read(|_| None));
        mem.write(-2, t(7)).unwrap();
        assert_eq!(mem.read(-2).unwrap(), 7);
    }

    #[test]
    fn test_map_replaced_by_name() {
        let mut mem = Memory::new(9).unwrap();
        mem.add_memory_map("dev", MemoryMap::new(0, 0).on_read(|_| Some(t(1))));
        mem.add_memory_map("dev", MemoryMap::new(0, 0).on_read(|_| Some(t(2))));
        assert_eq!(mem.read(0).unwrap(), 2);
    }

    #[test]
    fn test_words_and_arrays() {
        let mut mem = Memory::default();
        mem.write_word(110, Word::from_i32(6640)).unwrap();
        assert_eq!(mem.read_word(110).unwrap().to_i32(), 6640);

        mem.write_array(-2, &[t(1), t(2), t(3)]).unwrap();
        let view: Vec<i32> = mem.subarray(-2, 1).unwrap().iter().map(|c| c.to_i32()).collect();
        assert_eq!(view, vec![1, 2, 3]);

        mem.clear();
        assert_eq!(mem.peek(-2).unwrap(), 0);
    }
}
