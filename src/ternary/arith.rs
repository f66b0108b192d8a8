//! Tryte-range arithmetic and trit slicing.
//!
//! Addition works on whole tryte values and reports the wrap as a carry trit:
//! a raw sum above +121 wraps down by 243 with carry +1, a raw sum below
//! -121 wraps up by 243 with carry -1.

use crate::ternary::{Trit, Tryte};

/// Outcome of a tryte addition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddResult {
    /// Wrapped 5-trit result.
    pub result: Tryte,
    /// Trit carried out of the most significant position.
    pub carry: Trit,
    /// Overflow trit. Always equal to `carry` for a tryte+tryte+trit sum.
    pub overflow: Trit,
    /// Unwrapped sum, before folding into tryte range.
    pub full: i32,
}

/// Add two trytes and a carry-in trit.
pub fn add(a: Tryte, b: Tryte, carry_in: Trit) -> AddResult {
    let full = a.to_i32() + b.to_i32() + carry_in.to_i32();
    let (raw, carry) = if full > Tryte::MAX {
        (full - Tryte::RADIX, Trit::P)
    } else if full < Tryte::MIN {
        (full + Tryte::RADIX, Trit::N)
    } else {
        (full, Trit::O)
    };

    // |a + b + c| <= 243, so a single fold always lands in range
    debug_assert!((Tryte::MIN..=Tryte::MAX).contains(&raw));
    let result = Tryte::from_i32(raw);
    let overflow = carry;
    debug_assert_eq!(overflow, carry);

    AddResult { result, carry, overflow, full }
}

/// Increment with wraparound. No carry is reported.
#[inline]
pub fn inc(a: Tryte) -> Tryte {
    add(a, Tryte::from(Trit::P), Trit::O).result
}

/// Decrement with wraparound. No carry is reported.
#[inline]
pub fn dec(a: Tryte) -> Tryte {
    add(a, Tryte::from(Trit::N), Trit::O).result
}

/// Split off the least significant trit: `value = 3 * rest + trit`.
#[inline]
fn split_lst(value: i32) -> (Trit, i32) {
    match value.rem_euclid(3) {
        0 => (Trit::O, value / 3),
        1 => (Trit::P, (value - 1) / 3),
        _ => (Trit::N, (value + 1) / 3),
    }
}

/// Get trit `index` (0 = least significant) of any integer.
pub fn get_trit(value: i32, index: usize) -> Trit {
    let mut rest = value;
    let mut trit = Trit::O;
    for _ in 0..=index {
        let (t, r) = split_lst(rest);
        trit = t;
        rest = r;
    }
    trit
}

/// Value of the trits in `[start, end)` of `value`, re-based at position 0.
pub fn slice_trits(value: i32, start: usize, end: usize) -> i32 {
    let mut rest = value;
    let mut out = 0;
    let mut weight = 1;
    for i in 0..end {
        let (t, r) = split_lst(rest);
        rest = r;
        if i >= start {
            out += t.to_i32() * weight;
            weight *= 3;
        }
    }
    out
}

/// Lowest five trits of `value`, least significant first.
pub fn to_trits(value: i32) -> [Trit; 5] {
    let mut out = [Trit::O; 5];
    let mut rest = value;
    for slot in out.iter_mut() {
        let (t, r) = split_lst(rest);
        *slot = t;
        rest = r;
    }
    out
}

/// Compose trits (least significant first) into an integer.
pub fn from_trits(trits: &[Trit]) -> i32 {
    trits.iter().rev().fold(0, |acc, t| acc * 3 + t.to_i32())
}

/// Low tryte of a word: trits [0, 5).
#[inline]
pub fn low_tryte(value: i32) -> Tryte {
    Tryte::from_i32(slice_trits(value, 0, Tryte::WIDTH))
}

/// High tryte of a word: trits [5, 10).
#[inline]
pub fn high_tryte(value: i32) -> Tryte {
    Tryte::from_i32(slice_trits(value, Tryte::WIDTH, 2 * Tryte::WIDTH))
}

/// Compose a word value from its halves.
#[inline]
pub fn word(high: Tryte, low: Tryte) -> i32 {
    high.to_i32() * Tryte::RADIX + low.to_i32()
}
