//! Character set for `.data` strings and `'c` literals.
//!
//! Positive trytes hold digits and letters so that `"123456789abc"` encodes
//! as `[1..=9, 42, 43, 44]`. Control characters and the remaining ASCII
//! punctuation live at negative values. Zero is NUL.

use crate::ternary::Tryte;

/// Characters for trytes 1, 2, 3, ... in order.
const POSITIVE: &str = "123456789\
0ABCDEFGHIJKLMNOPQRSTUVWXYZ \
.,!?abcdefghijklmnopqrstuvwxyz";

/// Characters for trytes -1, -2, -3, ... in order.
const NEGATIVE: &str = "\n\t'\"#$%&()*+-/:;<=>@[\\]^_`{|}~";

/// Encode a character, or `None` if it has no tryte.
pub fn encode(c: char) -> Option<Tryte> {
    if c == '\0' {
        return Some(Tryte::ZERO);
    }
    if let Some(i) = POSITIVE.chars().position(|p| p == c) {
        return Some(Tryte::from_i32(i as i32 + 1));
    }
    NEGATIVE
        .chars()
        .position(|n| n == c)
        .map(|i| Tryte::from_i32(-(i as i32) - 1))
}

/// Decode a tryte to its character, or `None` for unassigned values.
pub fn decode(t: Tryte) -> Option<char> {
    let v = t.to_i32();
    match v {
        0 => Some('\0'),
        v if v > 0 => POSITIVE.chars().nth(v as usize - 1),
        _ => NEGATIVE.chars().nth((-v) as usize - 1),
    }
}
