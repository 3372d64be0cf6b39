//! Line chunking
//!
//! Content is versioned as a sequence of atomic units. A text line is one
//! unit; content ending in a terminator carries a trailing empty unit so that
//! joining the units back together reproduces the input exactly.

use crate::types::Chunk;

const LINE_BREAK: u8 = b'\n';

/// Split raw bytes into line units.
pub fn split_lines(bytes: &[u8]) -> Vec<Chunk> {
    bytes
        .split(|b| *b == LINE_BREAK)
        .map(|line| line.to_vec())
        .collect()
}

/// Join line units with a single line break between consecutive units.
pub fn join_lines(units: &[Chunk]) -> Vec<u8> {
    let total = units.iter().map(|u| u.len() + 1).sum::<usize>();
    let mut out = Vec::with_capacity(total);
    for (i, unit) in units.iter().enumerate() {
        if i > 0 {
            out.push(LINE_BREAK);
        }
        out.extend_from_slice(unit);
    }
    out
}
