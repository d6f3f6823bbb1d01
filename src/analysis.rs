//! Pre-execution code analysis.
//!
//! Before a code blob runs, a single pass over it produces:
//!   - the set of offsets that are legal `JUMPDEST` targets (a `JUMPDEST`
//!     byte that does not sit inside PUSH immediate data), and
//!   - a padded copy of the code ending in `STOP`, so the dispatch loop can
//!     read opcodes and PUSH immediates without bounds checks and is
//!     guaranteed to terminate.
//!
//! The analysis depends only on the code bytes, so it can be cached by code
//! hash and shared between frames running the same code.

use crate::opcodes::Opcode;

/// Immutable result of analyzing one code blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeAnalysis {
    padded_code: Box<[u8]>,
    jumpdest_map: JumpdestMap,
    code_len: usize,
}

impl CodeAnalysis {
    /// Walk the code once, marking `JUMPDEST`s and skipping PUSH data.
    pub fn analyze(code: &[u8]) -> Self {
        let mut jumpdest_map = JumpdestMap::new(code.len());

        let mut i = 0;
        while i < code.len() {
            let op = code[i];
            if Opcode::is_push_with_data(op) {
                // Skip the immediate bytes; a truncated PUSH still consumes
                // its whole span, which may run past the end of the code.
                i += usize::from(op - (Opcode::PUSH1 as u8 - 1));
            } else if op == Opcode::JUMPDEST as u8 {
                jumpdest_map.set(i);
            }
            i += 1;
        }

        // `i` is now the smallest offset past the last PUSH immediate. The
        // buffer is zero-filled beyond the code, which both supplies the
        // implicit zero bytes of truncated PUSH immediates and plants the
        // STOP terminators (STOP is 0x00): one at the code end for jumps
        // that land there, one at the very end so the loop cannot run off.
        let mut padded_code = vec![0u8; i + 1];
        padded_code[..code.len()].copy_from_slice(code);

        CodeAnalysis {
            padded_code: padded_code.into_boxed_slice(),
            jumpdest_map,
            code_len: code.len(),
        }
    }

    /// The code followed by its STOP padding.
    pub fn padded_code(&self) -> &[u8] {
        &self.padded_code
    }

    /// Length of the original, unpadded code.
    pub fn code_len(&self) -> usize {
        self.code_len
    }

    /// The original code bytes (a prefix of the padded buffer).
    pub fn code(&self) -> &[u8] {
        &self.padded_code[..self.code_len]
    }

    /// True if `target` may be jumped to: inside the original code, a
    /// `JUMPDEST` byte, and not PUSH data.
    pub fn is_valid_jump_target(&self, target: usize) -> bool {
        target < self.code_len && self.jumpdest_map.is_set(target)
    }
}

/// One bit per original code offset; set iff the offset is a valid jump
/// destination.
#[derive(Debug, Clone, PartialEq, Eq)]
struct JumpdestMap {
    bits: Box<[u64]>,
}

impl JumpdestMap {
    fn new(code_len: usize) -> Self {
        JumpdestMap {
            bits: vec![0u64; code_len.div_ceil(64)].into_boxed_slice(),
        }
    }

    fn set(&mut self, offset: usize) {
        self.bits[offset / 64] |= 1 << (offset % 64);
    }

    fn is_set(&self, offset: usize) -> bool {
        self.bits
            .get(offset / 64)
            .is_some_and(|word| word & (1 << (offset % 64)) != 0)
    }
}
