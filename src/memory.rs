use crate::{
    constants::{MEMORY_EXPANSION_QUOTIENT, WORD_SIZE_IN_BYTES_U64, WORD_SIZE_IN_BYTES_USIZE},
    errors::ExceptionalHalt,
};
use ethereum_types::U256;
use ExceptionalHalt::OutOfGas;

/// Frame-local byte memory.
///
/// The buffer length is always a multiple of the word size and only ever
/// grows; it doubles as the record of how much memory has been paid for.
#[derive(Debug, Default)]
pub struct Memory {
    data: Vec<u8>,
}

impl Memory {
    pub fn new() -> Self {
        Memory { data: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Grow the buffer (zero-filled, word-aligned) to cover `new_memory_size`
    /// bytes. Shrinking never happens.
    pub fn resize(&mut self, new_memory_size: usize) -> Result<(), ExceptionalHalt> {
        if new_memory_size <= self.data.len() {
            return Ok(());
        }
        let aligned = new_memory_size
            .checked_next_multiple_of(WORD_SIZE_IN_BYTES_USIZE)
            .ok_or(ExceptionalHalt::OutOfMemory)?;
        self.data.resize(aligned, 0);
        Ok(())
    }

    pub fn load_word(&mut self, offset: usize) -> Result<U256, ExceptionalHalt> {
        let end = offset
            .checked_add(WORD_SIZE_IN_BYTES_USIZE)
            .ok_or(ExceptionalHalt::VeryLargeNumber)?;
        self.resize(end)?;
        Ok(U256::from_big_endian(&self.data[offset..end]))
    }

    pub fn load_range(&mut self, offset: usize, size: usize) -> Result<Vec<u8>, ExceptionalHalt> {
        if size == 0 {
            return Ok(Vec::new());
        }
        let end = offset
            .checked_add(size)
            .ok_or(ExceptionalHalt::VeryLargeNumber)?;
        self.resize(end)?;
        Ok(self.data[offset..end].to_vec())
    }

    pub fn store_data(&mut self, offset: usize, data: &[u8]) -> Result<(), ExceptionalHalt> {
        if data.is_empty() {
            return Ok(());
        }
        let end = offset
            .checked_add(data.len())
            .ok_or(ExceptionalHalt::VeryLargeNumber)?;
        self.resize(end)?;
        self.data[offset..end].copy_from_slice(data);
        Ok(())
    }

    pub fn store_word(&mut self, offset: usize, word: U256) -> Result<(), ExceptionalHalt> {
        self.store_data(offset, &word.to_big_endian())
    }

    /// Copy `size` bytes inside the buffer, handling overlap (MCOPY).
    pub fn copy_within(
        &mut self,
        src_offset: usize,
        dst_offset: usize,
        size: usize,
    ) -> Result<(), ExceptionalHalt> {
        if size == 0 {
            return Ok(());
        }
        let end = src_offset
            .max(dst_offset)
            .checked_add(size)
            .ok_or(ExceptionalHalt::VeryLargeNumber)?;
        self.resize(end)?;
        self.data
            .copy_within(src_offset..src_offset + size, dst_offset);
        Ok(())
    }

    /// Read an already-expanded region; out-of-range reads yield an empty
    /// slice (callers expand before recording output slices).
    pub fn slice(&self, offset: usize, size: usize) -> &[u8] {
        offset
            .checked_add(size)
            .and_then(|end| self.data.get(offset..end))
            .unwrap_or_default()
    }
}

/// Gas for growing memory from `current_memory_size` to `new_memory_size`:
/// only the delta of the cumulative curve is charged.
pub fn expansion_cost(
    new_memory_size: usize,
    current_memory_size: usize,
) -> Result<u64, ExceptionalHalt> {
    if new_memory_size <= current_memory_size {
        return Ok(0);
    }
    Ok(cost(new_memory_size)?.saturating_sub(cost(current_memory_size)?))
}

/// Cumulative cost of a memory of `memory_size` bytes:
/// `3 * words + words^2 / 512`.
fn cost(memory_size: usize) -> Result<u64, ExceptionalHalt> {
    let memory_size_word = u64::try_from(memory_size)
        .map_err(|_| OutOfGas)?
        .checked_add(WORD_SIZE_IN_BYTES_U64 - 1)
        .ok_or(OutOfGas)?
        / WORD_SIZE_IN_BYTES_U64;

    memory_size_word
        .checked_pow(2)
        .ok_or(OutOfGas)?
        .checked_div(MEMORY_EXPANSION_QUOTIENT)
        .ok_or(OutOfGas)?
        .checked_add(memory_size_word.checked_mul(3).ok_or(OutOfGas)?)
        .ok_or(OutOfGas)
}

/// Word-aligned memory size needed for an `(offset, size)` access.
pub fn calculate_memory_size(offset: usize, size: usize) -> Result<usize, ExceptionalHalt> {
    if size == 0 {
        return Ok(0);
    }
    offset
        .checked_add(size)
        .and_then(|end| end.checked_next_multiple_of(WORD_SIZE_IN_BYTES_USIZE))
        .ok_or(OutOfGas)
}
