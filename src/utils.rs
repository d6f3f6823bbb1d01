use crate::errors::ExceptionalHalt;
use ethereum_types::{Address, H256, U256};

/// Interpret the low 20 bytes of a word as an address.
pub fn word_to_address(word: U256) -> Address {
    let word_bytes = word.to_big_endian();
    Address::from_slice(&word_bytes[12..])
}

pub fn address_to_word(address: Address) -> U256 {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_bytes());
    U256::from_big_endian(&word)
}

pub fn u256_to_h256(value: U256) -> H256 {
    H256(value.to_big_endian())
}

pub fn h256_to_u256(value: H256) -> U256 {
    U256::from_big_endian(value.as_bytes())
}

pub fn u256_to_usize(value: U256) -> Result<usize, ExceptionalHalt> {
    value
        .try_into()
        .map_err(|_| ExceptionalHalt::VeryLargeNumber)
}

/// Narrow a (size, offset) operand pair for a memory access.
///
/// A zero-size access touches nothing, so its offset is irrelevant and may
/// exceed the addressable range without failing.
pub fn size_offset_to_usize(size: U256, offset: U256) -> Result<(usize, usize), ExceptionalHalt> {
    if size.is_zero() {
        return Ok((0, 0));
    }
    Ok((u256_to_usize(size)?, u256_to_usize(offset)?))
}

/// Copy `size` bytes of `data` starting at `data_offset`, zero-padding
/// whatever lies past the end. Copy-style opcodes (CALLDATACOPY, CODECOPY,
/// CALLDATALOAD) read out-of-range bytes as zeros, so an offset beyond the
/// data, however large, is fine.
pub fn copy_padded(data: &[u8], data_offset: U256, size: usize) -> Vec<u8> {
    let mut buffer = vec![0u8; size];
    if let Ok(offset) = usize::try_from(data_offset) {
        if offset < data.len() {
            let end = data.len().min(offset.saturating_add(size));
            buffer[..end - offset].copy_from_slice(&data[offset..end]);
        }
    }
    buffer
}
