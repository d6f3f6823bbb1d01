//! # Keccak256 operations
//!
//! Includes the following opcodes:
//!   - `KECCAK256`

use crate::{
    errors::{OpcodeResult, VMError},
    gas_cost,
    memory::calculate_memory_size,
    opcode_handlers::OpcodeHandler,
    utils::size_offset_to_usize,
    vm::VM,
};
use ethereum_types::U256;
use sha3::{Digest, Keccak256};

/// Implementation for the `KECCAK256` opcode.
pub struct OpKeccak256Handler;
impl OpcodeHandler for OpKeccak256Handler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let [offset, size] = vm.stack.pop()?;
        let (size, offset) = size_offset_to_usize(size, offset)?;

        vm.consume_gas(gas_cost::keccak256(
            calculate_memory_size(offset, size)?,
            vm.memory.len(),
            size,
        )?)?;

        let mut hasher = Keccak256::new();
        hasher.update(vm.memory.load_range(offset, size)?);
        vm.stack
            .push(U256::from_big_endian(&hasher.finalize()))?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}
