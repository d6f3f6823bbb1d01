//! # Logging operations
//!
//! Includes the following opcodes:
//!   - `LOG0` to `LOG4`

use crate::{
    errors::{ExceptionalHalt, OpcodeResult, VMError},
    gas_cost,
    memory::calculate_memory_size,
    opcode_handlers::OpcodeHandler,
    utils::{size_offset_to_usize, u256_to_h256},
    vm::VM,
};

/// Implementation for the `LOGn` opcodes.
pub struct OpLogHandler<const N: usize>;
impl<const N: usize> OpcodeHandler for OpLogHandler<N> {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        if vm.msg.is_static {
            return Err(ExceptionalHalt::StaticModeViolation.into());
        }

        let [offset, size] = vm.stack.pop()?;
        let topics = vm.stack.pop::<N>()?.map(u256_to_h256);
        let (size, offset) = size_offset_to_usize(size, offset)?;

        vm.consume_gas(gas_cost::log(
            calculate_memory_size(offset, size)?,
            vm.memory.len(),
            size,
            N,
        )?)?;

        let data = vm.memory.load_range(offset, size)?;
        vm.host.emit_log(vm.msg.recipient, &data, &topics);

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}
