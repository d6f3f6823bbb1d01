//! # Push operations
//!
//! Includes the following opcodes:
//!   - `PUSH0` (Shanghai, EIP-3855)
//!   - `PUSH1` to `PUSH32`

use crate::{
    errors::{OpcodeResult, VMError},
    opcode_handlers::OpcodeHandler,
    vm::VM,
};
use ethereum_types::U256;

/// Implementation for the `PUSHn` opcodes, monomorphized per immediate size.
///
/// The immediate is read from the padded code buffer, so a PUSH truncated by
/// the end of the code sees its missing bytes as zeros and the read can
/// never run out of bounds.
pub struct OpPushHandler<const N: usize>;
impl<const N: usize> OpcodeHandler for OpPushHandler<N> {
    #[inline(always)]
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let start = vm.pc.wrapping_add(1);
        let value = vm
            .analysis
            .padded_code()
            .get(start..start.wrapping_add(N))
            .map(U256::from_big_endian)
            .unwrap_or_default();
        vm.stack.push(value)?;

        // Skip the immediate bytes along with the opcode itself.
        Ok(OpcodeResult::Continue {
            pc_increment: N.wrapping_add(1),
        })
    }
}

/// Implementation for the `PUSH0` opcode.
pub struct OpPush0Handler;
impl OpcodeHandler for OpPush0Handler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        vm.stack.push_zero()?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}
