//! # Stack, memory, storage and control-flow operations
//!
//! Includes the following opcodes:
//!   - `POP`, `PC`, `GAS`
//!   - `MLOAD`, `MSTORE`, `MSTORE8`, `MCOPY`, `MSIZE`
//!   - `SLOAD`, `SSTORE`
//!   - `JUMP`, `JUMPI`, `JUMPDEST`

use crate::{
    constants::WORD_SIZE_IN_BYTES_USIZE,
    errors::{ExceptionalHalt, OpcodeResult, VMError},
    fork::Fork,
    gas_cost::{self, SSTORE_STIPEND},
    memory::{calculate_memory_size, expansion_cost},
    opcode_handlers::OpcodeHandler,
    utils::{h256_to_u256, size_offset_to_usize, u256_to_h256, u256_to_usize},
    vm::VM,
};

/// Implementation for the `POP` opcode.
pub struct OpPopHandler;
impl OpcodeHandler for OpPopHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        vm.stack.pop1()?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `PC` opcode: the offset of this instruction.
pub struct OpPcHandler;
impl OpcodeHandler for OpPcHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        vm.stack.push(vm.pc.into())?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `GAS` opcode: the gas remaining after this
/// opcode's own charge.
pub struct OpGasHandler;
impl OpcodeHandler for OpGasHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        vm.stack.push(vm.gas_left_u64().into())?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `MLOAD` opcode.
pub struct OpMLoadHandler;
impl OpcodeHandler for OpMLoadHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let offset = u256_to_usize(vm.stack.pop1()?)?;
        vm.consume_gas(expansion_cost(
            calculate_memory_size(offset, WORD_SIZE_IN_BYTES_USIZE)?,
            vm.memory.len(),
        )?)?;

        let word = vm.memory.load_word(offset)?;
        vm.stack.push(word)?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `MSTORE` opcode.
pub struct OpMStoreHandler;
impl OpcodeHandler for OpMStoreHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let [offset, value] = vm.stack.pop()?;
        let offset = u256_to_usize(offset)?;

        vm.consume_gas(expansion_cost(
            calculate_memory_size(offset, WORD_SIZE_IN_BYTES_USIZE)?,
            vm.memory.len(),
        )?)?;

        vm.memory.store_word(offset, value)?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `MSTORE8` opcode: store the low byte of the word.
pub struct OpMStore8Handler;
impl OpcodeHandler for OpMStore8Handler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let [offset, value] = vm.stack.pop()?;
        let offset = u256_to_usize(offset)?;

        vm.consume_gas(expansion_cost(
            calculate_memory_size(offset, 1)?,
            vm.memory.len(),
        )?)?;

        vm.memory.store_data(offset, &[value.byte(0)])?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `MCOPY` opcode (EIP-5656): overlap-safe copy
/// inside memory.
pub struct OpMCopyHandler;
impl OpcodeHandler for OpMCopyHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let [dest_offset, src_offset, size] = vm.stack.pop()?;
        let (size, dest_offset) = size_offset_to_usize(size, dest_offset)?;
        let src_offset = if size == 0 {
            0
        } else {
            u256_to_usize(src_offset)?
        };

        // Both the source and destination ranges must be paid for.
        let new_memory_size = calculate_memory_size(dest_offset, size)?
            .max(calculate_memory_size(src_offset, size)?);
        vm.consume_gas(gas_cost::mcopy(new_memory_size, vm.memory.len(), size)?)?;

        vm.memory.copy_within(src_offset, dest_offset, size)?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `MSIZE` opcode.
pub struct OpMSizeHandler;
impl OpcodeHandler for OpMSizeHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        vm.stack.push(vm.memory.len().into())?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `SLOAD` opcode.
pub struct OpSLoadHandler;
impl OpcodeHandler for OpSLoadHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let key = u256_to_h256(vm.stack.pop1()?);

        let cold_cost = vm.cold_storage_cost(vm.msg.recipient, key);
        vm.consume_gas(cold_cost)?;

        let value = vm.host.get_storage(vm.msg.recipient, key);
        vm.stack.push(h256_to_u256(value))?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `SSTORE` opcode. The whole cost is dynamic: it
/// depends on how the write changes the slot, which only the host knows.
pub struct OpSStoreHandler;
impl OpcodeHandler for OpSStoreHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        if vm.msg.is_static {
            return Err(ExceptionalHalt::StaticModeViolation.into());
        }

        // EIP-2200: abort when at or below the stipend, so a CALL's 2300
        // gift can never write storage.
        if vm.rev >= Fork::Istanbul && vm.gas_left <= SSTORE_STIPEND {
            return Err(ExceptionalHalt::OutOfGas.into());
        }

        let [key, value] = vm.stack.pop()?;
        let key = u256_to_h256(key);

        let storage_slot_was_cold = vm.storage_access_was_cold(vm.msg.recipient, key);
        let storage_status = vm
            .host
            .set_storage(vm.msg.recipient, key, u256_to_h256(value));

        vm.consume_gas(gas_cost::sstore(
            storage_status,
            storage_slot_was_cold,
            vm.rev,
        )?)?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `JUMP` opcode.
pub struct OpJumpHandler;
impl OpcodeHandler for OpJumpHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let target = vm.stack.pop1()?;
        jump(vm, target.try_into().unwrap_or(usize::MAX))?;

        Ok(OpcodeResult::Continue { pc_increment: 0 })
    }
}

/// Implementation for the `JUMPI` opcode.
pub struct OpJumpIHandler;
impl OpcodeHandler for OpJumpIHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let [target, condition] = vm.stack.pop()?;
        if condition.is_zero() {
            return Ok(OpcodeResult::Continue { pc_increment: 1 });
        }
        jump(vm, target.try_into().unwrap_or(usize::MAX))?;

        Ok(OpcodeResult::Continue { pc_increment: 0 })
    }
}

/// Implementation for the `JUMPDEST` opcode: a no-op marker; its gas was
/// already charged by the dispatch loop.
pub struct OpJumpDestHandler;
impl OpcodeHandler for OpJumpDestHandler {
    fn eval(_vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Move the program counter to `target` if the analysis marked it as a
/// reachable `JUMPDEST`; the `JUMPDEST` itself is dispatched (and charged)
/// next.
fn jump(vm: &mut VM<'_, '_>, target: usize) -> Result<(), VMError> {
    if vm.analysis.is_valid_jump_target(target) {
        vm.pc = target;
        Ok(())
    } else {
        Err(ExceptionalHalt::BadJumpDestination.into())
    }
}
