//! # Environmental information operations
//!
//! Includes the following opcodes:
//!   - `ADDRESS`, `ORIGIN`, `CALLER`, `CALLVALUE`, `GASPRICE`
//!   - `CALLDATALOAD`, `CALLDATASIZE`, `CALLDATACOPY`
//!   - `CODESIZE`, `CODECOPY`
//!   - `EXTCODESIZE`, `EXTCODECOPY`, `EXTCODEHASH`
//!   - `RETURNDATASIZE`, `RETURNDATACOPY`

use crate::{
    errors::{ExceptionalHalt, OpcodeResult, VMError},
    gas_cost,
    memory::calculate_memory_size,
    opcode_handlers::OpcodeHandler,
    utils::{address_to_word, copy_padded, h256_to_u256, size_offset_to_usize, word_to_address},
    vm::VM,
};
use ethereum_types::U256;

/// Implementation for the `ADDRESS` opcode: the account this frame acts on.
pub struct OpAddressHandler;
impl OpcodeHandler for OpAddressHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        vm.stack.push(address_to_word(vm.msg.recipient))?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `BALANCE` opcode.
pub struct OpBalanceHandler;
impl OpcodeHandler for OpBalanceHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let address = word_to_address(vm.stack.pop1()?);
        let cold_cost = vm.cold_account_cost(address);
        vm.consume_gas(cold_cost)?;

        let balance = vm.host.get_balance(address);
        vm.stack.push(balance)?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `ORIGIN` opcode: the transaction sender.
pub struct OpOriginHandler;
impl OpcodeHandler for OpOriginHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let origin = vm.host.get_tx_context().origin;
        vm.stack.push(address_to_word(origin))?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `CALLER` opcode.
pub struct OpCallerHandler;
impl OpcodeHandler for OpCallerHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        vm.stack.push(address_to_word(vm.msg.sender))?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `CALLVALUE` opcode.
pub struct OpCallValueHandler;
impl OpcodeHandler for OpCallValueHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        vm.stack.push(vm.msg.value)?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `CALLDATALOAD` opcode: a 32-byte word of input,
/// zero-padded past the end.
pub struct OpCallDataLoadHandler;
impl OpcodeHandler for OpCallDataLoadHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let offset = vm.stack.pop1()?;
        let word = copy_padded(&vm.msg.input, offset, 32);
        vm.stack.push(U256::from_big_endian(&word))?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `CALLDATASIZE` opcode.
pub struct OpCallDataSizeHandler;
impl OpcodeHandler for OpCallDataSizeHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        vm.stack.push(vm.msg.input.len().into())?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `CALLDATACOPY` opcode. Reads past the end of the
/// input copy zeros.
pub struct OpCallDataCopyHandler;
impl OpcodeHandler for OpCallDataCopyHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let [dest_offset, data_offset, size] = vm.stack.pop()?;
        let (size, dest_offset) = size_offset_to_usize(size, dest_offset)?;

        vm.consume_gas(gas_cost::calldatacopy(
            calculate_memory_size(dest_offset, size)?,
            vm.memory.len(),
            size,
        )?)?;

        let data = copy_padded(&vm.msg.input, data_offset, size);
        vm.memory.store_data(dest_offset, &data)?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `CODESIZE` opcode: size of the unpadded code.
pub struct OpCodeSizeHandler;
impl OpcodeHandler for OpCodeSizeHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        vm.stack.push(vm.analysis.code_len().into())?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `CODECOPY` opcode.
pub struct OpCodeCopyHandler;
impl OpcodeHandler for OpCodeCopyHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let [dest_offset, code_offset, size] = vm.stack.pop()?;
        let (size, dest_offset) = size_offset_to_usize(size, dest_offset)?;

        vm.consume_gas(gas_cost::codecopy(
            calculate_memory_size(dest_offset, size)?,
            vm.memory.len(),
            size,
        )?)?;

        let data = copy_padded(vm.analysis.code(), code_offset, size);
        vm.memory.store_data(dest_offset, &data)?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `GASPRICE` opcode.
pub struct OpGasPriceHandler;
impl OpcodeHandler for OpGasPriceHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let gas_price = vm.host.get_tx_context().gas_price;
        vm.stack.push(gas_price)?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `EXTCODESIZE` opcode.
pub struct OpExtCodeSizeHandler;
impl OpcodeHandler for OpExtCodeSizeHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let address = word_to_address(vm.stack.pop1()?);
        let cold_cost = vm.cold_account_cost(address);
        vm.consume_gas(cold_cost)?;

        let code_size = vm.host.get_code_size(address);
        vm.stack.push(code_size.into())?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `EXTCODECOPY` opcode. The host reports how much
/// code it could copy; the remainder of the destination is zero-filled.
pub struct OpExtCodeCopyHandler;
impl OpcodeHandler for OpExtCodeCopyHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let [address_word, dest_offset, code_offset, size] = vm.stack.pop()?;
        let address = word_to_address(address_word);
        let (size, dest_offset) = size_offset_to_usize(size, dest_offset)?;

        let address_was_cold = vm.account_access_was_cold(address);
        vm.consume_gas(gas_cost::extcodecopy(
            calculate_memory_size(dest_offset, size)?,
            vm.memory.len(),
            size,
            address_was_cold,
            vm.rev,
        )?)?;

        if size != 0 {
            let mut buffer = vec![0u8; size];
            // An offset past the code just copies zeros.
            let code_offset = usize::try_from(code_offset).unwrap_or(usize::MAX);
            vm.host.copy_code(address, code_offset, &mut buffer);
            vm.memory.store_data(dest_offset, &buffer)?;
        }

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `RETURNDATASIZE` opcode.
pub struct OpReturnDataSizeHandler;
impl OpcodeHandler for OpReturnDataSizeHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        vm.stack.push(vm.return_data.len().into())?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `RETURNDATACOPY` opcode. Unlike the other copies,
/// reading past the end of the buffer is a hard failure (EIP-211).
pub struct OpReturnDataCopyHandler;
impl OpcodeHandler for OpReturnDataCopyHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let [dest_offset, data_offset, size] = vm.stack.pop()?;
        let (size, dest_offset) = size_offset_to_usize(size, dest_offset)?;

        vm.consume_gas(gas_cost::returndatacopy(
            calculate_memory_size(dest_offset, size)?,
            vm.memory.len(),
            size,
        )?)?;

        // The bounds check applies even to zero-size copies, so it uses the
        // unnarrowed source offset.
        let data_end = data_offset
            .checked_add(size.into())
            .ok_or(ExceptionalHalt::InvalidMemoryAccess)?;
        if data_end > U256::from(vm.return_data.len()) {
            return Err(ExceptionalHalt::InvalidMemoryAccess.into());
        }

        if size != 0 {
            let data_offset = usize::try_from(data_offset)
                .map_err(|_| ExceptionalHalt::InvalidMemoryAccess)?;
            let data = vm.return_data.slice(data_offset..data_offset + size);
            vm.memory.store_data(dest_offset, &data)?;
        }

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `EXTCODEHASH` opcode (EIP-1052).
pub struct OpExtCodeHashHandler;
impl OpcodeHandler for OpExtCodeHashHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let address = word_to_address(vm.stack.pop1()?);
        let cold_cost = vm.cold_account_cost(address);
        vm.consume_gas(cold_cost)?;

        let code_hash = vm.host.get_code_hash(address);
        vm.stack.push(h256_to_u256(code_hash))?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}
