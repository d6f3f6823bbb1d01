//! # Block information operations
//!
//! Includes the following opcodes:
//!   - `BLOCKHASH`
//!   - `COINBASE`
//!   - `TIMESTAMP`
//!   - `NUMBER`
//!   - `PREVRANDAO` (DIFFICULTY before the merge)
//!   - `GASLIMIT`
//!   - `CHAINID`
//!   - `SELFBALANCE`
//!   - `BASEFEE`

use crate::{
    constants::LAST_AVAILABLE_BLOCK_LIMIT,
    errors::{OpcodeResult, VMError},
    opcode_handlers::OpcodeHandler,
    utils::{address_to_word, h256_to_u256},
    vm::VM,
};
use ethereum_types::H256;

/// Implementation for the `BLOCKHASH` opcode: the hash of one of the 256
/// most recent blocks, or zero outside that window.
pub struct OpBlockHashHandler;
impl OpcodeHandler for OpBlockHashHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let block_number = vm.stack.pop1()?;
        let current_block = vm.host.get_tx_context().block_number;

        let hash = match u64::try_from(block_number) {
            Ok(n) if n < current_block && current_block - n <= LAST_AVAILABLE_BLOCK_LIMIT => {
                vm.host.get_block_hash(n)
            }
            _ => H256::zero(),
        };
        vm.stack.push(h256_to_u256(hash))?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `COINBASE` opcode.
pub struct OpCoinbaseHandler;
impl OpcodeHandler for OpCoinbaseHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let coinbase = vm.host.get_tx_context().coinbase;
        vm.stack.push(address_to_word(coinbase))?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `TIMESTAMP` opcode.
pub struct OpTimestampHandler;
impl OpcodeHandler for OpTimestampHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let timestamp = vm.host.get_tx_context().timestamp;
        vm.stack.push(timestamp.into())?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `NUMBER` opcode.
pub struct OpNumberHandler;
impl OpcodeHandler for OpNumberHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let block_number = vm.host.get_tx_context().block_number;
        vm.stack.push(block_number.into())?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `PREVRANDAO` opcode. The host supplies the beacon
/// randomness post-merge and the block difficulty before it.
pub struct OpPrevRandaoHandler;
impl OpcodeHandler for OpPrevRandaoHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let prev_randao = vm.host.get_tx_context().prev_randao;
        vm.stack.push(prev_randao)?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `GASLIMIT` opcode.
pub struct OpGasLimitHandler;
impl OpcodeHandler for OpGasLimitHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let gas_limit = vm.host.get_tx_context().gas_limit;
        vm.stack.push(gas_limit.into())?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `CHAINID` opcode.
pub struct OpChainIdHandler;
impl OpcodeHandler for OpChainIdHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let chain_id = vm.host.get_tx_context().chain_id;
        vm.stack.push(chain_id)?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `SELFBALANCE` opcode: the executing account's
/// balance, without the account-access charge BALANCE pays.
pub struct OpSelfBalanceHandler;
impl OpcodeHandler for OpSelfBalanceHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let balance = vm.host.get_balance(vm.msg.recipient);
        vm.stack.push(balance)?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `BASEFEE` opcode (EIP-3198).
pub struct OpBaseFeeHandler;
impl OpcodeHandler for OpBaseFeeHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let base_fee = vm.host.get_tx_context().base_fee;
        vm.stack.push(base_fee)?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}
