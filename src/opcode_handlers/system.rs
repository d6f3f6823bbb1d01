//! # System operations
//!
//! Includes the following opcodes:
//!   - `CALL`, `CALLCODE`, `DELEGATECALL`, `STATICCALL`
//!   - `CREATE`, `CREATE2`
//!   - `RETURN`, `REVERT`
//!   - `SELFDESTRUCT`
//!
//! The frame-boundary opcodes assemble a child [`Message`] and hand it to
//! the host, which runs the nested frame (usually by recursing into a fresh
//! interpreter) and returns its result synchronously. Depth and balance
//! checks that would make the child fail immediately are handled here,
//! caller-side, by pushing the failure flag without invoking the host.

use crate::{
    constants::{CALL_DEPTH_LIMIT, FAIL, INIT_CODE_MAX_SIZE, SUCCESS},
    errors::{ExceptionalHalt, ExecutionStatus, OpcodeResult, VMError},
    fork::Fork,
    gas_cost::{self, CALL_POSITIVE_VALUE, CALL_POSITIVE_VALUE_STIPEND},
    gas_schedule::GasSchedule,
    host::{CallKind, Message},
    memory::{self, calculate_memory_size},
    opcode_handlers::OpcodeHandler,
    utils::{address_to_word, size_offset_to_usize, u256_to_h256, word_to_address},
    vm::VM,
};
use bytes::Bytes;
use ethereum_types::{Address, H256, U256};

/// Implementation for the `RETURN` opcode.
pub struct OpReturnHandler;
impl OpcodeHandler for OpReturnHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let [offset, size] = vm.stack.pop()?;
        let (size, offset) = size_offset_to_usize(size, offset)?;

        let new_memory_size = calculate_memory_size(offset, size)?;
        vm.consume_gas(gas_cost::exit_opcode(new_memory_size, vm.memory.len())?)?;
        vm.memory.resize(new_memory_size)?;

        vm.set_output(offset, size);

        Ok(OpcodeResult::Halt)
    }
}

/// Implementation for the `REVERT` opcode: terminate, keep the remaining
/// gas, and hand the recorded output back as revert data.
pub struct OpRevertHandler;
impl OpcodeHandler for OpRevertHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let [offset, size] = vm.stack.pop()?;
        let (size, offset) = size_offset_to_usize(size, offset)?;

        let new_memory_size = calculate_memory_size(offset, size)?;
        vm.consume_gas(gas_cost::exit_opcode(new_memory_size, vm.memory.len())?)?;
        vm.memory.resize(new_memory_size)?;

        vm.set_output(offset, size);

        Err(VMError::RevertOpcode)
    }
}

/// Implementation for the `CALL` opcode.
pub struct OpCallHandler;
impl OpcodeHandler for OpCallHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let [gas, callee_word, value, args_offset, args_len, ret_offset, ret_len] =
            vm.stack.pop()?;
        let callee = word_to_address(callee_word);

        // Passing value along is a state change; forbidden in static frames.
        if vm.msg.is_static && !value.is_zero() {
            return Err(ExceptionalHalt::StaticModeViolation.into());
        }

        let has_value = !value.is_zero();
        let mut extra_cost = 0u64;
        if has_value {
            extra_cost += CALL_POSITIVE_VALUE;
        }
        // Bringing an account into existence is charged on top. Before
        // Spurious Dragon the charge applied to any call of a missing
        // account; after it only value transfers can create the account.
        if (has_value || vm.rev < Fork::SpuriousDragon) && !vm.host.account_exists(callee) {
            extra_cost += GasSchedule::for_fork(vm.rev).call_new_account;
        }

        vm.generic_call(
            gas,
            callee,
            extra_cost,
            has_value.then_some(CALL_POSITIVE_VALUE_STIPEND),
            Message {
                kind: CallKind::Call,
                is_static: vm.msg.is_static,
                depth: vm.msg.depth + 1,
                gas: 0, // assigned once the forwarded gas is known
                recipient: callee,
                sender: vm.msg.recipient,
                input: Bytes::new(), // assigned once memory is expanded
                value,
                code_address: callee,
                create2_salt: H256::zero(),
            },
            [args_offset, args_len, ret_offset, ret_len],
        )
    }
}

/// Implementation for the `CALLCODE` opcode: run the callee's code against
/// the current account.
pub struct OpCallCodeHandler;
impl OpcodeHandler for OpCallCodeHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let [gas, callee_word, value, args_offset, args_len, ret_offset, ret_len] =
            vm.stack.pop()?;
        let callee = word_to_address(callee_word);

        let has_value = !value.is_zero();
        let extra_cost = if has_value { CALL_POSITIVE_VALUE } else { 0 };

        vm.generic_call(
            gas,
            callee,
            extra_cost,
            has_value.then_some(CALL_POSITIVE_VALUE_STIPEND),
            Message {
                kind: CallKind::CallCode,
                is_static: vm.msg.is_static,
                depth: vm.msg.depth + 1,
                gas: 0,
                recipient: vm.msg.recipient,
                sender: vm.msg.recipient,
                input: Bytes::new(),
                value,
                code_address: callee,
                create2_salt: H256::zero(),
            },
            [args_offset, args_len, ret_offset, ret_len],
        )
    }
}

/// Implementation for the `DELEGATECALL` opcode: run the callee's code with
/// the parent's sender and value.
pub struct OpDelegateCallHandler;
impl OpcodeHandler for OpDelegateCallHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let [gas, callee_word, args_offset, args_len, ret_offset, ret_len] = vm.stack.pop()?;
        let callee = word_to_address(callee_word);

        vm.generic_call(
            gas,
            callee,
            0,
            None,
            Message {
                kind: CallKind::DelegateCall,
                is_static: vm.msg.is_static,
                depth: vm.msg.depth + 1,
                gas: 0,
                recipient: vm.msg.recipient,
                sender: vm.msg.sender,
                input: Bytes::new(),
                value: vm.msg.value,
                code_address: callee,
                create2_salt: H256::zero(),
            },
            [args_offset, args_len, ret_offset, ret_len],
        )
    }
}

/// Implementation for the `STATICCALL` opcode: a CALL without value whose
/// whole subtree runs in static mode.
pub struct OpStaticCallHandler;
impl OpcodeHandler for OpStaticCallHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let [gas, callee_word, args_offset, args_len, ret_offset, ret_len] = vm.stack.pop()?;
        let callee = word_to_address(callee_word);

        vm.generic_call(
            gas,
            callee,
            0,
            None,
            Message {
                kind: CallKind::Call,
                is_static: true,
                depth: vm.msg.depth + 1,
                gas: 0,
                recipient: callee,
                sender: vm.msg.recipient,
                input: Bytes::new(),
                value: U256::zero(),
                code_address: callee,
                create2_salt: H256::zero(),
            },
            [args_offset, args_len, ret_offset, ret_len],
        )
    }
}

/// Implementation for the `CREATE` opcode.
pub struct OpCreateHandler;
impl OpcodeHandler for OpCreateHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let [value, code_offset, code_len] = vm.stack.pop()?;
        vm.generic_create(value, code_offset, code_len, None)
    }
}

/// Implementation for the `CREATE2` opcode.
pub struct OpCreate2Handler;
impl OpcodeHandler for OpCreate2Handler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let [value, code_offset, code_len, salt] = vm.stack.pop()?;
        vm.generic_create(value, code_offset, code_len, Some(u256_to_h256(salt)))
    }
}

/// Implementation for the `SELFDESTRUCT` opcode: notify the host and halt
/// the frame successfully.
pub struct OpSelfDestructHandler;
impl OpcodeHandler for OpSelfDestructHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        if vm.msg.is_static {
            return Err(ExceptionalHalt::StaticModeViolation.into());
        }

        let beneficiary = word_to_address(vm.stack.pop1()?);

        let schedule = GasSchedule::for_fork(vm.rev);
        // SELFDESTRUCT pays the full cold-access cost; its static charge
        // never included the warm part.
        if schedule.has_access_lists && vm.account_access_was_cold(beneficiary) {
            vm.consume_gas(schedule.cold_account_access)?;
        }

        if vm.rev >= Fork::Tangerine {
            let beneficiary_missing = !vm.host.account_exists(beneficiary);
            let creates_account = if vm.rev >= Fork::SpuriousDragon {
                beneficiary_missing && !vm.host.get_balance(vm.msg.recipient).is_zero()
            } else {
                beneficiary_missing
            };
            if creates_account {
                vm.consume_gas(schedule.selfdestruct_new_account)?;
            }
        }

        vm.host.selfdestruct(vm.msg.recipient, beneficiary);

        Ok(OpcodeResult::Halt)
    }
}

impl VM<'_, '_> {
    /// Shared tail of the CALL family.
    ///
    /// `child_msg` arrives fully shaped except for its gas and input, which
    /// depend on charges applied here: memory expansion for the argument and
    /// return slices, the cold-access surcharge for the callee, the caller's
    /// `extra_cost` (value transfer, account creation), and finally the
    /// forwarded gas itself. The optional `stipend` is added to the child's
    /// allowance without being charged to the caller.
    #[allow(clippy::too_many_arguments)]
    fn generic_call(
        &mut self,
        gas_requested: U256,
        callee: Address,
        extra_cost: u64,
        stipend: Option<u64>,
        mut child_msg: Message,
        [args_offset, args_len, ret_offset, ret_len]: [U256; 4],
    ) -> Result<OpcodeResult, VMError> {
        let (args_len, args_offset) = size_offset_to_usize(args_len, args_offset)?;
        let (ret_len, ret_offset) = size_offset_to_usize(ret_len, ret_offset)?;

        let new_memory_size = calculate_memory_size(args_offset, args_len)?
            .max(calculate_memory_size(ret_offset, ret_len)?);
        self.consume_gas(memory::expansion_cost(new_memory_size, self.memory.len())?)?;

        let cold_cost = self.cold_account_cost(callee);
        self.consume_gas(cold_cost)?;
        self.consume_gas(extra_cost)?;

        let forwarded_gas =
            gas_cost::forwarded_call_gas(gas_requested, self.gas_left_u64(), self.rev)?;

        // Expand now; the return region must exist before the child runs.
        self.memory.resize(new_memory_size)?;
        self.return_data = Bytes::new();

        // Failures the caller resolves itself: the child's whole allowance
        // stays with the caller, exactly as if the child returned it.
        if child_msg.depth > CALL_DEPTH_LIMIT {
            self.stack.push(FAIL)?;
            return Ok(OpcodeResult::Continue { pc_increment: 1 });
        }
        if !child_msg.value.is_zero()
            && child_msg.kind != CallKind::DelegateCall
            && self.host.get_balance(self.msg.recipient) < child_msg.value
        {
            self.stack.push(FAIL)?;
            return Ok(OpcodeResult::Continue { pc_increment: 1 });
        }

        self.consume_gas(forwarded_gas)?;
        let child_gas = forwarded_gas + stipend.unwrap_or(0);

        child_msg.gas = i64::try_from(child_gas).map_err(|_| ExceptionalHalt::OutOfGas)?;
        child_msg.input = Bytes::from(self.memory.load_range(args_offset, args_len)?);

        let result = self.host.call(child_msg);

        // Unused child gas flows back; a child that failed outright has
        // nothing left to return.
        self.gas_left += result.gas_left.clamp(0, child_msg_gas(child_gas));
        self.return_data = result.output.clone();

        let copy_len = ret_len.min(result.output.len());
        if copy_len != 0 {
            self.memory.store_data(ret_offset, &result.output[..copy_len])?;
        }

        self.stack.push(if result.status.is_success() {
            SUCCESS
        } else {
            FAIL
        })?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    /// Shared implementation of CREATE and CREATE2.
    fn generic_create(
        &mut self,
        value: U256,
        code_offset: U256,
        code_len: U256,
        salt: Option<H256>,
    ) -> Result<OpcodeResult, VMError> {
        if self.msg.is_static {
            return Err(ExceptionalHalt::StaticModeViolation.into());
        }

        let (code_len, code_offset) = size_offset_to_usize(code_len, code_offset)?;

        // EIP-3860: init code is capped from Shanghai onward.
        if self.rev >= Fork::Shanghai && code_len > INIT_CODE_MAX_SIZE {
            return Err(ExceptionalHalt::OutOfGas.into());
        }

        let new_memory_size = calculate_memory_size(code_offset, code_len)?;
        self.consume_gas(memory::expansion_cost(new_memory_size, self.memory.len())?)?;
        self.consume_gas(gas_cost::init_code_cost(code_len, self.rev)?)?;
        if salt.is_some() {
            self.consume_gas(gas_cost::create2_hash_cost(code_len)?)?;
        }

        let init_code = Bytes::from(self.memory.load_range(code_offset, code_len)?);
        self.return_data = Bytes::new();

        if self.msg.depth + 1 > CALL_DEPTH_LIMIT
            || self.host.get_balance(self.msg.recipient) < value
        {
            self.stack.push(FAIL)?;
            return Ok(OpcodeResult::Continue { pc_increment: 1 });
        }

        let child_gas = gas_cost::max_message_call_gas(self.gas_left_u64(), self.rev);
        self.consume_gas(child_gas)?;

        let child_msg = Message {
            kind: if salt.is_some() {
                CallKind::Create2
            } else {
                CallKind::Create
            },
            is_static: false,
            depth: self.msg.depth + 1,
            gas: i64::try_from(child_gas).map_err(|_| ExceptionalHalt::OutOfGas)?,
            // The host derives the new account's address (it owns the
            // deployer's nonce) and reports it in the result.
            recipient: Address::zero(),
            sender: self.msg.recipient,
            input: init_code,
            value,
            code_address: Address::zero(),
            create2_salt: salt.unwrap_or_default(),
        };

        let result = self.host.call(child_msg);

        self.gas_left += result.gas_left.clamp(0, child_msg_gas(child_gas));
        // Only revert data is observable after a CREATE (EIP-211).
        if result.status == ExecutionStatus::Revert {
            self.return_data = result.output.clone();
        }

        match result.create_address {
            Some(address) if result.is_success() => self.stack.push(address_to_word(address))?,
            _ => self.stack.push(FAIL)?,
        }

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

fn child_msg_gas(child_gas: u64) -> i64 {
    i64::try_from(child_gas).unwrap_or(i64::MAX)
}
