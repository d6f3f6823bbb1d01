//! The frame state and dispatch loop.
//!
//! A [`VM`] is one frame: its stack, memory, program counter and gas,
//! borrowing the message, the code analysis and the host for its lifetime.
//! The loop dispatches the byte under the program counter after the
//! centralized pre-checks (undefined opcode, static gas, stack bounds) and
//! keeps going until a handler halts or fails; the padded code's trailing
//! STOP guarantees termination.

use crate::{
    analysis::CodeAnalysis,
    constants::STACK_LIMIT,
    errors::{ExceptionalHalt, ExecutionResult, ExecutionStatus, OpcodeResult, VMError},
    fork::Fork,
    gas_schedule::GasSchedule,
    host::{AccessStatus, Host, Message},
    instruction_table::{instruction_table, UNDEFINED},
    memory::Memory,
    opcode_handlers::{
        arithmetic::*, bitwise_comparison::*, block::*, dup::*, environment::*, exchange::*,
        keccak::*, logging::*, push::*, stack_memory_storage_flow::*, system::*, OpInvalidHandler,
        OpStopHandler, OpcodeHandler,
    },
    opcodes::Opcode,
    stack::Stack,
    tracing::{InstructionView, Tracer},
};
use bytes::Bytes;
use ethereum_types::{Address, H256};

/// Execution state of a single frame.
pub struct VM<'a, 'b> {
    pub gas_left: i64,
    pub stack: Stack,
    pub memory: Memory,
    pub pc: usize,
    pub msg: &'b Message,
    pub rev: Fork,
    pub host: &'a mut dyn Host,
    pub analysis: &'b CodeAnalysis,
    /// Output of the most recent child frame.
    pub return_data: Bytes,
    output_offset: usize,
    output_size: usize,
    tracer: Option<&'a mut dyn Tracer>,
}

impl<'a, 'b> VM<'a, 'b> {
    pub fn new(
        host: &'a mut dyn Host,
        rev: Fork,
        msg: &'b Message,
        analysis: &'b CodeAnalysis,
        tracer: Option<&'a mut dyn Tracer>,
    ) -> Self {
        VM {
            gas_left: msg.gas,
            stack: Stack::default(),
            memory: Memory::new(),
            pc: 0,
            msg,
            rev,
            host,
            analysis,
            return_data: Bytes::new(),
            output_offset: 0,
            output_size: 0,
            tracer,
        }
    }

    /// Run the frame to completion and materialize its result.
    pub fn run(&mut self) -> ExecutionResult {
        if let Some(tracer) = &mut self.tracer {
            tracer.on_execution_start(self.rev, self.msg, self.analysis.code());
        }

        let table = instruction_table(self.rev);

        let status = loop {
            let op = self
                .analysis
                .padded_code()
                .get(self.pc)
                .copied()
                .unwrap_or(Opcode::STOP as u8);

            // The padding STOPs are an implementation detail; observers only
            // see instructions of the original code.
            if self.tracer.is_some() && self.pc < self.analysis.code_len() {
                let view = InstructionView {
                    pc: self.pc,
                    opcode: op,
                    gas_left: self.gas_left,
                    depth: self.msg.depth,
                    stack: self.stack.as_slice(),
                    memory_size: self.memory.len(),
                };
                if let Some(tracer) = &mut self.tracer {
                    tracer.on_instruction_start(view);
                }
            }

            let metrics = &table[usize::from(op)];
            if metrics.gas_cost == UNDEFINED {
                break ExecutionStatus::InvalidInstruction;
            }

            self.gas_left -= i64::from(metrics.gas_cost);
            if self.gas_left < 0 {
                break ExecutionStatus::OutOfGas;
            }

            let stack_size = self.stack.len();
            if stack_size == STACK_LIMIT {
                if metrics.can_overflow_stack {
                    break ExecutionStatus::StackOverflow;
                }
            } else if stack_size < usize::from(metrics.stack_required) {
                break ExecutionStatus::StackUnderflow;
            }

            match self.execute_opcode(Opcode::from(op)) {
                Ok(OpcodeResult::Continue { pc_increment }) => {
                    self.pc = self.pc.wrapping_add(pc_increment);
                }
                Ok(OpcodeResult::Halt) => break ExecutionStatus::Success,
                Err(VMError::RevertOpcode) => break ExecutionStatus::Revert,
                Err(VMError::Halt(halt)) => break halt.into(),
            }
        };

        let gas_left = if status.preserves_gas() {
            self.gas_left
        } else {
            0
        };
        let output = if self.output_size != 0 {
            Bytes::copy_from_slice(self.memory.slice(self.output_offset, self.output_size))
        } else {
            Bytes::new()
        };

        let result = ExecutionResult {
            status,
            gas_left,
            output,
            create_address: None,
        };

        if let Some(tracer) = &mut self.tracer {
            tracer.on_execution_end(&result);
        }

        result
    }

    fn execute_opcode(&mut self, opcode: Opcode) -> Result<OpcodeResult, VMError> {
        match opcode {
            Opcode::STOP => OpStopHandler::eval(self),
            Opcode::ADD => OpAddHandler::eval(self),
            Opcode::MUL => OpMulHandler::eval(self),
            Opcode::SUB => OpSubHandler::eval(self),
            Opcode::DIV => OpDivHandler::eval(self),
            Opcode::SDIV => OpSDivHandler::eval(self),
            Opcode::MOD => OpModHandler::eval(self),
            Opcode::SMOD => OpSModHandler::eval(self),
            Opcode::ADDMOD => OpAddModHandler::eval(self),
            Opcode::MULMOD => OpMulModHandler::eval(self),
            Opcode::EXP => OpExpHandler::eval(self),
            Opcode::SIGNEXTEND => OpSignExtendHandler::eval(self),
            Opcode::LT => OpLtHandler::eval(self),
            Opcode::GT => OpGtHandler::eval(self),
            Opcode::SLT => OpSltHandler::eval(self),
            Opcode::SGT => OpSgtHandler::eval(self),
            Opcode::EQ => OpEqHandler::eval(self),
            Opcode::ISZERO => OpIsZeroHandler::eval(self),
            Opcode::AND => OpAndHandler::eval(self),
            Opcode::OR => OpOrHandler::eval(self),
            Opcode::XOR => OpXorHandler::eval(self),
            Opcode::NOT => OpNotHandler::eval(self),
            Opcode::BYTE => OpByteHandler::eval(self),
            Opcode::SHL => OpShlHandler::eval(self),
            Opcode::SHR => OpShrHandler::eval(self),
            Opcode::SAR => OpSarHandler::eval(self),
            Opcode::KECCAK256 => OpKeccak256Handler::eval(self),
            Opcode::ADDRESS => OpAddressHandler::eval(self),
            Opcode::BALANCE => OpBalanceHandler::eval(self),
            Opcode::ORIGIN => OpOriginHandler::eval(self),
            Opcode::CALLER => OpCallerHandler::eval(self),
            Opcode::CALLVALUE => OpCallValueHandler::eval(self),
            Opcode::CALLDATALOAD => OpCallDataLoadHandler::eval(self),
            Opcode::CALLDATASIZE => OpCallDataSizeHandler::eval(self),
            Opcode::CALLDATACOPY => OpCallDataCopyHandler::eval(self),
            Opcode::CODESIZE => OpCodeSizeHandler::eval(self),
            Opcode::CODECOPY => OpCodeCopyHandler::eval(self),
            Opcode::GASPRICE => OpGasPriceHandler::eval(self),
            Opcode::EXTCODESIZE => OpExtCodeSizeHandler::eval(self),
            Opcode::EXTCODECOPY => OpExtCodeCopyHandler::eval(self),
            Opcode::RETURNDATASIZE => OpReturnDataSizeHandler::eval(self),
            Opcode::RETURNDATACOPY => OpReturnDataCopyHandler::eval(self),
            Opcode::EXTCODEHASH => OpExtCodeHashHandler::eval(self),
            Opcode::BLOCKHASH => OpBlockHashHandler::eval(self),
            Opcode::COINBASE => OpCoinbaseHandler::eval(self),
            Opcode::TIMESTAMP => OpTimestampHandler::eval(self),
            Opcode::NUMBER => OpNumberHandler::eval(self),
            Opcode::PREVRANDAO => OpPrevRandaoHandler::eval(self),
            Opcode::GASLIMIT => OpGasLimitHandler::eval(self),
            Opcode::CHAINID => OpChainIdHandler::eval(self),
            Opcode::SELFBALANCE => OpSelfBalanceHandler::eval(self),
            Opcode::BASEFEE => OpBaseFeeHandler::eval(self),
            Opcode::POP => OpPopHandler::eval(self),
            Opcode::MLOAD => OpMLoadHandler::eval(self),
            Opcode::MSTORE => OpMStoreHandler::eval(self),
            Opcode::MSTORE8 => OpMStore8Handler::eval(self),
            Opcode::SLOAD => OpSLoadHandler::eval(self),
            Opcode::SSTORE => OpSStoreHandler::eval(self),
            Opcode::JUMP => OpJumpHandler::eval(self),
            Opcode::JUMPI => OpJumpIHandler::eval(self),
            Opcode::PC => OpPcHandler::eval(self),
            Opcode::MSIZE => OpMSizeHandler::eval(self),
            Opcode::GAS => OpGasHandler::eval(self),
            Opcode::JUMPDEST => OpJumpDestHandler::eval(self),
            Opcode::MCOPY => OpMCopyHandler::eval(self),
            Opcode::PUSH0 => OpPush0Handler::eval(self),
            Opcode::PUSH1 => OpPushHandler::<1>::eval(self),
            Opcode::PUSH2 => OpPushHandler::<2>::eval(self),
            Opcode::PUSH3 => OpPushHandler::<3>::eval(self),
            Opcode::PUSH4 => OpPushHandler::<4>::eval(self),
            Opcode::PUSH5 => OpPushHandler::<5>::eval(self),
            Opcode::PUSH6 => OpPushHandler::<6>::eval(self),
            Opcode::PUSH7 => OpPushHandler::<7>::eval(self),
            Opcode::PUSH8 => OpPushHandler::<8>::eval(self),
            Opcode::PUSH9 => OpPushHandler::<9>::eval(self),
            Opcode::PUSH10 => OpPushHandler::<10>::eval(self),
            Opcode::PUSH11 => OpPushHandler::<11>::eval(self),
            Opcode::PUSH12 => OpPushHandler::<12>::eval(self),
            Opcode::PUSH13 => OpPushHandler::<13>::eval(self),
            Opcode::PUSH14 => OpPushHandler::<14>::eval(self),
            Opcode::PUSH15 => OpPushHandler::<15>::eval(self),
            Opcode::PUSH16 => OpPushHandler::<16>::eval(self),
            Opcode::PUSH17 => OpPushHandler::<17>::eval(self),
            Opcode::PUSH18 => OpPushHandler::<18>::eval(self),
            Opcode::PUSH19 => OpPushHandler::<19>::eval(self),
            Opcode::PUSH20 => OpPushHandler::<20>::eval(self),
            Opcode::PUSH21 => OpPushHandler::<21>::eval(self),
            Opcode::PUSH22 => OpPushHandler::<22>::eval(self),
            Opcode::PUSH23 => OpPushHandler::<23>::eval(self),
            Opcode::PUSH24 => OpPushHandler::<24>::eval(self),
            Opcode::PUSH25 => OpPushHandler::<25>::eval(self),
            Opcode::PUSH26 => OpPushHandler::<26>::eval(self),
            Opcode::PUSH27 => OpPushHandler::<27>::eval(self),
            Opcode::PUSH28 => OpPushHandler::<28>::eval(self),
            Opcode::PUSH29 => OpPushHandler::<29>::eval(self),
            Opcode::PUSH30 => OpPushHandler::<30>::eval(self),
            Opcode::PUSH31 => OpPushHandler::<31>::eval(self),
            Opcode::PUSH32 => OpPushHandler::<32>::eval(self),
            Opcode::DUP1 => OpDupHandler::<1>::eval(self),
            Opcode::DUP2 => OpDupHandler::<2>::eval(self),
            Opcode::DUP3 => OpDupHandler::<3>::eval(self),
            Opcode::DUP4 => OpDupHandler::<4>::eval(self),
            Opcode::DUP5 => OpDupHandler::<5>::eval(self),
            Opcode::DUP6 => OpDupHandler::<6>::eval(self),
            Opcode::DUP7 => OpDupHandler::<7>::eval(self),
            Opcode::DUP8 => OpDupHandler::<8>::eval(self),
            Opcode::DUP9 => OpDupHandler::<9>::eval(self),
            Opcode::DUP10 => OpDupHandler::<10>::eval(self),
            Opcode::DUP11 => OpDupHandler::<11>::eval(self),
            Opcode::DUP12 => OpDupHandler::<12>::eval(self),
            Opcode::DUP13 => OpDupHandler::<13>::eval(self),
            Opcode::DUP14 => OpDupHandler::<14>::eval(self),
            Opcode::DUP15 => OpDupHandler::<15>::eval(self),
            Opcode::DUP16 => OpDupHandler::<16>::eval(self),
            Opcode::SWAP1 => OpSwapHandler::<1>::eval(self),
            Opcode::SWAP2 => OpSwapHandler::<2>::eval(self),
            Opcode::SWAP3 => OpSwapHandler::<3>::eval(self),
            Opcode::SWAP4 => OpSwapHandler::<4>::eval(self),
            Opcode::SWAP5 => OpSwapHandler::<5>::eval(self),
            Opcode::SWAP6 => OpSwapHandler::<6>::eval(self),
            Opcode::SWAP7 => OpSwapHandler::<7>::eval(self),
            Opcode::SWAP8 => OpSwapHandler::<8>::eval(self),
            Opcode::SWAP9 => OpSwapHandler::<9>::eval(self),
            Opcode::SWAP10 => OpSwapHandler::<10>::eval(self),
            Opcode::SWAP11 => OpSwapHandler::<11>::eval(self),
            Opcode::SWAP12 => OpSwapHandler::<12>::eval(self),
            Opcode::SWAP13 => OpSwapHandler::<13>::eval(self),
            Opcode::SWAP14 => OpSwapHandler::<14>::eval(self),
            Opcode::SWAP15 => OpSwapHandler::<15>::eval(self),
            Opcode::SWAP16 => OpSwapHandler::<16>::eval(self),
            Opcode::LOG0 => OpLogHandler::<0>::eval(self),
            Opcode::LOG1 => OpLogHandler::<1>::eval(self),
            Opcode::LOG2 => OpLogHandler::<2>::eval(self),
            Opcode::LOG3 => OpLogHandler::<3>::eval(self),
            Opcode::LOG4 => OpLogHandler::<4>::eval(self),
            Opcode::CREATE => OpCreateHandler::eval(self),
            Opcode::CALL => OpCallHandler::eval(self),
            Opcode::CALLCODE => OpCallCodeHandler::eval(self),
            Opcode::RETURN => OpReturnHandler::eval(self),
            Opcode::DELEGATECALL => OpDelegateCallHandler::eval(self),
            Opcode::CREATE2 => OpCreate2Handler::eval(self),
            Opcode::STATICCALL => OpStaticCallHandler::eval(self),
            Opcode::REVERT => OpRevertHandler::eval(self),
            Opcode::INVALID => OpInvalidHandler::eval(self),
            Opcode::SELFDESTRUCT => OpSelfDestructHandler::eval(self),
        }
    }

    /// Charge a dynamic cost on top of the table's static deduction.
    #[inline]
    pub fn consume_gas(&mut self, amount: u64) -> Result<(), ExceptionalHalt> {
        let amount = i64::try_from(amount).map_err(|_| ExceptionalHalt::OutOfGas)?;
        self.gas_left -= amount;
        if self.gas_left < 0 {
            return Err(ExceptionalHalt::OutOfGas);
        }
        Ok(())
    }

    /// The remaining gas; non-negative whenever a handler runs.
    pub fn gas_left_u64(&self) -> u64 {
        u64::try_from(self.gas_left).unwrap_or(0)
    }

    /// Record the memory slice RETURN/REVERT hand back to the caller.
    pub(crate) fn set_output(&mut self, offset: usize, size: usize) {
        self.output_offset = offset;
        self.output_size = size;
    }

    /// Whether touching `address` found it cold. Revisions without access
    /// lists never ask the host and report warm.
    pub(crate) fn account_access_was_cold(&mut self, address: Address) -> bool {
        GasSchedule::for_fork(self.rev).has_access_lists
            && self.host.access_account(address) == AccessStatus::Cold
    }

    /// Cold-account surcharge for `address` on top of the statically charged
    /// warm cost (zero before Berlin).
    pub(crate) fn cold_account_cost(&mut self, address: Address) -> u64 {
        if self.account_access_was_cold(address) {
            GasSchedule::for_fork(self.rev).cold_account_surcharge()
        } else {
            0
        }
    }

    pub(crate) fn storage_access_was_cold(&mut self, address: Address, key: H256) -> bool {
        GasSchedule::for_fork(self.rev).has_access_lists
            && self.host.access_storage(address, key) == AccessStatus::Cold
    }

    /// Cold-slot surcharge for an SLOAD (zero before Berlin).
    pub(crate) fn cold_storage_cost(&mut self, address: Address, key: H256) -> u64 {
        if self.storage_access_was_cold(address, key) {
            GasSchedule::for_fork(self.rev).cold_sload_surcharge()
        } else {
            0
        }
    }
}

/// Analyze `code` and execute `msg` against it.
///
/// This is the library entry point; hosts re-enter it (or
/// [`execute_with_analysis`]) from their `call` implementation to run nested
/// frames.
pub fn execute<'a>(
    host: &'a mut dyn Host,
    rev: Fork,
    msg: &Message,
    code: &[u8],
    tracer: Option<&'a mut dyn Tracer>,
) -> ExecutionResult {
    let analysis = CodeAnalysis::analyze(code);
    VM::new(host, rev, msg, &analysis, tracer).run()
}

/// Execute against a pre-computed analysis, for callers that cache analyses
/// by code hash.
pub fn execute_with_analysis<'a>(
    host: &'a mut dyn Host,
    rev: Fork,
    msg: &Message,
    analysis: &CodeAnalysis,
    tracer: Option<&'a mut dyn Tracer>,
) -> ExecutionResult {
    VM::new(host, rev, msg, analysis, tracer).run()
}
