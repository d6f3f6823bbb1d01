use crate::{
    errors::{ExceptionalHalt, OpcodeResult, VMError},
    vm::VM,
};

pub mod arithmetic;
pub mod bitwise_comparison;
pub mod block;
pub mod dup;
pub mod environment;
pub mod exchange;
pub mod keccak;
pub mod logging;
pub mod push;
pub mod stack_memory_storage_flow;
pub mod system;

/// One EVM instruction.
///
/// The dispatch loop has already deducted the opcode's static gas and
/// verified the stack height when `eval` runs; handlers charge dynamic
/// surcharges themselves and report how far to advance the program counter.
pub trait OpcodeHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError>;
}

/// Implementation for the `STOP` opcode.
pub struct OpStopHandler;
impl OpcodeHandler for OpStopHandler {
    fn eval(_vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        Ok(OpcodeResult::Halt)
    }
}

/// Implementation for the designated `INVALID` opcode. It consumes all
/// remaining gas, which the exit path does for every exceptional halt.
pub struct OpInvalidHandler;
impl OpcodeHandler for OpInvalidHandler {
    fn eval(_vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        Err(ExceptionalHalt::InvalidInstruction.into())
    }
}
