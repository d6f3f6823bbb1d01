use bytes::Bytes;
use ethereum_types::Address;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Conditions that terminate a frame without preserving its remaining gas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ExceptionalHalt {
    #[error("out of gas")]
    OutOfGas,
    #[error("stack underflow")]
    StackUnderflow,
    #[error("stack overflow")]
    StackOverflow,
    #[error("jump destination is not a reachable JUMPDEST")]
    BadJumpDestination,
    #[error("undefined or invalid instruction")]
    InvalidInstruction,
    #[error("state modification attempted in a static context")]
    StaticModeViolation,
    #[error("operand does not fit the addressable memory range")]
    VeryLargeNumber,
    #[error("access past the end of the return data buffer")]
    InvalidMemoryAccess,
    #[error("memory allocation failed")]
    OutOfMemory,
}

/// Errors raised by opcode handlers.
///
/// `RevertOpcode` is the REVERT control-flow signal and is the only
/// non-exceptional member: it preserves the remaining gas and carries the
/// recorded output slice back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VMError {
    #[error(transparent)]
    Halt(#[from] ExceptionalHalt),
    #[error("revert")]
    RevertOpcode,
}

/// Outcome of a single opcode handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpcodeResult {
    /// Keep running; advance the program counter by `pc_increment` bytes.
    /// Jump handlers assign the counter themselves and return an increment
    /// of zero.
    Continue { pc_increment: usize },
    /// The frame finished successfully (STOP, RETURN, SELFDESTRUCT).
    Halt,
}

/// Terminal state of a frame, as observed by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecutionStatus {
    Success,
    Revert,
    OutOfGas,
    StackUnderflow,
    StackOverflow,
    BadJumpDestination,
    InvalidInstruction,
    StaticModeViolation,
    InvalidMemoryAccess,
    OutOfMemory,
    /// Reported by hosts when a precompiled contract fails.
    PrecompileFailure,
    /// Reported by hosts that enforce the depth limit themselves; the
    /// interpreter normally handles over-depth calls caller-side.
    CallDepthExceeded,
}

impl ExecutionStatus {
    pub fn is_success(&self) -> bool {
        *self == ExecutionStatus::Success
    }

    /// Success and Revert hand unspent gas back to the caller; every other
    /// termination consumes the whole frame allowance.
    pub fn preserves_gas(&self) -> bool {
        matches!(self, ExecutionStatus::Success | ExecutionStatus::Revert)
    }
}

impl From<ExceptionalHalt> for ExecutionStatus {
    fn from(halt: ExceptionalHalt) -> Self {
        match halt {
            ExceptionalHalt::OutOfGas => ExecutionStatus::OutOfGas,
            ExceptionalHalt::StackUnderflow => ExecutionStatus::StackUnderflow,
            ExceptionalHalt::StackOverflow => ExecutionStatus::StackOverflow,
            ExceptionalHalt::BadJumpDestination => ExecutionStatus::BadJumpDestination,
            ExceptionalHalt::InvalidInstruction => ExecutionStatus::InvalidInstruction,
            ExceptionalHalt::StaticModeViolation => ExecutionStatus::StaticModeViolation,
            // Operands past the addressable range can only fail by exhausting
            // the memory gas curve, so they surface as out-of-gas.
            ExceptionalHalt::VeryLargeNumber => ExecutionStatus::OutOfGas,
            ExceptionalHalt::InvalidMemoryAccess => ExecutionStatus::InvalidMemoryAccess,
            ExceptionalHalt::OutOfMemory => ExecutionStatus::OutOfMemory,
        }
    }
}

/// What a frame hands back to its caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub status: ExecutionStatus,
    /// Unspent gas; zero unless `status.preserves_gas()`.
    pub gas_left: i64,
    /// RETURN / REVERT payload, empty otherwise.
    pub output: Bytes,
    /// Address of the account deployed by a CREATE/CREATE2 message.
    pub create_address: Option<Address>,
}

impl ExecutionResult {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// A terminal failure with everything consumed.
    pub fn failure(status: ExecutionStatus) -> Self {
        ExecutionResult {
            status,
            gas_left: 0,
            output: Bytes::new(),
            create_address: None,
        }
    }
}
