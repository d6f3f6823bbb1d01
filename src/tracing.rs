//! Execution tracing hooks.
//!
//! A tracer is an optional observer the caller hands to the interpreter.
//! When none is supplied the dispatch loop skips the hooks entirely; the
//! instruction hook is never fired for the STOP bytes of the code padding.

use crate::{errors::ExecutionResult, fork::Fork, host::Message};
use ethereum_types::U256;
use serde::Serialize;

/// Read-only snapshot of the frame at an instruction boundary, handed to
/// [`Tracer::on_instruction_start`].
#[derive(Debug, Clone, Serialize)]
pub struct InstructionView<'a> {
    /// Offset of the instruction in the original (unpadded) code.
    pub pc: usize,
    pub opcode: u8,
    /// Gas remaining before the instruction's costs are charged.
    pub gas_left: i64,
    pub depth: i32,
    /// Operand stack, top first.
    pub stack: &'a [U256],
    pub memory_size: usize,
}

/// Observer callbacks around a frame's execution.
///
/// All hooks default to no-ops so tracers implement only what they need.
pub trait Tracer {
    /// The frame is about to run `code` under revision `rev`.
    fn on_execution_start(&mut self, _rev: Fork, _msg: &Message, _code: &[u8]) {}

    /// An instruction inside the original code is about to be dispatched.
    fn on_instruction_start(&mut self, _view: InstructionView<'_>) {}

    /// The frame finished; `result` is what the caller will observe.
    fn on_execution_end(&mut self, _result: &ExecutionResult) {}
}
