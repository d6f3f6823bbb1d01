//! Per-revision instruction metrics.
//!
//! One 256-entry table per revision, consulted by the dispatch loop before a
//! handler runs: the opcode's static gas cost (with an `UNDEFINED` sentinel
//! for bytes the revision does not assign), the minimum stack height it
//! needs, and whether it grows the stack (and so can overflow it). The
//! tables are immutable statics; revisions that changed nothing share their
//! predecessor's table.
//!
//! Costs follow the Yellow Paper fee classes; the values repriced by
//! EIP-150/1884/2929 are pulled from the corresponding `GasSchedule` so the
//! two stay in sync. Berlin and later charge the warm access cost here and
//! leave the cold surcharge to the handlers.

use crate::{
    fork::Fork,
    gas_schedule::{
        BERLIN_SCHEDULE, FRONTIER_SCHEDULE, ISTANBUL_SCHEDULE, TANGERINE_WHISTLE_SCHEDULE,
    },
    opcodes::Opcode,
};

/// Sentinel for opcodes a revision does not define.
pub const UNDEFINED: i16 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeMetrics {
    /// Static gas, deducted before the handler runs; `UNDEFINED` terminates
    /// the frame with `InvalidInstruction`.
    pub gas_cost: i16,
    /// Minimum stack height the opcode needs.
    pub stack_required: u8,
    /// True when the opcode's net stack effect is positive, i.e. it fails on
    /// a full stack.
    pub can_overflow_stack: bool,
}

pub type InstructionTable = [OpcodeMetrics; 256];

const fn undefined() -> OpcodeMetrics {
    OpcodeMetrics {
        gas_cost: UNDEFINED,
        stack_required: 0,
        can_overflow_stack: false,
    }
}

const fn metrics(gas_cost: i16, stack_required: u8, can_overflow_stack: bool) -> OpcodeMetrics {
    OpcodeMetrics {
        gas_cost,
        stack_required,
        can_overflow_stack,
    }
}

const fn cost16(value: u64) -> i16 {
    assert!(value <= i16::MAX as u64);
    value as i16
}

/// The Frontier table every later revision builds on.
const fn frontier_table() -> InstructionTable {
    let schedule = &FRONTIER_SCHEDULE;
    let mut table = [undefined(); 256];

    table[Opcode::STOP as usize] = metrics(0, 0, false);
    table[Opcode::ADD as usize] = metrics(3, 2, false);
    table[Opcode::MUL as usize] = metrics(5, 2, false);
    table[Opcode::SUB as usize] = metrics(3, 2, false);
    table[Opcode::DIV as usize] = metrics(5, 2, false);
    table[Opcode::SDIV as usize] = metrics(5, 2, false);
    table[Opcode::MOD as usize] = metrics(5, 2, false);
    table[Opcode::SMOD as usize] = metrics(5, 2, false);
    table[Opcode::ADDMOD as usize] = metrics(8, 3, false);
    table[Opcode::MULMOD as usize] = metrics(8, 3, false);
    table[Opcode::EXP as usize] = metrics(10, 2, false);
    table[Opcode::SIGNEXTEND as usize] = metrics(5, 2, false);

    table[Opcode::LT as usize] = metrics(3, 2, false);
    table[Opcode::GT as usize] = metrics(3, 2, false);
    table[Opcode::SLT as usize] = metrics(3, 2, false);
    table[Opcode::SGT as usize] = metrics(3, 2, false);
    table[Opcode::EQ as usize] = metrics(3, 2, false);
    table[Opcode::ISZERO as usize] = metrics(3, 1, false);
    table[Opcode::AND as usize] = metrics(3, 2, false);
    table[Opcode::OR as usize] = metrics(3, 2, false);
    table[Opcode::XOR as usize] = metrics(3, 2, false);
    table[Opcode::NOT as usize] = metrics(3, 1, false);
    table[Opcode::BYTE as usize] = metrics(3, 2, false);

    table[Opcode::KECCAK256 as usize] = metrics(30, 2, false);

    table[Opcode::ADDRESS as usize] = metrics(2, 0, true);
    table[Opcode::BALANCE as usize] = metrics(cost16(schedule.balance), 1, false);
    table[Opcode::ORIGIN as usize] = metrics(2, 0, true);
    table[Opcode::CALLER as usize] = metrics(2, 0, true);
    table[Opcode::CALLVALUE as usize] = metrics(2, 0, true);
    table[Opcode::CALLDATALOAD as usize] = metrics(3, 1, false);
    table[Opcode::CALLDATASIZE as usize] = metrics(2, 0, true);
    table[Opcode::CALLDATACOPY as usize] = metrics(3, 3, false);
    table[Opcode::CODESIZE as usize] = metrics(2, 0, true);
    table[Opcode::CODECOPY as usize] = metrics(3, 3, false);
    table[Opcode::GASPRICE as usize] = metrics(2, 0, true);
    table[Opcode::EXTCODESIZE as usize] = metrics(cost16(schedule.extcodesize), 1, false);
    table[Opcode::EXTCODECOPY as usize] = metrics(cost16(schedule.extcodecopy), 4, false);

    table[Opcode::BLOCKHASH as usize] = metrics(20, 1, false);
    table[Opcode::COINBASE as usize] = metrics(2, 0, true);
    table[Opcode::TIMESTAMP as usize] = metrics(2, 0, true);
    table[Opcode::NUMBER as usize] = metrics(2, 0, true);
    table[Opcode::PREVRANDAO as usize] = metrics(2, 0, true);
    table[Opcode::GASLIMIT as usize] = metrics(2, 0, true);

    table[Opcode::POP as usize] = metrics(2, 1, false);
    table[Opcode::MLOAD as usize] = metrics(3, 1, false);
    table[Opcode::MSTORE as usize] = metrics(3, 2, false);
    table[Opcode::MSTORE8 as usize] = metrics(3, 2, false);
    table[Opcode::SLOAD as usize] = metrics(cost16(schedule.sload), 1, false);
    table[Opcode::SSTORE as usize] = metrics(0, 2, false);
    table[Opcode::JUMP as usize] = metrics(8, 1, false);
    table[Opcode::JUMPI as usize] = metrics(10, 2, false);
    table[Opcode::PC as usize] = metrics(2, 0, true);
    table[Opcode::MSIZE as usize] = metrics(2, 0, true);
    table[Opcode::GAS as usize] = metrics(2, 0, true);
    table[Opcode::JUMPDEST as usize] = metrics(1, 0, false);

    // PUSH1..PUSH32, DUP1..DUP16, SWAP1..SWAP16
    let mut i = 0;
    while i < 32 {
        table[Opcode::PUSH1 as usize + i] = metrics(3, 0, true);
        i += 1;
    }
    let mut n = 1;
    while n <= 16 {
        table[Opcode::DUP1 as usize + n - 1] = metrics(3, n as u8, true);
        table[Opcode::SWAP1 as usize + n - 1] = metrics(3, n as u8 + 1, false);
        n += 1;
    }

    let mut n = 0;
    while n <= 4 {
        table[Opcode::LOG0 as usize + n] = metrics(375, n as u8 + 2, false);
        n += 1;
    }

    // The call and create opcodes pop more than they push, so they can run
    // on a full stack.
    table[Opcode::CREATE as usize] = metrics(32000, 3, false);
    table[Opcode::CALL as usize] = metrics(cost16(schedule.call), 7, false);
    table[Opcode::CALLCODE as usize] = metrics(cost16(schedule.call), 7, false);
    table[Opcode::RETURN as usize] = metrics(0, 2, false);
    table[Opcode::INVALID as usize] = metrics(0, 0, false);
    table[Opcode::SELFDESTRUCT as usize] = metrics(cost16(schedule.selfdestruct), 1, false);

    table
}

const fn homestead_table() -> InstructionTable {
    let mut table = frontier_table();
    table[Opcode::DELEGATECALL as usize] =
        metrics(cost16(FRONTIER_SCHEDULE.call), 6, false);
    table
}

/// EIP-150 repricing; Spurious Dragon changed no static cost.
const fn tangerine_table() -> InstructionTable {
    let schedule = &TANGERINE_WHISTLE_SCHEDULE;
    let mut table = homestead_table();
    table[Opcode::BALANCE as usize] = metrics(cost16(schedule.balance), 1, false);
    table[Opcode::EXTCODESIZE as usize] = metrics(cost16(schedule.extcodesize), 1, false);
    table[Opcode::EXTCODECOPY as usize] = metrics(cost16(schedule.extcodecopy), 4, false);
    table[Opcode::SLOAD as usize] = metrics(cost16(schedule.sload), 1, false);
    table[Opcode::CALL as usize] = metrics(cost16(schedule.call), 7, false);
    table[Opcode::CALLCODE as usize] = metrics(cost16(schedule.call), 7, false);
    table[Opcode::DELEGATECALL as usize] = metrics(cost16(schedule.call), 6, false);
    table[Opcode::SELFDESTRUCT as usize] = metrics(cost16(schedule.selfdestruct), 1, false);
    table
}

const fn byzantium_table() -> InstructionTable {
    let mut table = tangerine_table();
    table[Opcode::RETURNDATASIZE as usize] = metrics(2, 0, true);
    table[Opcode::RETURNDATACOPY as usize] = metrics(3, 3, false);
    table[Opcode::STATICCALL as usize] =
        metrics(cost16(TANGERINE_WHISTLE_SCHEDULE.call), 6, false);
    table[Opcode::REVERT as usize] = metrics(0, 2, false);
    table
}

/// Constantinople additions; Petersburg kept them (it only reverted the
/// SSTORE metering, which is dynamic).
const fn constantinople_table() -> InstructionTable {
    let mut table = byzantium_table();
    table[Opcode::SHL as usize] = metrics(3, 2, false);
    table[Opcode::SHR as usize] = metrics(3, 2, false);
    table[Opcode::SAR as usize] = metrics(3, 2, false);
    table[Opcode::EXTCODEHASH as usize] =
        metrics(cost16(TANGERINE_WHISTLE_SCHEDULE.extcodehash), 1, false);
    table[Opcode::CREATE2 as usize] = metrics(32000, 4, false);
    table
}

const fn istanbul_table() -> InstructionTable {
    let schedule = &ISTANBUL_SCHEDULE;
    let mut table = constantinople_table();
    table[Opcode::BALANCE as usize] = metrics(cost16(schedule.balance), 1, false);
    table[Opcode::EXTCODEHASH as usize] = metrics(cost16(schedule.extcodehash), 1, false);
    table[Opcode::SLOAD as usize] = metrics(cost16(schedule.sload), 1, false);
    table[Opcode::CHAINID as usize] = metrics(2, 0, true);
    table[Opcode::SELFBALANCE as usize] = metrics(5, 0, true);
    table
}

/// Berlin charges the warm access cost statically; handlers add the
/// cold-minus-warm delta after consulting the host.
const fn berlin_table() -> InstructionTable {
    let schedule = &BERLIN_SCHEDULE;
    let warm_account = cost16(schedule.warm_account_access);
    let mut table = istanbul_table();
    table[Opcode::BALANCE as usize] = metrics(warm_account, 1, false);
    table[Opcode::EXTCODESIZE as usize] = metrics(warm_account, 1, false);
    table[Opcode::EXTCODECOPY as usize] = metrics(warm_account, 4, false);
    table[Opcode::EXTCODEHASH as usize] = metrics(warm_account, 1, false);
    table[Opcode::SLOAD as usize] = metrics(cost16(schedule.warm_sload), 1, false);
    table[Opcode::CALL as usize] = metrics(warm_account, 7, false);
    table[Opcode::CALLCODE as usize] = metrics(warm_account, 7, false);
    table[Opcode::DELEGATECALL as usize] = metrics(warm_account, 6, false);
    table[Opcode::STATICCALL as usize] = metrics(warm_account, 6, false);
    table
}

const fn london_table() -> InstructionTable {
    let mut table = berlin_table();
    table[Opcode::BASEFEE as usize] = metrics(2, 0, true);
    table
}

const fn shanghai_table() -> InstructionTable {
    let mut table = london_table();
    table[Opcode::PUSH0 as usize] = metrics(2, 0, true);
    table
}

const fn cancun_table() -> InstructionTable {
    let mut table = shanghai_table();
    table[Opcode::MCOPY as usize] = metrics(3, 3, false);
    table
}

static FRONTIER_TABLE: InstructionTable = frontier_table();
static HOMESTEAD_TABLE: InstructionTable = homestead_table();
static TANGERINE_TABLE: InstructionTable = tangerine_table();
static BYZANTIUM_TABLE: InstructionTable = byzantium_table();
static CONSTANTINOPLE_TABLE: InstructionTable = constantinople_table();
static ISTANBUL_TABLE: InstructionTable = istanbul_table();
static BERLIN_TABLE: InstructionTable = berlin_table();
static LONDON_TABLE: InstructionTable = london_table();
static SHANGHAI_TABLE: InstructionTable = shanghai_table();
static CANCUN_TABLE: InstructionTable = cancun_table();

/// The instruction table for a revision.
pub fn instruction_table(fork: Fork) -> &'static InstructionTable {
    match fork {
        Fork::Frontier => &FRONTIER_TABLE,
        Fork::Homestead => &HOMESTEAD_TABLE,
        Fork::Tangerine | Fork::SpuriousDragon => &TANGERINE_TABLE,
        Fork::Byzantium => &BYZANTIUM_TABLE,
        Fork::Constantinople | Fork::Petersburg => &CONSTANTINOPLE_TABLE,
        Fork::Istanbul => &ISTANBUL_TABLE,
        Fork::Berlin => &BERLIN_TABLE,
        Fork::London | Fork::Paris => &LONDON_TABLE,
        Fork::Shanghai => &SHANGHAI_TABLE,
        Fork::Cancun => &CANCUN_TABLE,
    }
}
