//! Dynamic gas costs.
//!
//! The static cost of every opcode is pre-deducted by the dispatch loop from
//! the revision's instruction table; the functions here compute only the
//! surcharges a handler has to add on top: memory expansion, per-word copy
//! costs, log payloads, EXP exponent length, storage-write classes and the
//! message-call extras.

use crate::{
    constants::WORD_SIZE_IN_BYTES_U64,
    errors::ExceptionalHalt,
    fork::Fork,
    gas_schedule::GasSchedule,
    host::StorageStatus,
    memory,
};
use ethereum_types::U256;
use ExceptionalHalt::OutOfGas;

pub const KECCAK256_DYNAMIC_BASE: u64 = 6;
pub const CALLDATACOPY_DYNAMIC_BASE: u64 = 3;
pub const CODECOPY_DYNAMIC_BASE: u64 = 3;
pub const RETURNDATACOPY_DYNAMIC_BASE: u64 = 3;
pub const EXTCODECOPY_DYNAMIC_BASE: u64 = 3;
pub const MCOPY_DYNAMIC_BASE: u64 = 3;

pub const LOGN_DYNAMIC_BASE: u64 = 375;
pub const LOGN_DYNAMIC_BYTE_BASE: u64 = 8;

// EIP-2200: SSTORE aborts when the remaining gas is at or below the stipend.
pub const SSTORE_STIPEND: i64 = 2300;

pub const CALL_POSITIVE_VALUE: u64 = 9000;
pub const CALL_POSITIVE_VALUE_STIPEND: u64 = 2300;

// Per-word charges for CREATE family init code.
pub const INIT_CODE_WORD_COST: u64 = 2;
pub const HASH_WORD_COST: u64 = 6;

fn word_count(size: usize) -> Result<u64, ExceptionalHalt> {
    let size = u64::try_from(size).map_err(|_| OutOfGas)?;
    Ok(size
        .checked_add(WORD_SIZE_IN_BYTES_U64 - 1)
        .ok_or(OutOfGas)?
        / WORD_SIZE_IN_BYTES_U64)
}

fn copy_behavior(
    new_memory_size: usize,
    current_memory_size: usize,
    size: usize,
    dynamic_base: u64,
) -> Result<u64, ExceptionalHalt> {
    let minimum_word_size_cost = dynamic_base.checked_mul(word_count(size)?).ok_or(OutOfGas)?;
    let memory_expansion_cost = memory::expansion_cost(new_memory_size, current_memory_size)?;

    minimum_word_size_cost
        .checked_add(memory_expansion_cost)
        .ok_or(OutOfGas)
}

pub fn exp(exponent: U256, fork: Fork) -> Result<u64, ExceptionalHalt> {
    let exponent_byte_size = u64::try_from(exponent.bits())
        .map_err(|_| OutOfGas)?
        .div_ceil(8);

    GasSchedule::for_fork(fork)
        .exp_byte
        .checked_mul(exponent_byte_size)
        .ok_or(OutOfGas)
}

pub fn keccak256(
    new_memory_size: usize,
    current_memory_size: usize,
    size: usize,
) -> Result<u64, ExceptionalHalt> {
    copy_behavior(
        new_memory_size,
        current_memory_size,
        size,
        KECCAK256_DYNAMIC_BASE,
    )
}

pub fn calldatacopy(
    new_memory_size: usize,
    current_memory_size: usize,
    size: usize,
) -> Result<u64, ExceptionalHalt> {
    copy_behavior(
        new_memory_size,
        current_memory_size,
        size,
        CALLDATACOPY_DYNAMIC_BASE,
    )
}

pub fn codecopy(
    new_memory_size: usize,
    current_memory_size: usize,
    size: usize,
) -> Result<u64, ExceptionalHalt> {
    copy_behavior(
        new_memory_size,
        current_memory_size,
        size,
        CODECOPY_DYNAMIC_BASE,
    )
}

pub fn returndatacopy(
    new_memory_size: usize,
    current_memory_size: usize,
    size: usize,
) -> Result<u64, ExceptionalHalt> {
    copy_behavior(
        new_memory_size,
        current_memory_size,
        size,
        RETURNDATACOPY_DYNAMIC_BASE,
    )
}

pub fn extcodecopy(
    new_memory_size: usize,
    current_memory_size: usize,
    size: usize,
    address_was_cold: bool,
    fork: Fork,
) -> Result<u64, ExceptionalHalt> {
    let access_cost = if address_was_cold {
        GasSchedule::for_fork(fork).cold_account_surcharge()
    } else {
        0
    };
    copy_behavior(
        new_memory_size,
        current_memory_size,
        size,
        EXTCODECOPY_DYNAMIC_BASE,
    )?
    .checked_add(access_cost)
    .ok_or(OutOfGas)
}

pub fn mcopy(
    new_memory_size: usize,
    current_memory_size: usize,
    size: usize,
) -> Result<u64, ExceptionalHalt> {
    copy_behavior(
        new_memory_size,
        current_memory_size,
        size,
        MCOPY_DYNAMIC_BASE,
    )
}

pub fn log(
    new_memory_size: usize,
    current_memory_size: usize,
    size: usize,
    number_of_topics: usize,
) -> Result<u64, ExceptionalHalt> {
    let topics_cost = LOGN_DYNAMIC_BASE
        .checked_mul(number_of_topics as u64)
        .ok_or(OutOfGas)?;
    let bytes_cost = LOGN_DYNAMIC_BYTE_BASE
        .checked_mul(u64::try_from(size).map_err(|_| OutOfGas)?)
        .ok_or(OutOfGas)?;
    let memory_expansion_cost = memory::expansion_cost(new_memory_size, current_memory_size)?;

    topics_cost
        .checked_add(bytes_cost)
        .ok_or(OutOfGas)?
        .checked_add(memory_expansion_cost)
        .ok_or(OutOfGas)
}

/// Memory expansion for RETURN and REVERT.
pub fn exit_opcode(
    new_memory_size: usize,
    current_memory_size: usize,
) -> Result<u64, ExceptionalHalt> {
    memory::expansion_cost(new_memory_size, current_memory_size)
}

/// SSTORE cost from the write class the host reported.
///
/// Net-metering revisions (Constantinople, Istanbul and later) charge the
/// cheap no-op cost whenever the slot's effective value does not change;
/// the simple model charges the reset cost for everything but fresh slots.
/// Berlin adds the cold-slot surcharge on top.
pub fn sstore(
    storage_status: StorageStatus,
    storage_slot_was_cold: bool,
    fork: Fork,
) -> Result<u64, ExceptionalHalt> {
    let schedule = GasSchedule::for_fork(fork);

    let base_dynamic_gas = if GasSchedule::has_net_metering(fork) {
        match storage_status {
            StorageStatus::Added => schedule.sstore_set,
            StorageStatus::Modified | StorageStatus::Deleted => schedule.sstore_reset,
            StorageStatus::Unchanged | StorageStatus::Restored => schedule.sstore_noop,
        }
    } else {
        match storage_status {
            StorageStatus::Added => schedule.sstore_set,
            _ => schedule.sstore_reset,
        }
    };

    let cold_access_cost = if storage_slot_was_cold {
        schedule.cold_sload
    } else {
        0
    };

    base_dynamic_gas
        .checked_add(cold_access_cost)
        .ok_or(OutOfGas)
}

/// Gas handed to a child message call.
///
/// With EIP-150 the request is capped at 63/64 of the caller's remainder;
/// before it, requesting more than the remainder is itself out-of-gas.
pub fn forwarded_call_gas(
    gas_requested: U256,
    gas_left: u64,
    fork: Fork,
) -> Result<u64, ExceptionalHalt> {
    if GasSchedule::for_fork(fork).has_63_64_rule {
        let cap = all_but_one_64th(gas_left);
        Ok(match u64::try_from(gas_requested) {
            Ok(requested) => requested.min(cap),
            Err(_) => cap,
        })
    } else {
        let requested = u64::try_from(gas_requested).map_err(|_| OutOfGas)?;
        if requested > gas_left {
            return Err(OutOfGas);
        }
        Ok(requested)
    }
}

/// Gas handed to a CREATE/CREATE2 child: everything the caller has, minus
/// the 1/64 reserve under EIP-150.
pub fn max_message_call_gas(gas_left: u64, fork: Fork) -> u64 {
    if GasSchedule::for_fork(fork).has_63_64_rule {
        all_but_one_64th(gas_left)
    } else {
        gas_left
    }
}

fn all_but_one_64th(gas: u64) -> u64 {
    gas - gas / 64
}

/// EIP-3860 init-code charge (Shanghai onward).
pub fn init_code_cost(init_code_size: usize, fork: Fork) -> Result<u64, ExceptionalHalt> {
    if fork < Fork::Shanghai {
        return Ok(0);
    }
    INIT_CODE_WORD_COST
        .checked_mul(word_count(init_code_size)?)
        .ok_or(OutOfGas)
}

/// CREATE2 hashes the init code to derive the address (EIP-1014).
pub fn create2_hash_cost(init_code_size: usize) -> Result<u64, ExceptionalHalt> {
    HASH_WORD_COST
        .checked_mul(word_count(init_code_size)?)
        .ok_or(OutOfGas)
}
