//! Fork-aware gas schedules.
//!
//! This module defines the gas parameters that vary across revisions; costs
//! that never changed live as plain constants in `gas_cost.rs` and in the
//! per-revision instruction tables.
//!
//! # Revision history (gas-relevant changes)
//!
//! - **Frontier/Homestead**: original costs
//! - **Tangerine Whistle (EIP-150)**: IO repricing (SLOAD, BALANCE, CALL,
//!   EXTCODE*, SELFDESTRUCT) and the 63/64 forwarding rule
//! - **Spurious Dragon (EIP-160)**: EXP byte repricing
//! - **Constantinople (EIP-1283)**: SSTORE net gas metering
//! - **Petersburg**: EIP-1283 reverted
//! - **Istanbul (EIP-1884/2200)**: SLOAD/BALANCE increases, net metering back
//! - **Berlin (EIP-2929)**: cold/warm access pricing

use crate::fork::Fork;

/// Gas parameters that vary by revision.
#[derive(Debug, Clone, Copy)]
pub struct GasSchedule {
    // Storage operations
    pub sload: u64,
    pub sstore_set: u64,
    pub sstore_reset: u64,
    /// Charged when an SSTORE leaves the slot's current value untouched or
    /// restores its original value (net-metering revisions only; equal to
    /// `sstore_reset` before Constantinople).
    pub sstore_noop: u64,

    // Account access
    pub balance: u64,
    pub extcodesize: u64,
    pub extcodecopy: u64,
    pub extcodehash: u64,

    // Message calls (base cost, not including memory/value/new-account)
    pub call: u64,

    // Self-destruct
    pub selfdestruct: u64,
    pub selfdestruct_new_account: u64,

    /// Surcharge for a value-bearing CALL that brings an account into
    /// existence.
    pub call_new_account: u64,

    // EXP dynamic cost per exponent byte
    pub exp_byte: u64,

    // Cold/warm access tracking (EIP-2929)
    pub has_access_lists: bool,
    pub cold_sload: u64,
    pub warm_sload: u64,
    pub cold_account_access: u64,
    pub warm_account_access: u64,

    /// Whether forwarded gas is capped at 63/64 of the remainder (EIP-150).
    /// Before that, callers could hand their entire remaining gas to a child.
    pub has_63_64_rule: bool,
}

impl GasSchedule {
    /// Get the gas schedule for a revision.
    pub const fn for_fork(fork: Fork) -> &'static GasSchedule {
        match fork {
            Fork::Frontier | Fork::Homestead => &FRONTIER_SCHEDULE,
            Fork::Tangerine => &TANGERINE_WHISTLE_SCHEDULE,
            Fork::SpuriousDragon | Fork::Byzantium | Fork::Petersburg => {
                &SPURIOUS_DRAGON_SCHEDULE
            }
            Fork::Constantinople => &CONSTANTINOPLE_SCHEDULE,
            Fork::Istanbul => &ISTANBUL_SCHEDULE,
            // Berlin and later use cold/warm access pricing.
            _ => &BERLIN_SCHEDULE,
        }
    }

    /// Whether SSTORE uses net gas metering (EIP-1283 / EIP-2200) at this
    /// revision. Petersburg reverted Constantinople's version.
    pub const fn has_net_metering(fork: Fork) -> bool {
        matches!(fork, Fork::Constantinople) || fork as u8 >= Fork::Istanbul as u8
    }

    /// Extra gas for touching a cold account on top of the warm cost already
    /// charged statically (zero before Berlin).
    #[inline]
    pub const fn cold_account_surcharge(&self) -> u64 {
        if self.has_access_lists {
            self.cold_account_access - self.warm_account_access
        } else {
            0
        }
    }

    /// Extra gas for touching a cold storage slot (zero before Berlin).
    #[inline]
    pub const fn cold_sload_surcharge(&self) -> u64 {
        if self.has_access_lists {
            self.cold_sload - self.warm_sload
        } else {
            0
        }
    }
}

/// Frontier/Homestead gas schedule: the original costs.
pub const FRONTIER_SCHEDULE: GasSchedule = GasSchedule {
    sload: 50,
    sstore_set: 20000,
    sstore_reset: 5000,
    sstore_noop: 5000,

    balance: 20,
    extcodesize: 20,
    extcodecopy: 20,
    extcodehash: 20, // Opcode arrives in Constantinople; placeholder value.

    call: 40,

    selfdestruct: 0,
    selfdestruct_new_account: 0,

    call_new_account: 25000,

    exp_byte: 10,

    has_access_lists: false,
    cold_sload: 0,
    warm_sload: 0,
    cold_account_access: 0,
    warm_account_access: 0,

    has_63_64_rule: false,
};

/// Tangerine Whistle (EIP-150): IO cost increases against DoS attacks.
pub const TANGERINE_WHISTLE_SCHEDULE: GasSchedule = GasSchedule {
    sload: 200,

    balance: 400,
    extcodesize: 700,
    extcodecopy: 700,
    extcodehash: 400,

    call: 700,

    selfdestruct: 5000,
    selfdestruct_new_account: 25000,

    has_63_64_rule: true,

    ..FRONTIER_SCHEDULE
};

/// Spurious Dragon (EIP-160): EXP repricing. Byzantium and Petersburg reuse
/// these values.
pub const SPURIOUS_DRAGON_SCHEDULE: GasSchedule = GasSchedule {
    exp_byte: 50,
    ..TANGERINE_WHISTLE_SCHEDULE
};

/// Constantinople (EIP-1283): SSTORE net gas metering; a no-op write costs
/// only 200.
pub const CONSTANTINOPLE_SCHEDULE: GasSchedule = GasSchedule {
    sstore_noop: 200,
    ..SPURIOUS_DRAGON_SCHEDULE
};

/// Istanbul (EIP-1884/2200): trie-access repricing, net metering with the
/// no-op cost pegged to SLOAD.
pub const ISTANBUL_SCHEDULE: GasSchedule = GasSchedule {
    sload: 800,
    sstore_noop: 800,

    balance: 700,
    extcodehash: 700,

    ..SPURIOUS_DRAGON_SCHEDULE
};

/// Berlin (EIP-2929): cold/warm access pricing. The warm cost is charged
/// statically by the instruction table; handlers add the cold surcharge.
pub const BERLIN_SCHEDULE: GasSchedule = GasSchedule {
    sload: 0,
    sstore_set: 20000,
    sstore_reset: 2900,
    sstore_noop: 100,

    balance: 0,
    extcodesize: 0,
    extcodecopy: 0,
    extcodehash: 0,
    call: 0,

    selfdestruct: 5000,
    selfdestruct_new_account: 25000,

    call_new_account: 25000,

    exp_byte: 50,

    has_access_lists: true,
    cold_sload: 2100,
    warm_sload: 100,
    cold_account_access: 2600,
    warm_account_access: 100,

    has_63_64_rule: true,
};
