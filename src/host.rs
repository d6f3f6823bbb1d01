//! The host interface.
//!
//! The interpreter owns no world state. Every account, storage, balance or
//! block query goes through a [`Host`] borrowed from the caller for the
//! duration of the frame, and nested frames (CALL/CREATE) are executed by
//! the host itself, which typically drives a fresh interpreter frame
//! recursively and returns its [`ExecutionResult`](crate::ExecutionResult)
//! synchronously.

use crate::errors::ExecutionResult;
use bytes::Bytes;
use ethereum_types::{Address, H256, U256};
use serde::Serialize;

/// What kind of frame a [`Message`] starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CallKind {
    Call,
    CallCode,
    DelegateCall,
    Create,
    Create2,
}

impl CallKind {
    pub fn is_create(&self) -> bool {
        matches!(self, CallKind::Create | CallKind::Create2)
    }
}

/// The immutable description of one frame.
#[derive(Debug, Clone)]
pub struct Message {
    pub kind: CallKind,
    /// Static frames reject every state-mutating opcode.
    pub is_static: bool,
    /// 0 for the top-level frame; children get the parent's depth plus one.
    pub depth: i32,
    /// Gas allowance for the frame.
    pub gas: i64,
    /// Account whose storage and balance the frame acts on.
    pub recipient: Address,
    pub sender: Address,
    pub input: Bytes,
    /// Value transferred with the message (or the parent's value for
    /// DELEGATECALL, which transfers nothing).
    pub value: U256,
    /// Account whose code runs; differs from `recipient` for
    /// CALLCODE/DELEGATECALL.
    pub code_address: Address,
    /// CREATE2 only.
    pub create2_salt: H256,
}

/// Cold/warm access classification (EIP-2929, Berlin and later).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessStatus {
    Cold,
    Warm,
}

/// How an SSTORE changed a slot, relative to its value before the write and
/// its original value at the start of the transaction. The host derives
/// refunds from this; the interpreter derives the gas charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageStatus {
    /// The write left the current value as it was.
    Unchanged,
    /// A live slot was given a different non-zero value.
    Modified,
    /// A zero slot was given a non-zero value.
    Added,
    /// A live slot was zeroed.
    Deleted,
    /// A dirty slot was written back to its original value.
    Restored,
}

/// Transaction- and block-level context, fetched once per query from the
/// host.
#[derive(Debug, Clone, Copy, Default)]
pub struct TxContext {
    pub gas_price: U256,
    pub origin: Address,
    pub coinbase: Address,
    pub block_number: u64,
    pub timestamp: u64,
    pub gas_limit: u64,
    /// PREVRANDAO after the merge, the block difficulty before it.
    pub prev_randao: U256,
    pub chain_id: U256,
    pub base_fee: U256,
}

/// World-state queries and mutations the interpreter consumes.
///
/// Methods take `&mut self` because even reads may warm caches or access
/// lists on the host side. All calls are synchronous; `call` must not return
/// before the child frame has fully finished.
pub trait Host {
    fn account_exists(&mut self, address: Address) -> bool;

    fn get_storage(&mut self, address: Address, key: H256) -> H256;

    /// Write a slot and report how it changed.
    fn set_storage(&mut self, address: Address, key: H256, value: H256) -> StorageStatus;

    fn get_balance(&mut self, address: Address) -> U256;

    fn get_code_size(&mut self, address: Address) -> usize;

    fn get_code_hash(&mut self, address: Address) -> H256;

    /// Copy code starting at `code_offset` into `buffer`, returning how many
    /// bytes were actually available; the interpreter zero-fills the rest.
    fn copy_code(&mut self, address: Address, code_offset: usize, buffer: &mut [u8]) -> usize;

    fn selfdestruct(&mut self, address: Address, beneficiary: Address);

    /// Run a nested frame to completion.
    fn call(&mut self, msg: Message) -> ExecutionResult;

    fn get_tx_context(&mut self) -> TxContext;

    fn get_block_hash(&mut self, block_number: u64) -> H256;

    fn emit_log(&mut self, address: Address, data: &[u8], topics: &[H256]);

    /// Mark an account accessed and report whether it already was
    /// (revisions before Berlin never consult this).
    fn access_account(&mut self, address: Address) -> AccessStatus;

    /// Mark a storage slot accessed and report whether it already was.
    fn access_storage(&mut self, address: Address, key: H256) -> AccessStatus;
}
