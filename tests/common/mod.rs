//! In-memory host and helpers shared by the integration tests.
#![allow(dead_code)]

use bevm::{
    AccessStatus, CallKind, ExecutionResult, Fork, Host, Message, StorageStatus, TxContext,
};
use bytes::Bytes;
use ethereum_types::{Address, H256, U256};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default)]
pub struct MockAccount {
    pub balance: U256,
    pub code: Bytes,
}

/// A host backed by hash maps, recording every interaction so tests can
/// assert on the transcript. `call` returns the canned result if one is set,
/// otherwise it recurses into the interpreter with the callee's stored code.
pub struct MockHost {
    pub rev: Fork,
    pub accounts: HashMap<Address, MockAccount>,
    pub storage: HashMap<(Address, H256), H256>,
    /// Storage contents at the start of the transaction.
    pub original_storage: HashMap<(Address, H256), H256>,
    pub warm_accounts: HashSet<Address>,
    pub warm_slots: HashSet<(Address, H256)>,
    pub tx_context: TxContext,
    pub block_hashes: HashMap<u64, H256>,
    pub logs: Vec<(Address, Vec<u8>, Vec<H256>)>,
    pub selfdestructs: Vec<(Address, Address)>,
    /// Child messages received through `call`.
    pub calls: Vec<Message>,
    pub call_result: Option<ExecutionResult>,
}

impl MockHost {
    pub fn new(rev: Fork) -> Self {
        MockHost {
            rev,
            accounts: HashMap::new(),
            storage: HashMap::new(),
            original_storage: HashMap::new(),
            warm_accounts: HashSet::new(),
            warm_slots: HashSet::new(),
            tx_context: TxContext::default(),
            block_hashes: HashMap::new(),
            logs: Vec::new(),
            selfdestructs: Vec::new(),
            calls: Vec::new(),
            call_result: None,
        }
    }

    pub fn with_account(mut self, address: Address, account: MockAccount) -> Self {
        self.accounts.insert(address, account);
        self
    }

    pub fn with_storage(mut self, address: Address, key: H256, value: H256) -> Self {
        self.storage.insert((address, key), value);
        self.original_storage.insert((address, key), value);
        self
    }

    pub fn with_call_result(mut self, result: ExecutionResult) -> Self {
        self.call_result = Some(result);
        self
    }
}

impl Host for MockHost {
    fn account_exists(&mut self, address: Address) -> bool {
        self.accounts.contains_key(&address)
    }

    fn get_storage(&mut self, address: Address, key: H256) -> H256 {
        self.storage
            .get(&(address, key))
            .copied()
            .unwrap_or_default()
    }

    fn set_storage(&mut self, address: Address, key: H256, value: H256) -> StorageStatus {
        let slot = (address, key);
        let current = self.storage.get(&slot).copied().unwrap_or_default();
        let original = self.original_storage.get(&slot).copied().unwrap_or_default();
        self.storage.insert(slot, value);

        if value == current {
            StorageStatus::Unchanged
        } else if current == original {
            if original.is_zero() {
                StorageStatus::Added
            } else if value.is_zero() {
                StorageStatus::Deleted
            } else {
                StorageStatus::Modified
            }
        } else if value == original {
            StorageStatus::Restored
        } else {
            // Dirty slot rewritten to yet another value: cheap under net
            // metering, same as an unchanged write.
            StorageStatus::Unchanged
        }
    }

    fn get_balance(&mut self, address: Address) -> U256 {
        self.accounts
            .get(&address)
            .map(|account| account.balance)
            .unwrap_or_default()
    }

    fn get_code_size(&mut self, address: Address) -> usize {
        self.accounts
            .get(&address)
            .map(|account| account.code.len())
            .unwrap_or_default()
    }

    fn get_code_hash(&mut self, address: Address) -> H256 {
        use sha3::{Digest, Keccak256};
        match self.accounts.get(&address) {
            Some(account) => H256::from_slice(&Keccak256::digest(&account.code)),
            None => H256::zero(),
        }
    }

    fn copy_code(&mut self, address: Address, code_offset: usize, buffer: &mut [u8]) -> usize {
        let code = match self.accounts.get(&address) {
            Some(account) => &account.code,
            None => return 0,
        };
        if code_offset >= code.len() {
            return 0;
        }
        let n = buffer.len().min(code.len() - code_offset);
        buffer[..n].copy_from_slice(&code[code_offset..code_offset + n]);
        n
    }

    fn selfdestruct(&mut self, address: Address, beneficiary: Address) {
        self.selfdestructs.push((address, beneficiary));
    }

    fn call(&mut self, msg: Message) -> ExecutionResult {
        self.calls.push(msg.clone());
        if let Some(result) = &self.call_result {
            return result.clone();
        }
        // No canned result: actually run the callee's code.
        let code = self
            .accounts
            .get(&msg.code_address)
            .map(|account| account.code.clone())
            .unwrap_or_default();
        let rev = self.rev;
        bevm::execute(self, rev, &msg, &code, None)
    }

    fn get_tx_context(&mut self) -> TxContext {
        self.tx_context
    }

    fn get_block_hash(&mut self, block_number: u64) -> H256 {
        self.block_hashes
            .get(&block_number)
            .copied()
            .unwrap_or_default()
    }

    fn emit_log(&mut self, address: Address, data: &[u8], topics: &[H256]) {
        self.logs.push((address, data.to_vec(), topics.to_vec()));
    }

    fn access_account(&mut self, address: Address) -> AccessStatus {
        if self.warm_accounts.insert(address) {
            AccessStatus::Cold
        } else {
            AccessStatus::Warm
        }
    }

    fn access_storage(&mut self, address: Address, key: H256) -> AccessStatus {
        if self.warm_slots.insert((address, key)) {
            AccessStatus::Cold
        } else {
            AccessStatus::Warm
        }
    }
}

pub const RECIPIENT: u64 = 0xAA;
pub const SENDER: u64 = 0xBB;

pub fn test_message(gas: i64) -> Message {
    Message {
        kind: CallKind::Call,
        is_static: false,
        depth: 0,
        gas,
        recipient: Address::from_low_u64_be(RECIPIENT),
        sender: Address::from_low_u64_be(SENDER),
        input: Bytes::new(),
        value: U256::zero(),
        code_address: Address::from_low_u64_be(RECIPIENT),
        create2_salt: H256::zero(),
    }
}

/// Run `code` against a fresh mock host with plenty of gas.
pub fn run_code(rev: Fork, code: &[u8]) -> ExecutionResult {
    let mut host = MockHost::new(rev);
    let msg = test_message(1_000_000);
    bevm::execute(&mut host, rev, &msg, code, None)
}

/// Append a `MSTORE`+`RETURN` tail that hands the top of the stack back as
/// a 32-byte word, then run the program.
pub fn run_and_return_top(rev: Fork, code_prefix: &[u8]) -> U256 {
    let mut code = code_prefix.to_vec();
    // PUSH1 0 MSTORE PUSH1 32 PUSH1 0 RETURN
    code.extend_from_slice(&[0x60, 0x00, 0x52, 0x60, 0x20, 0x60, 0x00, 0xF3]);
    let result = run_code(rev, &code);
    assert!(
        result.is_success(),
        "program failed with {:?}",
        result.status
    );
    U256::from_big_endian(&result.output)
}

/// A `PUSH32` of an arbitrary word.
pub fn push32(value: U256) -> Vec<u8> {
    let mut bytes = vec![0x7F];
    bytes.extend_from_slice(&value.to_big_endian());
    bytes
}
