use ethereum_types::U256;

pub const WORD_SIZE_IN_BYTES_USIZE: usize = 32;
pub const WORD_SIZE_IN_BYTES_U64: u64 = 32;

pub const SUCCESS: U256 = U256::one();
pub const FAIL: U256 = U256::zero();

pub const STACK_LIMIT: usize = 1024;

/// Maximum nesting depth of message calls and creates.
pub const CALL_DEPTH_LIMIT: i32 = 1024;

pub const MEMORY_EXPANSION_QUOTIENT: u64 = 512;

// https://eips.ethereum.org/EIPS/eip-3860
pub const INIT_CODE_MAX_SIZE: usize = 49152;

// BLOCKHASH reaches at most 256 ancestors back.
pub const LAST_AVAILABLE_BLOCK_LIMIT: u64 = 256;
