//! # bevm — a baseline EVM interpreter
//!
//! A pure Rust implementation of the Ethereum Virtual Machine's baseline
//! interpreter: pre-analyze a code blob, dispatch opcodes one at a time with
//! centralized gas and stack checks, and produce a deterministic result.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                            VM                                │
//! │  ┌───────────┐  ┌───────────┐  ┌──────────────────────────┐  │
//! │  │   Stack   │  │  Memory   │  │  gas_left / pc / output  │  │
//! │  └───────────┘  └───────────┘  └──────────────────────────┘  │
//! │        dispatch loop ── instruction table ── handlers        │
//! └──────────────────────────────────────────────────────────────┘
//!          │                                         │
//!          ▼                                         ▼
//! ┌──────────────────┐                     ┌──────────────────┐
//! │   CodeAnalysis   │                     │       Host       │
//! │ (jumpdest bitmap,│                     │ (world state,    │
//! │   padded code)   │                     │  nested frames)  │
//! └──────────────────┘                     └──────────────────┘
//! ```
//!
//! ## Key components
//!
//! - [`execute`] / [`execute_with_analysis`]: run one frame to completion
//! - [`analysis::CodeAnalysis`]: jump-destination bitmap and STOP-padded code,
//!   cacheable by code hash
//! - [`host::Host`]: the caller-owned world state; nested CALL/CREATE frames
//!   are executed by the host, which typically recurses into this crate
//! - [`instruction_table`]: per-revision static costs, stack requirements and
//!   opcode availability
//! - [`tracing::Tracer`]: optional observer hooks around execution
//!
//! The interpreter is single-threaded within a frame and holds no global
//! mutable state; independent frames may run on independent threads.
//!
//! ## Usage
//!
//! ```ignore
//! use bevm::{execute, Fork, Message, CallKind};
//!
//! let result = execute(&mut host, Fork::Cancun, &msg, &code, None);
//! assert!(result.is_success());
//! println!("gas left: {}", result.gas_left);
//! ```

pub mod analysis;
pub mod constants;
pub mod errors;
pub mod fork;
pub mod gas_cost;
pub mod gas_schedule;
pub mod host;
pub mod instruction_table;
pub mod memory;
pub mod opcode_handlers;
pub mod opcodes;
pub mod stack;
pub mod tracing;
pub mod utils;
pub mod vm;

pub use analysis::CodeAnalysis;
pub use errors::{ExecutionResult, ExecutionStatus};
pub use fork::Fork;
pub use host::{AccessStatus, CallKind, Host, Message, StorageStatus, TxContext};
pub use opcodes::Opcode;
pub use tracing::Tracer;
pub use vm::{execute, execute_with_analysis, VM};
