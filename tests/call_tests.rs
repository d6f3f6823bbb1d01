//! Frame-boundary behavior: the CALL and CREATE families against the mock
//! host, including the caller-side depth/balance checks, gas forwarding and
//! return-data wiring.

mod common;

use bevm::{execute, CallKind, ExecutionResult, ExecutionStatus, Fork};
use bytes::Bytes;
use common::{push32, test_message, MockAccount, MockHost, RECIPIENT, SENDER};
use ethereum_types::{Address, H256, U256};

const CALLEE: u64 = 0xCC;

fn push20(address: Address) -> Vec<u8> {
    let mut bytes = vec![0x73];
    bytes.extend_from_slice(address.as_bytes());
    bytes
}

/// `CALL` with a 32-byte return buffer at offset 0 and the given value and
/// requested gas, followed by the provided tail.
fn call_code(value: u8, gas_requested: u16, tail: &[u8]) -> Vec<u8> {
    let mut code = Vec::new();
    code.extend_from_slice(&[0x60, 0x20, 0x60, 0x00, 0x60, 0x00, 0x60, 0x00]); // ret/args slices
    code.extend_from_slice(&[0x60, value]);
    code.extend_from_slice(&push20(Address::from_low_u64_be(CALLEE)));
    code.extend_from_slice(&[0x61]);
    code.extend_from_slice(&gas_requested.to_be_bytes());
    code.push(0xF1);
    code.extend_from_slice(tail);
    code
}

fn success_result(gas_left: i64, output: &'static [u8]) -> ExecutionResult {
    ExecutionResult {
        status: ExecutionStatus::Success,
        gas_left,
        output: Bytes::from_static(output),
        create_address: None,
    }
}

#[test]
fn call_charges_forwards_and_refunds() {
    let code = call_code(0, 0xFFFF, &[0x00]);
    let mut host = MockHost::new(Fork::Cancun).with_call_result(success_result(5, &[0xAA, 0xBB]));
    let msg = test_message(1_000_000);
    let result = execute(&mut host, Fork::Cancun, &msg, &code, None);

    assert_eq!(result.status, ExecutionStatus::Success);
    // 7 pushes (21) + warm call (100) + return-buffer word (3) + cold callee
    // (2500), then 0xFFFF forwarded and 5 of it handed back.
    assert_eq!(result.gas_left, 1_000_000 - 21 - 100 - 3 - 2500 - 0xFFFF + 5);

    let child = &host.calls[0];
    assert_eq!(child.kind, CallKind::Call);
    assert_eq!(child.depth, 1);
    assert_eq!(child.gas, 0xFFFF);
    assert_eq!(child.sender, Address::from_low_u64_be(RECIPIENT));
    assert_eq!(child.recipient, Address::from_low_u64_be(CALLEE));
    assert_eq!(child.code_address, Address::from_low_u64_be(CALLEE));
    assert!(!child.is_static);
    assert!(child.value.is_zero());
}

#[test]
fn call_output_lands_in_the_return_buffer() {
    // POP the success flag, then return the buffer.
    let code = call_code(0, 0xFFFF, &[0x50, 0x60, 0x20, 0x60, 0x00, 0xF3]);
    let mut host = MockHost::new(Fork::Cancun).with_call_result(success_result(0, &[0xAA, 0xBB]));
    let msg = test_message(1_000_000);
    let result = execute(&mut host, Fork::Cancun, &msg, &code, None);

    let mut expected = [0u8; 32];
    expected[0] = 0xAA;
    expected[1] = 0xBB;
    assert_eq!(result.output.as_ref(), &expected);
}

#[test]
fn failed_child_pushes_zero_but_exposes_return_data() {
    let revert = ExecutionResult {
        status: ExecutionStatus::Revert,
        gas_left: 7,
        output: Bytes::from_static(&[0xEE, 0xEE, 0xEE]),
        create_address: None,
    };
    // POP the flag and return RETURNDATASIZE.
    let code = call_code(
        0,
        0xFFFF,
        &[0x50, 0x3D, 0x60, 0x00, 0x52, 0x60, 0x20, 0x60, 0x00, 0xF3],
    );
    let mut host = MockHost::new(Fork::Cancun).with_call_result(revert);
    let msg = test_message(1_000_000);
    let result = execute(&mut host, Fork::Cancun, &msg, &code, None);
    assert_eq!(U256::from_big_endian(&result.output), U256::from(3));

    // And the flag itself is zero.
    let code = call_code(0, 0xFFFF, &[0x60, 0x00, 0x52, 0x60, 0x20, 0x60, 0x00, 0xF3]);
    let revert = ExecutionResult {
        status: ExecutionStatus::Revert,
        gas_left: 7,
        output: Bytes::from_static(&[0xEE]),
        create_address: None,
    };
    let mut host = MockHost::new(Fork::Cancun).with_call_result(revert);
    let result = execute(&mut host, Fork::Cancun, &msg, &code, None);
    assert_eq!(U256::from_big_endian(&result.output), U256::zero());
}

#[test]
fn call_with_value_in_a_static_frame_is_rejected() {
    let code = call_code(1, 0xFFFF, &[0x00]);
    let mut host = MockHost::new(Fork::Cancun);
    let mut msg = test_message(1_000_000);
    msg.is_static = true;
    let result = execute(&mut host, Fork::Cancun, &msg, &code, None);

    assert_eq!(result.status, ExecutionStatus::StaticModeViolation);
    assert!(host.calls.is_empty());
}

#[test]
fn call_depth_limit_fails_without_reaching_the_host() {
    let code = call_code(0, 0xFFFF, &[0x60, 0x00, 0x52, 0x60, 0x20, 0x60, 0x00, 0xF3]);
    let mut host = MockHost::new(Fork::Cancun);
    let mut msg = test_message(1_000_000);
    msg.depth = 1024;
    let result = execute(&mut host, Fork::Cancun, &msg, &code, None);

    assert_eq!(result.status, ExecutionStatus::Success);
    assert_eq!(U256::from_big_endian(&result.output), U256::zero());
    assert!(host.calls.is_empty());
}

#[test]
fn value_call_without_balance_fails_cheaply() {
    let code = call_code(5, 0xFFFF, &[0x60, 0x00, 0x52, 0x60, 0x20, 0x60, 0x00, 0xF3]);
    let mut host = MockHost::new(Fork::Cancun);
    let msg = test_message(1_000_000);
    let result = execute(&mut host, Fork::Cancun, &msg, &code, None);

    assert_eq!(U256::from_big_endian(&result.output), U256::zero());
    assert!(host.calls.is_empty());
}

#[test]
fn value_call_adds_the_stipend_to_the_child() {
    let code = call_code(1, 100, &[0x00]);
    let mut host = MockHost::new(Fork::Cancun)
        .with_account(
            Address::from_low_u64_be(RECIPIENT),
            MockAccount {
                balance: U256::from(10),
                code: Bytes::new(),
            },
        )
        .with_account(
            Address::from_low_u64_be(CALLEE),
            MockAccount::default(),
        )
        .with_call_result(success_result(0, &[]));
    let msg = test_message(1_000_000);
    let result = execute(&mut host, Fork::Cancun, &msg, &code, None);

    assert_eq!(result.status, ExecutionStatus::Success);
    let child = &host.calls[0];
    assert_eq!(child.gas, 100 + 2300);
    assert_eq!(child.value, U256::one());
}

#[test]
fn staticcall_runs_the_child_statically() {
    let mut code = Vec::new();
    code.extend_from_slice(&[0x60, 0x00, 0x60, 0x00, 0x60, 0x00, 0x60, 0x00]);
    code.extend_from_slice(&push20(Address::from_low_u64_be(CALLEE)));
    code.extend_from_slice(&[0x61, 0xFF, 0xFF, 0xFA, 0x00]);

    let mut host = MockHost::new(Fork::Cancun).with_call_result(success_result(0, &[]));
    let msg = test_message(1_000_000);
    execute(&mut host, Fork::Cancun, &msg, &code, None);

    let child = &host.calls[0];
    assert_eq!(child.kind, CallKind::Call);
    assert!(child.is_static);
    assert!(child.value.is_zero());
    assert_eq!(child.recipient, Address::from_low_u64_be(CALLEE));
}

#[test]
fn delegatecall_inherits_sender_and_value() {
    let mut code = Vec::new();
    code.extend_from_slice(&[0x60, 0x00, 0x60, 0x00, 0x60, 0x00, 0x60, 0x00]);
    code.extend_from_slice(&push20(Address::from_low_u64_be(CALLEE)));
    code.extend_from_slice(&[0x61, 0xFF, 0xFF, 0xF4, 0x00]);

    let mut host = MockHost::new(Fork::Cancun).with_call_result(success_result(0, &[]));
    let mut msg = test_message(1_000_000);
    msg.value = U256::from(77);
    execute(&mut host, Fork::Cancun, &msg, &code, None);

    let child = &host.calls[0];
    assert_eq!(child.kind, CallKind::DelegateCall);
    assert_eq!(child.sender, Address::from_low_u64_be(SENDER));
    assert_eq!(child.recipient, Address::from_low_u64_be(RECIPIENT));
    assert_eq!(child.code_address, Address::from_low_u64_be(CALLEE));
    assert_eq!(child.value, U256::from(77));
}

#[test]
fn callcode_runs_foreign_code_on_the_current_account() {
    let mut code = Vec::new();
    code.extend_from_slice(&[0x60, 0x00, 0x60, 0x00, 0x60, 0x00, 0x60, 0x00, 0x60, 0x00]);
    code.extend_from_slice(&push20(Address::from_low_u64_be(CALLEE)));
    code.extend_from_slice(&[0x61, 0xFF, 0xFF, 0xF2, 0x00]);

    let mut host = MockHost::new(Fork::Cancun).with_call_result(success_result(0, &[]));
    let msg = test_message(1_000_000);
    execute(&mut host, Fork::Cancun, &msg, &code, None);

    let child = &host.calls[0];
    assert_eq!(child.kind, CallKind::CallCode);
    assert_eq!(child.recipient, Address::from_low_u64_be(RECIPIENT));
    assert_eq!(child.sender, Address::from_low_u64_be(RECIPIENT));
    assert_eq!(child.code_address, Address::from_low_u64_be(CALLEE));
}

#[test]
fn pre_tangerine_forwarding_is_all_or_out_of_gas() {
    // Requesting more gas than remains is itself out-of-gas before EIP-150.
    let code = call_code(0, 0xFFFF, &[0x00]);
    let mut host = MockHost::new(Fork::Homestead)
        .with_account(Address::from_low_u64_be(CALLEE), MockAccount::default())
        .with_call_result(success_result(0, &[]));
    let msg = test_message(500);
    let result = execute(&mut host, Fork::Homestead, &msg, &code, None);
    assert_eq!(result.status, ExecutionStatus::OutOfGas);
    assert_eq!(result.gas_left, 0);

    // Within the remainder the request is forwarded unshaved.
    let code = call_code(0, 100, &[0x00]);
    let mut host = MockHost::new(Fork::Homestead)
        .with_account(Address::from_low_u64_be(CALLEE), MockAccount::default())
        .with_call_result(success_result(0, &[]));
    let msg = test_message(1_000_000);
    let result = execute(&mut host, Fork::Homestead, &msg, &code, None);
    assert_eq!(result.status, ExecutionStatus::Success);
    assert_eq!(host.calls[0].gas, 100);
}

#[test]
fn create_pushes_the_new_address() {
    let created = Address::from_low_u64_be(0xDD);
    let canned = ExecutionResult {
        status: ExecutionStatus::Success,
        gas_left: 0,
        output: Bytes::new(),
        create_address: Some(created),
    };

    let mut init_word = [0u8; 32];
    init_word[..5].copy_from_slice(&[0x60, 0x01, 0x60, 0x02, 0x00]);
    let mut code = push32(U256::from_big_endian(&init_word));
    code.extend_from_slice(&[0x60, 0x00, 0x52]); // MSTORE at 0
    code.extend_from_slice(&[0x60, 0x05, 0x60, 0x00, 0x60, 0x00, 0xF0]); // CREATE(0, 0, 5)
    code.extend_from_slice(&[0x60, 0x00, 0x52, 0x60, 0x20, 0x60, 0x00, 0xF3]);

    let mut host = MockHost::new(Fork::Cancun).with_call_result(canned);
    let msg = test_message(1_000_000);
    let result = execute(&mut host, Fork::Cancun, &msg, &code, None);

    assert_eq!(result.status, ExecutionStatus::Success);
    let mut expected = [0u8; 32];
    expected[12..].copy_from_slice(created.as_bytes());
    assert_eq!(result.output.as_ref(), &expected);

    let child = &host.calls[0];
    assert_eq!(child.kind, CallKind::Create);
    assert_eq!(child.depth, 1);
    assert_eq!(child.sender, Address::from_low_u64_be(RECIPIENT));
    assert_eq!(child.recipient, Address::zero());
    assert_eq!(child.input.as_ref(), &init_word[..5]);
    assert!(child.gas > 0);
}

#[test]
fn create2_carries_the_salt() {
    let salt = U256::from(0x5A17);
    // Store a word of init code, then CREATE2 pops value, offset, len, salt.
    let mut code = push32(U256::zero());
    code.extend_from_slice(&[0x60, 0x00, 0x52]);
    code.extend_from_slice(&push32(salt));
    code.extend_from_slice(&[0x60, 0x04, 0x60, 0x00, 0x60, 0x00, 0xF5, 0x00]);

    let canned = ExecutionResult {
        status: ExecutionStatus::Success,
        gas_left: 0,
        output: Bytes::new(),
        create_address: Some(Address::from_low_u64_be(0xDD)),
    };
    let mut host = MockHost::new(Fork::Cancun).with_call_result(canned);
    let msg = test_message(1_000_000);
    let result = execute(&mut host, Fork::Cancun, &msg, &code, None);

    assert_eq!(result.status, ExecutionStatus::Success);
    let child = &host.calls[0];
    assert_eq!(child.kind, CallKind::Create2);
    assert_eq!(child.create2_salt, H256(salt.to_big_endian()));
}

#[test]
fn reverted_create_pushes_zero_and_keeps_revert_data() {
    let canned = ExecutionResult {
        status: ExecutionStatus::Revert,
        gas_left: 7,
        output: Bytes::from_static(&[0xEE]),
        create_address: None,
    };
    // CREATE(0, 0, 0), POP the zero, return RETURNDATASIZE.
    let code = hex::decode("600060006000f0503d60005260206000f3").unwrap();

    let mut host = MockHost::new(Fork::Cancun).with_call_result(canned);
    let msg = test_message(1_000_000);
    let result = execute(&mut host, Fork::Cancun, &msg, &code, None);
    assert_eq!(U256::from_big_endian(&result.output), U256::one());
}

#[test]
fn successful_create_clears_return_data() {
    let canned = ExecutionResult {
        status: ExecutionStatus::Success,
        gas_left: 0,
        output: Bytes::from_static(&[0xEE, 0xEE]),
        create_address: Some(Address::from_low_u64_be(0xDD)),
    };
    let code = hex::decode("600060006000f0503d60005260206000f3").unwrap();

    let mut host = MockHost::new(Fork::Cancun).with_call_result(canned);
    let msg = test_message(1_000_000);
    let result = execute(&mut host, Fork::Cancun, &msg, &code, None);
    assert_eq!(U256::from_big_endian(&result.output), U256::zero());
}

#[test]
fn create_in_a_static_frame_is_a_violation() {
    let code = hex::decode("600060006000f0").unwrap();
    let mut host = MockHost::new(Fork::Cancun);
    let mut msg = test_message(1_000_000);
    msg.is_static = true;
    let result = execute(&mut host, Fork::Cancun, &msg, &code, None);
    assert_eq!(result.status, ExecutionStatus::StaticModeViolation);
    assert!(host.calls.is_empty());
}

#[test]
fn recursive_host_runs_nested_frames() {
    // The callee's stored code returns 42; the parent returns the callee's
    // output from its return buffer.
    let child_code = hex::decode("602a60005260206000f3").unwrap();
    let code = call_code(0, 0xFFFF, &[0x50, 0x60, 0x20, 0x60, 0x00, 0xF3]);

    let mut host = MockHost::new(Fork::Cancun).with_account(
        Address::from_low_u64_be(CALLEE),
        MockAccount {
            balance: U256::zero(),
            code: Bytes::from(child_code),
        },
    );
    let msg = test_message(1_000_000);
    let result = execute(&mut host, Fork::Cancun, &msg, &code, None);

    assert_eq!(result.status, ExecutionStatus::Success);
    assert_eq!(U256::from_big_endian(&result.output), U256::from(42));
    assert_eq!(host.calls[0].depth, 1);
}

#[test]
fn selfdestruct_notifies_the_host() {
    let beneficiary = Address::from_low_u64_be(0xEE);
    let mut code = push20(beneficiary);
    code.push(0xFF);

    let mut host = MockHost::new(Fork::Cancun);
    let msg = test_message(1_000_000);
    let result = execute(&mut host, Fork::Cancun, &msg, &code, None);

    assert_eq!(result.status, ExecutionStatus::Success);
    // PUSH20 + static 5000 + cold beneficiary 2600; the recipient holds no
    // balance, so no account-creation charge applies.
    assert_eq!(result.gas_left, 1_000_000 - 3 - 5000 - 2600);
    assert_eq!(
        host.selfdestructs,
        vec![(Address::from_low_u64_be(RECIPIENT), beneficiary)]
    );
}

#[test]
fn selfdestruct_pays_for_creating_the_beneficiary() {
    let beneficiary = Address::from_low_u64_be(0xEE);
    let mut code = push20(beneficiary);
    code.push(0xFF);

    let mut host = MockHost::new(Fork::Cancun).with_account(
        Address::from_low_u64_be(RECIPIENT),
        MockAccount {
            balance: U256::from(10),
            code: Bytes::new(),
        },
    );
    let msg = test_message(1_000_000);
    let result = execute(&mut host, Fork::Cancun, &msg, &code, None);

    assert_eq!(result.status, ExecutionStatus::Success);
    assert_eq!(result.gas_left, 1_000_000 - 3 - 5000 - 2600 - 25000);
}

#[test]
fn selfdestruct_in_a_static_frame_is_a_violation() {
    let mut code = push20(Address::from_low_u64_be(0xEE));
    code.push(0xFF);

    let mut host = MockHost::new(Fork::Cancun);
    let mut msg = test_message(1_000_000);
    msg.is_static = true;
    let result = execute(&mut host, Fork::Cancun, &msg, &code, None);

    assert_eq!(result.status, ExecutionStatus::StaticModeViolation);
    assert!(host.selfdestructs.is_empty());
}

#[test]
fn call_runs_on_a_full_stack() {
    // Fill the stack to its 1024-slot limit, the top seven slots being the
    // CALL operands (all zero: a zero-gas call to the zero address). CALL
    // nets the stack down by six, so a full stack must not overflow.
    let mut code = Vec::new();
    for _ in 0..1024 {
        code.extend_from_slice(&[0x60, 0x00]);
    }
    code.push(0xF1);

    let mut host = MockHost::new(Fork::Cancun).with_call_result(success_result(0, &[]));
    let msg = test_message(1_000_000);
    let result = execute(&mut host, Fork::Cancun, &msg, &code, None);

    assert_ne!(result.status, ExecutionStatus::StackOverflow);
    assert_eq!(result.status, ExecutionStatus::Success);
    assert_eq!(host.calls.len(), 1);
}

#[test]
fn analysis_can_be_reused_across_frames() {
    let code = hex::decode("600160020160005260206000f3").unwrap();
    let analysis = bevm::CodeAnalysis::analyze(&code);
    let msg = test_message(1_000_000);

    let mut host = MockHost::new(Fork::Cancun);
    let first = bevm::execute_with_analysis(&mut host, Fork::Cancun, &msg, &analysis, None);
    let second = bevm::execute_with_analysis(&mut host, Fork::Cancun, &msg, &analysis, None);
    assert_eq!(first, second);
    assert_eq!(first.status, ExecutionStatus::Success);
}

