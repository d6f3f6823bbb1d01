//! # Comparison and bitwise logic operations
//!
//! Includes the following opcodes:
//!   - `LT`, `GT`, `SLT`, `SGT`, `EQ`, `ISZERO`
//!   - `AND`, `OR`, `XOR`, `NOT`
//!   - `BYTE`, `SHL`, `SHR`, `SAR`

use crate::{
    constants::WORD_SIZE_IN_BYTES_USIZE,
    errors::{OpcodeResult, VMError},
    opcode_handlers::OpcodeHandler,
    vm::VM,
};
use ethereum_types::U256;

/// Implementation for the `LT` opcode.
pub struct OpLtHandler;
impl OpcodeHandler for OpLtHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let [lhs, rhs] = vm.stack.pop()?;
        vm.stack.push(u256_from_bool(lhs < rhs))?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `GT` opcode.
pub struct OpGtHandler;
impl OpcodeHandler for OpGtHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let [lhs, rhs] = vm.stack.pop()?;
        vm.stack.push(u256_from_bool(lhs > rhs))?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `SLT` opcode (signed less-than).
pub struct OpSltHandler;
impl OpcodeHandler for OpSltHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let [lhs, rhs] = vm.stack.pop()?;
        let lhs_is_negative = lhs.bit(255);
        let rhs_is_negative = rhs.bit(255);
        let res = if lhs_is_negative == rhs_is_negative {
            // Same sign: two's-complement order matches unsigned order.
            u256_from_bool(lhs < rhs)
        } else {
            u256_from_bool(lhs_is_negative)
        };
        vm.stack.push(res)?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `SGT` opcode (signed greater-than).
pub struct OpSgtHandler;
impl OpcodeHandler for OpSgtHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let [lhs, rhs] = vm.stack.pop()?;
        let lhs_is_negative = lhs.bit(255);
        let rhs_is_negative = rhs.bit(255);
        let res = if lhs_is_negative == rhs_is_negative {
            u256_from_bool(lhs > rhs)
        } else {
            u256_from_bool(rhs_is_negative)
        };
        vm.stack.push(res)?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `EQ` opcode.
pub struct OpEqHandler;
impl OpcodeHandler for OpEqHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let [lhs, rhs] = vm.stack.pop()?;
        vm.stack.push(u256_from_bool(lhs == rhs))?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `ISZERO` opcode.
pub struct OpIsZeroHandler;
impl OpcodeHandler for OpIsZeroHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let operand = vm.stack.pop1()?;
        vm.stack.push(u256_from_bool(operand.is_zero()))?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `AND` opcode.
pub struct OpAndHandler;
impl OpcodeHandler for OpAndHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let [lhs, rhs] = vm.stack.pop()?;
        vm.stack.push(lhs & rhs)?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `OR` opcode.
pub struct OpOrHandler;
impl OpcodeHandler for OpOrHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let [lhs, rhs] = vm.stack.pop()?;
        vm.stack.push(lhs | rhs)?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `XOR` opcode.
pub struct OpXorHandler;
impl OpcodeHandler for OpXorHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let [lhs, rhs] = vm.stack.pop()?;
        vm.stack.push(lhs ^ rhs)?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `NOT` opcode.
pub struct OpNotHandler;
impl OpcodeHandler for OpNotHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let operand = vm.stack.pop1()?;
        vm.stack.push(!operand)?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `BYTE` opcode: byte `index` of the word, counting
/// from the most significant end; out-of-range indices yield zero.
pub struct OpByteHandler;
impl OpcodeHandler for OpByteHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let [index, word] = vm.stack.pop()?;
        match usize::try_from(index) {
            Ok(index) if index < WORD_SIZE_IN_BYTES_USIZE => {
                // U256::byte counts from the least significant end.
                vm.stack
                    .push(U256::from(word.byte(WORD_SIZE_IN_BYTES_USIZE - 1 - index)))?
            }
            _ => vm.stack.push_zero()?,
        }

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `SHL` opcode; shifts of 256 or more yield zero.
pub struct OpShlHandler;
impl OpcodeHandler for OpShlHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let [shift, value] = vm.stack.pop()?;
        match usize::try_from(shift) {
            Ok(shift) if shift < 256 => vm.stack.push(value << shift)?,
            _ => vm.stack.push_zero()?,
        }

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `SHR` opcode (logical right shift).
pub struct OpShrHandler;
impl OpcodeHandler for OpShrHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let [shift, value] = vm.stack.pop()?;
        match usize::try_from(shift) {
            Ok(shift) if shift < 256 => vm.stack.push(value >> shift)?,
            _ => vm.stack.push_zero()?,
        }

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `SAR` opcode (arithmetic right shift): the sign
/// bit back-fills, and an over-large shift of a negative value saturates to
/// all ones.
pub struct OpSarHandler;
impl OpcodeHandler for OpSarHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let [shift, value] = vm.stack.pop()?;
        let is_negative = value.bit(255);

        let res = match usize::try_from(shift) {
            Ok(shift) if shift < 256 => {
                let shifted = value >> shift;
                if is_negative && shift > 0 {
                    shifted | (U256::MAX << (256 - shift))
                } else {
                    shifted
                }
            }
            _ if is_negative => U256::MAX,
            _ => U256::zero(),
        };
        vm.stack.push(res)?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

fn u256_from_bool(value: bool) -> U256 {
    if value {
        U256::one()
    } else {
        U256::zero()
    }
}
