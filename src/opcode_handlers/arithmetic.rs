//! # Arithmetic operations
//!
//! Includes the following opcodes:
//!   - `ADD`
//!   - `SUB`
//!   - `MUL`
//!   - `DIV`
//!   - `SDIV`
//!   - `MOD`
//!   - `SMOD`
//!   - `ADDMOD`
//!   - `MULMOD`
//!   - `EXP`
//!   - `SIGNEXTEND`

use crate::{
    errors::{OpcodeResult, VMError},
    gas_cost,
    opcode_handlers::OpcodeHandler,
    vm::VM,
};
use ethereum_types::{U256, U512};

/// Implementation for the `ADD` opcode.
pub struct OpAddHandler;
impl OpcodeHandler for OpAddHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let [lhs, rhs] = vm.stack.pop()?;
        let (res, _) = lhs.overflowing_add(rhs);
        vm.stack.push(res)?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `SUB` opcode.
pub struct OpSubHandler;
impl OpcodeHandler for OpSubHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let [lhs, rhs] = vm.stack.pop()?;
        let (res, _) = lhs.overflowing_sub(rhs);
        vm.stack.push(res)?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `MUL` opcode.
pub struct OpMulHandler;
impl OpcodeHandler for OpMulHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let [lhs, rhs] = vm.stack.pop()?;
        let (res, _) = lhs.overflowing_mul(rhs);
        vm.stack.push(res)?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `DIV` opcode. Division by zero yields zero.
pub struct OpDivHandler;
impl OpcodeHandler for OpDivHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let [lhs, rhs] = vm.stack.pop()?;
        match lhs.checked_div(rhs) {
            Some(res) => vm.stack.push(res)?,
            None => vm.stack.push_zero()?,
        }

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `SDIV` opcode: two's-complement signed division.
pub struct OpSDivHandler;
impl OpcodeHandler for OpSDivHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let [mut lhs, mut rhs] = vm.stack.pop()?;

        let mut sign = false;
        if lhs.bit(255) {
            lhs = twos_complement(lhs);
            sign = !sign;
        }
        if rhs.bit(255) {
            rhs = twos_complement(rhs);
            sign = !sign;
        }

        match lhs.checked_div(rhs) {
            Some(mut res) => {
                if sign {
                    res = twos_complement(res);
                }
                vm.stack.push(res)?
            }
            None => vm.stack.push_zero()?,
        }

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `MOD` opcode. A zero modulus yields zero.
pub struct OpModHandler;
impl OpcodeHandler for OpModHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let [lhs, rhs] = vm.stack.pop()?;
        match lhs.checked_rem(rhs) {
            Some(res) => vm.stack.push(res)?,
            None => vm.stack.push_zero()?,
        }

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `SMOD` opcode: the result takes the dividend's
/// sign.
pub struct OpSModHandler;
impl OpcodeHandler for OpSModHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let [mut lhs, mut rhs] = vm.stack.pop()?;

        let sign = lhs.bit(255);
        if sign {
            lhs = twos_complement(lhs);
        }
        if rhs.bit(255) {
            rhs = twos_complement(rhs);
        }

        match lhs.checked_rem(rhs) {
            Some(mut res) => {
                if sign {
                    res = twos_complement(res);
                }
                vm.stack.push(res)?
            }
            None => vm.stack.push_zero()?,
        }

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `ADDMOD` opcode, computed in 512 bits so the
/// intermediate sum never wraps.
pub struct OpAddModHandler;
impl OpcodeHandler for OpAddModHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let [lhs, rhs, modulus] = vm.stack.pop()?;
        if modulus.is_zero() || modulus == U256::one() {
            vm.stack.push_zero()?;
        } else {
            let sum = U512::from(lhs) + U512::from(rhs);
            let res = sum % U512::from(modulus);
            vm.stack.push(u512_low_word(res))?;
        }

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `MULMOD` opcode.
pub struct OpMulModHandler;
impl OpcodeHandler for OpMulModHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let [lhs, rhs, modulus] = vm.stack.pop()?;
        if lhs.is_zero() || rhs.is_zero() || modulus.is_zero() {
            vm.stack.push_zero()?;
        } else {
            let product = lhs.full_mul(rhs);
            let res = product % U512::from(modulus);
            vm.stack.push(u512_low_word(res))?;
        }

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `EXP` opcode. The dynamic cost scales with the
/// byte length of the exponent.
pub struct OpExpHandler;
impl OpcodeHandler for OpExpHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let [base, exponent] = vm.stack.pop()?;
        vm.consume_gas(gas_cost::exp(exponent, vm.rev)?)?;

        let (res, _) = base.overflowing_pow(exponent);
        vm.stack.push(res)?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `SIGNEXTEND` opcode: extend the sign bit of a
/// value that is `index + 1` bytes wide.
pub struct OpSignExtendHandler;
impl OpcodeHandler for OpSignExtendHandler {
    fn eval(vm: &mut VM<'_, '_>) -> Result<OpcodeResult, VMError> {
        let [index, mut value] = vm.stack.pop()?;
        vm.stack.push(match usize::try_from(index) {
            Ok(x) if x < 32 => {
                if value.bit(8 * x + 7) {
                    // Shifting by 256 when x == 31 yields zero, leaving the
                    // already fully-signed value untouched.
                    value = value | (U256::MAX << (8 * (x + 1)));
                } else if x != 31 {
                    value = value & ((U256::one() << (8 * (x + 1))) - 1);
                }
                value
            }
            _ => value,
        })?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

fn twos_complement(value: U256) -> U256 {
    (!value).overflowing_add(U256::one()).0
}

/// The low 256 bits of a 512-bit value known to fit.
fn u512_low_word(value: U512) -> U256 {
    U256([value.0[0], value.0[1], value.0[2], value.0[3]])
}
