//! Pure arithmetic helpers shared by every opcode that writes a flag-setting
//! result back to a register (or, for `CMP`, computes flags without writing
//! back). Kept separate from [`super::core`]'s dispatch so the flag rule in
//! spec §4.4 has exactly one implementation.

use crate::register::{Registers, StatusFlag};

/// The result of evaluating one flag-setting operation, before it is
/// written back (or, for compares, discarded).
pub(crate) struct ArithResult {
    pub final_value: u8,
    pub zero: bool,
    pub overflow: bool,
    pub sign: bool,
}

/// Normalises a wide raw result into an 8-bit value and derives the three
/// arithmetic flags from it, per spec §4.4's flag rule. The interrupt flag
/// is never touched here: callers preserve it by construction, since this
/// function only ever writes the other three.
pub(crate) fn combine(previous: u8, raw: i32) -> ArithResult {
    let final_value = raw.rem_euclid(256) as u8;
    let overflow = (previous < 0x80) != (final_value < 0x80);
    ArithResult {
        final_value,
        zero: final_value == 0,
        overflow,
        sign: final_value >= 0x80,
    }
}

pub(crate) fn apply_flags(registers: &mut Registers, result: &ArithResult) {
    registers.set_flag(StatusFlag::Zero, result.zero);
    registers.set_flag(StatusFlag::Overflow, result.overflow);
    registers.set_flag(StatusFlag::Sign, result.sign);
}

#[derive(Clone, Copy)]
pub(crate) enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    Xor,
}

pub(crate) fn eval_binop(
    op: BinOp,
    previous: u8,
    operand: u8,
) -> Result<i32, crate::error::RuntimeError> {
    use crate::error::RuntimeError;

    Ok(match op {
        BinOp::Add => previous as i32 + operand as i32,
        BinOp::Sub => previous as i32 - operand as i32,
        BinOp::Mul => previous as i32 * operand as i32,
        BinOp::Div => {
            if operand == 0 {
                return Err(RuntimeError::DivideByZero);
            }
            (previous / operand) as i32
        }
        BinOp::Mod => {
            if operand == 0 {
                return Err(RuntimeError::DivideByZero);
            }
            (previous % operand) as i32
        }
        BinOp::And => (previous & operand) as i32,
        BinOp::Or => (previous | operand) as i32,
        BinOp::Xor => (previous ^ operand) as i32,
    })
}

#[derive(Clone, Copy)]
pub(crate) enum UnOp {
    Inc,
    Dec,
    Not,
    Rol,
    Ror,
    Shl,
    Shr,
}

pub(crate) fn eval_unop(op: UnOp, previous: u8) -> i32 {
    match op {
        UnOp::Inc => previous as i32 + 1,
        UnOp::Dec => previous as i32 - 1,
        UnOp::Not => !previous as i32,
        UnOp::Rol => previous.rotate_left(1) as i32,
        UnOp::Ror => previous.rotate_right(1) as i32,
        UnOp::Shl => (previous as i32) << 1,
        UnOp::Shr => (previous as i32) >> 1,
    }
}
