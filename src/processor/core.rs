//! Fetch, decode and dispatch. One call to [`dispatch`] executes exactly one
//! instruction (or the hardware trap) and produces the signals the caller
//! observes; [`super::step`] is the thin public wrapper around it.

use num_traits::FromPrimitive;

use super::logic::{apply_flags, combine, eval_binop, eval_unop, BinOp, UnOp};
use crate::constants::{HARDWARE_INTERRUPT_VECTOR, MAX_PORT, MAX_SP};
use crate::error::RuntimeError;
use crate::memory::Memory;
use crate::opcode::OpCode;
use crate::register::{RegisterId, Registers, StatusFlag};
use crate::signals::{OutputData, SignalsIn, SignalsOut};

fn advance(ip: u8, len: u8) -> Result<u8, RuntimeError> {
    ip.checked_add(len).ok_or(RuntimeError::RunBeyondEndOfMemory)
}

fn operand_byte(memory: &Memory, ip: u8, offset: u8) -> Result<u8, RuntimeError> {
    let address = advance(ip, offset)?;
    Ok(memory[address])
}

fn push(memory: &mut Memory, registers: &mut Registers, value: u8) -> Result<(), RuntimeError> {
    memory[registers.sp] = value;
    registers.sp = registers
        .sp
        .checked_sub(1)
        .ok_or(RuntimeError::StackOverflow)?;
    Ok(())
}

fn pop(memory: &Memory, registers: &mut Registers) -> Result<u8, RuntimeError> {
    let next_sp = registers
        .sp
        .checked_add(1)
        .ok_or(RuntimeError::StackUnderflow)?;
    if next_sp > MAX_SP {
        return Err(RuntimeError::StackUnderflow);
    }
    registers.sp = next_sp;
    Ok(memory[registers.sp])
}

fn validate_port(port: u8) -> Result<(), RuntimeError> {
    if port > MAX_PORT {
        Err(RuntimeError::InvalidPort(port))
    } else {
        Ok(())
    }
}

/// Executes the hardware interrupt trap: pushes the current `ip` (the
/// instruction it preempted is never fetched) and jumps to the fixed
/// hardware vector. Never fails except on stack overflow.
fn hardware_trap(memory: &mut Memory, registers: &mut Registers) -> Result<(), RuntimeError> {
    let ip = registers.ip;
    push(memory, registers, ip)?;
    registers.ip = memory[HARDWARE_INTERRUPT_VECTOR];
    Ok(())
}

/// Decodes and executes one instruction starting at `registers.ip`, or the
/// hardware trap if one is pending. Mutates `memory`/`registers` in place
/// and returns the signals this step produced.
pub(super) fn dispatch(
    memory: &mut Memory,
    registers: &mut Registers,
    signals_in: &SignalsIn,
) -> Result<SignalsOut, RuntimeError> {
    let mut out = SignalsOut::default();

    if signals_in.interrupt && registers.flag(StatusFlag::Interrupt) {
        hardware_trap(memory, registers)?;
        return Ok(out);
    }

    let ip = registers.ip;
    let byte = memory[ip];
    let opcode = OpCode::from_u8(byte).ok_or(RuntimeError::InvalidOpcode(byte))?;

    match opcode {
        OpCode::Nop => registers.ip = advance(ip, opcode.encoded_len())?,

        OpCode::End | OpCode::Halt => {
            out.halted = true;
        }

        OpCode::Sti => {
            registers.set_flag(StatusFlag::Interrupt, true);
            registers.ip = advance(ip, opcode.encoded_len())?;
        }
        OpCode::Cli => {
            registers.set_flag(StatusFlag::Interrupt, false);
            registers.ip = advance(ip, opcode.encoded_len())?;
        }
        OpCode::Clo => {
            out.close_windows = true;
            registers.ip = advance(ip, opcode.encoded_len())?;
        }

        OpCode::Pushf => {
            let byte = registers.flags_to_byte();
            push(memory, registers, byte)?;
            registers.ip = advance(ip, opcode.encoded_len())?;
        }
        OpCode::Popf => {
            let byte = pop(memory, registers)?;
            registers.flags_from_byte(byte);
            registers.ip = advance(ip, opcode.encoded_len())?;
        }

        OpCode::Ret | OpCode::Iret => {
            registers.ip = pop(memory, registers)?;
        }

        OpCode::AddRegToReg
        | OpCode::SubRegFromReg
        | OpCode::MulRegWithReg
        | OpCode::DivRegWithReg
        | OpCode::ModRegWithReg
        | OpCode::AndRegWithReg
        | OpCode::OrRegWithReg
        | OpCode::XorRegWithReg
        | OpCode::CmpRegWithReg => {
            let dest = RegisterId::from_index(operand_byte(memory, ip, 1)?)?;
            let src = RegisterId::from_index(operand_byte(memory, ip, 2)?)?;
            let previous = registers.get(dest);
            let operand = registers.get(src);
            let raw = eval_binop(bin_op_of(opcode), previous, operand)?;
            let result = combine(previous, raw);
            apply_flags(registers, &result);
            if opcode != OpCode::CmpRegWithReg {
                registers.set(dest, result.final_value);
            }
            registers.ip = advance(ip, opcode.encoded_len())?;
        }

        OpCode::AddNumToReg
        | OpCode::SubNumFromReg
        | OpCode::MulNumWithReg
        | OpCode::DivNumWithReg
        | OpCode::ModNumWithReg
        | OpCode::AndNumWithReg
        | OpCode::OrNumWithReg
        | OpCode::XorNumWithReg
        | OpCode::CmpRegWithNum => {
            let dest = RegisterId::from_index(operand_byte(memory, ip, 1)?)?;
            let operand = operand_byte(memory, ip, 2)?;
            let previous = registers.get(dest);
            let raw = eval_binop(bin_op_of(opcode), previous, operand)?;
            let result = combine(previous, raw);
            apply_flags(registers, &result);
            if opcode != OpCode::CmpRegWithNum {
                registers.set(dest, result.final_value);
            }
            registers.ip = advance(ip, opcode.encoded_len())?;
        }

        OpCode::IncReg
        | OpCode::DecReg
        | OpCode::NotReg
        | OpCode::RolReg
        | OpCode::RorReg
        | OpCode::ShlReg
        | OpCode::ShrReg => {
            let dest = RegisterId::from_index(operand_byte(memory, ip, 1)?)?;
            let previous = registers.get(dest);
            let raw = eval_unop(un_op_of(opcode), previous);
            let result = combine(previous, raw);
            apply_flags(registers, &result);
            registers.set(dest, result.final_value);
            registers.ip = advance(ip, opcode.encoded_len())?;
        }

        OpCode::Jmp
        | OpCode::Jz
        | OpCode::Jnz
        | OpCode::Js
        | OpCode::Jns
        | OpCode::Jo
        | OpCode::Jno => {
            let displacement = operand_byte(memory, ip, 1)? as i8;
            let taken = match opcode {
                OpCode::Jmp => true,
                OpCode::Jz => registers.flag(StatusFlag::Zero),
                OpCode::Jnz => !registers.flag(StatusFlag::Zero),
                OpCode::Js => registers.flag(StatusFlag::Sign),
                OpCode::Jns => !registers.flag(StatusFlag::Sign),
                OpCode::Jo => registers.flag(StatusFlag::Overflow),
                OpCode::Jno => !registers.flag(StatusFlag::Overflow),
                _ => unreachable!(),
            };
            registers.ip = if taken {
                // Relative to the displacement byte itself, matching the
                // assembler's `target - (statement_address + 1)` formula.
                advance(ip, 1)?.wrapping_add(displacement as u8)
            } else {
                advance(ip, opcode.encoded_len())?
            };
        }

        OpCode::MovNumToReg => {
            let dest = RegisterId::from_index(operand_byte(memory, ip, 1)?)?;
            let value = operand_byte(memory, ip, 2)?;
            registers.set(dest, value);
            registers.ip = advance(ip, opcode.encoded_len())?;
        }
        OpCode::MovAddrToReg => {
            let dest = RegisterId::from_index(operand_byte(memory, ip, 1)?)?;
            let address = operand_byte(memory, ip, 2)?;
            registers.set(dest, memory[address]);
            registers.ip = advance(ip, opcode.encoded_len())?;
        }
        OpCode::MovRegAddrToReg => {
            let dest = RegisterId::from_index(operand_byte(memory, ip, 1)?)?;
            let address_reg = RegisterId::from_index(operand_byte(memory, ip, 2)?)?;
            let address = registers.get(address_reg);
            registers.set(dest, memory[address]);
            registers.ip = advance(ip, opcode.encoded_len())?;
        }
        OpCode::MovRegToAddr => {
            let address = operand_byte(memory, ip, 1)?;
            let src = RegisterId::from_index(operand_byte(memory, ip, 2)?)?;
            memory[address] = registers.get(src);
            registers.ip = advance(ip, opcode.encoded_len())?;
        }
        OpCode::MovRegToRegAddr => {
            let address_reg = RegisterId::from_index(operand_byte(memory, ip, 1)?)?;
            let src = RegisterId::from_index(operand_byte(memory, ip, 2)?)?;
            let address = registers.get(address_reg);
            memory[address] = registers.get(src);
            registers.ip = advance(ip, opcode.encoded_len())?;
        }

        OpCode::PushFromReg => {
            let src = RegisterId::from_index(operand_byte(memory, ip, 1)?)?;
            let value = registers.get(src);
            push(memory, registers, value)?;
            registers.ip = advance(ip, opcode.encoded_len())?;
        }
        OpCode::PopToReg => {
            let dest = RegisterId::from_index(operand_byte(memory, ip, 1)?)?;
            let value = pop(memory, registers)?;
            registers.set(dest, value);
            registers.ip = advance(ip, opcode.encoded_len())?;
        }

        OpCode::CallAddr => {
            let target = operand_byte(memory, ip, 1)?;
            let return_address = advance(ip, opcode.encoded_len())?;
            push(memory, registers, return_address)?;
            registers.ip = target;
        }

        OpCode::IntAddr => {
            let vector = operand_byte(memory, ip, 1)?;
            let return_address = advance(ip, opcode.encoded_len())?;
            push(memory, registers, return_address)?;
            registers.ip = memory[vector];
        }

        OpCode::InFromPortToAl => {
            let port = operand_byte(memory, ip, 1)?;
            validate_port(port)?;
            if signals_in.data.port == port && signals_in.data.content.is_some() {
                registers.set(RegisterId::AL, signals_in.data.content.unwrap());
                registers.ip = advance(ip, opcode.encoded_len())?;
            } else {
                out.required_input_port = Some(port);
            }
        }
        OpCode::OutFromAlToPort => {
            let port = operand_byte(memory, ip, 1)?;
            validate_port(port)?;
            out.data = Some(OutputData {
                content: registers.get(RegisterId::AL),
                port,
            });
            registers.ip = advance(ip, opcode.encoded_len())?;
        }
    }

    Ok(out)
}

fn bin_op_of(opcode: OpCode) -> BinOp {
    match opcode {
        OpCode::AddRegToReg | OpCode::AddNumToReg => BinOp::Add,
        OpCode::SubRegFromReg | OpCode::SubNumFromReg => BinOp::Sub,
        OpCode::MulRegWithReg | OpCode::MulNumWithReg => BinOp::Mul,
        OpCode::DivRegWithReg | OpCode::DivNumWithReg => BinOp::Div,
        OpCode::ModRegWithReg | OpCode::ModNumWithReg => BinOp::Mod,
        OpCode::AndRegWithReg | OpCode::AndNumWithReg => BinOp::And,
        OpCode::OrRegWithReg | OpCode::OrNumWithReg => BinOp::Or,
        OpCode::XorRegWithReg | OpCode::XorNumWithReg => BinOp::Xor,
        OpCode::CmpRegWithReg | OpCode::CmpRegWithNum => BinOp::Sub,
        _ => unreachable!("bin_op_of called with a non-binary opcode"),
    }
}

fn un_op_of(opcode: OpCode) -> UnOp {
    match opcode {
        OpCode::IncReg => UnOp::Inc,
        OpCode::DecReg => UnOp::Dec,
        OpCode::NotReg => UnOp::Not,
        OpCode::RolReg => UnOp::Rol,
        OpCode::RorReg => UnOp::Ror,
        OpCode::ShlReg => UnOp::Shl,
        OpCode::ShrReg => UnOp::Shr,
        _ => unreachable!("un_op_of called with a non-unary opcode"),
    }
}
