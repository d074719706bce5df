//! Mnemonic -> opcode resolution tables (spec §4.2). Each mnemonic accepts
//! one or more operand-type shapes; MOV alone has five. A single static
//! table is the source of truth for both resolution and the diagnostics
//! `assemble_instruction` raises when a shape doesn't match.

use vcpu8::OpCode;

use crate::operand::OperandType;

struct Shape {
    mnemonic: &'static str,
    operands: &'static [OperandType],
    opcode: OpCode,
}

#[rustfmt::skip]
const SHAPES: &[Shape] = {
    use OperandType::*;
    &[
        Shape { mnemonic: "NOP",   operands: &[], opcode: OpCode::Nop },
        Shape { mnemonic: "END",   operands: &[], opcode: OpCode::End },
        Shape { mnemonic: "HALT",  operands: &[], opcode: OpCode::Halt },
        Shape { mnemonic: "STI",   operands: &[], opcode: OpCode::Sti },
        Shape { mnemonic: "CLI",   operands: &[], opcode: OpCode::Cli },
        Shape { mnemonic: "CLO",   operands: &[], opcode: OpCode::Clo },
        Shape { mnemonic: "PUSHF", operands: &[], opcode: OpCode::Pushf },
        Shape { mnemonic: "POPF",  operands: &[], opcode: OpCode::Popf },
        Shape { mnemonic: "RET",   operands: &[], opcode: OpCode::Ret },
        Shape { mnemonic: "IRET",  operands: &[], opcode: OpCode::Iret },

        Shape { mnemonic: "ADD", operands: &[Register, Register], opcode: OpCode::AddRegToReg },
        Shape { mnemonic: "ADD", operands: &[Register, Number], opcode: OpCode::AddNumToReg },
        Shape { mnemonic: "SUB", operands: &[Register, Register], opcode: OpCode::SubRegFromReg },
        Shape { mnemonic: "SUB", operands: &[Register, Number], opcode: OpCode::SubNumFromReg },
        Shape { mnemonic: "MUL", operands: &[Register, Register], opcode: OpCode::MulRegWithReg },
        Shape { mnemonic: "MUL", operands: &[Register, Number], opcode: OpCode::MulNumWithReg },
        Shape { mnemonic: "DIV", operands: &[Register, Register], opcode: OpCode::DivRegWithReg },
        Shape { mnemonic: "DIV", operands: &[Register, Number], opcode: OpCode::DivNumWithReg },
        Shape { mnemonic: "MOD", operands: &[Register, Register], opcode: OpCode::ModRegWithReg },
        Shape { mnemonic: "MOD", operands: &[Register, Number], opcode: OpCode::ModNumWithReg },
        Shape { mnemonic: "AND", operands: &[Register, Register], opcode: OpCode::AndRegWithReg },
        Shape { mnemonic: "AND", operands: &[Register, Number], opcode: OpCode::AndNumWithReg },
        Shape { mnemonic: "OR",  operands: &[Register, Register], opcode: OpCode::OrRegWithReg },
        Shape { mnemonic: "OR",  operands: &[Register, Number], opcode: OpCode::OrNumWithReg },
        Shape { mnemonic: "XOR", operands: &[Register, Register], opcode: OpCode::XorRegWithReg },
        Shape { mnemonic: "XOR", operands: &[Register, Number], opcode: OpCode::XorNumWithReg },
        Shape { mnemonic: "CMP", operands: &[Register, Register], opcode: OpCode::CmpRegWithReg },
        Shape { mnemonic: "CMP", operands: &[Register, Number], opcode: OpCode::CmpRegWithNum },

        Shape { mnemonic: "INC", operands: &[Register], opcode: OpCode::IncReg },
        Shape { mnemonic: "DEC", operands: &[Register], opcode: OpCode::DecReg },
        Shape { mnemonic: "NOT", operands: &[Register], opcode: OpCode::NotReg },
        Shape { mnemonic: "ROL", operands: &[Register], opcode: OpCode::RolReg },
        Shape { mnemonic: "ROR", operands: &[Register], opcode: OpCode::RorReg },
        Shape { mnemonic: "SHL", operands: &[Register], opcode: OpCode::ShlReg },
        Shape { mnemonic: "SHR", operands: &[Register], opcode: OpCode::ShrReg },

        Shape { mnemonic: "JMP", operands: &[Label], opcode: OpCode::Jmp },
        Shape { mnemonic: "JZ",  operands: &[Label], opcode: OpCode::Jz },
        Shape { mnemonic: "JNZ", operands: &[Label], opcode: OpCode::Jnz },
        Shape { mnemonic: "JS",  operands: &[Label], opcode: OpCode::Js },
        Shape { mnemonic: "JNS", operands: &[Label], opcode: OpCode::Jns },
        Shape { mnemonic: "JO",  operands: &[Label], opcode: OpCode::Jo },
        Shape { mnemonic: "JNO", operands: &[Label], opcode: OpCode::Jno },

        Shape { mnemonic: "MOV", operands: &[Register, Number], opcode: OpCode::MovNumToReg },
        Shape { mnemonic: "MOV", operands: &[Register, Address], opcode: OpCode::MovAddrToReg },
        Shape { mnemonic: "MOV", operands: &[Register, RegisterAddress], opcode: OpCode::MovRegAddrToReg },
        Shape { mnemonic: "MOV", operands: &[Address, Register], opcode: OpCode::MovRegToAddr },
        Shape { mnemonic: "MOV", operands: &[RegisterAddress, Register], opcode: OpCode::MovRegToRegAddr },

        Shape { mnemonic: "PUSH", operands: &[Register], opcode: OpCode::PushFromReg },
        Shape { mnemonic: "POP",  operands: &[Register], opcode: OpCode::PopToReg },

        Shape { mnemonic: "CALL", operands: &[Label], opcode: OpCode::CallAddr },
        Shape { mnemonic: "INT",  operands: &[Number], opcode: OpCode::IntAddr },
        Shape { mnemonic: "INT",  operands: &[Address], opcode: OpCode::IntAddr },

        Shape { mnemonic: "IN",  operands: &[Number], opcode: OpCode::InFromPortToAl },
        Shape { mnemonic: "OUT", operands: &[Number], opcode: OpCode::OutFromAlToPort },
    ]
};

/// Resolves a mnemonic and its operands' types to the opcode it encodes,
/// or `None` if this mnemonic never accepts that shape of operands.
pub fn resolve(mnemonic: &str, operands: &[OperandType]) -> Option<OpCode> {
    SHAPES
        .iter()
        .find(|shape| shape.mnemonic == mnemonic && shape.operands == operands)
        .map(|shape| shape.opcode)
}

/// The operand types that would have made `mnemonic` resolve, given the
/// shape it was actually handed. Shapes with the same arity as `operands`
/// are preferred (so a two-operand call against a one-operand mnemonic
/// doesn't just re-suggest the one-operand shapes); within those, the
/// first operand position that doesn't match any candidate narrows the
/// list further, mirroring spec.md §4.2's "expected set depends on the
/// first operand's type" rule. Empty if `mnemonic` isn't in the table at
/// all (an unknown mnemonic is diagnosed separately).
pub fn expected_operand_types(mnemonic: &str, operands: &[OperandType]) -> Vec<OperandType> {
    let all: Vec<&[OperandType]> = SHAPES
        .iter()
        .filter(|shape| shape.mnemonic == mnemonic)
        .map(|shape| shape.operands)
        .collect();
    if all.is_empty() {
        return Vec::new();
    }

    let same_arity: Vec<&[OperandType]> = all
        .iter()
        .copied()
        .filter(|shape| shape.len() == operands.len())
        .collect();
    let mut pool = if same_arity.is_empty() { all } else { same_arity };
    let mut mismatch_at = 0;

    for (i, given) in operands.iter().enumerate() {
        let narrowed: Vec<&[OperandType]> = pool
            .iter()
            .copied()
            .filter(|shape| shape.get(i) == Some(given))
            .collect();
        if narrowed.is_empty() {
            mismatch_at = i;
            break;
        }
        pool = narrowed;
        mismatch_at = i + 1;
    }

    let mut expected = Vec::new();
    for shape in &pool {
        if let Some(kind) = shape.get(mismatch_at) {
            if !expected.contains(kind) {
                expected.push(*kind);
            }
        }
    }
    expected
}

/// Mnemonics that are assembler directives rather than opcodes. These never
/// appear in [`SHAPES`] because they do not encode to a single opcode byte.
pub fn is_directive(mnemonic: &str) -> bool {
    matches!(mnemonic, "ORG" | "DB")
}

/// Whether `mnemonic` names any known instruction or directive, regardless
/// of whether the operands given to it are well-formed. Used to tell a
/// typo'd mnemonic apart from a known one given the wrong operand shape.
pub fn is_known(mnemonic: &str) -> bool {
    SHAPES.iter().any(|shape| shape.mnemonic == mnemonic) || is_directive(mnemonic)
}
