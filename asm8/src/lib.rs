//! Assembler for the 8-bit machine `vcpu8` simulates: turns assembly
//! source text into the 256-byte image `vcpu8::step` runs, plus a source
//! map back from address to statement for anything built on top (a
//! debugger, a disassembler).
//!
//! ```
//! let assembled = asm8::assemble("MOV AL, 01\nEND\n").unwrap();
//! assert_eq!(assembled.image[0], vcpu8::OpCode::MovNumToReg as u8);
//! ```

mod driver;
mod error;
mod label;
mod mnemonic;
mod operand;
mod source_map;
mod statement;
mod token;

pub use driver::{assemble, Assembled};
pub use error::{AssemblerError, ErrorKind};
pub use label::{Label, LabelMap};
pub use operand::{Operand, OperandType};
pub use source_map::SourceMap;
pub use statement::{Instruction, Statement};
pub use token::{Token, TokenType};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assembling_rejects_an_empty_program() {
        let err = assemble("").unwrap_err();
        assert_eq!(err.kind, ErrorKind::MissingEnd);
    }

    #[test]
    fn a_full_program_exercises_arithmetic_jumps_and_io() {
        let source = "\
            START:\n\
            MOV AL, 05\n\
            MOV BL, 00\n\
            CMP AL, BL\n\
            JZ DONE\n\
            OUT 01\n\
            JMP START\n\
            DONE:\n\
            END\n";
        let assembled = assemble(source).unwrap();
        assert!(assembled.source_map.contains_key(&0));
        assert_eq!(assembled.image[0], vcpu8::OpCode::MovNumToReg as u8);
    }
}
