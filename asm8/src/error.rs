//! Assembler diagnostics (spec §7). Unlike the processor crate's
//! `RuntimeError`, every variant here carries the source span it was raised
//! at, so a caller can underline the offending text.

use std::error::Error;
use std::fmt;

use crate::operand::OperandType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    UnterminatedString,
    UnterminatedAddress,
    InvalidLabel { text: String },
    MissingEnd,
    InvalidAddress { text: String },
    InvalidNumber { text: String },
    UnknownMnemonic { text: String },
    OperandType { expected: Vec<OperandType> },
    MissingComma,
    MissingOperand,
    TooManyOperands,
    DuplicateLabel { identifier: String },
    LabelNotExist { identifier: String },
    JumpDistance { distance: i32 },
    AssembleOverflow { address: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblerError {
    pub kind: ErrorKind,
    pub position: Option<usize>,
    pub length: Option<usize>,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErrorKind::UnterminatedString => write!(f, "unterminated string literal"),
            ErrorKind::UnterminatedAddress => write!(f, "unterminated address operand"),
            ErrorKind::InvalidLabel { text } => write!(f, "'{}' is not a valid label", text),
            ErrorKind::MissingEnd => write!(f, "program is missing a terminating END"),
            ErrorKind::InvalidAddress { text } => {
                write!(f, "'{}' is not a valid address operand", text)
            }
            ErrorKind::InvalidNumber { text } => {
                write!(f, "'{}' is not a valid byte literal", text)
            }
            ErrorKind::UnknownMnemonic { text } => write!(f, "'{}' is not a known mnemonic", text),
            ErrorKind::OperandType { expected } => {
                write!(f, "operand type mismatch, expected one of {:?}", expected)
            }
            ErrorKind::MissingComma => write!(f, "expected ',' between operands"),
            ErrorKind::MissingOperand => write!(f, "instruction is missing an operand"),
            ErrorKind::TooManyOperands => write!(f, "instruction has too many operands"),
            ErrorKind::DuplicateLabel { identifier } => {
                write!(f, "label '{}' is defined more than once", identifier)
            }
            ErrorKind::LabelNotExist { identifier } => {
                write!(f, "label '{}' is never defined", identifier)
            }
            ErrorKind::JumpDistance { distance } => write!(
                f,
                "jump distance {} does not fit in a signed byte",
                distance
            ),
            ErrorKind::AssembleOverflow { address } => write!(
                f,
                "program does not fit in memory, address {:#04X} is out of range",
                address
            ),
        }
    }
}

impl fmt::Display for AssemblerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.position {
            Some(position) => write!(f, "at position {}: {}", position, self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl Error for AssemblerError {}

impl AssemblerError {
    pub fn new(kind: ErrorKind, position: usize, length: usize) -> AssemblerError {
        AssemblerError {
            kind,
            position: Some(position),
            length: Some(length),
        }
    }

    pub fn without_span(kind: ErrorKind) -> AssemblerError {
        AssemblerError {
            kind,
            position: None,
            length: None,
        }
    }
}
