//! Two-pass assembler (spec §5). Pass 1 walks the parsed statements to
//! assign addresses and build the label table; pass 2 patches every label
//! operand with its resolved distance or address and bakes the final image.

use std::collections::HashMap;

use matches::debug_assert_matches;
use vcpu8::constants::MEMORY_SIZE;
use vcpu8::OpCode;

use crate::error::{AssemblerError, ErrorKind};
use crate::label::{is_valid_identifier, Label, LabelMap};
use crate::mnemonic;
use crate::operand::{Operand, OperandType};
use crate::source_map::SourceMap;
use crate::statement::{Instruction, Statement};
use crate::token::{tokenize, Token, TokenType};

const REGISTER_NAMES: [&str; 4] = ["AL", "BL", "CL", "DL"];

pub struct Assembled {
    pub image: [u8; MEMORY_SIZE],
    pub source_map: SourceMap,
}

enum Line {
    LabelOnly(Label),
    Statement {
        label: Option<Label>,
        mnemonic: Token,
        operands: Vec<Token>,
    },
}

fn register_index(name: &str) -> Option<u8> {
    REGISTER_NAMES.iter().position(|r| *r == name).map(|i| i as u8)
}

fn parse_number(token: &Token) -> Result<u8, AssemblerError> {
    u32::from_str_radix(&token.value, 16)
        .ok()
        .filter(|value| *value <= 0xFF)
        .map(|value| value as u8)
        .ok_or_else(|| {
            AssemblerError::new(
                ErrorKind::InvalidNumber {
                    text: token.value.clone(),
                },
                token.position,
                token.length,
            )
        })
}

fn parse_register(token: &Token) -> Result<u8, AssemblerError> {
    register_index(&token.value).ok_or_else(|| {
        AssemblerError::new(
            ErrorKind::OperandType {
                expected: vec![OperandType::Register],
            },
            token.position,
            token.length,
        )
    })
}

/// `[2A]` or `[BL]` -> the inner text as its own synthetic token, so the
/// existing number/register parsers can be reused on it. Rejects bracket
/// contents that are neither a register name nor valid hex (`[XY]`, `[]`).
fn inner_token(token: &Token) -> Result<Token, AssemblerError> {
    let inner = &token.value[1..token.value.len() - 1];
    let kind = if register_index(inner).is_some() {
        TokenType::Register
    } else if !inner.is_empty() && inner.chars().all(|c| c.is_ascii_hexdigit()) {
        TokenType::Digits
    } else {
        return Err(AssemblerError::new(
            ErrorKind::InvalidAddress {
                text: token.value.clone(),
            },
            token.position,
            token.length,
        ));
    };
    Ok(Token {
        kind,
        value: inner.to_string(),
        position: token.position + 1,
        length: token.length.saturating_sub(2),
    })
}

fn split_lines(tokens: Vec<Token>) -> Vec<Vec<Token>> {
    let mut lines = Vec::new();
    let mut current = Vec::new();
    for token in tokens {
        if token.kind == TokenType::Whitespace {
            if !current.is_empty() {
                lines.push(std::mem::replace(&mut current, Vec::new()));
            }
        } else {
            current.push(token);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn strip_label(tokens: &mut Vec<Token>) -> Result<Option<Label>, AssemblerError> {
    if tokens.is_empty() || tokens[0].kind != TokenType::Unknown || !tokens[0].value.ends_with(':')
    {
        return Ok(None);
    }
    let token = tokens.remove(0);
    let identifier = token.value[..token.value.len() - 1].to_string();
    if !is_valid_identifier(&identifier) {
        return Err(AssemblerError::new(
            ErrorKind::InvalidLabel {
                text: identifier,
            },
            token.position,
            token.length,
        ));
    }
    Ok(Some(Label { identifier, token }))
}

fn parse_operands(tokens: Vec<Token>) -> Result<Vec<Token>, AssemblerError> {
    let mut operands = Vec::new();
    let mut awaiting_operand = true;
    let mut last_comma: Option<Token> = None;

    for token in tokens {
        if awaiting_operand {
            if token.kind == TokenType::Comma {
                return Err(AssemblerError::new(
                    ErrorKind::MissingOperand,
                    token.position,
                    token.length,
                ));
            }
            operands.push(token);
            awaiting_operand = false;
        } else {
            if token.kind != TokenType::Comma {
                return Err(AssemblerError::new(
                    ErrorKind::MissingComma,
                    token.position,
                    token.length,
                ));
            }
            last_comma = Some(token);
            awaiting_operand = true;
        }
    }

    if awaiting_operand {
        if let Some(comma) = last_comma {
            return Err(AssemblerError::new(
                ErrorKind::MissingOperand,
                comma.position,
                comma.length,
            ));
        }
    }

    Ok(operands)
}

fn parse_line(mut tokens: Vec<Token>) -> Result<Line, AssemblerError> {
    let label = strip_label(&mut tokens)?;
    if tokens.is_empty() {
        return Ok(Line::LabelOnly(
            label.expect("a line with no mnemonic must have had a label"),
        ));
    }
    let mnemonic = tokens.remove(0);
    if mnemonic.kind != TokenType::Unknown {
        return Err(AssemblerError::new(
            ErrorKind::UnknownMnemonic {
                text: mnemonic.value.clone(),
            },
            mnemonic.position,
            mnemonic.length,
        ));
    }
    let operands = parse_operands(tokens)?;
    Ok(Line::Statement {
        label,
        mnemonic,
        operands,
    })
}

fn operand_byte(token: &Token, kind: OperandType) -> Result<u8, AssemblerError> {
    match kind {
        OperandType::Number => parse_number(token),
        OperandType::Register => parse_register(token),
        OperandType::Address | OperandType::RegisterAddress => {
            let inner = inner_token(token)?;
            if kind == OperandType::Address {
                parse_number(&inner)
            } else {
                parse_register(&inner)
            }
        }
        OperandType::Label | OperandType::String => unreachable!(
            "operand_byte is never called with a label or string operand"
        ),
    }
}

fn assemble_db(operands: &[Token]) -> Result<Vec<u8>, AssemblerError> {
    if operands.is_empty() {
        return Err(AssemblerError::without_span(ErrorKind::MissingOperand));
    }
    let mut bytes = Vec::new();
    for token in operands {
        match token.kind {
            TokenType::Digits => bytes.push(parse_number(token)?),
            TokenType::String => {
                let text = &token.value[1..token.value.len() - 1];
                bytes.extend(text.bytes());
            }
            _ => {
                return Err(AssemblerError::new(
                    ErrorKind::OperandType {
                        expected: vec![OperandType::Number, OperandType::String],
                    },
                    token.position,
                    token.length,
                ))
            }
        }
    }
    Ok(bytes)
}

/// Operands that name a label are not yet resolvable in pass 1; this
/// returns a zero placeholder byte that [`resolve_label_operand`] patches
/// in pass 2.
fn assemble_instruction(
    mnemonic: &Token,
    operands: &[Token],
) -> Result<(OpCode, Vec<u8>), AssemblerError> {
    let kinds: Vec<OperandType> = operands
        .iter()
        .cloned()
        .map(Operand::from_token)
        .map(|operand| operand.kind)
        .collect();

    let opcode = mnemonic::resolve(&mnemonic.value, &kinds).ok_or_else(|| {
        if mnemonic::is_known(&mnemonic.value) {
            AssemblerError::new(
                ErrorKind::OperandType {
                    expected: mnemonic::expected_operand_types(&mnemonic.value, &kinds),
                },
                mnemonic.position,
                mnemonic.length,
            )
        } else {
            AssemblerError::new(
                ErrorKind::UnknownMnemonic {
                    text: mnemonic.value.clone(),
                },
                mnemonic.position,
                mnemonic.length,
            )
        }
    })?;

    let mut bytes = vec![opcode as u8];
    for (token, kind) in operands.iter().zip(kinds) {
        let byte = match kind {
            OperandType::Label => 0,
            other => operand_byte(token, other)?,
        };
        bytes.push(byte);
    }
    Ok((opcode, bytes))
}

fn is_relative_jump(opcode: OpCode) -> bool {
    matches!(
        opcode,
        OpCode::Jmp
            | OpCode::Jz
            | OpCode::Jnz
            | OpCode::Js
            | OpCode::Jns
            | OpCode::Jo
            | OpCode::Jno
    )
}

fn is_absolute_target(opcode: OpCode) -> bool {
    matches!(opcode, OpCode::CallAddr | OpCode::IntAddr)
}

fn label_operand(statement: &Statement) -> Option<&Operand> {
    statement
        .operands
        .iter()
        .find(|operand| operand.kind == OperandType::Label)
}

fn resolve_label_operand(
    statement: &mut Statement,
    label_map: &LabelMap,
) -> Result<(), AssemblerError> {
    let opcode = match statement.opcode {
        Some(opcode) if is_relative_jump(opcode) || is_absolute_target(opcode) => opcode,
        _ => return Ok(()),
    };

    debug_assert_matches!(label_operand(statement), Some(_));
    let operand = label_operand(statement).expect("jump/call statement always has a label operand");
    let target = *label_map.get(&operand.value).ok_or_else(|| {
        AssemblerError::new(
            ErrorKind::LabelNotExist {
                identifier: operand.value.clone(),
            },
            operand.token.position,
            operand.token.length,
        )
    })?;

    let byte = if is_relative_jump(opcode) {
        let base = statement.address as i32 + 1;
        let distance = target as i32 - base;
        if !(-128..=127).contains(&distance) {
            return Err(AssemblerError::new(
                ErrorKind::JumpDistance { distance },
                operand.token.position,
                operand.token.length,
            ));
        }
        distance as i8 as u8
    } else {
        target
    };

    statement.machine_codes[1] = byte;
    Ok(())
}

fn attach_label(
    label_map: &mut LabelMap,
    identifier: &str,
    address: u8,
) -> Result<(), AssemblerError> {
    if label_map.contains_key(identifier) {
        return Err(AssemblerError::without_span(ErrorKind::DuplicateLabel {
            identifier: identifier.to_string(),
        }));
    }
    label_map.insert(identifier.to_string(), address);
    Ok(())
}

/// Assembles `source` into a 256-byte memory image plus the source map that
/// ties each occupied address back to the statement that produced it.
pub fn assemble(source: &str) -> Result<Assembled, AssemblerError> {
    let tokens = tokenize(source)?;
    let lines: Vec<Line> = split_lines(tokens)
        .into_iter()
        .map(parse_line)
        .collect::<Result<_, _>>()?;

    let mut statements = Vec::new();
    let mut label_map: LabelMap = HashMap::new();
    let mut pending_labels: Vec<Label> = Vec::new();
    let mut address: u16 = 0;

    for line in lines {
        match line {
            Line::LabelOnly(label) => pending_labels.push(label),
            Line::Statement {
                label,
                mnemonic,
                operands,
            } => {
                if mnemonic.value == "ORG" {
                    if operands.len() != 1 || operands[0].kind != TokenType::Digits {
                        return Err(AssemblerError::new(
                            ErrorKind::OperandType {
                                expected: vec![OperandType::Number],
                            },
                            mnemonic.position,
                            mnemonic.length,
                        ));
                    }
                    let new_address = parse_number(&operands[0])? as u16;
                    for pending in pending_labels.drain(..) {
                        attach_label(&mut label_map, &pending.identifier, new_address as u8)?;
                    }
                    if let Some(label) = label {
                        attach_label(&mut label_map, &label.identifier, new_address as u8)?;
                    }
                    address = new_address;
                    continue;
                }

                if address as usize >= MEMORY_SIZE {
                    return Err(AssemblerError::new(
                        ErrorKind::AssembleOverflow {
                            address: address as usize,
                        },
                        mnemonic.position,
                        mnemonic.length,
                    ));
                }
                let this_address = address as u8;

                for pending in pending_labels.drain(..) {
                    attach_label(&mut label_map, &pending.identifier, this_address)?;
                }
                if let Some(ref label) = label {
                    attach_label(&mut label_map, &label.identifier, this_address)?;
                }

                let (opcode, machine_codes) = if mnemonic.value == "DB" {
                    (None, assemble_db(&operands)?)
                } else {
                    let (opcode, bytes) = assemble_instruction(&mnemonic, &operands)?;
                    (Some(opcode), bytes)
                };

                let new_address = address + machine_codes.len() as u16;
                if new_address as usize > MEMORY_SIZE {
                    return Err(AssemblerError::new(
                        ErrorKind::AssembleOverflow {
                            address: address as usize,
                        },
                        mnemonic.position,
                        mnemonic.length,
                    ));
                }

                let position = label
                    .as_ref()
                    .map(|l| l.token.position)
                    .unwrap_or(mnemonic.position);
                let span_end = operands
                    .last()
                    .map(|t| t.position + t.length)
                    .unwrap_or(mnemonic.position + mnemonic.length);

                statements.push(Statement {
                    label,
                    instruction: Instruction {
                        mnemonic: mnemonic.value.clone(),
                        token: mnemonic,
                    },
                    operands: operands.into_iter().map(Operand::from_token).collect(),
                    opcode,
                    address: this_address,
                    machine_codes,
                    position,
                    length: span_end - position,
                });
                address = new_address;
            }
        }
    }

    if !pending_labels.is_empty() {
        if address as usize <= MEMORY_SIZE {
            for pending in pending_labels {
                attach_label(&mut label_map, &pending.identifier, address as u8)?;
            }
        }
    }

    let ends_in_end = statements
        .last()
        .map(|statement| statement.instruction.mnemonic == "END")
        .unwrap_or(false);
    if !ends_in_end {
        return Err(AssemblerError::without_span(ErrorKind::MissingEnd));
    }

    let mut image = [0u8; MEMORY_SIZE];
    let mut source_map = SourceMap::new();
    for mut statement in statements {
        resolve_label_operand(&mut statement, &label_map)?;
        let start = statement.address as usize;
        let end = start + statement.machine_codes.len();
        image[start..end].copy_from_slice(&statement.machine_codes);
        source_map.insert(statement.address, statement);
    }

    Ok(Assembled { image, source_map })
}
