//! Assembles a small program and runs it to completion through
//! `vcpu8::step`, exercising the assembler and the processor together.

use vcpu8::{RegisterId, Registers, SignalsIn};

fn run_to_halt(image: [u8; vcpu8::constants::MEMORY_SIZE]) -> Registers {
    let mut memory = vcpu8::Memory::from_image(image);
    let mut registers = Registers::new();
    loop {
        let (m, r, out) = vcpu8::step(memory, registers, SignalsIn::default()).unwrap();
        memory = m;
        registers = r;
        if out.halted {
            return registers;
        }
    }
}

#[test]
fn counts_down_from_five_to_zero() {
    let source = "\
        MOV AL, 05\n\
        LOOP:\n\
        DEC AL\n\
        JNZ LOOP\n\
        END\n";
    let assembled = asm8::assemble(source).unwrap();
    let registers = run_to_halt(assembled.image);
    assert_eq!(registers.get(RegisterId::AL), 0);
}

#[test]
fn a_called_subroutine_returns_to_its_caller() {
    let source = "\
        MOV AL, 01\n\
        CALL DOUBLE\n\
        END\n\
        DOUBLE:\n\
        ADD AL, AL\n\
        RET\n";
    let assembled = asm8::assemble(source).unwrap();
    let registers = run_to_halt(assembled.image);
    assert_eq!(registers.get(RegisterId::AL), 2);
}

#[test]
fn db_bytes_are_readable_as_plain_memory() {
    // MOV AL, [04] (3 bytes, addr 0) ; END (1 byte, addr 3) ; DB 2A (addr 4)
    let source = "\
        MOV AL, [04]\n\
        END\n\
        DB 2A\n";
    let assembled = asm8::assemble(source).unwrap();
    let registers = run_to_halt(assembled.image);
    assert_eq!(registers.get(RegisterId::AL), 0x2A);
}

#[test]
fn a_program_with_no_end_is_rejected_before_it_is_ever_run() {
    let err = asm8::assemble("MOV AL, 01\n").unwrap_err();
    assert_eq!(err.kind, asm8::ErrorKind::MissingEnd);
}
