//! Behavioural scenarios driving `vcpu8::step` directly through hand-built
//! images, independent of the assembler.

use vcpu8::{constants, OpCode, RegisterId, Registers, SignalsIn, StatusFlag};

fn image(bytes: &[u8]) -> vcpu8::Memory {
    let mut raw = [0u8; constants::MEMORY_SIZE];
    raw[..bytes.len()].copy_from_slice(bytes);
    vcpu8::Memory::from_image(raw)
}

fn run_until_halt(mut memory: vcpu8::Memory, mut registers: Registers) -> Registers {
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
fn a_loop_that_sums_down_to_zero_halts_with_the_accumulator_clear() {
    // AL = 3
    // LOOP: DEC AL ; JNZ LOOP ; HALT
    let memory = image(&[
        OpCode::MovNumToReg as u8,
        RegisterId::AL as u8,
        0x03,
        OpCode::DecReg as u8,
        RegisterId::AL as u8,
        OpCode::Jnz as u8,
        // distance relative to the displacement byte's own address (6):
        // target is address 3 (DEC AL), so distance = 3 - 6 = -3
        (-3i8) as u8,
        OpCode::Halt as u8,
    ]);
    let registers = run_until_halt(memory, Registers::new());
    assert_eq!(registers.get(RegisterId::AL), 0);
    assert!(registers.flag(StatusFlag::Zero));
}

#[test]
fn a_subroutine_call_preserves_the_caller_s_registers_across_the_stack() {
    // MOV AL, 7 ; CALL SUB ; HALT
    // SUB: MOV BL, 9 ; RET
    let memory = image(&[
        OpCode::MovNumToReg as u8,
        RegisterId::AL as u8,
        0x07,
        OpCode::CallAddr as u8,
        0x08,
        OpCode::Halt as u8,
        0,
        0,
        OpCode::MovNumToReg as u8,
        RegisterId::BL as u8,
        0x09,
        OpCode::Ret as u8,
    ]);
    let registers = run_until_halt(memory, Registers::new());
    assert_eq!(registers.get(RegisterId::AL), 0x07);
    assert_eq!(registers.get(RegisterId::BL), 0x09);
    assert_eq!(registers.sp, constants::MAX_SP);
    assert_eq!(registers.ip, 0x05);
}

#[test]
fn software_interrupt_vectors_through_memory_and_returns() {
    // INT 0x10 ; HALT
    // addr 0x10: MOV AL, 0xAA ; IRET
    let mut raw = [0u8; constants::MEMORY_SIZE];
    raw[0] = OpCode::IntAddr as u8;
    raw[1] = 0x10; // interrupt vector number
    raw[2] = OpCode::Halt as u8;
    raw[0x10] = 0x13; // vector table entry: handler actually starts at 0x13
    raw[0x13] = OpCode::MovNumToReg as u8;
    raw[0x14] = RegisterId::AL as u8;
    raw[0x15] = 0xAA;
    raw[0x16] = OpCode::Iret as u8;
    let memory = vcpu8::Memory::from_image(raw);

    let registers = run_until_halt(memory, Registers::new());
    assert_eq!(registers.get(RegisterId::AL), 0xAA);
    assert_eq!(registers.ip, 0x02);
}

#[test]
fn an_armed_hardware_interrupt_preempts_the_next_instruction() {
    let mut raw = [0u8; constants::MEMORY_SIZE];
    raw[constants::HARDWARE_INTERRUPT_VECTOR as usize] = 0x20;
    raw[0] = OpCode::Nop as u8;
    raw[0x20] = OpCode::Halt as u8;
    let memory = vcpu8::Memory::from_image(raw);

    let mut registers = Registers::new();
    registers.set_flag(StatusFlag::Interrupt, true);
    let signals = SignalsIn {
        interrupt: true,
        ..Default::default()
    };
    let (memory, registers, out) = vcpu8::step(memory, registers, signals).unwrap();
    assert!(!out.halted);
    assert_eq!(registers.ip, 0x20);

    let registers = run_until_halt(memory, registers);
    assert_eq!(registers.ip, 0x20);
}

#[test]
fn stack_overflow_and_underflow_are_reported_without_panicking() {
    let memory = image(&[OpCode::PushFromReg as u8, RegisterId::AL as u8]);
    let mut registers = Registers::new();
    registers.sp = 0;
    let result = vcpu8::step(memory, registers, SignalsIn::default());
    assert_eq!(result.unwrap_err(), vcpu8::RuntimeError::StackOverflow);

    let memory = image(&[OpCode::PopToReg as u8, RegisterId::AL as u8]);
    let mut registers = Registers::new();
    registers.sp = constants::MAX_SP;
    let result = vcpu8::step(memory, registers, SignalsIn::default());
    assert_eq!(result.unwrap_err(), vcpu8::RuntimeError::StackUnderflow);
}
