//! Opcode-dispatched interpreter. [`step`] is the sole public entry point:
//! a pure function from `(memory, registers, signals)` to the next state,
//! per spec §4.4.

mod core;
mod logic;

use crate::error::RuntimeError;
use crate::memory::Memory;
use crate::register::Registers;
use crate::signals::{SignalsIn, SignalsOut};

/// Executes exactly one instruction (or, if a hardware interrupt is pending
/// and armed, the hardware trap) and returns the resulting state.
///
/// `memory` and `registers` are `Copy`, so the caller's own bindings are
/// untouched by this call regardless of whether it succeeds: on `Err`, the
/// pre-step state the caller already holds is simply what remains valid,
/// satisfying the all-or-nothing error policy in spec §7.
pub fn step(
    mut memory: Memory,
    mut registers: Registers,
    signals: SignalsIn,
) -> Result<(Memory, Registers, SignalsOut), RuntimeError> {
    let out = core::dispatch(&mut memory, &mut registers, &signals)?;
    Ok((memory, registers, out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::Memory;
    use crate::opcode::OpCode;
    use crate::register::{RegisterId, StatusFlag};
    use crate::signals::{OutputData, PortData};

    fn image(bytes: &[u8]) -> Memory {
        let mut raw = [0u8; crate::constants::MEMORY_SIZE];
        raw[..bytes.len()].copy_from_slice(bytes);
        Memory::from_image(raw)
    }

    #[test]
    fn halt_sets_the_halted_signal_and_leaves_ip_in_place() {
        let memory = image(&[OpCode::Halt as u8]);
        let registers = Registers::new();
        let (_, registers, out) = step(memory, registers, SignalsIn::default()).unwrap();
        assert!(out.halted);
        assert_eq!(registers.ip, 0);
    }

    #[test]
    fn add_sets_flags_and_writes_back() {
        // MOV AL, 0x80 ; MOV BL, 0x80 ; ADD AL, BL
        let memory = image(&[
            OpCode::MovNumToReg as u8,
            RegisterId::AL as u8,
            0x80,
            OpCode::MovNumToReg as u8,
            RegisterId::BL as u8,
            0x80,
            OpCode::AddRegToReg as u8,
            RegisterId::AL as u8,
            RegisterId::BL as u8,
        ]);
        let mut registers = Registers::new();
        let mut mem = memory;
        for _ in 0..3 {
            let (m, r, _) = step(mem, registers, SignalsIn::default()).unwrap();
            mem = m;
            registers = r;
        }
        assert_eq!(registers.get(RegisterId::AL), 0x00);
        assert!(registers.flag(StatusFlag::Zero));
        assert!(registers.flag(StatusFlag::Overflow));
        assert!(!registers.flag(StatusFlag::Sign));
    }

    #[test]
    fn call_then_ret_restores_ip_to_after_the_call() {
        // addr0: CALL 0x05 (2 bytes) ; addr2: NOP ; addr5: RET
        let memory = image(&[
            OpCode::CallAddr as u8,
            0x05,
            OpCode::Nop as u8,
            0,
            0,
            OpCode::Ret as u8,
        ]);
        let registers = Registers::new();
        let (memory, registers, _) = step(memory, registers, SignalsIn::default()).unwrap();
        assert_eq!(registers.ip, 0x05);
        let (_, registers, _) = step(memory, registers, SignalsIn::default()).unwrap();
        assert_eq!(registers.ip, 0x02);
        assert_eq!(registers.sp, crate::constants::MAX_SP);
    }

    #[test]
    fn push_then_pop_is_the_identity_on_al() {
        let memory = image(&[
            OpCode::MovNumToReg as u8,
            RegisterId::AL as u8,
            0x11,
            OpCode::PushFromReg as u8,
            RegisterId::AL as u8,
            OpCode::MovNumToReg as u8,
            RegisterId::AL as u8,
            0x22,
            OpCode::PopToReg as u8,
            RegisterId::AL as u8,
        ]);
        let mut mem = memory;
        let mut registers = Registers::new();
        for _ in 0..4 {
            let (m, r, _) = step(mem, registers, SignalsIn::default()).unwrap();
            mem = m;
            registers = r;
        }
        assert_eq!(registers.get(RegisterId::AL), 0x11);
        assert_eq!(registers.sp, crate::constants::MAX_SP);
    }

    #[test]
    fn pushf_then_popf_is_the_identity_on_status_register() {
        let memory = image(&[OpCode::Pushf as u8, OpCode::Popf as u8]);
        let mut registers = Registers::new();
        registers.set_flag(StatusFlag::Zero, true);
        registers.set_flag(StatusFlag::Sign, true);
        let before = registers.sr;
        let (memory, registers, _) = step(memory, registers, SignalsIn::default()).unwrap();
        let (_, registers, _) = step(memory, registers, SignalsIn::default()).unwrap();
        assert_eq!(registers.sr, before);
        assert_eq!(registers.sp, crate::constants::MAX_SP);
    }

    #[test]
    fn in_without_matching_data_requests_the_port_and_does_not_advance() {
        let memory = image(&[OpCode::InFromPortToAl as u8, 0x05, OpCode::End as u8]);
        let registers = Registers::new();
        let (memory, registers, out) = step(memory, registers, SignalsIn::default()).unwrap();
        assert_eq!(out.required_input_port, Some(0x05));
        assert_eq!(registers.ip, 0);

        let signals = SignalsIn {
            data: PortData {
                content: Some(0x7F),
                port: 0x05,
            },
            interrupt: false,
        };
        let (_, registers, out) = step(memory, registers, signals).unwrap();
        assert_eq!(registers.get(RegisterId::AL), 0x7F);
        assert_eq!(registers.ip, 2);
        assert_eq!(out.required_input_port, None);
    }

    #[test]
    fn out_writes_al_to_the_requested_port() {
        let memory = image(&[
            OpCode::MovNumToReg as u8,
            RegisterId::AL as u8,
            0x42,
            OpCode::OutFromAlToPort as u8,
            0x03,
        ]);
        let (memory, registers, _) = step(memory, Registers::new(), SignalsIn::default()).unwrap();
        let (_, _, out) = step(memory, registers, SignalsIn::default()).unwrap();
        assert_eq!(
            out.data,
            Some(OutputData {
                content: 0x42,
                port: 0x03
            })
        );
    }

    #[test]
    fn hardware_trap_jumps_to_the_fixed_vector_regardless_of_ip() {
        let mut raw = [0u8; crate::constants::MEMORY_SIZE];
        raw[crate::constants::HARDWARE_INTERRUPT_VECTOR as usize] = 0x40;
        raw[0] = OpCode::Nop as u8;
        let memory = Memory::from_image(raw);

        let mut registers = Registers::new();
        registers.set_flag(StatusFlag::Interrupt, true);

        let signals = SignalsIn {
            interrupt: true,
            ..Default::default()
        };
        let (_, registers, _) = step(memory, registers, signals).unwrap();
        assert_eq!(registers.ip, 0x40);
    }

    #[test]
    fn unknown_opcode_is_rejected() {
        let memory = image(&[0xFE]);
        let result = step(memory, Registers::new(), SignalsIn::default());
        assert_eq!(result.unwrap_err(), RuntimeError::InvalidOpcode(0xFE));
    }

    #[test]
    fn division_by_zero_is_rejected() {
        let memory = image(&[
            OpCode::DivNumWithReg as u8,
            RegisterId::AL as u8,
            0x00,
        ]);
        let result = step(memory, Registers::new(), SignalsIn::default());
        assert_eq!(result.unwrap_err(), RuntimeError::DivideByZero);
    }
}
