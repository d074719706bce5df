//! Register file: four general purpose registers, instruction/stack pointers
//! and the status register.

use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::FromPrimitive;

use crate::constants::{MAX_SP, REGISTER_COUNT};
use crate::error::RuntimeError;

/// Identifies one of the four general purpose registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum RegisterId {
    AL,
    BL,
    CL,
    DL,
}

impl RegisterId {
    /// Resolves a raw index into a [`RegisterId`], validating it against the
    /// register count. Every opcode handler that reads a register index out
    /// of memory goes through this so an out-of-range byte always surfaces
    /// as [`RuntimeError::InvalidRegister`] rather than panicking.
    pub fn from_index(index: u8) -> Result<RegisterId, RuntimeError> {
        FromPrimitive::from_u8(index).ok_or(RuntimeError::InvalidRegister(index))
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Index into [`Registers::sr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFlag {
    Zero = 0,
    Overflow = 1,
    Sign = 2,
    Interrupt = 3,
}

/// The full architectural register state: general purpose registers, the
/// instruction pointer, the stack pointer and the status flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registers {
    pub gpr: [u8; REGISTER_COUNT],
    pub ip: u8,
    pub sp: u8,
    pub sr: [bool; 4],
}

impl Default for Registers {
    fn default() -> Registers {
        Registers {
            gpr: [0; REGISTER_COUNT],
            ip: 0,
            sp: MAX_SP,
            sr: [false; 4],
        }
    }
}

impl Registers {
    pub fn new() -> Registers {
        Default::default()
    }

    pub fn get(&self, id: RegisterId) -> u8 {
        self.gpr[id.index()]
    }

    pub fn set(&mut self, id: RegisterId, value: u8) {
        self.gpr[id.index()] = value;
    }

    pub fn flag(&self, flag: StatusFlag) -> bool {
        self.sr[flag as usize]
    }

    pub fn set_flag(&mut self, flag: StatusFlag, value: bool) {
        self.sr[flag as usize] = value;
    }

    /// Marshals the status register into one byte for `PUSHF`: bit `i + 1`
    /// reflects flag `i`. Bits 0 and 5-7 are always zero.
    pub fn flags_to_byte(&self) -> u8 {
        (self.sr[StatusFlag::Zero as usize] as u8) << 1
            | (self.sr[StatusFlag::Overflow as usize] as u8) << 2
            | (self.sr[StatusFlag::Sign as usize] as u8) << 3
            | (self.sr[StatusFlag::Interrupt as usize] as u8) << 4
    }

    /// Unmarshals a `POPF` byte back into the status register. Bits 0 and
    /// 5-7 are ignored.
    pub fn flags_from_byte(&mut self, byte: u8) {
        self.sr[StatusFlag::Zero as usize] = byte & 0b0000_0010 != 0;
        self.sr[StatusFlag::Overflow as usize] = byte & 0b0000_0100 != 0;
        self.sr[StatusFlag::Sign as usize] = byte & 0b0000_1000 != 0;
        self.sr[StatusFlag::Interrupt as usize] = byte & 0b0001_0000 != 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state() {
        let regs = Registers::new();
        assert_eq!(regs.gpr, [0; 4]);
        assert_eq!(regs.ip, 0);
        assert_eq!(regs.sp, MAX_SP);
        assert_eq!(regs.sr, [false; 4]);
    }

    #[test]
    fn register_id_from_index() {
        assert_eq!(RegisterId::from_index(0), Ok(RegisterId::AL));
        assert_eq!(RegisterId::from_index(3), Ok(RegisterId::DL));
        assert_eq!(
            RegisterId::from_index(4),
            Err(RuntimeError::InvalidRegister(4))
        );
    }

    #[test]
    fn flags_round_trip_through_a_byte() {
        let mut regs = Registers::new();
        regs.set_flag(StatusFlag::Zero, true);
        regs.set_flag(StatusFlag::Sign, true);
        let byte = regs.flags_to_byte();

        let mut restored = Registers::new();
        restored.flags_from_byte(byte);
        assert_eq!(restored.sr, regs.sr);
    }
}
