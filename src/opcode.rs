//! The opcode byte table. Values are fixed by the ISA so that an image
//! produced by `asm8::assemble` is portable to any implementation of
//! [`crate::step`].

use num_derive::{FromPrimitive, ToPrimitive};

/// One opcode byte. Doc comments reproduce the operand shape and effect,
/// grouped the same way spec.md §4.4 groups the dispatch categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum OpCode {
    // --- nullary control -------------------------------------------------
    Nop = 0x00,   // does nothing
    End = 0x01,   // halts, same as Halt
    Halt = 0x02,  // halts
    Sti = 0x03,   // sets the Interrupt flag
    Cli = 0x04,   // clears the Interrupt flag
    Clo = 0x05,   // raises close_windows
    Pushf = 0x06, // pushes the marshalled status register
    Popf = 0x07,  // pops the status register
    Ret = 0x08,   // pops into ip
    Iret = 0x09,  // pops into ip (interrupt return)

    // --- register/register arithmetic :: dest, src -> dest ---------------
    AddRegToReg = 0x10,
    SubRegFromReg = 0x11,
    MulRegWithReg = 0x12,
    DivRegWithReg = 0x13,
    ModRegWithReg = 0x14,
    AndRegWithReg = 0x15,
    OrRegWithReg = 0x16,
    XorRegWithReg = 0x17,
    CmpRegWithReg = 0x18, // like SubRegFromReg but does not write back

    // --- register/immediate arithmetic :: dest, num -> dest ---------------
    AddNumToReg = 0x20,
    SubNumFromReg = 0x21,
    MulNumWithReg = 0x22,
    DivNumWithReg = 0x23,
    ModNumWithReg = 0x24,
    AndNumWithReg = 0x25,
    OrNumWithReg = 0x26,
    XorNumWithReg = 0x27,
    CmpRegWithNum = 0x28,

    // --- unary register arithmetic :: dest -> dest ------------------------
    IncReg = 0x30,
    DecReg = 0x31,
    NotReg = 0x32,
    RolReg = 0x33,
    RorReg = 0x34,
    ShlReg = 0x35,
    ShrReg = 0x36,

    // --- relative jumps :: disp8 -------------------------------------------
    Jmp = 0x40,
    Jz = 0x41,
    Jnz = 0x42,
    Js = 0x43,
    Jns = 0x44,
    Jo = 0x45,
    Jno = 0x46,

    // --- moves --------------------------------------------------------------
    MovNumToReg = 0x50,
    MovAddrToReg = 0x51,
    MovRegAddrToReg = 0x52,
    MovRegToAddr = 0x53,
    MovRegToRegAddr = 0x54,

    // --- stack ----------------------------------------------------------
    PushFromReg = 0x60,
    PopToReg = 0x61,

    // --- procedures & interrupts ------------------------------------------
    CallAddr = 0x70,
    IntAddr = 0x71,

    // --- port I/O ---------------------------------------------------------
    InFromPortToAl = 0x80,
    OutFromAlToPort = 0x81,
}

impl OpCode {
    /// Number of operand bytes that follow this opcode byte in the image
    /// (spec.md §6 "Opcode encoding lengths").
    pub fn operand_len(self) -> u8 {
        use OpCode::*;
        match self {
            Nop | End | Halt | Sti | Cli | Clo | Pushf | Popf | Ret | Iret => 0,
            IncReg | DecReg | NotReg | RolReg | RorReg | ShlReg | ShrReg => 1,
            PushFromReg | PopToReg => 1,
            Jmp | Jz | Jnz | Js | Jns | Jo | Jno => 1,
            CallAddr | IntAddr => 1,
            InFromPortToAl | OutFromAlToPort => 1,
            AddRegToReg | SubRegFromReg | MulRegWithReg | DivRegWithReg | ModRegWithReg
            | AndRegWithReg | OrRegWithReg | XorRegWithReg | CmpRegWithReg => 2,
            AddNumToReg | SubNumFromReg | MulNumWithReg | DivNumWithReg | ModNumWithReg
            | AndNumWithReg | OrNumWithReg | XorNumWithReg | CmpRegWithNum => 2,
            MovNumToReg | MovAddrToReg | MovRegAddrToReg | MovRegToAddr | MovRegToRegAddr => 2,
        }
    }

    /// Total encoded length including the opcode byte itself.
    pub fn encoded_len(self) -> u8 {
        self.operand_len() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::FromPrimitive;

    #[test]
    fn opcode_byte_round_trips() {
        let op = OpCode::MovNumToReg;
        let byte = op as u8;
        assert_eq!(OpCode::from_u8(byte), Some(OpCode::MovNumToReg));
    }

    #[test]
    fn unknown_byte_has_no_opcode() {
        assert_eq!(OpCode::from_u8(0xFE), None);
    }
}
