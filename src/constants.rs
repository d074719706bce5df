//! ISA-wide constants shared between the processor core and the assembler.

/// Number of bytes in a machine image. The whole address space fits in a `u8`.
pub const MEMORY_SIZE: usize = 256;

/// Number of general purpose registers (`AL`, `BL`, `CL`, `DL`).
pub const REGISTER_COUNT: usize = 4;

/// Initial and maximum value of the stack pointer. The stack occupies
/// `[0..=MAX_SP]` and grows downward from this address.
pub const MAX_SP: u8 = 0xBF;

/// Highest I/O port number a program may address.
pub const MAX_PORT: u8 = 15;

/// Address of the hardware interrupt vector, consulted only on a hardware trap.
pub const HARDWARE_INTERRUPT_VECTOR: u8 = 0x02;
