//! Core of an educational 8-bit machine simulator: a fixed-size byte memory,
//! a four-register CPU with flags, and an opcode-dispatched [`step`]
//! function that advances it one instruction at a time.
//!
//! This crate only implements the processor half of the simulator. The
//! sibling `asm8` crate turns assembly source into the 256-byte image that
//! `step` consumes; wiring a clock, devices or persistence around `step` is
//! left to whatever embeds this crate.

pub mod constants;
pub mod error;
pub mod memory;
mod processor;
pub mod register;
pub mod opcode;
pub mod signals;

pub use error::RuntimeError;
pub use memory::Memory;
pub use opcode::OpCode;
pub use processor::step;
pub use register::{RegisterId, Registers, StatusFlag};
pub use signals::{OutputData, PortData, SignalsIn, SignalsOut};
