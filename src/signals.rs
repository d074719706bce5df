//! The bidirectional signal bus described in spec §3: hardware interrupt
//! line, port-based I/O handshake, halt and close-window notifications.
//!
//! A device (keyboard, VDU, ...) and the driving clock are both external
//! collaborators; `step` only ever sees one snapshot of `SignalsIn` and
//! produces one `SignalsOut` per call.

/// One pending byte of port I/O, either offered by a device (`SignalsIn`)
/// or produced for a device (`SignalsOut::data`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PortData {
    pub content: Option<u8>,
    pub port: u8,
}

/// Signals flowing from the external world into a `step` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SignalsIn {
    pub data: PortData,
    pub interrupt: bool,
}

/// A byte written out to a port via `OUT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputData {
    pub content: u8,
    pub port: u8,
}

/// Signals produced by a `step` call for the external world to observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SignalsOut {
    pub halted: bool,
    pub required_input_port: Option<u8>,
    pub data: Option<OutputData>,
    pub close_windows: bool,
}
