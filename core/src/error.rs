use std::io;

/// Everything that can stop the engine, or a host driving it
///
/// Engine faults carry the opcode and the address it was fetched from so that a
/// halt can be reported without access to the machine state.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unhandled opcode {opcode:#06X} at {pc:#05X}")]
    Decode { opcode: u16, pc: u16 },

    #[error("opcode {opcode:#06X} at {pc:#05X} returned with an empty call stack")]
    StackUnderflow { opcode: u16, pc: u16 },

    #[error("opcode {opcode:#06X} at {pc:#05X} overflowed the call stack")]
    StackOverflow { opcode: u16, pc: u16 },

    #[error("memory access out of bounds at address {address:#06X} (pc {pc:#05X})")]
    OutOfBounds { address: usize, pc: u16 },

    #[error("opcode {opcode:#06X} at {pc:#05X} calls machine code, which is unsupported")]
    Unsupported { opcode: u16, pc: u16 },

    #[error("program is too large ({size} bytes), max size is {max} bytes")]
    ProgramTooLarge { size: usize, max: usize },

    #[error("machine is halted")]
    Halted,

    #[error("an engine is already running")]
    ResourceBusy,

    #[error("engine thread panicked")]
    WorkerPanicked,

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
