//! A Chip-8 virtual machine.
//!
//! Instructions are described by 4-character templates (`8xy4`, `Fx0A`, ...) and
//! decoded by picking the most specific template that matches an opcode. The
//! `Interpreter` executes them against a `State`, drawing and reading keys
//! through a host supplied `Frontend`. `Runner` moves the interpreter onto its
//! own thread so the host can keep servicing input while a program blocks on a
//! key press.

pub use config::{Config, IndexQuirk};
pub use decoder::{decode, Decoded};
pub use disassembler::{disassemble, Line};
pub use draw::{DrawRequest, FrameBuffer};
pub use error::{Error, Result};
pub use frontend::{Controls, Frontend, NullFrontend};
pub use instruction::{Instruction, Mnemonic, INSTRUCTIONS};
pub use interpreter::{EngineState, Interpreter, SharedState};
pub use keywait::KeyPromise;
pub use matcher::Template;
pub use operations::Halt;
pub use runner::Runner;
pub use state::State;

mod config;
pub mod constants;
mod decoder;
mod disassembler;
mod draw;
mod error;
mod frontend;
mod instruction;
mod interpreter;
mod keywait;
mod matcher;
pub mod opcode;
mod operations;
mod runner;
mod state;
