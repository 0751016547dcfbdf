//! Headless rendering for the Chip-8 interpreter.

pub use display::Display;
pub use terminal::TerminalFrontend;

mod display;
mod terminal;
