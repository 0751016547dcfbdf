use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::Config;
use crate::constants::{
    FLAG_REGISTER, FONT_ADDR, PROGRAM_ORIGIN, REGISTER_COUNT, SPRITE_SHEET, STACK_DEPTH,
};
use crate::error::{Error, Result};
use crate::opcode;

/// The smallest memory that still holds the font and one instruction at the origin
const MIN_MEMORY_SIZE: usize = PROGRAM_ORIGIN as usize + 2;

/// A snapshot of the Chip-8 machine state
///
/// ## CPU
/// Registers
/// - (v) 16 primary 8-bit registers (V0..VF)
///     - the first 15 (V0..VE) are general purpose registers
///     - the 16th (VF) is the carry flag
/// - (i) a 16-bit memory address register, kept to 12 bits by the instructions
///   that assign it
///
/// Counter
/// - (pc) a 12-bit program counter, starting at the origin
///
/// Timers
/// - 2 8-bit timers (delay & sound), counted down towards 0 at 60Hz
///
/// ## Memory
/// - a call stack of up to 16 return addresses, pushed by CALL and popped by RET
/// - 4096 bytes of addressable memory by default
///     - 0x000..0x200 is reserved; the font sits directly below 0x200
///     - programs are loaded at 0x200
///
/// Accessors that take an address return `None` when it falls outside memory;
/// the interpreter turns that into a fault naming the offending instruction.
#[derive(Clone, Debug)]
pub struct State {
    pub v: [u8; REGISTER_COUNT],
    pub i: u16,
    pub pc: u16,
    pub delay_timer: u8,
    pub sound_timer: u8,
    pub stack: Vec<u16>,
    pub memory: Vec<u8>,
    rng: StdRng,
}

impl State {
    pub fn new(config: &Config) -> Self {
        let mut memory = vec![0; config.memory_size.max(MIN_MEMORY_SIZE)];
        let font = FONT_ADDR as usize;
        memory[font..font + SPRITE_SHEET.len()].copy_from_slice(&SPRITE_SHEET);

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        State {
            v: [0; REGISTER_COUNT],
            i: 0,
            pc: PROGRAM_ORIGIN,
            delay_timer: 0,
            sound_timer: 0,
            stack: Vec::new(),
            memory,
            rng,
        }
    }

    /// Copies a program image to the origin, overwriting whatever is there
    pub fn load(&mut self, program: &[u8]) -> Result<()> {
        let origin = PROGRAM_ORIGIN as usize;
        let max = self.memory.len() - origin;
        if program.len() > max {
            return Err(Error::ProgramTooLarge {
                size: program.len(),
                max,
            });
        }
        self.memory[origin..origin + program.len()].copy_from_slice(program);
        Ok(())
    }

    /// Points the program counter back at the origin without touching anything else
    pub fn rewind(&mut self) {
        self.pc = PROGRAM_ORIGIN;
    }

    pub fn byte(&self, address: usize) -> Option<u8> {
        self.memory.get(address).copied()
    }

    pub fn set_byte(&mut self, address: usize, value: u8) -> Option<()> {
        self.memory.get_mut(address).map(|byte| *byte = value)
    }

    pub fn bytes(&self, address: usize, len: usize) -> Option<&[u8]> {
        self.memory.get(address..address.checked_add(len)?)
    }

    pub fn bytes_mut(&mut self, address: usize, len: usize) -> Option<&mut [u8]> {
        self.memory.get_mut(address..address.checked_add(len)?)
    }

    /// Gets the big-endian opcode stored at `address`.
    pub fn word(&self, address: usize) -> Option<u16> {
        match self.bytes(address, 2)? {
            [high, low] => Some(opcode::from_bytes(*high, *low)),
            _ => None,
        }
    }

    pub fn set_flag(&mut self, set: bool) {
        self.v[FLAG_REGISTER] = u8::from(set);
    }

    /// Pushes a return address, or gives `None` if the stack is already full.
    pub fn push(&mut self, address: u16) -> Option<()> {
        if self.stack.len() >= STACK_DEPTH {
            return None;
        }
        self.stack.push(address);
        Some(())
    }

    pub fn pop(&mut self) -> Option<u16> {
        self.stack.pop()
    }

    pub fn random_byte(&mut self) -> u8 {
        self.rng.gen()
    }
}
