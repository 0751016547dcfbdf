use std::fmt;

use crate::decoder::{decode, Decoded};
use crate::opcode::{self, Opcode};

/// One 2-byte word of memory, decoded if possible
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    pub address: u16,
    pub opcode: u16,
    pub decoded: Option<Decoded>,
}

/// `0x200  A001  LD n=1          Set I = nnn.`
///
/// Words that don't decode (blank memory, sprite data) are shown as raw bytes.
impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#05X}  {:04X}  ", self.address, self.opcode)?;
        match &self.decoded {
            Some(decoded) => write!(
                f,
                "{:<16}{}",
                decoded.to_string(),
                decoded.instruction.description
            ),
            None => write!(f, "DB {:02X} {:02X}", self.opcode.high(), self.opcode.low()),
        }
    }
}

/// Decodes memory[start..end] two bytes at a time.
/// The range is clamped to memory and a trailing odd byte is left out.
pub fn disassemble(memory: &[u8], start: usize, end: usize) -> Vec<Line> {
    let end = end.min(memory.len());
    if start >= end {
        return Vec::new();
    }

    memory[start..end]
        .chunks_exact(2)
        .enumerate()
        .map(|(index, word)| {
            let opcode = opcode::from_bytes(word[0], word[1]);
            Line {
                address: (start + index * 2) as u16,
                opcode,
                decoded: decode(opcode),
            }
        })
        .collect()
}
