/// # Opcodes
///
/// Chip-8 opcodes are 16 bits each, conventionally read as four nibbles:
/// - `(n, _, _, _)` broad categorization; applies to all opcodes
/// - `(_, n, n, n)` an address, or an operand register followed by more data
///
/// Which nibbles are fixed and which carry arguments is decided per instruction
/// by its template (see `matcher`); this trait only slices the raw word.
pub trait Opcode {
    /// The nibble at `index`, where 0 is the most significant.
    /// `[0123]`
    fn nibble(&self, index: usize) -> u8;

    /// The Opcode's most significant byte.
    /// `[hh__]`
    fn high(&self) -> u8;

    /// The Opcode's least significant byte.
    /// `[__ll]`
    fn low(&self) -> u8;
}

impl Opcode for u16 {
    fn nibble(&self, index: usize) -> u8 {
        debug_assert!(index < 4, "an opcode only has four nibbles");
        ((self >> (4 * (3 - index))) & 0xF) as u8
    }

    fn high(&self) -> u8 {
        (self >> 8) as u8
    }

    fn low(&self) -> u8 {
        (self & 0x00FF) as u8
    }
}

/// Opcodes are stored big-endian: the byte at the lower address is the high byte.
pub fn from_bytes(high: u8, low: u8) -> u16 {
    u16::from(high) << 8 | u16::from(low)
}
