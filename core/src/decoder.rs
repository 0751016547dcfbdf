use std::fmt;

use crate::instruction::{Instruction, Mnemonic, INSTRUCTIONS};

/// An opcode paired with the instruction that best describes it.
/// Arguments are sliced out of the opcode on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoded {
    pub instruction: &'static Instruction,
    pub opcode: u16,
}

/// Selects the most specific instruction for an opcode
///
/// - `0x0000` is blank memory and never decodes
/// - the template with the strictly highest match score wins, so ties go to the
///   first declared (`00E0` beats `0nnn` on score; nothing beats it on order)
/// - an opcode no template matches decodes to `None`
pub fn decode(opcode: u16) -> Option<Decoded> {
    if opcode == 0x0000 {
        return None;
    }

    let mut best: Option<&'static Instruction> = None;
    let mut best_score = 0;
    for instruction in INSTRUCTIONS.iter() {
        let score = instruction.template.matches(opcode);
        if score > best_score {
            best = Some(instruction);
            best_score = score;
        }
    }

    best.map(|instruction| Decoded { instruction, opcode })
}

impl Decoded {
    pub fn mnemonic(&self) -> Mnemonic {
        self.instruction.mnemonic
    }

    /// The value of the argument named `letter` in this instruction's template.
    pub fn arg(&self, letter: char) -> u16 {
        self.instruction.template.argument(self.opcode, letter)
    }

    /// Register operand `Vx`
    pub fn x(&self) -> usize {
        self.arg('x') as usize
    }

    /// Register operand `Vy`
    pub fn y(&self) -> usize {
        self.arg('y') as usize
    }

    /// 4-bit immediate
    pub fn n(&self) -> u8 {
        (self.arg('n') & 0x000F) as u8
    }

    /// 8-bit immediate
    pub fn kk(&self) -> u8 {
        (self.arg('k') & 0x00FF) as u8
    }

    /// 12-bit address
    pub fn nnn(&self) -> u16 {
        self.arg('n') & 0x0FFF
    }
}

/// `LDB x=2 k=5`
impl fmt::Display for Decoded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mnemonic())?;
        for letter in self.instruction.template.placeholders() {
            write!(f, " {}={:X}", letter, self.arg(letter))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mnemonic(opcode: u16) -> Option<Mnemonic> {
        decode(opcode).map(|decoded| decoded.mnemonic())
    }

    #[test]
    fn test_blank_word_does_not_decode() {
        assert_eq!(decode(0x0000), None);
    }

    #[test]
    fn test_cls_outranks_sys() {
        assert_eq!(mnemonic(0x00E0), Some(Mnemonic::Cls));
    }

    #[test]
    fn test_ret_outranks_cls_and_sys() {
        assert_eq!(mnemonic(0x00EE), Some(Mnemonic::Ret));
    }

    #[test]
    fn test_other_system_words_are_sys() {
        assert_eq!(mnemonic(0x0123), Some(Mnemonic::Sys));
    }

    #[test]
    fn test_every_table_entry_decodes_to_itself() {
        let samples: [(u16, Mnemonic); 36] = [
            (0x0ABC, Mnemonic::Sys),
            (0x00E0, Mnemonic::Cls),
            (0x00EE, Mnemonic::Ret),
            (0x1ABC, Mnemonic::Jp),
            (0x2ABC, Mnemonic::Call),
            (0x3A12, Mnemonic::Sevb),
            (0x4A12, Mnemonic::Sneb),
            (0x5AB0, Mnemonic::Sevv),
            (0x6A12, Mnemonic::Ldb),
            (0x7A12, Mnemonic::Addb),
            (0x8AB0, Mnemonic::Ldv),
            (0x8AB1, Mnemonic::Or),
            (0x8AB2, Mnemonic::And),
            (0x8AB3, Mnemonic::Xor),
            (0x8AB4, Mnemonic::Addv),
            (0x8AB5, Mnemonic::Sub),
            (0x8AB6, Mnemonic::Shr),
            (0x8AB7, Mnemonic::Subn),
            (0x8ABE, Mnemonic::Shl),
            (0x9AB0, Mnemonic::Snev),
            (0xAABC, Mnemonic::Ld),
            (0xBABC, Mnemonic::Jpv),
            (0xCA12, Mnemonic::Rnd),
            (0xDAB5, Mnemonic::Drw),
            (0xEA9E, Mnemonic::Skp),
            (0xEAA1, Mnemonic::Sknp),
            (0xFA07, Mnemonic::Ldvd),
            (0xFA0A, Mnemonic::Ldkp),
            (0xFA15, Mnemonic::Lddv),
            (0xFA18, Mnemonic::Ldds),
            (0xFA1E, Mnemonic::Addi),
            (0xFA29, Mnemonic::Lds),
            (0xFA33, Mnemonic::Ldbc),
            (0xFA55, Mnemonic::Ldmw),
            (0xFA65, Mnemonic::Ldmr),
            (0xF999, Mnemonic::Assert),
        ];
        for (opcode, expected) in samples.iter() {
            assert_eq!(mnemonic(*opcode), Some(*expected), "{:#06X}", opcode);
        }
    }

    #[test]
    fn test_unknown_opcodes_do_not_decode() {
        assert_eq!(mnemonic(0x5121), None);
        assert_eq!(mnemonic(0x8128), None);
        assert_eq!(mnemonic(0xE1FF), None);
        assert_eq!(mnemonic(0xF1FF), None);
    }

    #[test]
    fn test_arguments() {
        let decoded = decode(0xD12F).unwrap();
        assert_eq!(decoded.x(), 0x1);
        assert_eq!(decoded.y(), 0x2);
        assert_eq!(decoded.n(), 0xF);

        let decoded = decode(0x6A5B).unwrap();
        assert_eq!(decoded.x(), 0xA);
        assert_eq!(decoded.kk(), 0x5B);

        let decoded = decode(0x2345).unwrap();
        assert_eq!(decoded.nnn(), 0x345);
    }

    #[test]
    fn test_display() {
        assert_eq!(decode(0x6205).unwrap().to_string(), "LDB x=2 k=5");
        assert_eq!(decode(0x00E0).unwrap().to_string(), "CLS");
        assert_eq!(decode(0xA123).unwrap().to_string(), "LD n=123");
    }
}
