use std::fmt;

use crate::matcher::Template;

/// Tags each entry of the instruction table; the interpreter dispatches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mnemonic {
    Sys,
    Cls,
    Ret,
    Jp,
    Call,
    Sevb,
    Sneb,
    Sevv,
    Ldb,
    Addb,
    Ldv,
    Or,
    And,
    Xor,
    Addv,
    Sub,
    Shr,
    Subn,
    Shl,
    Snev,
    Ld,
    Jpv,
    Rnd,
    Drw,
    Skp,
    Sknp,
    Ldvd,
    Ldkp,
    Lddv,
    Ldds,
    Addi,
    Lds,
    Ldbc,
    Ldmw,
    Ldmr,
    Assert,
}

impl Mnemonic {
    pub fn name(self) -> &'static str {
        match self {
            Mnemonic::Sys => "SYS",
            Mnemonic::Cls => "CLS",
            Mnemonic::Ret => "RET",
            Mnemonic::Jp => "JP",
            Mnemonic::Call => "CALL",
            Mnemonic::Sevb => "SEVB",
            Mnemonic::Sneb => "SNEB",
            Mnemonic::Sevv => "SEVV",
            Mnemonic::Ldb => "LDB",
            Mnemonic::Addb => "ADDB",
            Mnemonic::Ldv => "LDV",
            Mnemonic::Or => "OR",
            Mnemonic::And => "AND",
            Mnemonic::Xor => "XOR",
            Mnemonic::Addv => "ADDV",
            Mnemonic::Sub => "SUB",
            Mnemonic::Shr => "SHR",
            Mnemonic::Subn => "SUBN",
            Mnemonic::Shl => "SHL",
            Mnemonic::Snev => "SNEV",
            Mnemonic::Ld => "LD",
            Mnemonic::Jpv => "JPV",
            Mnemonic::Rnd => "RND",
            Mnemonic::Drw => "DRW",
            Mnemonic::Skp => "SKP",
            Mnemonic::Sknp => "SKNP",
            Mnemonic::Ldvd => "LDVD",
            Mnemonic::Ldkp => "LDKP",
            Mnemonic::Lddv => "LDDV",
            Mnemonic::Ldds => "LDDS",
            Mnemonic::Addi => "ADDI",
            Mnemonic::Lds => "LDS",
            Mnemonic::Ldbc => "LDBC",
            Mnemonic::Ldmw => "LDMW",
            Mnemonic::Ldmr => "LDMR",
            Mnemonic::Assert => "ASSERT",
        }
    }
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One row of the instruction table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub mnemonic: Mnemonic,
    pub template: Template,
    pub description: &'static str,
}

impl Instruction {
    const fn new(mnemonic: Mnemonic, pattern: &'static str, description: &'static str) -> Self {
        Instruction {
            mnemonic,
            template: Template::new(pattern),
            description,
        }
    }
}

/// # Instruction Set
/// The 35 standard Chip-8 instructions plus the `F999` debug exit.
///
/// Declaration order is significant: when two templates match an opcode equally
/// well the earlier one wins (see `decoder::decode`).
pub static INSTRUCTIONS: [Instruction; 36] = [
    Instruction::new(Mnemonic::Sys, "0nnn", "Jump to RCA 1802 code at nnn. Unsupported."),
    Instruction::new(Mnemonic::Cls, "00E0", "Clear the display."),
    Instruction::new(Mnemonic::Ret, "00EE", "Return from a subroutine."),
    Instruction::new(Mnemonic::Jp, "1nnn", "Jump to location nnn."),
    Instruction::new(Mnemonic::Call, "2nnn", "Call subroutine at nnn."),
    Instruction::new(Mnemonic::Sevb, "3xkk", "Skip next instruction if Vx = kk."),
    Instruction::new(Mnemonic::Sneb, "4xkk", "Skip next instruction if Vx != kk."),
    Instruction::new(Mnemonic::Sevv, "5xy0", "Skip next instruction if Vx = Vy."),
    Instruction::new(Mnemonic::Ldb, "6xkk", "Set Vx = kk."),
    Instruction::new(Mnemonic::Addb, "7xkk", "Set Vx = Vx + kk."),
    Instruction::new(Mnemonic::Ldv, "8xy0", "Set Vx = Vy."),
    Instruction::new(Mnemonic::Or, "8xy1", "Set Vx = Vx OR Vy."),
    Instruction::new(Mnemonic::And, "8xy2", "Set Vx = Vx AND Vy."),
    Instruction::new(Mnemonic::Xor, "8xy3", "Set Vx = Vx XOR Vy."),
    Instruction::new(Mnemonic::Addv, "8xy4", "Set Vx = Vx + Vy, set VF = carry."),
    Instruction::new(Mnemonic::Sub, "8xy5", "Set Vx = Vx - Vy, set VF = NOT borrow."),
    Instruction::new(Mnemonic::Shr, "8xy6", "Set Vx = Vx SHR 1."),
    Instruction::new(Mnemonic::Subn, "8xy7", "Set Vx = Vy - Vx, set VF = NOT borrow."),
    Instruction::new(Mnemonic::Shl, "8xyE", "Set Vx = Vx SHL 1."),
    Instruction::new(Mnemonic::Snev, "9xy0", "Skip next instruction if Vx != Vy."),
    Instruction::new(Mnemonic::Ld, "Annn", "Set I = nnn."),
    Instruction::new(Mnemonic::Jpv, "Bnnn", "Jump to location nnn + V0."),
    Instruction::new(Mnemonic::Rnd, "Cxkk", "Set Vx = random byte AND kk."),
    Instruction::new(
        Mnemonic::Drw,
        "Dxyn",
        "Display n-byte sprite starting at memory location I at (Vx, Vy), set VF = collision.",
    ),
    Instruction::new(Mnemonic::Skp, "Ex9E", "Skip next instruction if key with the value of Vx is pressed."),
    Instruction::new(Mnemonic::Sknp, "ExA1", "Skip next instruction if key with the value of Vx is not pressed."),
    Instruction::new(Mnemonic::Ldvd, "Fx07", "Set Vx = delay timer value."),
    Instruction::new(Mnemonic::Ldkp, "Fx0A", "Wait for a key press, store the value of the key in Vx."),
    Instruction::new(Mnemonic::Lddv, "Fx15", "Set delay timer = Vx."),
    Instruction::new(Mnemonic::Ldds, "Fx18", "Set sound timer = Vx."),
    Instruction::new(Mnemonic::Addi, "Fx1E", "Set I = I + Vx."),
    Instruction::new(Mnemonic::Lds, "Fx29", "Set I = location of sprite for digit Vx."),
    Instruction::new(Mnemonic::Ldbc, "Fx33", "Store BCD representation of Vx in memory locations I, I+1, and I+2."),
    Instruction::new(Mnemonic::Ldmw, "Fx55", "Store registers V0 through Vx in memory starting at location I."),
    Instruction::new(Mnemonic::Ldmr, "Fx65", "Read registers V0 through Vx from memory starting at location I."),
    Instruction::new(Mnemonic::Assert, "F999", "Returns from the program prematurely, with a status code in I."),
];
