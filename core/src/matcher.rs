use crate::opcode::Opcode;

/// # Instruction Matcher
/// A four character template describing an opcode, one character per nibble.
///
/// Each character is either:
/// - a hex literal (`0-9`, `A-F`, either case) that the nibble must equal
/// - any other character, naming an argument carried by that nibble
///
/// e.g. `8xy4` fixes the first and last nibbles and names two arguments;
/// `1nnn` spreads a single 12-bit argument across three nibbles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    pattern: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Literal(u8),
    Argument(u8),
}

impl Slot {
    fn of(character: u8) -> Self {
        match character {
            b'0'..=b'9' => Slot::Literal(character - b'0'),
            b'a'..=b'f' => Slot::Literal(character - b'a' + 0xA),
            b'A'..=b'F' => Slot::Literal(character - b'A' + 0xA),
            other => Slot::Argument(other),
        }
    }
}

impl Template {
    /// Panics (at compile time, for the static table) unless `pattern` is
    /// exactly four ASCII characters.
    pub const fn new(pattern: &'static str) -> Self {
        let bytes = pattern.as_bytes();
        assert!(bytes.len() == 4, "a template has one character per nibble");
        let mut index = 0;
        while index < bytes.len() {
            assert!(bytes[index].is_ascii(), "templates are ASCII");
            index += 1;
        }
        Template { pattern }
    }

    pub fn pattern(&self) -> &'static str {
        self.pattern
    }

    fn slots(&self) -> impl Iterator<Item = (usize, Slot)> + 'static {
        self.pattern.bytes().map(Slot::of).enumerate()
    }

    /// Scores how specifically this template describes `op`.
    ///
    /// Returns the number of literal nibbles, or 0 if any literal nibble differs.
    /// A template made only of arguments never matches.
    pub fn matches(&self, op: u16) -> u8 {
        let mut score = 0;
        for (index, slot) in self.slots() {
            if let Slot::Literal(value) = slot {
                if op.nibble(index) != value {
                    return 0;
                }
                score += 1;
            }
        }
        score
    }

    /// Concatenates every nibble named `letter`, left to right.
    ///
    /// `1nnn` applied to `0x1ABC` with `'n'` yields `0xABC`; a letter that
    /// doesn't appear yields 0.
    pub fn argument(&self, op: u16, letter: char) -> u16 {
        self.slots()
            .filter(|&(_, slot)| slot == Slot::Argument(letter as u8))
            .fold(0, |argument, (index, _)| {
                argument << 4 | u16::from(op.nibble(index))
            })
    }

    /// The distinct argument letters in the order they first appear.
    pub fn placeholders(&self) -> Vec<char> {
        let mut letters: Vec<char> = Vec::new();
        for (_, slot) in self.slots() {
            if let Slot::Argument(letter) = slot {
                let letter = letter as char;
                if !letters.contains(&letter) {
                    letters.push(letter);
                }
            }
        }
        letters
    }
}
