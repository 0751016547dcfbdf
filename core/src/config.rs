use crate::constants::MEMORY_SIZE;

/// What LDMW/LDMR leave in I after copying V0..Vx
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexQuirk {
    /// I += x; one short of the number of registers copied
    AddX,
    /// I += x + 1; the original COSMAC VIP interpreter
    AddXPlusOne,
    /// I is left alone; most modern interpreters
    Unchanged,
}

/// Knobs that change how the engine behaves, as opposed to what it runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Size of the memory space in bytes; at least enough to hold the font
    /// and a program at the origin
    pub memory_size: usize,
    /// Seed for RND; `None` draws one from the OS
    pub seed: Option<u64>,
    pub index_quirk: IndexQuirk,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            memory_size: MEMORY_SIZE,
            seed: None,
            index_quirk: IndexQuirk::AddX,
        }
    }
}

impl Config {
    pub fn with_seed(self, seed: u64) -> Self {
        Config {
            seed: Some(seed),
            ..self
        }
    }

    pub fn with_index_quirk(self, index_quirk: IndexQuirk) -> Self {
        Config {
            index_quirk,
            ..self
        }
    }

    pub fn with_memory_size(self, memory_size: usize) -> Self {
        Config {
            memory_size,
            ..self
        }
    }
}
