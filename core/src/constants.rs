use std::time::Duration;

/// Bytes of addressable memory
pub const MEMORY_SIZE: usize = 4096;

/// ROMs are loaded, and execution begins, at this address
pub const PROGRAM_ORIGIN: u16 = 0x200;

pub const DISPLAY_WIDTH: usize = 64;
pub const DISPLAY_HEIGHT: usize = 32;

/// VF doubles as the carry, borrow and collision flag
pub const FLAG_REGISTER: usize = 0xF;

pub const REGISTER_COUNT: usize = 16;

/// CALL nests at most this deep
pub const STACK_DEPTH: usize = 16;

pub const KEY_COUNT: usize = 16;

/// Every sprite drawn by DRW is a single byte wide
pub const SPRITE_WIDTH: usize = 8;

/// Each hex digit glyph is 5 rows tall
pub const GLYPH_HEIGHT: u16 = 5;

/// The glyph table sits directly below the origin, ending at 0x1FF
pub const FONT_ADDR: u16 = 0x1FF - SPRITE_SHEET.len() as u16;

/// Delay and sound timers tick down at 60Hz
pub const TIMER_INTERVAL: Duration = Duration::from_nanos(1_000_000_000 / 60);

/// Key reported to a pending key wait when the host shuts the engine down
pub const SENTINEL_KEY: u8 = 0x0;

/// # Sprite Sheet
/// One 4x5 glyph per hex digit; the high nibble of each byte is a row.
/// ```text
/// 0xF0  ####
/// 0x90  #  #
/// 0x90  #  #
/// 0x90  #  #
/// 0xF0  ####
/// ```
#[rustfmt::skip]
pub const SPRITE_SHEET: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];
