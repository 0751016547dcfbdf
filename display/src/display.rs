use std::io::{self, Write};

use chip8_core::constants::{DISPLAY_HEIGHT, DISPLAY_WIDTH};
use chip8_core::FrameBuffer;

const ON: char = '█';
const OFF: char = ' ';
/// Moves the cursor to the top left so each frame overwrites the last
const CURSOR_HOME: &str = "\x1B[H";

/// # Display
/// The Chip-8 display is composed of 64x32 black/white pixels.
/// This renders them as 32 lines of 64 characters to any writer, one character
/// per pixel.
pub struct Display<W: Write> {
    out: W,
    on: char,
    off: char,
    overwrite: bool,
}

impl<W: Write> Display<W> {
    /// Creates a display that appends each frame to `out`
    ///
    /// # Arguments
    /// * `out` where rendered frames are written
    pub fn new(out: W) -> Self {
        Display {
            out,
            on: ON,
            off: OFF,
            overwrite: false,
        }
    }

    /// Swaps the characters used for lit and unlit pixels
    pub fn with_glyphs(self, on: char, off: char) -> Self {
        Display { on, off, ..self }
    }

    /// Homes the terminal cursor before each frame so frames redraw in place
    pub fn overwriting(self) -> Self {
        Display {
            overwrite: true,
            ..self
        }
    }

    /// Formats a Chip-8 FrameBuffer as text.
    ///
    /// Each row of the frame buffer becomes one line, terminated by a newline,
    /// with every pixel mapped to the lit or unlit character.
    ///
    /// # Arguments
    /// * `frame` a Chip-8 FrameBuffer
    pub fn frame_to_text(&self, frame: &FrameBuffer) -> String {
        let mut text = String::with_capacity((DISPLAY_WIDTH + 1) * DISPLAY_HEIGHT * self.on.len_utf8());
        for row in frame.rows() {
            text.extend(row.iter().map(|&lit| if lit { self.on } else { self.off }));
            text.push('\n');
        }
        text
    }

    /// Formats the frame as text and writes it out.
    ///
    /// # Arguments
    /// * `frame` a Chip-8 FrameBuffer
    pub fn render(&mut self, frame: &FrameBuffer) -> io::Result<()> {
        let text = self.frame_to_text(frame);
        if self.overwrite {
            self.out.write_all(CURSOR_HOME.as_bytes())?;
        }
        self.out.write_all(text.as_bytes())?;
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
