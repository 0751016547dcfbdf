use crate::constants::{DISPLAY_HEIGHT, DISPLAY_WIDTH, SPRITE_WIDTH};

/// A sprite blit, handed to the frontend by DRW
///
/// `pixels` is the sprite flattened row by row, `width` cells per row; each
/// source byte maps MSB-to-LSB onto left-to-right pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawRequest {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<bool>,
}

impl DrawRequest {
    /// Builds an 8-pixel wide request from one byte per row
    pub fn from_sprite(x: usize, y: usize, rows: &[u8]) -> Self {
        let pixels = rows
            .iter()
            .flat_map(|row| (0..SPRITE_WIDTH).map(move |bit| (row >> (7 - bit)) & 0x1 == 1))
            .collect();
        DrawRequest {
            x,
            y,
            width: SPRITE_WIDTH,
            height: rows.len(),
            pixels,
        }
    }

    pub fn pixel(&self, column: usize, row: usize) -> bool {
        self.pixels[row * self.width + column]
    }
}

/// # Frame Buffer
/// The Chip-8 display is composed of 64x32 black/white pixels, indexed as [y][x].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    cells: [[bool; DISPLAY_WIDTH]; DISPLAY_HEIGHT],
}

impl FrameBuffer {
    pub fn new() -> Self {
        FrameBuffer {
            cells: [[false; DISPLAY_WIDTH]; DISPLAY_HEIGHT],
        }
    }

    pub fn clear(&mut self) {
        self.cells = [[false; DISPLAY_WIDTH]; DISPLAY_HEIGHT];
    }

    /// Reads a pixel, wrapping coordinates onto the display
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.cells[y % DISPLAY_HEIGHT][x % DISPLAY_WIDTH]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[bool; DISPLAY_WIDTH]> {
        self.cells.iter()
    }

    /// XORs a sprite onto the display with wrapping on both axes.
    /// Returns true if any pixel was turned off.
    pub fn blit(&mut self, request: &DrawRequest) -> bool {
        let mut collision = false;
        for row in 0..request.height {
            let y = (request.y + row) % DISPLAY_HEIGHT;
            for column in 0..request.width {
                if !request.pixel(column, row) {
                    continue;
                }
                let x = (request.x + column) % DISPLAY_WIDTH;
                let cell = &mut self.cells[y][x];
                collision |= *cell;
                *cell = !*cell;
            }
        }
        collision
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}
