//! Monochrome 64x32 framebuffer with XOR sprite drawing.
//!
//! Each row is stored as a `u64` with column 0 in the most significant bit,
//! so wrapping a sprite row across the right edge is a rotation and clipping
//! is a plain shift.

use std::fmt;

/// Framebuffer width in pixels.
pub const DISPLAY_WIDTH: usize = 64;
/// Framebuffer height in pixels.
pub const DISPLAY_HEIGHT: usize = 32;
/// Tallest sprite a single draw can produce.
pub const MAX_SPRITE_ROWS: usize = 15;

/// Handling of sprite pixels that extend past the right or bottom edge.
///
/// The sprite origin always wraps modulo the screen size; this only governs
/// the pixels that overhang.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum SpriteEdge {
    /// Overhanging pixels reappear on the opposite edge.
    #[default]
    Wrap,
    /// Overhanging pixels are dropped.
    Clip,
}

/// 64x32 grid of on/off pixels.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DisplayBuffer {
    rows: [u64; DISPLAY_HEIGHT],
}

impl DisplayBuffer {
    /// Creates an all-off framebuffer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            rows: [0; DISPLAY_HEIGHT],
        }
    }

    /// Turns every pixel off.
    pub fn clear(&mut self) {
        self.rows = [0; DISPLAY_HEIGHT];
    }

    /// Returns the pixel at `(x, y)`; out-of-range coordinates read as off.
    #[must_use]
    pub const fn pixel(&self, x: usize, y: usize) -> bool {
        if x >= DISPLAY_WIDTH || y >= DISPLAY_HEIGHT {
            return false;
        }
        (self.rows[y] >> (DISPLAY_WIDTH - 1 - x)) & 1 == 1
    }

    /// Row `y` as a bitmask with column 0 in the most significant bit.
    #[must_use]
    pub const fn row_bits(&self, y: usize) -> u64 {
        self.rows[y % DISPLAY_HEIGHT]
    }

    /// Number of lit pixels.
    #[must_use]
    pub fn lit_count(&self) -> u32 {
        self.rows.iter().map(|row| row.count_ones()).sum()
    }

    /// Iterates `(x, y, lit)` over every pixel in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = (usize, usize, bool)> + '_ {
        (0..DISPLAY_HEIGHT)
            .flat_map(|y| (0..DISPLAY_WIDTH).map(move |x| (x, y)))
            .map(|(x, y)| (x, y, self.pixel(x, y)))
    }

    /// XOR-draws `sprite` with its top-left corner at `(x, y)`, wrapping
    /// overhanging pixels. See [`Self::draw_sprite_with_edge`].
    pub fn draw_sprite(&mut self, x: u8, y: u8, sprite: &[u8]) -> bool {
        self.draw_sprite_with_edge(x, y, sprite, SpriteEdge::Wrap)
    }

    /// XOR-draws up to [`MAX_SPRITE_ROWS`] rows of 8 pixels each.
    ///
    /// The origin is reduced modulo 64 and 32. Returns `true` when any pixel
    /// went from on to off during this draw.
    pub fn draw_sprite_with_edge(&mut self, x: u8, y: u8, sprite: &[u8], edge: SpriteEdge) -> bool {
        let origin_x = u32::from(x) % DISPLAY_WIDTH as u32;
        let origin_y = usize::from(y) % DISPLAY_HEIGHT;
        let mut collision = false;

        for (offset, byte) in sprite.iter().take(MAX_SPRITE_ROWS).enumerate() {
            let row = origin_y + offset;
            let row = match edge {
                SpriteEdge::Wrap => row % DISPLAY_HEIGHT,
                SpriteEdge::Clip if row >= DISPLAY_HEIGHT => break,
                SpriteEdge::Clip => row,
            };

            let aligned = u64::from(*byte) << (DISPLAY_WIDTH - 8);
            let bits = match edge {
                SpriteEdge::Wrap => aligned.rotate_right(origin_x),
                SpriteEdge::Clip => aligned >> origin_x,
            };

            collision |= self.rows[row] & bits != 0;
            self.rows[row] ^= bits;
        }

        collision
    }
}

impl fmt::Display for DisplayBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..DISPLAY_HEIGHT {
            for x in 0..DISPLAY_WIDTH {
                f.write_str(if self.pixel(x, y) { "#" } else { "." })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Debug for DisplayBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisplayBuffer")
            .field("lit", &self.lit_count())
            .finish()
    }
}
