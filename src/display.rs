use bitvec::{array::BitArray, BitArr};

pub const DISPLAY_WIDTH: usize = 64;
pub const DISPLAY_HEIGHT: usize = 32;

/// Monochrome 64x32 framebuffer, one bit per pixel, row-major.
#[derive(Clone)]
pub struct Display {
    pixels: BitArr!(for DISPLAY_WIDTH * DISPLAY_HEIGHT),
}

impl Display {
    pub fn new() -> Self {
        Display {
            pixels: BitArray::ZERO,
        }
    }

    pub fn clear(&mut self) {
        self.pixels.fill(false);
    }

    /// Returns the pixel at (`x`, `y`). Coordinates outside the screen read as unlit.
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        if x >= DISPLAY_WIDTH || y >= DISPLAY_HEIGHT {
            return false;
        }
        self.pixels[y * DISPLAY_WIDTH + x]
    }

    /// XORs `sprite` onto the screen with its top-left corner at (`x`, `y`).
    ///
    /// Each byte is one row, most significant bit leftmost. Pixels past the
    /// right edge are clipped and drawing stops at the bottom edge; nothing
    /// wraps. Returns true if any lit pixel was turned off.
    pub fn draw_sprite(&mut self, x: usize, y: usize, sprite: &[u8]) -> bool {
        let mut collision = false;

        for (row, &byte) in sprite.iter().enumerate() {
            let pixel_y = y + row;
            if pixel_y >= DISPLAY_HEIGHT {
                break;
            }

            for bit in 0..8 {
                let pixel_x = x + bit;
                if pixel_x >= DISPLAY_WIDTH {
                    break;
                }

                let new_pixel = (byte >> (7 - bit)) & 1 == 1;
                if !new_pixel {
                    continue;
                }

                let index = pixel_y * DISPLAY_WIDTH + pixel_x;
                let current_pixel = self.pixels[index];
                if current_pixel {
                    collision = true;
                }
                self.pixels.set(index, !current_pixel);
            }
        }
        collision
    }

    /// Iterates rows top to bottom, each as a left-to-right iterator of pixels.
    pub fn rows(&self) -> impl Iterator<Item = impl Iterator<Item = bool> + '_> + '_ {
        self.pixels.as_bitslice()[..DISPLAY_WIDTH * DISPLAY_HEIGHT]
            .chunks(DISPLAY_WIDTH)
            .map(|row| row.iter().by_vals())
    }

    pub fn lit_count(&self) -> usize {
        self.pixels.as_bitslice()[..DISPLAY_WIDTH * DISPLAY_HEIGHT].count_ones()
    }
}

impl PartialEq for Display {
    fn eq(&self, other: &Self) -> bool {
        self.pixels.as_bitslice() == other.pixels.as_bitslice()
    }
}

impl Eq for Display {}

impl Default for Display {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Display {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.rows() {
            let line: String = row.map(|lit| if lit { '#' } else { '.' }).collect();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_and_erase_reports_collision() {
        let mut display = Display::new();
        assert!(!display.draw_sprite(0, 0, &[0xF0]));
        assert!(display.pixel(0, 0));
        assert!(display.pixel(3, 0));
        assert!(!display.pixel(4, 0));

        assert!(display.draw_sprite(0, 0, &[0xF0]));
        assert_eq!(display.lit_count(), 0);
    }

    #[test]
    fn test_overlapping_without_turning_off_is_not_a_collision() {
        let mut display = Display::new();
        display.draw_sprite(0, 0, &[0xF0]);
        assert!(!display.draw_sprite(4, 0, &[0xF0]));
        assert_eq!(display.lit_count(), 8);
    }

    #[test]
    fn test_clips_right_edge() {
        let mut display = Display::new();
        display.draw_sprite(60, 0, &[0xFF]);
        assert_eq!(display.lit_count(), 4);
        assert!(display.pixel(63, 0));
        assert!(!display.pixel(0, 0));
        assert!(!display.pixel(0, 1));
    }

    #[test]
    fn test_stops_at_bottom_edge() {
        let mut display = Display::new();
        display.draw_sprite(0, 30, &[0x80, 0x80, 0x80, 0x80]);
        assert_eq!(display.lit_count(), 2);
        assert!(display.pixel(0, 31));
        assert!(!display.pixel(0, 0));
    }

    #[test]
    fn test_clear() {
        let mut display = Display::new();
        display.draw_sprite(10, 10, &[0xFF, 0xFF, 0xFF]);
        display.clear();
        assert_eq!(display, Display::new());
    }

    #[test]
    fn test_rows_shape() {
        let mut display = Display::new();
        display.draw_sprite(1, 2, &[0x80]);
        let rows: Vec<Vec<bool>> = display.rows().map(|r| r.collect()).collect();
        assert_eq!(rows.len(), DISPLAY_HEIGHT);
        assert!(rows.iter().all(|r| r.len() == DISPLAY_WIDTH));
        assert!(rows[2][1]);
    }
}
