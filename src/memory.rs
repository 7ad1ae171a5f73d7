use std::ops::Range;

use crate::error::{Error, Result};

pub type Address = u16;

pub const MEM_SIZE: usize = 4096;
pub const FONT_ADDR: Address = 0x50;
pub const FONT_HEIGHT: usize = 5;
pub const PC_START_ADDR: Address = 0x200;
pub const MAX_ROM_SIZE: usize = MEM_SIZE - PC_START_ADDR as usize;

/// Mask applied to every data address; memory is 12-bit addressable.
const ADDR_MASK: Address = 0x0FFF;

pub const FONT_DATA: [u8; 16 * FONT_HEIGHT] = [
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

/// Address range occupied by the built-in hex font.
pub const FONT_REGION: Range<usize> = FONT_ADDR as usize..FONT_ADDR as usize + FONT_DATA.len();

/// The 4 KiB address space: interpreter font at 0x050, program from 0x200.
pub struct Memory {
    data: [u8; MEM_SIZE],
}

impl Memory {
    pub fn new() -> Self {
        let data = {
            let mut data = [0; MEM_SIZE];
            data[FONT_REGION].copy_from_slice(&FONT_DATA);
            data
        };

        Memory { data }
    }

    /// Reads a byte. Addresses wrap at 0xFFF.
    pub fn read(&self, addr: Address) -> u8 {
        self.data[usize::from(addr & ADDR_MASK)]
    }

    /// Writes a byte. Addresses wrap at 0xFFF; the font region is read-only.
    pub fn write(&mut self, addr: Address, value: u8) {
        let addr = usize::from(addr & ADDR_MASK);
        if FONT_REGION.contains(&addr) {
            log::warn!("Ignoring write of {value:#04X} into font region at {addr:#05X}");
            return;
        }
        self.data[addr] = value;
    }

    /// Reads the big-endian instruction word at `pc`.
    pub fn fetch_word(&self, pc: Address) -> Result<u16> {
        let addr = usize::from(pc);
        if addr + 2 > MEM_SIZE {
            return Err(Error::OutOfBounds { pc });
        }
        Ok(u16::from_be_bytes([self.data[addr], self.data[addr + 1]]))
    }

    pub fn load_rom(&mut self, rom: &[u8]) -> Result<()> {
        if rom.is_empty() {
            return Err(Error::EmptyProgram);
        }
        if rom.len() > MAX_ROM_SIZE {
            return Err(Error::ProgramTooLarge {
                size: rom.len(),
                max: MAX_ROM_SIZE,
            });
        }
        let start = usize::from(PC_START_ADDR);
        self.data[start..start + rom.len()].copy_from_slice(rom);
        Ok(())
    }

    /// Copies `rows` sprite bytes starting at `index` into `buf`, wrapping at 0xFFF.
    pub fn read_sprite<'a>(&self, index: Address, buf: &'a mut [u8; 15], rows: u8) -> &'a [u8] {
        let rows = usize::from(rows).min(buf.len());
        for (offset, byte) in buf.iter_mut().take(rows).enumerate() {
            *byte = self.read(index.wrapping_add(offset as Address));
        }
        &buf[..rows]
    }

    /// Start address of the glyph for hex digit `digit & 0xF`.
    pub fn font_glyph_addr(digit: u8) -> Address {
        FONT_ADDR + Address::from(digit & 0x0F) * FONT_HEIGHT as Address
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_loaded_and_program_zeroed() {
        let m = Memory::new();
        assert_eq!(&m.as_slice()[FONT_REGION], &FONT_DATA[..]);
        assert!(m.as_slice()[..FONT_REGION.start].iter().all(|&b| b == 0));
        assert!(m.as_slice()[usize::from(PC_START_ADDR)..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_load_rom() -> Result<()> {
        let mut m = Memory::new();
        m.load_rom(&[0x00, 0xE0, 0x12, 0x00])?;
        assert_eq!(&m.as_slice()[0x200..0x204], &[0x00, 0xE0, 0x12, 0x00]);
        Ok(())
    }

    #[test]
    fn test_load_rom_rejects_empty_and_oversize() {
        let mut m = Memory::new();
        assert_eq!(m.load_rom(&[]), Err(Error::EmptyProgram));
        assert_eq!(
            m.load_rom(&vec![0xAA; MAX_ROM_SIZE + 1]),
            Err(Error::ProgramTooLarge {
                size: MAX_ROM_SIZE + 1,
                max: MAX_ROM_SIZE
            })
        );
        assert!(m.load_rom(&vec![0xAA; MAX_ROM_SIZE]).is_ok());
        assert_eq!(m.read(0xFFF), 0xAA);
    }

    #[test]
    fn test_fetch_word_is_big_endian() -> Result<()> {
        let mut m = Memory::new();
        m.write(0x300, 0xA2);
        m.write(0x301, 0xF0);
        assert_eq!(m.fetch_word(0x300)?, 0xA2F0);
        Ok(())
    }

    #[test]
    fn test_fetch_word_out_of_bounds() {
        let m = Memory::new();
        assert!(m.fetch_word(0xFFE).is_ok());
        assert_eq!(m.fetch_word(0xFFF), Err(Error::OutOfBounds { pc: 0xFFF }));
        assert_eq!(m.fetch_word(0x1000), Err(Error::OutOfBounds { pc: 0x1000 }));
    }

    #[test]
    fn test_addresses_wrap() {
        let mut m = Memory::new();
        m.write(0x1300, 0x42);
        assert_eq!(m.read(0x300), 0x42);
    }

    #[test]
    fn test_font_region_is_read_only() {
        let mut m = Memory::new();
        m.write(FONT_ADDR, 0x00);
        m.write(0x9F, 0x00);
        assert_eq!(&m.as_slice()[FONT_REGION], &FONT_DATA[..]);
        m.write(0xA0, 0x11);
        assert_eq!(m.read(0xA0), 0x11);
    }

    #[test]
    fn test_read_sprite_wraps() {
        let mut m = Memory::new();
        m.write(0xFFF, 0x80);
        m.write(0x000, 0x40);
        let mut buf = [0; 15];
        assert_eq!(m.read_sprite(0xFFF, &mut buf, 2), &[0x80, 0x40]);
    }

    #[test]
    fn test_font_glyph_addr() {
        assert_eq!(Memory::font_glyph_addr(0x0), 0x50);
        assert_eq!(Memory::font_glyph_addr(0xA), 0x50 + 50);
        assert_eq!(Memory::font_glyph_addr(0x1F), 0x50 + 75);
    }
}
