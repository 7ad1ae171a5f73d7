use rand::Rng;

use crate::display::{DISPLAY_HEIGHT, DISPLAY_WIDTH};
use crate::error::{Error, Result};
use crate::memory::{Address, Memory};
use crate::state::{Chip8State, Register};

/// Fields of a raw instruction word, named after the usual CHIP-8 notation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DecodedInstruction {
    /// First nibble. Represents the operation code.
    pub opcode: u8,
    /// Second nibble. Used to look up one of the 16 registers.
    pub x: Register,
    /// Third nibble. Used to look up one of the 16 registers.
    pub y: Register,
    /// Fourth nibble. A 4-bit number.
    pub n: u8,
    /// The second byte (third and fourth nibbles). An 8-bit immediate number.
    pub nn: u8,
    /// The second, third, and fourth nibbles. A 12-bit immediate address.
    pub nnn: Address,
}
impl DecodedInstruction {
    pub fn new(raw: u16) -> Self {
        DecodedInstruction {
            opcode: (raw >> 12) as u8,
            x: Register::from_nibble((raw >> 8) as u8),
            y: Register::from_nibble((raw >> 4) as u8),
            n: (raw & 0x0F) as u8,
            nn: (raw & 0x00FF) as u8,
            nnn: raw & 0x0FFF,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// 00E0
    ClearScreen,
    /// 00EE
    SubroutineReturn,
    /// 1NNN
    Jump(Address),
    /// 2NNN
    SubroutineCall(Address),
    /// 3XNN
    SkipEqImmediate(Register, u8),
    /// 4XNN
    SkipNeqImmediate(Register, u8),
    /// 5XY0
    SkipEqRegister(Register, Register),
    /// 9XY0
    SkipNeqRegister(Register, Register),
    /// 6XNN
    SetImmediate(Register, u8),
    /// 7XNN
    AddImmediate(Register, u8),
    /// 8XY0
    SetXToY(Register, Register),
    /// 8XY1
    BinaryOr(Register, Register),
    /// 8XY2
    BinaryAnd(Register, Register),
    /// 8XY3
    LogicalXor(Register, Register),
    /// 8XY4
    AddWithCarry(Register, Register),
    /// 8XY5
    SubtractYFromX(Register, Register),
    /// 8XY6
    RightShift(Register, Register),
    /// 8XY7
    SubtractXFromY(Register, Register),
    /// 8XYE
    LeftShift(Register, Register),
    /// ANNN
    SetIndex(Address),
    /// BNNN
    JumpWithOffset(Address),
    /// CXNN
    Random(Register, u8),
    /// DXYN
    Draw(Register, Register, u8),
    /// EX9E
    SkipIfKeyPressed(Register),
    /// EXA1
    SkipIfKeyNotPressed(Register),
    /// FX07
    ReadDelayTimer(Register),
    /// FX0A
    GetKey(Register),
    /// FX15
    SetDelayTimer(Register),
    /// FX18
    SetSoundTimer(Register),
    /// FX1E
    AddToIndex(Register),
    /// FX29
    FontChar(Register),
    /// FX33
    BinaryCodedDecimal(Register),
    /// FX55
    Store(Register),
    /// FX65
    Load(Register),
}

pub fn decode(raw: u16) -> Result<Instruction> {
    use Instruction::*;

    let d = DecodedInstruction::new(raw);
    let unknown = Err(Error::UnknownInstruction { raw });

    let instruction = match d.opcode {
        0x0 => match d.nnn {
            0x0E0 => ClearScreen,
            0x0EE => SubroutineReturn,
            _ => return unknown,
        },
        0x1 => Jump(d.nnn),
        0x2 => SubroutineCall(d.nnn),
        0x3 => SkipEqImmediate(d.x, d.nn),
        0x4 => SkipNeqImmediate(d.x, d.nn),
        0x5 if d.n == 0 => SkipEqRegister(d.x, d.y),
        0x6 => SetImmediate(d.x, d.nn),
        0x7 => AddImmediate(d.x, d.nn),
        0x8 => match d.n {
            0x0 => SetXToY(d.x, d.y),
            0x1 => BinaryOr(d.x, d.y),
            0x2 => BinaryAnd(d.x, d.y),
            0x3 => LogicalXor(d.x, d.y),
            0x4 => AddWithCarry(d.x, d.y),
            0x5 => SubtractYFromX(d.x, d.y),
            0x6 => RightShift(d.x, d.y),
            0x7 => SubtractXFromY(d.x, d.y),
            0xE => LeftShift(d.x, d.y),
            _ => return unknown,
        },
        0x9 if d.n == 0 => SkipNeqRegister(d.x, d.y),
        0xA => SetIndex(d.nnn),
        0xB => JumpWithOffset(d.nnn),
        0xC => Random(d.x, d.nn),
        0xD => Draw(d.x, d.y, d.n),
        0xE => match d.nn {
            0x9E => SkipIfKeyPressed(d.x),
            0xA1 => SkipIfKeyNotPressed(d.x),
            _ => return unknown,
        },
        0xF => match d.nn {
            0x07 => ReadDelayTimer(d.x),
            0x0A => GetKey(d.x),
            0x15 => SetDelayTimer(d.x),
            0x18 => SetSoundTimer(d.x),
            0x1E => AddToIndex(d.x),
            0x29 => FontChar(d.x),
            0x33 => BinaryCodedDecimal(d.x),
            0x55 => Store(d.x),
            0x65 => Load(d.x),
            _ => return unknown,
        },
        _ => return unknown,
    };
    Ok(instruction)
}

impl Instruction {
    /// Applies the instruction to `state`. The program counter must already
    /// point past this instruction.
    pub fn execute(self, state: &mut Chip8State) -> Result<()> {
        use Instruction::*;

        let regs = &mut state.registers;
        match self {
            ClearScreen => state.display.clear(),
            SubroutineReturn => {
                if let Some(return_address) = state.stack.pop() {
                    state.pc = return_address;
                } else {
                    log::debug!("Return with empty call stack at {:#05X}", state.pc);
                }
            }
            Jump(addr) => state.pc = addr,
            SubroutineCall(addr) => {
                state.stack.push(state.pc)?;
                state.pc = addr;
            }
            SkipEqImmediate(x, nn) => {
                if regs.read(x) == nn {
                    state.skip_next();
                }
            }
            SkipNeqImmediate(x, nn) => {
                if regs.read(x) != nn {
                    state.skip_next();
                }
            }
            SkipEqRegister(x, y) => {
                if regs.read(x) == regs.read(y) {
                    state.skip_next();
                }
            }
            SkipNeqRegister(x, y) => {
                if regs.read(x) != regs.read(y) {
                    state.skip_next();
                }
            }
            SetImmediate(x, nn) => regs.write(x, nn),
            AddImmediate(x, nn) => regs.write(x, regs.read(x).wrapping_add(nn)),
            SetXToY(x, y) => regs.write(x, regs.read(y)),
            BinaryOr(x, y) => regs.write(x, regs.read(x) | regs.read(y)),
            BinaryAnd(x, y) => regs.write(x, regs.read(x) & regs.read(y)),
            LogicalXor(x, y) => regs.write(x, regs.read(x) ^ regs.read(y)),
            AddWithCarry(x, y) => {
                let (sum, carry) = regs.read(x).overflowing_add(regs.read(y));
                regs.write(x, sum);
                regs.set_flag(carry);
            }
            SubtractYFromX(x, y) => {
                let (value_x, value_y) = (regs.read(x), regs.read(y));
                regs.write(x, value_x.wrapping_sub(value_y));
                regs.set_flag(value_x >= value_y);
            }
            SubtractXFromY(x, y) => {
                let (value_x, value_y) = (regs.read(x), regs.read(y));
                regs.write(x, value_y.wrapping_sub(value_x));
                regs.set_flag(value_y >= value_x);
            }
            RightShift(x, y) => {
                let value_y = regs.read(y);
                regs.write(x, value_y >> 1);
                regs.write(Register::VF, value_y & 0x01);
            }
            LeftShift(x, y) => {
                let value_y = regs.read(y);
                regs.write(x, value_y << 1);
                regs.write(Register::VF, value_y >> 7);
            }
            SetIndex(addr) => state.index = addr,
            JumpWithOffset(addr) => {
                state.pc = addr + Address::from(regs.read(Register::V0));
            }
            Random(x, nn) => {
                let random_value = state.rng.random::<u8>() & nn;
                regs.write(x, random_value);
            }
            Draw(x, y, rows) => {
                let pos_x = usize::from(regs.read(x)) % DISPLAY_WIDTH;
                let pos_y = usize::from(regs.read(y)) % DISPLAY_HEIGHT;
                let mut buf = [0; 15];
                let sprite = state.memory.read_sprite(state.index, &mut buf, rows);
                let collision = state.display.draw_sprite(pos_x, pos_y, sprite);
                regs.set_flag(collision);
            }
            SkipIfKeyPressed(x) => {
                if state.keypad.is_key_pressed(regs.read(x)) {
                    state.skip_next();
                }
            }
            SkipIfKeyNotPressed(x) => {
                if !state.keypad.is_key_pressed(regs.read(x)) {
                    state.skip_next();
                }
            }
            ReadDelayTimer(x) => regs.write(x, state.timers.delay),
            GetKey(x) => match state.keypad.first_pressed() {
                Some(key) => regs.write(x, key),
                // Re-run this instruction until a key shows up
                None => state.pc = state.pc.wrapping_sub(2),
            },
            SetDelayTimer(x) => state.timers.delay = regs.read(x),
            SetSoundTimer(x) => state.timers.sound = regs.read(x),
            AddToIndex(x) => {
                let sum = state.index + Address::from(regs.read(x));
                state.index = sum & 0x0FFF;
                if sum > 0x0FFF {
                    regs.set_flag(true);
                }
            }
            FontChar(x) => state.index = Memory::font_glyph_addr(regs.read(x)),
            BinaryCodedDecimal(x) => {
                let value_x = regs.read(x);
                let bcd = [value_x / 100, (value_x / 10) % 10, value_x % 10];
                for (i, digit) in bcd.into_iter().enumerate() {
                    state
                        .memory
                        .write(state.index.wrapping_add(i as Address), digit);
                }
            }
            Store(x) => {
                for (i, reg) in x.up_to().enumerate() {
                    state
                        .memory
                        .write(state.index.wrapping_add(i as Address), regs.read(reg));
                }
            }
            Load(x) => {
                for (i, reg) in x.up_to().enumerate() {
                    regs.write(reg, state.memory.read(state.index.wrapping_add(i as Address)));
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use Instruction::*;

        match *self {
            ClearScreen => write!(f, "CLS"),
            SubroutineReturn => write!(f, "RET"),
            Jump(addr) => write!(f, "JP {addr:#05X}"),
            SubroutineCall(addr) => write!(f, "CALL {addr:#05X}"),
            SkipEqImmediate(x, nn) => write!(f, "SE {x}, {nn:#04X}"),
            SkipNeqImmediate(x, nn) => write!(f, "SNE {x}, {nn:#04X}"),
            SkipEqRegister(x, y) => write!(f, "SE {x}, {y}"),
            SkipNeqRegister(x, y) => write!(f, "SNE {x}, {y}"),
            SetImmediate(x, nn) => write!(f, "LD {x}, {nn:#04X}"),
            AddImmediate(x, nn) => write!(f, "ADD {x}, {nn:#04X}"),
            SetXToY(x, y) => write!(f, "LD {x}, {y}"),
            BinaryOr(x, y) => write!(f, "OR {x}, {y}"),
            BinaryAnd(x, y) => write!(f, "AND {x}, {y}"),
            LogicalXor(x, y) => write!(f, "XOR {x}, {y}"),
            AddWithCarry(x, y) => write!(f, "ADD {x}, {y}"),
            SubtractYFromX(x, y) => write!(f, "SUB {x}, {y}"),
            RightShift(x, y) => write!(f, "SHR {x}, {y}"),
            SubtractXFromY(x, y) => write!(f, "SUBN {x}, {y}"),
            LeftShift(x, y) => write!(f, "SHL {x}, {y}"),
            SetIndex(addr) => write!(f, "LD I, {addr:#05X}"),
            JumpWithOffset(addr) => write!(f, "JP V0, {addr:#05X}"),
            Random(x, nn) => write!(f, "RND {x}, {nn:#04X}"),
            Draw(x, y, n) => write!(f, "DRW {x}, {y}, {n}"),
            SkipIfKeyPressed(x) => write!(f, "SKP {x}"),
            SkipIfKeyNotPressed(x) => write!(f, "SKNP {x}"),
            ReadDelayTimer(x) => write!(f, "LD {x}, DT"),
            GetKey(x) => write!(f, "LD {x}, K"),
            SetDelayTimer(x) => write!(f, "LD DT, {x}"),
            SetSoundTimer(x) => write!(f, "LD ST, {x}"),
            AddToIndex(x) => write!(f, "ADD I, {x}"),
            FontChar(x) => write!(f, "LD F, {x}"),
            BinaryCodedDecimal(x) => write!(f, "LD B, {x}"),
            Store(x) => write!(f, "LD [I], {x}"),
            Load(x) => write!(f, "LD {x}, [I]"),
        }
    }
}
