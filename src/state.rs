use std::time::Instant;

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::display::Display;
use crate::error::{Error, Result};
use crate::keypad::Keypad;
use crate::memory::{Address, Memory, PC_START_ADDR};
use crate::timer::Timers;

pub const NUM_REGISTERS: usize = 16;
pub const STACK_DEPTH: usize = 16;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Register {
    V0,
    V1,
    V2,
    V3,
    V4,
    V5,
    V6,
    V7,
    V8,
    V9,
    VA,
    VB,
    VC,
    VD,
    VE,
    VF,
}
impl Register {
    const ALL: [Register; NUM_REGISTERS] = [
        Register::V0,
        Register::V1,
        Register::V2,
        Register::V3,
        Register::V4,
        Register::V5,
        Register::V6,
        Register::V7,
        Register::V8,
        Register::V9,
        Register::VA,
        Register::VB,
        Register::VC,
        Register::VD,
        Register::VE,
        Register::VF,
    ];

    /// Register named by the low nibble of `value`.
    pub fn from_nibble(value: u8) -> Self {
        Self::ALL[usize::from(value & 0x0F)]
    }

    /// V0 through `self`, inclusive.
    pub fn up_to(self) -> impl Iterator<Item = Register> {
        Self::ALL.into_iter().take(self as usize + 1)
    }
}

impl std::fmt::Display for Register {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "V{:X}", *self as u8)
    }
}

/// V0-VF. VF doubles as the flag output but stays an ordinary register.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegisterBank {
    registers: [u8; NUM_REGISTERS],
}
impl RegisterBank {
    pub fn new() -> Self {
        RegisterBank {
            registers: [0; NUM_REGISTERS],
        }
    }

    pub fn read(&self, reg: Register) -> u8 {
        self.registers[reg as usize]
    }

    pub fn write(&mut self, reg: Register, value: u8) {
        self.registers[reg as usize] = value;
    }

    pub fn set_flag(&mut self, flag: bool) {
        self.write(Register::VF, u8::from(flag));
    }

    pub fn as_array(&self) -> &[u8; NUM_REGISTERS] {
        &self.registers
    }
}

/// Fixed-depth return address stack.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallStack {
    frames: [Address; STACK_DEPTH],
    sp: usize,
}
impl CallStack {
    pub fn new() -> Self {
        CallStack {
            frames: [0; STACK_DEPTH],
            sp: 0,
        }
    }

    pub fn push(&mut self, addr: Address) -> Result<()> {
        if self.sp == STACK_DEPTH {
            return Err(Error::StackOverflow { pc: addr });
        }
        self.frames[self.sp] = addr;
        self.sp += 1;
        Ok(())
    }

    /// Pops the top frame and zeroes its slot. Popping an empty stack yields `None`.
    pub fn pop(&mut self) -> Option<Address> {
        if self.sp == 0 {
            return None;
        }
        self.sp -= 1;
        let addr = self.frames[self.sp];
        self.frames[self.sp] = 0;
        Some(addr)
    }

    pub fn depth(&self) -> usize {
        self.sp
    }

    pub fn frames(&self) -> &[Address; STACK_DEPTH] {
        &self.frames
    }
}

/// Everything an instruction may read or mutate.
pub struct Chip8State {
    pub memory: Memory,
    pub registers: RegisterBank,
    pub pc: Address,
    pub index: Address,
    pub stack: CallStack,
    pub timers: Timers,
    pub display: Display,
    pub keypad: Keypad,
    pub rng: StdRng,
}
impl Chip8State {
    pub fn new(rng: StdRng, now: Instant) -> Self {
        Chip8State {
            memory: Memory::new(),
            registers: RegisterBank::new(),
            pc: PC_START_ADDR,
            index: 0,
            stack: CallStack::new(),
            timers: Timers::new(now),
            display: Display::new(),
            keypad: Keypad::new(),
            rng,
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed), Instant::now())
    }

    pub fn skip_next(&mut self) {
        self.pc = self.pc.wrapping_add(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_from_nibble() {
        assert_eq!(Register::from_nibble(0x0), Register::V0);
        assert_eq!(Register::from_nibble(0xF), Register::VF);
        assert_eq!(Register::from_nibble(0x3A), Register::VA);
        assert_eq!(Register::VC.to_string(), "VC");
    }

    #[test]
    fn test_register_up_to_is_inclusive() {
        assert_eq!(
            Register::V2.up_to().collect::<Vec<_>>(),
            vec![Register::V0, Register::V1, Register::V2]
        );
        assert_eq!(Register::VF.up_to().count(), NUM_REGISTERS);
    }

    #[test]
    fn test_stack_push_pop() -> Result<()> {
        let mut stack = CallStack::new();
        stack.push(0x202)?;
        stack.push(0x304)?;
        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.pop(), Some(0x304));
        assert_eq!(stack.frames()[1], 0);
        assert_eq!(stack.pop(), Some(0x202));
        assert_eq!(stack.pop(), None);
        assert_eq!(stack.depth(), 0);
        Ok(())
    }

    #[test]
    fn test_stack_overflow() -> Result<()> {
        let mut stack = CallStack::new();
        for i in 0..STACK_DEPTH as Address {
            stack.push(0x200 + i * 2)?;
        }
        assert_eq!(stack.push(0x400), Err(Error::StackOverflow { pc: 0x400 }));
        assert_eq!(stack.depth(), STACK_DEPTH);
        Ok(())
    }

    #[test]
    fn test_new_state() {
        let state = Chip8State::with_seed(1);
        assert_eq!(state.pc, PC_START_ADDR);
        assert_eq!(state.index, 0);
        assert_eq!(state.registers, RegisterBank::new());
        assert_eq!(state.stack.depth(), 0);
        assert_eq!(state.display.lit_count(), 0);
        assert!(state.keypad.is_empty());
    }
}
