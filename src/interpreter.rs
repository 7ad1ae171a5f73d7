use std::time::Instant;

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::display::Display;
use crate::error::Result;
use crate::instruction::{decode, Instruction};
use crate::keypad::Keypad;
use crate::memory::{Address, Memory};
use crate::state::{CallStack, Chip8State, RegisterBank};
use crate::timer::Timer;

pub const DEFAULT_INSTRUCTIONS_PER_SECOND: u64 = 700;

/// A loaded CHIP-8 program and the machine running it.
///
/// The host drives execution by calling [`Interpreter::advance`] at its
/// chosen rate, handing over the currently held keys beforehand with
/// [`Interpreter::set_pressed_keys`], and reading back the display and the
/// sound timer afterwards.
pub struct Interpreter {
    state: Chip8State,
}

impl Interpreter {
    /// Loads `rom` at 0x200 with an OS-seeded random generator.
    pub fn load(rom: &[u8]) -> Result<Self> {
        Self::load_with_rng(rom, StdRng::from_os_rng())
    }

    /// Loads `rom` with a fixed seed so that CXNN produces a repeatable sequence.
    pub fn load_with_seed(rom: &[u8], seed: u64) -> Result<Self> {
        Self::load_with_rng(rom, StdRng::seed_from_u64(seed))
    }

    fn load_with_rng(rom: &[u8], rng: StdRng) -> Result<Self> {
        let mut state = Chip8State::new(rng, Instant::now());
        state.memory.load_rom(rom)?;
        log::debug!("Loaded {} byte ROM at {:#05X}", rom.len(), state.pc);
        Ok(Interpreter { state })
    }

    /// Runs one cycle against the wall clock.
    pub fn advance(&mut self) -> Result<()> {
        self.advance_at(Instant::now())
    }

    /// Runs one cycle as if the current time were `now`: tick the timers if
    /// due, then fetch, decode and execute a single instruction.
    pub fn advance_at(&mut self, now: Instant) -> Result<()> {
        self.state.timers.update(now);

        let instruction = self.fetch_instruction()?;
        instruction.execute(&mut self.state)
    }

    fn fetch_instruction(&mut self) -> Result<Instruction> {
        let pc = self.state.pc;
        let raw = self.state.memory.fetch_word(pc)?;

        // Move the program counter to next instruction
        self.state.pc = pc + 2;

        let instruction = decode(raw).inspect_err(|err| log::debug!("{err} at {pc:#05X}"))?;
        log::trace!("{pc:#05X}: {raw:04X}  {instruction}");
        Ok(instruction)
    }

    /// Replaces the pressed-key snapshot. Keys stay pressed until the next call.
    pub fn set_pressed_keys(&mut self, keys: impl IntoIterator<Item = u8>) {
        self.state.keypad = Keypad::from_keys(keys);
    }

    /// Decodes the instruction at the program counter without executing it.
    pub fn peek_instruction(&self) -> Result<Instruction> {
        decode(self.state.memory.fetch_word(self.state.pc)?)
    }

    pub fn display(&self) -> &Display {
        &self.state.display
    }

    pub fn sound_timer(&self) -> Timer {
        self.state.timers.sound
    }

    pub fn delay_timer(&self) -> Timer {
        self.state.timers.delay
    }

    pub fn is_sound_active(&self) -> bool {
        self.state.timers.sound > 0
    }

    pub fn pc(&self) -> Address {
        self.state.pc
    }

    pub fn index(&self) -> Address {
        self.state.index
    }

    pub fn registers(&self) -> &RegisterBank {
        &self.state.registers
    }

    pub fn stack(&self) -> &CallStack {
        &self.state.stack
    }

    pub fn keypad(&self) -> &Keypad {
        &self.state.keypad
    }

    pub fn memory(&self) -> &Memory {
        &self.state.memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::state::Register;
    use crate::timer::TICK_INTERVAL;

    fn interpreter(rom: &[u8]) -> Interpreter {
        Interpreter::load_with_seed(rom, 7).unwrap()
    }

    #[test]
    fn test_timers_tick_before_execution() -> Result<()> {
        // LD V0, 0x05; LD DT, V0; LD V1, DT; JP 0x206
        let mut chip8 = interpreter(&[0x60, 0x05, 0xF0, 0x15, 0xF1, 0x07, 0x12, 0x06]);
        let start = Instant::now();
        chip8.advance_at(start)?;
        chip8.advance_at(start)?;
        assert_eq!(chip8.delay_timer(), 5);

        chip8.advance_at(start + TICK_INTERVAL * 3)?;
        assert_eq!(chip8.delay_timer(), 4);
        assert_eq!(chip8.registers().read(Register::V1), 4);
        Ok(())
    }

    #[test]
    fn test_fetch_past_end_of_memory() -> Result<()> {
        // LD V0, 0xFF; JP V0, 0xF01
        let mut chip8 = interpreter(&[0x60, 0xFF, 0xBF, 0x01]);
        chip8.advance()?;
        chip8.advance()?;
        assert_eq!(chip8.pc(), 0x1000);
        assert_eq!(chip8.advance(), Err(Error::OutOfBounds { pc: 0x1000 }));
        Ok(())
    }

    #[test]
    fn test_peek_does_not_advance() -> Result<()> {
        let chip8 = interpreter(&[0xA2, 0xF0]);
        assert_eq!(chip8.peek_instruction()?, Instruction::SetIndex(0x2F0));
        assert_eq!(chip8.pc(), 0x200);
        Ok(())
    }

    #[test]
    fn test_unknown_instruction_keeps_pc_past_it() {
        let mut chip8 = interpreter(&[0xFF, 0xFF]);
        assert_eq!(chip8.advance(), Err(Error::UnknownInstruction { raw: 0xFFFF }));
        assert_eq!(chip8.pc(), 0x202);
    }
}
