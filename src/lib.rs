//! A CHIP-8 virtual machine.
//!
//! [`Interpreter`] owns the memory, registers, call stack, timers, display and
//! keypad snapshot of one running program. Hosts feed it a ROM, call
//! [`Interpreter::advance`] once per cycle and render [`Interpreter::display`].

pub mod display;
pub mod error;
pub mod instruction;
pub mod interpreter;
pub mod keypad;
pub mod memory;
pub mod state;
pub mod timer;

pub use display::{Display, DISPLAY_HEIGHT, DISPLAY_WIDTH};
pub use error::{Error, Result};
pub use instruction::Instruction;
pub use interpreter::{Interpreter, DEFAULT_INSTRUCTIONS_PER_SECOND};
