use crate::memory::Address;

pub type Result<T> = std::result::Result<T, Error>;

/// Fatal conditions raised while loading or running a program.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("ROM is empty")]
    EmptyProgram,

    #[error("ROM is too large ({size} bytes), max size is {max} bytes")]
    ProgramTooLarge { size: usize, max: usize },

    #[error("Program counter out of bounds: {pc:#05X}")]
    OutOfBounds { pc: Address },

    #[error("Unknown instruction: {raw:#06X}")]
    UnknownInstruction { raw: u16 },

    #[error("Call stack overflow at {pc:#05X}")]
    StackOverflow { pc: Address },
}
