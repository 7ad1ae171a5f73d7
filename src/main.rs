mod emulator;
mod settings;
mod sound;

use clap::Parser;

use crate::emulator::Emulator;
use crate::settings::{Args, Settings};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let settings = Settings::from_args(Args::parse())?;
    let mut emulator = Emulator::new(settings)?;

    emulator.run()?;

    Ok(())
}
