use std::path::PathBuf;

use anyhow::bail;
use clap::Parser;

use chip8vm::DEFAULT_INSTRUCTIONS_PER_SECOND;

pub const DEFAULT_FRAME_RATE: u64 = 60;

/// Run a CHIP-8 ROM in the terminal.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
    /// Path to the ROM image
    pub rom: PathBuf,

    /// Instructions executed per second
    #[arg(long, default_value_t = DEFAULT_INSTRUCTIONS_PER_SECOND)]
    pub ips: u64,

    /// Screen refreshes per second
    #[arg(long, default_value_t = DEFAULT_FRAME_RATE)]
    pub frame_rate: u64,

    /// Seed for the random number instruction
    #[arg(long)]
    pub seed: Option<u64>,
}

pub struct Settings {
    pub frame_rate: u64,
    pub ips: u64,
    pub rom: PathBuf,
    pub seed: Option<u64>,
}
impl Settings {
    pub fn from_args(args: Args) -> anyhow::Result<Self> {
        if args.frame_rate == 0 {
            bail!("Frame rate must be greater than zero");
        }
        if args.ips < args.frame_rate {
            bail!(
                "Instructions per second ({}) must be at least the frame rate ({})",
                args.ips,
                args.frame_rate
            );
        }
        Ok(Settings {
            frame_rate: args.frame_rate,
            ips: args.ips,
            rom: args.rom,
            seed: args.seed,
        })
    }

    pub fn instructions_per_frame(&self) -> u64 {
        self.ips / self.frame_rate
    }

    pub fn rom_name(&self) -> String {
        self.rom
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Unknown ROM".to_string())
    }
}
