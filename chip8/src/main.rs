use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{ArgAction, Parser, ValueEnum};
use log::LevelFilter;
use simple_logger::SimpleLogger;

use chip8_core::constants::MEMORY_SIZE;
use chip8_core::{Config, IndexQuirk};

mod keymap;
mod run;

/// What LDMW/LDMR leave in I
#[derive(Clone, Copy, Debug, ValueEnum)]
enum Quirk {
    /// I += x
    AddX,
    /// I += x + 1
    AddXPlusOne,
    /// I is left alone
    Unchanged,
}

impl From<Quirk> for IndexQuirk {
    fn from(quirk: Quirk) -> Self {
        match quirk {
            Quirk::AddX => IndexQuirk::AddX,
            Quirk::AddXPlusOne => IndexQuirk::AddXPlusOne,
            Quirk::Unchanged => IndexQuirk::Unchanged,
        }
    }
}

#[derive(Parser, Debug)]
#[command(version, about = "Runs a Chip-8 ROM without a window", long_about = None)]
struct Args {
    #[arg(help = "Path to the ROM file to run")]
    rom: PathBuf,

    #[arg(short, long, help = "Seed for the random number generator")]
    seed: Option<u64>,

    #[arg(long, value_enum, default_value_t = Quirk::AddX, help = "Index register behaviour after LDMW/LDMR")]
    quirk: Quirk,

    #[arg(long, default_value_t = MEMORY_SIZE, help = "Size of memory in bytes")]
    memory_size: usize,

    #[arg(short, long, default_value = "", help = "Keys to answer key waits with, typed on the QWERTY keymap")]
    keys: String,

    #[arg(long, default_value_t = 0, help = "Milliseconds to pause after every draw")]
    render_delay: u64,

    #[arg(long, help = "Redraw the screen after every draw")]
    live: bool,

    #[arg(short, long, help = "Seconds to run before stopping the program")]
    timeout: Option<u64>,

    #[arg(short, long, help = "List the program instead of running it")]
    disassemble: bool,

    #[arg(short, long, action = ArgAction::Count, help = "More logging; repeat for more")]
    verbose: u8,
}

fn level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Maps an ASSERT code (a 12-bit I) onto a process exit status.
/// Only the low 8 bits of a status survive, so anything above 255 reports 255
/// rather than wrapping round to a successful 0.
fn exit_status(code: u16) -> i32 {
    i32::from(code.min(255))
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    SimpleLogger::new().with_level(level(args.verbose)).init()?;

    let mut config = Config::default()
        .with_memory_size(args.memory_size)
        .with_index_quirk(args.quirk.into());
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }

    if args.disassemble {
        return run::list(args.rom, config);
    }

    let options = run::Options {
        rom: args.rom,
        config,
        keys: keymap::parse_keys(&args.keys)?,
        render_delay: Duration::from_millis(args.render_delay),
        live: args.live,
        timeout: args.timeout.map(Duration::from_secs),
    };
    match run::run(options)? {
        Some(code) if code != 0 => process::exit(exit_status(code)),
        _ => Ok(()),
    }
}
