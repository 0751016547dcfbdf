use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use log::{info, warn};

use chip8_core::constants::PROGRAM_ORIGIN;
use chip8_core::{disassemble, Config, Halt, Interpreter, Runner};
use display::TerminalFrontend;

/// How often the host checks on the engine thread
const POLL_INTERVAL: Duration = Duration::from_millis(5);

pub struct Options {
    pub rom: PathBuf,
    pub config: Config,
    /// Keypad keys handed out, in order, to the program's key waits
    pub keys: Vec<u8>,
    pub render_delay: Duration,
    pub live: bool,
    pub timeout: Option<Duration>,
}

fn read_rom(rom: &Path) -> Result<Vec<u8>> {
    let file = File::open(rom).with_context(|| format!("unable to open {}", rom.display()))?;
    let mut program = Vec::new();
    BufReader::new(file)
        .read_to_end(&mut program)
        .with_context(|| format!("unable to read {}", rom.display()))?;
    Ok(program)
}

/// Prints a listing of the ROM as it would sit in memory
pub fn list(rom: PathBuf, config: Config) -> Result<()> {
    let program = read_rom(&rom)?;
    let mut interpreter = Interpreter::new(config);
    interpreter.load_program(&program)?;

    let start = PROGRAM_ORIGIN as usize;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in disassemble(&interpreter.state().memory, start, start + program.len()) {
        writeln!(out, "{}", line)?;
    }
    Ok(())
}

/// Runs the ROM to completion on a worker thread and prints the final screen.
///
/// The host stops the engine if it waits for a key once the scripted keys have
/// run out, or when the timeout passes.
///
/// Returns the program's exit code, if it exited via ASSERT.
pub fn run(options: Options) -> Result<Option<u16>> {
    let program = read_rom(&options.rom)?;
    info!("loaded {} ({} bytes)", options.rom.display(), program.len());

    let mut frontend = TerminalFrontend::new().with_render_delay(options.render_delay);
    if options.live {
        frontend = frontend.with_live_output(io::stdout());
    }
    frontend.controls().queue(options.keys);
    let frontend = Arc::new(frontend);

    let mut runner = Runner::new(Interpreter::new(options.config), Arc::clone(&frontend));
    runner.start(Some(program), true)?;

    let started = Instant::now();
    let halt = loop {
        if !runner.is_running() {
            break runner.wait();
        }
        if frontend.controls().is_waiting() {
            warn!("program is waiting for a key and no scripted keys are left; stopping");
            break runner.stop();
        }
        if options.timeout.map_or(false, |timeout| started.elapsed() > timeout) {
            warn!("program is still running after {:?}; stopping", started.elapsed());
            break runner.stop();
        }
        thread::sleep(POLL_INTERVAL);
    };

    if !options.live {
        frontend.render_to(io::stdout().lock())?;
    }

    let halt = halt.with_context(|| format!("program halted at {:#05X}", frontend.debugging_line()))?;
    match halt {
        Halt::Exit(code) => println!("exited with code {}", code),
        Halt::SelfJump(address) => println!("halted on a jump to itself at {:#05X}", address),
        Halt::External => println!("stopped at {:#05X}", frontend.debugging_line()),
    }
    if frontend.beeps() > 0 {
        info!("sound timer ran for {} ticks", frontend.beeps());
    }

    Ok(runner.interpreter().and_then(Interpreter::exit_code))
}
