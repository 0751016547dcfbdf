use std::io::Read;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use log::{debug, error, info, trace};

use crate::config::Config;
use crate::constants::TIMER_INTERVAL;
use crate::decoder::decode;
use crate::error::{Error, Result};
use crate::frontend::Frontend;
use crate::instruction::Mnemonic;
use crate::operations::{self, Context, Flow, Halt};
use crate::state::State;

/// Where the engine is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Freshly reset or rewound; the next step starts the run
    Ready,
    Running,
    /// Stopped cleanly; only `reset` or `rewind` leave this state
    Halted(Halt),
    /// Stopped on a fatal error; only `reset` or `rewind` leave this state
    Failed,
}

/// A copy of the machine state other threads can read while the engine runs
///
/// Refreshed when a run starts, before every draw and key wait, and when the
/// engine halts or fails. Between those points it lags behind the engine.
pub type SharedState = Arc<Mutex<State>>;

/// # Interpreter
/// Fetches, decodes and executes Chip-8 instructions against a `State`,
/// talking to the outside world through a `Frontend`.
///
/// Supplies interfaces for:
/// - loading programs at the origin
/// - resetting the machine, or rewinding it to the origin with memory intact
/// - single steps, or running until a halt
/// - advancing the timers, for hosts that keep their own 60Hz clock
pub struct Interpreter {
    state: State,
    config: Config,
    status: EngineState,
    exit_code: Option<u16>,
    last_tick: Instant,
    published: Option<SharedState>,
}

impl Interpreter {
    pub fn new(config: Config) -> Self {
        Interpreter {
            state: State::new(&config),
            config,
            status: EngineState::Ready,
            exit_code: None,
            last_tick: Instant::now(),
            published: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut State {
        &mut self.state
    }

    pub fn status(&self) -> EngineState {
        self.status
    }

    /// The value of I when the program last executed ASSERT
    pub fn exit_code(&self) -> Option<u16> {
        self.exit_code
    }

    /// Starts copying the machine state into `shared` at the points described
    /// on `SharedState`
    pub fn publish_to(&mut self, shared: SharedState) {
        self.published = Some(shared);
        self.publish();
    }

    fn publish(&self) {
        if let Some(shared) = &self.published {
            *shared.lock().unwrap_or_else(PoisonError::into_inner) = self.state.clone();
        }
    }

    /// Copies a raw program image to the origin
    pub fn load_program(&mut self, program: &[u8]) -> Result<()> {
        self.state.load(program)?;
        debug!("loaded {} byte program", program.len());
        Ok(())
    }

    /// Load a rom from a source file
    ///
    /// # Arguments
    /// * `reader` a file reader that contains a ROM
    pub fn load_rom(&mut self, reader: &mut dyn Read) -> Result<()> {
        let mut program = Vec::new();
        reader.read_to_end(&mut program)?;
        self.load_program(&program)
    }

    /// Zeroes registers, timers, stack and memory, rewrites the font and
    /// clears the display
    pub fn reset(&mut self, frontend: &dyn Frontend) {
        self.state = State::new(&self.config);
        self.status = EngineState::Ready;
        self.exit_code = None;
        frontend.clear_screen();
        debug!("machine reset");
    }

    /// Points the program counter back at the origin; everything else persists
    pub fn rewind(&mut self) {
        self.state.rewind();
        self.status = EngineState::Ready;
        self.exit_code = None;
        debug!("rewound to {:#05X}", self.state.pc);
    }

    /// Resets (or rewinds), optionally loads a program over the origin, then
    /// runs until the engine halts
    pub fn start(&mut self, frontend: &dyn Frontend, program: Option<&[u8]>, reset: bool) -> Result<Halt> {
        if reset {
            self.reset(frontend);
        } else {
            self.rewind();
        }
        if let Some(program) = program {
            self.load_program(program)?;
        }
        self.run(frontend)
    }

    pub fn run(&mut self, frontend: &dyn Frontend) -> Result<Halt> {
        loop {
            if let Some(halt) = self.step(frontend)? {
                return Ok(halt);
            }
        }
    }

    /// Runs one iteration of the main loop:
    /// - stops if the frontend says so
    /// - ticks the timers when a 60th of a second has passed
    /// - fetches, decodes and executes the instruction at the pc
    ///
    /// Returns the reason for halting, if this step halted the engine.
    pub fn step(&mut self, frontend: &dyn Frontend) -> Result<Option<Halt>> {
        match self.status {
            EngineState::Halted(_) | EngineState::Failed => return Err(Error::Halted),
            EngineState::Ready => {
                info!("starting emulation at {:#05X}", self.state.pc);
                self.status = EngineState::Running;
                self.last_tick = Instant::now();
                self.publish();
            }
            EngineState::Running => {}
        }

        if !frontend.do_continue() {
            return Ok(Some(self.halt(Halt::External)));
        }

        if !frontend.has_timer_updater() && self.last_tick.elapsed() > TIMER_INTERVAL {
            self.advance_timers(frontend);
            self.last_tick = Instant::now();
        }

        let address = self.state.pc;
        let opcode = match self.state.word(address as usize) {
            Some(opcode) => opcode,
            None => {
                let memory = self.state.memory.len();
                return Err(self.fail(Error::OutOfBounds {
                    address: (address as usize).max(memory),
                    pc: address,
                }));
            }
        };
        let decoded = decode(opcode);

        frontend.set_debugging_line(address);
        self.state.pc = address.wrapping_add(2);

        let decoded = match decoded {
            Some(decoded) => decoded,
            None => return Err(self.fail(Error::Decode { opcode, pc: address })),
        };
        trace!("{:#05X}  {:04X}  {}", address, opcode, decoded);
        if matches!(decoded.mnemonic(), Mnemonic::Drw | Mnemonic::Ldkp) {
            self.publish();
        }

        let mut ctx = Context {
            state: &mut self.state,
            frontend,
            config: &self.config,
            op: decoded,
            address,
        };
        match operations::from_mnemonic(decoded.mnemonic())(&mut ctx) {
            Ok(Flow::Next) => Ok(None),
            Ok(Flow::Halt(halt)) => Ok(Some(self.halt(halt))),
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Decrements the delay and sound timers towards 0, beeping while the
    /// sound timer is running
    pub fn advance_timers(&mut self, frontend: &dyn Frontend) {
        if self.state.delay_timer > 0 {
            self.state.delay_timer -= 1;
        }

        if self.state.sound_timer > 0 {
            frontend.beep();
            self.state.sound_timer -= 1;
        }
    }

    fn halt(&mut self, halt: Halt) -> Halt {
        self.status = EngineState::Halted(halt);
        self.publish();
        match halt {
            Halt::Exit(code) => {
                self.exit_code = Some(code);
                info!("program exited with code {}", code);
            }
            Halt::SelfJump(address) => info!("halted on self jump at {:#05X}", address),
            Halt::External => info!("stopped by host"),
        }
        halt
    }

    fn fail(&mut self, e: Error) -> Error {
        self.status = EngineState::Failed;
        self.publish();
        error!("{}", e);
        e
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::STACK_DEPTH;
    use crate::frontend::NullFrontend;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    const ASSERT_LD: [u8; 4] = [0xA0, 0x01, 0xF9, 0x99];

    fn interpreter() -> Interpreter {
        Interpreter::new(Config::default().with_seed(7))
    }

    fn run(program: &[u8]) -> (Interpreter, Result<Halt>) {
        let frontend = NullFrontend::with_timer_updater();
        let mut interpreter = interpreter();
        let result = interpreter.start(&frontend, Some(program), true);
        (interpreter, result)
    }

    /// Runs `program` followed by `LD I, 1; ASSERT` and checks it exits cleanly
    fn run_to_exit(program: &[u8]) -> Interpreter {
        let mut image = program.to_vec();
        image.extend_from_slice(&ASSERT_LD);
        let (interpreter, result) = run(&image);
        assert_eq!(result.unwrap(), Halt::Exit(1));
        interpreter
    }

    #[test]
    fn test_assert_exits_with_index() {
        let interpreter = run_to_exit(&[]);
        assert_eq!(interpreter.exit_code(), Some(1));
        assert_eq!(interpreter.status(), EngineState::Halted(Halt::Exit(1)));
        assert_eq!(interpreter.state().pc, 0x204);
    }

    #[test]
    fn test_jp_skips_over_code() {
        // JP 0x204; garbage; ASSERT
        run_to_exit(&[0x12, 0x04, 0xFF, 0xFF]);
    }

    #[test]
    fn test_call_and_ret() {
        // CALL 0x206; LD I,1; ASSERT; RET
        let (interpreter, result) = run(&[0x22, 0x06, 0xA0, 0x01, 0xF9, 0x99, 0x00, 0xEE]);
        assert_eq!(result.unwrap(), Halt::Exit(1));
        assert!(interpreter.state().stack.is_empty());
    }

    #[test]
    fn test_recursive_call_fails_once_the_stack_is_full() {
        // CALL 0x200, forever
        let (interpreter, result) = run(&[0x22, 0x00]);
        match result {
            Err(Error::StackOverflow { opcode, pc }) => {
                assert_eq!(opcode, 0x2200);
                assert_eq!(pc, 0x200);
            }
            other => panic!("expected StackOverflow, got {:?}", other),
        }
        assert_eq!(interpreter.status(), EngineState::Failed);
        assert_eq!(interpreter.state().stack.len(), STACK_DEPTH);
    }

    #[test]
    fn test_ldb() {
        let interpreter = run_to_exit(&[0x63, 0x2A]);
        assert_eq!(interpreter.state().v[0x3], 0x2A);
    }

    #[test]
    fn test_sevb_skip_and_no_skip() {
        // V1 = 5; SE V1,5 skips the JP to a bad address
        run_to_exit(&[0x61, 0x05, 0x31, 0x05, 0x1F, 0xFE]);
        // SE V1,6 falls through to LDB V2
        let interpreter = run_to_exit(&[0x61, 0x05, 0x31, 0x06, 0x62, 0x01]);
        assert_eq!(interpreter.state().v[0x2], 0x01);
    }

    #[test]
    fn test_sneb_skip_and_no_skip() {
        run_to_exit(&[0x61, 0x05, 0x41, 0x06, 0x1F, 0xFE]);
        let interpreter = run_to_exit(&[0x61, 0x05, 0x41, 0x05, 0x62, 0x01]);
        assert_eq!(interpreter.state().v[0x2], 0x01);
    }

    #[test]
    fn test_sevv_skip_and_no_skip() {
        run_to_exit(&[0x61, 0x05, 0x62, 0x05, 0x51, 0x20, 0x1F, 0xFE]);
        let interpreter = run_to_exit(&[0x61, 0x05, 0x51, 0x20, 0x63, 0x01]);
        assert_eq!(interpreter.state().v[0x3], 0x01);
    }

    #[test]
    fn test_addb_and_overflow() {
        let interpreter = run_to_exit(&[0x61, 0x05, 0x71, 0x03, 0x62, 0xFF, 0x72, 0x02]);
        assert_eq!(interpreter.state().v[0x1], 0x08);
        assert_eq!(interpreter.state().v[0x2], 0x01);
        assert_eq!(interpreter.state().v[0xF], 0x00);
    }

    #[test]
    fn test_bitwise_ops() {
        // V1 = 0b1100, V2 = 0b1010; V3 = V1|V2, V4 = V1&V2, V5 = V1^V2
        let interpreter = run_to_exit(&[
            0x61, 0x0C, 0x62, 0x0A, //
            0x83, 0x10, 0x83, 0x21, //
            0x84, 0x10, 0x84, 0x22, //
            0x85, 0x10, 0x85, 0x23,
        ]);
        assert_eq!(interpreter.state().v[0x3], 0x0E);
        assert_eq!(interpreter.state().v[0x4], 0x08);
        assert_eq!(interpreter.state().v[0x5], 0x06);
    }

    #[test]
    fn test_addv_and_overflow() {
        let interpreter = run_to_exit(&[0x61, 0xFF, 0x62, 0x07, 0x81, 0x24]);
        assert_eq!(interpreter.state().v[0x1], 0x06);
        assert_eq!(interpreter.state().v[0xF], 0x01);
    }

    #[test]
    fn test_sub_and_borrow() {
        let interpreter = run_to_exit(&[0x61, 0x07, 0x62, 0x64, 0x81, 0x25]);
        assert_eq!(interpreter.state().v[0x1], 0xA3);
        assert_eq!(interpreter.state().v[0xF], 0x00);
    }

    #[test]
    fn test_self_jump_halts() {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let (interpreter, result) = run(&[0x60, 0x01, 0x12, 0x02]);
            tx.send((interpreter.status(), result.ok())).unwrap();
        });
        let (status, halt) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(halt, Some(Halt::SelfJump(0x202)));
        assert_eq!(status, EngineState::Halted(Halt::SelfJump(0x202)));
    }

    #[test]
    fn test_unknown_opcode_fails() {
        let (mut interpreter, result) = run(&[0xFF, 0xFF]);
        match result {
            Err(Error::Decode { opcode, pc }) => {
                assert_eq!(opcode, 0xFFFF);
                assert_eq!(pc, 0x200);
            }
            other => panic!("expected Decode, got {:?}", other),
        }
        assert_eq!(interpreter.status(), EngineState::Failed);

        let frontend = NullFrontend::with_timer_updater();
        assert!(matches!(interpreter.step(&frontend), Err(Error::Halted)));
    }

    #[test]
    fn test_running_into_blank_memory_fails() {
        let (_, result) = run(&[0x60, 0x01]);
        match result {
            Err(Error::Decode { opcode, pc }) => {
                assert_eq!(opcode, 0x0000);
                assert_eq!(pc, 0x202);
            }
            other => panic!("expected Decode, got {:?}", other),
        }
    }

    #[test]
    fn test_running_off_the_end_of_memory_fails() {
        let mut interpreter = interpreter();
        let frontend = NullFrontend::with_timer_updater();
        interpreter.state_mut().pc = 0x0FFF;
        match interpreter.run(&frontend) {
            Err(Error::OutOfBounds { address, pc }) => {
                assert_eq!(address, 0x1000);
                assert_eq!(pc, 0x0FFF);
            }
            other => panic!("expected OutOfBounds, got {:?}", other),
        }
    }

    #[test]
    fn test_request_stop_halts_before_fetch() {
        let frontend = NullFrontend::with_timer_updater();
        frontend.request_stop();
        let mut interpreter = interpreter();
        let result = interpreter.start(&frontend, Some(&ASSERT_LD), true);
        assert_eq!(result.unwrap(), Halt::External);
        assert_eq!(interpreter.state().pc, 0x200);
        assert_eq!(interpreter.exit_code(), None);
    }

    #[test]
    fn test_step_sets_debugging_line_before_advancing() {
        let frontend = NullFrontend::with_timer_updater();
        let mut interpreter = interpreter();
        interpreter.load_program(&[0x60, 0x01, 0x61, 0x02]).unwrap();

        assert_eq!(interpreter.step(&frontend).unwrap(), None);
        assert_eq!(frontend.debugging_line(), 0x200);
        assert_eq!(interpreter.status(), EngineState::Running);

        interpreter.step(&frontend).unwrap();
        assert_eq!(frontend.debugging_line(), 0x202);
        assert_eq!(interpreter.state().pc, 0x204);
    }

    #[test]
    fn test_key_wait_blocks_until_press() {
        let frontend = Arc::new(NullFrontend::with_timer_updater());
        let (tx, rx) = mpsc::channel();

        let engine_frontend = Arc::clone(&frontend);
        thread::spawn(move || {
            let mut interpreter = interpreter();
            // LDKP V3; LD I,1; ASSERT
            let program = [0xF3, 0x0A, 0xA0, 0x01, 0xF9, 0x99];
            let result = interpreter.start(&*engine_frontend, Some(&program), true);
            tx.send((interpreter.state().v[0x3], result.ok())).unwrap();
        });

        let deadline = Instant::now() + Duration::from_secs(5);
        while !frontend.controls().is_waiting() {
            assert!(Instant::now() < deadline, "engine never waited for a key");
            thread::sleep(Duration::from_millis(1));
        }
        assert!(rx.try_recv().is_err());

        frontend.controls().press(0xC);
        let (v3, halt) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(v3, 0xC);
        assert_eq!(halt, Some(Halt::Exit(1)));
    }

    #[test]
    fn test_stop_unblocks_key_wait() {
        let frontend = Arc::new(NullFrontend::with_timer_updater());
        let (tx, rx) = mpsc::channel();

        let engine_frontend = Arc::clone(&frontend);
        thread::spawn(move || {
            let mut interpreter = interpreter();
            let program = [0xF3, 0x0A, 0xA0, 0x01, 0xF9, 0x99];
            let result = interpreter.start(&*engine_frontend, Some(&program), true);
            tx.send(result.ok()).unwrap();
        });

        let deadline = Instant::now() + Duration::from_secs(5);
        while !frontend.controls().is_waiting() {
            assert!(Instant::now() < deadline, "engine never waited for a key");
            thread::sleep(Duration::from_millis(1));
        }

        frontend.request_stop();
        let halt = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(halt, Some(Halt::External));
    }

    #[test]
    fn test_queued_keys_answer_key_waits() {
        let frontend = NullFrontend::with_timer_updater();
        frontend.controls().queue(vec![0x4, 0x9]);
        let mut interpreter = interpreter();
        // LDKP V1; LDKP V2; LD I,1; ASSERT
        let program = [0xF1, 0x0A, 0xF2, 0x0A, 0xA0, 0x01, 0xF9, 0x99];
        assert_eq!(interpreter.start(&frontend, Some(&program), true).unwrap(), Halt::Exit(1));
        assert_eq!(interpreter.state().v[0x1], 0x4);
        assert_eq!(interpreter.state().v[0x2], 0x9);
    }

    #[test]
    fn test_advance_timers_beeps_while_sound_timer_runs() {
        let frontend = NullFrontend::with_timer_updater();
        let mut interpreter = interpreter();
        interpreter.state_mut().delay_timer = 1;
        interpreter.state_mut().sound_timer = 2;

        interpreter.advance_timers(&frontend);
        assert_eq!(interpreter.state().delay_timer, 0);
        assert_eq!(interpreter.state().sound_timer, 1);
        assert_eq!(frontend.beeps(), 1);

        interpreter.advance_timers(&frontend);
        interpreter.advance_timers(&frontend);
        assert_eq!(interpreter.state().delay_timer, 0);
        assert_eq!(interpreter.state().sound_timer, 0);
        assert_eq!(frontend.beeps(), 2);
    }

    #[test]
    fn test_timer_updater_keeps_engine_off_the_timers() {
        let frontend = NullFrontend::with_timer_updater();
        let mut interpreter = interpreter();
        // DT = V1 (0x30), then spin on a few instructions
        interpreter.load_program(&[0x61, 0x30, 0xF1, 0x15, 0x60, 0x00]).unwrap();
        interpreter.step(&frontend).unwrap();
        interpreter.step(&frontend).unwrap();
        thread::sleep(TIMER_INTERVAL * 3);
        interpreter.step(&frontend).unwrap();
        assert_eq!(interpreter.state().delay_timer, 0x30);
    }

    #[test]
    fn test_engine_ticks_timers_without_timer_updater() {
        let frontend = NullFrontend::new();
        let mut interpreter = interpreter();
        interpreter.load_program(&[0x61, 0x30, 0xF1, 0x15, 0x60, 0x00]).unwrap();
        interpreter.step(&frontend).unwrap();
        interpreter.step(&frontend).unwrap();
        thread::sleep(TIMER_INTERVAL * 2);
        interpreter.step(&frontend).unwrap();
        assert_eq!(interpreter.state().delay_timer, 0x2F);
    }

    #[test]
    fn test_reset_clears_memory_and_screen() {
        let frontend = NullFrontend::with_timer_updater();
        frontend.post_draw_request(&crate::draw::DrawRequest::from_sprite(0, 0, &[0x80]));
        let mut interpreter = interpreter();
        interpreter.load_program(&ASSERT_LD).unwrap();
        interpreter.state_mut().v[0x5] = 0x55;

        interpreter.reset(&frontend);
        assert_eq!(interpreter.state().v[0x5], 0x0);
        assert_eq!(interpreter.state().word(0x200), Some(0x0000));
        assert!(!frontend.frame().pixel(0, 0));
        assert_eq!(interpreter.status(), EngineState::Ready);
    }

    #[test]
    fn test_start_without_reset_reruns_loaded_program() {
        let frontend = NullFrontend::with_timer_updater();
        let mut interpreter = interpreter();
        // V1 += 1; LD I,1; ASSERT
        let program = [0x71, 0x01, 0xA0, 0x01, 0xF9, 0x99];
        assert_eq!(interpreter.start(&frontend, Some(&program), true).unwrap(), Halt::Exit(1));
        assert!(matches!(interpreter.step(&frontend), Err(Error::Halted)));

        assert_eq!(interpreter.start(&frontend, None, false).unwrap(), Halt::Exit(1));
        assert_eq!(interpreter.state().v[0x1], 0x2);

        assert!(matches!(
            interpreter.start(&frontend, None, true),
            Err(Error::Decode { opcode: 0x0000, pc: 0x200 })
        ));
    }

    #[test]
    fn test_shared_state_follows_draws_and_halts() {
        let frontend = NullFrontend::with_timer_updater();
        let mut interpreter = interpreter();
        let shared: SharedState = Arc::new(Mutex::new(State::new(&Config::default())));
        interpreter.publish_to(Arc::clone(&shared));
        // V5 = 0x42; DRW V0,V0,0; V5 = 0x43; LD I,1; ASSERT
        let program = [0x65, 0x42, 0xD0, 0x00, 0x65, 0x43, 0xA0, 0x01, 0xF9, 0x99];
        interpreter.load_program(&program).unwrap();

        for _ in 0..2 {
            interpreter.step(&frontend).unwrap();
        }
        {
            let published = shared.lock().unwrap();
            assert_eq!(published.v[0x5], 0x42);
            assert_eq!(published.pc, 0x204);
        }

        interpreter.step(&frontend).unwrap();
        assert_eq!(shared.lock().unwrap().v[0x5], 0x42);

        assert_eq!(interpreter.run(&frontend).unwrap(), Halt::Exit(1));
        assert_eq!(shared.lock().unwrap().v[0x5], 0x43);
        assert_eq!(shared.lock().unwrap().i, 0x1);
    }

    #[test]
    fn test_load_rom_from_reader() {
        let mut interpreter = interpreter();
        let mut rom: &[u8] = &ASSERT_LD;
        interpreter.load_rom(&mut rom).unwrap();
        assert_eq!(interpreter.state().word(0x200), Some(0xA001));
        assert_eq!(interpreter.state().word(0x202), Some(0xF999));
    }

    #[test]
    fn test_load_rom_rejects_oversized_rom() {
        let mut interpreter = Interpreter::new(Config::default().with_memory_size(0x204));
        let mut rom: &[u8] = &[0x00; 5];
        assert!(matches!(
            interpreter.load_rom(&mut rom),
            Err(Error::ProgramTooLarge { size: 5, max: 4 })
        ));
    }
}
