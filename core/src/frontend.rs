use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{debug, warn};

use crate::constants::KEY_COUNT;
use crate::draw::{DrawRequest, FrameBuffer};
use crate::keywait::KeyPromise;

/// # Frontend
/// Everything the interpreter needs from the host: somewhere to draw, a keypad,
/// a speaker and a way to be told to stop.
///
/// Implementations are shared between the engine thread and the host thread,
/// so every method takes `&self`. None of the methods have defaults; hosts that
/// don't care about one still say so explicitly (see `NullFrontend`).
pub trait Frontend {
    /// Turns every pixel off
    fn clear_screen(&self);

    /// Best-effort notification that the sound timer is running; must not block
    fn beep(&self);

    /// Advisory: the address of the instruction about to execute
    fn set_debugging_line(&self, address: u16);

    /// XORs a sprite onto the display, wrapping at the edges.
    /// Returns true if any pixel went from set to unset.
    fn post_draw_request(&self, request: &DrawRequest) -> bool;

    fn is_key_pressed(&self, key: u8) -> bool;

    /// Hands over a promise to be fulfilled with the next key pressed.
    /// The engine blocks on it straight after this returns.
    fn post_key_pressed_future(&self, promise: KeyPromise);

    /// True if the host decrements the timers itself (via
    /// `Interpreter::advance_timers`) rather than leaving it to the engine loop
    fn has_timer_updater(&self) -> bool;

    /// Polled once per instruction; false stops the engine
    fn do_continue(&self) -> bool;

    /// Makes `do_continue` return false and force-completes any pending key
    /// promise so the engine thread can be joined
    fn request_stop(&self);

    /// Makes `do_continue` return true again ahead of a new run
    fn request_continue(&self);
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// # Controls
/// The input half of a frontend: keypad state, the continue flag and the key
/// promise the engine is waiting on, if any.
///
/// Frontends embed one and forward the matching trait methods to it.
#[derive(Debug)]
pub struct Controls {
    running: AtomicBool,
    keys: [AtomicBool; KEY_COUNT],
    pending: Mutex<Option<KeyPromise>>,
    queued: Mutex<VecDeque<u8>>,
}

impl Controls {
    pub fn new() -> Self {
        Controls {
            running: AtomicBool::new(true),
            keys: Default::default(),
            pending: Mutex::new(None),
            queued: Mutex::new(VecDeque::new()),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn resume(&self) {
        self.running.store(true, Ordering::SeqCst);
    }

    /// Clears the continue flag, then unblocks a waiting engine with the sentinel key
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(promise) = lock(&self.pending).take() {
            if promise.force() {
                warn!("forced completion of a pending key wait");
            }
        }
    }

    /// Marks `key` as held and delivers it to a waiting engine
    pub fn press(&self, key: u8) {
        let key = key & 0xF;
        self.keys[key as usize].store(true, Ordering::SeqCst);
        if let Some(promise) = lock(&self.pending).take() {
            promise.fulfil(key);
        }
    }

    pub fn release(&self, key: u8) {
        self.keys[(key & 0xF) as usize].store(false, Ordering::SeqCst);
    }

    pub fn is_pressed(&self, key: u8) -> bool {
        self.keys[(key & 0xF) as usize].load(Ordering::SeqCst)
    }

    /// Lines up presses to answer future key waits, in order
    pub fn queue<I>(&self, keys: I)
    where
        I: IntoIterator<Item = u8>,
    {
        lock(&self.queued).extend(keys.into_iter().map(|key| key & 0xF));
    }

    pub fn is_waiting(&self) -> bool {
        lock(&self.pending)
            .as_ref()
            .map_or(false, KeyPromise::is_pending)
    }

    /// Answers `promise` from the queue, or parks it until the next `press`.
    /// A stopped host completes it straight away.
    pub fn post(&self, promise: KeyPromise) {
        if let Some(key) = lock(&self.queued).pop_front() {
            debug!("answering key wait with queued key {:X}", key);
            promise.fulfil(key);
            return;
        }
        let mut pending = lock(&self.pending);
        if !self.is_running() {
            promise.force();
            return;
        }
        *pending = Some(promise);
    }
}

impl Default for Controls {
    fn default() -> Self {
        Self::new()
    }
}

/// # Null Frontend
/// A headless frontend: draws into an in-memory frame buffer and counts beeps
/// instead of making them. Keys come from its `Controls`.
#[derive(Debug, Default)]
pub struct NullFrontend {
    frame: Mutex<FrameBuffer>,
    controls: Controls,
    beeps: AtomicUsize,
    line: AtomicU16,
    timer_updater: bool,
}

impl NullFrontend {
    /// Leaves the timers to the engine's wall clock
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the timers, so they only move when `advance_timers` is called
    pub fn with_timer_updater() -> Self {
        NullFrontend {
            timer_updater: true,
            ..Self::default()
        }
    }

    pub fn controls(&self) -> &Controls {
        &self.controls
    }

    pub fn frame(&self) -> FrameBuffer {
        lock(&self.frame).clone()
    }

    pub fn beeps(&self) -> usize {
        self.beeps.load(Ordering::SeqCst)
    }

    pub fn debugging_line(&self) -> u16 {
        self.line.load(Ordering::SeqCst)
    }
}

impl Frontend for NullFrontend {
    fn clear_screen(&self) {
        lock(&self.frame).clear();
    }

    fn beep(&self) {
        self.beeps.fetch_add(1, Ordering::SeqCst);
    }

    fn set_debugging_line(&self, address: u16) {
        self.line.store(address, Ordering::SeqCst);
    }

    fn post_draw_request(&self, request: &DrawRequest) -> bool {
        lock(&self.frame).blit(request)
    }

    fn is_key_pressed(&self, key: u8) -> bool {
        self.controls.is_pressed(key)
    }

    fn post_key_pressed_future(&self, promise: KeyPromise) {
        self.controls.post(promise);
    }

    fn has_timer_updater(&self) -> bool {
        self.timer_updater
    }

    fn do_continue(&self) -> bool {
        self.controls.is_running()
    }

    fn request_stop(&self) {
        self.controls.stop();
    }

    fn request_continue(&self) {
        self.controls.resume();
    }
}
