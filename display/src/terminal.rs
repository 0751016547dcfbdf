use std::io::{self, Write};
use std::sync::atomic::{AtomicU16, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use log::{trace, warn};

use chip8_core::{Controls, DrawRequest, FrameBuffer, Frontend, KeyPromise};

use crate::display::Display;

type LiveDisplay = Display<Box<dyn Write + Send>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// # Terminal Frontend
/// A headless frontend for running programs without a window.
///
/// Sprites are blitted into an in-memory frame buffer that can be rendered as
/// text at any point, or after every draw when live output is enabled. Key
/// presses come from its `Controls`, usually scripted up front with `queue`.
///
/// The engine ticks the timers itself; beeps are counted.
pub struct TerminalFrontend {
    frame: Mutex<FrameBuffer>,
    controls: Controls,
    live: Option<Mutex<LiveDisplay>>,
    render_delay: Duration,
    beeps: AtomicUsize,
    line: AtomicU16,
}

impl TerminalFrontend {
    pub fn new() -> Self {
        TerminalFrontend {
            frame: Mutex::new(FrameBuffer::new()),
            controls: Controls::new(),
            live: None,
            render_delay: Duration::ZERO,
            beeps: AtomicUsize::new(0),
            line: AtomicU16::new(0),
        }
    }

    /// Pauses the engine for `delay` after every draw so the drawing can be followed
    pub fn with_render_delay(self, delay: Duration) -> Self {
        TerminalFrontend {
            render_delay: delay,
            ..self
        }
    }

    /// Redraws the whole screen to `out` after every draw and clear
    pub fn with_live_output<W: Write + Send + 'static>(self, out: W) -> Self {
        let out: Box<dyn Write + Send> = Box::new(out);
        TerminalFrontend {
            live: Some(Mutex::new(Display::new(out).overwriting())),
            ..self
        }
    }

    pub fn controls(&self) -> &Controls {
        &self.controls
    }

    /// A copy of the screen as it is now
    pub fn frame(&self) -> FrameBuffer {
        lock(&self.frame).clone()
    }

    pub fn beeps(&self) -> usize {
        self.beeps.load(Ordering::SeqCst)
    }

    /// The address of the last instruction the engine fetched
    pub fn debugging_line(&self) -> u16 {
        self.line.load(Ordering::SeqCst)
    }

    /// Writes the current screen to `out` as text
    pub fn render_to<W: Write>(&self, out: W) -> io::Result<()> {
        Display::new(out).render(&self.frame())
    }

    fn refresh(&self, frame: &FrameBuffer) {
        if let Some(live) = &self.live {
            if let Err(e) = lock(live).render(frame) {
                warn!("failed to render frame: {}", e);
            }
        }
    }
}

impl Default for TerminalFrontend {
    fn default() -> Self {
        Self::new()
    }
}

impl Frontend for TerminalFrontend {
    fn clear_screen(&self) {
        let mut frame = lock(&self.frame);
        frame.clear();
        self.refresh(&frame);
    }

    fn beep(&self) {
        trace!("beep");
        self.beeps.fetch_add(1, Ordering::SeqCst);
    }

    fn set_debugging_line(&self, address: u16) {
        self.line.store(address, Ordering::SeqCst);
    }

    fn post_draw_request(&self, request: &DrawRequest) -> bool {
        let collided = {
            let mut frame = lock(&self.frame);
            let collided = frame.blit(request);
            self.refresh(&frame);
            collided
        };
        if !self.render_delay.is_zero() {
            thread::sleep(self.render_delay);
        }
        collided
    }

    fn is_key_pressed(&self, key: u8) -> bool {
        self.controls.is_pressed(key)
    }

    fn post_key_pressed_future(&self, promise: KeyPromise) {
        self.controls.post(promise);
    }

    fn has_timer_updater(&self) -> bool {
        false
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
