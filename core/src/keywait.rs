use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use crate::constants::SENTINEL_KEY;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    /// The engine has taken the key; nothing more can be delivered
    Empty,
    /// The engine is, or is about to be, blocked on this promise
    Pending,
    Fulfilled(u8),
}

#[derive(Debug)]
struct Inner {
    slot: Mutex<Slot>,
    ready: Condvar,
}

/// # Key Promise
/// A single-use handoff of one key press from the host to the engine.
///
/// The engine creates a promise for each LDKP, gives a clone to the frontend and
/// blocks in `wait`. Whichever host thread calls `fulfil` first delivers its key;
/// every later attempt is refused, so two threads can never both fill the slot.
#[derive(Debug, Clone)]
pub struct KeyPromise {
    inner: Arc<Inner>,
}

impl KeyPromise {
    pub fn new() -> Self {
        KeyPromise {
            inner: Arc::new(Inner {
                slot: Mutex::new(Slot::Pending),
                ready: Condvar::new(),
            }),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.inner.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Delivers `key` (masked to 0..=F) to the waiting engine.
    /// Returns false if the promise was already fulfilled.
    pub fn fulfil(&self, key: u8) -> bool {
        let mut slot = self.slot();
        if *slot != Slot::Pending {
            return false;
        }
        *slot = Slot::Fulfilled(key & 0xF);
        self.inner.ready.notify_all();
        true
    }

    /// Completes the promise with the sentinel key so a shutting down engine
    /// can't stay blocked.
    pub fn force(&self) -> bool {
        self.fulfil(SENTINEL_KEY)
    }

    pub fn is_pending(&self) -> bool {
        *self.slot() == Slot::Pending
    }

    /// Blocks until the promise is fulfilled and takes the key.
    /// Only the engine waits, and only once.
    pub fn wait(&self) -> u8 {
        let mut slot = self.slot();
        loop {
            if let Slot::Fulfilled(key) = *slot {
                *slot = Slot::Empty;
                return key;
            }
            slot = self
                .inner
                .ready
                .wait(slot)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

impl Default for KeyPromise {
    fn default() -> Self {
        Self::new()
    }
}
