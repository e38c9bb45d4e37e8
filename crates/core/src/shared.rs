//! A thread-safe handle to one engine.
//!
//! The engine's invariants span both registries and the phase, so the whole
//! engine sits behind a single lock: every command is linearized through it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::Result;
use crate::{Command, Engine, EventSink, Phase, Principal, Receipt, Snapshot};

#[derive(Clone, Debug)]
pub struct SharedEngine {
    inner: Arc<Mutex<Engine>>,
}

impl SharedEngine {
    pub fn new(engine: Engine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    /// Execute a command while holding the engine exclusively.
    pub fn execute(&self, caller: &Principal, command: Command) -> Result<Receipt> {
        self.lock().execute(caller, command)
    }

    pub fn phase(&self) -> Phase {
        self.lock().get_phase()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.lock().snapshot()
    }

    pub fn subscribe(&self, sink: impl EventSink + 'static) {
        self.lock().subscribe(sink);
    }

    /// Run a read-only closure against the engine.
    pub fn with<R>(&self, f: impl FnOnce(&Engine) -> R) -> R {
        f(&self.lock())
    }

    // Mutations never leave the engine half-applied, so a poisoned lock still
    // guards a consistent engine.
    fn lock(&self) -> MutexGuard<'_, Engine> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl From<Engine> for SharedEngine {
    fn from(engine: Engine) -> Self {
        Self::new(engine)
    }
}
