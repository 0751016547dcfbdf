use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use log::{debug, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::frontend::Frontend;
use crate::interpreter::{Interpreter, SharedState};
use crate::operations::Halt;
use crate::state::State;

const WORKER_NAME: &str = "chip8-engine";

type Worker = JoinHandle<(Interpreter, Result<Halt>)>;

/// # Runner
/// Runs an interpreter on a background thread while the host keeps servicing
/// its frontend.
///
/// The worker owns the interpreter for the length of a run and hands it back
/// when joined. While it runs, `snapshot` gives the state as of the last draw,
/// key wait or halt.
pub struct Runner<F: Frontend + Send + Sync + 'static> {
    frontend: Arc<F>,
    config: Config,
    interpreter: Option<Interpreter>,
    worker: Option<Worker>,
    shared: SharedState,
}

impl<F: Frontend + Send + Sync + 'static> Runner<F> {
    pub fn new(mut interpreter: Interpreter, frontend: Arc<F>) -> Self {
        let shared = Arc::new(Mutex::new(interpreter.state().clone()));
        interpreter.publish_to(Arc::clone(&shared));
        Runner {
            frontend,
            config: interpreter.config().clone(),
            interpreter: Some(interpreter),
            worker: None,
            shared,
        }
    }

    /// Replaces a lost interpreter with a fresh one publishing to the same snapshot
    fn fresh_interpreter(&self) -> Interpreter {
        let mut interpreter = Interpreter::new(self.config.clone());
        interpreter.publish_to(Arc::clone(&self.shared));
        interpreter
    }

    pub fn frontend(&self) -> &Arc<F> {
        &self.frontend
    }

    /// The idle interpreter; `None` while a worker holds it
    pub fn interpreter(&self) -> Option<&Interpreter> {
        self.interpreter.as_ref()
    }

    pub fn interpreter_mut(&mut self) -> Option<&mut Interpreter> {
        self.interpreter.as_mut()
    }

    /// The machine state as last published by the interpreter; readable mid-run
    pub fn snapshot(&self) -> State {
        self.shared
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// True while a worker exists and hasn't returned yet
    pub fn is_running(&self) -> bool {
        self.worker.as_ref().map_or(false, |worker| !worker.is_finished())
    }

    /// Starts a run on a new worker thread, re-arming the frontend's continue
    /// flag first. Refuses while a previous worker hasn't been joined.
    pub fn spawn(&mut self, program: Option<Vec<u8>>, reset: bool) -> Result<()> {
        if self.worker.is_some() {
            return Err(Error::ResourceBusy);
        }
        let mut interpreter = self.interpreter.take().ok_or(Error::ResourceBusy)?;
        self.frontend.request_continue();
        let frontend = Arc::clone(&self.frontend);

        let spawned = thread::Builder::new()
            .name(WORKER_NAME.to_string())
            .spawn(move || {
                let result = interpreter.start(&*frontend, program.as_deref(), reset);
                (interpreter, result)
            });

        match spawned {
            Ok(worker) => {
                debug!("spawned {} thread", WORKER_NAME);
                self.worker = Some(worker);
                Ok(())
            }
            Err(e) => {
                self.interpreter = Some(self.fresh_interpreter());
                Err(e.into())
            }
        }
    }

    /// Stops and joins any previous run, then starts a new one
    pub fn start(&mut self, program: Option<Vec<u8>>, reset: bool) -> Result<()> {
        if self.worker.is_some() {
            match self.stop() {
                Ok(halt) => debug!("previous run ended with {:?}", halt),
                Err(e) => warn!("previous run ended with an error: {}", e),
            }
        }
        self.spawn(program, reset)
    }

    /// Asks the worker to stop, unblocking a pending key wait, and joins it.
    /// Returns `Error::Halted` when there's no worker to stop.
    pub fn stop(&mut self) -> Result<Halt> {
        if self.worker.is_none() {
            return Err(Error::Halted);
        }
        info!("stopping {} thread", WORKER_NAME);
        self.frontend.request_stop();
        self.join()
    }

    /// Joins the worker without asking it to stop
    pub fn wait(&mut self) -> Result<Halt> {
        self.join()
    }

    fn join(&mut self) -> Result<Halt> {
        let worker = self.worker.take().ok_or(Error::Halted)?;
        match worker.join() {
            Ok((interpreter, result)) => {
                self.interpreter = Some(interpreter);
                result
            }
            Err(_) => {
                warn!("{} thread panicked; starting over with a fresh machine", WORKER_NAME);
                self.interpreter = Some(self.fresh_interpreter());
                Err(Error::WorkerPanicked)
            }
        }
    }
}

impl<F: Frontend + Send + Sync + 'static> Drop for Runner<F> {
    fn drop(&mut self) {
        if self.worker.is_some() {
            if let Err(e) = self.stop() {
                debug!("worker stopped on drop: {}", e);
            }
        }
    }
}
