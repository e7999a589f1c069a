//! Guided traversal over a candidate list.
//!
//! A session owns one worker thread. The worker presents the object at the
//! current index through the shared engine, releases the engine, and then
//! blocks on a condition variable until the owner moves the index or cancels.
//! The owner may freely use the engine (e.g. reclassify the presented object)
//! while the worker is blocked.
//!
//! The owner must not hold the engine lock while calling into the controller,
//! since every call waits for the worker to finish presenting.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use crate::engine::Engine;
use crate::error::{EngineError, Result};
use crate::model::ObjectNumber;

/// Engine shared between the owner thread and a session worker.
pub type SharedEngine = Arc<Mutex<Engine>>;

/// Wrap an engine for use with a [`TraversalController`].
pub fn share(engine: Engine) -> SharedEngine {
    Arc::new(Mutex::new(engine))
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Observable state of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalState {
    Idle,
    Active { index: usize, len: usize },
}

/// State shared between owner and worker, guarded by `Session::state`.
#[derive(Debug)]
struct SessionState {
    list: Vec<ObjectNumber>,
    index: usize,
    /// Bumped on every index change
    generation: u64,
    /// Last generation the worker finished presenting
    presented: Option<u64>,
    /// Presentation failure for the owner to pick up
    failure: Option<EngineError>,
    cancelled: bool,
    finished: bool,
    /// Indices in presentation order
    visited: Vec<usize>,
}

struct Session {
    state: Mutex<SessionState>,
    condvar: Condvar,
}

impl Session {
    fn new(list: Vec<ObjectNumber>) -> Self {
        Self {
            state: Mutex::new(SessionState {
                list,
                index: 0,
                generation: 0,
                presented: None,
                failure: None,
                cancelled: false,
                finished: false,
                visited: Vec::new(),
            }),
            condvar: Condvar::new(),
        }
    }

    /// Block until `generation` has been presented or the worker exited.
    fn wait_presented(&self, generation: u64) -> Result<()> {
        let mut state = lock(&self.state);
        while !state.finished && !state.presented.is_some_and(|p| p >= generation) {
            state = self
                .condvar
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        if let Some(e) = state.failure.take() {
            return Err(e);
        }
        if state.presented.is_some_and(|p| p >= generation) {
            Ok(())
        } else {
            Err(EngineError::WorkerExited)
        }
    }
}

/// Marks the session finished when the worker leaves, including on unwind.
struct FinishGuard<'a>(&'a Session);

impl Drop for FinishGuard<'_> {
    fn drop(&mut self) {
        let mut state = lock(&self.0.state);
        state.finished = true;
        self.0.condvar.notify_all();
    }
}

struct ActiveSession {
    session: Arc<Session>,
    handle: JoinHandle<()>,
}

/// Owner-side handle driving at most one traversal session.
pub struct TraversalController {
    engine: SharedEngine,
    active: Option<ActiveSession>,
    /// Visit order of the last cancelled session
    history: Vec<usize>,
}

impl std::fmt::Debug for TraversalController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraversalController")
            .field("state", &self.state())
            .finish()
    }
}

impl TraversalController {
    pub fn new(engine: SharedEngine) -> Self {
        Self {
            engine,
            active: None,
            history: Vec::new(),
        }
    }

    /// Get the shared engine.
    pub fn engine(&self) -> &SharedEngine {
        &self.engine
    }

    /// Get the current state.
    pub fn state(&self) -> TraversalState {
        match &self.active {
            Some(active) => {
                let state = lock(&active.session.state);
                TraversalState::Active {
                    index: state.index,
                    len: state.list.len(),
                }
            }
            None => TraversalState::Idle,
        }
    }

    /// Object at the current index.
    pub fn current(&self) -> Option<ObjectNumber> {
        let active = self.active.as_ref()?;
        let state = lock(&active.session.state);
        state.list.get(state.index).copied()
    }

    /// Indices presented by the active session, or by the last one if idle.
    pub fn visited(&self) -> Vec<usize> {
        match &self.active {
            Some(active) => lock(&active.session.state).visited.clone(),
            None => self.history.clone(),
        }
    }

    /// Start a session over `list`, cancelling any active one first.
    ///
    /// Returns once the first object has been presented. An empty list
    /// leaves the controller idle.
    pub fn start(&mut self, list: Vec<ObjectNumber>) -> Result<()> {
        if self.active.is_some() {
            self.cancel()?;
        }
        if list.is_empty() {
            log::info!("Traversal not started: empty candidate list");
            return Ok(());
        }

        let len = list.len();
        let session = Arc::new(Session::new(list));
        let handle = thread::Builder::new()
            .name("traversal-session".to_string())
            .spawn({
                let engine = Arc::clone(&self.engine);
                let session = Arc::clone(&session);
                move || {
                    log::debug!("Traversal worker started");
                    Self::worker_loop(&engine, &session);
                    log::debug!("Traversal worker exiting");
                }
            })
            .map_err(|e| EngineError::WorkerSpawn(e.to_string()))?;

        self.active = Some(ActiveSession {
            session: Arc::clone(&session),
            handle,
        });
        log::info!("Traversal started over {} objects", len);
        session.wait_presented(0)
    }

    fn worker_loop(engine: &Mutex<Engine>, session: &Session) {
        let _guard = FinishGuard(session);
        let mut shown: Option<u64> = None;
        loop {
            let (index, object, generation) = {
                let mut state = lock(&session.state);
                while !state.cancelled && shown == Some(state.generation) {
                    state = session
                        .condvar
                        .wait(state)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                if state.cancelled {
                    return;
                }
                (state.index, state.list[state.index], state.generation)
            };

            // Only the engine lock is held while presenting.
            let result = lock(engine).present(object);

            let mut state = lock(&session.state);
            if let Err(e) = result {
                log::warn!("Traversal could not present object {}: {}", object, e);
                state.failure = Some(e);
            }
            state.presented = Some(generation);
            state.visited.push(index);
            session.condvar.notify_all();
            shown = Some(generation);
        }
    }

    fn step(&mut self, forward: bool) -> Result<bool> {
        let Some(active) = &self.active else {
            log::warn!(
                "Traversal {} ignored: no active session",
                if forward { "next" } else { "previous" }
            );
            return Ok(false);
        };

        let generation = {
            let mut state = lock(&active.session.state);
            let len = state.list.len();
            state.index = if forward {
                (state.index + 1) % len
            } else {
                (state.index + len - 1) % len
            };
            state.generation += 1;
            log::debug!("Traversal moved to index {} of {}", state.index, len);
            active.session.condvar.notify_all();
            state.generation
        };
        active.session.wait_presented(generation)?;
        Ok(true)
    }

    /// Present the next object, wrapping at the end.
    /// Returns false if no session is active.
    #[expect(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<bool> {
        self.step(true)
    }

    /// Present the previous object, wrapping at the start.
    /// Returns false if no session is active.
    pub fn previous(&mut self) -> Result<bool> {
        self.step(false)
    }

    /// End the session and unselect the presented object.
    /// Returns false if no session is active.
    pub fn cancel(&mut self) -> Result<bool> {
        let Some(active) = self.active.take() else {
            log::warn!("Traversal cancel ignored: no active session");
            return Ok(false);
        };

        {
            let mut state = lock(&active.session.state);
            state.cancelled = true;
            active.session.condvar.notify_all();
        }
        if active.handle.join().is_err() {
            log::error!("Traversal worker panicked");
        }
        self.history = lock(&active.session.state).visited.clone();

        lock(&self.engine).select_background_click()?;
        log::info!("Traversal cancelled after {} presentations", self.history.len());
        Ok(true)
    }
}

impl Drop for TraversalController {
    fn drop(&mut self) {
        if self.active.is_some() {
            if let Err(e) = self.cancel() {
                log::warn!("Traversal cleanup failed: {}", e);
            }
        }
    }
}
