//! Cooperative cancellation and an optional worker abstraction.
//!
//! A small `ITaskRunner`-style interface with an asynchronous,
//! dedicated-worker implementation and a
//! synchronous, inline implementation used for deterministic tests. The core
//! itself stays single-threaded; this is offered to collaborators (a GUI or
//! driver) that want to run a [`crate::scanner::Scan`] operation off their own
//! thread without the core needing to know about threads at all.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

/// Cooperative stop signal, polled (never blocked on) by long operations at
/// page/record boundaries.
#[derive(Clone)]
pub struct StopToken(Arc<AtomicBool>);

impl StopToken {
    /// A token that never fires, for callers that don't want cancellation.
    pub fn never() -> Self {
        StopToken(Arc::new(AtomicBool::new(false)))
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Paired with a [`StopToken`]; held by whoever can request cancellation.
pub struct StopSource(Arc<AtomicBool>);

impl StopSource {
    pub fn new() -> Self {
        StopSource(Arc::new(AtomicBool::new(false)))
    }

    pub fn token(&self) -> StopToken {
        StopToken(Arc::clone(&self.0))
    }

    pub fn request_stop(&self) {
        self.0.store(true, Ordering::Release);
    }
}

impl Default for StopSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs a cancellable task, either on a dedicated worker or inline.
pub trait TaskRunner {
    /// Start `task`, passing it a [`StopToken`] it should poll periodically.
    fn run(&mut self, task: Box<dyn FnOnce(StopToken) + Send>);

    /// Request cancellation of the running task, if any.
    fn request_stop(&mut self);

    /// Block until the running task (if any) has finished.
    fn join(&mut self);
}

/// Spawns a `std::thread` per task and hands it a cooperative stop token.
pub struct AsyncTaskRunner {
    stop: StopSource,
    handle: Option<JoinHandle<()>>,
}

impl AsyncTaskRunner {
    pub fn new() -> Self {
        Self {
            stop: StopSource::new(),
            handle: None,
        }
    }
}

impl Default for AsyncTaskRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskRunner for AsyncTaskRunner {
    fn run(&mut self, task: Box<dyn FnOnce(StopToken) + Send>) {
        self.join();
        self.stop = StopSource::new();
        let token = self.stop.token();
        self.handle = Some(std::thread::spawn(move || task(token)));
    }

    fn request_stop(&mut self) {
        self.stop.request_stop();
    }

    fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Runs the task inline on the caller's thread. The stop token is always
/// live but only ever fires if `request_stop` is called before `run`
/// returns control — in practice never, since `run` blocks. Exists for
/// deterministic tests that want to exercise the `TaskRunner` seam without
/// thread nondeterminism.
pub struct SyncTaskRunner {
    stop: StopSource,
}

impl SyncTaskRunner {
    pub fn new() -> Self {
        Self {
            stop: StopSource::new(),
        }
    }
}

impl Default for SyncTaskRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskRunner for SyncTaskRunner {
    fn run(&mut self, task: Box<dyn FnOnce(StopToken) + Send>) {
        self.stop = StopSource::new();
        task(self.stop.token());
    }

    fn request_stop(&mut self) {
        self.stop.request_stop();
    }

    fn join(&mut self) {}
}
