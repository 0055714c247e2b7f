//! Worker-thread execution for long engine calls.
//!
//! Each long operation runs on its own named worker thread: the thread runs
//! the operation closure, then a finalize closure that restores session
//! state and notifies the observer. Both closures are panic-isolated, so a
//! crashing driver binding or a panicking observer degrades to an
//! `InternalError` completion instead of tearing the process down.
//!
//! `dispose` needs a *bounded* wait for the worker: [`WorkerSession`] holds
//! the sender half of a channel inside the thread and `join_timeout` waits
//! for the disconnect. A thread that outlives the timeout is abandoned (its
//! join handle dropped) and logged; it keeps running detached until the
//! engine call returns.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{error, warn};

use ridgescan_core::{Error, Result, StatusCode};

/// Lock a mutex, absorbing poisoning.
///
/// Session mutexes guard plain data and dispose must keep working after a
/// panicking worker, so a poisoned lock is treated as a normal one.
pub(crate) fn lock_ignore_poison<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shared one-shot cancellation flag.
///
/// The flag carries the whole cancellation protocol: `set` requests
/// cancellation from any thread, and the progress bridge *consumes* it
/// (read-and-clear) when answering the next progress callback. Consuming
/// keeps a single request from cancelling more than one operation.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// New flag, not set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Clear a pending request without acting on it.
    pub fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    /// Read and clear the flag in one step.
    ///
    /// Returns `true` if a cancellation was pending; the flag is clear
    /// afterwards either way.
    #[must_use]
    pub fn consume(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }

    /// Peek at the flag without clearing it.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A spawned operation worker with a bounded-join handle.
#[derive(Debug)]
pub struct WorkerSession {
    handle: Option<JoinHandle<()>>,
    done_rx: mpsc::Receiver<()>,
    name: String,
}

impl WorkerSession {
    /// Spawn a named worker running `operation` and then `finalize`.
    ///
    /// `finalize` always runs, with `InternalError` as the status when the
    /// operation panicked. A panic inside `finalize` itself is logged and
    /// swallowed; the thread still exits cleanly.
    ///
    /// # Errors
    /// Returns `Error::WorkerSpawn` if the OS refuses a new thread.
    pub fn spawn<O, F>(name: &str, operation: O, finalize: F) -> Result<Self>
    where
        O: FnOnce() -> StatusCode + Send + 'static,
        F: FnOnce(StatusCode) + Send + 'static,
    {
        let (done_tx, done_rx) = mpsc::channel();
        let thread_name = name.to_string();
        let handle = thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                // Dropped when the thread exits, waking join_timeout.
                let _done_tx = done_tx;

                let status = match panic::catch_unwind(AssertUnwindSafe(operation)) {
                    Ok(status) => status,
                    Err(_) => {
                        error!(worker = %thread_name, "operation panicked");
                        StatusCode::InternalError
                    }
                };

                if panic::catch_unwind(AssertUnwindSafe(|| finalize(status))).is_err() {
                    error!(worker = %thread_name, "completion callback panicked");
                }
            })
            .map_err(|err| Error::WorkerSpawn(err.to_string()))?;

        Ok(WorkerSession {
            handle: Some(handle),
            done_rx,
            name: name.to_string(),
        })
    }

    /// Wait up to `timeout` for the worker to finish.
    ///
    /// Returns `true` once the thread has been joined. On timeout the
    /// thread is abandoned: the handle is dropped, the thread keeps running
    /// detached, and `false` is returned.
    pub fn join_timeout(mut self, timeout: Duration) -> bool {
        if matches!(
            self.done_rx.recv_timeout(timeout),
            Err(RecvTimeoutError::Timeout)
        ) {
            warn!(
                worker = %self.name,
                timeout_ms = timeout.as_millis() as u64,
                "worker did not finish in time, abandoning thread"
            );
            self.handle = None;
            return false;
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        true
    }
}
