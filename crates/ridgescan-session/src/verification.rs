//! Verification controller.
//!
//! Compares a live capture against one known template supplied at
//! construction (one-to-one matching). The match result and the FAR value
//! the engine actually used stay readable on the controller after the run.

use std::sync::{Arc, Mutex};

use ridgescan_core::{Error, Result};
use ridgescan_device::traits::CaptureDriver;

use crate::observer::{CompletionEvent, OperationObserver};
use crate::runtime::ScannerRuntime;
use crate::session::{ProgressBridge, ScannerSession, SessionBase};
use crate::state::OperationState;
use crate::worker::lock_ignore_poison;

/// Per-run verification outcome, reset before every engine call.
#[derive(Debug, Clone, Copy)]
struct VerifyOutcome {
    matched: bool,
    far_used: i32,
}

impl Default for VerifyOutcome {
    fn default() -> Self {
        // The pre-run FAR reads back as 1, the strictest preset.
        VerifyOutcome {
            matched: false,
            far_used: 1,
        }
    }
}

/// Controller for verifying a live finger against one stored template.
#[derive(Debug)]
pub struct Verification {
    base: SessionBase,
    base_template: Vec<u8>,
    outcome: Arc<Mutex<VerifyOutcome>>,
}

impl Verification {
    /// Create a verification controller for `base_template`.
    ///
    /// The template is copied; the caller's buffer is not referenced
    /// afterwards.
    ///
    /// # Errors
    /// Returns `Error::InvalidArgument` for an empty template (checked
    /// before the runtime is attached) and `Error::Initialization` if this
    /// is the first session and engine initialization fails.
    pub fn new(runtime: Arc<ScannerRuntime>, base_template: &[u8]) -> Result<Self> {
        if base_template.is_empty() {
            return Err(Error::invalid_argument("Base template is empty"));
        }
        Ok(Verification {
            base: SessionBase::new(runtime)?,
            base_template: base_template.to_vec(),
            outcome: Arc::new(Mutex::new(VerifyOutcome::default())),
        })
    }

    /// Start a verification run on a worker thread.
    ///
    /// Valid only in `ReadyToProcess`. The stored outcome is reset before
    /// the engine call and updated from the reply on success. On every
    /// outcome the controller returns to `ReadyToProcess` and the observer
    /// receives [`CompletionEvent::Verification`].
    ///
    /// # Errors
    /// Returns `Error::Disposed`, `Error::InvalidState` while a run is in
    /// progress, or `Error::WorkerSpawn` if no thread could be started.
    pub fn verify(&self, observer: Arc<dyn OperationObserver>) -> Result<()> {
        let runtime = Arc::clone(self.base.runtime());
        let state = Arc::clone(self.base.state());
        let cancel = self.base.cancel_flag().clone();
        let config = self.base.config_snapshot();
        let template = self.base_template.clone();
        let outcome = Arc::clone(&self.outcome);
        let fin_outcome = Arc::clone(&self.outcome);
        let op_observer = Arc::clone(&observer);

        self.base.start_operation(
            "verify",
            &[OperationState::ReadyToProcess],
            OperationState::ProcessInProgress,
            move || {
                *lock_ignore_poison(&outcome) = VerifyOutcome::default();
                let mut bridge = ProgressBridge::new(op_observer, cancel, &config);
                let reply =
                    runtime.with_device(|device| device.verify(&config, &template, &mut bridge));
                if reply.status.is_ok() {
                    *lock_ignore_poison(&outcome) = VerifyOutcome {
                        matched: reply.matched,
                        far_used: reply.far_used,
                    };
                }
                reply.status
            },
            move |status| {
                let matched = lock_ignore_poison(&fin_outcome).matched;
                state.complete(OperationState::ReadyToProcess);
                observer.on_complete(CompletionEvent::Verification {
                    success: status.is_ok(),
                    status,
                    matched,
                });
            },
        )
    }

    /// Whether the last completed run matched. `false` before the first
    /// completed run.
    ///
    /// # Errors
    /// Readable only in `ReadyToProcess`.
    pub fn matched(&self) -> Result<bool> {
        self.read_outcome("matched").map(|outcome| outcome.matched)
    }

    /// FAR value the last completed run used. `1` before the first
    /// completed run.
    ///
    /// # Errors
    /// Readable only in `ReadyToProcess`.
    pub fn far_used(&self) -> Result<i32> {
        self.read_outcome("far_used").map(|outcome| outcome.far_used)
    }

    fn read_outcome(&self, operation: &str) -> Result<VerifyOutcome> {
        self.base.ensure_live()?;
        self.base
            .state()
            .require(operation, &[OperationState::ReadyToProcess])?;
        Ok(*lock_ignore_poison(&self.outcome))
    }
}

impl ScannerSession for Verification {
    fn base(&self) -> &SessionBase {
        &self.base
    }
}
