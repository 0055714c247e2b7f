//! Identification controller.
//!
//! One-to-many matching in two phases. Phase one,
//! [`acquire_base_template`], captures a live sample on a worker thread and
//! condenses it into a base template held by the controller. Phase two,
//! [`identify`], compares that base template against a caller-supplied
//! record set; it is a pure comparison pass with no sensor interaction, so
//! it runs synchronously on the calling thread (still under the process-wide
//! device lock) and returns its outcome directly instead of via callback.
//!
//! [`acquire_base_template`]: Identification::acquire_base_template
//! [`identify`]: Identification::identify

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use ridgescan_core::{Error, Result, StatusCode};
use ridgescan_device::traits::CaptureDriver;
use ridgescan_device::types::IdentifyRecord;

use crate::observer::{CompletionEvent, OperationObserver};
use crate::runtime::ScannerRuntime;
use crate::session::{ProgressBridge, ScannerSession, SessionBase};
use crate::state::{OperationState, StateCell};
use crate::worker::{CancelFlag, lock_ignore_poison};

/// Outcome of one [`identify`](Identification::identify) call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifyOutcome {
    /// Engine outcome code. Not an `Err`: a failed comparison is an
    /// ordinary result the caller inspects.
    pub status: StatusCode,
    /// Index of the matched record in the supplied slice, -1 for none.
    pub index: i32,
}

impl IdentifyOutcome {
    /// Matched record index as a slice index, `None` when nothing matched.
    #[must_use]
    pub fn matched_index(&self) -> Option<usize> {
        usize::try_from(self.index).ok()
    }
}

/// Controller for identifying one finger against many stored templates.
#[derive(Debug)]
pub struct Identification {
    base: SessionBase,
    base_template: Arc<Mutex<Option<Vec<u8>>>>,
}

impl Identification {
    /// Create an identification controller attached to `runtime`.
    ///
    /// # Errors
    /// Returns `Error::Initialization` if this is the first session and
    /// engine initialization fails.
    pub fn new(runtime: Arc<ScannerRuntime>) -> Result<Self> {
        Ok(Identification {
            base: SessionBase::new(runtime)?,
            base_template: Arc::new(Mutex::new(None)),
        })
    }

    /// Start base-template acquisition on a worker thread.
    ///
    /// Valid from `ReadyToProcess` or `ReadyToContinue`; re-running
    /// discards the previous base template. The final state reflects
    /// whether a base template is now held: `ReadyToContinue` on success,
    /// `ReadyToProcess` otherwise. The observer receives
    /// [`CompletionEvent::BaseTemplate`] on every outcome.
    ///
    /// # Errors
    /// Returns `Error::Disposed`, `Error::InvalidState` while a run is in
    /// progress, or `Error::WorkerSpawn` if no thread could be started.
    pub fn acquire_base_template(&self, observer: Arc<dyn OperationObserver>) -> Result<()> {
        let runtime = Arc::clone(self.base.runtime());
        let state = Arc::clone(self.base.state());
        let cancel = self.base.cancel_flag().clone();
        let fin_cancel = self.base.cancel_flag().clone();
        let config = self.base.config_snapshot();
        let slot = Arc::clone(&self.base_template);
        let fin_slot = Arc::clone(&self.base_template);
        let op_observer = Arc::clone(&observer);

        self.base.start_operation(
            "acquire_base_template",
            &[OperationState::ReadyToProcess, OperationState::ReadyToContinue],
            OperationState::ProcessInProgress,
            move || {
                *lock_ignore_poison(&slot) = None;
                let mut bridge = ProgressBridge::new(op_observer, cancel, &config);
                let reply =
                    runtime.with_device(|device| device.build_base_template(&config, &mut bridge));
                if reply.status.is_ok() {
                    *lock_ignore_poison(&slot) = reply.template;
                }
                reply.status
            },
            move |status| {
                let next = if lock_ignore_poison(&fin_slot).is_some() {
                    OperationState::ReadyToContinue
                } else {
                    OperationState::ReadyToProcess
                };
                state.complete(next);
                fin_cancel.clear();
                observer.on_complete(CompletionEvent::BaseTemplate {
                    success: status.is_ok(),
                    status,
                });
            },
        )
    }

    /// Compare the held base template against `records`, synchronously.
    ///
    /// Valid only in `ReadyToContinue`. The state passes through
    /// `ContinueInProgress` and returns to `ReadyToContinue` on every exit
    /// path. An empty record slice is a no-op success: status `Ok`, index
    /// -1, the device is never touched. A missing base template (possible
    /// only via internal inconsistency) reports `InternalError` as an
    /// outcome, not an `Err`.
    ///
    /// # Errors
    /// Returns `Error::Disposed` or `Error::InvalidState`; engine failures
    /// come back inside the outcome instead.
    pub fn identify(&self, records: &[IdentifyRecord]) -> Result<IdentifyOutcome> {
        self.base.ensure_live()?;
        self.base.state().request_start(
            "identify",
            &[OperationState::ReadyToContinue],
            OperationState::ContinueInProgress,
        )?;
        let _guard = IdentifyGuard {
            state: self.base.state(),
            cancel: self.base.cancel_flag(),
        };

        if records.is_empty() {
            return Ok(IdentifyOutcome {
                status: StatusCode::Ok,
                index: -1,
            });
        }

        let template = lock_ignore_poison(&self.base_template).clone();
        let Some(template) = template else {
            return Ok(IdentifyOutcome {
                status: StatusCode::InternalError,
                index: -1,
            });
        };

        let config = self.base.config_snapshot();
        let reply = self
            .base
            .runtime()
            .with_device(|device| device.identify(&config, &template, records));
        Ok(IdentifyOutcome {
            status: reply.status,
            index: reply.index,
        })
    }

    /// The held base template as a fresh copy, `None` when none is held.
    ///
    /// # Errors
    /// Readable in `ReadyToProcess` or `ReadyToContinue`.
    pub fn base_template(&self) -> Result<Option<Vec<u8>>> {
        self.base.ensure_live()?;
        self.base.state().require(
            "base_template",
            &[OperationState::ReadyToProcess, OperationState::ReadyToContinue],
        )?;
        Ok(lock_ignore_poison(&self.base_template).clone())
    }

    /// Install an externally stored base template, skipping acquisition.
    ///
    /// Copies `bytes` and forces the state to `ReadyToContinue`, so
    /// [`identify`](Identification::identify) can run without a capture.
    ///
    /// # Errors
    /// Returns `Error::InvalidArgument` for an empty template; valid from
    /// `ReadyToProcess` or `ReadyToContinue`.
    pub fn set_base_template(&self, bytes: &[u8]) -> Result<()> {
        self.base.ensure_live()?;
        self.base.state().require(
            "set_base_template",
            &[OperationState::ReadyToProcess, OperationState::ReadyToContinue],
        )?;
        if bytes.is_empty() {
            return Err(Error::invalid_argument("Base template is empty"));
        }
        *lock_ignore_poison(&self.base_template) = Some(bytes.to_vec());
        self.base.state().complete(OperationState::ReadyToContinue);
        Ok(())
    }

    /// Identifications left before a trial engine build expires;
    /// `i32::MAX` on full builds.
    pub fn identifications_left(&self) -> Result<i32> {
        self.base.ensure_live()?;
        Ok(self
            .base
            .runtime()
            .with_device(|device| device.identifications_left()))
    }

    /// Whether the engine runs under a trial license.
    pub fn is_trial(&self) -> Result<bool> {
        self.base.ensure_live()?;
        Ok(self.base.runtime().with_device(|device| device.is_trial()))
    }
}

impl ScannerSession for Identification {
    fn base(&self) -> &SessionBase {
        &self.base
    }
}

/// Restores `ReadyToContinue` on every exit path of `identify`, including
/// unwinding out of the device call.
struct IdentifyGuard<'a> {
    state: &'a StateCell,
    cancel: &'a CancelFlag,
}

impl Drop for IdentifyGuard<'_> {
    fn drop(&mut self) {
        self.state.complete(OperationState::ReadyToContinue);
        self.cancel.clear();
    }
}
