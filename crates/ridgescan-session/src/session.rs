//! Shared session behavior for all controllers.
//!
//! [`SessionBase`] carries everything the three controllers have in common:
//! the runtime attachment, the state cell, the capture configuration, the
//! cancellation flag and the in-flight worker slot. Controllers embed it and
//! expose it through [`ScannerSession`], which provides the shared
//! getter/setter surface as default methods.
//!
//! [`ProgressBridge`] adapts an [`OperationObserver`] to the driver's
//! [`ProgressChannel`]: it routes signals to the observer's handlers, gates
//! fake-source delivery on the configuration frozen at operation start, and
//! folds the session's cancellation flag into every decision.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::debug;

use ridgescan_core::constants::{DISPOSE_JOIN_TIMEOUT_MS, MAX_FAR_VALUE, MIN_FAR_VALUE};
use ridgescan_core::{CaptureConfig, Error, FarLevel, Result, StatusCode, VersionCompat};
use ridgescan_device::progress::{CaptureDecision, ProgressChannel, ProgressEvent, ScanSignal};

use crate::observer::OperationObserver;
use crate::runtime::ScannerRuntime;
use crate::state::{OperationState, StateCell, StateChange};
use crate::worker::{CancelFlag, WorkerSession, lock_ignore_poison};

/// Common state embedded in every controller.
///
/// Construction attaches to the runtime; disposal (or drop) detaches. The
/// worker slot holds at most one [`WorkerSession`], enforced by the state
/// gate rather than the slot itself.
#[derive(Debug)]
pub struct SessionBase {
    runtime: Arc<ScannerRuntime>,
    state: Arc<StateCell>,
    cancel: CancelFlag,
    config: Mutex<CaptureConfig>,
    worker: Mutex<Option<WorkerSession>>,
    disposed: AtomicBool,
}

impl SessionBase {
    /// Attach to the runtime and build a fresh session in `ReadyToProcess`.
    ///
    /// # Errors
    /// Returns `Error::Initialization` if this is the first attachment and
    /// engine initialization fails; no session is built in that case.
    pub(crate) fn new(runtime: Arc<ScannerRuntime>) -> Result<Self> {
        runtime.acquire()?;
        Ok(SessionBase {
            runtime,
            state: Arc::new(StateCell::new()),
            cancel: CancelFlag::new(),
            config: Mutex::new(CaptureConfig::default()),
            worker: Mutex::new(None),
            disposed: AtomicBool::new(false),
        })
    }

    /// Fail fast once the session is disposed.
    pub(crate) fn ensure_live(&self) -> Result<()> {
        if self.disposed.load(Ordering::SeqCst) {
            return Err(Error::Disposed);
        }
        Ok(())
    }

    pub(crate) fn runtime(&self) -> &Arc<ScannerRuntime> {
        &self.runtime
    }

    pub(crate) fn state(&self) -> &Arc<StateCell> {
        &self.state
    }

    pub(crate) fn cancel_flag(&self) -> &CancelFlag {
        &self.cancel
    }

    /// Clone of the current configuration, frozen for one operation.
    pub(crate) fn config_snapshot(&self) -> CaptureConfig {
        lock_ignore_poison(&self.config).clone()
    }

    /// Read a configuration field; gated on not-disposed only.
    pub(crate) fn read_config<T>(&self, f: impl FnOnce(&CaptureConfig) -> T) -> Result<T> {
        self.ensure_live()?;
        let config = lock_ignore_poison(&self.config);
        Ok(f(&config))
    }

    /// Mutate configuration; gated on not-disposed, then `ReadyToProcess`.
    ///
    /// The state gate runs before the closure, so an out-of-state call
    /// reports `InvalidState` even when the value would also be invalid.
    pub(crate) fn update_config(
        &self,
        operation: &str,
        f: impl FnOnce(&mut CaptureConfig) -> Result<()>,
    ) -> Result<()> {
        self.ensure_live()?;
        self.state
            .require(operation, &[OperationState::ReadyToProcess])?;
        let mut config = lock_ignore_poison(&self.config);
        f(&mut config)
    }

    /// Gate, transition and spawn a worker for one long operation.
    ///
    /// Holds the worker slot across the disposal re-check, the state
    /// transition and the spawn, so `dispose` either sees no worker (start
    /// rejected by the disposal check) or the fully installed one. A failed
    /// spawn restores the previous state.
    pub(crate) fn start_operation<O, F>(
        &self,
        operation: &'static str,
        allowed: &[OperationState],
        busy: OperationState,
        op: O,
        finalize: F,
    ) -> Result<()>
    where
        O: FnOnce() -> StatusCode + Send + 'static,
        F: FnOnce(StatusCode) + Send + 'static,
    {
        let mut slot = lock_ignore_poison(&self.worker);
        self.ensure_live()?;
        let change = self.state.request_start(operation, allowed, busy)?;
        self.cancel.clear();
        match WorkerSession::spawn(&format!("ridgescan-{operation}"), op, finalize) {
            Ok(worker) => {
                *slot = Some(worker);
                Ok(())
            }
            Err(err) => {
                self.state.complete(change.from);
                Err(err)
            }
        }
    }

    /// Dispose the session: cancel and join the worker, detach from the
    /// runtime. Idempotent; later calls return immediately.
    ///
    /// The worker join waits at most the dispose timeout. A worker that
    /// ignores cancellation past the timeout is abandoned and logged; it
    /// finishes on its own while the session is already gone.
    pub(crate) fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        // Taking the slot before setting the flag serializes against a
        // concurrent start: once the slot lock is ours, any later start
        // fails the disposal check, and a start that won the race has
        // already installed its worker (and cleared the flag) for us to
        // cancel here.
        let worker = lock_ignore_poison(&self.worker).take();
        self.cancel.set();
        if let Some(worker) = worker {
            worker.join_timeout(Duration::from_millis(DISPOSE_JOIN_TIMEOUT_MS));
        }
        self.runtime.release();
        debug!("session disposed");
    }
}

impl Drop for SessionBase {
    fn drop(&mut self) {
        // Best-effort cleanup for sessions never explicitly disposed.
        self.dispose();
    }
}

/// Shared surface of all capture controllers.
///
/// Getters are gated on not-disposed; setters additionally require
/// `ReadyToProcess`. `cancel` alone is infallible so it can be called from
/// progress handlers and UI threads without ceremony.
pub trait ScannerSession {
    /// The embedded session base.
    #[doc(hidden)]
    fn base(&self) -> &SessionBase;

    /// Whether fake finger detection is enabled.
    fn fake_detection(&self) -> Result<bool> {
        self.base().read_config(|config| config.fake_detection)
    }

    /// Enable or disable fake finger detection.
    fn set_fake_detection(&self, enabled: bool) -> Result<()> {
        self.base().update_config("set_fake_detection", |config| {
            config.fake_detection = enabled;
            Ok(())
        })
    }

    /// Whether fake-source events are forwarded to the observer.
    fn fake_event_delivery(&self) -> Result<bool> {
        self.base().read_config(|config| config.fake_event_delivery)
    }

    /// Enable or disable forwarding of fake-source events.
    fn set_fake_event_delivery(&self, enabled: bool) -> Result<()> {
        self.base().update_config("set_fake_event_delivery", |config| {
            config.fake_event_delivery = enabled;
            Ok(())
        })
    }

    /// Raw FAR parameter currently configured.
    fn far_value(&self) -> Result<i32> {
        self.base().read_config(|config| config.far_value)
    }

    /// Set the raw FAR parameter.
    ///
    /// The named level snaps to the matching preset, or to the `Custom`
    /// marker for off-preset values.
    ///
    /// # Errors
    /// Returns `Error::InvalidArgument` for values outside `1..=1000`.
    fn set_far_value(&self, value: i32) -> Result<()> {
        self.base().update_config("set_far_value", |config| {
            if !(MIN_FAR_VALUE..=MAX_FAR_VALUE).contains(&value) {
                return Err(Error::invalid_argument(format!(
                    "FAR value {value} outside {MIN_FAR_VALUE}..={MAX_FAR_VALUE}"
                )));
            }
            config.far_value = value;
            config.far_level = FarLevel::from_value(value);
            Ok(())
        })
    }

    /// Named FAR level currently configured.
    fn far_level(&self) -> Result<FarLevel> {
        self.base().read_config(|config| config.far_level)
    }

    /// Set a named FAR preset, loading its raw value.
    ///
    /// # Errors
    /// Returns `Error::InvalidArgument` for [`FarLevel::Custom`], which is
    /// derived from raw values and cannot be selected directly.
    fn set_far_level(&self, level: FarLevel) -> Result<()> {
        self.base().update_config("set_far_level", |config| {
            let value = level.preset_value().ok_or_else(|| {
                Error::invalid_argument(
                    "Custom is a derived FAR level; set a raw FAR value instead",
                )
            })?;
            config.far_level = level;
            config.far_value = value;
            Ok(())
        })
    }

    /// Template format compatibility currently configured.
    fn version(&self) -> Result<VersionCompat> {
        self.base().read_config(|config| config.version)
    }

    /// Set the template format compatibility.
    fn set_version(&self, version: VersionCompat) -> Result<()> {
        self.base().update_config("set_version", |config| {
            config.version = version;
            Ok(())
        })
    }

    /// Whether fast capture mode is enabled.
    fn fast_mode(&self) -> Result<bool> {
        self.base().read_config(|config| config.fast_mode)
    }

    /// Enable or disable fast capture mode.
    fn set_fast_mode(&self, enabled: bool) -> Result<()> {
        self.base().update_config("set_fast_mode", |config| {
            config.fast_mode = enabled;
            Ok(())
        })
    }

    /// Current operation state.
    fn current_state(&self) -> Result<OperationState> {
        self.base().ensure_live()?;
        Ok(self.base().state().current())
    }

    /// Recent state transitions, oldest first, for diagnostics.
    fn state_history(&self) -> Result<Vec<StateChange>> {
        self.base().ensure_live()?;
        Ok(self.base().state().history())
    }

    /// Request cancellation of the running operation.
    ///
    /// Never fails and never blocks, even after disposal. The flag is
    /// consumed at the next progress callback; with no operation running the
    /// next started operation clears it unseen.
    fn cancel(&self) {
        self.base().cancel_flag().set();
    }

    /// Dispose the session. Idempotent.
    fn dispose(&self) {
        self.base().dispose();
    }
}

/// Adapter from the driver's progress protocol to an observer.
///
/// One bridge lives for one operation, on that operation's worker thread.
/// Fake-source gating is decided once from the frozen configuration, not
/// re-read mid-operation.
pub(crate) struct ProgressBridge {
    observer: Arc<dyn OperationObserver>,
    cancel: CancelFlag,
    deliver_fake_events: bool,
}

impl ProgressBridge {
    pub(crate) fn new(
        observer: Arc<dyn OperationObserver>,
        cancel: CancelFlag,
        config: &CaptureConfig,
    ) -> Self {
        ProgressBridge {
            observer,
            cancel,
            deliver_fake_events: config.delivers_fake_events(),
        }
    }
}

impl ProgressChannel for ProgressBridge {
    fn on_event(&mut self, event: ProgressEvent) -> CaptureDecision {
        let mut decision = CaptureDecision::Continue;

        if let Some(frame) = &event.frame {
            self.observer.on_frame(frame);
        }

        match event.signal {
            Some(ScanSignal::TouchSensor) => self.observer.on_touch_sensor(&event.progress),
            Some(ScanSignal::TakeOff) => self.observer.on_take_off(&event.progress),
            Some(ScanSignal::FakeSource) => {
                if self.deliver_fake_events && self.observer.on_fake_source(&event.progress) {
                    decision = CaptureDecision::Cancel;
                }
            }
            None => {}
        }

        // The pending cancel wins over whatever the handlers decided.
        if self.cancel.consume() {
            decision = CaptureDecision::Cancel;
        }
        decision
    }
}
