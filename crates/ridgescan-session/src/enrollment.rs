//! Enrollment controller.
//!
//! Captures several samples of one finger and combines them into a single
//! enrollment template. The run happens on a worker thread; the observer's
//! `on_complete` receives [`CompletionEvent::Enrollment`] exactly once per
//! started run, and the captured template stays readable on the controller
//! until the next run replaces it.

use std::sync::{Arc, Mutex};

use ridgescan_core::constants::{
    MAX_ENROLLMENT_MODELS, MIN_ENROLLMENT_MODELS, QUALITY_NOT_AVAILABLE,
};
use ridgescan_core::{Error, Result};
use ridgescan_device::traits::CaptureDriver;
use ridgescan_device::types::CapturedTemplate;

use crate::observer::{CompletionEvent, OperationObserver};
use crate::runtime::ScannerRuntime;
use crate::session::{ProgressBridge, ScannerSession, SessionBase};
use crate::state::OperationState;
use crate::worker::lock_ignore_poison;

/// Controller for enrolling one finger into a template.
///
/// # Examples
///
/// See the crate-level example for a complete enrollment flow against the
/// mock scanner.
#[derive(Debug)]
pub struct Enrollment {
    base: SessionBase,
    result: Arc<Mutex<Option<CapturedTemplate>>>,
}

impl Enrollment {
    /// Create an enrollment controller attached to `runtime`.
    ///
    /// # Errors
    /// Returns `Error::Initialization` if this is the first session and
    /// engine initialization fails.
    pub fn new(runtime: Arc<ScannerRuntime>) -> Result<Self> {
        Ok(Enrollment {
            base: SessionBase::new(runtime)?,
            result: Arc::new(Mutex::new(None)),
        })
    }

    /// Number of finger models combined per enrollment.
    pub fn max_models(&self) -> Result<u8> {
        self.base.read_config(|config| config.max_models)
    }

    /// Set the number of finger models combined per enrollment.
    ///
    /// # Errors
    /// Returns `Error::InvalidArgument` for counts outside `1..=10`.
    pub fn set_max_models(&self, count: u8) -> Result<()> {
        self.base.update_config("set_max_models", |config| {
            if !(MIN_ENROLLMENT_MODELS..=MAX_ENROLLMENT_MODELS).contains(&count) {
                return Err(Error::invalid_argument(format!(
                    "Max models must be {MIN_ENROLLMENT_MODELS}..={MAX_ENROLLMENT_MODELS}, got {count}"
                )));
            }
            config.max_models = count;
            Ok(())
        })
    }

    /// Whether repeated-sample interleaving is disabled.
    pub fn miot_control_off(&self) -> Result<bool> {
        self.base.read_config(|config| config.miot_control_off)
    }

    /// Disable or re-enable repeated-sample interleaving.
    pub fn set_miot_control_off(&self, off: bool) -> Result<()> {
        self.base.update_config("set_miot_control_off", |config| {
            config.miot_control_off = off;
            Ok(())
        })
    }

    /// Start an enrollment run on a worker thread.
    ///
    /// Valid only in `ReadyToProcess`. Any previously captured template is
    /// discarded before the engine call. On every outcome the controller
    /// returns to `ReadyToProcess` and the observer receives
    /// [`CompletionEvent::Enrollment`].
    ///
    /// # Errors
    /// Returns `Error::Disposed`, `Error::InvalidState` while a run is in
    /// progress, or `Error::WorkerSpawn` if no thread could be started.
    pub fn enroll(&self, observer: Arc<dyn OperationObserver>) -> Result<()> {
        let runtime = Arc::clone(self.base.runtime());
        let state = Arc::clone(self.base.state());
        let cancel = self.base.cancel_flag().clone();
        let config = self.base.config_snapshot();
        let result = Arc::clone(&self.result);
        let op_observer = Arc::clone(&observer);

        self.base.start_operation(
            "enroll",
            &[OperationState::ReadyToProcess],
            OperationState::ProcessInProgress,
            move || {
                *lock_ignore_poison(&result) = None;
                let mut bridge = ProgressBridge::new(op_observer, cancel, &config);
                let reply = runtime.with_device(|device| device.enroll(&config, &mut bridge));
                if reply.status.is_ok() {
                    *lock_ignore_poison(&result) = reply.capture;
                }
                reply.status
            },
            move |status| {
                state.complete(OperationState::ReadyToProcess);
                observer.on_complete(CompletionEvent::Enrollment {
                    success: status.is_ok(),
                    status,
                });
            },
        )
    }

    /// The captured template bytes from the last successful run, as a fresh
    /// copy. `None` before the first success.
    ///
    /// # Errors
    /// Readable only in `ReadyToProcess`.
    pub fn template(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.capture()?.map(|capture| capture.bytes))
    }

    /// Quality score of the last captured template, 0 when none is held.
    ///
    /// # Errors
    /// Readable only in `ReadyToProcess`.
    pub fn quality(&self) -> Result<u8> {
        Ok(self
            .capture()?
            .map_or(QUALITY_NOT_AVAILABLE, |capture| capture.quality))
    }

    /// The full capture artifact from the last successful run, including
    /// quality and timestamp.
    ///
    /// # Errors
    /// Readable only in `ReadyToProcess`.
    pub fn capture(&self) -> Result<Option<CapturedTemplate>> {
        self.base.ensure_live()?;
        self.base
            .state()
            .require("template", &[OperationState::ReadyToProcess])?;
        Ok(lock_ignore_poison(&self.result).clone())
    }
}

impl ScannerSession for Enrollment {
    fn base(&self) -> &SessionBase {
        &self.base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ridgescan_device::drivers::AnyCaptureDriver;
    use ridgescan_device::mock::MockScanner;

    fn enrollment() -> Enrollment {
        let (scanner, _handle) = MockScanner::new();
        Enrollment::new(ScannerRuntime::new(AnyCaptureDriver::Mock(scanner))).unwrap()
    }

    #[test]
    fn test_max_models_defaults_and_range() {
        let enrollment = enrollment();
        assert_eq!(enrollment.max_models().unwrap(), 5);

        enrollment.set_max_models(1).unwrap();
        enrollment.set_max_models(10).unwrap();
        assert!(matches!(
            enrollment.set_max_models(0),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            enrollment.set_max_models(11),
            Err(Error::InvalidArgument(_))
        ));
        assert_eq!(enrollment.max_models().unwrap(), 10);
    }

    #[test]
    fn test_miot_control_defaults_off() {
        let enrollment = enrollment();
        assert!(!enrollment.miot_control_off().unwrap());
        enrollment.set_miot_control_off(true).unwrap();
        assert!(enrollment.miot_control_off().unwrap());
    }

    #[test]
    fn test_no_template_before_first_run() {
        let enrollment = enrollment();
        assert_eq!(enrollment.template().unwrap(), None);
        assert_eq!(enrollment.quality().unwrap(), QUALITY_NOT_AVAILABLE);
    }

    #[test]
    fn test_results_unreadable_while_busy() {
        let enrollment = enrollment();
        enrollment
            .base()
            .state()
            .complete(OperationState::ProcessInProgress);

        assert!(matches!(
            enrollment.template(),
            Err(Error::InvalidState { .. })
        ));
        assert!(matches!(
            enrollment.quality(),
            Err(Error::InvalidState { .. })
        ));
    }
}
