//! Observer callbacks for capture operations.
//!
//! Controllers report progress and completion through an [`OperationObserver`]
//! supplied when an operation starts. All callbacks run synchronously on the
//! operation's worker thread while the device call is blocked waiting for the
//! return value, so handlers should do their work quickly and hand anything
//! slow (UI updates, persistence) to another thread.
//!
//! Progress handlers have empty defaults; only [`on_complete`] must be
//! implemented. Cancellation from inside a callback is done by calling the
//! session's `cancel`, or by returning `true` from [`on_fake_source`].
//!
//! [`on_complete`]: OperationObserver::on_complete
//! [`on_fake_source`]: OperationObserver::on_fake_source

use ridgescan_core::StatusCode;
use ridgescan_device::{CaptureProgress, Frame};

/// Receiver for progress and completion callbacks of one operation.
///
/// Implementations must be `Send + Sync`: the observer is handed to a worker
/// thread and may be invoked while the caller still holds its own reference.
pub trait OperationObserver: Send + Sync {
    /// A finger touched the scanner surface.
    fn on_touch_sensor(&self, _progress: &CaptureProgress) {}

    /// The finger left the scanner surface.
    fn on_take_off(&self, _progress: &CaptureProgress) {}

    /// The engine suspects a fake finger.
    ///
    /// Only delivered when fake finger detection and fake event delivery are
    /// both enabled on the session. Return `true` to cancel the operation.
    fn on_fake_source(&self, _progress: &CaptureProgress) -> bool {
        false
    }

    /// A preview frame is available.
    fn on_frame(&self, _frame: &Frame) {}

    /// The operation finished, successfully or not.
    ///
    /// Always called exactly once per started operation, including after
    /// cancellation and after a panicking device call.
    fn on_complete(&self, event: CompletionEvent);
}

/// Terminal outcome of a capture operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionEvent {
    /// An enrollment run finished.
    Enrollment {
        /// Whether a template was captured.
        success: bool,
        /// Engine status of the run.
        status: StatusCode,
    },

    /// A verification run finished.
    Verification {
        /// Whether the run completed without error.
        success: bool,
        /// Engine status of the run.
        status: StatusCode,
        /// Whether the captured sample matched the base template.
        matched: bool,
    },

    /// A base template acquisition finished.
    BaseTemplate {
        /// Whether a base template was captured.
        success: bool,
        /// Engine status of the run.
        status: StatusCode,
    },
}

impl CompletionEvent {
    /// Engine status of the finished run.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            CompletionEvent::Enrollment { status, .. }
            | CompletionEvent::Verification { status, .. }
            | CompletionEvent::BaseTemplate { status, .. } => *status,
        }
    }

    /// Whether the finished run succeeded.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        match self {
            CompletionEvent::Enrollment { success, .. }
            | CompletionEvent::Verification { success, .. }
            | CompletionEvent::BaseTemplate { success, .. } => *success,
        }
    }
}
