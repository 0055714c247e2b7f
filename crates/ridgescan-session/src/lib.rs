//! Session coordination layer for a single fingerprint scanner.
//!
//! This crate turns the raw capture driver from `ridgescan-device` into
//! safe, concurrent session objects. One [`ScannerRuntime`] owns the device
//! for the whole process: it initializes the engine when the first session
//! attaches, terminates it when the last detaches, and serializes every
//! engine call behind one lock. On top of it sit three controllers:
//!
//! - [`Enrollment`] captures several samples and combines them into one
//!   enrollment template.
//! - [`Verification`] compares a live capture against one known template.
//! - [`Identification`] acquires a base template, then matches it against a
//!   caller-supplied record set.
//!
//! Long captures run on worker threads; progress and completion arrive
//! synchronously through an [`OperationObserver`]. Cancellation is a
//! cooperative flag ([`ScannerSession::cancel`]) consumed at the next
//! progress callback, and disposal joins the worker with a bounded wait.
//!
//! # Examples
//!
//! A complete enrollment against the scripted mock scanner:
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::mpsc::{self, Sender};
//! use std::time::Duration;
//!
//! use ridgescan_device::drivers::AnyCaptureDriver;
//! use ridgescan_device::mock::{EnrollScript, MockScanner};
//! use ridgescan_device::types::{CapturedTemplate, EnrollReply};
//! use ridgescan_session::{
//!     CompletionEvent, Enrollment, OperationObserver, ScannerRuntime, ScannerSession,
//! };
//!
//! struct Waiter(Sender<CompletionEvent>);
//!
//! impl OperationObserver for Waiter {
//!     fn on_complete(&self, event: CompletionEvent) {
//!         let _ = self.0.send(event);
//!     }
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let (scanner, handle) = MockScanner::new();
//! let capture = CapturedTemplate::new(vec![0xF7; 64], 9)?;
//! handle.queue_enroll(EnrollScript::new(EnrollReply::ok(capture)));
//!
//! let runtime = ScannerRuntime::new(AnyCaptureDriver::Mock(scanner));
//! let enrollment = Enrollment::new(runtime)?;
//!
//! let (tx, rx) = mpsc::channel();
//! enrollment.enroll(Arc::new(Waiter(tx)))?;
//!
//! let event = rx.recv_timeout(Duration::from_secs(5))?;
//! assert!(event.succeeded());
//! assert!(enrollment.template()?.is_some());
//! # Ok(())
//! # }
//! ```

pub mod enrollment;
pub mod identification;
pub mod observer;
pub mod runtime;
pub mod session;
pub mod state;
pub mod verification;
pub mod worker;

// Re-export commonly used types for convenience
pub use enrollment::Enrollment;
pub use identification::{Identification, IdentifyOutcome};
pub use observer::{CompletionEvent, OperationObserver};
pub use runtime::ScannerRuntime;
pub use session::{ScannerSession, SessionBase};
pub use state::{OperationState, StateCell, StateChange};
pub use verification::Verification;
pub use worker::{CancelFlag, WorkerSession};

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
