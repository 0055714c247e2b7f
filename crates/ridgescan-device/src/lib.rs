//! Capture driver boundary for the Ridgescan coordination layer.
//!
//! This crate defines the contract between the coordination layer and a
//! concrete fingerprint capture engine: the [`CaptureDriver`] trait, the
//! synchronous progress/cancel protocol ([`ProgressChannel`]), the reply
//! types each operation produces, and a scripted mock driver for tests and
//! development.
//!
//! # Driver contract
//!
//! The coordination layer owns exactly one driver per process and
//! serializes every call to it, so drivers need no internal locking. Long
//! calls report progress synchronously and honour a cancel decision by
//! finishing with `CanceledByUser`:
//!
//! ```no_run
//! use ridgescan_core::CaptureConfig;
//! use ridgescan_device::progress::{CaptureDecision, ProgressChannel, ProgressEvent};
//! use ridgescan_device::traits::CaptureDriver;
//!
//! struct FirstSampleOnly {
//!     seen: u32,
//! }
//!
//! impl ProgressChannel for FirstSampleOnly {
//!     fn on_event(&mut self, _event: ProgressEvent) -> CaptureDecision {
//!         self.seen += 1;
//!         if self.seen > 1 {
//!             CaptureDecision::Cancel
//!         } else {
//!             CaptureDecision::Continue
//!         }
//!     }
//! }
//!
//! fn enroll_once<D: CaptureDriver>(driver: &mut D) {
//!     let mut channel = FirstSampleOnly { seen: 0 };
//!     let reply = driver.enroll(&CaptureConfig::default(), &mut channel);
//!     println!("enrollment finished: {}", reply.status);
//! }
//! ```
//!
//! # Backends
//!
//! Backends are dispatched through the [`AnyCaptureDriver`] enum wrapper.
//! The scripted [`MockScanner`](mock::MockScanner) is the only built-in
//! backend; hardware bindings plug in behind feature flags.
//!
//! [`CaptureDriver`]: traits::CaptureDriver
//! [`ProgressChannel`]: progress::ProgressChannel
//! [`AnyCaptureDriver`]: drivers::AnyCaptureDriver

pub mod drivers;
pub mod mock;
pub mod progress;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use drivers::AnyCaptureDriver;
pub use progress::{CaptureDecision, CaptureProgress, Frame, ProgressChannel, ProgressEvent, ScanSignal};
pub use traits::CaptureDriver;
pub use types::{
    BaseTemplateReply, CapturedTemplate, EnrollReply, IdentifyRecord, IdentifyReply, VerifyReply,
};

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
