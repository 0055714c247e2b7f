//! Mock driver implementations for testing and development.
//!
//! The mock scanner replays operator-queued scripts instead of touching
//! hardware, and logs every call with wall-clock spans so tests can assert
//! serialization and cancellation behavior.

pub mod scanner;

// Re-export commonly used types
pub use scanner::{
    BaseTemplateScript, CallKind, CallRecord, EnrollScript, MockScanner, MockScannerHandle,
    Script, VerifyScript,
};
