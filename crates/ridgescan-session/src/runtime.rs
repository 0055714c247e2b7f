//! Shared scanner runtime.
//!
//! A [`ScannerRuntime`] owns the single capture device and the capture
//! engine lifecycle for a whole process. All sessions that should share one
//! physical scanner are created from the same `Arc<ScannerRuntime>`.
//!
//! Two guarantees live here:
//! - The engine is initialized when the first session attaches and
//!   terminated when the last one detaches, tracked by a simple refcount.
//! - Every engine call in the process goes through [`with_device`], which
//!   holds the one driver mutex. The underlying engine is not reentrant, so
//!   concurrent sessions take turns rather than overlap.
//!
//! Lock order is lifecycle before driver; `with_device` takes only the
//! driver lock, so a long-running capture never blocks session creation
//! bookkeeping (the attach itself still waits for the device when it has to
//! initialize).
//!
//! [`with_device`]: ScannerRuntime::with_device

use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use ridgescan_core::{Error, Result};
use ridgescan_device::drivers::AnyCaptureDriver;
use ridgescan_device::traits::CaptureDriver;

use crate::worker::lock_ignore_poison;

/// Process-wide owner of the capture device and engine lifecycle.
#[derive(Debug)]
pub struct ScannerRuntime {
    driver: Mutex<AnyCaptureDriver>,
    lifecycle: Mutex<u32>,
}

impl ScannerRuntime {
    /// Wrap a driver into a shareable runtime.
    pub fn new(driver: AnyCaptureDriver) -> Arc<Self> {
        Arc::new(Self {
            driver: Mutex::new(driver),
            lifecycle: Mutex::new(0),
        })
    }

    /// Attach a session, initializing the engine on the first attach.
    ///
    /// # Errors
    ///
    /// Returns `Error::Initialization` with the engine status if the first
    /// attach fails to initialize. The refcount is left untouched, so a
    /// later attach retries initialization.
    pub fn acquire(&self) -> Result<()> {
        let mut count = lock_ignore_poison(&self.lifecycle);
        if *count == 0 {
            let status = lock_ignore_poison(&self.driver).initialize();
            if !status.is_ok() {
                return Err(Error::Initialization(status));
            }
            debug!("capture engine initialized");
        }
        *count += 1;
        Ok(())
    }

    /// Detach a session, terminating the engine on the last detach.
    ///
    /// An unbalanced release is logged and ignored.
    pub fn release(&self) {
        let mut count = lock_ignore_poison(&self.lifecycle);
        if *count == 0 {
            warn!("scanner release without a matching acquire");
            return;
        }
        *count -= 1;
        if *count == 0 {
            lock_ignore_poison(&self.driver).terminate();
            debug!("capture engine terminated");
        }
    }

    /// Run a closure with exclusive access to the driver.
    ///
    /// The driver mutex is held for the full closure, including any progress
    /// callbacks the driver makes from inside it. This is the serialization
    /// point for all engine calls in the process.
    pub fn with_device<T>(&self, f: impl FnOnce(&mut AnyCaptureDriver) -> T) -> T {
        let mut driver = lock_ignore_poison(&self.driver);
        f(&mut driver)
    }

    /// Number of sessions currently attached.
    #[must_use]
    pub fn live_sessions(&self) -> u32 {
        *lock_ignore_poison(&self.lifecycle)
    }
}
