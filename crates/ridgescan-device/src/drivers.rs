//! Enum wrapper for capture driver dispatch.
//!
//! The coordination layer stores its one driver behind a process-wide mutex
//! and must name a concrete type there. [`AnyCaptureDriver`] wraps every
//! available backend in one enum and forwards the [`CaptureDriver`] trait
//! through a match, so backends can be added behind feature flags without
//! boxing.

use ridgescan_core::{CaptureConfig, StatusCode};

use crate::mock::MockScanner;
use crate::progress::ProgressChannel;
use crate::traits::CaptureDriver;
use crate::types::{BaseTemplateReply, EnrollReply, IdentifyRecord, IdentifyReply, VerifyReply};

/// Enum wrapper over every capture driver backend.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyCaptureDriver {
    /// Scripted mock scanner for development and testing.
    Mock(MockScanner),
    // Planned variants:
    // - Usb(UsbScanner) - native USB scanner library binding (hardware-usb)
}

impl CaptureDriver for AnyCaptureDriver {
    fn initialize(&mut self) -> StatusCode {
        match self {
            Self::Mock(driver) => driver.initialize(),
        }
    }

    fn terminate(&mut self) {
        match self {
            Self::Mock(driver) => driver.terminate(),
        }
    }

    fn enroll(
        &mut self,
        config: &CaptureConfig,
        channel: &mut dyn ProgressChannel,
    ) -> EnrollReply {
        match self {
            Self::Mock(driver) => driver.enroll(config, channel),
        }
    }

    fn verify(
        &mut self,
        config: &CaptureConfig,
        base_template: &[u8],
        channel: &mut dyn ProgressChannel,
    ) -> VerifyReply {
        match self {
            Self::Mock(driver) => driver.verify(config, base_template, channel),
        }
    }

    fn build_base_template(
        &mut self,
        config: &CaptureConfig,
        channel: &mut dyn ProgressChannel,
    ) -> BaseTemplateReply {
        match self {
            Self::Mock(driver) => driver.build_base_template(config, channel),
        }
    }

    fn identify(
        &mut self,
        config: &CaptureConfig,
        base_template: &[u8],
        records: &[IdentifyRecord],
    ) -> IdentifyReply {
        match self {
            Self::Mock(driver) => driver.identify(config, base_template, records),
        }
    }

    fn is_trial(&self) -> bool {
        match self {
            Self::Mock(driver) => driver.is_trial(),
        }
    }

    fn identifications_left(&self) -> i32 {
        match self {
            Self::Mock(driver) => driver.identifications_left(),
        }
    }
}
