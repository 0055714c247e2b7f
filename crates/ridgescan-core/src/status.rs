//! Outcome codes reported by the capture engine.
//!
//! Every engine call finishes with a [`StatusCode`]. The numeric values and
//! description strings are fixed by the engine's native API and must not be
//! changed: callers persist raw codes in logs and match on them across
//! process boundaries.
//!
//! Codes `0..=12` are general API results; codes `201..=208` are frame
//! source (device) results. Values the engine may add in future firmware
//! are preserved losslessly through [`StatusCode::Other`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result code of a capture engine call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCode {
    /// The call completed successfully.
    Ok,
    /// The engine could not allocate working memory.
    NoMemory,
    /// A parameter was missing or out of range.
    InvalidArgument,
    /// The engine was already initialized by this operation.
    AlreadyInUse,
    /// The supplied base template was built for a different purpose.
    InvalidPurpose,
    /// Internal engine or host system error.
    InternalError,
    /// The capture itself failed.
    UnableToCapture,
    /// The operation was cancelled through the progress callback.
    CanceledByUser,
    /// The per-operation retry budget was exhausted.
    NoMoreRetries,
    /// Successive samples did not agree with each other.
    InconsistentSampling,
    /// The trial engine build hit its usage ceiling.
    TrialExpired,
    /// No frame source was configured before capturing.
    FrameSourceNotSet,
    /// The frame source device is not connected.
    DeviceNotConnected,
    /// The frame source device reported a hardware failure.
    DeviceFailure,
    /// The frame source produced an empty frame.
    EmptyFrame,
    /// A fake (non-live) source was detected.
    FakeSource,
    /// The connected device is not supported by the engine.
    IncompatibleHardware,
    /// The connected device runs unsupported firmware.
    IncompatibleFirmware,
    /// The frame source changed while an operation was running.
    FrameSourceChanged,
    /// A raw code this build does not know. Kept verbatim.
    Other(i32),
}

impl StatusCode {
    /// Canonical constructor from a raw engine code.
    ///
    /// Total: unknown values land in [`StatusCode::Other`] and survive a
    /// trip back through [`as_raw`](Self::as_raw) unchanged.
    #[must_use]
    pub fn from_raw(value: i32) -> Self {
        match value {
            0 => StatusCode::Ok,
            2 => StatusCode::NoMemory,
            3 => StatusCode::InvalidArgument,
            4 => StatusCode::AlreadyInUse,
            5 => StatusCode::InvalidPurpose,
            6 => StatusCode::InternalError,
            7 => StatusCode::UnableToCapture,
            8 => StatusCode::CanceledByUser,
            9 => StatusCode::NoMoreRetries,
            11 => StatusCode::InconsistentSampling,
            12 => StatusCode::TrialExpired,
            201 => StatusCode::FrameSourceNotSet,
            202 => StatusCode::DeviceNotConnected,
            203 => StatusCode::DeviceFailure,
            204 => StatusCode::EmptyFrame,
            205 => StatusCode::FakeSource,
            206 => StatusCode::IncompatibleHardware,
            207 => StatusCode::IncompatibleFirmware,
            208 => StatusCode::FrameSourceChanged,
            other => StatusCode::Other(other),
        }
    }

    /// Raw engine code for this status.
    #[must_use]
    pub fn as_raw(self) -> i32 {
        match self {
            StatusCode::Ok => 0,
            StatusCode::NoMemory => 2,
            StatusCode::InvalidArgument => 3,
            StatusCode::AlreadyInUse => 4,
            StatusCode::InvalidPurpose => 5,
            StatusCode::InternalError => 6,
            StatusCode::UnableToCapture => 7,
            StatusCode::CanceledByUser => 8,
            StatusCode::NoMoreRetries => 9,
            StatusCode::InconsistentSampling => 11,
            StatusCode::TrialExpired => 12,
            StatusCode::FrameSourceNotSet => 201,
            StatusCode::DeviceNotConnected => 202,
            StatusCode::DeviceFailure => 203,
            StatusCode::EmptyFrame => 204,
            StatusCode::FakeSource => 205,
            StatusCode::IncompatibleHardware => 206,
            StatusCode::IncompatibleFirmware => 207,
            StatusCode::FrameSourceChanged => 208,
            StatusCode::Other(other) => other,
        }
    }

    /// Fixed human-readable description, matching the engine's own wording.
    #[must_use]
    pub fn description(self) -> String {
        match self {
            StatusCode::Ok => "The function is completed successfully.".to_string(),
            StatusCode::NoMemory => {
                "There is not enough memory to continue the execution of a program.".to_string()
            }
            StatusCode::InvalidArgument => {
                "Some parameters were not specified or had invalid values.".to_string()
            }
            StatusCode::AlreadyInUse => {
                "The current operation has already initialized the API.".to_string()
            }
            StatusCode::InvalidPurpose => "Base template is not correspond purpose.".to_string(),
            StatusCode::InternalError => "Internal SDK or Win32 API system error.".to_string(),
            StatusCode::UnableToCapture => "Unable to capture.".to_string(),
            StatusCode::CanceledByUser => "User canceled operation.".to_string(),
            StatusCode::NoMoreRetries => "Number of retries is overflow.".to_string(),
            StatusCode::InconsistentSampling => "Source sampling is inconsistent.".to_string(),
            StatusCode::TrialExpired => {
                "Trial limitation - only 1000 templates may be verified/identified.".to_string()
            }
            StatusCode::FrameSourceNotSet => "Frame source not set.".to_string(),
            StatusCode::DeviceNotConnected => {
                "The frame source device is not connected.".to_string()
            }
            StatusCode::DeviceFailure => "Device failure.".to_string(),
            StatusCode::EmptyFrame => "Empty frame.".to_string(),
            StatusCode::FakeSource => "Fake source.".to_string(),
            StatusCode::IncompatibleHardware => "Incompatible hardware.".to_string(),
            StatusCode::IncompatibleFirmware => "Incompatible firmware.".to_string(),
            StatusCode::FrameSourceChanged => "Frame source has been changed.".to_string(),
            StatusCode::Other(code) => format!("Unknown error code {code}."),
        }
    }

    /// Returns `true` for the success code.
    #[inline]
    #[must_use]
    pub fn is_ok(self) -> bool {
        matches!(self, StatusCode::Ok)
    }

    /// Returns `true` for codes reported by the frame source device rather
    /// than the engine core.
    #[inline]
    #[must_use]
    pub fn is_device_code(self) -> bool {
        (201..=208).contains(&self.as_raw())
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, StatusCode::Ok)]
    #[case(2, StatusCode::NoMemory)]
    #[case(3, StatusCode::InvalidArgument)]
    #[case(4, StatusCode::AlreadyInUse)]
    #[case(5, StatusCode::InvalidPurpose)]
    #[case(6, StatusCode::InternalError)]
    #[case(7, StatusCode::UnableToCapture)]
    #[case(8, StatusCode::CanceledByUser)]
    #[case(9, StatusCode::NoMoreRetries)]
    #[case(11, StatusCode::InconsistentSampling)]
    #[case(12, StatusCode::TrialExpired)]
    #[case(201, StatusCode::FrameSourceNotSet)]
    #[case(202, StatusCode::DeviceNotConnected)]
    #[case(203, StatusCode::DeviceFailure)]
    #[case(204, StatusCode::EmptyFrame)]
    #[case(205, StatusCode::FakeSource)]
    #[case(206, StatusCode::IncompatibleHardware)]
    #[case(207, StatusCode::IncompatibleFirmware)]
    #[case(208, StatusCode::FrameSourceChanged)]
    fn test_known_codes_round_trip(#[case] raw: i32, #[case] expected: StatusCode) {
        let code = StatusCode::from_raw(raw);
        assert_eq!(code, expected);
        assert_eq!(code.as_raw(), raw);
    }

    #[rstest]
    #[case(1)] // gap below NoMemory
    #[case(10)] // gap between NoMoreRetries and InconsistentSampling
    #[case(199)]
    #[case(999)]
    #[case(-5)]
    fn test_unknown_codes_survive(#[case] raw: i32) {
        let code = StatusCode::from_raw(raw);
        assert_eq!(code, StatusCode::Other(raw));
        assert_eq!(code.as_raw(), raw);
        assert_eq!(code.description(), format!("Unknown error code {raw}."));
    }

    #[test]
    fn test_descriptions_match_engine_wording() {
        assert_eq!(
            StatusCode::Ok.description(),
            "The function is completed successfully."
        );
        assert_eq!(
            StatusCode::CanceledByUser.description(),
            "User canceled operation."
        );
        assert_eq!(
            StatusCode::TrialExpired.description(),
            "Trial limitation - only 1000 templates may be verified/identified."
        );
        assert_eq!(
            StatusCode::DeviceNotConnected.description(),
            "The frame source device is not connected."
        );
    }

    #[test]
    fn test_device_code_classification() {
        assert!(StatusCode::DeviceNotConnected.is_device_code());
        assert!(StatusCode::FrameSourceChanged.is_device_code());
        assert!(!StatusCode::Ok.is_device_code());
        assert!(!StatusCode::TrialExpired.is_device_code());
        assert!(StatusCode::Other(205).is_device_code());
    }

    #[test]
    fn test_display_uses_description() {
        assert_eq!(
            StatusCode::UnableToCapture.to_string(),
            "Unable to capture."
        );
    }
}
