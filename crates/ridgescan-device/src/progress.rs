//! Progress reporting protocol between a running capture and its caller.
//!
//! Long engine calls (enrollment, verification, base template acquisition)
//! report intermediate results through a synchronous callback: for every
//! sample the engine delivers a [`ProgressEvent`] and waits for the caller's
//! [`CaptureDecision`] before continuing. Cancellation therefore takes
//! effect within one callback interval, never later.
//!
//! Events optionally carry a [`ScanSignal`] (user guidance: touch the
//! sensor, take the finger off, fake source detected) and a preview
//! [`Frame`]. The [`ProgressEvent::state_mask`] bit set mirrors the
//! engine's wire encoding of which parts are present.

use ridgescan_core::{
    Error, Result,
    constants::{STATE_MASK_FRAME, STATE_MASK_SIGNAL},
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sample counters attached to every progress event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureProgress {
    /// Samples taken so far, including this one.
    pub count: u32,
    /// This sample repeats an earlier one (the finger did not change).
    pub repeated: bool,
    /// Samples the operation wants in total.
    pub total: u32,
}

impl CaptureProgress {
    /// Progress counters for sample `count` of `total`.
    #[must_use]
    pub fn new(count: u32, total: u32) -> Self {
        CaptureProgress {
            count,
            repeated: false,
            total,
        }
    }

    /// Mark this sample as a repeat of the previous one.
    #[must_use]
    pub fn repeated(mut self) -> Self {
        self.repeated = true;
        self
    }
}

impl fmt::Display for CaptureProgress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.repeated {
            write!(f, "sample {}/{} (repeated)", self.count, self.total)
        } else {
            write!(f, "sample {}/{}", self.count, self.total)
        }
    }
}

/// User guidance signal raised by the scanner during a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
#[serde(rename_all = "snake_case")]
pub enum ScanSignal {
    /// Put a finger on the sensor.
    TouchSensor = 1,
    /// Take the finger off the sensor.
    TakeOff = 2,
    /// The sample looks like a fake (non-live) source.
    FakeSource = 3,
}

impl ScanSignal {
    /// Create a signal from its wire value.
    ///
    /// # Errors
    /// Returns `Error::InvalidArgument` if the value is not 1, 2 or 3.
    #[inline]
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            1 => Ok(ScanSignal::TouchSensor),
            2 => Ok(ScanSignal::TakeOff),
            3 => Ok(ScanSignal::FakeSource),
            _ => Err(Error::invalid_argument(format!(
                "Invalid scan signal value: {value}"
            ))),
        }
    }

    /// Wire value of this signal.
    #[inline]
    #[must_use]
    pub fn to_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for ScanSignal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ScanSignal::TouchSensor => write!(f, "touch sensor"),
            ScanSignal::TakeOff => write!(f, "take finger off"),
            ScanSignal::FakeSource => write!(f, "fake source"),
        }
    }
}

/// Caller's answer to a progress event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
#[serde(rename_all = "snake_case")]
pub enum CaptureDecision {
    /// Stop the operation; it finishes with `CanceledByUser`.
    Cancel = 1,
    /// Keep capturing.
    Continue = 2,
}

impl CaptureDecision {
    /// Create a decision from its wire value.
    ///
    /// # Errors
    /// Returns `Error::InvalidArgument` if the value is not 1 or 2.
    #[inline]
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            1 => Ok(CaptureDecision::Cancel),
            2 => Ok(CaptureDecision::Continue),
            _ => Err(Error::invalid_argument(format!(
                "Invalid capture decision value: {value}"
            ))),
        }
    }

    /// Wire value of this decision.
    #[inline]
    #[must_use]
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Returns `true` for [`CaptureDecision::Cancel`].
    #[inline]
    #[must_use]
    pub fn is_cancel(self) -> bool {
        matches!(self, CaptureDecision::Cancel)
    }
}

/// Raw preview frame delivered alongside a progress event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// 8-bit grayscale pixels, row-major, `width * height` bytes.
    pub pixels: Vec<u8>,
}

impl Frame {
    /// Create a frame, checking that the pixel buffer matches the
    /// dimensions.
    ///
    /// # Errors
    /// Returns `Error::InvalidArgument` if `pixels.len()` is not
    /// `width * height`.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(Error::invalid_argument(format!(
                "Frame buffer is {} bytes, {width}x{height} needs {expected}",
                pixels.len()
            )));
        }
        Ok(Frame {
            width,
            height,
            pixels,
        })
    }
}

/// One progress callback's payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Sample counters, always present.
    pub progress: CaptureProgress,
    /// Guidance signal, if the scanner raised one.
    pub signal: Option<ScanSignal>,
    /// Preview frame, if the engine attached one.
    pub frame: Option<Frame>,
}

impl ProgressEvent {
    /// Event carrying only progress counters.
    #[must_use]
    pub fn new(progress: CaptureProgress) -> Self {
        ProgressEvent {
            progress,
            signal: None,
            frame: None,
        }
    }

    /// Attach a guidance signal.
    #[must_use]
    pub fn with_signal(mut self, signal: ScanSignal) -> Self {
        self.signal = Some(signal);
        self
    }

    /// Attach a preview frame.
    #[must_use]
    pub fn with_frame(mut self, frame: Frame) -> Self {
        self.frame = Some(frame);
        self
    }

    /// Wire bit set describing which optional parts are present.
    #[must_use]
    pub fn state_mask(&self) -> u8 {
        let mut mask = 0;
        if self.frame.is_some() {
            mask |= STATE_MASK_FRAME;
        }
        if self.signal.is_some() {
            mask |= STATE_MASK_SIGNAL;
        }
        mask
    }
}

/// Receiver side of the progress protocol.
///
/// Implementations are driven synchronously from inside an engine call: the
/// call does not proceed until `on_event` returns. Returning
/// [`CaptureDecision::Cancel`] makes the engine finish the operation with
/// `CanceledByUser`.
pub trait ProgressChannel {
    /// Handle one progress event and decide whether to keep going.
    fn on_event(&mut self, event: ProgressEvent) -> CaptureDecision;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, ScanSignal::TouchSensor)]
    #[case(2, ScanSignal::TakeOff)]
    #[case(3, ScanSignal::FakeSource)]
    fn test_scan_signal_wire_values(#[case] raw: u8, #[case] expected: ScanSignal) {
        assert_eq!(ScanSignal::from_u8(raw).unwrap(), expected);
        assert_eq!(expected.to_u8(), raw);
    }

    #[rstest]
    #[case(0)]
    #[case(4)]
    fn test_scan_signal_rejects_unknown(#[case] raw: u8) {
        assert!(ScanSignal::from_u8(raw).is_err());
    }

    #[test]
    fn test_capture_decision_wire_values() {
        assert_eq!(
            CaptureDecision::from_u8(1).unwrap(),
            CaptureDecision::Cancel
        );
        assert_eq!(
            CaptureDecision::from_u8(2).unwrap(),
            CaptureDecision::Continue
        );
        assert!(CaptureDecision::from_u8(0).is_err());
        assert!(CaptureDecision::Cancel.is_cancel());
        assert!(!CaptureDecision::Continue.is_cancel());
    }

    #[test]
    fn test_frame_validates_buffer_length() {
        assert!(Frame::new(4, 4, vec![0; 16]).is_ok());
        assert!(Frame::new(4, 4, vec![0; 15]).is_err());
        assert!(Frame::new(0, 0, Vec::new()).is_ok());
    }

    #[test]
    fn test_state_mask_tracks_attachments() {
        let progress = CaptureProgress::new(1, 5);

        let bare = ProgressEvent::new(progress);
        assert_eq!(bare.state_mask(), 0x00);

        let with_signal = ProgressEvent::new(progress).with_signal(ScanSignal::TouchSensor);
        assert_eq!(with_signal.state_mask(), 0x02);

        let with_frame =
            ProgressEvent::new(progress).with_frame(Frame::new(2, 2, vec![0; 4]).unwrap());
        assert_eq!(with_frame.state_mask(), 0x01);

        let with_both = with_frame.with_signal(ScanSignal::TakeOff);
        assert_eq!(with_both.state_mask(), 0x03);
    }

    #[test]
    fn test_progress_display() {
        assert_eq!(CaptureProgress::new(2, 5).to_string(), "sample 2/5");
        assert_eq!(
            CaptureProgress::new(2, 5).repeated().to_string(),
            "sample 2/5 (repeated)"
        );
    }
}
