//! Common test utilities for session integration tests.
//!
//! Provides an isolated runtime over the scripted mock scanner, a recording
//! observer that exposes completion events through a channel, and builders
//! for the progress events the mock replays during captures.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use ridgescan_device::drivers::AnyCaptureDriver;
use ridgescan_device::mock::{MockScanner, MockScannerHandle};
use ridgescan_device::progress::{CaptureProgress, Frame, ProgressEvent, ScanSignal};
use ridgescan_device::types::CapturedTemplate;
use ridgescan_session::{CompletionEvent, OperationObserver, ScannerRuntime};

/// Upper bound for waiting on a mocked operation; generous so slow CI
/// machines never flake.
pub const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Build an isolated runtime over a fresh scripted mock scanner.
pub fn mock_runtime() -> (Arc<ScannerRuntime>, MockScannerHandle) {
    let (scanner, handle) = MockScanner::new();
    (ScannerRuntime::new(AnyCaptureDriver::Mock(scanner)), handle)
}

/// A capture artifact with recognizable bytes for assertions.
pub fn sample_capture(fill: u8, quality: u8) -> CapturedTemplate {
    CapturedTemplate::new(vec![fill; 32], quality).expect("Test helper: invalid sample quality")
}

/// Progress event carrying a touch-sensor signal.
pub fn touch_event(count: u32, total: u32) -> ProgressEvent {
    ProgressEvent::new(CaptureProgress::new(count, total)).with_signal(ScanSignal::TouchSensor)
}

/// Progress event carrying a take-off signal.
pub fn take_off_event(count: u32, total: u32) -> ProgressEvent {
    ProgressEvent::new(CaptureProgress::new(count, total)).with_signal(ScanSignal::TakeOff)
}

/// Progress event carrying a small preview frame.
pub fn frame_event(count: u32, total: u32) -> ProgressEvent {
    let frame = Frame::new(4, 4, vec![0x80; 16]).expect("Test helper: invalid frame buffer");
    ProgressEvent::new(CaptureProgress::new(count, total)).with_frame(frame)
}

/// Observer that counts progress callbacks and forwards events.
///
/// Completion events go out on the completion channel; every touch-sensor
/// callback additionally pings the progress channel, letting a test block
/// until the capture is demonstrably inside its event loop.
pub struct RecordingObserver {
    completion_tx: Sender<CompletionEvent>,
    progress_tx: Sender<u32>,
    pub touches: AtomicU32,
    pub take_offs: AtomicU32,
    pub frames: AtomicU32,
    pub completions: AtomicU32,
}

impl RecordingObserver {
    /// Build an observer plus the receivers for its two channels.
    pub fn channels() -> (Arc<Self>, Receiver<CompletionEvent>, Receiver<u32>) {
        let (completion_tx, completion_rx) = mpsc::channel();
        let (progress_tx, progress_rx) = mpsc::channel();
        let observer = Arc::new(RecordingObserver {
            completion_tx,
            progress_tx,
            touches: AtomicU32::new(0),
            take_offs: AtomicU32::new(0),
            frames: AtomicU32::new(0),
            completions: AtomicU32::new(0),
        });
        (observer, completion_rx, progress_rx)
    }

    /// Build an observer when only the completion channel matters.
    pub fn completion_only() -> (Arc<Self>, Receiver<CompletionEvent>) {
        let (observer, completion_rx, _progress_rx) = Self::channels();
        (observer, completion_rx)
    }
}

impl OperationObserver for RecordingObserver {
    fn on_touch_sensor(&self, progress: &CaptureProgress) {
        self.touches.fetch_add(1, Ordering::SeqCst);
        let _ = self.progress_tx.send(progress.count);
    }

    fn on_take_off(&self, _progress: &CaptureProgress) {
        self.take_offs.fetch_add(1, Ordering::SeqCst);
    }

    fn on_frame(&self, _frame: &Frame) {
        self.frames.fetch_add(1, Ordering::SeqCst);
    }

    fn on_complete(&self, event: CompletionEvent) {
        self.completions.fetch_add(1, Ordering::SeqCst);
        let _ = self.completion_tx.send(event);
    }
}

/// Wait for the single completion event of one started operation.
pub fn wait_complete(rx: &Receiver<CompletionEvent>) -> CompletionEvent {
    rx.recv_timeout(EVENT_TIMEOUT)
        .expect("Test helper: operation did not complete in time")
}
