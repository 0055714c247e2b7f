//! Integration tests for runtime lifecycle and session disposal.
//!
//! Covers the shared-count invariant (the engine is initialized exactly
//! while at least one session is live), failure and recovery of the first
//! initialization, disposal semantics and drop-based cleanup.

mod common;

use std::sync::Arc;
use std::time::Duration;

use ridgescan_core::{Error, StatusCode};
use ridgescan_device::mock::EnrollScript;
use ridgescan_device::types::EnrollReply;
use ridgescan_session::{Enrollment, Identification, ScannerSession, Verification};

use common::{RecordingObserver, mock_runtime, sample_capture, touch_event, wait_complete};

#[test]
fn test_engine_initialized_once_for_many_sessions() {
    let (runtime, handle) = mock_runtime();

    let enrollment = Enrollment::new(Arc::clone(&runtime)).unwrap();
    let verification = Verification::new(Arc::clone(&runtime), &[1, 2, 3]).unwrap();
    let identification = Identification::new(Arc::clone(&runtime)).unwrap();

    assert_eq!(handle.init_count(), 1);
    assert_eq!(runtime.live_sessions(), 3);

    enrollment.dispose();
    verification.dispose();
    assert_eq!(handle.terminate_count(), 0);

    identification.dispose();
    assert_eq!(handle.terminate_count(), 1);
    assert_eq!(runtime.live_sessions(), 0);
}

#[test]
fn test_disposal_is_idempotent() {
    let (runtime, handle) = mock_runtime();
    let enrollment = Enrollment::new(runtime).unwrap();

    enrollment.dispose();
    enrollment.dispose();
    enrollment.dispose();

    assert_eq!(handle.init_count(), 1);
    assert_eq!(handle.terminate_count(), 1);
}

#[test]
fn test_failed_initialization_reports_status_and_recovers() {
    let (runtime, handle) = mock_runtime();
    handle.set_init_status(StatusCode::DeviceNotConnected);

    let err = Enrollment::new(Arc::clone(&runtime)).unwrap_err();
    assert!(matches!(
        err,
        Error::Initialization(StatusCode::DeviceNotConnected)
    ));
    assert_eq!(runtime.live_sessions(), 0);

    // Reconnecting the device makes the next construction succeed.
    handle.set_init_status(StatusCode::Ok);
    let enrollment = Enrollment::new(Arc::clone(&runtime)).unwrap();
    assert_eq!(handle.init_count(), 2);
    assert_eq!(runtime.live_sessions(), 1);
    drop(enrollment);
}

#[test]
fn test_disposed_session_rejects_every_call() {
    let (runtime, handle) = mock_runtime();
    let (observer, _completions) = RecordingObserver::completion_only();
    let enrollment = Enrollment::new(runtime).unwrap();

    enrollment.dispose();

    assert!(matches!(enrollment.enroll(observer), Err(Error::Disposed)));
    assert!(matches!(enrollment.template(), Err(Error::Disposed)));
    assert!(matches!(enrollment.quality(), Err(Error::Disposed)));
    assert!(matches!(
        enrollment.set_max_models(7),
        Err(Error::Disposed)
    ));
    assert!(matches!(enrollment.far_value(), Err(Error::Disposed)));
    assert!(matches!(enrollment.current_state(), Err(Error::Disposed)));

    // Cancel stays infallible after disposal.
    enrollment.cancel();
    assert_eq!(handle.terminate_count(), 1);
}

#[test]
fn test_drop_releases_runtime_attachment() {
    let (runtime, handle) = mock_runtime();
    {
        let _outer = Enrollment::new(Arc::clone(&runtime)).unwrap();
        {
            let _inner = Identification::new(Arc::clone(&runtime)).unwrap();
        }
        // Dropping one of two sessions must not tear the engine down.
        assert_eq!(handle.terminate_count(), 0);
        assert_eq!(runtime.live_sessions(), 1);
    }
    assert_eq!(handle.terminate_count(), 1);
    assert_eq!(runtime.live_sessions(), 0);
}

#[test]
fn test_dispose_cancels_and_joins_running_worker() {
    let (runtime, handle) = mock_runtime();
    let (observer, completions, progress) = RecordingObserver::channels();
    let enrollment = Enrollment::new(Arc::clone(&runtime)).unwrap();

    // Long script: six samples 20ms apart, so disposal lands mid-capture.
    let mut script = EnrollScript::new(EnrollReply::ok(sample_capture(0x11, 7)))
        .event_gap(Duration::from_millis(20));
    for count in 1..=6 {
        script = script.event(touch_event(count, 6));
    }
    handle.queue_enroll(script);

    enrollment.enroll(observer).unwrap();
    progress
        .recv_timeout(common::EVENT_TIMEOUT)
        .expect("capture never reached its first sample");

    enrollment.dispose();

    // The worker observed the disposal cancel and still completed exactly once.
    let event = wait_complete(&completions);
    assert!(!event.succeeded());
    assert_eq!(event.status(), StatusCode::CanceledByUser);

    assert_eq!(handle.terminate_count(), 1);
    assert_eq!(runtime.live_sessions(), 0);
}
