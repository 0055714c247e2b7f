//! Capture driver trait definition.
//!
//! [`CaptureDriver`] is the contract between the coordination layer and a
//! concrete capture engine binding. The coordination layer owns exactly one
//! driver per process, serializes every call to it, and pairs
//! `initialize`/`terminate` around the lifetime of all live sessions.
//! Drivers can therefore be written without any internal locking.
//!
//! Long calls (`enroll`, `verify`, `build_base_template`) drive the
//! supplied [`ProgressChannel`] synchronously and honour a
//! [`CaptureDecision::Cancel`](crate::progress::CaptureDecision) answer by
//! finishing with `CanceledByUser`. `identify` is a pure comparison pass
//! and reports no progress.
//!
//! Driver methods return reply structs carrying a [`StatusCode`] instead of
//! `Result`: every engine outcome, including failure codes, is ordinary
//! data to the coordination layer.

use ridgescan_core::{CaptureConfig, StatusCode};

use crate::progress::ProgressChannel;
use crate::types::{BaseTemplateReply, EnrollReply, IdentifyRecord, IdentifyReply, VerifyReply};

/// A concrete binding to one fingerprint capture engine.
///
/// `Send` is required because the coordination layer runs long calls on a
/// worker thread while the driver itself lives inside a process-wide mutex.
pub trait CaptureDriver: Send {
    /// Bring the engine up. Called once before the first operation of the
    /// first live session.
    ///
    /// A non-[`Ok`](StatusCode::Ok) code means the engine is unusable and
    /// `terminate` will not be called for this attempt.
    fn initialize(&mut self) -> StatusCode;

    /// Tear the engine down. Called once after the last live session ends.
    fn terminate(&mut self);

    /// Capture and combine samples into one enrollment template.
    fn enroll(
        &mut self,
        config: &CaptureConfig,
        channel: &mut dyn ProgressChannel,
    ) -> EnrollReply;

    /// Capture a live sample and compare it against `base_template`.
    fn verify(
        &mut self,
        config: &CaptureConfig,
        base_template: &[u8],
        channel: &mut dyn ProgressChannel,
    ) -> VerifyReply;

    /// Capture a live sample and condense it into a base template for later
    /// identification runs.
    fn build_base_template(
        &mut self,
        config: &CaptureConfig,
        channel: &mut dyn ProgressChannel,
    ) -> BaseTemplateReply;

    /// Compare a previously acquired base template against stored records.
    ///
    /// Returns the index of the matched record, -1 for no match. Does not
    /// touch the sensor.
    fn identify(
        &mut self,
        config: &CaptureConfig,
        base_template: &[u8],
        records: &[IdentifyRecord],
    ) -> IdentifyReply;

    /// Whether this engine build is a trial build with a usage ceiling.
    fn is_trial(&self) -> bool;

    /// Identifications left before a trial build expires.
    /// [`UNLIMITED_IDENTIFICATIONS`](ridgescan_core::constants::UNLIMITED_IDENTIFICATIONS)
    /// for full builds.
    fn identifications_left(&self) -> i32;
}
