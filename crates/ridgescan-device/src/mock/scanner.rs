//! Scripted mock scanner for testing and development.
//!
//! [`MockScanner`] implements [`CaptureDriver`] by replaying operator-queued
//! scripts instead of touching hardware. Its paired [`MockScannerHandle`]
//! queues one script per upcoming call, injects faults and inspects a log
//! of every call with enter/exit instants, which lets tests assert that
//! calls never overlapped in time.
//!
//! Scripts can pace their progress events (`event_gap`) and dwell inside
//! the call (`hold`) to simulate a slow device, which is how cancellation
//! latency and call serialization are exercised without real hardware.
//!
//! A call whose script requests a panic leaves no log record; the log only
//! ever holds completed calls.

use ridgescan_core::{
    CaptureConfig, StatusCode, constants::UNLIMITED_IDENTIFICATIONS,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use crate::progress::{ProgressChannel, ProgressEvent};
use crate::traits::CaptureDriver;
use crate::types::{BaseTemplateReply, EnrollReply, IdentifyRecord, IdentifyReply, VerifyReply};

/// One scripted engine call: the progress events to deliver, the reply to
/// return, and optional pacing or fault injection.
#[derive(Debug, Clone)]
pub struct Script<R> {
    /// Progress events delivered in order before the call returns.
    pub events: Vec<ProgressEvent>,
    /// Reply returned when the call runs to completion.
    pub reply: R,
    /// Dwell inside the call after the last event, simulating device time.
    pub hold: Duration,
    /// Pause before each progress event.
    pub event_gap: Duration,
    /// Panic with this message instead of running, simulating a crashing
    /// driver binding.
    pub panic_message: Option<String>,
}

impl<R> Script<R> {
    /// Script that immediately returns `reply` with no events.
    #[must_use]
    pub fn new(reply: R) -> Self {
        Script {
            events: Vec::new(),
            reply,
            hold: Duration::ZERO,
            event_gap: Duration::ZERO,
            panic_message: None,
        }
    }

    /// Append a progress event.
    #[must_use]
    pub fn event(mut self, event: ProgressEvent) -> Self {
        self.events.push(event);
        self
    }

    /// Dwell inside the call for `hold` after the events.
    #[must_use]
    pub fn hold(mut self, hold: Duration) -> Self {
        self.hold = hold;
        self
    }

    /// Pause for `gap` before each progress event.
    #[must_use]
    pub fn event_gap(mut self, gap: Duration) -> Self {
        self.event_gap = gap;
        self
    }

    /// Panic with `message` instead of running the script.
    #[must_use]
    pub fn panics(mut self, message: impl Into<String>) -> Self {
        self.panic_message = Some(message.into());
        self
    }
}

/// Script for an enrollment call.
pub type EnrollScript = Script<EnrollReply>;

/// Script for a verification call.
pub type VerifyScript = Script<VerifyReply>;

/// Script for a base-template acquisition call.
pub type BaseTemplateScript = Script<BaseTemplateReply>;

/// Reply behavior the generic script runner needs from each reply type.
trait ScriptReply {
    /// Reply for a call stopped through the progress callback.
    fn on_cancel() -> Self;
    /// Reply for a call nobody queued a script for.
    fn unscripted() -> Self;
}

impl ScriptReply for EnrollReply {
    fn on_cancel() -> Self {
        EnrollReply::cancelled()
    }
    fn unscripted() -> Self {
        EnrollReply::failed(StatusCode::UnableToCapture)
    }
}

impl ScriptReply for VerifyReply {
    fn on_cancel() -> Self {
        VerifyReply::cancelled()
    }
    fn unscripted() -> Self {
        VerifyReply::failed(StatusCode::UnableToCapture)
    }
}

impl ScriptReply for BaseTemplateReply {
    fn on_cancel() -> Self {
        BaseTemplateReply::cancelled()
    }
    fn unscripted() -> Self {
        BaseTemplateReply::failed(StatusCode::UnableToCapture)
    }
}

/// Which driver entry point a call record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Initialize,
    Terminate,
    Enroll,
    Verify,
    BaseTemplate,
    Identify,
}

/// One completed driver call with its wall-clock span.
#[derive(Debug, Clone, Copy)]
pub struct CallRecord {
    /// Entry point the call went through.
    pub kind: CallKind,
    /// When the call entered the driver.
    pub entered: Instant,
    /// When the call left the driver.
    pub exited: Instant,
}

impl CallRecord {
    /// Returns `true` if the two call spans overlap in time.
    #[must_use]
    pub fn overlaps(&self, other: &CallRecord) -> bool {
        self.entered < other.exited && other.entered < self.exited
    }
}

#[derive(Debug)]
struct MockState {
    init_status: StatusCode,
    init_count: u32,
    terminate_count: u32,
    trial: bool,
    identifications_left: i32,
    enroll_scripts: VecDeque<EnrollScript>,
    verify_scripts: VecDeque<VerifyScript>,
    base_template_scripts: VecDeque<BaseTemplateScript>,
    identify_scripts: VecDeque<IdentifyReply>,
    calls: Vec<CallRecord>,
}

impl Default for MockState {
    fn default() -> Self {
        MockState {
            init_status: StatusCode::Ok,
            init_count: 0,
            terminate_count: 0,
            trial: false,
            identifications_left: UNLIMITED_IDENTIFICATIONS,
            enroll_scripts: VecDeque::new(),
            verify_scripts: VecDeque::new(),
            base_template_scripts: VecDeque::new(),
            identify_scripts: VecDeque::new(),
            calls: Vec::new(),
        }
    }
}

fn lock_state(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Scripted mock scanner.
///
/// # Examples
///
/// ```
/// use ridgescan_core::CaptureConfig;
/// use ridgescan_device::mock::{EnrollScript, MockScanner};
/// use ridgescan_device::progress::{CaptureDecision, ProgressChannel, ProgressEvent};
/// use ridgescan_device::traits::CaptureDriver;
/// use ridgescan_device::types::{CapturedTemplate, EnrollReply};
///
/// struct KeepGoing;
/// impl ProgressChannel for KeepGoing {
///     fn on_event(&mut self, _event: ProgressEvent) -> CaptureDecision {
///         CaptureDecision::Continue
///     }
/// }
///
/// let (mut scanner, handle) = MockScanner::new();
/// let capture = CapturedTemplate::new(vec![1, 2, 3], 9).unwrap();
/// handle.queue_enroll(EnrollScript::new(EnrollReply::ok(capture)));
///
/// let reply = scanner.enroll(&CaptureConfig::default(), &mut KeepGoing);
/// assert!(reply.status.is_ok());
/// assert_eq!(handle.calls().len(), 1);
/// ```
#[derive(Debug)]
pub struct MockScanner {
    state: Arc<Mutex<MockState>>,
}

impl MockScanner {
    /// Create a mock scanner and the handle that controls it.
    pub fn new() -> (Self, MockScannerHandle) {
        let state = Arc::new(Mutex::new(MockState::default()));
        let scanner = MockScanner {
            state: Arc::clone(&state),
        };
        (scanner, MockScannerHandle { state })
    }

    fn run_script<R: ScriptReply>(
        &self,
        kind: CallKind,
        script: Option<Script<R>>,
        channel: &mut dyn ProgressChannel,
    ) -> R {
        let entered = Instant::now();
        let script = script.unwrap_or_else(|| Script::new(R::unscripted()));

        if let Some(message) = script.panic_message {
            panic!("{message}");
        }

        let mut reply = script.reply;
        let mut cancelled = false;
        for event in script.events {
            if !script.event_gap.is_zero() {
                thread::sleep(script.event_gap);
            }
            if channel.on_event(event).is_cancel() {
                reply = R::on_cancel();
                cancelled = true;
                break;
            }
        }

        if !cancelled && !script.hold.is_zero() {
            thread::sleep(script.hold);
        }

        lock_state(&self.state).calls.push(CallRecord {
            kind,
            entered,
            exited: Instant::now(),
        });
        reply
    }
}

impl Default for MockScanner {
    fn default() -> Self {
        Self::new().0
    }
}

impl CaptureDriver for MockScanner {
    fn initialize(&mut self) -> StatusCode {
        let entered = Instant::now();
        let mut state = lock_state(&self.state);
        state.init_count += 1;
        let status = state.init_status;
        state.calls.push(CallRecord {
            kind: CallKind::Initialize,
            entered,
            exited: Instant::now(),
        });
        status
    }

    fn terminate(&mut self) {
        let entered = Instant::now();
        let mut state = lock_state(&self.state);
        state.terminate_count += 1;
        state.calls.push(CallRecord {
            kind: CallKind::Terminate,
            entered,
            exited: Instant::now(),
        });
    }

    fn enroll(
        &mut self,
        _config: &CaptureConfig,
        channel: &mut dyn ProgressChannel,
    ) -> EnrollReply {
        let script = lock_state(&self.state).enroll_scripts.pop_front();
        self.run_script(CallKind::Enroll, script, channel)
    }

    fn verify(
        &mut self,
        _config: &CaptureConfig,
        _base_template: &[u8],
        channel: &mut dyn ProgressChannel,
    ) -> VerifyReply {
        let script = lock_state(&self.state).verify_scripts.pop_front();
        self.run_script(CallKind::Verify, script, channel)
    }

    fn build_base_template(
        &mut self,
        _config: &CaptureConfig,
        channel: &mut dyn ProgressChannel,
    ) -> BaseTemplateReply {
        let script = lock_state(&self.state).base_template_scripts.pop_front();
        self.run_script(CallKind::BaseTemplate, script, channel)
    }

    fn identify(
        &mut self,
        _config: &CaptureConfig,
        _base_template: &[u8],
        _records: &[IdentifyRecord],
    ) -> IdentifyReply {
        let entered = Instant::now();
        let mut state = lock_state(&self.state);
        let reply = if state.trial && state.identifications_left <= 0 {
            IdentifyReply::failed(StatusCode::TrialExpired)
        } else {
            if state.trial {
                state.identifications_left -= 1;
            }
            state
                .identify_scripts
                .pop_front()
                .unwrap_or_else(|| IdentifyReply::failed(StatusCode::UnableToCapture))
        };
        state.calls.push(CallRecord {
            kind: CallKind::Identify,
            entered,
            exited: Instant::now(),
        });
        reply
    }

    fn is_trial(&self) -> bool {
        lock_state(&self.state).trial
    }

    fn identifications_left(&self) -> i32 {
        lock_state(&self.state).identifications_left
    }
}

/// Handle for controlling a [`MockScanner`].
///
/// Clones share the same scanner state, so a handle can be kept on the test
/// thread while the scanner itself lives inside the runtime.
#[derive(Debug, Clone)]
pub struct MockScannerHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockScannerHandle {
    /// Queue the script for the next enrollment call.
    pub fn queue_enroll(&self, script: EnrollScript) {
        lock_state(&self.state).enroll_scripts.push_back(script);
    }

    /// Queue the script for the next verification call.
    pub fn queue_verify(&self, script: VerifyScript) {
        lock_state(&self.state).verify_scripts.push_back(script);
    }

    /// Queue the script for the next base-template acquisition call.
    pub fn queue_base_template(&self, script: BaseTemplateScript) {
        lock_state(&self.state)
            .base_template_scripts
            .push_back(script);
    }

    /// Queue the reply for the next identification call.
    pub fn queue_identify(&self, reply: IdentifyReply) {
        lock_state(&self.state).identify_scripts.push_back(reply);
    }

    /// Make future `initialize` calls return `status`.
    pub fn set_init_status(&self, status: StatusCode) {
        lock_state(&self.state).init_status = status;
    }

    /// Turn the scanner into a trial build with `identifications_left`
    /// identifications remaining.
    pub fn set_trial(&self, identifications_left: i32) {
        let mut state = lock_state(&self.state);
        state.trial = true;
        state.identifications_left = identifications_left;
    }

    /// How many times `initialize` has been called.
    #[must_use]
    pub fn init_count(&self) -> u32 {
        lock_state(&self.state).init_count
    }

    /// How many times `terminate` has been called.
    #[must_use]
    pub fn terminate_count(&self) -> u32 {
        lock_state(&self.state).terminate_count
    }

    /// Snapshot of every completed call in order.
    #[must_use]
    pub fn calls(&self) -> Vec<CallRecord> {
        lock_state(&self.state).calls.clone()
    }

    /// Snapshot of completed calls of one kind.
    #[must_use]
    pub fn calls_of(&self, kind: CallKind) -> Vec<CallRecord> {
        lock_state(&self.state)
            .calls
            .iter()
            .filter(|record| record.kind == kind)
            .copied()
            .collect()
    }
}
