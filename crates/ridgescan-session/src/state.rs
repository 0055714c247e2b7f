//! Session state tracking.
//!
//! This module provides the state cell that every capture session owns. The
//! state gates which operations are allowed to start and records recent
//! transitions for diagnostics.
//!
//! # States
//!
//! A session is always in one of four states:
//! - `ReadyToProcess`: idle, a primary capture operation may start
//! - `ProcessInProgress`: a primary capture operation is running on a worker thread
//! - `ReadyToContinue`: a base template is held, follow-up matching may start
//! - `ContinueInProgress`: a follow-up matching call is running
//!
//! # State Flow
//!
//! - Enrollment and verification: ReadyToProcess → ProcessInProgress → ReadyToProcess
//! - Base template acquisition: ReadyToProcess/ReadyToContinue → ProcessInProgress →
//!   ReadyToContinue (on success) or ReadyToProcess (on failure)
//! - Identification: ReadyToContinue → ContinueInProgress → ReadyToContinue
//!
//! Starting an operation is *gated*: each operation names the states it may
//! start from and is rejected with `Error::InvalidState` from any other
//! state. Completion is *unconditional*: worker threads restore the followup
//! state without re-validating, so a session never sticks in an in-progress
//! state after a failed or cancelled run.
//!
//! # Examples
//!
//! ```
//! use ridgescan_session::{OperationState, StateCell};
//!
//! let state = StateCell::new();
//! assert_eq!(state.current(), OperationState::ReadyToProcess);
//!
//! let change = state
//!     .request_start(
//!         "enroll",
//!         &[OperationState::ReadyToProcess],
//!         OperationState::ProcessInProgress,
//!     )
//!     .unwrap();
//! assert_eq!(change.from, OperationState::ReadyToProcess);
//!
//! // A second start is rejected while the first is running.
//! assert!(
//!     state
//!         .request_start(
//!             "verify",
//!             &[OperationState::ReadyToProcess],
//!             OperationState::ProcessInProgress,
//!         )
//!         .is_err()
//! );
//!
//! state.complete(OperationState::ReadyToProcess);
//! assert_eq!(state.current(), OperationState::ReadyToProcess);
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use ridgescan_core::{Error, Result};

use crate::worker::lock_ignore_poison;

/// Maximum number of state changes to keep in history.
///
/// Each change is roughly 24 bytes (two discriminants plus a timestamp), so
/// 32 entries stays well under 1KB per session while still covering more
/// than a dozen complete operation cycles for diagnostics.
const MAX_HISTORY_SIZE: usize = 32;

/// Processing states of a capture session.
///
/// The state determines which operations may start. In-progress states are
/// entered when a worker thread is spawned and left when its completion
/// callback runs, so observing an in-progress state means a device call is
/// active somewhere in the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationState {
    /// Idle; a primary capture operation may start.
    ReadyToProcess,

    /// A primary capture operation is running on a worker thread.
    ProcessInProgress,

    /// A base template is held; follow-up matching may start.
    ReadyToContinue,

    /// A follow-up matching call is running.
    ContinueInProgress,
}

impl OperationState {
    /// Check whether an operation is currently running in this state.
    ///
    /// # Examples
    ///
    /// ```
    /// use ridgescan_session::OperationState;
    ///
    /// assert!(OperationState::ProcessInProgress.is_busy());
    /// assert!(!OperationState::ReadyToContinue.is_busy());
    /// ```
    #[must_use]
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            OperationState::ProcessInProgress | OperationState::ContinueInProgress
        )
    }
}

impl fmt::Display for OperationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state_str = match self {
            OperationState::ReadyToProcess => "ReadyToProcess",
            OperationState::ProcessInProgress => "ProcessInProgress",
            OperationState::ReadyToContinue => "ReadyToContinue",
            OperationState::ContinueInProgress => "ContinueInProgress",
        };
        write!(f, "{}", state_str)
    }
}

/// A recorded state transition with wall-clock timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateChange {
    /// The state transitioned from.
    pub from: OperationState,

    /// The state transitioned to.
    pub to: OperationState,

    /// When the transition occurred.
    pub at: DateTime<Utc>,
}

impl StateChange {
    fn new(from: OperationState, to: OperationState) -> Self {
        Self {
            from,
            to,
            at: Utc::now(),
        }
    }
}

/// Thread-safe state cell shared between a session and its worker threads.
///
/// The cell combines the gate check and the transition in one lock
/// acquisition, so two threads racing to start an operation cannot both
/// pass the gate.
#[derive(Debug)]
pub struct StateCell {
    inner: Mutex<StateInner>,
}

#[derive(Debug)]
struct StateInner {
    current: OperationState,
    history: VecDeque<StateChange>,
}

impl StateCell {
    /// Create a new cell in the `ReadyToProcess` state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StateInner {
                current: OperationState::ReadyToProcess,
                history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
            }),
        }
    }

    /// Get the current state.
    #[must_use]
    pub fn current(&self) -> OperationState {
        lock_ignore_poison(&self.inner).current
    }

    /// Check that `operation` may run in the current state.
    ///
    /// Does not transition. Used for read accessors that are only meaningful
    /// in certain states, such as reading an enrollment template.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidState` naming the operation, the current state
    /// and the states it requires.
    pub fn require(&self, operation: &str, allowed: &[OperationState]) -> Result<OperationState> {
        let inner = lock_ignore_poison(&self.inner);
        check_allowed(operation, inner.current, allowed)
    }

    /// Atomically gate and start an operation.
    ///
    /// Validates that the current state is one of `allowed` and, if so,
    /// transitions to `next` in the same lock acquisition. Returns the
    /// transition record so a failed spawn can restore `from`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidState` if the current state is not in
    /// `allowed`; the state is left unchanged.
    pub fn request_start(
        &self,
        operation: &str,
        allowed: &[OperationState],
        next: OperationState,
    ) -> Result<StateChange> {
        let mut inner = lock_ignore_poison(&self.inner);
        check_allowed(operation, inner.current, allowed)?;
        let change = transition(&mut inner, next);
        debug!(operation, from = %change.from, to = %change.to, "operation started");
        Ok(change)
    }

    /// Unconditionally transition to `next`.
    ///
    /// Called from worker completion callbacks to restore the followup state.
    /// No gate is applied: completion must always succeed, including after
    /// errors, cancellation or a panicking operation.
    pub fn complete(&self, next: OperationState) -> StateChange {
        let mut inner = lock_ignore_poison(&self.inner);
        let change = transition(&mut inner, next);
        debug!(from = %change.from, to = %change.to, "operation completed");
        change
    }

    /// Get a snapshot of the recent transition history, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<StateChange> {
        lock_ignore_poison(&self.inner).history.iter().cloned().collect()
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}

fn check_allowed(
    operation: &str,
    current: OperationState,
    allowed: &[OperationState],
) -> Result<OperationState> {
    if allowed.contains(&current) {
        return Ok(current);
    }
    let expected = allowed
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" or ");
    Err(Error::invalid_state(operation, current.to_string(), expected))
}

fn transition(inner: &mut StateInner, next: OperationState) -> StateChange {
    let change = StateChange::new(inner.current, next);
    inner.current = next;
    inner.history.push_back(change.clone());
    if inner.history.len() > MAX_HISTORY_SIZE {
        inner.history.pop_front();
    }
    change
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_new_cell_starts_ready_to_process() {
        let state = StateCell::new();
        assert_eq!(state.current(), OperationState::ReadyToProcess);
        assert!(state.history().is_empty());
    }

    #[test]
    fn test_request_start_from_allowed_state() {
        let state = StateCell::new();
        let change = state
            .request_start(
                "enroll",
                &[OperationState::ReadyToProcess],
                OperationState::ProcessInProgress,
            )
            .unwrap();

        assert_eq!(change.from, OperationState::ReadyToProcess);
        assert_eq!(change.to, OperationState::ProcessInProgress);
        assert_eq!(state.current(), OperationState::ProcessInProgress);
    }

    #[test]
    fn test_request_start_rejected_while_busy() {
        let state = StateCell::new();
        state
            .request_start(
                "enroll",
                &[OperationState::ReadyToProcess],
                OperationState::ProcessInProgress,
            )
            .unwrap();

        let err = state
            .request_start(
                "verify",
                &[OperationState::ReadyToProcess],
                OperationState::ProcessInProgress,
            )
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("verify"));
        assert!(message.contains("ProcessInProgress"));
        assert!(message.contains("ReadyToProcess"));
        // State untouched by the rejected start.
        assert_eq!(state.current(), OperationState::ProcessInProgress);
    }

    #[test]
    fn test_require_does_not_transition() {
        let state = StateCell::new();
        state
            .require("template", &[OperationState::ReadyToProcess])
            .unwrap();
        assert_eq!(state.current(), OperationState::ReadyToProcess);
        assert!(state.history().is_empty());
    }

    #[test]
    fn test_require_lists_all_expected_states() {
        let state = StateCell::new();
        state.complete(OperationState::ProcessInProgress);

        let err = state
            .require(
                "acquire_base_template",
                &[OperationState::ReadyToProcess, OperationState::ReadyToContinue],
            )
            .unwrap_err();

        assert!(err.to_string().contains("ReadyToProcess or ReadyToContinue"));
    }

    #[test]
    fn test_complete_is_unconditional() {
        let state = StateCell::new();
        // No gate: completion succeeds even from an idle state.
        let change = state.complete(OperationState::ReadyToContinue);
        assert_eq!(change.from, OperationState::ReadyToProcess);
        assert_eq!(state.current(), OperationState::ReadyToContinue);
    }

    #[test]
    fn test_history_records_oldest_first() {
        let state = StateCell::new();
        state.complete(OperationState::ProcessInProgress);
        state.complete(OperationState::ReadyToContinue);

        let history = state.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].to, OperationState::ProcessInProgress);
        assert_eq!(history[1].to, OperationState::ReadyToContinue);
        assert!(history[0].at <= history[1].at);
    }

    #[test]
    fn test_history_is_capped() {
        let state = StateCell::new();
        for _ in 0..20 {
            state.complete(OperationState::ProcessInProgress);
            state.complete(OperationState::ReadyToProcess);
        }

        let history = state.history();
        assert_eq!(history.len(), MAX_HISTORY_SIZE);
        // Oldest entries dropped; the newest transition is retained.
        assert_eq!(
            history.last().map(|change| change.to),
            Some(OperationState::ReadyToProcess)
        );
    }

    #[rstest]
    #[case(OperationState::ReadyToProcess, false)]
    #[case(OperationState::ProcessInProgress, true)]
    #[case(OperationState::ReadyToContinue, false)]
    #[case(OperationState::ContinueInProgress, true)]
    fn test_busy_states(#[case] state: OperationState, #[case] busy: bool) {
        assert_eq!(state.is_busy(), busy);
    }

    #[rstest]
    #[case(OperationState::ReadyToProcess, "ReadyToProcess")]
    #[case(OperationState::ProcessInProgress, "ProcessInProgress")]
    #[case(OperationState::ReadyToContinue, "ReadyToContinue")]
    #[case(OperationState::ContinueInProgress, "ContinueInProgress")]
    fn test_state_display(#[case] state: OperationState, #[case] expected: &str) {
        assert_eq!(state.to_string(), expected);
    }

    #[test]
    fn test_state_serializes_snake_case() {
        let json = serde_json::to_string(&OperationState::ReadyToContinue).unwrap();
        assert_eq!(json, "\"ready_to_continue\"");

        let state: OperationState = serde_json::from_str("\"continue_in_progress\"").unwrap();
        assert_eq!(state, OperationState::ContinueInProgress);
    }
}
