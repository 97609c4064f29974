// SPDX-License-Identifier: MIT OR Apache-2.0
//! Execution lifecycle state machine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of an [`Execution`](crate::Execution).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Configured but not launched.
    Created,
    /// The process has been spawned.
    Started,
    /// Output streams are being pumped.
    Running,
    /// The process has exited and all trailing output was delivered.
    Exited,
    /// Process handles have been released.
    Disposed,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Started => "started",
            Self::Running => "running",
            Self::Exited => "exited",
            Self::Disposed => "disposed",
        };
        f.write_str(s)
    }
}

/// Record of a single lifecycle state transition.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LifecycleTransition {
    /// State before the transition.
    pub from: LifecycleState,
    /// State after the transition.
    pub to: LifecycleState,
    /// RFC 3339 timestamp of when the transition occurred.
    pub timestamp: String,
    /// Optional human-readable reason for the transition.
    pub reason: Option<String>,
}

/// Errors produced by [`LifecycleManager`] when a transition is invalid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LifecycleError {
    /// The requested transition is not allowed by the state machine.
    InvalidTransition {
        /// Current state.
        from: LifecycleState,
        /// Requested target state.
        to: LifecycleState,
    },
    /// The manager is already in the requested state.
    AlreadyInState(LifecycleState),
}

impl fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTransition { from, to } => {
                write!(f, "invalid lifecycle transition from {from} to {to}")
            }
            Self::AlreadyInState(s) => write!(f, "already in state {s}"),
        }
    }
}

impl std::error::Error for LifecycleError {}

/// Tracks execution state and enforces forward-only transitions.
///
/// ```text
/// Created ─► Started ─► Running ─► Exited ─► Disposed
///    │          └──────────────────►▲
///    └──────────────────────────────────────► Disposed
/// ```
#[derive(Debug)]
pub struct LifecycleManager {
    state: LifecycleState,
    history: Vec<LifecycleTransition>,
}

impl LifecycleManager {
    /// Create a new manager in the [`LifecycleState::Created`] state.
    pub fn new() -> Self {
        Self {
            state: LifecycleState::Created,
            history: Vec::new(),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Attempt to transition to a new state.
    pub fn transition(
        &mut self,
        to: LifecycleState,
        reason: Option<String>,
    ) -> Result<(), LifecycleError> {
        if self.state == to {
            return Err(LifecycleError::AlreadyInState(to));
        }
        if !self.can_transition(to) {
            return Err(LifecycleError::InvalidTransition {
                from: self.state,
                to,
            });
        }

        let from = self.state;
        self.state = to;
        self.history.push(LifecycleTransition {
            from,
            to,
            timestamp: chrono::Utc::now().to_rfc3339(),
            reason,
        });
        Ok(())
    }

    /// Returns `true` if transitioning from the current state to `to` is valid.
    pub fn can_transition(&self, to: LifecycleState) -> bool {
        use LifecycleState::*;
        matches!(
            (self.state, to),
            (Created, Started)
                | (Created, Disposed)
                | (Started, Running)
                | (Started, Exited)
                | (Running, Exited)
                | (Exited, Disposed)
        )
    }

    /// All transitions recorded so far, oldest first.
    pub fn history(&self) -> &[LifecycleTransition] {
        &self.history
    }
}

impl Default for LifecycleManager {
    fn default() -> Self {
        Self::new()
    }
}
