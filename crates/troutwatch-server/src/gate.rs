//! Single-flight guard around the data producer.
//!
//! At most one producer run is in flight. A second trigger while one is
//! running is rejected immediately (never queued). The gate returns to
//! idle when the [`RunPermit`] is dropped, on every exit path including
//! errors and timeouts.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;

/// Observable gate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    /// No run in progress.
    Idle,
    /// A run holds the permit.
    Running,
}

impl fmt::Display for GateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
        }
    }
}

/// Rejected acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    /// Another run holds the permit.
    #[error("producer already running")]
    AlreadyRunning,
}

/// Idle/Running state machine.
#[derive(Debug, Default)]
pub struct RunGate {
    running: AtomicBool,
}

impl RunGate {
    /// Idle gate.
    pub const fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
        }
    }

    /// Current state.
    pub fn state(&self) -> GateState {
        if self.running.load(Ordering::Acquire) {
            GateState::Running
        } else {
            GateState::Idle
        }
    }

    /// Move Idle to Running, or fail if already Running.
    pub fn try_acquire(&self) -> Result<RunPermit<'_>, GateError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            Ok(RunPermit { gate: self })
        } else {
            Err(GateError::AlreadyRunning)
        }
    }
}

/// Proof of a running producer. Dropping it releases the gate.
#[derive(Debug)]
#[must_use = "the gate is released as soon as the permit is dropped"]
pub struct RunPermit<'a> {
    gate: &'a RunGate,
}

impl Drop for RunPermit<'_> {
    fn drop(&mut self) {
        self.gate.running.store(false, Ordering::Release);
    }
}
