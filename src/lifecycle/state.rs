//! Process lifecycle state.
//!
//! # State Transitions
//! ```text
//! Running → ShuttingDown: first trigger of any kind
//! ShuttingDown → Terminated: cleanup settled, or a re-entrant trigger forced exit
//! ```
//!
//! There is no way back to `Running`.

use std::sync::atomic::{AtomicU8, Ordering};

/// Where the process is in its shutdown lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LifecycleState {
    Running = 0,
    ShuttingDown = 1,
    Terminated = 2,
}

impl LifecycleState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => LifecycleState::Running,
            1 => LifecycleState::ShuttingDown,
            _ => LifecycleState::Terminated,
        }
    }
}

/// Atomic holder for [`LifecycleState`]; doubles as the idempotency guard.
#[derive(Debug)]
pub struct StateCell(AtomicU8);

impl StateCell {
    pub fn new() -> Self {
        Self(AtomicU8::new(LifecycleState::Running as u8))
    }

    pub fn get(&self) -> LifecycleState {
        LifecycleState::from_u8(self.0.load(Ordering::SeqCst))
    }

    /// Move `Running → ShuttingDown`. Returns `false` if a shutdown already began.
    pub fn try_begin_shutdown(&self) -> bool {
        self.0
            .compare_exchange(
                LifecycleState::Running as u8,
                LifecycleState::ShuttingDown as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }

    /// Move to `Terminated`, returning the state it replaced.
    ///
    /// Exactly one caller observes a previous state other than `Terminated`.
    pub fn mark_terminated(&self) -> LifecycleState {
        LifecycleState::from_u8(self.0.swap(LifecycleState::Terminated as u8, Ordering::SeqCst))
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}
