//! # ticksim-engine::ids
//!
//! Provides a generator for unique, monotonic IDs for timeouts.

use ticksim_types::id::TimeoutHandle;

/// A generator for timeout handles.
pub struct IdGen {
    timeout_handle: TimeoutHandle,
}

impl IdGen {
    pub fn new() -> Self {
        Self { timeout_handle: 0 }
    }

    pub fn next_timeout_handle(&mut self) -> TimeoutHandle {
        let id = self.timeout_handle;
        self.timeout_handle = self
            .timeout_handle
            .checked_add(1)
            .expect("TimeoutHandle overflow");
        id
    }
}
