//! # ticksim-types::time
//!
//! Defines the representation of time within the simulation. Unlike a
//! continuous-time model, this simulator's clock is a plain integer tick
//! counter: it advances by exactly one at the end of every tick, never
//! partially and never out of order.

use crate::errors::SimError;

/// The fundamental unit of time in the simulation: one tick.
pub type Tick = u64;

/// The start of simulation time.
pub const TICK_ZERO: Tick = 0;

/// Performs a checked addition on `Tick`, returning an error on overflow.
pub fn checked_add(base: Tick, offset: Tick) -> Result<Tick, SimError> {
    base.checked_add(offset)
        .ok_or(SimError::TimeOverflow { base, offset })
}
