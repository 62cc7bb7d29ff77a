//! # ticksim-types::errors
//!
//! Defines the common error types used throughout the ticksim workspace.
//! Using `thiserror` provides clean, descriptive error handling.

use crate::time::Tick;
use thiserror::Error;

/// A general-purpose error for the simulation engine.
#[derive(Error, Debug, Clone)]
pub enum SimError {
    #[error("tick counter overflow: {base} + {offset}")]
    TimeOverflow { base: Tick, offset: Tick },
    #[error("address {0} is out of range")]
    InvalidAddress(u32),
}

/// An error related to validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid rate {field}: {value} is not in [0, 1]")]
    RateOutOfRange { field: &'static str, value: f64 },
}
