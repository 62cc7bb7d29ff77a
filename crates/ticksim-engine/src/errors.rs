//! # ticksim-engine::errors
//!
//! Internal error types for the engine.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("address {0} is out of range")]
    InvalidAddress(u32),
    #[error("script is malformed: {0}")]
    BadScript(String),
}
