//! # ticksim-types
//!
//! Foundational, shared data types used across the whole ticksim workspace.
//! Its purpose is to break dependency cycles by providing a stable, central
//! location for types that `ticksim-engine`, `ticksim-proto`, and
//! `ticksim-cli` all need to agree upon.

#![forbid(unsafe_code)]

pub mod config;
pub mod errors;
pub mod id;
pub mod packet;
pub mod time;
