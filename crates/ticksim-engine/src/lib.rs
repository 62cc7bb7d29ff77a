//! # ticksim-engine
//!
//! The core of the ticksim simulator: the tick loop, node table, in-transit
//! queue, waiting-timeouts set, failure controller, and the NodeCtx bridge
//! node programs run against. Everything here is single-threaded and
//! synchronous by design — there is no async I/O and no implicit
//! concurrency, see `tick.rs` for the phase pipeline this crate drives.

pub mod command_source;
pub mod events;
pub mod failure;
pub mod ids;
pub mod node_table;
pub mod prelude;
pub mod rng;
pub mod runtime;
pub mod tick;
pub mod timeouts;

// Internal-only modules
mod errors;

pub use errors::EngineError;
