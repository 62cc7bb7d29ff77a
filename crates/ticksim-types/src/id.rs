//! # ticksim-types::id
//!
//! Defines the core identifier types used throughout the simulation.
//! Using distinct types for different kinds of IDs helps prevent bugs where,
//! for example, a timeout handle might be accidentally used as an address.

/// A unique identifier for a node in the simulation.
/// Invariant: addresses are contiguous from 0 to `MAX_ADDR - 1`.
pub type Address = u32;

/// The sentinel destination meaning "every other live node". Valid only as
/// the `dest` argument to a send call; it never appears on an in-transit
/// packet, which always carries a concrete destination.
pub const BROADCAST: Address = Address::MAX;

/// A handle returned by `set_timeout`, usable to recognize a timeout when it
/// is cancelled by its owner crashing.
pub type TimeoutHandle = u64;
