//! # ticksim-engine::events
//!
//! Defines the two event vocabularies the tick loop works with: the
//! script-level [`ScriptEvent`] a `CommandSource` hands in (already parsed,
//! sorted by tick), and the tick-local [`Event`] the loop actually dispatches
//! once failure resolution has run.

use ticksim_proto::node::TimeoutCallback;
use ticksim_types::id::{Address, TimeoutHandle};
use ticksim_types::packet::Packet;

/// An event ready for dispatch within the current tick, after failure
/// resolution has decided it survives.
pub enum Event {
    /// A packet that survived drop/delay resolution this tick.
    Delivery(Packet),
    /// A timeout whose fire tick has arrived and was not cancelled.
    Timeout {
        handle: TimeoutHandle,
        owner: Address,
        callback: TimeoutCallback,
    },
    /// A node selected to crash this tick.
    Failure(Address),
    /// A node selected to (re)start this tick.
    Start(Address),
    /// A command line addressed to a node.
    Command(Address, String),
    /// A line echoed straight to the log stream.
    Echo(String),
    /// Terminates the simulation.
    Exit,
}

impl std::fmt::Debug for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Event::Delivery(pkt) => f
                .debug_struct("Delivery")
                .field("src", &pkt.src)
                .field("dest", &pkt.dest)
                .finish(),
            Event::Timeout { handle, owner, .. } => f
                .debug_struct("Timeout")
                .field("handle", handle)
                .field("owner", owner)
                .finish(),
            Event::Failure(addr) => f.debug_tuple("Failure").field(addr).finish(),
            Event::Start(addr) => f.debug_tuple("Start").field(addr).finish(),
            Event::Command(addr, s) => f.debug_tuple("Command").field(addr).field(s).finish(),
            Event::Echo(s) => f.debug_tuple("Echo").field(s).finish(),
            Event::Exit => write!(f, "Exit"),
        }
    }
}

/// A directive produced by parsing a command script, or typed directly by an
/// interactive user. Sorted by tick in script mode; `TimeAdvance` marks the
/// tick boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptEvent {
    /// Advances to the next tick. Ends the current tick's command gathering.
    TimeAdvance,
    /// Starts (or restarts) a node.
    Start(Address),
    /// Delivers a command line to a node.
    Command(Address, String),
    /// Echoes a line to the log stream.
    Echo(String),
    /// Deprecated alias for a scripted crash, kept for older script files.
    Failure(Address),
    /// Terminates the simulation.
    Exit,
}
