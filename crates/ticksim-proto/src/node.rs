//! # ticksim-proto::node
//!
//! Defines the trait surface a node program implements and the bridge the
//! simulator exposes back to it. Unlike a typed/dyn trait pair keyed on a
//! generic message type, there is exactly one trait here: the wire payload
//! is raw bytes, so there is nothing to erase.

use ticksim_types::id::{Address, TimeoutHandle};
use ticksim_types::packet::Protocol;
use ticksim_types::time::Tick;

/// Signals that a node has crashed. Carries no data: the bookkeeping
/// (removing the node from the live set, cancelling its timeouts) must
/// already have happened — triggered via [`NodeCtx::write_barrier`] or a
/// simulator-initiated failure, and performed by the dispatch loop — before
/// this is returned. It is a control-flow marker, not an error to be logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeCrash;

/// A user-supplied node program. One instance exists per live address;
/// restarting an address discards the old instance and constructs a fresh
/// one via the owning [`NodeFactory`].
pub trait Node: Send {
    /// Called once, immediately after construction, while the node is live.
    fn start(&mut self, ctx: &mut dyn NodeCtx) -> Result<(), NodeCrash> {
        let _ = ctx;
        Ok(())
    }

    /// Called when the node is about to be removed from the live set,
    /// whether by an explicit crash or by a restart that replaces it.
    fn stop(&mut self, ctx: &mut dyn NodeCtx) -> Result<(), NodeCrash> {
        let _ = ctx;
        Ok(())
    }

    /// Called when a packet addressed to this node is delivered.
    fn on_receive(
        &mut self,
        ctx: &mut dyn NodeCtx,
        src: Address,
        protocol: Protocol,
        payload: &[u8],
    ) -> Result<(), NodeCrash>;

    /// Called when a command line addressed to this node arrives, either
    /// from a script or from the interactive prompt.
    fn on_command(&mut self, ctx: &mut dyn NodeCtx, command: &str) -> Result<(), NodeCrash> {
        let _ = (ctx, command);
        Ok(())
    }
}

/// A boxed, type-erased construction function. The engine never knows the
/// concrete node type; it only knows how to make one.
pub type NodeFactory = Box<dyn Fn() -> Box<dyn Node> + Send + Sync>;

/// A timeout's fire behavior, supplied at `set_timeout` time. Keeping the
/// behavior attached to the timeout (rather than redispatching through a
/// second trait method on `Node`) keeps the callback local to the call
/// site that scheduled it.
pub type TimeoutCallback = Box<dyn FnOnce(&mut dyn NodeCtx) -> Result<(), NodeCrash> + Send>;

/// The bridge a node uses to act on the simulated world. Implemented by the
/// engine; borrowed by a node only for the duration of a single callback.
pub trait NodeCtx {
    /// Enqueues a packet. `dest = BROADCAST` fans out to every other live
    /// node at enqueue time; crashing mid-fan-out stops further enqueues
    /// but does not retract packets already queued.
    fn send(&mut self, dest: Address, protocol: Protocol, payload: &[u8]);

    /// Registers a callback to run `delta_ticks` from now. Returns a handle
    /// that becomes meaningless (the callback will simply never run) if
    /// this node crashes before the timeout fires.
    fn set_timeout(&mut self, delta_ticks: u64, callback: TimeoutCallback) -> TimeoutHandle;

    /// The current tick, as observed by this node.
    fn now(&self) -> Tick;

    /// This node's own address.
    fn addr(&self) -> Address;

    /// The write-barrier crash-injection checkpoint (see the component
    /// design for fail_node / write-barrier). A node calls this immediately
    /// before any side effect it wants treated as observable and
    /// irrevocable. If the controller's trial fires, this performs the
    /// crash bookkeeping and returns `Err(NodeCrash)`; the node must
    /// propagate that error upward without performing the side effect.
    fn write_barrier(&mut self) -> Result<(), NodeCrash>;
}
