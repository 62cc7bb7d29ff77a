//! # ticksim-proto::nodes
//!
//! Small demonstration node programs, kept here to exercise `NodeCtx` end to
//! end; neither is part of the simulator's algorithmic core.

mod counter;
mod echo;

pub use counter::CounterNode;
pub use echo::EchoNode;
