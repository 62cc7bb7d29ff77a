//! # ticksim-engine::prelude
//!
//! A convenience module that re-exports the most commonly used types from the
//! engine and its dependencies. This simplifies imports for other crates in
//! the workspace that depend on the engine.

pub use crate::{
    command_source::{CommandSource, LineSource, StdinLineSource},
    errors::EngineError,
    events::{Event, ScriptEvent},
    failure::{FailureController, Prompter, StdioPrompter},
    node_table::NodeTable,
    tick::{Progress, TickLoop},
    timeouts::TimeoutQueue,
};

pub use ticksim_types::{
    self,
    config::*,
    errors::*,
    id::*,
    packet::*,
    time::*,
};

pub use ticksim_proto::{self, Node, NodeCrash, NodeCtx, NodeFactory, TimeoutCallback};
