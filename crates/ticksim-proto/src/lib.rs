//! # ticksim-proto
//!
//! The software development kit for writing node programs that run inside
//! ticksim. It defines the `Node` trait node authors implement and the
//! `NodeCtx` bridge the engine hands back to them, plus a couple of small
//! demonstration nodes that exercise the bridge end to end.

#![forbid(unsafe_code)]

pub mod node;
pub mod nodes;

pub use node::{Node, NodeCrash, NodeCtx, NodeFactory, TimeoutCallback};
