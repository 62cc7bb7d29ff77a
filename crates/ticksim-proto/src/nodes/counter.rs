//! # ticksim-proto::nodes::counter
//!
//! A node that accumulates the byte length of everything it receives, and
//! reports the running total on command. Has no one to reply to — a
//! command has no originating node, only a script or interactive source —
//! so it reports by logging rather than by sending.

use crate::node::{Node, NodeCrash, NodeCtx};

#[derive(Default)]
pub struct CounterNode {
    total_bytes: u64,
}

impl Node for CounterNode {
    fn on_receive(
        &mut self,
        ctx: &mut dyn NodeCtx,
        src: u32,
        _protocol: u16,
        payload: &[u8],
    ) -> Result<(), NodeCrash> {
        self.total_bytes += payload.len() as u64;
        tracing::debug!(
            node = ctx.addr(),
            src,
            total = self.total_bytes,
            "counter: accumulated"
        );
        Ok(())
    }

    fn on_command(&mut self, ctx: &mut dyn NodeCtx, command: &str) -> Result<(), NodeCrash> {
        if command.trim() == "total" {
            tracing::info!(node = ctx.addr(), total = self.total_bytes, "counter: total");
        } else {
            tracing::warn!(node = ctx.addr(), command, "counter: unrecognized command");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullCtx {
        addr: u32,
    }

    impl NodeCtx for NullCtx {
        fn send(&mut self, _dest: u32, _protocol: u16, _payload: &[u8]) {}
        fn set_timeout(
            &mut self,
            _delta_ticks: u64,
            _callback: crate::node::TimeoutCallback,
        ) -> u64 {
            0
        }
        fn now(&self) -> u64 {
            0
        }
        fn addr(&self) -> u32 {
            self.addr
        }
        fn write_barrier(&mut self) -> Result<(), NodeCrash> {
            Ok(())
        }
    }

    #[test]
    fn accumulates_received_bytes() {
        let mut node = CounterNode::default();
        let mut ctx = NullCtx { addr: 3 };
        node.on_receive(&mut ctx, 1, 0, b"hello").unwrap();
        node.on_receive(&mut ctx, 2, 0, b"!!").unwrap();
        assert_eq!(node.total_bytes, 7);
    }

    #[test]
    fn total_command_does_not_crash() {
        let mut node = CounterNode::default();
        let mut ctx = NullCtx { addr: 3 };
        assert!(node.on_command(&mut ctx, "total").is_ok());
    }
}
