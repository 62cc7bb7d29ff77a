//! # ticksim-proto::nodes::echo
//!
//! A node that forwards a command-line instruction into a network send, and
//! logs whatever it receives. Useful for the `Deliver-after-drop` /
//! `Dropped packet` / `Delayed packet` / `Broadcast fan-out` scenarios.

use crate::node::{Node, NodeCrash, NodeCtx};

const ECHO_PROTOCOL: u16 = 0;

#[derive(Default)]
pub struct EchoNode;

impl Node for EchoNode {
    fn on_command(&mut self, ctx: &mut dyn NodeCtx, command: &str) -> Result<(), NodeCrash> {
        let mut parts = command.splitn(3, ' ');
        match parts.next() {
            Some("send") => {
                let dest = parts.next().and_then(|s| s.parse::<u32>().ok());
                let msg = parts.next().unwrap_or("");
                match dest {
                    Some(dest) => {
                        tracing::info!(node = ctx.addr(), dest, msg, "echo: sending");
                        ctx.send(dest, ECHO_PROTOCOL, msg.as_bytes());
                    }
                    None => {
                        tracing::warn!(node = ctx.addr(), command, "echo: malformed send command");
                    }
                }
            }
            Some("broadcast") => {
                let msg = parts.next().unwrap_or("");
                tracing::info!(node = ctx.addr(), msg, "echo: broadcasting");
                ctx.send(ticksim_types::id::BROADCAST, ECHO_PROTOCOL, msg.as_bytes());
            }
            _ => {
                tracing::warn!(node = ctx.addr(), command, "echo: unrecognized command");
            }
        }
        Ok(())
    }

    fn on_receive(
        &mut self,
        ctx: &mut dyn NodeCtx,
        src: u32,
        protocol: u16,
        payload: &[u8],
    ) -> Result<(), NodeCrash> {
        let msg = String::from_utf8_lossy(payload);
        tracing::info!(node = ctx.addr(), src, protocol, %msg, "echo: received");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct RecordingCtx {
        addr: u32,
        sent: RefCell<Vec<(u32, u16, Vec<u8>)>>,
    }

    impl NodeCtx for RecordingCtx {
        fn send(&mut self, dest: u32, protocol: u16, payload: &[u8]) {
            self.sent.borrow_mut().push((dest, protocol, payload.to_vec()));
        }
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
    fn send_command_enqueues_one_packet() {
        let mut node = EchoNode;
        let mut ctx = RecordingCtx {
            addr: 1,
            sent: RefCell::new(Vec::new()),
        };
        node.on_command(&mut ctx, "send 2 hi").unwrap();
        let sent = ctx.sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, 2);
        assert_eq!(sent[0].2, b"hi");
    }

    #[test]
    fn broadcast_command_uses_broadcast_sentinel() {
        let mut node = EchoNode;
        let mut ctx = RecordingCtx {
            addr: 1,
            sent: RefCell::new(Vec::new()),
        };
        node.on_command(&mut ctx, "broadcast hello").unwrap();
        let sent = ctx.sent.borrow();
        assert_eq!(sent[0].0, ticksim_types::id::BROADCAST);
    }

    #[test]
    fn malformed_send_is_ignored_not_crashed() {
        let mut node = EchoNode;
        let mut ctx = RecordingCtx {
            addr: 1,
            sent: RefCell::new(Vec::new()),
        };
        let result = node.on_command(&mut ctx, "send notanumber hi");
        assert!(result.is_ok());
        assert!(ctx.sent.borrow().is_empty());
    }
}
