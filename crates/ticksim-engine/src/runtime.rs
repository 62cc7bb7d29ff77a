//! # ticksim-engine::runtime
//!
//! `NodeRuntime`: the `NodeCtx` bridge handed to a node during dispatch. It
//! borrows only the engine state a node is allowed to touch (the in-transit
//! queue, the timeout queue, the id generator, the failure controller and
//! its RNG) and deliberately excludes the node table itself, so it can be
//! constructed while the dispatching node has been lifted out of the table
//! for the duration of its callback.

use rand_chacha::ChaCha20Rng;
use ticksim_proto::node::{NodeCrash, NodeCtx, TimeoutCallback};
use ticksim_types::id::{Address, TimeoutHandle, BROADCAST};
use ticksim_types::packet::{Packet, Protocol};
use ticksim_types::time::Tick;

use crate::failure::FailureController;
use crate::ids::IdGen;
use crate::rng::Recorder;
use crate::timeouts::TimeoutQueue;

pub struct NodeRuntime<'a> {
    addr: Address,
    now: Tick,
    other_live: &'a [Address],
    in_transit: &'a mut Vec<Packet>,
    timeouts: &'a mut TimeoutQueue,
    ids: &'a mut IdGen,
    failure: &'a mut FailureController,
    rng: &'a mut ChaCha20Rng,
    recorder: &'a mut Recorder,
}

impl<'a> NodeRuntime<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        addr: Address,
        now: Tick,
        other_live: &'a [Address],
        in_transit: &'a mut Vec<Packet>,
        timeouts: &'a mut TimeoutQueue,
        ids: &'a mut IdGen,
        failure: &'a mut FailureController,
        rng: &'a mut ChaCha20Rng,
        recorder: &'a mut Recorder,
    ) -> Self {
        Self {
            addr,
            now,
            other_live,
            in_transit,
            timeouts,
            ids,
            failure,
            rng,
            recorder,
        }
    }
}

impl NodeCtx for NodeRuntime<'_> {
    fn send(&mut self, dest: Address, protocol: Protocol, payload: &[u8]) {
        if dest == BROADCAST {
            for &other in self.other_live {
                self.in_transit.push(Packet {
                    src: self.addr,
                    dest: other,
                    protocol,
                    payload: bytes::Bytes::copy_from_slice(payload),
                });
            }
        } else {
            self.in_transit.push(Packet {
                src: self.addr,
                dest,
                protocol,
                payload: bytes::Bytes::copy_from_slice(payload),
            });
        }
    }

    fn set_timeout(&mut self, delta_ticks: u64, callback: TimeoutCallback) -> TimeoutHandle {
        let handle = self.ids.next_timeout_handle();
        let fire_tick = ticksim_types::time::checked_add(self.now, delta_ticks).unwrap_or_else(|_| {
            tracing::warn!(addr = self.addr, "timeout delta overflowed the clock, clamping");
            Tick::MAX
        });
        self.timeouts.schedule(handle, self.addr, fire_tick, callback);
        handle
    }

    fn now(&self) -> Tick {
        self.now
    }

    fn addr(&self) -> Address {
        self.addr
    }

    fn write_barrier(&mut self) -> Result<(), NodeCrash> {
        if self.failure.write_barrier_check(self.rng, self.recorder, self.addr) {
            Err(NodeCrash)
        } else {
            Ok(())
        }
    }
}
