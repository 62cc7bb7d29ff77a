//! # ticksim-engine::tick
//!
//! The `TickLoop`: owns every piece of simulator state (node table,
//! in-transit queue, waiting timeouts, RNG, clock, failure controller,
//! command source) and drives it through the phase pipeline one tick at a
//! time. Script mode and interactive mode run the phases in a deliberately
//! different order; see `tick_once`.

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use ticksim_proto::node::{Node, NodeCrash, NodeFactory, TimeoutCallback};
use ticksim_types::id::{Address, TimeoutHandle};
use ticksim_types::packet::Packet;
use ticksim_types::time::Tick;

use crate::command_source::CommandSource;
use crate::errors::EngineError;
use crate::events::{Event, ScriptEvent};
use crate::failure::FailureController;
use crate::ids::IdGen;
use crate::node_table::NodeTable;
use crate::rng::Recorder;
use crate::runtime::NodeRuntime;
use crate::timeouts::TimeoutQueue;

/// Whether the loop should keep going after the tick just executed.
#[derive(Debug, PartialEq, Eq)]
pub enum Progress {
    Continue,
    Stop,
}

pub struct TickLoop {
    nodes: NodeTable,
    in_transit: Vec<Packet>,
    timeouts: TimeoutQueue,
    failure: FailureController,
    rng: ChaCha20Rng,
    recorder: Recorder,
    ids: IdGen,
    clock: Tick,
    source: CommandSource,
    max_ticks: Option<Tick>,
    script_exhausted: bool,
}

impl TickLoop {
    pub fn new(
        max_addr: Address,
        factory: NodeFactory,
        failure: FailureController,
        seed: u64,
        source: CommandSource,
        max_ticks: Option<Tick>,
    ) -> Self {
        Self {
            nodes: NodeTable::new(max_addr, factory),
            in_transit: Vec::new(),
            timeouts: TimeoutQueue::new(),
            failure,
            rng: ChaCha20Rng::seed_from_u64(seed),
            recorder: Recorder::new(seed),
            ids: IdGen::new(),
            clock: ticksim_types::time::TICK_ZERO,
            source,
            max_ticks,
            script_exhausted: false,
        }
    }

    pub fn now(&self) -> Tick {
        self.clock
    }

    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    pub fn nodes_ever_created(&self) -> u64 {
        self.nodes.nodes_ever_created()
    }

    /// Runs the loop to completion: until an `Exit` event, the configured
    /// `max_ticks` is reached, or (script mode only) the script, in-transit
    /// queue, and waiting-timeouts set are all simultaneously drained.
    pub fn run(&mut self) -> Result<(), EngineError> {
        loop {
            if let Some(limit) = self.max_ticks {
                if self.clock >= limit {
                    tracing::info!(clock = self.clock, "max ticks reached");
                    return Ok(());
                }
            }
            match self.tick_once() {
                Progress::Stop => return Ok(()),
                Progress::Continue => {}
            }
        }
    }

    /// Runs one full tick. Returns `Progress::Stop` once the loop should
    /// terminate (an `Exit` event fired, or script mode has nothing left).
    fn tick_once(&mut self) -> Progress {
        if !self.source.is_interactive()
            && self.script_exhausted
            && self.in_transit.is_empty()
            && self.timeouts.is_empty()
        {
            tracing::info!(clock = self.clock, "script, in-transit queue, and timeouts all drained");
            return Progress::Stop;
        }

        self.timeouts.begin_tick();

        let mut gathered: Vec<Event> = Vec::new();
        let mut labels: Vec<String> = Vec::new();
        let mut extend = |gathered: &mut Vec<Event>, labels: &mut Vec<String>, pair: (Vec<Event>, Vec<String>)| {
            let (evs, lbs) = pair;
            gathered.extend(evs);
            labels.extend(lbs);
        };

        if self.source.is_interactive() {
            // prompt-user-to-TimeAdvance -> resolve-crashes -> resolve-in-transit -> ...
            let batch = self.source.drain_to_time_advance().unwrap_or_default();
            extend(&mut gathered, &mut labels, script_batch_to_events(batch));

            let pair = self.resolve_crashes();
            extend(&mut gathered, &mut labels, pair);

            let pair = self.resolve_in_transit();
            extend(&mut gathered, &mut labels, pair);
        } else {
            // resolve-in-transit -> drain-script-to-TimeAdvance -> resolve-crashes -> ...
            let pair = self.resolve_in_transit();
            extend(&mut gathered, &mut labels, pair);

            match self.source.drain_to_time_advance() {
                Some(batch) => extend(&mut gathered, &mut labels, script_batch_to_events(batch)),
                None => self.script_exhausted = true,
            }

            let pair = self.resolve_crashes();
            extend(&mut gathered, &mut labels, pair);
        }

        let pair = self.resolve_timeouts();
        extend(&mut gathered, &mut labels, pair);

        let order = self.failure.resolve_order(&mut self.rng, &mut self.recorder, &labels);
        let mut slots: Vec<Option<Event>> = gathered.into_iter().map(Some).collect();
        for idx in order {
            let Some(slot) = slots.get_mut(idx) else { continue };
            let Some(event) = slot.take() else { continue };
            if matches!(event, Event::Exit) {
                tracing::info!(clock = self.clock, "exit event reached");
                return Progress::Stop;
            }
            self.dispatch(event);
        }

        self.clock = self.clock.checked_add(1).unwrap_or_else(|| {
            tracing::warn!("clock saturated at Tick::MAX");
            Tick::MAX
        });
        Progress::Continue
    }

    fn resolve_in_transit(&mut self) -> (Vec<Event>, Vec<String>) {
        let candidates = std::mem::take(&mut self.in_transit);
        let (delivered, delayed) = self.failure.resolve_drop_delay(&mut self.rng, &mut self.recorder, candidates);
        self.in_transit = delayed;
        let mut events = Vec::new();
        let mut labels = Vec::new();
        for pkt in delivered {
            let ev = Event::Delivery(pkt);
            labels.push(label_for(&ev));
            events.push(ev);
        }
        (events, labels)
    }

    fn resolve_crashes(&mut self) -> (Vec<Event>, Vec<String>) {
        let live = self.nodes.live_addresses();
        let crashed = self.nodes.crashed_addresses();
        let (to_crash, to_start) =
            self.failure.resolve_crash_recovery(&mut self.rng, &mut self.recorder, &live, &crashed);
        let mut events = Vec::new();
        let mut labels = Vec::new();
        for addr in to_crash {
            let ev = Event::Failure(addr);
            labels.push(label_for(&ev));
            events.push(ev);
        }
        for addr in to_start {
            let ev = Event::Start(addr);
            labels.push(label_for(&ev));
            events.push(ev);
        }
        (events, labels)
    }

    fn resolve_timeouts(&mut self) -> (Vec<Event>, Vec<String>) {
        let due = self.timeouts.take_due(self.clock);
        let mut events = Vec::new();
        let mut labels = Vec::new();
        for t in due {
            let ev = Event::Timeout {
                handle: t.handle,
                owner: t.owner,
                callback: t.callback,
            };
            labels.push(label_for(&ev));
            events.push(ev);
        }
        (events, labels)
    }

    fn dispatch(&mut self, event: Event) {
        match event {
            Event::Delivery(pkt) => self.dispatch_delivery(pkt),
            Event::Timeout { handle, owner, callback } => self.dispatch_timeout(handle, owner, callback),
            Event::Failure(addr) => self.fail_node(addr),
            Event::Start(addr) => self.start_node(addr),
            Event::Command(addr, cmd) => self.dispatch_command(addr, cmd),
            Event::Echo(msg) => tracing::info!(%msg, "echo"),
            Event::Exit => unreachable!("Exit is handled before dispatch"),
        }
    }

    fn dispatch_command(&mut self, addr: Address, cmd: String) {
        if self.nodes.is_crashed(addr) {
            return;
        }
        if !self.nodes.is_live(addr) {
            tracing::info!(addr, command = %cmd, "command addressed to absent node");
            return;
        }
        let node = self.nodes.take_live(addr).unwrap();
        let (result, node) = self.invoke(addr, node, |node, rt| node.on_command(rt, &cmd));
        self.finish_dispatch(addr, node, result);
    }

    fn dispatch_delivery(&mut self, pkt: Packet) {
        let dest = pkt.dest;
        if !self.nodes.is_live(dest) {
            return; // crashed or absent: dropped silently
        }
        let node = self.nodes.take_live(dest).unwrap();
        let (result, node) =
            self.invoke(dest, node, |node, rt| node.on_receive(rt, pkt.src, pkt.protocol, &pkt.payload));
        self.finish_dispatch(dest, node, result);
    }

    fn dispatch_timeout(&mut self, handle: TimeoutHandle, owner: Address, callback: TimeoutCallback) {
        if self.timeouts.is_canceled(handle) || !self.nodes.is_live(owner) {
            self.timeouts.mark_resolved(handle, owner);
            return;
        }
        let node = self.nodes.take_live(owner).unwrap();
        let other_live = self.nodes.live_addresses();
        let result = {
            let mut rt = NodeRuntime::new(
                owner,
                self.clock,
                &other_live,
                &mut self.in_transit,
                &mut self.timeouts,
                &mut self.ids,
                &mut self.failure,
                &mut self.rng,
                &mut self.recorder,
            );
            callback(&mut rt)
        };
        self.timeouts.mark_resolved(handle, owner);
        self.finish_dispatch(owner, node, result);
    }

    fn fail_node(&mut self, addr: Address) {
        if let Some(node) = self.nodes.take_live(addr) {
            self.finish_dispatch(addr, node, Err(NodeCrash));
        }
    }

    fn start_node(&mut self, addr: Address) {
        if !self.nodes.is_valid_addr(addr) {
            tracing::warn!(addr, "start requested for out-of-range address");
            return;
        }
        if self.nodes.is_live(addr) {
            self.fail_node(addr);
        }
        let node = self.nodes.install_fresh(addr);
        let (result, node) = self.invoke(addr, node, |node, rt| node.start(rt));
        self.finish_dispatch(addr, node, result);
    }

    /// Builds a `NodeRuntime` from the simulator's non-node-table state and
    /// invokes `f` with it and the node under dispatch. The node has already
    /// been lifted out of the live table by the caller, so this can freely
    /// borrow the remaining live addresses without aliasing the node itself.
    fn invoke<F>(&mut self, addr: Address, mut node: Box<dyn Node>, f: F) -> (Result<(), NodeCrash>, Box<dyn Node>)
    where
        F: FnOnce(&mut dyn Node, &mut dyn ticksim_proto::node::NodeCtx) -> Result<(), NodeCrash>,
    {
        let other_live = self.nodes.live_addresses();
        let result = {
            let mut rt = NodeRuntime::new(
                addr,
                self.clock,
                &other_live,
                &mut self.in_transit,
                &mut self.timeouts,
                &mut self.ids,
                &mut self.failure,
                &mut self.rng,
                &mut self.recorder,
            );
            f(node.as_mut(), &mut rt)
        };
        (result, node)
    }

    /// Reinserts a node that finished its callback cleanly, or runs the
    /// remaining crash bookkeeping (`stop()`, mark crashed, cancel its
    /// timeouts) for one that signalled a crash. Every event handler and
    /// `write_barrier()` call funnels crash signalling through the same
    /// `Err(NodeCrash)` path, so this is the single place that bookkeeping
    /// happens, regardless of which call produced the signal.
    fn finish_dispatch(&mut self, addr: Address, node: Box<dyn Node>, result: Result<(), NodeCrash>) {
        match result {
            Ok(()) => self.nodes.put_back(addr, node),
            Err(NodeCrash) => {
                let (_, _node) = self.invoke(addr, node, |node, rt| {
                    let _ = node.stop(rt);
                    Ok(())
                });
                self.nodes.mark_crashed(addr);
                self.timeouts.cancel_owner(addr);
            }
        }
    }

    #[cfg(test)]
    fn in_transit_len(&self) -> usize {
        self.in_transit.len()
    }
}

fn to_event(ev: ScriptEvent) -> Event {
    match ev {
        ScriptEvent::TimeAdvance => unreachable!("TimeAdvance is the batch boundary, never included"),
        ScriptEvent::Start(a) => Event::Start(a),
        ScriptEvent::Command(a, s) => Event::Command(a, s),
        ScriptEvent::Echo(s) => Event::Echo(s),
        ScriptEvent::Failure(a) => Event::Failure(a),
        ScriptEvent::Exit => Event::Exit,
    }
}

fn script_batch_to_events(batch: Vec<ScriptEvent>) -> (Vec<Event>, Vec<String>) {
    let mut events = Vec::new();
    let mut labels = Vec::new();
    for se in batch {
        let ev = to_event(se);
        labels.push(label_for(&ev));
        events.push(ev);
    }
    (events, labels)
}

fn label_for(ev: &Event) -> String {
    match ev {
        Event::Delivery(pkt) => format!("Delivery({}->{})", pkt.src, pkt.dest),
        Event::Timeout { handle, owner, .. } => format!("Timeout(#{handle} owner={owner})"),
        Event::Failure(addr) => format!("Failure({addr})"),
        Event::Start(addr) => format!("Start({addr})"),
        Event::Command(addr, s) => format!("Command({addr}, {s:?})"),
        Event::Echo(s) => format!("Echo({s:?})"),
        Event::Exit => "Exit".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::failure::ScriptedPrompter;
    use std::sync::{Arc, Mutex};
    use ticksim_proto::node::NodeCtx;
    use ticksim_types::config::FailureMode;
    use ticksim_types::id::BROADCAST;

    #[derive(Clone, Default)]
    struct Log(Arc<Mutex<Vec<String>>>);

    impl Log {
        fn push(&self, s: impl Into<String>) {
            self.0.lock().unwrap().push(s.into());
        }
        fn entries(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    /// A single node program exercising every NodeCtx capability: it can
    /// send, broadcast, set a timeout, and logs everything it does and
    /// receives, tagged with its own address.
    struct TestNode {
        log: Log,
    }

    impl Node for TestNode {
        fn start(&mut self, ctx: &mut dyn NodeCtx) -> Result<(), NodeCrash> {
            self.log.push(format!("{}:started", ctx.addr()));
            Ok(())
        }

        fn on_receive(
            &mut self,
            ctx: &mut dyn NodeCtx,
            src: Address,
            _protocol: u16,
            payload: &[u8],
        ) -> Result<(), NodeCrash> {
            self.log
                .push(format!("{}:recv:{}:{}", ctx.addr(), src, String::from_utf8_lossy(payload)));
            Ok(())
        }

        fn on_command(&mut self, ctx: &mut dyn NodeCtx, command: &str) -> Result<(), NodeCrash> {
            if let Some(rest) = command.strip_prefix("send ") {
                let mut parts = rest.splitn(2, ' ');
                if let (Some(dest), Some(msg)) = (parts.next(), parts.next()) {
                    if let Ok(dest) = dest.parse::<Address>() {
                        ctx.send(dest, 0, msg.as_bytes());
                    }
                }
            } else if let Some(msg) = command.strip_prefix("broadcast ") {
                ctx.send(BROADCAST, 0, msg.as_bytes());
            } else if command == "set_timeout" {
                let log = self.log.clone();
                ctx.set_timeout(
                    5,
                    Box::new(move |_rt| {
                        log.push("timeout_fired".to_string());
                        Ok(())
                    }),
                );
            }
            Ok(())
        }
    }

    fn factory(log: Log) -> NodeFactory {
        Box::new(move || Box::new(TestNode { log: log.clone() }) as Box<dyn Node>)
    }

    fn failure(mode: FailureMode, drop_rate: f64, delay_rate: f64, failure_rate: f64, recovery_rate: f64) -> FailureController {
        FailureController::new(mode, drop_rate, delay_rate, failure_rate, recovery_rate, Box::new(ScriptedPrompter::default()))
    }

    #[test]
    fn deliver_after_drop_when_drop_rate_zero() {
        let log = Log::default();
        let script = CommandSource::script(vec![
            ScriptEvent::Start(1),
            ScriptEvent::Start(2),
            ScriptEvent::TimeAdvance,
            ScriptEvent::Command(1, "send 2 hi".to_string()),
            ScriptEvent::TimeAdvance,
            ScriptEvent::TimeAdvance,
        ]);
        let mut sim = TickLoop::new(4, factory(log.clone()), failure(FailureMode::Drop, 0.0, 0.0, 0.0, 0.0), 1, script, Some(10));
        sim.run().unwrap();
        assert!(log.entries().iter().any(|e| e == "2:recv:1:hi"));
    }

    #[test]
    fn dropped_packet_never_delivered() {
        let log = Log::default();
        let script = CommandSource::script(vec![
            ScriptEvent::Start(1),
            ScriptEvent::Start(2),
            ScriptEvent::TimeAdvance,
            ScriptEvent::Command(1, "send 2 hi".to_string()),
            ScriptEvent::TimeAdvance,
            ScriptEvent::TimeAdvance,
        ]);
        let mut sim = TickLoop::new(4, factory(log.clone()), failure(FailureMode::Drop, 1.0, 0.0, 0.0, 0.0), 1, script, Some(10));
        sim.run().unwrap();
        assert!(!log.entries().iter().any(|e| e.contains("recv")));
    }

    #[test]
    fn delayed_packet_stays_in_transit_indefinitely() {
        let log = Log::default();
        let mut events = vec![
            ScriptEvent::Start(1),
            ScriptEvent::Start(2),
            ScriptEvent::TimeAdvance,
            ScriptEvent::Command(1, "send 2 hi".to_string()),
            ScriptEvent::TimeAdvance,
        ];
        for _ in 0..10 {
            events.push(ScriptEvent::TimeAdvance);
        }
        let script = CommandSource::script(events);
        let mut sim = TickLoop::new(4, factory(log.clone()), failure(FailureMode::Delay, 0.0, 1.0, 0.0, 0.0), 2, script, Some(30));
        sim.run().unwrap();
        assert!(!log.entries().iter().any(|e| e.contains("recv")));
        assert_eq!(sim.in_transit_len(), 1);
    }

    #[test]
    fn crash_cancels_pending_timeout() {
        let log = Log::default();
        let mut events = vec![
            ScriptEvent::Start(1),
            ScriptEvent::TimeAdvance,
            ScriptEvent::Command(1, "set_timeout".to_string()),
            ScriptEvent::TimeAdvance,
            ScriptEvent::Failure(1),
            ScriptEvent::TimeAdvance,
        ];
        for _ in 0..6 {
            events.push(ScriptEvent::TimeAdvance);
        }
        let script = CommandSource::script(events);
        let mut sim = TickLoop::new(4, factory(log.clone()), failure(FailureMode::Nothing, 0.0, 0.0, 0.0, 0.0), 3, script, Some(30));
        sim.run().unwrap();
        assert!(!log.entries().iter().any(|e| e == "timeout_fired"));
    }

    #[test]
    fn broadcast_reaches_every_other_live_node_exactly_once() {
        let log = Log::default();
        let script = CommandSource::script(vec![
            ScriptEvent::Start(1),
            ScriptEvent::Start(2),
            ScriptEvent::Start(3),
            ScriptEvent::TimeAdvance,
            ScriptEvent::Command(1, "broadcast hey".to_string()),
            ScriptEvent::TimeAdvance,
            ScriptEvent::TimeAdvance,
        ]);
        let mut sim = TickLoop::new(4, factory(log.clone()), failure(FailureMode::Drop, 0.0, 0.0, 0.0, 0.0), 4, script, Some(10));
        sim.run().unwrap();
        let entries = log.entries();
        assert_eq!(entries.iter().filter(|e| e.as_str() == "2:recv:1:hey").count(), 1);
        assert_eq!(entries.iter().filter(|e| e.as_str() == "3:recv:1:hey").count(), 1);
        assert!(!entries.iter().any(|e| e.starts_with("1:recv:1:")));
    }

    #[test]
    fn restart_constructs_a_fresh_node_and_calls_start_once() {
        let log = Log::default();
        let script = CommandSource::script(vec![
            ScriptEvent::Start(1),
            ScriptEvent::TimeAdvance,
            ScriptEvent::Failure(1),
            ScriptEvent::TimeAdvance,
            ScriptEvent::TimeAdvance,
            ScriptEvent::Start(1),
            ScriptEvent::TimeAdvance,
        ]);
        let mut sim = TickLoop::new(4, factory(log.clone()), failure(FailureMode::Nothing, 0.0, 0.0, 0.0, 0.0), 5, script, Some(10));
        sim.run().unwrap();
        let starts = log.entries().iter().filter(|e| e.as_str() == "1:started").count();
        assert_eq!(starts, 2);
    }

    #[test]
    fn identical_seed_and_script_reproduce_identical_traces() {
        let make_script = || {
            CommandSource::script(vec![
                ScriptEvent::Start(1),
                ScriptEvent::Start(2),
                ScriptEvent::TimeAdvance,
                ScriptEvent::Command(1, "send 2 hi".to_string()),
                ScriptEvent::TimeAdvance,
                ScriptEvent::TimeAdvance,
                ScriptEvent::TimeAdvance,
            ])
        };

        let log_a = Log::default();
        let mut sim_a = TickLoop::new(4, factory(log_a.clone()), failure(FailureMode::Delay, 0.2, 0.3, 0.0, 0.0), 42, make_script(), Some(10));
        sim_a.run().unwrap();

        let log_b = Log::default();
        let mut sim_b = TickLoop::new(4, factory(log_b.clone()), failure(FailureMode::Delay, 0.2, 0.3, 0.0, 0.0), 42, make_script(), Some(10));
        sim_b.run().unwrap();

        assert_eq!(log_a.entries(), log_b.entries());
        assert_eq!(sim_a.recorder().tally(), sim_b.recorder().tally());
    }
}
