//! # ticksim-engine::node_table
//!
//! Tracks which addresses are live, crashed, or absent, and owns the node
//! instances themselves. An address is in exactly one of those three states
//! at all times.

use std::collections::{HashMap, HashSet};
use ticksim_proto::node::{Node, NodeFactory};
use ticksim_types::id::Address;

pub struct NodeTable {
    factory: NodeFactory,
    max_addr: Address,
    live: HashMap<Address, Box<dyn Node>>,
    crashed: HashSet<Address>,
    nodes_ever_created: u64,
}

impl NodeTable {
    pub fn new(max_addr: Address, factory: NodeFactory) -> Self {
        Self {
            factory,
            max_addr,
            live: HashMap::new(),
            crashed: HashSet::new(),
            nodes_ever_created: 0,
        }
    }

    pub fn is_valid_addr(&self, addr: Address) -> bool {
        addr < self.max_addr
    }

    pub fn is_live(&self, addr: Address) -> bool {
        self.live.contains_key(&addr)
    }

    pub fn is_crashed(&self, addr: Address) -> bool {
        self.crashed.contains(&addr)
    }

    pub fn is_absent(&self, addr: Address) -> bool {
        self.is_valid_addr(addr) && !self.is_live(addr) && !self.is_crashed(addr)
    }

    /// Every address currently live, in ascending order so iteration order
    /// is deterministic (e.g. broadcast fan-out).
    pub fn live_addresses(&self) -> Vec<Address> {
        let mut addrs: Vec<Address> = self.live.keys().copied().collect();
        addrs.sort_unstable();
        addrs
    }

    pub fn crashed_addresses(&self) -> Vec<Address> {
        let mut addrs: Vec<Address> = self.crashed.iter().copied().collect();
        addrs.sort_unstable();
        addrs
    }

    pub fn get_mut(&mut self, addr: Address) -> Option<&mut (dyn Node + 'static)> {
        self.live.get_mut(&addr).map(|b| b.as_mut())
    }

    /// Removes `addr` from the live map, returning the instance so the
    /// caller can run its `stop()` before discarding it.
    pub fn take_live(&mut self, addr: Address) -> Option<Box<dyn Node>> {
        self.live.remove(&addr)
    }

    pub fn mark_crashed(&mut self, addr: Address) {
        self.crashed.insert(addr);
    }

    /// Constructs a fresh instance via the factory, without inserting it.
    /// Bumps the creation counter only for addresses that were never crashed
    /// before (a genuinely new node, not a restart). The caller runs the
    /// node's `start()` and inserts it with [`Self::put_back`] once that
    /// returns — mirroring the `take_live`/`put_back` pattern used for every
    /// other dispatch, so a `NodeRuntime` can be built from the rest of the
    /// simulator's state while this address is briefly absent from the
    /// table.
    pub fn install_fresh(&mut self, addr: Address) -> Box<dyn Node> {
        let was_crashed = self.crashed.remove(&addr);
        if !was_crashed {
            self.nodes_ever_created += 1;
        }
        (self.factory)()
    }

    /// Reinserts a node taken out via [`Self::take_live`] or
    /// [`Self::install_fresh`] once its callback has returned successfully.
    pub fn put_back(&mut self, addr: Address, node: Box<dyn Node>) {
        self.live.insert(addr, node);
    }

    pub fn nodes_ever_created(&self) -> u64 {
        self.nodes_ever_created
    }
}
