//! # ticksim-engine::timeouts
//!
//! The waiting-timeouts set and the per-tick cancellation guard described in
//! the data model: a timeout is `(owner, fire_tick, callback)`; once its
//! owner fails, it must never fire, whether that failure happens before or
//! after the timeout has already been pulled into the current tick's
//! dispatch list.

use std::collections::{BTreeMap, HashMap, HashSet};
use ticksim_proto::node::TimeoutCallback;
use ticksim_types::id::{Address, TimeoutHandle};
use ticksim_types::time::Tick;

pub struct ScheduledTimeout {
    pub handle: TimeoutHandle,
    pub owner: Address,
    pub callback: TimeoutCallback,
}

pub struct TimeoutQueue {
    waiting: BTreeMap<Tick, Vec<ScheduledTimeout>>,
    owner_handles: HashMap<Address, HashSet<TimeoutHandle>>,
    /// Handles cancelled this tick. Cleared at the start of every tick; a
    /// handle that lands here stays skippable for exactly the tick in which
    /// its owner crashed (it will already have been dispatched or discarded
    /// by the next tick, so clearing is safe).
    canceled: HashSet<TimeoutHandle>,
}

impl TimeoutQueue {
    pub fn new() -> Self {
        Self {
            waiting: BTreeMap::new(),
            owner_handles: HashMap::new(),
            canceled: HashSet::new(),
        }
    }

    pub fn schedule(
        &mut self,
        handle: TimeoutHandle,
        owner: Address,
        fire_tick: Tick,
        callback: TimeoutCallback,
    ) {
        self.waiting.entry(fire_tick).or_default().push(ScheduledTimeout {
            handle,
            owner,
            callback,
        });
        self.owner_handles.entry(owner).or_default().insert(handle);
    }

    /// Must be called once at the start of every tick, before resolution.
    pub fn begin_tick(&mut self) {
        self.canceled.clear();
    }

    /// Cancels every timeout owned by `owner`: purges ones still waiting for
    /// a future tick, and marks ones already pulled into this tick's
    /// dispatch list as cancelled so the loop skips them at execute time.
    pub fn cancel_owner(&mut self, owner: Address) {
        if let Some(handles) = self.owner_handles.remove(&owner) {
            for handle in &handles {
                self.canceled.insert(*handle);
            }
        }
        for bucket in self.waiting.values_mut() {
            bucket.retain(|t| t.owner != owner);
        }
        self.waiting.retain(|_, bucket| !bucket.is_empty());
    }

    /// Pulls every timeout with `fire_tick <= now` out of the waiting set.
    /// The caller is responsible for checking [`Self::is_canceled`] before
    /// invoking each one's callback, and for calling [`Self::mark_resolved`]
    /// once it has been dispatched (or skipped).
    pub fn take_due(&mut self, now: Tick) -> Vec<ScheduledTimeout> {
        let future = self.waiting.split_off(&(now + 1));
        let due = std::mem::replace(&mut self.waiting, future);
        due.into_values().flatten().collect()
    }

    /// Whether anything remains in the waiting set for a future tick.
    pub fn is_empty(&self) -> bool {
        self.waiting.is_empty()
    }

    pub fn is_canceled(&self, handle: TimeoutHandle) -> bool {
        self.canceled.contains(&handle)
    }

    pub fn mark_resolved(&mut self, handle: TimeoutHandle, owner: Address) {
        if let Some(handles) = self.owner_handles.get_mut(&owner) {
            handles.remove(&handle);
            if handles.is_empty() {
                self.owner_handles.remove(&owner);
            }
        }
    }

    #[cfg(test)]
    pub fn waiting_count(&self) -> usize {
        self.waiting.values().map(|v| v.len()).sum()
    }
}
