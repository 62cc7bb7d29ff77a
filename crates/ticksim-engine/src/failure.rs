//! # ticksim-engine::failure
//!
//! The `FailureController`: the four escalating modes that decide which
//! packets drop or delay, which nodes crash or recover, and in what order a
//! tick's events execute. Interactive decisions go through a [`Prompter`]
//! trait so the controller's logic is testable without a live terminal.

use rand::Rng;
use rand_chacha::ChaCha20Rng;
use std::io::{self, BufRead, Write};
use ticksim_types::id::Address;
use ticksim_types::config::FailureMode;
use ticksim_types::packet::Packet;

use crate::rng::{Recorder, RngDiscipline};

/// The interactive surface used by drop/delay, crash/restart, and
/// event-order decisions, plus the write-barrier y/n check. A real run uses
/// [`StdioPrompter`]; tests use a canned [`ScriptedPrompter`].
pub trait Prompter: Send {
    /// Returns (drop indices, delay indices) into the given packet list. An
    /// index present in both lists is treated as a delay.
    fn prompt_drop_delay(&mut self, packets: &[Packet]) -> (Vec<usize>, Vec<usize>);

    /// Returns (crash set, restart set) chosen from the given live/crashed
    /// address lists.
    fn prompt_crash_restart(&mut self, live: &[Address], crashed: &[Address]) -> (Vec<Address>, Vec<Address>);

    /// Returns a permutation of `0..n`, or `(0..n).collect()` for "in script
    /// order" on blank input. Must re-prompt internally until the answer is
    /// a valid permutation.
    fn prompt_event_order(&mut self, n: usize, labels: &[String]) -> Vec<usize>;

    /// Returns `true` to crash the node at the write barrier.
    fn prompt_write_barrier(&mut self, addr: Address) -> bool;
}

/// Reads decisions from stdin, one line at a time, writing prompts to
/// stdout. The terminal-facing half of [`Prompter`].
pub struct StdioPrompter;

impl StdioPrompter {
    fn read_line(&self, prompt: &str) -> String {
        print!("{prompt}");
        let _ = io::stdout().flush();
        let mut line = String::new();
        let _ = io::stdin().lock().read_line(&mut line);
        line.trim().to_string()
    }

    fn parse_indices(line: &str) -> Vec<usize> {
        line.split_whitespace()
            .filter_map(|tok| tok.parse::<usize>().ok())
            .collect()
    }

    fn parse_addrs(line: &str) -> Vec<Address> {
        line.split_whitespace()
            .filter_map(|tok| tok.parse::<Address>().ok())
            .collect()
    }
}

impl Prompter for StdioPrompter {
    fn prompt_drop_delay(&mut self, packets: &[Packet]) -> (Vec<usize>, Vec<usize>) {
        for (i, pkt) in packets.iter().enumerate() {
            println!("  [{i}] {} -> {} ({} bytes)", pkt.src, pkt.dest, pkt.payload.len());
        }
        let drop = Self::parse_indices(&self.read_line("drop which (blank = none)? "));
        let delay = Self::parse_indices(&self.read_line("delay which (blank = none)? "));
        (drop, delay)
    }

    fn prompt_crash_restart(&mut self, live: &[Address], crashed: &[Address]) -> (Vec<Address>, Vec<Address>) {
        println!("  live: {live:?}");
        println!("  crashed: {crashed:?}");
        let crash = Self::parse_addrs(&self.read_line("crash which (blank = none)? "));
        let restart = Self::parse_addrs(&self.read_line("restart which (blank = none)? "));
        (crash, restart)
    }

    fn prompt_event_order(&mut self, n: usize, labels: &[String]) -> Vec<usize> {
        loop {
            for (i, label) in labels.iter().enumerate() {
                println!("  [{i}] {label}");
            }
            let line = self.read_line("order (blank = script order)? ");
            if line.is_empty() {
                return (0..n).collect();
            }
            let perm = Self::parse_indices(&line);
            if is_permutation(&perm, n) {
                return perm;
            }
            println!("not a permutation of 0..{}, try again", n.saturating_sub(1));
        }
    }

    fn prompt_write_barrier(&mut self, addr: Address) -> bool {
        let answer = self.read_line(&format!("node {addr} at write barrier, crash it (y/N)? "));
        matches!(answer.to_lowercase().as_str(), "y" | "yes")
    }
}

fn is_permutation(candidate: &[usize], n: usize) -> bool {
    if candidate.len() != n {
        return false;
    }
    let mut seen = vec![false; n];
    for &i in candidate {
        if i >= n || seen[i] {
            return false;
        }
        seen[i] = true;
    }
    true
}

/// A canned, queue-driven `Prompter` for tests: each call pops the next
/// scripted answer, or falls back to a default ("nothing selected" /
/// "script order" / "don't crash") once the queue is empty.
#[derive(Default)]
pub struct ScriptedPrompter {
    pub drop_delay_answers: std::collections::VecDeque<(Vec<usize>, Vec<usize>)>,
    pub crash_restart_answers: std::collections::VecDeque<(Vec<Address>, Vec<Address>)>,
    pub order_answers: std::collections::VecDeque<Vec<usize>>,
    pub write_barrier_answers: std::collections::VecDeque<bool>,
}

impl Prompter for ScriptedPrompter {
    fn prompt_drop_delay(&mut self, _packets: &[Packet]) -> (Vec<usize>, Vec<usize>) {
        self.drop_delay_answers.pop_front().unwrap_or_default()
    }

    fn prompt_crash_restart(&mut self, _live: &[Address], _crashed: &[Address]) -> (Vec<Address>, Vec<Address>) {
        self.crash_restart_answers.pop_front().unwrap_or_default()
    }

    fn prompt_event_order(&mut self, n: usize, _labels: &[String]) -> Vec<usize> {
        self.order_answers
            .pop_front()
            .filter(|perm| is_permutation(perm, n))
            .unwrap_or_else(|| (0..n).collect())
    }

    fn prompt_write_barrier(&mut self, _addr: Address) -> bool {
        self.write_barrier_answers.pop_front().unwrap_or(false)
    }
}

/// The four escalating failure-control modes plus NOTHING, driving drop,
/// delay, crash, recovery, and event-order decisions for a single run.
pub struct FailureController {
    mode: FailureMode,
    drop_rate: f64,
    delay_rate: f64,
    failure_rate: f64,
    recovery_rate: f64,
    prompter: Box<dyn Prompter>,
}

impl FailureController {
    pub fn new(
        mode: FailureMode,
        drop_rate: f64,
        delay_rate: f64,
        failure_rate: f64,
        recovery_rate: f64,
        prompter: Box<dyn Prompter>,
    ) -> Self {
        Self {
            mode,
            drop_rate,
            delay_rate,
            failure_rate,
            recovery_rate,
            prompter,
        }
    }

    pub fn mode(&self) -> FailureMode {
        self.mode
    }

    /// Splits `candidates` into (delivered, delayed). Dropped packets are
    /// simply not present in either output.
    pub fn resolve_drop_delay(
        &mut self,
        rng: &mut ChaCha20Rng,
        recorder: &mut Recorder,
        candidates: Vec<Packet>,
    ) -> (Vec<Packet>, Vec<Packet>) {
        if self.mode.is_interactive_drop_delay() {
            let (drop_idx, delay_idx): (Vec<usize>, Vec<usize>) =
                self.prompter.prompt_drop_delay(&candidates);
            let drop_set: std::collections::HashSet<usize> = drop_idx.into_iter().collect();
            let delay_set: std::collections::HashSet<usize> = delay_idx.into_iter().collect();
            let mut delivered = Vec::new();
            let mut delayed = Vec::new();
            for (i, pkt) in candidates.into_iter().enumerate() {
                if delay_set.contains(&i) {
                    delayed.push(pkt);
                } else if drop_set.contains(&i) {
                    // dropped: neither vector
                } else {
                    delivered.push(pkt);
                }
            }
            return (delivered, delayed);
        }

        let mut delivered = Vec::new();
        let mut delayed = Vec::new();
        for pkt in candidates {
            let dropped = if self.mode.drops_via_rng() {
                let mut disc = RngDiscipline::new(rng, recorder, "drop_trial");
                disc.gen_bool(self.drop_rate.clamp(0.0, 1.0))
            } else {
                false
            };
            if dropped {
                continue;
            }
            let delayed_pkt = if self.mode.delays_via_rng() {
                let effective = if self.drop_rate >= 1.0 {
                    0.0
                } else {
                    (self.delay_rate / (1.0 - self.drop_rate)).clamp(0.0, 1.0)
                };
                let mut disc = RngDiscipline::new(rng, recorder, "delay_trial");
                disc.gen_bool(effective)
            } else {
                false
            };
            if delayed_pkt {
                delayed.push(pkt);
            } else {
                delivered.push(pkt);
            }
        }
        (delivered, delayed)
    }

    /// Returns (addresses to crash, addresses to restart) for this tick.
    pub fn resolve_crash_recovery(
        &mut self,
        rng: &mut ChaCha20Rng,
        recorder: &mut Recorder,
        live: &[Address],
        crashed: &[Address],
    ) -> (Vec<Address>, Vec<Address>) {
        if self.mode.is_interactive_crash() {
            return self.prompter.prompt_crash_restart(live, crashed);
        }
        if !self.mode.crashes_via_rng() {
            return (Vec::new(), Vec::new());
        }
        let mut to_crash = Vec::new();
        for &addr in live {
            let mut disc = RngDiscipline::new(rng, recorder, "crash_trial");
            if disc.gen_bool(self.failure_rate.clamp(0.0, 1.0)) {
                to_crash.push(addr);
            }
        }
        let mut to_start = Vec::new();
        for &addr in crashed {
            let mut disc = RngDiscipline::new(rng, recorder, "recovery_trial");
            if disc.gen_bool(self.recovery_rate.clamp(0.0, 1.0)) {
                to_start.push(addr);
            }
        }
        (to_crash, to_start)
    }

    /// Returns the execution order (a permutation of `0..labels.len()`) for
    /// this tick's gathered events.
    pub fn resolve_order(
        &mut self,
        rng: &mut ChaCha20Rng,
        recorder: &mut Recorder,
        labels: &[String],
    ) -> Vec<usize> {
        let n = labels.len();
        if self.mode.is_interactive_order() {
            let perm = self.prompter.prompt_event_order(n, labels);
            if is_permutation(&perm, n) {
                return perm;
            }
            tracing::warn!("interactive event order was not a permutation, falling back to script order");
            return (0..n).collect();
        }
        let mut order: Vec<usize> = (0..n).collect();
        // Fisher-Yates, drawing from the disciplined RNG so the shuffle is
        // reproducible and auditable like every other decision.
        for i in (1..order.len()).rev() {
            let mut disc = RngDiscipline::new(rng, recorder, "event_order");
            let j = disc.gen_range(0..=i);
            order.swap(i, j);
        }
        order
    }

    /// The write-barrier crash-injection checkpoint.
    pub fn write_barrier_check(
        &mut self,
        rng: &mut ChaCha20Rng,
        recorder: &mut Recorder,
        addr: Address,
    ) -> bool {
        if self.mode.is_interactive_crash() {
            return self.prompter.prompt_write_barrier(addr);
        }
        if !self.mode.crashes_via_rng() {
            return false;
        }
        let mut disc = RngDiscipline::new(rng, recorder, "write_barrier_trial");
        disc.gen_bool(self.failure_rate.clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use rand::SeedableRng;

    fn pkt(src: Address, dest: Address) -> Packet {
        Packet {
            src,
            dest,
            protocol: 0,
            payload: Bytes::from_static(b"x"),
        }
    }

    #[test]
    fn nothing_mode_delivers_everything() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let mut recorder = Recorder::new(1);
        let mut fc = FailureController::new(
            FailureMode::Nothing,
            1.0,
            1.0,
            1.0,
            1.0,
            Box::new(ScriptedPrompter::default()),
        );
        let (delivered, delayed) =
            fc.resolve_drop_delay(&mut rng, &mut recorder, vec![pkt(1, 2)]);
        assert_eq!(delivered.len(), 1);
        assert!(delayed.is_empty());
    }

    #[test]
    fn drop_rate_one_drops_everything() {
        let mut rng = ChaCha20Rng::seed_from_u64(2);
        let mut recorder = Recorder::new(2);
        let mut fc = FailureController::new(
            FailureMode::Drop,
            1.0,
            0.0,
            0.0,
            0.0,
            Box::new(ScriptedPrompter::default()),
        );
        let (delivered, delayed) =
            fc.resolve_drop_delay(&mut rng, &mut recorder, vec![pkt(1, 2)]);
        assert!(delivered.is_empty());
        assert!(delayed.is_empty());
    }

    #[test]
    fn delay_rate_one_with_zero_drop_always_delays() {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let mut recorder = Recorder::new(3);
        let mut fc = FailureController::new(
            FailureMode::Delay,
            0.0,
            1.0,
            0.0,
            0.0,
            Box::new(ScriptedPrompter::default()),
        );
        let (delivered, delayed) =
            fc.resolve_drop_delay(&mut rng, &mut recorder, vec![pkt(1, 2)]);
        assert!(delivered.is_empty());
        assert_eq!(delayed.len(), 1);
    }

    #[test]
    fn interactive_drop_delay_conflict_resolves_to_delay() {
        let mut rng = ChaCha20Rng::seed_from_u64(4);
        let mut recorder = Recorder::new(4);
        let mut scripted = ScriptedPrompter::default();
        scripted.drop_delay_answers.push_back((vec![0], vec![0]));
        let mut fc = FailureController::new(
            FailureMode::Everything,
            0.0,
            0.0,
            0.0,
            0.0,
            Box::new(scripted),
        );
        let (delivered, delayed) =
            fc.resolve_drop_delay(&mut rng, &mut recorder, vec![pkt(1, 2)]);
        assert!(delivered.is_empty());
        assert_eq!(delayed.len(), 1);
    }

    #[test]
    fn crash_mode_uses_rng_not_prompter() {
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let mut recorder = Recorder::new(5);
        let mut fc = FailureController::new(
            FailureMode::Crash,
            0.0,
            0.0,
            1.0,
            1.0,
            Box::new(ScriptedPrompter::default()),
        );
        let (crash, start) = fc.resolve_crash_recovery(&mut rng, &mut recorder, &[1], &[2]);
        assert_eq!(crash, vec![1]);
        assert_eq!(start, vec![2]);
    }

    #[test]
    fn invalid_interactive_permutation_falls_back_to_identity() {
        let mut rng = ChaCha20Rng::seed_from_u64(6);
        let mut recorder = Recorder::new(6);
        let mut scripted = ScriptedPrompter::default();
        scripted.order_answers.push_back(vec![0, 0]); // not a permutation
        let mut fc = FailureController::new(
            FailureMode::Everything,
            0.0,
            0.0,
            0.0,
            0.0,
            Box::new(scripted),
        );
        let labels = vec!["a".to_string(), "b".to_string()];
        let order = fc.resolve_order(&mut rng, &mut recorder, &labels);
        assert_eq!(order, vec![0, 1]);
    }
}
