//! # ticksim-cli::wiring
//!
//! The registry of node programs a run can wire up, and the seed-resolution
//! helper shared by `run`. Kept separate from `commands::run` the same way
//! the teacher kept protocol selection separate from the `run` subcommand
//! body.

use rand::Rng;
use ticksim_proto::node::{Node, NodeFactory};
use ticksim_proto::nodes::{CounterNode, EchoNode};

type Ctor = fn() -> Box<dyn Node>;

/// The central registry of all available node programs.
static REGISTRY: &[(&str, Ctor)] = &[
    ("echo", || Box::new(EchoNode) as Box<dyn Node>),
    ("counter", || Box::new(CounterNode::default()) as Box<dyn Node>),
];

/// Finds a node-program constructor in the registry by name and wraps it
/// into the `NodeFactory` shape `TickLoop::new` expects.
pub fn get_factory(name: &str) -> Option<NodeFactory> {
    REGISTRY
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, ctor)| {
            let ctor = *ctor;
            Box::new(move || ctor()) as NodeFactory
        })
}

/// Generates a seed if one is not provided, the same "CLI flag wins, fall
/// back to randomness" idiom used for every other override.
pub fn get_seed(opts_seed: Option<u64>, config_seed: Option<u64>) -> u64 {
    opts_seed.or(config_seed).unwrap_or_else(|| rand::thread_rng().gen())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_node_kinds_resolve() {
        assert!(get_factory("echo").is_some());
        assert!(get_factory("counter").is_some());
    }

    #[test]
    fn unknown_node_kind_is_none() {
        assert!(get_factory("nonexistent").is_none());
    }

    #[test]
    fn cli_seed_wins_over_config_seed() {
        assert_eq!(get_seed(Some(7), Some(9)), 7);
        assert_eq!(get_seed(None, Some(9)), 9);
    }
}
