//! # ticksim-cli::commands::run
//!
//! Implements the `run` subcommand: load a `SimConfig`, apply CLI
//! overrides, wire up a `CommandSource` and a node factory, and drive the
//! `TickLoop` to completion.

use crate::{args::RunOpts, script, wiring};
use anyhow::{Context, Result};
use ticksim_engine::prelude::*;
use ticksim_types::config::{InputSource, SimConfig};

pub fn exec(opts: RunOpts) -> Result<()> {
    let mut config = load_config(&opts.config)?;
    apply_overrides(&mut config, &opts);
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    let seed = wiring::get_seed(opts.seed, config.seed);
    tracing::info!(mode = ?config.mode, seed, node_kind = opts.node_kind.name(), "starting run");

    let input = if opts.interactive {
        InputSource::Interactive
    } else {
        InputSource::Script(
            config
                .script
                .clone()
                .ok_or_else(|| anyhow::anyhow!("config has no script and --interactive was not passed"))?,
        )
    };
    let source = match input {
        InputSource::Interactive => CommandSource::interactive(Box::new(StdinLineSource)),
        InputSource::Script(path) => {
            let events = script::load_script(&path)?;
            tracing::info!(directives = events.len(), path = %path.display(), "loaded script");
            CommandSource::script(events)
        }
    };

    let factory = wiring::get_factory(opts.node_kind.name())
        .ok_or_else(|| anyhow::anyhow!("unknown node kind {:?}", opts.node_kind))?;

    let prompter: Box<dyn Prompter> = Box::new(StdioPrompter);
    let failure = FailureController::new(
        config.mode,
        config.drop_rate,
        config.delay_rate,
        config.failure_rate,
        config.recovery_rate,
        prompter,
    );

    let mut sim = TickLoop::new(opts.max_addr, factory, failure, seed, source, config.max_ticks);
    sim.run()?;
    tracing::info!(
        final_tick = sim.now(),
        nodes_ever_created = sim.nodes_ever_created(),
        "run complete"
    );
    Ok(())
}

fn load_config(path: &std::path::Path) -> Result<SimConfig> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("parsing config file {}", path.display()))
}

fn apply_overrides(config: &mut SimConfig, opts: &RunOpts) {
    if let Some(mode) = opts.mode {
        config.mode = mode.into();
    }
    if let Some(v) = opts.drop_rate {
        config.drop_rate = v;
    }
    if let Some(v) = opts.delay_rate {
        config.delay_rate = v;
    }
    if let Some(v) = opts.failure_rate {
        config.failure_rate = v;
    }
    if let Some(v) = opts.recovery_rate {
        config.recovery_rate = v;
    }
    if let Some(v) = opts.seed {
        config.seed = Some(v);
    }
    if let Some(path) = &opts.script {
        config.script = Some(path.clone());
    }
    if let Some(v) = opts.max_ticks {
        config.max_ticks = Some(v);
    }
}
