//! # ticksim-cli::args
//!
//! Defines the command-line argument structure using `clap`. A `RunOpts`
//! field is `Some` only when the user actually passed the flag, so
//! `commands::run::apply_overrides` can tell "not set" apart from "set back
//! to the config file's own value".

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use ticksim_types::config::FailureMode;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log formatter: human-readable or newline-delimited JSON.
    #[arg(long, global = true, default_value = "human")]
    pub log: LogFormat,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a simulation from a config file.
    Run(RunOpts),
    /// Parse and structurally check a script file without running it.
    Validate {
        #[arg(value_name = "SCRIPT_PATH")]
        script: PathBuf,
    },
}

#[derive(Args, Debug)]
pub struct RunOpts {
    /// Path to the SimConfig TOML file.
    #[arg(short, long)]
    pub config: PathBuf,

    /// Which node program every simulated address runs.
    #[arg(long, value_enum, default_value = "echo")]
    pub node_kind: NodeKind,

    /// Number of addresses in the simulated space, `[0, max_addr)`.
    #[arg(long, default_value_t = 16)]
    pub max_addr: u32,

    /// Read commands from stdin instead of the config's script file.
    #[arg(long)]
    pub interactive: bool,

    /// Override the config file's failure mode.
    #[arg(long, value_enum)]
    pub mode: Option<FailureModeArg>,

    /// Override the config file's drop_rate.
    #[arg(long)]
    pub drop_rate: Option<f64>,

    /// Override the config file's delay_rate.
    #[arg(long)]
    pub delay_rate: Option<f64>,

    /// Override the config file's failure_rate.
    #[arg(long)]
    pub failure_rate: Option<f64>,

    /// Override the config file's recovery_rate.
    #[arg(long)]
    pub recovery_rate: Option<f64>,

    /// Override the config file's RNG seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Override the config file's script path.
    #[arg(long)]
    pub script: Option<PathBuf>,

    /// Override the config file's tick limit.
    #[arg(long)]
    pub max_ticks: Option<u64>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Human,
    Json,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Echo,
    Counter,
}

impl NodeKind {
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Echo => "echo",
            NodeKind::Counter => "counter",
        }
    }
}

/// Mirrors `ticksim_types::config::FailureMode` so clap can derive a
/// `ValueEnum` for it without adding a CLI dependency to `ticksim-types`.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureModeArg {
    Nothing,
    Drop,
    Delay,
    Crash,
    Everything,
}

impl From<FailureModeArg> for FailureMode {
    fn from(arg: FailureModeArg) -> Self {
        match arg {
            FailureModeArg::Nothing => FailureMode::Nothing,
            FailureModeArg::Drop => FailureMode::Drop,
            FailureModeArg::Delay => FailureMode::Delay,
            FailureModeArg::Crash => FailureMode::Crash,
            FailureModeArg::Everything => FailureMode::Everything,
        }
    }
}
