//! # ticksim-cli
//!
//! The main entry point for the ticksim binary. It parses command-line
//! arguments, initializes logging, and dispatches to the subcommand.

#![forbid(unsafe_code)]

use crate::args::{Cli, Command};
use anyhow::Result;
use clap::Parser;

mod args;
mod commands;
mod logging;
mod script;
mod wiring;

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log);

    match cli.command {
        Command::Run(opts) => commands::run::exec(opts),
        Command::Validate { script } => commands::validate::exec(script),
    }
}
