//! # ticksim-cli::commands::validate
//!
//! Implements the `validate` subcommand: parse a script file and report its
//! directive count, without constructing or running a `TickLoop`.

use crate::script;
use anyhow::Result;
use std::path::PathBuf;

pub fn exec(path: PathBuf) -> Result<()> {
    let events = script::load_script(&path)?;
    println!("{} is a valid script: {} directives", path.display(), events.len());
    Ok(())
}
