//! # ticksim-cli::script
//!
//! Reads a script file and turns it into the `Vec<ScriptEvent>` a
//! `CommandSource::script` consumes. Blank lines and `#`-comments are
//! skipped here; every remaining line is handed to the engine's own
//! `parse_directive`, so the script-file grammar and the interactive
//! grammar never drift apart.

use anyhow::{anyhow, Context, Result};
use std::path::Path;
use ticksim_engine::command_source::parse_directive;
use ticksim_engine::events::ScriptEvent;

pub fn load_script(path: &Path) -> Result<Vec<ScriptEvent>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading script file {}", path.display()))?;

    let mut events = Vec::new();
    for (lineno, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let event = parse_directive(trimmed).map_err(|e| anyhow!("{}:{}: {e}", path.display(), lineno + 1))?;
        events.push(event);
    }
    Ok(events)
}
