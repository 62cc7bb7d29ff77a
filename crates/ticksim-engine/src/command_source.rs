//! # ticksim-engine::command_source
//!
//! The two `CommandSource` variants the tick loop pulls from at the start of
//! every tick: a pre-parsed script (built by an external collaborator) or an
//! interactive line reader. Both produce the same `ScriptEvent` vocabulary,
//! so the tick loop never needs to know which one it's talking to.

use crate::errors::EngineError;
use crate::events::ScriptEvent;
use ticksim_types::id::Address;

/// A source of interactive input lines. Swappable for a scripted test
/// double, the same way `Prompter` is for the `FailureController`.
pub trait LineSource: Send {
    /// Returns `None` on EOF, which the command source treats as an `Exit`.
    fn read_line(&mut self) -> Option<String>;
}

pub struct StdinLineSource;

impl LineSource for StdinLineSource {
    fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match std::io::stdin().read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim().to_string()),
            Err(_) => None,
        }
    }
}

/// A canned `LineSource` for tests.
pub struct ScriptedLineSource {
    lines: std::collections::VecDeque<String>,
}

impl ScriptedLineSource {
    pub fn new(lines: Vec<&str>) -> Self {
        Self {
            lines: lines.into_iter().map(String::from).collect(),
        }
    }
}

impl LineSource for ScriptedLineSource {
    fn read_line(&mut self) -> Option<String> {
        self.lines.pop_front()
    }
}

pub enum CommandSource {
    Script { events: Vec<ScriptEvent>, cursor: usize },
    Interactive(Box<dyn LineSource>),
}

impl CommandSource {
    pub fn script(events: Vec<ScriptEvent>) -> Self {
        Self::Script { events, cursor: 0 }
    }

    pub fn interactive(source: Box<dyn LineSource>) -> Self {
        Self::Interactive(source)
    }

    pub fn is_interactive(&self) -> bool {
        matches!(self, CommandSource::Interactive(_))
    }

    /// Drains events up to (but not including) the next `TimeAdvance`.
    /// Returns `None` in script mode once the script is exhausted — the
    /// caller must then stop once in-transit and timeouts are also drained.
    /// Interactive mode never returns `None`; EOF surfaces as a batch
    /// containing a single `Exit`.
    pub fn drain_to_time_advance(&mut self) -> Option<Vec<ScriptEvent>> {
        match self {
            CommandSource::Script { events, cursor } => {
                if *cursor >= events.len() {
                    return None;
                }
                let mut batch = Vec::new();
                while *cursor < events.len() {
                    let ev = events[*cursor].clone();
                    *cursor += 1;
                    if ev == ScriptEvent::TimeAdvance {
                        return Some(batch);
                    }
                    batch.push(ev);
                }
                Some(batch)
            }
            CommandSource::Interactive(source) => {
                let mut batch = Vec::new();
                loop {
                    let Some(line) = source.read_line() else {
                        batch.push(ScriptEvent::Exit);
                        return Some(batch);
                    };
                    if line.is_empty() || line.eq_ignore_ascii_case("TIME") {
                        return Some(batch);
                    }
                    match parse_directive(&line) {
                        Ok(ScriptEvent::TimeAdvance) => return Some(batch),
                        Ok(ev) => batch.push(ev),
                        Err(e) => tracing::warn!(%e, line, "malformed command line ignored"),
                    }
                }
            }
        }
    }
}

/// Parses one non-blank, non-comment directive line into a `ScriptEvent`.
/// Shared between the interactive reader above and the script-file parser in
/// the CLI crate, so both surfaces accept exactly the same grammar.
pub fn parse_directive(line: &str) -> Result<ScriptEvent, EngineError> {
    let line = line.trim();
    let mut parts = line.splitn(2, char::is_whitespace);
    let tag = parts.next().unwrap_or("");
    let rest = parts.next().unwrap_or("").trim();
    match tag.to_ascii_uppercase().as_str() {
        "START" => rest
            .parse::<Address>()
            .map(ScriptEvent::Start)
            .map_err(|_| EngineError::BadScript(format!("bad address in START: {line}"))),
        "COMMAND" => {
            let mut sub = rest.splitn(2, char::is_whitespace);
            let addr_tok = sub.next().unwrap_or("");
            let cmd = sub.next().unwrap_or("").to_string();
            addr_tok
                .parse::<Address>()
                .map(|a| ScriptEvent::Command(a, cmd))
                .map_err(|_| EngineError::BadScript(format!("bad address in COMMAND: {line}")))
        }
        "ECHO" => Ok(ScriptEvent::Echo(rest.to_string())),
        "FAILURE" => rest
            .parse::<Address>()
            .map(ScriptEvent::Failure)
            .map_err(|_| EngineError::BadScript(format!("bad address in FAILURE: {line}"))),
        "TIME" => Ok(ScriptEvent::TimeAdvance),
        "EXIT" => Ok(ScriptEvent::Exit),
        "" => Err(EngineError::BadScript("empty directive".to_string())),
        other => Err(EngineError::BadScript(format!("unrecognized directive {other:?}: {line}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_each_recognized_directive() {
        assert_eq!(parse_directive("START 3").unwrap(), ScriptEvent::Start(3));
        assert_eq!(
            parse_directive("COMMAND 2 send 3 hi").unwrap(),
            ScriptEvent::Command(2, "send 3 hi".to_string())
        );
        assert_eq!(parse_directive("ECHO hello world").unwrap(), ScriptEvent::Echo("hello world".to_string()));
        assert_eq!(parse_directive("FAILURE 1").unwrap(), ScriptEvent::Failure(1));
        assert_eq!(parse_directive("TIME").unwrap(), ScriptEvent::TimeAdvance);
        assert_eq!(parse_directive("EXIT").unwrap(), ScriptEvent::Exit);
    }

    #[test]
    fn rejects_unrecognized_directive() {
        assert!(parse_directive("FROBNICATE 1").is_err());
    }

    #[test]
    fn script_source_batches_up_to_time_advance() {
        let mut src = CommandSource::script(vec![
            ScriptEvent::Start(1),
            ScriptEvent::Command(1, "hi".to_string()),
            ScriptEvent::TimeAdvance,
            ScriptEvent::Exit,
        ]);
        let batch = src.drain_to_time_advance().unwrap();
        assert_eq!(batch.len(), 2);
        let batch2 = src.drain_to_time_advance().unwrap();
        assert_eq!(batch2, vec![ScriptEvent::Exit]);
        assert!(src.drain_to_time_advance().is_none());
    }

    #[test]
    fn interactive_blank_line_ends_batch() {
        let mut src = CommandSource::interactive(Box::new(ScriptedLineSource::new(vec!["START 1", ""])));
        let batch = src.drain_to_time_advance().unwrap();
        assert_eq!(batch, vec![ScriptEvent::Start(1)]);
    }

    #[test]
    fn interactive_eof_yields_exit() {
        let mut src = CommandSource::interactive(Box::new(ScriptedLineSource::new(vec![])));
        let batch = src.drain_to_time_advance().unwrap();
        assert_eq!(batch, vec![ScriptEvent::Exit]);
    }
}
