//! # ticksim-cli::logging
//!
//! Log formatting: a colorized human-readable formatter for interactive use,
//! or `tracing-subscriber`'s built-in JSON formatter for machine
//! consumption, both honoring `RUST_LOG` via `EnvFilter`. Trimmed of the
//! TUI-era node-id-to-dashboard wiring; the node/address tag below is
//! cosmetic only.

use std::fmt;
use tracing::field::Field;
use tracing::{Event, Subscriber};
use tracing_subscriber::{
    fmt::{format::Writer, FormatEvent, FormatFields},
    registry::LookupSpan,
    EnvFilter,
};

use crate::args::LogFormat;

pub fn init(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Human => {
            tracing_subscriber::fmt()
                .event_format(SimulationFormatter)
                .with_env_filter(filter)
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::fmt().json().with_env_filter(filter).init();
        }
    }
}

/// Tags each line with the level and, if the event carries a `node` or
/// `addr` field, which address it concerns.
struct SimulationFormatter;

impl<S, N> FormatEvent<S, N> for SimulationFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();
        let level = metadata.level();
        let level_color = match *level {
            tracing::Level::ERROR => "\x1b[31m",
            tracing::Level::WARN => "\x1b[33m",
            tracing::Level::INFO => "\x1b[32m",
            tracing::Level::DEBUG => "\x1b[34m",
            tracing::Level::TRACE => "\x1b[90m",
        };
        write!(writer, "{level_color}[{:>5}]\x1b[0m ", level)?;

        if let Some(addr) = extract_addr(event) {
            write!(writer, "\x1b[35m[N{addr}]\x1b[0m ")?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

fn extract_addr(event: &Event) -> Option<u32> {
    let mut visitor = AddrExtractor::default();
    event.record(&mut visitor);
    visitor.0
}

#[derive(Default)]
struct AddrExtractor(Option<u32>);

impl tracing::field::Visit for AddrExtractor {
    fn record_u64(&mut self, field: &Field, value: u64) {
        if field.name() == "node" || field.name() == "addr" {
            self.0 = Some(value as u32);
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        if (field.name() == "node" || field.name() == "addr") && value >= 0 {
            self.0 = Some(value as u32);
        }
    }

    fn record_debug(&mut self, _field: &Field, _value: &dyn fmt::Debug) {}
    fn record_str(&mut self, _field: &Field, _value: &str) {}
    fn record_bool(&mut self, _field: &Field, _value: bool) {}
    fn record_error(&mut self, _field: &Field, _value: &(dyn std::error::Error + 'static)) {}
}
