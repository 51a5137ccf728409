//! Logging setup shared by the gateway binary and its library crates.
//!
//! [`init`] installs one global subscriber. When `RUST_LOG` is set it is used
//! as-is; otherwise the binary's default level applies to everything and the
//! gateway crates listed in [`GATEWAY_TARGETS`] log at the requested level.

use std::io::{self, IsTerminal};

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::filter::{Directive, ParseError};
use tracing_subscriber::fmt::format::{FmtSpan, Writer};
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Log targets of the crates that make up the gateway.
pub const GATEWAY_TARGETS: [&str; 3] = ["llm_service", "chat_core", "api"];

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid log filter `{filter}`: {source}")]
    Filter {
        filter: String,
        #[source]
        source: ParseError,
    },

    #[error("a global tracing subscriber is already installed")]
    AlreadyInstalled(#[from] TryInitError),
}

/// `2025-09-12T10:20:30Z`
#[derive(Clone, Copy, Debug, Default)]
struct UtcSeconds;

impl FormatTime for UtcSeconds {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let stamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        w.write_str(&stamp)
    }
}

/// One `target=level` directive per gateway crate.
pub fn gateway_directives(level: Level) -> Result<Vec<Directive>, TelemetryError> {
    let level = level.as_str().to_ascii_lowercase();
    GATEWAY_TARGETS
        .iter()
        .map(|target| {
            let raw = format!("{target}={level}");
            raw.parse()
                .map_err(|source| TelemetryError::Filter { filter: raw, source })
        })
        .collect()
}

/// Builds the filter from an explicit `rust_log` value, falling back to
/// `default` plus [`gateway_directives`] when it is absent or blank.
pub fn filter_from(
    rust_log: Option<&str>,
    default: &str,
    level: Level,
) -> Result<EnvFilter, TelemetryError> {
    let parse = |raw: &str| {
        EnvFilter::try_new(raw).map_err(|source| TelemetryError::Filter {
            filter: raw.to_string(),
            source,
        })
    };

    match rust_log.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => parse(raw),
        None => gateway_directives(level)?
            .into_iter()
            .try_fold(parse(default)?, |filter, d| Ok(filter.add_directive(d))),
    }
}

/// Single-line stdout output with source location and span timings.
fn stdout_layer<S>() -> impl Layer<S> + Send + Sync
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_timer(UtcSeconds)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(io::stdout().is_terminal())
        .with_span_events(FmtSpan::CLOSE)
        .event_format(fmt::format().compact().with_source_location(true))
}

/// Installs the global subscriber.
///
/// `default` is the global filter (e.g. `"info"`) and `gateway_level` the
/// level for the gateway crates; both are ignored when `RUST_LOG` is set.
///
/// # Errors
/// - [`TelemetryError::Filter`] when `RUST_LOG` or `default` does not parse
/// - [`TelemetryError::AlreadyInstalled`] on a second call
pub fn init(default: &str, gateway_level: Level) -> Result<(), TelemetryError> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = filter_from(rust_log.as_deref(), default, gateway_level)?;

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer())
        .try_init()?;
    Ok(())
}
