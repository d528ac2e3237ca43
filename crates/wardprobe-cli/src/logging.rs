//! Subscriber setup for the `tracing` events emitted by the library.
//!
//! `RUST_LOG` wins when set; otherwise the filter follows `-v`/`-q`.
//! Events go to stderr so stdout stays clean for `list` and `config`.

use crate::config::{LogFormat, Verbosity};
use crate::error::{CliError, CliResult};
use tracing_subscriber::EnvFilter;

/// Default filter directive for a verbosity level
#[must_use]
pub const fn default_directive(verbosity: Verbosity) -> &'static str {
    match verbosity {
        Verbosity::Quiet => "error",
        Verbosity::Normal => "warn",
        Verbosity::Verbose => "warn,wardprobe=info,wardprobe_cli=info",
        Verbosity::Debug => "info,wardprobe=debug,wardprobe_cli=debug",
    }
}

/// Filter from `RUST_LOG`, falling back to the verbosity default
#[must_use]
pub fn env_filter(verbosity: Verbosity) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)))
}

/// Install the global subscriber
///
/// # Errors
///
/// `Config` if a subscriber is already installed.
pub fn init_logging(verbosity: Verbosity, format: LogFormat, color: bool) -> CliResult<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbosity))
        .with_writer(std::io::stderr)
        .with_target(verbosity.is_verbose());

    let installed = match format {
        LogFormat::Text => builder.with_ansi(color).try_init(),
        LogFormat::Json => builder.json().with_current_span(false).try_init(),
    };
    installed.map_err(|e| CliError::config(format!("failed to install log subscriber: {e}")))
}
