//! Wardprobe CLI library
//!
//! Command-line front end that launches a browser, logs in and runs the
//! Substore test cases against it.

#![warn(missing_docs)]

mod commands;
mod config;
mod error;
mod logging;
mod output;
mod runner;

pub use commands::{Cli, ColorArg, Commands, ConfigArgs, ListArgs, LogFormatArg, RunArgs};
pub use config::{
    load_suite_config, load_suite_config_with, CliConfig, ColorChoice, LogFormat, Verbosity,
};
pub use error::{CliError, CliResult};
pub use logging::{default_directive, env_filter, init_logging};
pub use output::ProgressReporter;
pub use runner::{Outcome, SuiteReport, SuiteRunner, TestCase, TestResult};
