//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Wardprobe: page-object browser tests for the WardSupply (Substore) module
#[derive(Parser, Debug)]
#[command(name = "wardprobe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (failures only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Log line format
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormatArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the Substore test cases
    List(ListArgs),

    /// Show the resolved suite configuration
    Config(ConfigArgs),

    /// Log in and run the Substore test cases in a browser
    Run(RunArgs),
}

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Only cases whose id or description contains this pattern
    #[arg(short, long)]
    pub filter: Option<String>,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Suite configuration file (YAML)
    #[arg(short, long, env = "WARDPROBE_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Suite configuration file (YAML)
    #[arg(short, long, env = "WARDPROBE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Only cases whose id or description contains this pattern
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Stop at the first failing case
    #[arg(long)]
    pub fail_fast: bool,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Write a JSON report to this file
    #[arg(short, long)]
    pub report: Option<PathBuf>,

    /// Directory for screenshots (overrides the configuration)
    #[arg(long)]
    pub screenshot_dir: Option<PathBuf>,
}

/// Color argument for CLI
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

/// Log format argument for CLI
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormatArg {
    /// Human-readable lines
    #[default]
    Text,
    /// JSON lines
    Json,
}

impl From<LogFormatArg> for crate::config::LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Text => Self::Text,
            LogFormatArg::Json => Self::Json,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    mod cli_tests {
        use super::*;

        #[test]
        fn test_parse_list_command() {
            let cli = Cli::parse_from(["wardprobe", "list"]);
            assert!(matches!(cli.command, Commands::List(ListArgs { filter: None })));
        }

        #[test]
        fn test_parse_config_with_file() {
            let cli = Cli::parse_from(["wardprobe", "config", "--config", "suite.yaml"]);
            if let Commands::Config(args) = cli.command {
                assert_eq!(args.config, Some(PathBuf::from("suite.yaml")));
            } else {
                panic!("expected Config command");
            }
        }

        #[test]
        fn test_parse_run_defaults() {
            let cli = Cli::parse_from(["wardprobe", "run"]);
            if let Commands::Run(args) = cli.command {
                assert!(args.filter.is_none());
                assert!(!args.fail_fast);
                assert!(!args.headed);
                assert!(args.report.is_none());
            } else {
                panic!("expected Run command");
            }
        }

        #[test]
        fn test_parse_run_with_options() {
            let cli = Cli::parse_from([
                "wardprobe",
                "run",
                "--filter",
                "requisition",
                "--fail-fast",
                "--headed",
                "--report",
                "out/report.json",
            ]);
            if let Commands::Run(args) = cli.command {
                assert_eq!(args.filter.as_deref(), Some("requisition"));
                assert!(args.fail_fast);
                assert!(args.headed);
                assert_eq!(args.report, Some(PathBuf::from("out/report.json")));
            } else {
                panic!("expected Run command");
            }
        }

        #[test]
        fn test_global_flags_after_subcommand() {
            let cli = Cli::parse_from(["wardprobe", "list", "-vv", "--log-format", "json"]);
            assert_eq!(cli.verbose, 2);
            assert!(matches!(cli.log_format, LogFormatArg::Json));
        }

        #[test]
        fn test_global_quiet_flag() {
            let cli = Cli::parse_from(["wardprobe", "-q", "list"]);
            assert!(cli.quiet);
        }

        #[test]
        fn test_subcommand_required() {
            assert!(Cli::try_parse_from(["wardprobe"]).is_err());
        }
    }

    mod format_tests {
        use super::*;
        use crate::config::{ColorChoice, LogFormat};

        #[test]
        fn test_color_arg_conversion() {
            assert_eq!(ColorChoice::from(ColorArg::Auto), ColorChoice::Auto);
            assert_eq!(ColorChoice::from(ColorArg::Always), ColorChoice::Always);
            assert_eq!(ColorChoice::from(ColorArg::Never), ColorChoice::Never);
        }

        #[test]
        fn test_log_format_conversion() {
            assert_eq!(LogFormat::from(LogFormatArg::Text), LogFormat::Text);
            assert_eq!(LogFormat::from(LogFormatArg::Json), LogFormat::Json);
        }
    }
}
