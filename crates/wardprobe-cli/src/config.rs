//! CLI configuration

use crate::error::CliResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use wardprobe::SuiteConfig;

/// CLI verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Verbosity {
    /// Quiet - failures only
    Quiet,
    /// Normal - default output
    #[default]
    Normal,
    /// Verbose - workflow milestones
    Verbose,
    /// Debug - every driver step
    Debug,
}

impl Verbosity {
    /// Verbosity from the `-q` flag and the `-v` count
    #[must_use]
    pub const fn from_flags(quiet: bool, verbose: u8) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Debug,
        }
    }

    /// Check if quiet mode
    #[must_use]
    pub const fn is_quiet(self) -> bool {
        matches!(self, Self::Quiet)
    }

    /// Check if verbose or higher
    #[must_use]
    pub const fn is_verbose(self) -> bool {
        matches!(self, Self::Verbose | Self::Debug)
    }
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorChoice {
    /// Always use colors
    Always,
    /// Use colors when stderr is a terminal
    #[default]
    Auto,
    /// Never use colors
    Never,
}

impl ColorChoice {
    /// Should use colors based on output detection
    #[must_use]
    pub fn should_color(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => console::Term::stderr().features().colors_supported(),
        }
    }
}

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Verbosity level
    pub verbosity: Verbosity,
    /// Color output choice
    pub color: ColorChoice,
    /// Log line format
    pub log_format: LogFormat,
    /// Stop at the first failing test case
    pub fail_fast: bool,
    /// Where to write the JSON report
    pub report: Option<PathBuf>,
}

impl CliConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set verbosity
    #[must_use]
    pub const fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set color choice
    #[must_use]
    pub const fn with_color(mut self, color: ColorChoice) -> Self {
        self.color = color;
        self
    }

    /// Set log format
    #[must_use]
    pub const fn with_log_format(mut self, log_format: LogFormat) -> Self {
        self.log_format = log_format;
        self
    }

    /// Set fail fast
    #[must_use]
    pub const fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Set report path
    #[must_use]
    pub fn with_report(mut self, report: impl Into<PathBuf>) -> Self {
        self.report = Some(report.into());
        self
    }
}

/// Resolve the suite configuration: file (or defaults), then process
/// environment overrides, then validation.
///
/// # Errors
///
/// Unreadable or malformed file, bad override, or failed validation.
pub fn load_suite_config(path: Option<&Path>) -> CliResult<SuiteConfig> {
    load_suite_config_with(path, |key| std::env::var(key).ok())
}

/// [`load_suite_config`] with an explicit environment lookup
///
/// # Errors
///
/// Unreadable or malformed file, bad override, or failed validation.
pub fn load_suite_config_with<F>(path: Option<&Path>, lookup: F) -> CliResult<SuiteConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let config = match path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "Loading suite configuration");
            SuiteConfig::from_yaml_file(path)?
        }
        None => SuiteConfig::default(),
    };
    let config = config.apply_env_overrides(lookup)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::CliError;

    mod verbosity_tests {
        use super::*;

        #[test]
        fn test_default_verbosity() {
            assert_eq!(Verbosity::default(), Verbosity::Normal);
        }

        #[test]
        fn test_from_flags() {
            assert_eq!(Verbosity::from_flags(false, 0), Verbosity::Normal);
            assert_eq!(Verbosity::from_flags(false, 1), Verbosity::Verbose);
            assert_eq!(Verbosity::from_flags(false, 3), Verbosity::Debug);
            assert_eq!(Verbosity::from_flags(true, 2), Verbosity::Quiet);
        }

        #[test]
        fn test_is_quiet_and_verbose() {
            assert!(Verbosity::Quiet.is_quiet());
            assert!(!Verbosity::Normal.is_quiet());
            assert!(!Verbosity::Normal.is_verbose());
            assert!(Verbosity::Verbose.is_verbose());
            assert!(Verbosity::Debug.is_verbose());
        }
    }

    mod color_tests {
        use super::*;

        #[test]
        fn test_explicit_choices() {
            assert!(ColorChoice::Always.should_color());
            assert!(!ColorChoice::Never.should_color());
        }
    }

    mod cli_config_tests {
        use super::*;

        #[test]
        fn test_builder() {
            let config = CliConfig::new()
                .with_verbosity(Verbosity::Debug)
                .with_color(ColorChoice::Never)
                .with_log_format(LogFormat::Json)
                .with_fail_fast(true)
                .with_report("out/report.json");
            assert_eq!(config.verbosity, Verbosity::Debug);
            assert_eq!(config.color, ColorChoice::Never);
            assert_eq!(config.log_format, LogFormat::Json);
            assert!(config.fail_fast);
            assert_eq!(config.report, Some(PathBuf::from("out/report.json")));
        }
    }

    mod load_suite_config_tests {
        use super::*;

        fn no_env(_: &str) -> Option<String> {
            None
        }

        #[test]
        fn test_defaults_without_file() {
            let config = load_suite_config_with(None, no_env).unwrap();
            assert_eq!(config.base_url, "http://localhost:8080/");
            assert_eq!(config.requisition.quantity, 5);
        }

        #[test]
        fn test_file_then_env() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("wardprobe.yaml");
            std::fs::write(&path, "base_url: http://emr.test/\nrequisition:\n  quantity: 2\n")
                .unwrap();
            let config = load_suite_config_with(Some(&path), |key| {
                (key == wardprobe::ENV_BASE_URL).then(|| "http://override.test/".to_string())
            })
            .unwrap();
            assert_eq!(config.base_url, "http://override.test/");
            assert_eq!(config.requisition.quantity, 2);
        }

        #[test]
        fn test_invalid_file_is_ui_error() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("wardprobe.yaml");
            std::fs::write(&path, "timeouts:\n  element_secs: 0\n").unwrap();
            let err = load_suite_config_with(Some(&path), no_env).unwrap_err();
            assert!(matches!(err, CliError::Ui(_)));
        }

        #[test]
        fn test_missing_file_is_error() {
            let dir = tempfile::tempdir().unwrap();
            let err = load_suite_config_with(Some(&dir.path().join("nope.yaml")), no_env);
            assert!(err.is_err());
        }
    }
}
