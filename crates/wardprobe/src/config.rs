//! Suite configuration.
//!
//! Loaded from YAML; every field has a default so an empty file is valid.
//! Environment overrides are applied after loading.

use crate::browser::BrowserConfig;
use crate::pages::RequisitionForm;
use crate::result::{UiError, UiResult};
use crate::test_data::Expectations;
use crate::wait::{WaitPolicy, DEFAULT_ELEMENT_TIMEOUT_MS, DEFAULT_PAGE_TIMEOUT_MS, DEFAULT_POLL_INTERVAL_MS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Base URL override
pub const ENV_BASE_URL: &str = "WARDPROBE_BASE_URL";
/// Headless override (`true`/`false`/`1`/`0`)
pub const ENV_HEADLESS: &str = "WARDPROBE_HEADLESS";
/// Chromium binary override
pub const ENV_CHROMIUM_PATH: &str = "WARDPROBE_CHROMIUM_PATH";

/// Wait bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Element waits, seconds
    pub element_secs: u64,
    /// Page-level waits, seconds
    pub page_secs: u64,
    /// URL-contains waits between navigation steps, milliseconds
    pub url_ms: u64,
    /// Poll interval, milliseconds
    pub poll_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            element_secs: DEFAULT_ELEMENT_TIMEOUT_MS / 1000,
            page_secs: DEFAULT_PAGE_TIMEOUT_MS / 1000,
            url_ms: 5000,
            poll_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl Timeouts {
    /// Element wait policy
    #[must_use]
    pub fn element_wait(&self) -> WaitPolicy {
        WaitPolicy::from_secs(self.element_secs).with_poll_interval(Duration::from_millis(self.poll_ms))
    }

    /// Page wait policy
    #[must_use]
    pub fn page_wait(&self) -> WaitPolicy {
        WaitPolicy::from_secs(self.page_secs).with_poll_interval(Duration::from_millis(self.poll_ms))
    }
}

fn default_expectations() -> Expectations {
    Expectations::new()
        .with(Expectations::SIGN_OUT_HOVER_TEXT, "To change, you can always click here.")
        .with(Expectations::URL, "WardSupply")
}

/// Suite configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Application entry URL
    pub base_url: String,
    /// Directory holding JSON fixtures
    pub test_data_dir: PathBuf,
    /// Login fixture file name inside `test_data_dir`
    pub login_fixture: String,
    /// Screenshot directory (None = working directory)
    pub screenshot_dir: Option<PathBuf>,
    /// Wait bounds
    pub timeouts: Timeouts,
    /// Browser launch options
    pub browser: BrowserConfig,
    /// Values entered by the create-requisition case
    pub requisition: RequisitionForm,
    /// Expected values for verification cases
    pub expected: Expectations,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/".to_string(),
            test_data_dir: PathBuf::from("TestData"),
            login_fixture: "LoginData.json".to_string(),
            screenshot_dir: None,
            timeouts: Timeouts::default(),
            browser: BrowserConfig::default(),
            requisition: RequisitionForm::default(),
            expected: default_expectations(),
        }
    }
}

impl SuiteConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse YAML
    ///
    /// # Errors
    ///
    /// `Yaml` on malformed input.
    pub fn from_yaml_str(yaml: &str) -> UiResult<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Read and parse a YAML file
    ///
    /// # Errors
    ///
    /// `Config` if unreadable, `Yaml` if malformed.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> UiResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| UiError::config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_yaml_str(&raw)
    }

    /// Serialize to YAML
    ///
    /// # Errors
    ///
    /// `Yaml` on serialization failure.
    pub fn to_yaml(&self) -> UiResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Apply `WARDPROBE_*` overrides from `lookup`
    ///
    /// # Errors
    ///
    /// `Config` for an unparseable boolean.
    pub fn apply_env_overrides<F>(mut self, lookup: F) -> UiResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BASE_URL) {
            self.base_url = url;
        }
        if let Some(raw) = lookup(ENV_HEADLESS) {
            self.browser.headless = parse_bool(&raw)
                .ok_or_else(|| UiError::config(format!("{ENV_HEADLESS}: expected a boolean, got '{raw}'")))?;
        }
        if let Some(path) = lookup(ENV_CHROMIUM_PATH) {
            self.browser.chromium_path = Some(path);
        }
        Ok(self)
    }

    /// Apply overrides from the process environment
    ///
    /// # Errors
    ///
    /// See [`SuiteConfig::apply_env_overrides`].
    pub fn with_process_env(self) -> UiResult<Self> {
        self.apply_env_overrides(|key| std::env::var(key).ok())
    }

    /// Reject settings no run could succeed with
    ///
    /// # Errors
    ///
    /// `Config` naming the first bad field.
    pub fn validate(&self) -> UiResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(UiError::config("base_url must not be empty"));
        }
        if self.login_fixture.trim().is_empty() {
            return Err(UiError::config("login_fixture must not be empty"));
        }
        let t = &self.timeouts;
        for (name, value) in [
            ("timeouts.element_secs", t.element_secs),
            ("timeouts.page_secs", t.page_secs),
            ("timeouts.url_ms", t.url_ms),
            ("timeouts.poll_ms", t.poll_ms),
        ] {
            if value == 0 {
                return Err(UiError::config(format!("{name} must be greater than zero")));
            }
        }
        if self.requisition.quantity == 0 {
            return Err(UiError::config("requisition.quantity must be greater than zero"));
        }
        Ok(())
    }

    /// Full path of the login fixture
    #[must_use]
    pub fn login_fixture_path(&self) -> PathBuf {
        self.test_data_dir.join(&self.login_fixture)
    }

    /// Set base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set fixture directory
    #[must_use]
    pub fn with_test_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.test_data_dir = dir.into();
        self
    }

    /// Set screenshot directory
    #[must_use]
    pub fn with_screenshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.screenshot_dir = Some(dir.into());
        self
    }

    /// Set wait bounds
    #[must_use]
    pub const fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.browser.headless = headless;
        self
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
