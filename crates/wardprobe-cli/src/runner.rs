//! Suite runner: log in once, then run the Substore test cases in order

use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use wardprobe::{
    Diagnostic, LoginPage, SubstorePage, SuiteConfig, UiError, UiResult, WebDriver,
    REQUISITION_SAVED_MESSAGE,
};

/// Substore test cases, in run order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TestCase {
    /// Open the Substore tab
    SubstoreTab,
    /// Click the counter if one is offered
    FourthCounter,
    /// Sign-out tooltip text
    #[serde(rename = "signout-hover-text")]
    SignOutHoverText,
    /// Inventory and Pharmacy sub-modules
    SubModules,
    /// Inventory sub-module tabs are displayed
    SubModulePresence,
    /// Walk every Inventory sub-module
    SubModuleNavigation,
    /// Screenshot of the current page
    Screenshot,
    /// Requisition list controls
    RequisitionControls,
    /// Create a requisition
    CreateRequisition,
}

impl TestCase {
    /// Every case, in run order
    pub const ALL: [Self; 9] = [
        Self::SubstoreTab,
        Self::FourthCounter,
        Self::SignOutHoverText,
        Self::SubModules,
        Self::SubModulePresence,
        Self::SubModuleNavigation,
        Self::Screenshot,
        Self::RequisitionControls,
        Self::CreateRequisition,
    ];

    /// Stable identifier used by `--filter` and reports
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::SubstoreTab => "substore-tab",
            Self::FourthCounter => "fourth-counter",
            Self::SignOutHoverText => "signout-hover-text",
            Self::SubModules => "sub-modules",
            Self::SubModulePresence => "sub-module-presence",
            Self::SubModuleNavigation => "sub-module-navigation",
            Self::Screenshot => "screenshot",
            Self::RequisitionControls => "requisition-controls",
            Self::CreateRequisition => "create-requisition",
        }
    }

    /// One-line description
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::SubstoreTab => "Scroll to the Substore tab and verify the URL",
            Self::FourthCounter => "Click the counter if available",
            Self::SignOutHoverText => "Verify the sign-out hover text",
            Self::SubModules => "Open the Inventory and Pharmacy sub-modules",
            Self::SubModulePresence => "Verify Inventory sub-modules are displayed",
            Self::SubModuleNavigation => "Navigate between Inventory sub-modules",
            Self::Screenshot => "Take a screenshot of the current page",
            Self::RequisitionControls => "Verify Inventory Requisition controls",
            Self::CreateRequisition => "Create an Inventory Requisition",
        }
    }

    /// Whether `pattern` selects this case (id substring, or description
    /// substring ignoring case)
    #[must_use]
    pub fn matches(self, pattern: &str) -> bool {
        let pattern = pattern.to_lowercase();
        self.id().contains(&pattern) || self.description().to_lowercase().contains(&pattern)
    }

    /// Cases selected by `filter`, in run order
    #[must_use]
    pub fn select(filter: Option<&str>) -> Vec<Self> {
        Self::ALL
            .into_iter()
            .filter(|case| filter.map_or(true, |pattern| case.matches(pattern)))
            .collect()
    }

    /// Run the case and return a short detail on success
    ///
    /// # Errors
    ///
    /// The workflow error, or `AssertionFailed` when the workflow reports a
    /// negative result.
    pub fn execute<D: WebDriver + ?Sized>(
        self,
        page: &SubstorePage<'_, D>,
        config: &SuiteConfig,
    ) -> UiResult<String> {
        match self {
            Self::SubstoreTab => page.scroll_to_substore_tab_and_verify_url(),
            Self::FourthCounter => {
                expect_true(page.click_fourth_counter_if_available()?, "counter click")
            }
            Self::SignOutHoverText => expect_true(
                page.verify_module_signout_hover_text(&config.expected)?,
                "sign-out hover text",
            ),
            Self::SubModules => expect_true(
                page.verify_substore_sub_module(&config.expected)?,
                "Inventory and Pharmacy sub-modules",
            ),
            Self::SubModulePresence => expect_true(
                page.sub_module_present_inventory()?,
                "displayed Inventory sub-modules",
            ),
            Self::SubModuleNavigation => expect_true(
                page.verify_navigation_between_submodules()?,
                "sub-module navigation",
            ),
            Self::Screenshot => expect_true(
                page.taking_screenshot_of_the_current_page()?,
                "screenshot",
            ),
            Self::RequisitionControls => expect_true(
                page.verify_inventory_requisition_ui_elements()?,
                "requisition controls",
            ),
            Self::CreateRequisition => {
                let message = page.verify_create_requisition_button(&config.requisition)?;
                if message.contains(REQUISITION_SAVED_MESSAGE) {
                    Ok(message)
                } else {
                    Err(UiError::assertion(format!(
                        "expected '{REQUISITION_SAVED_MESSAGE}', got '{message}'"
                    )))
                }
            }
        }
    }
}

fn expect_true(value: bool, what: &str) -> UiResult<String> {
    if value {
        Ok(format!("{what} verified"))
    } else {
        Err(UiError::assertion(format!("{what} not verified")))
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Outcome of one test case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Case passed
    Passed,
    /// Case failed
    Failed,
    /// Not run after an earlier failure (`--fail-fast`)
    Skipped,
}

/// Test case result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    /// Case id
    pub id: String,
    /// Case description
    pub description: String,
    /// Outcome
    pub outcome: Outcome,
    /// Detail on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Error chain on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl TestResult {
    fn new(case: TestCase, outcome: Outcome, duration: Duration) -> Self {
        Self {
            id: case.id().to_string(),
            description: case.description().to_string(),
            outcome,
            detail: None,
            error: None,
            duration_ms: millis(duration),
        }
    }

    /// Create a passing result
    #[must_use]
    pub fn pass(case: TestCase, detail: impl Into<String>, duration: Duration) -> Self {
        Self {
            detail: Some(detail.into()),
            ..Self::new(case, Outcome::Passed, duration)
        }
    }

    /// Create a failing result
    #[must_use]
    pub fn fail(case: TestCase, error: impl Into<String>, duration: Duration) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::new(case, Outcome::Failed, duration)
        }
    }

    /// Create a skipped result
    #[must_use]
    pub fn skip(case: TestCase) -> Self {
        Self::new(case, Outcome::Skipped, Duration::ZERO)
    }
}

/// Results of one suite run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteReport {
    /// Local start time, RFC 3339
    pub started_at: String,
    /// Application URL
    pub base_url: String,
    /// Per-case results, in run order
    pub results: Vec<TestResult>,
    /// Non-fatal problems (failed highlights)
    #[serde(default)]
    pub diagnostics: Vec<String>,
    /// Total duration in milliseconds
    pub duration_ms: u64,
}

impl SuiteReport {
    /// Empty report stamped now
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            started_at: chrono::Local::now().to_rfc3339(),
            base_url: base_url.into(),
            results: Vec::new(),
            diagnostics: Vec::new(),
            duration_ms: 0,
        }
    }

    fn count(&self, outcome: Outcome) -> usize {
        self.results.iter().filter(|r| r.outcome == outcome).count()
    }

    /// Number of passed cases
    #[must_use]
    pub fn passed(&self) -> usize {
        self.count(Outcome::Passed)
    }

    /// Number of failed cases
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(Outcome::Failed)
    }

    /// Number of skipped cases
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(Outcome::Skipped)
    }

    /// Number of cases
    #[must_use]
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// No case failed or was skipped
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.outcome == Outcome::Passed)
    }

    /// Failed results
    #[must_use]
    pub fn failures(&self) -> Vec<&TestResult> {
        self.results
            .iter()
            .filter(|r| r.outcome == Outcome::Failed)
            .collect()
    }

    /// Pretty JSON
    ///
    /// # Errors
    ///
    /// Serialization failure.
    pub fn to_json(&self) -> CliResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CliError::test_execution(format!("failed to serialize report: {e}")))
    }

    /// Write the JSON report to `path`
    ///
    /// # Errors
    ///
    /// Serialization or I/O failure.
    pub fn write_json(&self, path: &Path) -> CliResult<()> {
        std::fs::write(path, self.to_json()?)?;
        info!(path = %path.display(), "Report written");
        Ok(())
    }
}

/// Runs the selected cases against one browser session
#[derive(Debug)]
pub struct SuiteRunner<'a, D: WebDriver + ?Sized> {
    driver: &'a D,
    config: &'a SuiteConfig,
    reporter: ProgressReporter,
    fail_fast: bool,
}

impl<'a, D: WebDriver + ?Sized> SuiteRunner<'a, D> {
    /// Create a runner
    #[must_use]
    pub fn new(driver: &'a D, config: &'a SuiteConfig, reporter: ProgressReporter) -> Self {
        Self {
            driver,
            config,
            reporter,
            fail_fast: false,
        }
    }

    /// Skip the remaining cases after the first failure
    #[must_use]
    pub const fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Navigate to the base URL, log in, and run `cases` in order.
    ///
    /// A failing case does not abort the run unless fail-fast is set; the
    /// report says what happened to each case.
    ///
    /// # Errors
    ///
    /// `Ui` if the base URL cannot be opened, `TestExecution` if login fails.
    pub fn run(&self, cases: &[TestCase]) -> CliResult<SuiteReport> {
        let start = Instant::now();
        let mut report = SuiteReport::new(&self.config.base_url);
        self.reporter.header("Substore suite");

        self.driver.navigate(&self.config.base_url)?;
        let login = LoginPage::from_config(self.driver, self.config);
        login
            .perform_login()
            .map_err(|e| CliError::test_execution(format!("login failed: {}", e.chain())))?;
        self.reporter.info("Logged in");

        let page = SubstorePage::from_config(self.driver, self.config);
        let mut stopped = false;
        for &case in cases {
            if stopped {
                self.reporter.skipped(case.id());
                report.results.push(TestResult::skip(case));
                continue;
            }

            let started = Instant::now();
            let result = match case.execute(&page, self.config) {
                Ok(detail) => {
                    info!(case = case.id(), %detail, "Test case passed");
                    self.reporter
                        .success(&format!("{} {}", case.id(), case.description()));
                    TestResult::pass(case, detail, started.elapsed())
                }
                Err(err) => {
                    let message = err.chain();
                    warn!(case = case.id(), error = %message, "Test case failed");
                    self.reporter.failure(&format!("{}: {message}", case.id()));
                    stopped = self.fail_fast;
                    TestResult::fail(case, message, started.elapsed())
                }
            };
            report.results.push(result);
        }

        report.diagnostics = login
            .events()
            .diagnostics()
            .iter()
            .chain(page.events().diagnostics().iter())
            .map(describe)
            .collect();
        for line in &report.diagnostics {
            self.reporter.warning(line);
        }
        report.duration_ms = millis(start.elapsed());
        self.reporter.summary(
            report.passed(),
            report.failed(),
            report.skipped(),
            start.elapsed(),
        );
        Ok(report)
    }
}

fn describe(diagnostic: &Diagnostic) -> String {
    format!(
        "{} {}: {}",
        diagnostic.operation, diagnostic.target, diagnostic.message
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use wardprobe::{
        LoginLocators, MockDriver, MockEffect, MockElement, SubstoreLocators, Timeouts,
    };

    mod test_case_tests {
        use super::*;

        #[test]
        fn test_ids_are_unique() {
            for (i, a) in TestCase::ALL.iter().enumerate() {
                for b in &TestCase::ALL[i + 1..] {
                    assert_ne!(a.id(), b.id());
                }
            }
        }

        #[test]
        fn test_select_all_in_order() {
            assert_eq!(TestCase::select(None), TestCase::ALL.to_vec());
        }

        #[test]
        fn test_select_by_id_fragment() {
            assert_eq!(
                TestCase::select(Some("requisition")),
                vec![TestCase::RequisitionControls, TestCase::CreateRequisition]
            );
            assert!(TestCase::select(Some("nope")).is_empty());
        }

        #[test]
        fn test_select_by_description_ignores_case() {
            assert_eq!(
                TestCase::select(Some("PHARMACY")),
                vec![TestCase::SubModules]
            );
        }

        #[test]
        fn test_serde_uses_ids() {
            let json = serde_json::to_string(&TestCase::SignOutHoverText).unwrap();
            assert_eq!(json, "\"signout-hover-text\"");
        }

        #[test]
        fn test_serde_round_trips_every_id() {
            for case in TestCase::ALL {
                let json = serde_json::to_string(&case).unwrap();
                assert_eq!(json, format!("\"{}\"", case.id()));
                let back: TestCase = serde_json::from_str(&json).unwrap();
                assert_eq!(back, case);
            }
        }
    }

    mod suite_runner_tests {
        use super::*;

        struct Fixture {
            dir: tempfile::TempDir,
            config: SuiteConfig,
        }

        fn fixture(with_credentials: bool) -> Fixture {
            let dir = tempfile::tempdir().unwrap();
            if with_credentials {
                std::fs::write(
                    dir.path().join("LoginData.json"),
                    r#"{"ValidLogin":{"Username":"admin","Password":"pass123"}}"#,
                )
                .unwrap();
            }
            let config = SuiteConfig::default()
                .with_base_url("http://emr.local/Account/Login")
                .with_test_data_dir(dir.path())
                .with_screenshot_dir(dir.path())
                .with_timeouts(Timeouts {
                    element_secs: 1,
                    page_secs: 1,
                    url_ms: 200,
                    poll_ms: 5,
                });
            Fixture { dir, config }
        }

        /// Logged-in application with an Inventory link but no sub-module tabs
        fn application() -> MockDriver {
            let login = LoginLocators::default();
            let substore = SubstoreLocators::default();
            MockDriver::new()
                .with_element(MockElement::new(login.username_input.selector().clone()))
                .with_element(MockElement::new(login.password_input.selector().clone()))
                .with_element(
                    MockElement::new(login.login_button.selector().clone()).on_click(
                        MockEffect::Insert(MockElement::new(login.admin_menu.selector().clone())),
                    ),
                )
                .with_element(MockElement::new(substore.inventory.selector().clone()))
        }

        const CASES: [TestCase; 3] = [
            TestCase::FourthCounter,
            TestCase::SubModulePresence,
            TestCase::Screenshot,
        ];

        #[test]
        fn test_failures_do_not_stop_the_run() {
            let fx = fixture(true);
            let driver = application();
            let report = SuiteRunner::new(&driver, &fx.config, ProgressReporter::silent())
                .run(&CASES)
                .unwrap();

            assert_eq!(report.total(), 3);
            assert_eq!(report.passed(), 2);
            assert_eq!(report.failed(), 1);
            assert!(!report.all_passed());
            let failure = report.failures()[0];
            assert_eq!(failure.id, "sub-module-presence");
            assert!(failure
                .error
                .as_deref()
                .unwrap()
                .contains("displayed Inventory sub-modules not verified"));
            assert!(driver.was_called("navigate:http://emr.local/Account/Login"));
            assert_eq!(
                std::fs::read_dir(fx.dir.path())
                    .unwrap()
                    .filter_map(Result::ok)
                    .filter(|e| e.file_name().to_string_lossy().starts_with("SubStore_"))
                    .count(),
                1
            );
        }

        #[test]
        fn test_fail_fast_skips_the_rest() {
            let fx = fixture(true);
            let driver = application();
            let report = SuiteRunner::new(&driver, &fx.config, ProgressReporter::silent())
                .with_fail_fast(true)
                .run(&CASES)
                .unwrap();

            let outcomes: Vec<_> = report.results.iter().map(|r| r.outcome).collect();
            assert_eq!(
                outcomes,
                vec![Outcome::Passed, Outcome::Failed, Outcome::Skipped]
            );
            assert_eq!(report.skipped(), 1);
            assert!(!driver.was_called("screenshot"));
        }

        #[test]
        fn test_login_failure_aborts() {
            let fx = fixture(false);
            let driver = application();
            let err = SuiteRunner::new(&driver, &fx.config, ProgressReporter::silent())
                .run(&CASES)
                .unwrap_err();
            assert!(matches!(err, CliError::TestExecution { .. }));
            assert!(err.to_string().contains("login failed"));
        }

        #[test]
        fn test_highlight_failures_become_diagnostics() {
            let fx = fixture(true);
            let pharmacy = SubstoreLocators::default().pharmacy.selector().clone();
            let driver = application()
                .with_element(MockElement::new(pharmacy))
                .with_failing_scripts("style is read-only");
            let report = SuiteRunner::new(&driver, &fx.config, ProgressReporter::silent())
                .run(&[TestCase::SubModules])
                .unwrap();

            assert!(report.all_passed());
            assert_eq!(report.diagnostics.len(), 2);
            for line in &report.diagnostics {
                assert!(line.starts_with("highlight "));
                assert!(line.contains("style is read-only"));
            }
        }

        #[test]
        fn test_report_round_trips_through_json() {
            let fx = fixture(true);
            let driver = application();
            let report = SuiteRunner::new(&driver, &fx.config, ProgressReporter::silent())
                .run(&CASES)
                .unwrap();

            let path = fx.dir.path().join("report.json");
            report.write_json(&path).unwrap();
            let text = std::fs::read_to_string(&path).unwrap();
            assert!(text.contains("\"outcome\": \"failed\""));
            let parsed: SuiteReport = serde_json::from_str(&text).unwrap();
            assert_eq!(parsed, report);
        }
    }
}
