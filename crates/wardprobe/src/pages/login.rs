//! Login page.

use crate::config::SuiteConfig;
use crate::driver::WebDriver;
use crate::events::CommonEvents;
use crate::locator::Locator;
use crate::page_object::PageObject;
use crate::result::{UiError, UiResult};
use crate::test_data::Credentials;
use crate::wait::WaitPolicy;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Login form locators
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginLocators {
    /// User name field
    pub username_input: Locator,
    /// Password field
    pub password_input: Locator,
    /// Submit button
    pub login_button: Locator,
    /// User dropdown shown once logged in
    pub admin_menu: Locator,
    /// "Log Out" entry of the user dropdown
    pub log_out: Locator,
}

impl Default for LoginLocators {
    fn default() -> Self {
        Self {
            username_input: Locator::id("username field", "username_id"),
            password_input: Locator::id("password field", "password"),
            login_button: Locator::id("login button", "login"),
            admin_menu: Locator::xpath("user dropdown", r#"//li[@class="dropdown dropdown-user"]"#),
            log_out: Locator::xpath("log out link", "//a[text() = ' Log Out ']"),
        }
    }
}

/// Login page object
#[derive(Debug)]
pub struct LoginPage<'d, D: WebDriver + ?Sized> {
    events: CommonEvents<'d, D>,
    locators: LoginLocators,
    fixture: PathBuf,
    page_wait: WaitPolicy,
}

impl<'d, D: WebDriver + ?Sized> LoginPage<'d, D> {
    /// Login page reading credentials from `fixture`
    #[must_use]
    pub fn new(driver: &'d D, fixture: impl Into<PathBuf>) -> Self {
        Self {
            events: CommonEvents::new(driver),
            locators: LoginLocators::default(),
            fixture: fixture.into(),
            page_wait: WaitPolicy::from_millis(crate::wait::DEFAULT_PAGE_TIMEOUT_MS),
        }
    }

    /// Login page with fixture path and waits taken from `config`
    #[must_use]
    pub fn from_config(driver: &'d D, config: &SuiteConfig) -> Self {
        Self::new(driver, config.login_fixture_path())
            .with_events(CommonEvents::new(driver).with_wait(config.timeouts.element_wait()))
            .with_page_wait(config.timeouts.page_wait())
    }

    /// Replace the interaction helpers
    #[must_use]
    pub fn with_events(mut self, events: CommonEvents<'d, D>) -> Self {
        self.events = events;
        self
    }

    /// Bound for the post-login and post-logout waits
    #[must_use]
    pub fn with_page_wait(mut self, page_wait: WaitPolicy) -> Self {
        self.page_wait = page_wait;
        self
    }

    /// Locators
    #[must_use]
    pub fn locators(&self) -> &LoginLocators {
        &self.locators
    }

    /// Interaction helpers
    #[must_use]
    pub fn events(&self) -> &CommonEvents<'d, D> {
        &self.events
    }

    /// Credentials fixture
    #[must_use]
    pub fn fixture(&self) -> &Path {
        &self.fixture
    }

    /// Log in with the `ValidLogin` credentials from the fixture.
    ///
    /// The fixture is read before the form is touched, so a missing key
    /// fails without any interaction.
    ///
    /// # Errors
    ///
    /// `Workflow` wrapping `Fixture`/`MissingKey`, or the interaction or wait
    /// failure.
    pub fn perform_login(&self) -> UiResult<()> {
        let credentials = Credentials::load(&self.fixture).map_err(UiError::in_workflow(
            "perform_login",
            "Failed to load login test data",
        ))?;
        self.login_with(&credentials)
    }

    /// Log in with explicit credentials
    ///
    /// # Errors
    ///
    /// `Workflow` wrapping the first failing step.
    pub fn login_with(&self, credentials: &Credentials) -> UiResult<()> {
        info!(username = %credentials.username, "Logging in");
        let l = &self.locators;
        let result = self
            .events
            .send_keys(&l.username_input, &credentials.username)
            .and_then(|()| self.events.send_keys(&l.password_input, &credentials.password))
            .and_then(|()| self.events.click(&l.login_button))
            .and_then(|()| self.events.wait_for_visible(&l.admin_menu, self.page_wait.timeout()));

        match result {
            Ok(_) => {
                info!("Login successful");
                Ok(())
            }
            Err(err) => {
                error!(error = %err.chain(), "Error during login");
                Err(UiError::in_workflow("perform_login", "Error during login")(err))
            }
        }
    }

    /// Open the user dropdown, choose "Log Out", and wait for the login form
    ///
    /// # Errors
    ///
    /// `Workflow` wrapping the first failing step.
    pub fn perform_logout(&self) -> UiResult<()> {
        let l = &self.locators;
        self.events
            .click(&l.admin_menu)
            .and_then(|()| self.events.click(&l.log_out))
            .and_then(|()| {
                self.events
                    .wait_for_visible(&l.username_input, self.page_wait.timeout())
            })
            .map_err(UiError::in_workflow("perform_logout", "Error during logout"))?;
        info!("Logged out");
        Ok(())
    }
}

impl<D: WebDriver + ?Sized> PageObject for LoginPage<'_, D> {
    fn url_pattern(&self) -> &str {
        "Login"
    }

    fn ready_marker(&self) -> &Locator {
        &self.locators.username_input
    }

    fn load_timeout_ms(&self) -> u64 {
        self.page_wait.timeout_ms()
    }

    fn page_name(&self) -> &str {
        "LoginPage"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::Selector;
    use crate::mock::{MockDriver, MockEffect, MockElement};
    use std::time::Duration;

    fn fast() -> WaitPolicy {
        WaitPolicy::from_millis(200).with_poll_interval(Duration::from_millis(5))
    }

    fn login_form() -> MockDriver {
        MockDriver::new()
            .with_url("http://emr/Account/Login")
            .with_element(MockElement::new(Selector::id("username_id")))
            .with_element(MockElement::new(Selector::id("password")))
            .with_element(MockElement::new(Selector::id("login")).on_click(MockEffect::Insert(
                MockElement::new(Selector::xpath(r#"//li[@class="dropdown dropdown-user"]"#)),
            )))
    }

    fn page<'d>(driver: &'d MockDriver, fixture: &Path) -> LoginPage<'d, MockDriver> {
        LoginPage::new(driver, fixture)
            .with_events(CommonEvents::new(driver).with_wait(fast()))
            .with_page_wait(fast())
    }

    fn fixture(dir: &tempfile::TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("LoginData.json");
        std::fs::write(&path, body).unwrap();
        path
    }

    mod perform_login_tests {
        use super::*;

        #[test]
        fn test_valid_login_reaches_dashboard() {
            let dir = tempfile::tempdir().unwrap();
            let path = fixture(&dir, r#"{"ValidLogin":{"Username":"admin","Password":"pass123"}}"#);
            let driver = login_form();
            page(&driver, &path).perform_login().unwrap();
            assert_eq!(driver.typed_value(&Selector::id("username_id")).unwrap(), "admin");
            assert_eq!(driver.typed_value(&Selector::id("password")).unwrap(), "pass123");
            assert_eq!(driver.click_count(&Selector::id("login")), 1);
        }

        #[test]
        fn test_missing_key_fails_before_interaction() {
            let dir = tempfile::tempdir().unwrap();
            let path = fixture(&dir, r#"{"ValidLogin":{"Username":"admin"}}"#);
            let driver = login_form();
            let err = page(&driver, &path).perform_login().unwrap_err();
            assert!(matches!(err.root_cause(), UiError::MissingKey { key } if key == "ValidLogin.Password"));
            assert!(driver.calls().is_empty());
        }

        #[test]
        fn test_marker_never_visible_is_timeout() {
            let dir = tempfile::tempdir().unwrap();
            let path = fixture(&dir, r#"{"ValidLogin":{"Username":"admin","Password":"bad"}}"#);
            let driver = MockDriver::new()
                .with_element(MockElement::new(Selector::id("username_id")))
                .with_element(MockElement::new(Selector::id("password")))
                .with_element(MockElement::new(Selector::id("login")));
            let err = page(&driver, &path).perform_login().unwrap_err();
            assert!(matches!(err, UiError::Workflow { workflow: "perform_login", .. }));
            assert!(err.is_timeout());
            assert!(err.chain().contains("user dropdown"));
        }

        #[test]
        fn test_login_with_explicit_credentials() {
            let creds = Credentials {
                username: "nurse".into(),
                password: "s3cret".into(),
            };
            let driver = login_form();
            let dir = tempfile::tempdir().unwrap();
            page(&driver, &dir.path().join("unused.json"))
                .login_with(&creds)
                .unwrap();
            assert_eq!(driver.typed_value(&Selector::id("username_id")).unwrap(), "nurse");
            assert!(driver.was_called("click:id=login"));
        }
    }

    mod perform_logout_tests {
        use super::*;

        #[test]
        fn test_logout_returns_to_form() {
            let driver = MockDriver::new()
                .with_element(MockElement::new(Selector::xpath(
                    r#"//li[@class="dropdown dropdown-user"]"#,
                )))
                .with_element(
                    MockElement::new(Selector::xpath("//a[text() = ' Log Out ']"))
                        .on_click(MockEffect::Show(Selector::id("username_id"))),
                )
                .with_element(MockElement::new(Selector::id("username_id")).hidden());
            let dir = tempfile::tempdir().unwrap();
            let login = page(&driver, dir.path());
            login.perform_logout().unwrap();
            assert_eq!(
                driver.click_count(&Selector::xpath("//a[text() = ' Log Out ']")),
                1
            );
        }
    }

    #[test]
    fn test_page_object_impl() {
        let driver = MockDriver::new();
        let login = LoginPage::new(&driver, "TestData/LoginData.json");
        assert_eq!(login.page_name(), "LoginPage");
        assert_eq!(login.ready_marker().selector(), &Selector::id("username_id"));
        assert_eq!(login.load_timeout_ms(), 30_000);
    }
}
