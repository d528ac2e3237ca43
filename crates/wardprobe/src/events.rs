//! `CommonEvents` - generic interaction helpers shared by every page object.
//!
//! Each operation is a thin composition of [`WebDriver`] calls with an
//! explicit [`WaitPolicy`]. Operations that accept either a locator or a live
//! element take `impl Into<Target>`.

use crate::driver::{ElementHandle, Key, ScriptArg, WebDriver};
use crate::locator::{Locator, Target};
use crate::result::{UiError, UiResult};
use crate::wait::WaitPolicy;
use chrono::NaiveDateTime;
use std::cell::RefCell;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const HIGHLIGHT_SCRIPT: &str = "arguments[0].style.border='3px solid red'";
const JS_CLICK_SCRIPT: &str = "arguments[0].click();";
const SCROLL_INTO_VIEW_SCRIPT: &str = "arguments[0].scrollIntoView(true);";
const SCROLL_BY_SCRIPT: &str = "window.scrollBy(arguments[0], arguments[1]);";
const READY_STATE_SCRIPT: &str = "return document.readyState";

/// Timestamp layout used in screenshot file names
pub const SCREENSHOT_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Screenshot file name: `<prefix>_<yyyyMMdd_HHmmss>.png`
#[must_use]
pub fn screenshot_file_name(prefix: &str, at: &NaiveDateTime) -> String {
    format!("{prefix}_{}.png", at.format(SCREENSHOT_STAMP_FORMAT))
}

/// A non-critical failure that was logged and skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Operation that failed
    pub operation: &'static str,
    /// Target description
    pub target: String,
    /// Error chain
    pub message: String,
}

/// Interaction helpers over a [`WebDriver`]
#[derive(Debug)]
pub struct CommonEvents<'d, D: WebDriver + ?Sized> {
    driver: &'d D,
    wait: WaitPolicy,
    screenshot_dir: Option<PathBuf>,
    diagnostics: RefCell<Vec<Diagnostic>>,
}

impl<'d, D: WebDriver + ?Sized> CommonEvents<'d, D> {
    /// Helpers with the default 10 s element wait
    #[must_use]
    pub fn new(driver: &'d D) -> Self {
        Self {
            driver,
            wait: WaitPolicy::default(),
            screenshot_dir: None,
            diagnostics: RefCell::new(Vec::new()),
        }
    }

    /// Replace the element wait policy
    #[must_use]
    pub fn with_wait(mut self, wait: WaitPolicy) -> Self {
        self.wait = wait;
        self
    }

    /// Write screenshots to `dir` instead of the working directory
    #[must_use]
    pub fn with_screenshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.screenshot_dir = Some(dir.into());
        self
    }

    /// The underlying driver
    #[must_use]
    pub fn driver(&self) -> &'d D {
        self.driver
    }

    /// The element wait policy
    #[must_use]
    pub fn wait_policy(&self) -> WaitPolicy {
        self.wait
    }

    /// Diagnostics recorded so far
    #[must_use]
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }

    fn first_match(&self, locator: &Locator) -> UiResult<Option<ElementHandle>> {
        Ok(self
            .driver
            .find_elements(locator.selector())?
            .into_iter()
            .next()
            .map(|mut handle| {
                handle.description = locator.to_string();
                handle
            }))
    }

    fn resolve(&self, target: Target<'_>) -> UiResult<ElementHandle> {
        match target {
            Target::Locator(locator) => self.find_element(locator),
            Target::Handle(handle) => Ok(handle.clone()),
        }
    }

    fn interaction(action: &'static str, target: Target<'_>) -> impl FnOnce(UiError) -> UiError {
        let target = target.to_string();
        move |source| UiError::Interaction {
            action,
            target,
            source: Box::new(source),
        }
    }

    /// Whether the target is currently displayed.
    ///
    /// Absent and stale elements are reported as not displayed.
    pub fn is_displayed<'t>(&self, target: impl Into<Target<'t>>) -> bool {
        let displayed = match target.into() {
            Target::Locator(locator) => self
                .first_match(locator)
                .and_then(|found| match found {
                    Some(handle) => self.driver.is_displayed(&handle),
                    None => Ok(false),
                }),
            Target::Handle(handle) => self.driver.is_displayed(handle),
        };
        displayed.unwrap_or(false)
    }

    /// Wait for the first element matching `locator` to exist.
    ///
    /// # Errors
    ///
    /// `NotFound` when nothing matches within the element wait.
    pub fn find_element(&self, locator: &Locator) -> UiResult<ElementHandle> {
        debug!(%locator, "find_element");
        self.wait
            .until(|| format!("{locator} to exist"), || self.first_match(locator))
            .map_err(|err| match err {
                UiError::Timeout { timeout_ms, .. } => UiError::NotFound {
                    locator: locator.to_string(),
                    timeout_ms,
                },
                other => other,
            })
    }

    /// All elements currently matching `locator`, without waiting
    ///
    /// # Errors
    ///
    /// Driver failures only; no match is an empty list.
    pub fn find_elements(&self, locator: &Locator) -> UiResult<Vec<ElementHandle>> {
        let found = self.driver.find_elements(locator.selector())?;
        debug!(%locator, count = found.len(), "find_elements");
        Ok(found)
    }

    /// Wait until `locator` resolves to a displayed element
    ///
    /// # Errors
    ///
    /// `Timeout` naming the locator and the bound.
    pub fn wait_for_visible(&self, locator: &Locator, timeout: Duration) -> UiResult<ElementHandle> {
        self.wait.with_timeout(timeout).until(
            || format!("{locator} to be visible"),
            || match self.first_match(locator)? {
                Some(handle) if self.driver.is_displayed(&handle)? => Ok(Some(handle)),
                _ => Ok(None),
            },
        )
    }

    /// Wait until a live element is displayed
    ///
    /// # Errors
    ///
    /// `Timeout` when the bound elapses; `Stale` at once if the handle was
    /// invalidated.
    pub fn wait_till_element_visible(&self, element: &ElementHandle, timeout: Duration) -> UiResult<()> {
        self.wait.with_timeout(timeout).until_retrying(
            || format!("{element} to be visible"),
            UiError::is_retryable_for_handle,
            || Ok(self.driver.is_displayed(element)?.then_some(())),
        )
    }

    /// Wait until the target is displayed and enabled
    ///
    /// # Errors
    ///
    /// `Timeout` when the target never becomes interactable. A handle target
    /// that goes stale fails with `Stale` without waiting out the bound.
    pub fn wait_until_interactable<'t>(
        &self,
        target: impl Into<Target<'t>>,
        timeout: Duration,
    ) -> UiResult<ElementHandle> {
        let target = target.into();
        let retry: fn(&UiError) -> bool = match target {
            Target::Locator(_) => UiError::is_transient,
            Target::Handle(_) => UiError::is_retryable_for_handle,
        };
        self.wait.with_timeout(timeout).until_retrying(
            || format!("{target} to be clickable"),
            retry,
            || {
                let handle = match target {
                    Target::Locator(locator) => match self.first_match(locator)? {
                        Some(handle) => handle,
                        None => return Ok(None),
                    },
                    Target::Handle(handle) => handle.clone(),
                };
                let ready = self.driver.is_displayed(&handle)? && self.driver.is_enabled(&handle)?;
                Ok(ready.then_some(handle))
            },
        )
    }

    /// Wait until clickable, then click.
    ///
    /// # Errors
    ///
    /// `Timeout` if the target never becomes clickable; `Interaction` wrapping
    /// the driver error if the click itself fails.
    pub fn click<'t>(&self, target: impl Into<Target<'t>>) -> UiResult<()> {
        let target = target.into();
        let element = self.wait_until_interactable(target, self.wait.timeout())?;
        debug!(%target, "click");
        self.driver
            .click(&element)
            .map_err(Self::interaction("click", target))
    }

    /// Click through `HTMLElement.click()` once the element exists
    ///
    /// # Errors
    ///
    /// `NotFound` or `Interaction`.
    pub fn js_click(&self, locator: &Locator) -> UiResult<()> {
        let element = self.find_element(locator)?;
        debug!(%locator, "js_click");
        self.driver
            .execute_script(JS_CLICK_SCRIPT, &[ScriptArg::Element(&element)])
            .map(drop)
            .map_err(Self::interaction("js-click", Target::Locator(locator)))
    }

    /// Document title
    ///
    /// # Errors
    ///
    /// Driver failure.
    pub fn title(&self) -> UiResult<String> {
        self.driver.title()
    }

    /// Current URL
    ///
    /// # Errors
    ///
    /// Driver failure.
    pub fn current_url(&self) -> UiResult<String> {
        self.driver.current_url()
    }

    /// Draw a red border around the target.
    ///
    /// Best effort: a failure is logged at `warn` and kept as a
    /// [`Diagnostic`], never returned.
    pub fn highlight<'t>(&self, target: impl Into<Target<'t>>) {
        let target = target.into();
        let outcome = match target {
            Target::Locator(locator) => self.first_match(locator).and_then(|found| {
                found.ok_or_else(|| UiError::NotFound {
                    locator: locator.to_string(),
                    timeout_ms: 0,
                })
            }),
            Target::Handle(handle) => Ok(handle.clone()),
        }
        .and_then(|element| {
            self.driver
                .execute_script(HIGHLIGHT_SCRIPT, &[ScriptArg::Element(&element)])
        });

        if let Err(err) = outcome {
            let message = err.chain();
            warn!(%target, error = %message, "Highlight failed");
            self.diagnostics.borrow_mut().push(Diagnostic {
                operation: "highlight",
                target: target.to_string(),
                message,
            });
        }
    }

    /// Scroll the target to the top of the viewport
    ///
    /// # Errors
    ///
    /// `NotFound` for an unresolvable locator, or the script error.
    pub fn scroll_into_view<'t>(&self, target: impl Into<Target<'t>>) -> UiResult<()> {
        let target = target.into();
        let element = self.resolve(target)?;
        self.driver
            .execute_script(SCROLL_INTO_VIEW_SCRIPT, &[ScriptArg::Element(&element)])
            .map(drop)
            .map_err(Self::interaction("scroll to", target))
    }

    /// Scroll the window by a pixel offset
    ///
    /// # Errors
    ///
    /// `Interaction` wrapping the script error.
    pub fn scroll_by(&self, dx: i32, dy: i32) -> UiResult<()> {
        debug!(dx, dy, "scroll_by");
        self.driver
            .execute_script(
                SCROLL_BY_SCRIPT,
                &[ScriptArg::Number(f64::from(dx)), ScriptArg::Number(f64::from(dy))],
            )
            .map(drop)
            .map_err(|source| UiError::Interaction {
                action: "scroll",
                target: format!("window by ({dx}, {dy})"),
                source: Box::new(source),
            })
    }

    /// Wait until `document.readyState` is `complete`
    ///
    /// # Errors
    ///
    /// `Timeout` after the element wait.
    pub fn wait_for_page_load(&self) -> UiResult<()> {
        self.wait.until_true(
            || "document.readyState to be 'complete'".to_string(),
            || Ok(self.driver.execute_script(READY_STATE_SCRIPT, &[])? == "complete"),
        )
    }

    /// Move the pointer over the target
    ///
    /// # Errors
    ///
    /// `NotFound` or `Interaction`.
    pub fn hover<'t>(&self, target: impl Into<Target<'t>>) -> UiResult<()> {
        let target = target.into();
        let element = self.resolve(target)?;
        debug!(%target, "hover");
        self.driver
            .hover(&element)
            .map_err(Self::interaction("hover over", target))
    }

    /// Press `key` with `modifier` held
    ///
    /// # Errors
    ///
    /// Driver failure.
    pub fn key_chord(&self, modifier: Key, key: char) -> UiResult<()> {
        debug!(modifier = modifier.dom_key(), %key, "key_chord");
        self.driver.key_chord(modifier, key)
    }

    /// Alt+N
    ///
    /// # Errors
    ///
    /// Driver failure.
    pub fn perform_alt_n(&self) -> UiResult<()> {
        self.key_chord(Key::Alt, 'n')
    }

    /// Text of the element `locator` resolves to
    ///
    /// # Errors
    ///
    /// Logged at `error` and returned unchanged.
    pub fn get_text(&self, locator: &Locator) -> UiResult<String> {
        self.find_element(locator)
            .and_then(|element| self.driver.text(&element))
            .inspect_err(|err| error!(%locator, error = %err, "Failed to get text"))
    }

    /// Attribute of the element `locator` resolves to; `None` when absent
    ///
    /// # Errors
    ///
    /// Logged at `error` and returned unchanged.
    pub fn get_attribute(&self, locator: &Locator, name: &str) -> UiResult<Option<String>> {
        self.find_element(locator)
            .and_then(|element| self.driver.attribute(&element, name))
            .inspect_err(|err| {
                error!(%locator, attribute = name, error = %err, "Failed to get attribute");
            })
    }

    /// Type into the target.
    ///
    /// A locator is resolved and its field cleared first; a live handle is
    /// typed into as is.
    ///
    /// # Errors
    ///
    /// `NotFound` or `Interaction`.
    pub fn send_keys<'t>(&self, target: impl Into<Target<'t>>, text: &str) -> UiResult<()> {
        let target = target.into();
        let element = self.resolve(target)?;
        if matches!(target, Target::Locator(_)) {
            self.driver
                .clear(&element)
                .map_err(Self::interaction("clear", target))?;
        }
        debug!(%target, "send_keys");
        self.driver
            .send_keys(&element, text)
            .map_err(Self::interaction("type into", target))
    }

    /// Poll until the current URL contains `partial`
    ///
    /// # Errors
    ///
    /// `Timeout` naming the substring once `timeout_ms` has elapsed.
    pub fn wait_for_url_contains(&self, partial: &str, timeout_ms: u64) -> UiResult<()> {
        WaitPolicy::from_millis(timeout_ms)
            .with_poll_interval(self.wait.poll_interval())
            .until_true(
                || format!("URL to contain '{partial}'"),
                || Ok(self.driver.current_url()?.contains(partial)),
            )?;
        debug!(partial, "URL matched");
        Ok(())
    }

    /// Capture the viewport to `<prefix>_<yyyyMMdd_HHmmss>.png`
    ///
    /// # Errors
    ///
    /// Driver failure, or `Screenshot` when the file cannot be written.
    pub fn take_screenshot(&self, prefix: &str) -> UiResult<PathBuf> {
        let png = self.driver.screenshot()?;
        let dir = match self.screenshot_dir {
            Some(ref dir) => dir.clone(),
            None => std::env::current_dir()?,
        };
        let path = dir.join(screenshot_file_name(prefix, &chrono::Local::now().naive_local()));
        std::fs::write(&path, png).map_err(|source| UiError::Screenshot {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), "Screenshot saved");
        Ok(path)
    }
}
