//! In-memory [`WebDriver`] for unit testing.
//!
//! `MockDriver` models a flat list of elements keyed by exact selector.
//! Elements can appear or become visible after a delay, and clicks or hovers
//! can trigger effects (URL changes, inserting, showing or detaching
//! elements), which is enough to exercise every wait and workflow without a
//! browser. Every interaction is appended to a call log.

use crate::driver::{ElementHandle, Key, ScriptArg, WebDriver};
use crate::locator::Selector;
use crate::result::{UiError, UiResult};
use std::cell::RefCell;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// PNG signature; the default mock screenshot payload
pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Side effect of an interaction
#[derive(Debug, Clone)]
pub enum MockEffect {
    /// Change the URL after `delay`
    Navigate {
        /// New URL
        url: String,
        /// Delay before the URL changes
        delay: Duration,
    },
    /// Add a new element to the page
    Insert(MockElement),
    /// Make matching elements visible
    Show(Selector),
    /// Detach matching elements; existing handles become stale
    Detach(Selector),
}

impl MockEffect {
    /// Immediate navigation
    #[must_use]
    pub fn navigate(url: impl Into<String>) -> Self {
        Self::Navigate {
            url: url.into(),
            delay: Duration::ZERO,
        }
    }

    /// Navigation that lands after `delay`
    #[must_use]
    pub fn navigate_after(url: impl Into<String>, delay: Duration) -> Self {
        Self::Navigate {
            url: url.into(),
            delay,
        }
    }
}

/// Element definition for the mock page
#[derive(Debug, Clone)]
pub struct MockElement {
    selector: Selector,
    text: String,
    attributes: HashMap<String, String>,
    displayed: bool,
    enabled: bool,
    present_after: Duration,
    displayed_after: Duration,
    click_error: Option<String>,
    on_click: Vec<MockEffect>,
    on_hover: Vec<MockEffect>,
}

impl MockElement {
    /// Visible, enabled element with no text
    #[must_use]
    pub fn new(selector: Selector) -> Self {
        Self {
            selector,
            text: String::new(),
            attributes: HashMap::new(),
            displayed: true,
            enabled: true,
            present_after: Duration::ZERO,
            displayed_after: Duration::ZERO,
            click_error: None,
            on_click: Vec::new(),
            on_hover: Vec::new(),
        }
    }

    /// Set text content
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set an attribute
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.attributes.insert(name.into(), value.into());
        self
    }

    /// Present but not displayed
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    /// Displayed but disabled
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Not findable until `delay` after insertion
    #[must_use]
    pub fn present_after(mut self, delay: Duration) -> Self {
        self.present_after = delay;
        self
    }

    /// Not displayed until `delay` after insertion
    #[must_use]
    pub fn displayed_after(mut self, delay: Duration) -> Self {
        self.displayed_after = delay;
        self
    }

    /// Native clicks fail with a driver error
    #[must_use]
    pub fn failing_click(mut self, message: impl Into<String>) -> Self {
        self.click_error = Some(message.into());
        self
    }

    /// Effect applied on click
    #[must_use]
    pub fn on_click(mut self, effect: MockEffect) -> Self {
        self.on_click.push(effect);
        self
    }

    /// Effect applied on hover
    #[must_use]
    pub fn on_hover(mut self, effect: MockEffect) -> Self {
        self.on_hover.push(effect);
        self
    }
}

/// A recorded click
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockClick {
    /// Selector of the clicked element
    pub selector: Selector,
    /// URL at the moment of the click
    pub url: String,
}

#[derive(Debug)]
struct MockNode {
    id: String,
    element: MockElement,
    inserted_at: Instant,
    detached: bool,
    value: String,
}

impl MockNode {
    fn is_present(&self, now: Instant) -> bool {
        !self.detached && now >= self.inserted_at + self.element.present_after
    }

    fn is_displayed(&self, now: Instant) -> bool {
        self.element.displayed && now >= self.inserted_at + self.element.displayed_after
    }
}

#[derive(Debug, Default)]
struct MockState {
    url: String,
    title: String,
    pending_urls: Vec<(Instant, String)>,
    nodes: Vec<MockNode>,
    next_id: usize,
    calls: Vec<String>,
    clicks: Vec<MockClick>,
    screenshot: Option<Vec<u8>>,
    screenshot_error: Option<String>,
    script_error: Option<String>,
}

impl MockState {
    fn settle_url(&mut self, now: Instant) {
        self.pending_urls.sort_by_key(|(at, _)| *at);
        while let Some((at, _)) = self.pending_urls.first() {
            if *at > now {
                break;
            }
            let (_, url) = self.pending_urls.remove(0);
            self.url = url;
        }
    }

    fn insert(&mut self, element: MockElement, now: Instant) {
        self.next_id += 1;
        self.nodes.push(MockNode {
            id: format!("mock-{}", self.next_id),
            element,
            inserted_at: now,
            detached: false,
            value: String::new(),
        });
    }

    fn node(&self, handle: &ElementHandle) -> UiResult<&MockNode> {
        self.nodes
            .iter()
            .find(|n| n.id == handle.id && !n.detached)
            .ok_or_else(|| UiError::Stale {
                element: handle.to_string(),
            })
    }

    fn node_mut(&mut self, handle: &ElementHandle) -> UiResult<&mut MockNode> {
        self.nodes
            .iter_mut()
            .find(|n| n.id == handle.id && !n.detached)
            .ok_or_else(|| UiError::Stale {
                element: handle.to_string(),
            })
    }

    fn apply(&mut self, effects: Vec<MockEffect>, now: Instant) {
        for effect in effects {
            match effect {
                MockEffect::Navigate { url, delay } => {
                    if delay.is_zero() {
                        self.url = url;
                    } else {
                        self.pending_urls.push((now + delay, url));
                    }
                }
                MockEffect::Insert(element) => self.insert(element, now),
                MockEffect::Show(selector) => {
                    for node in self.nodes.iter_mut().filter(|n| n.element.selector == selector) {
                        node.element.displayed = true;
                        node.element.displayed_after = Duration::ZERO;
                    }
                }
                MockEffect::Detach(selector) => {
                    for node in self.nodes.iter_mut().filter(|n| n.element.selector == selector) {
                        node.detached = true;
                    }
                }
            }
        }
    }

    fn perform_click(&mut self, handle: &ElementHandle, now: Instant) -> UiResult<()> {
        self.settle_url(now);
        let url = self.url.clone();
        let node = self.node(handle)?;
        let selector = node.element.selector.clone();
        let effects = node.element.on_click.clone();
        self.calls.push(format!("click:{selector}"));
        self.clicks.push(MockClick { selector, url });
        self.apply(effects, now);
        Ok(())
    }
}

/// Mock driver for unit testing
#[derive(Debug, Default)]
pub struct MockDriver {
    state: RefCell<MockState>,
}

impl MockDriver {
    /// Create new mock driver on `about:blank`
    #[must_use]
    pub fn new() -> Self {
        let driver = Self::default();
        driver.state.borrow_mut().url = "about:blank".to_string();
        driver
    }

    /// Set the starting URL
    #[must_use]
    pub fn with_url(self, url: impl Into<String>) -> Self {
        self.state.borrow_mut().url = url.into();
        self
    }

    /// Set the document title
    #[must_use]
    pub fn with_title(self, title: impl Into<String>) -> Self {
        self.state.borrow_mut().title = title.into();
        self
    }

    /// Add an element
    #[must_use]
    pub fn with_element(self, element: MockElement) -> Self {
        self.add_element(element);
        self
    }

    /// Add an element to a driver already in use
    pub fn add_element(&self, element: MockElement) {
        self.state.borrow_mut().insert(element, Instant::now());
    }

    /// Detach matching elements now
    pub fn detach(&self, selector: &Selector) {
        self.state
            .borrow_mut()
            .apply(vec![MockEffect::Detach(selector.clone())], Instant::now());
    }

    /// Set mock screenshot bytes
    #[must_use]
    pub fn with_screenshot(self, data: Vec<u8>) -> Self {
        self.state.borrow_mut().screenshot = Some(data);
        self
    }

    /// Make `screenshot` fail
    #[must_use]
    pub fn with_failing_screenshot(self, message: impl Into<String>) -> Self {
        self.state.borrow_mut().screenshot_error = Some(message.into());
        self
    }

    /// Make every `execute_script` call fail
    #[must_use]
    pub fn with_failing_scripts(self, message: impl Into<String>) -> Self {
        self.state.borrow_mut().script_error = Some(message.into());
        self
    }

    /// Call history
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    /// Check if a call with this prefix was made
    #[must_use]
    pub fn was_called(&self, prefix: &str) -> bool {
        self.state.borrow().calls.iter().any(|c| c.starts_with(prefix))
    }

    /// Recorded clicks, in order
    #[must_use]
    pub fn clicks(&self) -> Vec<MockClick> {
        self.state.borrow().clicks.clone()
    }

    /// Number of clicks on elements matching `selector`
    #[must_use]
    pub fn click_count(&self, selector: &Selector) -> usize {
        self.state
            .borrow()
            .clicks
            .iter()
            .filter(|c| &c.selector == selector)
            .count()
    }

    /// Current value typed into the first element matching `selector`
    #[must_use]
    pub fn typed_value(&self, selector: &Selector) -> Option<String> {
        self.state
            .borrow()
            .nodes
            .iter()
            .find(|n| &n.element.selector == selector)
            .map(|n| n.value.clone())
    }

    fn record(&self, call: String) {
        self.state.borrow_mut().calls.push(call);
    }
}

impl WebDriver for MockDriver {
    fn navigate(&self, url: &str) -> UiResult<()> {
        let mut state = self.state.borrow_mut();
        state.calls.push(format!("navigate:{url}"));
        state.pending_urls.clear();
        state.url = url.to_string();
        Ok(())
    }

    fn current_url(&self) -> UiResult<String> {
        let mut state = self.state.borrow_mut();
        state.settle_url(Instant::now());
        Ok(state.url.clone())
    }

    fn title(&self) -> UiResult<String> {
        Ok(self.state.borrow().title.clone())
    }

    fn find_elements(&self, selector: &Selector) -> UiResult<Vec<ElementHandle>> {
        let now = Instant::now();
        Ok(self
            .state
            .borrow()
            .nodes
            .iter()
            .filter(|n| &n.element.selector == selector && n.is_present(now))
            .map(|n| ElementHandle::new(n.id.clone(), selector.to_string()))
            .collect())
    }

    fn is_displayed(&self, element: &ElementHandle) -> UiResult<bool> {
        let now = Instant::now();
        Ok(self.state.borrow().node(element)?.is_displayed(now))
    }

    fn is_enabled(&self, element: &ElementHandle) -> UiResult<bool> {
        Ok(self.state.borrow().node(element)?.element.enabled)
    }

    fn click(&self, element: &ElementHandle) -> UiResult<()> {
        let now = Instant::now();
        let mut state = self.state.borrow_mut();
        let node = state.node(element)?;
        if let Some(ref message) = node.element.click_error {
            return Err(UiError::driver(message.clone()));
        }
        if !node.is_displayed(now) {
            return Err(UiError::driver(format!("{element} is not interactable")));
        }
        state.perform_click(element, now)
    }

    fn clear(&self, element: &ElementHandle) -> UiResult<()> {
        let mut state = self.state.borrow_mut();
        state.node_mut(element)?.value.clear();
        state.calls.push(format!("clear:{}", element.description));
        Ok(())
    }

    fn send_keys(&self, element: &ElementHandle, text: &str) -> UiResult<()> {
        let mut state = self.state.borrow_mut();
        state.node_mut(element)?.value.push_str(text);
        state
            .calls
            .push(format!("send_keys:{}:{text}", element.description));
        Ok(())
    }

    fn text(&self, element: &ElementHandle) -> UiResult<String> {
        Ok(self.state.borrow().node(element)?.element.text.clone())
    }

    fn attribute(&self, element: &ElementHandle, name: &str) -> UiResult<Option<String>> {
        let state = self.state.borrow();
        let node = state.node(element)?;
        if name == "value" {
            return Ok(Some(node.value.clone()));
        }
        Ok(node.element.attributes.get(name).cloned())
    }

    fn hover(&self, element: &ElementHandle) -> UiResult<()> {
        let now = Instant::now();
        let mut state = self.state.borrow_mut();
        let effects = state.node(element)?.element.on_hover.clone();
        state.calls.push(format!("hover:{}", element.description));
        state.apply(effects, now);
        Ok(())
    }

    fn execute_script(&self, script: &str, args: &[ScriptArg<'_>]) -> UiResult<serde_json::Value> {
        self.record(format!("script:{script}"));
        if let Some(ref message) = self.state.borrow().script_error {
            return Err(UiError::Script {
                message: message.clone(),
            });
        }

        let first = match args.first() {
            Some(ScriptArg::Element(handle)) => Some(*handle),
            _ => None,
        };
        if let Some(handle) = first {
            let _ = self.state.borrow().node(handle)?;
        }

        if script.contains("document.readyState") {
            return Ok(serde_json::Value::String("complete".to_string()));
        }
        if script.contains(".click()") {
            if let Some(handle) = first {
                self.state
                    .borrow_mut()
                    .perform_click(handle, Instant::now())?;
            }
        }
        Ok(serde_json::Value::Null)
    }

    fn key_chord(&self, modifier: Key, key: char) -> UiResult<()> {
        self.record(format!("key_chord:{}+{key}", modifier.dom_key()));
        Ok(())
    }

    fn screenshot(&self) -> UiResult<Vec<u8>> {
        self.record("screenshot".to_string());
        let state = self.state.borrow();
        if let Some(ref message) = state.screenshot_error {
            return Err(UiError::driver(message.clone()));
        }
        Ok(state
            .screenshot
            .clone()
            .unwrap_or_else(|| PNG_SIGNATURE.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod mock_driver_tests {
        use super::*;

        #[test]
        fn test_mock_driver_creation() {
            let driver = MockDriver::new();
            assert_eq!(driver.current_url().unwrap(), "about:blank");
            assert!(driver.calls().is_empty());
        }

        #[test]
        fn test_find_by_exact_selector() {
            let driver = MockDriver::new()
                .with_element(MockElement::new(Selector::id("login")))
                .with_element(MockElement::new(Selector::id("login")));
            assert_eq!(driver.find_elements(&Selector::id("login")).unwrap().len(), 2);
            assert!(driver.find_elements(&Selector::id("other")).unwrap().is_empty());
        }

        #[test]
        fn test_present_after_delay() {
            let driver = MockDriver::new().with_element(
                MockElement::new(Selector::id("late")).present_after(Duration::from_millis(40)),
            );
            assert!(driver.find_elements(&Selector::id("late")).unwrap().is_empty());
            std::thread::sleep(Duration::from_millis(60));
            assert_eq!(driver.find_elements(&Selector::id("late")).unwrap().len(), 1);
        }

        #[test]
        fn test_click_applies_effects_and_records_url() {
            let driver = MockDriver::new().with_url("http://app/#/Home").with_element(
                MockElement::new(Selector::id("tab"))
                    .on_click(MockEffect::navigate("http://app/#/WardSupply")),
            );
            let tab = driver.find_elements(&Selector::id("tab")).unwrap().remove(0);
            driver.click(&tab).unwrap();
            assert_eq!(driver.current_url().unwrap(), "http://app/#/WardSupply");
            let clicks = driver.clicks();
            assert_eq!(clicks.len(), 1);
            assert_eq!(clicks[0].url, "http://app/#/Home");
            assert!(driver.was_called("click:id=tab"));
        }

        #[test]
        fn test_delayed_navigation() {
            let driver = MockDriver::new().with_element(
                MockElement::new(Selector::id("go")).on_click(MockEffect::navigate_after(
                    "http://app/next",
                    Duration::from_millis(30),
                )),
            );
            let go = driver.find_elements(&Selector::id("go")).unwrap().remove(0);
            driver.click(&go).unwrap();
            assert_eq!(driver.current_url().unwrap(), "about:blank");
            std::thread::sleep(Duration::from_millis(50));
            assert_eq!(driver.current_url().unwrap(), "http://app/next");
        }

        #[test]
        fn test_detached_handle_is_stale() {
            let driver = MockDriver::new().with_element(MockElement::new(Selector::id("row")));
            let row = driver.find_elements(&Selector::id("row")).unwrap().remove(0);
            driver.detach(&Selector::id("row"));
            assert!(driver.is_displayed(&row).unwrap_err().is_stale());
            assert!(driver.click(&row).unwrap_err().is_stale());
        }

        #[test]
        fn test_hidden_element_not_clickable() {
            let driver =
                MockDriver::new().with_element(MockElement::new(Selector::id("h")).hidden());
            let h = driver.find_elements(&Selector::id("h")).unwrap().remove(0);
            assert!(!driver.is_displayed(&h).unwrap());
            assert!(matches!(driver.click(&h), Err(UiError::Driver { .. })));
        }

        #[test]
        fn test_send_keys_and_clear() {
            let driver = MockDriver::new().with_element(MockElement::new(Selector::id("q")));
            let q = driver.find_elements(&Selector::id("q")).unwrap().remove(0);
            driver.send_keys(&q, "tis").unwrap();
            driver.send_keys(&q, "sue").unwrap();
            assert_eq!(driver.typed_value(&Selector::id("q")).unwrap(), "tissue");
            assert_eq!(driver.attribute(&q, "value").unwrap().unwrap(), "tissue");
            driver.clear(&q).unwrap();
            assert_eq!(driver.typed_value(&Selector::id("q")).unwrap(), "");
        }

        #[test]
        fn test_script_click_bypasses_visibility() {
            let driver =
                MockDriver::new().with_element(MockElement::new(Selector::id("h")).hidden());
            let h = driver.find_elements(&Selector::id("h")).unwrap().remove(0);
            driver
                .execute_script("arguments[0].click();", &[ScriptArg::Element(&h)])
                .unwrap();
            assert_eq!(driver.click_count(&Selector::id("h")), 1);
        }

        #[test]
        fn test_ready_state() {
            let driver = MockDriver::new();
            assert_eq!(
                driver
                    .execute_script("return document.readyState", &[])
                    .unwrap(),
                serde_json::json!("complete")
            );
        }

        #[test]
        fn test_screenshot_default_and_failure() {
            assert_eq!(MockDriver::new().screenshot().unwrap(), PNG_SIGNATURE.to_vec());
            assert!(MockDriver::new()
                .with_failing_screenshot("no page")
                .screenshot()
                .is_err());
        }

        #[test]
        fn test_key_chord_recorded() {
            let driver = MockDriver::new();
            driver.key_chord(Key::Alt, 'n').unwrap();
            assert!(driver.was_called("key_chord:Alt+n"));
        }
    }
}
