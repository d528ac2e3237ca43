//! WebDriver - abstract browser session
//!
//! Page objects and [`CommonEvents`](crate::CommonEvents) talk to the browser
//! only through this trait, so a test can swap the Chromium session for the
//! in-memory [`MockDriver`](crate::MockDriver).
//!
//! The trait is blocking. Methods that touch a specific element take an
//! [`ElementHandle`] and fail with [`UiError::Stale`](crate::UiError::Stale)
//! when the node behind it is gone.

use crate::locator::Selector;
use crate::result::UiResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque reference to a DOM node issued by a driver
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Driver-specific identifier
    pub id: String,
    /// What the handle was resolved from (for error messages)
    pub description: String,
}

impl ElementHandle {
    /// Create a new element handle
    #[must_use]
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
        }
    }
}

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "element {} [{}]", self.description, self.id)
    }
}

/// Special keys.
///
/// `send_keys` text may embed these as their WebDriver code points
/// (`Key::Tab.to_string()`), so one string can mix text and keystrokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Tab
    Tab,
    /// Enter
    Enter,
    /// Alt modifier
    Alt,
    /// Control modifier
    Control,
    /// Shift modifier
    Shift,
}

impl Key {
    const ALL: [Self; 5] = [
        Self::Tab,
        Self::Enter,
        Self::Alt,
        Self::Control,
        Self::Shift,
    ];

    /// WebDriver code point
    #[must_use]
    pub const fn code_point(self) -> char {
        match self {
            Self::Tab => '\u{E004}',
            Self::Enter => '\u{E007}',
            Self::Shift => '\u{E008}',
            Self::Control => '\u{E009}',
            Self::Alt => '\u{E00A}',
        }
    }

    /// DOM `KeyboardEvent.key` name
    #[must_use]
    pub const fn dom_key(self) -> &'static str {
        match self {
            Self::Tab => "Tab",
            Self::Enter => "Enter",
            Self::Alt => "Alt",
            Self::Control => "Control",
            Self::Shift => "Shift",
        }
    }

    /// Windows virtual key code
    #[must_use]
    pub const fn virtual_key_code(self) -> i64 {
        match self {
            Self::Tab => 9,
            Self::Enter => 13,
            Self::Shift => 16,
            Self::Control => 17,
            Self::Alt => 18,
        }
    }

    /// CDP modifier bit, for modifier keys
    #[must_use]
    pub const fn modifier_bit(self) -> Option<i64> {
        match self {
            Self::Alt => Some(1),
            Self::Control => Some(2),
            Self::Shift => Some(8),
            _ => None,
        }
    }

    /// Reverse lookup from a code point
    #[must_use]
    pub fn from_code_point(c: char) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.code_point() == c)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code_point())
    }
}

/// Piece of a `send_keys` string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyInput {
    /// Literal text
    Text(String),
    /// Special key press
    Key(Key),
}

/// Split a `send_keys` string into literal runs and key presses
#[must_use]
pub fn split_key_input(text: &str) -> Vec<KeyInput> {
    let mut parts = Vec::new();
    let mut run = String::new();
    for c in text.chars() {
        if let Some(key) = Key::from_code_point(c) {
            if !run.is_empty() {
                parts.push(KeyInput::Text(std::mem::take(&mut run)));
            }
            parts.push(KeyInput::Key(key));
        } else {
            run.push(c);
        }
    }
    if !run.is_empty() {
        parts.push(KeyInput::Text(run));
    }
    parts
}

/// Argument passed to [`WebDriver::execute_script`], exposed to the script
/// as `arguments[i]`
#[derive(Debug, Clone, Copy)]
pub enum ScriptArg<'a> {
    /// A live element
    Element(&'a ElementHandle),
    /// A number
    Number(f64),
}

/// Abstract driver trait for browser automation
///
/// # Implementations
///
/// - `ChromiumDriver` - chromiumoxide over CDP (feature `browser`)
/// - `MockDriver` - in-memory DOM for unit tests
pub trait WebDriver {
    /// Navigate to URL
    fn navigate(&self, url: &str) -> UiResult<()>;

    /// Get current URL
    fn current_url(&self) -> UiResult<String>;

    /// Get document title
    fn title(&self) -> UiResult<String>;

    /// All elements currently matching `selector`; no waiting
    fn find_elements(&self, selector: &Selector) -> UiResult<Vec<ElementHandle>>;

    /// Whether the element is rendered and visible
    fn is_displayed(&self, element: &ElementHandle) -> UiResult<bool>;

    /// Whether the element accepts interaction
    fn is_enabled(&self, element: &ElementHandle) -> UiResult<bool>;

    /// Native click
    fn click(&self, element: &ElementHandle) -> UiResult<()>;

    /// Clear an input's value
    fn clear(&self, element: &ElementHandle) -> UiResult<()>;

    /// Type text; see [`Key`] for embedded keystrokes
    fn send_keys(&self, element: &ElementHandle, text: &str) -> UiResult<()>;

    /// Rendered text content
    fn text(&self, element: &ElementHandle) -> UiResult<String>;

    /// Attribute value, `None` when absent
    fn attribute(&self, element: &ElementHandle, name: &str) -> UiResult<Option<String>>;

    /// Move the pointer over the element
    fn hover(&self, element: &ElementHandle) -> UiResult<()>;

    /// Run a script body in the page; `arguments[i]` are `args[i]`
    fn execute_script(&self, script: &str, args: &[ScriptArg<'_>]) -> UiResult<serde_json::Value>;

    /// Press `key` while holding `modifier`
    fn key_chord(&self, modifier: Key, key: char) -> UiResult<()>;

    /// Capture the viewport as PNG bytes
    fn screenshot(&self) -> UiResult<Vec<u8>>;
}

impl<D: WebDriver + ?Sized> WebDriver for &D {
    fn navigate(&self, url: &str) -> UiResult<()> {
        (**self).navigate(url)
    }
    fn current_url(&self) -> UiResult<String> {
        (**self).current_url()
    }
    fn title(&self) -> UiResult<String> {
        (**self).title()
    }
    fn find_elements(&self, selector: &Selector) -> UiResult<Vec<ElementHandle>> {
        (**self).find_elements(selector)
    }
    fn is_displayed(&self, element: &ElementHandle) -> UiResult<bool> {
        (**self).is_displayed(element)
    }
    fn is_enabled(&self, element: &ElementHandle) -> UiResult<bool> {
        (**self).is_enabled(element)
    }
    fn click(&self, element: &ElementHandle) -> UiResult<()> {
        (**self).click(element)
    }
    fn clear(&self, element: &ElementHandle) -> UiResult<()> {
        (**self).clear(element)
    }
    fn send_keys(&self, element: &ElementHandle, text: &str) -> UiResult<()> {
        (**self).send_keys(element, text)
    }
    fn text(&self, element: &ElementHandle) -> UiResult<String> {
        (**self).text(element)
    }
    fn attribute(&self, element: &ElementHandle, name: &str) -> UiResult<Option<String>> {
        (**self).attribute(element, name)
    }
    fn hover(&self, element: &ElementHandle) -> UiResult<()> {
        (**self).hover(element)
    }
    fn execute_script(&self, script: &str, args: &[ScriptArg<'_>]) -> UiResult<serde_json::Value> {
        (**self).execute_script(script, args)
    }
    fn key_chord(&self, modifier: Key, key: char) -> UiResult<()> {
        (**self).key_chord(modifier, key)
    }
    fn screenshot(&self) -> UiResult<Vec<u8>> {
        (**self).screenshot()
    }
}
