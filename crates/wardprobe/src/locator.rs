//! Locator abstraction for element selection.
//!
//! A [`Locator`] is an immutable named [`Selector`]. Page objects build their
//! locators once at construction; operations accept either a locator or a
//! live [`ElementHandle`] through [`Target`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::driver::ElementHandle;

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "by", content = "value", rename_all = "lowercase")]
pub enum Selector {
    /// Element id attribute
    Id(String),
    /// XPath expression
    XPath(String),
    /// CSS selector (e.g., "input#save_requisition")
    Css(String),
}

impl Selector {
    /// Create an id selector
    #[must_use]
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    /// Create an XPath selector
    #[must_use]
    pub fn xpath(xpath: impl Into<String>) -> Self {
        Self::XPath(xpath.into())
    }

    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// JavaScript expression yielding an array of all matching nodes
    #[must_use]
    pub fn to_query_all(&self) -> String {
        match self {
            Self::Id(id) => {
                format!("(function() {{ const el = document.getElementById({id:?}); return el ? [el] : []; }})()")
            }
            Self::XPath(xpath) => {
                format!(
                    "(function() {{ const r = document.evaluate({xpath:?}, document, null, \
                     XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); const out = []; \
                     for (let i = 0; i < r.snapshotLength; i++) out.push(r.snapshotItem(i)); \
                     return out; }})()"
                )
            }
            Self::Css(css) => format!("Array.from(document.querySelectorAll({css:?}))"),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id={id}"),
            Self::XPath(xpath) => write!(f, "xpath={xpath}"),
            Self::Css(css) => write!(f, "css={css}"),
        }
    }
}

/// A named selector.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    name: String,
    selector: Selector,
}

impl Locator {
    /// Create a locator with a human-readable name
    #[must_use]
    pub fn new(name: impl Into<String>, selector: Selector) -> Self {
        Self {
            name: name.into(),
            selector,
        }
    }

    /// Locate by id attribute
    #[must_use]
    pub fn id(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self::new(name, Selector::id(id))
    }

    /// Locate by XPath
    #[must_use]
    pub fn xpath(name: impl Into<String>, xpath: impl Into<String>) -> Self {
        Self::new(name, Selector::xpath(xpath))
    }

    /// Locate by CSS selector
    #[must_use]
    pub fn css(name: impl Into<String>, css: impl Into<String>) -> Self {
        Self::new(name, Selector::css(css))
    }

    /// Anchor whose text contains `text`
    #[must_use]
    pub fn anchor_with_text(text: &str) -> Self {
        Self::xpath(
            format!("'{text}' link"),
            format!("//a[contains(text(),{})]", xpath_literal(text)),
        )
    }

    /// The locator's name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The underlying selector
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.selector)
    }
}

/// Either a locator to resolve or an already-resolved element.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    /// Resolve through the locator (with waiting)
    Locator(&'a Locator),
    /// Use the live handle as is
    Handle(&'a ElementHandle),
}

impl fmt::Display for Target<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Locator(locator) => write!(f, "{locator}"),
            Self::Handle(handle) => write!(f, "{handle}"),
        }
    }
}

impl<'a> From<&'a Locator> for Target<'a> {
    fn from(locator: &'a Locator) -> Self {
        Self::Locator(locator)
    }
}

impl<'a> From<&'a ElementHandle> for Target<'a> {
    fn from(handle: &'a ElementHandle) -> Self {
        Self::Handle(handle)
    }
}

/// Quote `value` as an XPath 1.0 string literal.
///
/// XPath has no escape sequences, so a value holding both quote kinds is
/// assembled with `concat()`.
#[must_use]
pub fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        return format!("'{value}'");
    }
    if !value.contains('"') {
        return format!("\"{value}\"");
    }
    let parts: Vec<String> = value
        .split('\'')
        .map(|part| format!("'{part}'"))
        .collect();
    format!("concat({})", parts.join(", \"'\", "))
}
