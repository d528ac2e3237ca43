//! Wardprobe: page-object browser tests for the WardSupply (Substore) module
//!
//! Page objects drive the application through [`CommonEvents`], a set of
//! wait-aware interaction helpers over the [`WebDriver`] trait. Tests run
//! against [`MockDriver`]; real runs use [`ChromiumDriver`] (feature
//! `browser`).
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                  WARDPROBE Architecture                      │
//! ├──────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌──────────────┐    ┌──────────────┐     │
//! │   │ LoginPage  │    │ CommonEvents │    │ WebDriver    │     │
//! │   │ Substore   │───►│ waits, click │───►│ Chromium/CDP │     │
//! │   │ Page       │    │ screenshots  │    │ or Mock      │     │
//! │   └────────────┘    └──────────────┘    └──────────────┘     │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use wardprobe::{MockDriver, MockElement, Selector, SubstorePage};
//!
//! let driver = MockDriver::new()
//!     .with_element(MockElement::new(Selector::xpath("//a[@class='report_list']")));
//! let page = SubstorePage::new(&driver);
//! assert!(page.click_fourth_counter_if_available().unwrap());
//! assert_eq!(driver.clicks().len(), 1);
//! ```

#![warn(missing_docs)]

mod browser;
mod config;
mod driver;
mod events;
mod locator;
mod mock;
mod page_object;
mod pages;
mod result;
mod test_data;
mod wait;

pub use browser::{BrowserConfig, ChromiumDriver};
pub use config::{SuiteConfig, Timeouts, ENV_BASE_URL, ENV_CHROMIUM_PATH, ENV_HEADLESS};
pub use driver::{split_key_input, ElementHandle, Key, KeyInput, ScriptArg, WebDriver};
pub use events::{screenshot_file_name, CommonEvents, Diagnostic, SCREENSHOT_STAMP_FORMAT};
pub use locator::{xpath_literal, Locator, Selector, Target};
pub use mock::{MockClick, MockDriver, MockEffect, MockElement, PNG_SIGNATURE};
pub use page_object::{wait_until_loaded, PageObject};
pub use pages::{
    LoginLocators, LoginPage, NavigationStep, RequisitionForm, SubstoreLocators, SubstorePage,
    REQUISITION_ITEM_URL_FRAGMENT, REQUISITION_LIST_URL_FRAGMENT, REQUISITION_SAVED_MESSAGE,
    SCREENSHOT_PREFIX, SUBSTORE_URL_FRAGMENT,
};
pub use result::{ErrorKind, UiError, UiResult};
pub use test_data::{Credentials, Expectations, TestData};
pub use wait::{
    WaitPolicy, DEFAULT_ELEMENT_TIMEOUT_MS, DEFAULT_PAGE_TIMEOUT_MS, DEFAULT_POLL_INTERVAL_MS,
};
