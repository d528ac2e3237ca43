//! Page Object Model support.
//!
//! A page object owns its locators and exposes workflows; this trait carries
//! the part every page shares: how to recognise that the page is on screen.

use crate::driver::WebDriver;
use crate::events::CommonEvents;
use crate::locator::Locator;
use crate::result::UiResult;
use crate::wait::DEFAULT_PAGE_TIMEOUT_MS;
use std::time::Duration;
use tracing::debug;

/// A page or component of the application under test.
///
/// ```ignore
/// impl<D: WebDriver + ?Sized> PageObject for SubstorePage<'_, D> {
///     fn url_pattern(&self) -> &str {
///         "WardSupply"
///     }
///
///     fn ready_marker(&self) -> &Locator {
///         &self.locators().inventory
///     }
/// }
/// ```
pub trait PageObject {
    /// Substring of the URL while this page is shown
    fn url_pattern(&self) -> &str;

    /// Element that is visible once the page is usable
    fn ready_marker(&self) -> &Locator;

    /// Bound for [`wait_until_loaded`] (in milliseconds)
    fn load_timeout_ms(&self) -> u64 {
        DEFAULT_PAGE_TIMEOUT_MS
    }

    /// Get the page name for logging/debugging
    fn page_name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Whether `url` belongs to this page
    fn matches_url(&self, url: &str) -> bool {
        url.contains(self.url_pattern())
    }
}

/// Block until `page` is current: URL matches, then the ready marker is
/// visible. Both waits share the page's load bound.
///
/// # Errors
///
/// `Timeout` from whichever condition did not hold.
pub fn wait_until_loaded<D, P>(events: &CommonEvents<'_, D>, page: &P) -> UiResult<()>
where
    D: WebDriver + ?Sized,
    P: PageObject + ?Sized,
{
    let timeout_ms = page.load_timeout_ms();
    events.wait_for_url_contains(page.url_pattern(), timeout_ms)?;
    events.wait_for_visible(page.ready_marker(), Duration::from_millis(timeout_ms))?;
    debug!(page = page.page_name(), "Page loaded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::Selector;
    use crate::mock::{MockDriver, MockElement};

    struct DashboardPage {
        marker: Locator,
    }

    impl PageObject for DashboardPage {
        fn url_pattern(&self) -> &str {
            "#/Dashboard"
        }

        fn ready_marker(&self) -> &Locator {
            &self.marker
        }

        fn load_timeout_ms(&self) -> u64 {
            100
        }
    }

    fn page() -> DashboardPage {
        DashboardPage {
            marker: Locator::id("dashboard", "dash"),
        }
    }

    mod page_object_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let page = page();
            assert!(page.page_name().contains("DashboardPage"));
            assert!(page.matches_url("http://emr/#/Dashboard"));
            assert!(!page.matches_url("http://emr/#/WardSupply"));
        }

        #[test]
        fn test_wait_until_loaded() {
            let driver = MockDriver::new()
                .with_url("http://emr/#/Dashboard")
                .with_element(MockElement::new(Selector::id("dash")));
            let events = CommonEvents::new(&driver);
            assert!(wait_until_loaded(&events, &page()).is_ok());
        }

        #[test]
        fn test_wrong_url_times_out() {
            let driver = MockDriver::new()
                .with_url("http://emr/#/Login")
                .with_element(MockElement::new(Selector::id("dash")));
            let events = CommonEvents::new(&driver);
            assert!(wait_until_loaded(&events, &page()).unwrap_err().is_timeout());
        }
    }
}
