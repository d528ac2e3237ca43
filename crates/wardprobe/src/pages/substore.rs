//! Substore (WardSupply) page.
//!
//! Nine independent workflows over the Substore module. Each returns the
//! value its test case asserts on and wraps any failure as
//! [`UiError::Workflow`] naming the workflow.

use crate::config::SuiteConfig;
use crate::driver::{Key, WebDriver};
use crate::events::CommonEvents;
use crate::locator::{xpath_literal, Locator};
use crate::page_object::PageObject;
use crate::result::{UiError, UiResult};
use crate::test_data::Expectations;
use crate::wait::{WaitPolicy, DEFAULT_PAGE_TIMEOUT_MS};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

/// URL fragment of the Substore module
pub const SUBSTORE_URL_FRAGMENT: &str = "WardSupply";

/// URL fragment of the requisition list
pub const REQUISITION_LIST_URL_FRAGMENT: &str = "Inventory/InventoryRequisitionList";

/// URL fragment of the new-requisition form
pub const REQUISITION_ITEM_URL_FRAGMENT: &str = "Inventory/InventoryRequisitionItem";

/// Text of the pop-up shown after a requisition is saved
pub const REQUISITION_SAVED_MESSAGE: &str = "Requisition is Generated and Saved";

/// Screenshot prefix for the current-page capture
pub const SCREENSHOT_PREFIX: &str = "SubStore";

/// Values entered when creating a requisition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequisitionForm {
    /// Target inventory typed into the inventory picker
    pub target_inventory: String,
    /// Item searched for in the first row
    pub item_name: String,
    /// Requested quantity
    pub quantity: u32,
}

impl Default for RequisitionForm {
    fn default() -> Self {
        Self {
            target_inventory: "General-Inventory".to_string(),
            item_name: "tissue".to_string(),
            quantity: 5,
        }
    }
}

impl RequisitionForm {
    /// Set quantity
    #[must_use]
    pub const fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }
}

/// One gated hop of the sub-module navigation sequence
#[derive(Debug, Clone, Copy)]
pub struct NavigationStep<'a> {
    /// Link to click
    pub link: &'a Locator,
    /// Fragment the URL must contain before the next hop
    pub url_fragment: &'static str,
}

/// Substore locators
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstoreLocators {
    /// WardSupply tab in the main menu
    pub substore_tab: Locator,
    /// Counter link on the landing page
    pub counter_button_fourth: Locator,
    /// Inventory sub-module link
    pub inventory: Locator,
    /// Sign-out icon next to the module name
    pub module_signout: Locator,
    /// Tooltip shown over the sign-out icon
    pub hover_text: Locator,
    /// Pharmacy sub-module link
    pub pharmacy: Locator,
    /// Any tab of the sub-module bar
    pub sub_module: Locator,
    /// Stock tab
    pub stock: Locator,
    /// Inventory Requisition tab
    pub inventory_requisition: Locator,
    /// Consumption tab
    pub consumption: Locator,
    /// Reports tab
    pub reports: Locator,
    /// Patient Consumption tab
    pub patient_consumption: Locator,
    /// Return tab
    pub return_link: Locator,
    /// Opens the new-requisition form
    pub create_requisition_button: Locator,
    /// Grid quick filter
    pub search_bar: Locator,
    /// Favourite toggle
    pub star_icon: Locator,
    /// Pager: first page
    pub button_first: Locator,
    /// Pager: previous page
    pub button_previous: Locator,
    /// Pager: next page
    pub button_next: Locator,
    /// Pager: last page
    pub button_last: Locator,
    /// Date filter OK
    pub button_ok: Locator,
    /// Status filter: Pending
    pub radio_pending: Locator,
    /// Status filter: Complete
    pub radio_complete: Locator,
    /// Status filter: Cancelled
    pub radio_cancelled: Locator,
    /// Status filter: Withdrawn
    pub radio_withdrawn: Locator,
    /// Status filter: All
    pub radio_all: Locator,
    /// Submits the requisition
    pub request_button: Locator,
    /// Target inventory picker
    pub target_inventory: Locator,
    /// Item name of the first row
    pub item_name: Locator,
    /// Quantity of the first row
    pub required_quantity: Locator,
    /// Closes the message pop-up
    pub popup_close_button: Locator,
    /// Cancels the requisition modal
    pub close_modal: Locator,
}

impl Default for SubstoreLocators {
    fn default() -> Self {
        let button = |label: &str| {
            Locator::xpath(
                format!("'{label}' button"),
                format!("//button[contains(text(),{})]", xpath_literal(label)),
            )
        };
        let radio = |label: &str| {
            Locator::xpath(
                format!("'{label}' filter"),
                format!("//label[contains(text(),{})]/span", xpath_literal(label)),
            )
        };

        Self {
            substore_tab: Locator::xpath("Substore tab", "//a[@href='#/WardSupply']"),
            counter_button_fourth: Locator::xpath("counter", "//a[@class='report_list']"),
            inventory: Locator::anchor_with_text("Inventory"),
            module_signout: Locator::xpath("sign-out icon", "//i[contains(@class,'sign-out')]"),
            hover_text: Locator::xpath(
                "sign-out hover text",
                "//h6[contains(text(),'To change, you can always click here.')]",
            ),
            pharmacy: Locator::anchor_with_text("Pharmacy"),
            sub_module: Locator::xpath("sub-module link", "//ul[contains(@class,'nav-tabs')]//li//a"),
            stock: Locator::anchor_with_text("Stock"),
            inventory_requisition: Locator::anchor_with_text("Inventory Requisition"),
            consumption: Locator::anchor_with_text("Consumption"),
            reports: Locator::anchor_with_text("Reports"),
            patient_consumption: Locator::anchor_with_text("Patient Consumption"),
            return_link: Locator::anchor_with_text("Return"),
            create_requisition_button: Locator::xpath(
                "Create Requisition button",
                "//button/span[text()='Create Requisition']",
            ),
            search_bar: Locator::id("search bar", "quickFilterInput"),
            star_icon: Locator::xpath("favourite star", "//i[contains(@class,'icon-favourite')]/.."),
            button_first: button("First"),
            button_previous: button("Previous"),
            button_next: button("Next"),
            button_last: button("Last"),
            button_ok: button("OK"),
            radio_pending: radio("Pending"),
            radio_complete: radio("Complete"),
            radio_cancelled: radio("Cancelled"),
            radio_withdrawn: radio("Withdrawn"),
            radio_all: radio("All"),
            request_button: Locator::css("Request button", "input#save_requisition"),
            target_inventory: Locator::xpath("target inventory", "//input[@id='activeInventory']"),
            item_name: Locator::xpath("item name", "//input[@id='itemName0']"),
            required_quantity: Locator::xpath("required quantity", "//input[@id='qtyip0']"),
            popup_close_button: Locator::css("pop-up close", "a.close-btn"),
            close_modal: Locator::css("modal cancel", "a[title='Cancel']"),
        }
    }
}

impl SubstoreLocators {
    /// Message paragraph of a pop-up whose status line contains `status`
    #[must_use]
    pub fn popup_message(status: &str, text: &str) -> Locator {
        Locator::xpath(
            format!("{status} pop-up '{text}'"),
            format!(
                "//p[contains(text(),{})]/../p[contains(text(),{})]",
                xpath_literal(&format!(" {status} ")),
                xpath_literal(text)
            ),
        )
    }

    /// Controls of the requisition list, in check order
    #[must_use]
    pub fn requisition_controls(&self) -> [&Locator; 13] {
        [
            &self.button_first,
            &self.button_previous,
            &self.button_next,
            &self.button_last,
            &self.button_ok,
            &self.create_requisition_button,
            &self.search_bar,
            &self.star_icon,
            &self.radio_pending,
            &self.radio_complete,
            &self.radio_cancelled,
            &self.radio_withdrawn,
            &self.radio_all,
        ]
    }

    /// Inventory sub-module hops, in order
    #[must_use]
    pub fn navigation_steps(&self) -> [NavigationStep<'_>; 6] {
        [
            NavigationStep {
                link: &self.stock,
                url_fragment: "Inventory/Stock",
            },
            NavigationStep {
                link: &self.inventory_requisition,
                url_fragment: REQUISITION_LIST_URL_FRAGMENT,
            },
            NavigationStep {
                link: &self.consumption,
                url_fragment: "Inventory/Consumption/ConsumptionList",
            },
            NavigationStep {
                link: &self.reports,
                url_fragment: "Inventory/Reports",
            },
            NavigationStep {
                link: &self.patient_consumption,
                url_fragment: "Inventory/PatientConsumption/PatientConsumptionList",
            },
            NavigationStep {
                link: &self.return_link,
                url_fragment: "Inventory/Return",
            },
        ]
    }
}

/// Substore page object
#[derive(Debug)]
pub struct SubstorePage<'d, D: WebDriver + ?Sized> {
    events: CommonEvents<'d, D>,
    locators: SubstoreLocators,
    page_wait: WaitPolicy,
    url_wait_ms: u64,
}

impl<'d, D: WebDriver + ?Sized> SubstorePage<'d, D> {
    /// Substore page with default waits
    #[must_use]
    pub fn new(driver: &'d D) -> Self {
        Self {
            events: CommonEvents::new(driver),
            locators: SubstoreLocators::default(),
            page_wait: WaitPolicy::from_millis(DEFAULT_PAGE_TIMEOUT_MS),
            url_wait_ms: 5000,
        }
    }

    /// Substore page with waits and screenshot directory from `config`
    #[must_use]
    pub fn from_config(driver: &'d D, config: &SuiteConfig) -> Self {
        let mut events = CommonEvents::new(driver).with_wait(config.timeouts.element_wait());
        if let Some(ref dir) = config.screenshot_dir {
            events = events.with_screenshot_dir(dir.clone());
        }
        Self::new(driver)
            .with_events(events)
            .with_page_wait(config.timeouts.page_wait())
            .with_url_wait_ms(config.timeouts.url_ms)
    }

    /// Replace the interaction helpers
    #[must_use]
    pub fn with_events(mut self, events: CommonEvents<'d, D>) -> Self {
        self.events = events;
        self
    }

    /// Bound for the Substore tab URL wait
    #[must_use]
    pub fn with_page_wait(mut self, page_wait: WaitPolicy) -> Self {
        self.page_wait = page_wait;
        self
    }

    /// Bound for each URL wait between sub-module hops
    #[must_use]
    pub const fn with_url_wait_ms(mut self, url_wait_ms: u64) -> Self {
        self.url_wait_ms = url_wait_ms;
        self
    }

    /// Locators
    #[must_use]
    pub fn locators(&self) -> &SubstoreLocators {
        &self.locators
    }

    /// Interaction helpers
    #[must_use]
    pub fn events(&self) -> &CommonEvents<'d, D> {
        &self.events
    }

    /// Scroll the Substore tab into view, open it, and return the URL once
    /// it contains `WardSupply`.
    ///
    /// # Errors
    ///
    /// `Workflow` wrapping the lookup, click or URL wait failure.
    pub fn scroll_to_substore_tab_and_verify_url(&self) -> UiResult<String> {
        self.open_substore_tab().map_err(UiError::in_workflow(
            "scroll_to_substore_tab_and_verify_url",
            "Failed to click Substore tab or verify URL",
        ))
    }

    fn open_substore_tab(&self) -> UiResult<String> {
        let tab = self.events.find_element(&self.locators.substore_tab)?;
        self.events.scroll_into_view(&tab)?;
        self.events.scroll_by(0, -50)?;
        self.events.highlight(&tab);
        self.events.click(&tab)?;
        self.events
            .wait_for_url_contains(SUBSTORE_URL_FRAGMENT, self.page_wait.timeout_ms())?;
        let url = self.events.current_url()?;
        info!(%url, "Substore opened");
        Ok(url)
    }

    /// Click the first counter link if there is one.
    ///
    /// No counter on the page is not a failure.
    ///
    /// # Errors
    ///
    /// `Workflow` when a present counter cannot be clicked.
    pub fn click_fourth_counter_if_available(&self) -> UiResult<bool> {
        self.click_first_counter().map_err(UiError::in_workflow(
            "click_fourth_counter_if_available",
            "Failed to click the fourth counter if available",
        ))
    }

    fn click_first_counter(&self) -> UiResult<bool> {
        let counters = self
            .events
            .find_elements(&self.locators.counter_button_fourth)?;
        info!(count = counters.len(), "Counter elements");
        if let Some(first) = counters.first() {
            self.events.highlight(first);
            self.events.click(first)?;
        }
        Ok(true)
    }

    /// Hover the sign-out icon and check its tooltip contains
    /// `moduleSignOutHoverText`
    ///
    /// # Errors
    ///
    /// `Workflow` wrapping `MissingKey`, `AssertionFailed` on mismatch, or the
    /// interaction failure.
    pub fn verify_module_signout_hover_text(&self, expected: &Expectations) -> UiResult<bool> {
        self.check_signout_hover_text(expected).map_err(UiError::in_workflow(
            "verify_module_signout_hover_text",
            "Failed to verify the hover text on the 'Sign Out' module",
        ))
    }

    fn check_signout_hover_text(&self, expected: &Expectations) -> UiResult<bool> {
        let expected = expected.require(Expectations::SIGN_OUT_HOVER_TEXT)?;
        let l = &self.locators;
        self.events.click(&l.inventory)?;

        let icon = self.events.find_element(&l.module_signout)?;
        self.events.hover(&icon)?;

        let tooltip = self
            .events
            .wait_for_visible(&l.hover_text, self.events.wait_policy().timeout())?;
        let actual = self.events.driver().text(&tooltip)?;
        info!(%actual, "Hover text");

        if actual.contains(expected) {
            Ok(true)
        } else {
            Err(UiError::assertion(format!(
                "Hover text did not match the expected value: expected '{expected}', got '{actual}'"
            )))
        }
    }

    /// Open the Inventory and Pharmacy sub-modules in turn
    ///
    /// # Errors
    ///
    /// `Workflow` wrapping `MissingKey` (`URL`) or the interaction failure.
    pub fn verify_substore_sub_module(&self, expected: &Expectations) -> UiResult<bool> {
        self.open_inventory_and_pharmacy(expected)
            .map_err(UiError::in_workflow(
                "verify_substore_sub_module",
                "Failed to verify substore sub-modules",
            ))
    }

    fn open_inventory_and_pharmacy(&self, expected: &Expectations) -> UiResult<bool> {
        let url = expected.require(Expectations::URL)?;
        info!(url, "Substore page URL");
        let l = &self.locators;

        let inventory = self.events.find_element(&l.inventory)?;
        let pharmacy = self.events.find_element(&l.pharmacy)?;

        self.events.highlight(&inventory);
        self.events.click(&l.inventory)?;
        self.events.highlight(&pharmacy);
        self.events.click(&l.pharmacy)?;
        Ok(true)
    }

    /// Open Inventory and report whether any sub-module tab is displayed
    ///
    /// # Errors
    ///
    /// `Workflow` wrapping the click or lookup failure.
    pub fn sub_module_present_inventory(&self) -> UiResult<bool> {
        self.any_inventory_sub_module_displayed()
            .map_err(UiError::in_workflow(
                "sub_module_present_inventory",
                "Failed to find elements",
            ))
    }

    fn any_inventory_sub_module_displayed(&self) -> UiResult<bool> {
        self.events.click(&self.locators.inventory)?;
        let sub_modules = self.events.find_elements(&self.locators.sub_module)?;
        info!(count = sub_modules.len(), "Sub-module count");
        if sub_modules.is_empty() {
            info!("No sub-modules found under the specified module");
            return Ok(false);
        }

        let mut any_displayed = false;
        for sub_module in &sub_modules {
            let displayed = self.events.is_displayed(sub_module);
            debug!(%sub_module, displayed, "Sub-module");
            any_displayed |= displayed;
        }
        Ok(any_displayed)
    }

    /// Walk Inventory, then Stock through Return, then back to Stock.
    ///
    /// Every hop waits for its URL fragment before the next link is clicked.
    ///
    /// # Errors
    ///
    /// `Workflow` wrapping the first click or URL wait that failed.
    pub fn verify_navigation_between_submodules(&self) -> UiResult<bool> {
        self.walk_sub_modules().map_err(UiError::in_workflow(
            "verify_navigation_between_submodules",
            "Navigation between submodules failed",
        ))
    }

    fn walk_sub_modules(&self) -> UiResult<bool> {
        let l = &self.locators;
        self.events.click(&l.inventory)?;
        for step in l.navigation_steps() {
            self.events.click(step.link)?;
            self.events
                .wait_for_url_contains(step.url_fragment, self.url_wait_ms)?;
            debug!(fragment = step.url_fragment, "Sub-module reached");
        }
        self.events.click(&l.stock)?;
        Ok(true)
    }

    /// Save a screenshot of the current page with prefix `SubStore`
    ///
    /// # Errors
    ///
    /// `Workflow` wrapping the capture or write failure.
    pub fn taking_screenshot_of_the_current_page(&self) -> UiResult<bool> {
        self.capture_current_page()
            .map(|_| true)
            .map_err(UiError::in_workflow(
                "taking_screenshot_of_the_current_page",
                "Error capturing screenshot",
            ))
    }

    /// Save a screenshot of the current page and return its path
    ///
    /// # Errors
    ///
    /// Driver failure or `Screenshot`.
    pub fn capture_current_page(&self) -> UiResult<PathBuf> {
        self.events.take_screenshot(SCREENSHOT_PREFIX)
    }

    /// Open the requisition list and check every fixed control is displayed.
    ///
    /// Fails on the first control that is not displayed.
    ///
    /// # Errors
    ///
    /// `Workflow` wrapping `NotFound` or an `AssertionFailed` naming the
    /// control.
    pub fn verify_inventory_requisition_ui_elements(&self) -> UiResult<bool> {
        self.check_requisition_controls().map_err(UiError::in_workflow(
            "verify_inventory_requisition_ui_elements",
            "Failed to verify if all fields are displayed",
        ))
    }

    fn check_requisition_controls(&self) -> UiResult<bool> {
        let l = &self.locators;
        self.events.click(&l.inventory_requisition)?;
        self.events
            .wait_for_url_contains(REQUISITION_LIST_URL_FRAGMENT, self.url_wait_ms)?;

        let controls = l
            .requisition_controls()
            .into_iter()
            .map(|locator| {
                self.events
                    .find_element(locator)
                    .map(|element| (locator, element))
            })
            .collect::<UiResult<Vec<_>>>()?;

        for (locator, element) in &controls {
            self.events.highlight(element);
            if !self.events.is_displayed(element) {
                return Err(UiError::assertion(format!(
                    "Visibility check failed for: {locator}"
                )));
            }
        }
        Ok(true)
    }

    /// Create a requisition from `form` and return the success pop-up text
    ///
    /// # Errors
    ///
    /// `Workflow` wrapping the first failing step.
    pub fn verify_create_requisition_button(&self, form: &RequisitionForm) -> UiResult<String> {
        self.create_requisition(form).map_err(UiError::in_workflow(
            "verify_create_requisition_button",
            "Failed to create requisition",
        ))
    }

    fn create_requisition(&self, form: &RequisitionForm) -> UiResult<String> {
        let l = &self.locators;
        let timeout = self.events.wait_policy().timeout();

        let create = self.events.find_element(&l.create_requisition_button)?;
        self.events.highlight(&create);
        self.events.click(&create)?;
        debug!("Create Requisition clicked");

        self.events
            .wait_for_url_contains(REQUISITION_ITEM_URL_FRAGMENT, self.url_wait_ms)?;
        let request = self.events.find_element(&l.request_button)?;
        self.events.wait_till_element_visible(&request, timeout)?;

        self.events.click(&l.target_inventory)?;
        self.events
            .send_keys(&l.target_inventory, &form.target_inventory)?;
        let target = self.events.find_element(&l.target_inventory)?;
        self.events
            .send_keys(&target, &format!("{}{}", Key::Tab, Key::Tab))?;

        let item = self.events.wait_until_interactable(&l.item_name, timeout)?;
        self.events.highlight(&item);
        self.events.send_keys(&item, &form.item_name)?;
        self.events.send_keys(&item, &Key::Enter.to_string())?;

        self.events
            .wait_until_interactable(&l.required_quantity, timeout)?;
        self.events.highlight(&l.required_quantity);
        self.events
            .send_keys(&l.required_quantity, &form.quantity.to_string())?;

        self.events.highlight(&request);
        self.events.click(&request)?;
        debug!(quantity = form.quantity, "Requisition submitted");

        let popup = self.events.find_element(&SubstoreLocators::popup_message(
            "success",
            REQUISITION_SAVED_MESSAGE,
        ))?;
        let message = self.events.driver().text(&popup)?;
        info!(%message, "Requisition saved");

        self.events.click(&l.popup_close_button)?;
        self.events.click(&l.close_modal)?;
        Ok(message)
    }
}

impl<D: WebDriver + ?Sized> PageObject for SubstorePage<'_, D> {
    fn url_pattern(&self) -> &str {
        SUBSTORE_URL_FRAGMENT
    }

    fn ready_marker(&self) -> &Locator {
        &self.locators.inventory
    }

    fn load_timeout_ms(&self) -> u64 {
        self.page_wait.timeout_ms()
    }

    fn page_name(&self) -> &str {
        "SubstorePage"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::Selector;
    use crate::mock::{MockDriver, MockElement};

    mod locator_tests {
        use super::*;

        #[test]
        fn test_anchor_locators_match_link_text() {
            let l = SubstoreLocators::default();
            assert_eq!(
                l.inventory_requisition.selector(),
                &Selector::xpath("//a[contains(text(),'Inventory Requisition')]")
            );
            assert_eq!(
                l.button_ok.selector(),
                &Selector::xpath("//button[contains(text(),'OK')]")
            );
            assert_eq!(
                l.radio_withdrawn.selector(),
                &Selector::xpath("//label[contains(text(),'Withdrawn')]/span")
            );
        }

        #[test]
        fn test_popup_message_locator() {
            let loc = SubstoreLocators::popup_message("success", REQUISITION_SAVED_MESSAGE);
            assert_eq!(
                loc.selector(),
                &Selector::xpath(
                    "//p[contains(text(),' success ')]/../p[contains(text(),'Requisition is Generated and Saved')]"
                )
            );
        }

        #[test]
        fn test_requisition_controls_are_distinct() {
            let l = SubstoreLocators::default();
            let controls = l.requisition_controls();
            for (i, a) in controls.iter().enumerate() {
                for b in &controls[i + 1..] {
                    assert_ne!(a.selector(), b.selector());
                }
            }
        }

        #[test]
        fn test_navigation_order() {
            let l = SubstoreLocators::default();
            let fragments: Vec<_> = l.navigation_steps().iter().map(|s| s.url_fragment).collect();
            assert_eq!(
                fragments,
                vec![
                    "Inventory/Stock",
                    "Inventory/InventoryRequisitionList",
                    "Inventory/Consumption/ConsumptionList",
                    "Inventory/Reports",
                    "Inventory/PatientConsumption/PatientConsumptionList",
                    "Inventory/Return",
                ]
            );
        }
    }

    mod requisition_form_tests {
        use super::*;

        #[test]
        fn test_default_quantity_is_five() {
            let form = RequisitionForm::default();
            assert_eq!(form.quantity, 5);
            assert_eq!(form.target_inventory, "General-Inventory");
            assert_eq!(form.with_quantity(1).quantity, 1);
        }
    }

    mod counter_tests {
        use super::*;

        #[test]
        fn test_no_counter_is_success_without_click() {
            let driver = MockDriver::new();
            let page = SubstorePage::new(&driver);
            assert!(page.click_fourth_counter_if_available().unwrap());
            assert!(driver.clicks().is_empty());
        }

        #[test]
        fn test_first_counter_clicked_once() {
            let counter = Selector::xpath("//a[@class='report_list']");
            let driver = MockDriver::new()
                .with_element(MockElement::new(counter.clone()))
                .with_element(MockElement::new(counter.clone()));
            let page = SubstorePage::new(&driver);
            assert!(page.click_fourth_counter_if_available().unwrap());
            let clicks = driver.clicks();
            assert_eq!(clicks.len(), 1);
            assert_eq!(clicks[0].selector, counter);
        }
    }

    #[test]
    fn test_page_object_impl() {
        let driver = MockDriver::new().with_url("http://emr/#/WardSupply/Inventory");
        let page = SubstorePage::new(&driver);
        assert!(page.matches_url(&driver.current_url().unwrap()));
        assert_eq!(page.page_name(), "SubstorePage");
        assert_eq!(page.load_timeout_ms(), 30_000);
    }
}
