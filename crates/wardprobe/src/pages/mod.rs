//! Page objects for the application under test.

mod login;
mod substore;

pub use login::{LoginLocators, LoginPage};
pub use substore::{
    NavigationStep, RequisitionForm, SubstoreLocators, SubstorePage, REQUISITION_ITEM_URL_FRAGMENT,
    REQUISITION_LIST_URL_FRAGMENT, REQUISITION_SAVED_MESSAGE, SCREENSHOT_PREFIX,
    SUBSTORE_URL_FRAGMENT,
};
