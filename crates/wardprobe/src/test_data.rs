//! JSON test fixtures and expectation maps.

use crate::result::{UiError, UiResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// A JSON fixture file loaded at invocation time
#[derive(Debug, Clone)]
pub struct TestData {
    path: PathBuf,
    root: serde_json::Value,
}

impl TestData {
    /// Read and parse a fixture file
    ///
    /// # Errors
    ///
    /// `Fixture` when the file is unreadable or not valid JSON.
    pub fn load(path: impl AsRef<Path>) -> UiResult<Self> {
        let path = path.as_ref().to_path_buf();
        let raw = std::fs::read_to_string(&path).map_err(|err| UiError::Fixture {
            path: path.clone(),
            message: err.to_string(),
        })?;
        let root = serde_json::from_str(&raw).map_err(|err| UiError::Fixture {
            path: path.clone(),
            message: err.to_string(),
        })?;
        Ok(Self { path, root })
    }

    /// Wrap an in-memory value
    #[must_use]
    pub fn from_value(path: impl Into<PathBuf>, root: serde_json::Value) -> Self {
        Self {
            path: path.into(),
            root,
        }
    }

    /// Source file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Look up a dotted path such as `ValidLogin.Username`
    #[must_use]
    pub fn get(&self, dotted: &str) -> Option<&serde_json::Value> {
        dotted
            .split('.')
            .try_fold(&self.root, |node, segment| node.get(segment))
    }

    /// String at a dotted path
    ///
    /// # Errors
    ///
    /// `MissingKey` when the path is absent or not a string.
    pub fn require_str(&self, dotted: &str) -> UiResult<&str> {
        self.get(dotted)
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| UiError::missing_key(dotted))
    }
}

/// Login credentials from the `ValidLogin` fixture section
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// User name
    pub username: String,
    /// Password; never logged
    pub password: String,
}

impl Credentials {
    /// Fixture key for the user name
    pub const USERNAME_KEY: &'static str = "ValidLogin.Username";
    /// Fixture key for the password
    pub const PASSWORD_KEY: &'static str = "ValidLogin.Password";

    /// Extract credentials from a loaded fixture
    ///
    /// # Errors
    ///
    /// `MissingKey` naming the first absent key.
    pub fn from_test_data(data: &TestData) -> UiResult<Self> {
        Ok(Self {
            username: data.require_str(Self::USERNAME_KEY)?.to_string(),
            password: data.require_str(Self::PASSWORD_KEY)?.to_string(),
        })
    }

    /// Load the fixture at `path` and extract credentials
    ///
    /// # Errors
    ///
    /// `Fixture` or `MissingKey`.
    pub fn load(path: impl AsRef<Path>) -> UiResult<Self> {
        Self::from_test_data(&TestData::load(path)?)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// String-keyed expected values passed to verification workflows
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Expectations(HashMap<String, String>);

impl Expectations {
    /// Hover text expected on the sign-out icon
    pub const SIGN_OUT_HOVER_TEXT: &'static str = "moduleSignOutHoverText";
    /// URL fragment of the Substore module
    pub const URL: &'static str = "URL";

    /// Empty map
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.0.insert(key.into(), value.into());
        self
    }

    /// Value for `key`, if any
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Value for `key`
    ///
    /// # Errors
    ///
    /// `MissingKey` when absent.
    pub fn require(&self, key: &str) -> UiResult<&str> {
        self.get(key).ok_or_else(|| UiError::missing_key(key))
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// No entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Expectations {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
