//! Call-time options.
//!
//! Options are an ordered key/value map. They are passed through every decision
//! call and merged into the static arguments of parameterized hooks.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ordered key/value options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Options {
    entries: IndexMap<String, Value>,
}

impl Options {
    /// Create empty options
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Set an option
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert an option, replacing any previous value for the key
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Get an option
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Check whether a key is present
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Merge `overrides` over `self`.
    ///
    /// Keys keep their first insertion position; on collision the value from
    /// `overrides` wins.
    #[must_use]
    pub fn merged(&self, overrides: &Options) -> Options {
        let mut entries = self.entries.clone();
        for (key, value) in &overrides.entries {
            entries.insert(key.clone(), value.clone());
        }
        Options { entries }
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }

    /// Number of options
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no options
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Options {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut options = Options::new();
        for (key, value) in iter {
            options.insert(key, value);
        }
        options
    }
}
