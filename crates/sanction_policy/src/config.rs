//! Policy configuration.

use serde::{Deserialize, Serialize};

/// Default module for `Named` checks and hooks
pub const DEFAULT_CHECK_MODULE: &str = "checks";

/// Default denial reason and panic message
pub const DEFAULT_UNAUTHORIZED: &str = "unauthorized";

/// Policy configuration, fixed when the policy is built
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Policy identity, used in logs
    pub name: String,
    /// Module that resolves `Named` checks and hooks
    pub check_module: String,
    /// Reason returned by `authorize` on denial
    pub error_reason: String,
    /// Message used by `authorize_or_panic` on denial
    pub error_message: String,
}

impl PolicyConfig {
    /// Create a configuration with defaults
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the default check module
    #[must_use]
    pub fn with_check_module(mut self, module: impl Into<String>) -> Self {
        self.check_module = module.into();
        self
    }

    /// Set the denial reason
    #[must_use]
    pub fn with_error_reason(mut self, reason: impl Into<String>) -> Self {
        self.error_reason = reason.into();
        self
    }

    /// Set the panic message
    #[must_use]
    pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = message.into();
        self
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            name: "policy".to_string(),
            check_module: DEFAULT_CHECK_MODULE.to_string(),
            error_reason: DEFAULT_UNAUTHORIZED.to_string(),
            error_message: DEFAULT_UNAUTHORIZED.to_string(),
        }
    }
}
