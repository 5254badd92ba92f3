//! Check modules: named tables of check and hook functions.
//!
//! Rules refer to checks and hooks by name. A module maps those names to the
//! functions that implement them. Modules are handed to the policy builder,
//! which resolves every reference once and fails the build on unknown names.

use crate::hook::HookError;
use indexmap::IndexMap;
use sanction_core::Options;
use serde_json::Value;
use std::sync::Arc;

/// `(subject, object) -> bool`
pub type CheckFn<S, O> = Arc<dyn Fn(&S, &O) -> bool + Send + Sync>;

/// `(subject, object, arg) -> bool`
pub type CheckArgFn<S, O> = Arc<dyn Fn(&S, &O, &Value) -> bool + Send + Sync>;

/// `(subject, object) -> (subject, object)`
pub type HookFn<S, O> = Arc<dyn Fn(S, O) -> Result<(S, O), HookError> + Send + Sync>;

/// `(subject, object, args) -> (subject, object)`
pub type HookArgsFn<S, O> =
    Arc<dyn Fn(S, O, &Options) -> Result<(S, O), HookError> + Send + Sync>;

/// Named table of checks and hooks
pub struct CheckModule<S, O> {
    name: String,
    checks: IndexMap<String, CheckFn<S, O>>,
    checks_with_arg: IndexMap<String, CheckArgFn<S, O>>,
    hooks: IndexMap<String, HookFn<S, O>>,
    hooks_with_args: IndexMap<String, HookArgsFn<S, O>>,
}

impl<S, O> CheckModule<S, O> {
    /// Create an empty module
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            checks: IndexMap::new(),
            checks_with_arg: IndexMap::new(),
            hooks: IndexMap::new(),
            hooks_with_args: IndexMap::new(),
        }
    }

    /// Module name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a 2-arity check
    #[must_use]
    pub fn check<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&S, &O) -> bool + Send + Sync + 'static,
    {
        self.checks.insert(name.into(), Arc::new(f));
        self
    }

    /// Register a 3-arity check
    #[must_use]
    pub fn check_with_arg<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&S, &O, &Value) -> bool + Send + Sync + 'static,
    {
        self.checks_with_arg.insert(name.into(), Arc::new(f));
        self
    }

    /// Register a 2-arity hook
    #[must_use]
    pub fn hook<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(S, O) -> Result<(S, O), HookError> + Send + Sync + 'static,
    {
        self.hooks.insert(name.into(), Arc::new(f));
        self
    }

    /// Register a 3-arity hook
    #[must_use]
    pub fn hook_with_args<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(S, O, &Options) -> Result<(S, O), HookError> + Send + Sync + 'static,
    {
        self.hooks_with_args.insert(name.into(), Arc::new(f));
        self
    }

    pub(crate) fn get_check(&self, name: &str) -> Option<CheckFn<S, O>> {
        self.checks.get(name).map(Arc::clone)
    }

    pub(crate) fn get_check_with_arg(&self, name: &str) -> Option<CheckArgFn<S, O>> {
        self.checks_with_arg.get(name).map(Arc::clone)
    }

    pub(crate) fn get_hook(&self, name: &str) -> Option<HookFn<S, O>> {
        self.hooks.get(name).map(Arc::clone)
    }

    pub(crate) fn get_hook_with_args(&self, name: &str) -> Option<HookArgsFn<S, O>> {
        self.hooks_with_args.get(name).map(Arc::clone)
    }
}

impl<S, O> std::fmt::Debug for CheckModule<S, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckModule")
            .field("name", &self.name)
            .field("checks", &self.checks.keys().collect::<Vec<_>>())
            .field("checks_with_arg", &self.checks_with_arg.keys().collect::<Vec<_>>())
            .field("hooks", &self.hooks.keys().collect::<Vec<_>>())
            .field("hooks_with_args", &self.hooks_with_args.keys().collect::<Vec<_>>())
            .finish()
    }
}
