//! Rule introspection.
//!
//! A `RuleFilter` selects rules by object, action, the checks in their allow or
//! deny groups, and their metadata. Dimensions are AND-combined; several values
//! within one dimension match if any of them does.

use crate::engine::{Decision, PolicyError};
use crate::registry::Policy;
use crate::rule::{Check, Rule};
use sanction_core::Options;
use serde_json::Value;

/// Matches a check inside allow or deny groups
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckMatch {
    /// Any check with this name, with or without argument
    Name(String),
    /// A check with this name and exactly this argument
    Exact(String, Value),
}

impl CheckMatch {
    /// Match a check name regardless of argument
    #[must_use]
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    /// Match a check name and argument
    #[must_use]
    pub fn exact(name: impl Into<String>, arg: impl Into<Value>) -> Self {
        Self::Exact(name.into(), arg.into())
    }

    /// Whether the check matches
    #[must_use]
    pub fn matches(&self, check: &Check) -> bool {
        match (self, check) {
            (Self::Name(name), Check::Named(other) | Check::NamedWithArg(other, _)) => {
                name == other
            }
            (Self::Exact(name, arg), Check::NamedWithArg(other, other_arg)) => {
                name == other && arg == other_arg
            }
            _ => false,
        }
    }
}

/// Matches a metadata entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataMatch {
    /// Any entry with this key
    Key(String),
    /// An entry with exactly this key and value
    Pair(String, Value),
}

impl MetadataMatch {
    /// Match a key
    #[must_use]
    pub fn key(key: impl Into<String>) -> Self {
        Self::Key(key.into())
    }

    /// Match a key/value pair
    #[must_use]
    pub fn pair(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Pair(key.into(), value.into())
    }

    /// Whether the entry matches
    #[must_use]
    pub fn matches(&self, key: &str, value: &Value) -> bool {
        match self {
            Self::Key(k) => k == key,
            Self::Pair(k, v) => k == key && v == value,
        }
    }
}

/// Rule filter; an empty filter matches every rule
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleFilter {
    objects: Vec<String>,
    actions: Vec<String>,
    allow: Vec<CheckMatch>,
    deny: Vec<CheckMatch>,
    metadata: Vec<MetadataMatch>,
}

impl RuleFilter {
    /// Create an empty filter
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Match this object
    #[must_use]
    pub fn object(mut self, object: impl Into<String>) -> Self {
        self.objects.push(object.into());
        self
    }

    /// Match this action
    #[must_use]
    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.actions.push(action.into());
        self
    }

    /// Match rules whose allow groups contain the check
    #[must_use]
    pub fn allow(mut self, check: CheckMatch) -> Self {
        self.allow.push(check);
        self
    }

    /// Match rules whose deny groups contain the check
    #[must_use]
    pub fn deny(mut self, check: CheckMatch) -> Self {
        self.deny.push(check);
        self
    }

    /// Match rules carrying the metadata
    #[must_use]
    pub fn metadata(mut self, entry: MetadataMatch) -> Self {
        self.metadata.push(entry);
        self
    }

    /// Whether a rule passes every dimension of the filter
    #[must_use]
    pub fn matches(&self, rule: &Rule) -> bool {
        fn any_or_empty(wanted: &[String], value: &str) -> bool {
            wanted.is_empty() || wanted.iter().any(|w| w == value)
        }

        any_or_empty(&self.objects, &rule.object)
            && any_or_empty(&self.actions, &rule.action)
            && (self.allow.is_empty()
                || self.allow.iter().any(|m| rule.allow_checks().any(|c| m.matches(c))))
            && (self.deny.is_empty()
                || self.deny.iter().any(|m| rule.deny_checks().any(|c| m.matches(c))))
            && (self.metadata.is_empty()
                || self
                    .metadata
                    .iter()
                    .any(|m| rule.metadata.iter().any(|(k, v)| m.matches(k, v))))
    }
}

/// Keep the rules that pass the filter, in order
#[must_use]
pub fn filter_rules<'a>(rules: impl IntoIterator<Item = &'a Rule>, filter: &RuleFilter) -> Vec<&'a Rule> {
    rules.into_iter().filter(|rule| filter.matches(rule)).collect()
}

impl<S, O> Policy<S, O> {
    /// Rules of this policy that pass the filter, in name order
    #[must_use]
    pub fn filter_rules(&self, filter: &RuleFilter) -> Vec<&Rule> {
        filter_rules(self.list_rules(), filter)
    }
}

impl<S: Clone, O: Clone> Policy<S, O> {
    /// Keep the rules for `object_name` that allow `subject` on `object`.
    ///
    /// Rules for other objects are dropped. Order is preserved.
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::HookFailure` if a pre-hook fails
    pub fn filter_allowed<'a>(
        &self,
        rules: impl IntoIterator<Item = &'a Rule>,
        subject: &S,
        object_name: &str,
        object: &O,
        opts: &Options,
    ) -> Result<Vec<&'a Rule>, PolicyError> {
        let mut allowed = Vec::new();
        for rule in rules {
            if rule.object != object_name {
                continue;
            }
            if self.decide(&rule.name, subject, object, opts)? == Decision::Allowed {
                allowed.push(rule);
            }
        }
        Ok(allowed)
    }

    /// Every rule of this policy for `object_name` that allows `subject` on `object`
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::HookFailure` if a pre-hook fails
    pub fn filter_allowed_actions(
        &self,
        subject: &S,
        object_name: &str,
        object: &O,
        opts: &Options,
    ) -> Result<Vec<&Rule>, PolicyError> {
        self.filter_allowed(self.list_rules(), subject, object_name, object, opts)
    }

    /// Names of the allowed rules for `object_name`
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::HookFailure` if a pre-hook fails
    pub fn allowed_rule_names(
        &self,
        subject: &S,
        object_name: &str,
        object: &O,
        opts: &Options,
    ) -> Result<Vec<&str>, PolicyError> {
        Ok(self
            .filter_allowed_actions(subject, object_name, object, opts)?
            .into_iter()
            .map(|rule| rule.name.as_str())
            .collect())
    }
}
