//! Rule definitions.
//!
//! A rule is plain data: which checks allow or deny an action on an object,
//! which hooks hydrate the subject/object first, and free-form metadata for
//! introspection. Rules are bound to check functions when the policy is built.

use sanction_core::{Options, rule_name};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An atomic check reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Check {
    /// Constant result, evaluated without a call
    Literal(bool),
    /// Call `name(subject, object)`
    Named(String),
    /// Call `name(subject, object, arg)`
    NamedWithArg(String, Value),
}

impl Check {
    /// Reference a 2-arity check
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Reference a 3-arity check with its argument
    #[must_use]
    pub fn with_arg(name: impl Into<String>, arg: impl Into<Value>) -> Self {
        Self::NamedWithArg(name.into(), arg.into())
    }

    /// Check name, if this is not a literal
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Literal(_) => None,
            Self::Named(name) | Self::NamedWithArg(name, _) => Some(name),
        }
    }
}

impl From<bool> for Check {
    fn from(value: bool) -> Self {
        Self::Literal(value)
    }
}

impl From<&str> for Check {
    fn from(name: &str) -> Self {
        Self::Named(name.to_string())
    }
}

/// A condition group: one check, or several checks combined with AND
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionGroup {
    /// A single check
    Single(Check),
    /// Checks that must all pass; an empty list never passes
    All(Vec<Check>),
}

impl ConditionGroup {
    /// Checks in declaration order
    #[must_use]
    pub fn checks(&self) -> &[Check] {
        match self {
            Self::Single(check) => std::slice::from_ref(check),
            Self::All(checks) => checks,
        }
    }
}

impl From<Check> for ConditionGroup {
    fn from(check: Check) -> Self {
        Self::Single(check)
    }
}

impl From<bool> for ConditionGroup {
    fn from(value: bool) -> Self {
        Self::Single(Check::Literal(value))
    }
}

impl From<Vec<Check>> for ConditionGroup {
    fn from(checks: Vec<Check>) -> Self {
        Self::All(checks)
    }
}

/// Reference to a hydration hook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookRef {
    /// 2-arity hook in the configured check module
    Named(String),
    /// 2-arity hook in an explicit module
    ModuleFunction {
        /// Module name
        module: String,
        /// Hook name
        name: String,
    },
    /// 3-arity hook in an explicit module, called with static args merged with call options
    ModuleFunctionArgs {
        /// Module name
        module: String,
        /// Hook name
        name: String,
        /// Static arguments; call options win on key collision
        args: Options,
    },
}

impl HookRef {
    /// Reference a hook in the configured check module
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Reference a hook in an explicit module
    #[must_use]
    pub fn in_module(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self::ModuleFunction {
            module: module.into(),
            name: name.into(),
        }
    }

    /// Reference a parameterized hook in an explicit module
    #[must_use]
    pub fn with_args(module: impl Into<String>, name: impl Into<String>, args: Options) -> Self {
        Self::ModuleFunctionArgs {
            module: module.into(),
            name: name.into(),
            args,
        }
    }

    /// Hook name
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Named(name)
            | Self::ModuleFunction { name, .. }
            | Self::ModuleFunctionArgs { name, .. } => name,
        }
    }
}

/// One authorization rule for an object/action pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Object identifier, e.g. `article`
    pub object: String,
    /// Action identifier, e.g. `update`
    pub action: String,
    /// Unique rule name; derived as `{object}_{action}` when left empty
    #[serde(default)]
    pub name: String,
    /// Allow groups, OR-combined
    #[serde(default)]
    pub allow: Vec<ConditionGroup>,
    /// Deny groups, OR-combined; any passing group denies
    #[serde(default)]
    pub deny: Vec<ConditionGroup>,
    /// Hooks run in order before any check
    #[serde(default)]
    pub pre_hooks: Vec<HookRef>,
    /// Metadata entries; keys may repeat
    #[serde(default)]
    pub metadata: Vec<(String, Value)>,
    /// Human description, not used for decisions
    #[serde(default)]
    pub description: Option<String>,
}

impl Rule {
    /// Create an empty rule for an object/action pair
    #[must_use]
    pub fn new(object: impl Into<String>, action: impl Into<String>) -> Self {
        let object = object.into();
        let action = action.into();
        Self {
            name: rule_name(&object, &action),
            object,
            action,
            allow: Vec::new(),
            deny: Vec::new(),
            pre_hooks: Vec::new(),
            metadata: Vec::new(),
            description: None,
        }
    }

    /// Add an allow group
    #[must_use]
    pub fn allow(mut self, group: impl Into<ConditionGroup>) -> Self {
        self.allow.push(group.into());
        self
    }

    /// Add a deny group
    #[must_use]
    pub fn deny(mut self, group: impl Into<ConditionGroup>) -> Self {
        self.deny.push(group.into());
        self
    }

    /// Append a pre-hook
    #[must_use]
    pub fn pre_hook(mut self, hook: HookRef) -> Self {
        self.pre_hooks.push(hook);
        self
    }

    /// Append a metadata entry
    #[must_use]
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.push((key.into(), value.into()));
        self
    }

    /// Set the description
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// All checks in allow groups, depth first
    pub fn allow_checks(&self) -> impl Iterator<Item = &Check> {
        self.allow.iter().flat_map(ConditionGroup::checks)
    }

    /// All checks in deny groups, depth first
    pub fn deny_checks(&self) -> impl Iterator<Item = &Check> {
        self.deny.iter().flat_map(ConditionGroup::checks)
    }

    /// Metadata values for a key, in order
    pub fn metadata_values<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a Value> {
        self.metadata
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Fill in the canonical name when none was given
    pub(crate) fn normalize(mut self) -> Self {
        if self.name.is_empty() {
            self.name = rule_name(&self.object, &self.action);
        }
        self
    }
}
