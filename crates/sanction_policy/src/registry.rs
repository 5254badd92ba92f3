//! Rule registry.
//!
//! Rules and check modules are collected by a `PolicyBuilder`. `build` checks
//! the rules, resolves every check and hook name to its function, and freezes
//! the result into an immutable `Policy`.

use crate::check::{BoundCheck, BoundGroup};
use crate::config::PolicyConfig;
use crate::engine::PolicyError;
use crate::hook::BoundHook;
use crate::module::CheckModule;
use crate::rule::{Check, ConditionGroup, HookRef, Rule};
use indexmap::{IndexMap, IndexSet};
use sanction_core::{CoreError, validate_ident};

/// Error raised while building a policy
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// Two rules share an object/action pair
    #[error("duplicate rule for object {object} and action {action}")]
    DuplicateRule { object: String, action: String },
    /// Two rules share a name
    #[error("duplicate rule name: {name}")]
    DuplicateRuleName { name: String },
    /// The same check appears twice in one group
    #[error("duplicate check {check} in {kind} group {group} of rule {rule}")]
    DuplicateCheck {
        rule: String,
        kind: &'static str,
        group: usize,
        check: String,
    },
    /// A rule references a check that no module provides
    #[error("rule {rule} references unknown check {check}/{arity} in module {module}")]
    UnknownCheck {
        rule: String,
        module: String,
        check: String,
        arity: u8,
    },
    /// A rule references a hook that no module provides
    #[error("rule {rule} references unknown hook {hook}/{arity} in module {module}")]
    UnknownHook {
        rule: String,
        module: String,
        hook: String,
        arity: u8,
    },
    /// A referenced module was never registered
    #[error("unknown module: {module}")]
    UnknownModule { module: String },
    /// Two modules share a name
    #[error("duplicate module: {module}")]
    DuplicateModule { module: String },
    /// Malformed identifier
    #[error("invalid {kind} identifier: {value:?}")]
    InvalidIdentifier { kind: String, value: String },
    /// Rule source could not be decoded
    #[error("invalid rule source: {0}")]
    InvalidSource(String),
}

impl From<CoreError> for BuildError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidIdentifier { kind, value } => Self::InvalidIdentifier { kind, value },
            other => Self::InvalidSource(other.to_string()),
        }
    }
}

impl From<BuildError> for CoreError {
    fn from(err: BuildError) -> Self {
        CoreError::Validation {
            field: "policy".to_string(),
            reason: err.to_string(),
        }
    }
}

/// A rule with its checks and hooks resolved
pub struct CompiledRule<S, O> {
    pub(crate) rule: Rule,
    pub(crate) allow: Vec<BoundGroup<S, O>>,
    pub(crate) deny: Vec<BoundGroup<S, O>>,
    pub(crate) pre_hooks: Vec<BoundHook<S, O>>,
}

impl<S, O> CompiledRule<S, O> {
    /// Rule definition
    #[must_use]
    pub fn rule(&self) -> &Rule {
        &self.rule
    }
}

/// Immutable set of rules with their configuration
pub struct Policy<S, O> {
    pub(crate) config: PolicyConfig,
    pub(crate) rules: IndexMap<String, CompiledRule<S, O>>,
}

impl<S, O> Policy<S, O> {
    /// Start building a policy
    #[must_use]
    pub fn builder(config: PolicyConfig) -> PolicyBuilder<S, O> {
        PolicyBuilder::new(config)
    }

    /// Policy configuration
    #[must_use]
    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// All rules in name order
    #[must_use]
    pub fn list_rules(&self) -> Vec<&Rule> {
        self.rules.values().map(CompiledRule::rule).collect()
    }

    /// All rule names in name order
    #[must_use]
    pub fn list_rule_names(&self) -> Vec<&str> {
        self.rules.keys().map(String::as_str).collect()
    }

    /// Get a rule by name
    #[must_use]
    pub fn get_rule(&self, name: &str) -> Option<&Rule> {
        self.rules.get(name).map(CompiledRule::rule)
    }

    /// Look up a rule, failing if it does not exist
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::RuleNotFound` for unknown names
    pub fn fetch_rule(&self, name: &str) -> Result<&Rule, PolicyError> {
        self.get_rule(name).ok_or_else(|| PolicyError::RuleNotFound {
            name: name.to_string(),
        })
    }

    /// Number of rules
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if there are no rules
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<S, O> std::fmt::Debug for Policy<S, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Policy")
            .field("config", &self.config)
            .field("rules", &self.rules.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Collects rules and modules, then freezes them into a `Policy`
pub struct PolicyBuilder<S, O> {
    config: PolicyConfig,
    rules: Vec<Rule>,
    modules: Vec<CheckModule<S, O>>,
}

impl<S, O> PolicyBuilder<S, O> {
    /// Create a builder
    #[must_use]
    pub fn new(config: PolicyConfig) -> Self {
        Self {
            config,
            rules: Vec::new(),
            modules: Vec::new(),
        }
    }

    /// Register a check module
    #[must_use]
    pub fn module(mut self, module: CheckModule<S, O>) -> Self {
        self.modules.push(module);
        self
    }

    /// Add a rule
    #[must_use]
    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Add several rules in order
    #[must_use]
    pub fn rules(mut self, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.rules.extend(rules);
        self
    }

    /// Add rules decoded from a JSON array
    ///
    /// # Errors
    ///
    /// Returns `BuildError::InvalidSource` if the JSON does not decode to rules
    pub fn rules_from_json(self, source: &str) -> Result<Self, BuildError> {
        let rules: Vec<Rule> =
            serde_json::from_str(source).map_err(|e| BuildError::InvalidSource(e.to_string()))?;
        Ok(self.rules(rules))
    }

    /// Validate, resolve, and freeze
    ///
    /// # Errors
    ///
    /// Returns the first duplicate, malformed, or unresolved definition
    pub fn build(self) -> Result<Policy<S, O>, BuildError> {
        let mut modules: IndexMap<String, CheckModule<S, O>> = IndexMap::new();
        for module in self.modules {
            validate_ident("module", module.name())?;
            if modules.contains_key(module.name()) {
                return Err(BuildError::DuplicateModule {
                    module: module.name().to_string(),
                });
            }
            modules.insert(module.name().to_string(), module);
        }

        let resolver = Resolver {
            default_module: &self.config.check_module,
            modules: &modules,
        };

        let mut pairs = IndexSet::new();
        let mut rules = IndexMap::new();
        for rule in self.rules {
            let rule = rule.normalize();
            validate_ident("object", &rule.object)?;
            validate_ident("action", &rule.action)?;
            validate_ident("rule", &rule.name)?;

            if !pairs.insert((rule.object.clone(), rule.action.clone())) {
                return Err(BuildError::DuplicateRule {
                    object: rule.object,
                    action: rule.action,
                });
            }
            if rules.contains_key(&rule.name) {
                return Err(BuildError::DuplicateRuleName { name: rule.name });
            }

            let compiled = resolver.compile(rule)?;
            rules.insert(compiled.rule.name.clone(), compiled);
        }
        rules.sort_keys();

        tracing::debug!(policy = %self.config.name, rules = rules.len(), "policy built");

        Ok(Policy {
            config: self.config,
            rules,
        })
    }
}

struct Resolver<'a, S, O> {
    default_module: &'a str,
    modules: &'a IndexMap<String, CheckModule<S, O>>,
}

impl<S, O> Resolver<'_, S, O> {
    fn module(&self, name: &str) -> Result<&CheckModule<S, O>, BuildError> {
        self.modules
            .get(name)
            .ok_or_else(|| BuildError::UnknownModule {
                module: name.to_string(),
            })
    }

    fn compile(&self, rule: Rule) -> Result<CompiledRule<S, O>, BuildError> {
        let allow = self.compile_groups(&rule, "allow", &rule.allow)?;
        let deny = self.compile_groups(&rule, "deny", &rule.deny)?;
        let pre_hooks = rule
            .pre_hooks
            .iter()
            .map(|hook| self.compile_hook(&rule.name, hook))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CompiledRule {
            rule,
            allow,
            deny,
            pre_hooks,
        })
    }

    fn compile_groups(
        &self,
        rule: &Rule,
        kind: &'static str,
        groups: &[ConditionGroup],
    ) -> Result<Vec<BoundGroup<S, O>>, BuildError> {
        groups
            .iter()
            .enumerate()
            .map(|(index, group)| {
                let checks = group.checks();
                for (position, check) in checks.iter().enumerate() {
                    if checks[..position].contains(check) {
                        return Err(BuildError::DuplicateCheck {
                            rule: rule.name.clone(),
                            kind,
                            group: index,
                            check: format!("{:?}", check),
                        });
                    }
                }
                checks
                    .iter()
                    .map(|check| self.compile_check(&rule.name, check))
                    .collect::<Result<BoundGroup<S, O>, BuildError>>()
            })
            .collect()
    }

    fn compile_check(&self, rule: &str, check: &Check) -> Result<BoundCheck<S, O>, BuildError> {
        let unknown = |name: &str, arity| BuildError::UnknownCheck {
            rule: rule.to_string(),
            module: self.default_module.to_string(),
            check: name.to_string(),
            arity,
        };

        match check {
            Check::Literal(value) => Ok(BoundCheck::Literal(*value)),
            Check::Named(name) => {
                validate_ident("check", name)?;
                let f = self
                    .module(self.default_module)?
                    .get_check(name)
                    .ok_or_else(|| unknown(name, 2))?;
                Ok(BoundCheck::Call {
                    name: name.clone(),
                    f,
                })
            }
            Check::NamedWithArg(name, arg) => {
                validate_ident("check", name)?;
                let f = self
                    .module(self.default_module)?
                    .get_check_with_arg(name)
                    .ok_or_else(|| unknown(name, 3))?;
                Ok(BoundCheck::CallWithArg {
                    name: name.clone(),
                    arg: arg.clone(),
                    f,
                })
            }
        }
    }

    fn compile_hook(&self, rule: &str, hook: &HookRef) -> Result<BoundHook<S, O>, BuildError> {
        let module_name = match hook {
            HookRef::Named(_) => self.default_module,
            HookRef::ModuleFunction { module, .. } | HookRef::ModuleFunctionArgs { module, .. } => {
                module.as_str()
            }
        };
        let name = hook.name();
        validate_ident("hook", name)?;
        let module = self.module(module_name)?;
        let unknown = |arity| BuildError::UnknownHook {
            rule: rule.to_string(),
            module: module_name.to_string(),
            hook: name.to_string(),
            arity,
        };

        match hook {
            HookRef::Named(_) | HookRef::ModuleFunction { .. } => Ok(BoundHook::Call {
                name: name.to_string(),
                f: module.get_hook(name).ok_or_else(|| unknown(2))?,
            }),
            HookRef::ModuleFunctionArgs { args, .. } => {
                let f = module.get_hook_with_args(name).ok_or_else(|| unknown(3))?;
                // Empty static args plus empty call options fall back to the 2-arity form.
                let fallback = module.get_hook(name);
                if args.is_empty() && fallback.is_none() {
                    return Err(unknown(2));
                }
                Ok(BoundHook::CallWithArgs {
                    name: name.to_string(),
                    args: args.clone(),
                    f,
                    fallback,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sanction_core::Options;

    type TestModule = CheckModule<u32, u32>;

    fn checks() -> TestModule {
        CheckModule::new("checks")
            .check("same", |s, o| s == o)
            .check_with_arg("above", |s, _, arg| arg.as_u64().is_some_and(|n| u64::from(*s) > n))
            .hook("bump", |s, o| Ok((s + 1, o)))
    }

    fn builder() -> PolicyBuilder<u32, u32> {
        Policy::builder(PolicyConfig::new("test")).module(checks())
    }

    #[test]
    fn test_build_empty() {
        let policy = builder().build().unwrap();
        assert!(policy.is_empty());
        assert_eq!(policy.config().name, "test");
    }

    #[test]
    fn test_build_resolves_rules() {
        let policy = builder()
            .rule(Rule::new("article", "update").allow(Check::named("same")))
            .rule(Rule::new("article", "view").allow(Check::with_arg("above", 3)))
            .build()
            .unwrap();

        assert_eq!(policy.len(), 2);
        assert_eq!(policy.list_rule_names(), vec!["article_update", "article_view"]);
        assert!(policy.get_rule("article_view").is_some());
        assert!(policy.get_rule("article_delete").is_none());
    }

    #[test]
    fn test_duplicate_rule_rejected() {
        let err = builder()
            .rule(Rule::new("article", "update"))
            .rule(Rule::new("article", "update").allow(true))
            .build()
            .unwrap_err();

        assert_eq!(
            err,
            BuildError::DuplicateRule {
                object: "article".to_string(),
                action: "update".to_string(),
            }
        );
    }

    #[test]
    fn test_duplicate_rule_name_rejected() {
        let mut renamed = Rule::new("post", "edit");
        renamed.name = "article_update".to_string();

        let err = builder()
            .rule(Rule::new("article", "update"))
            .rule(renamed)
            .build()
            .unwrap_err();

        assert!(matches!(err, BuildError::DuplicateRuleName { .. }));
    }

    #[test]
    fn test_duplicate_check_rejected() {
        let err = builder()
            .rule(Rule::new("article", "update").deny(vec![Check::named("same"), Check::named("same")]))
            .build()
            .unwrap_err();

        assert!(matches!(
            err,
            BuildError::DuplicateCheck { kind: "deny", group: 0, .. }
        ));
    }

    #[test]
    fn test_same_check_different_arg_allowed() {
        let policy = builder()
            .rule(
                Rule::new("article", "update")
                    .allow(vec![Check::with_arg("above", 1), Check::with_arg("above", 2)]),
            )
            .build();
        assert!(policy.is_ok());
    }

    #[test]
    fn test_unknown_check_rejected() {
        let err = builder()
            .rule(Rule::new("article", "update").allow(Check::named("missing")))
            .build()
            .unwrap_err();

        assert!(matches!(err, BuildError::UnknownCheck { arity: 2, .. }));
    }

    #[test]
    fn test_check_arity_is_part_of_resolution() {
        let err = builder()
            .rule(Rule::new("article", "update").allow(Check::with_arg("same", 1)))
            .build()
            .unwrap_err();

        assert!(matches!(err, BuildError::UnknownCheck { arity: 3, .. }));
    }

    #[test]
    fn test_unknown_module_rejected() {
        let err = Policy::<u32, u32>::builder(PolicyConfig::new("test"))
            .rule(Rule::new("article", "update").allow(Check::named("same")))
            .build()
            .unwrap_err();

        assert_eq!(
            err,
            BuildError::UnknownModule {
                module: "checks".to_string()
            }
        );
    }

    #[test]
    fn test_literal_only_rules_need_no_module() {
        let policy = Policy::<u32, u32>::builder(PolicyConfig::new("test"))
            .rule(Rule::new("article", "view").allow(true))
            .build();
        assert!(policy.is_ok());
    }

    #[test]
    fn test_hook_resolution() {
        let hooks: TestModule = CheckModule::new("hooks")
            .hook_with_args("load", |s, o, _| Ok((s, o)));

        let err = builder()
            .module(hooks)
            .rule(
                Rule::new("article", "update")
                    .pre_hook(HookRef::with_args("hooks", "load", Options::new())),
            )
            .build()
            .unwrap_err();
        assert!(matches!(err, BuildError::UnknownHook { arity: 2, .. }));

        let hooks: TestModule = CheckModule::new("hooks")
            .hook_with_args("load", |s, o, _| Ok((s, o)));
        let policy = builder()
            .module(hooks)
            .rule(
                Rule::new("article", "update")
                    .pre_hook(HookRef::named("bump"))
                    .pre_hook(HookRef::with_args("hooks", "load", Options::new().with("x", 1))),
            )
            .build();
        assert!(policy.is_ok());
    }

    #[test]
    fn test_duplicate_module_rejected() {
        let err = builder().module(checks()).build().unwrap_err();
        assert!(matches!(err, BuildError::DuplicateModule { .. }));
    }

    #[test]
    fn test_invalid_identifier_rejected() {
        let err = builder()
            .rule(Rule::new("bad object", "update"))
            .build()
            .unwrap_err();
        assert!(matches!(err, BuildError::InvalidIdentifier { .. }));
    }

    #[test]
    fn test_rules_from_json() {
        let source = r#"[
            {"object": "article", "action": "view", "allow": [{"literal": true}]},
            {"object": "article", "action": "update", "allow": [{"named": "same"}]}
        ]"#;

        let policy = builder().rules_from_json(source).unwrap().build().unwrap();
        assert_eq!(policy.list_rule_names(), vec!["article_update", "article_view"]);
    }

    #[test]
    fn test_fetch_rule() {
        let policy = builder()
            .rule(Rule::new("user", "delete").allow(true))
            .build()
            .unwrap();
        assert_eq!(policy.fetch_rule("user_delete").unwrap().action, "delete");

        let err = policy.fetch_rule("user_burn").unwrap_err();
        let core: CoreError = err.into();
        assert_eq!(
            core,
            CoreError::NotFound {
                kind: "Rule".to_string(),
                id: "user_burn".to_string(),
            }
        );
    }

    #[test]
    fn test_fetch_rule_without_clone() {
        struct Opaque;

        let policy: Policy<Opaque, Opaque> = Policy::builder(PolicyConfig::new("opaque"))
            .rule(Rule::new("vault", "open"))
            .build()
            .unwrap();
        assert_eq!(policy.fetch_rule("vault_open").unwrap().object, "vault");
        assert!(policy.fetch_rule("vault_close").is_err());
    }

    #[test]
    fn test_rules_listed_by_name() {
        let policy = builder()
            .rule(Rule::new("zebra", "view").allow(true))
            .rule(Rule::new("apple", "view").allow(true))
            .build()
            .unwrap();

        assert_eq!(policy.list_rule_names(), vec!["apple_view", "zebra_view"]);
        let names: Vec<&str> = policy.list_rules().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["apple_view", "zebra_view"]);
    }

    #[test]
    fn test_rules_from_bad_json() {
        let err = builder().rules_from_json("[{").err().unwrap();
        assert!(matches!(err, BuildError::InvalidSource(_)));
    }

    #[test]
    fn test_build_error_into_core() {
        let err: CoreError = BuildError::UnknownModule {
            module: "x".to_string(),
        }
        .into();
        assert!(matches!(err, CoreError::Validation { .. }));
    }
}
