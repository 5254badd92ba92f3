//! Decision engine.
//!
//! A decision hydrates the subject/object with the rule's pre-hooks, evaluates
//! the deny groups, and only evaluates the allow groups when nothing denied.

use crate::check::evaluate;
use crate::hook::{HookError, hydrate};
use crate::registry::Policy;
use sanction_core::{CoreError, Options};
use serde::{Deserialize, Serialize};

/// Outcome of a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    /// Allowed by the rule
    Allowed,
    /// Denied by a deny group, or no allow group passed
    Denied,
    /// No rule with the given name
    RuleNotFound,
}

impl Decision {
    /// Whether the decision allows the action
    #[must_use]
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Error raised while deciding
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    /// A pre-hook failed
    #[error(transparent)]
    HookFailure(#[from] HookError),
    /// Lookup of an unknown rule
    #[error("rule not found: {name}")]
    RuleNotFound { name: String },
}

impl From<PolicyError> for CoreError {
    fn from(err: PolicyError) -> Self {
        match err {
            PolicyError::RuleNotFound { name } => CoreError::NotFound {
                kind: "Rule".to_string(),
                id: name,
            },
            PolicyError::HookFailure(err) => CoreError::Internal {
                message: err.to_string(),
            },
        }
    }
}

/// Error returned by `Policy::authorize`
#[derive(Debug, thiserror::Error)]
pub enum AuthorizeError {
    /// Denied, or the rule does not exist
    #[error("{reason}")]
    Unauthorized { reason: String },
    /// A pre-hook failed
    #[error(transparent)]
    HookFailure(#[from] HookError),
}

impl From<AuthorizeError> for CoreError {
    fn from(err: AuthorizeError) -> Self {
        match err {
            AuthorizeError::Unauthorized { reason } => CoreError::PermissionDenied { reason },
            AuthorizeError::HookFailure(err) => CoreError::Internal {
                message: err.to_string(),
            },
        }
    }
}

impl<S: Clone, O: Clone> Policy<S, O> {
    /// Decide whether `subject` may perform the rule's action on `object`.
    ///
    /// Hooks run once, deny groups are evaluated against the hydrated pair,
    /// and allow groups only when no deny group passed. An unknown rule name
    /// yields `Decision::RuleNotFound`.
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::HookFailure` if a pre-hook fails
    pub fn decide(
        &self,
        rule_name: &str,
        subject: &S,
        object: &O,
        opts: &Options,
    ) -> Result<Decision, PolicyError> {
        let Some(compiled) = self.rules.get(rule_name) else {
            return Ok(Decision::RuleNotFound);
        };

        let (subject, object) = hydrate(&compiled.pre_hooks, subject, object, opts)?;

        let decision = if evaluate(&compiled.deny, &*subject, &*object) {
            Decision::Denied
        } else if evaluate(&compiled.allow, &*subject, &*object) {
            Decision::Allowed
        } else {
            Decision::Denied
        };

        tracing::debug!(
            policy = %self.config.name,
            rule = rule_name,
            ?decision,
            "permission decided"
        );
        Ok(decision)
    }

    /// Boolean form of `decide`.
    ///
    /// Unknown rules are reported through a warning and answer `false`.
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::HookFailure` if a pre-hook fails
    pub fn allowed(
        &self,
        rule_name: &str,
        subject: &S,
        object: &O,
        opts: &Options,
    ) -> Result<bool, PolicyError> {
        match self.decide(rule_name, subject, object, opts)? {
            Decision::Allowed => Ok(true),
            Decision::Denied => Ok(false),
            Decision::RuleNotFound => {
                tracing::warn!(
                    rule = rule_name,
                    policy = %self.config.name,
                    "permission checked for rule that does not exist"
                );
                Ok(false)
            }
        }
    }

    /// Result form of `decide`.
    ///
    /// # Errors
    ///
    /// Returns `AuthorizeError::Unauthorized` with the configured reason unless
    /// allowed, or `AuthorizeError::HookFailure` if a pre-hook fails
    pub fn authorize(
        &self,
        rule_name: &str,
        subject: &S,
        object: &O,
        opts: &Options,
    ) -> Result<(), AuthorizeError> {
        let allowed = self
            .allowed(rule_name, subject, object, opts)
            .map_err(|err| self.authorize_error(err))?;
        if allowed {
            Ok(())
        } else {
            Err(self.unauthorized())
        }
    }

    fn authorize_error(&self, err: PolicyError) -> AuthorizeError {
        match err {
            PolicyError::HookFailure(err) => AuthorizeError::HookFailure(err),
            PolicyError::RuleNotFound { .. } => self.unauthorized(),
        }
    }

    fn unauthorized(&self) -> AuthorizeError {
        AuthorizeError::Unauthorized {
            reason: self.config.error_reason.clone(),
        }
    }

    /// Panicking form of `authorize`.
    ///
    /// # Panics
    ///
    /// Panics with the configured error message unless allowed, and with the
    /// hook error if a pre-hook fails
    pub fn authorize_or_panic(&self, rule_name: &str, subject: &S, object: &O, opts: &Options) {
        match self.authorize(rule_name, subject, object, opts) {
            Ok(()) => {}
            Err(AuthorizeError::Unauthorized { .. }) => panic!("{}", self.config.error_message),
            Err(err @ AuthorizeError::HookFailure(_)) => panic!("{}", err),
        }
    }
}
