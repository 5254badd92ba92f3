//! SANCTION Policy Engine
//!
//! Rules decide whether a subject may perform an action on an object. Each
//! rule has OR-combined allow and deny groups of AND-combined checks, and
//! hooks that hydrate the subject/object before any check runs. Deny always
//! wins over allow.
//!
//! Rules and the check modules they reference are frozen into a `Policy` at
//! build time; unknown or duplicate definitions fail the build. A separate
//! `Redactor` hides fields of structured data per type and subject.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod check;
pub mod config;
pub mod engine;
pub mod filter;
pub mod hook;
pub mod module;
pub mod redact;
pub mod registry;
pub mod rule;

pub use check::{BoundCheck, BoundGroup, evaluate};
pub use config::PolicyConfig;
pub use engine::{AuthorizeError, Decision, PolicyError};
pub use filter::{CheckMatch, MetadataMatch, RuleFilter, filter_rules};
pub use hook::{BoundHook, HookError, hydrate};
pub use module::CheckModule;
pub use redact::{RedactionEntry, RedactionSpec, Redactor, RedactorConfig, Schema};
pub use registry::{BuildError, CompiledRule, Policy, PolicyBuilder};
pub use rule::{Check, ConditionGroup, HookRef, Rule};
