//! Field redaction for structured data.
//!
//! Each concrete type provides a `Schema` that says, for a given subject, which
//! fields to hide. A spec entry either replaces a field with the redaction
//! marker, applies an inline spec to a sub-object, or hands a sub-object to
//! another type's schema. Absent fields, nulls, and values marked as not
//! loaded are left alone.

use sanction_core::{CoreResult, Options};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Default value written over redacted fields
pub const REDACTED: &str = "**redacted**";

/// Default marker for sub-objects that were never loaded
pub const NOT_LOADED: &str = "**not_loaded**";

/// One entry of a redaction spec
pub enum RedactionEntry<S> {
    /// Replace the field with the redaction value
    Field(String),
    /// Apply an inline spec to the sub-object in this field
    Nested(String, RedactionSpec<S>),
    /// Redact the sub-object in this field with its own schema
    Schema(String, Arc<dyn Schema<S>>),
}

impl<S> RedactionEntry<S> {
    /// Redact a field outright
    #[must_use]
    pub fn field(name: impl Into<String>) -> Self {
        Self::Field(name.into())
    }

    /// Apply an inline spec to a sub-object
    #[must_use]
    pub fn nested(name: impl Into<String>, spec: RedactionSpec<S>) -> Self {
        Self::Nested(name.into(), spec)
    }

    /// Delegate a sub-object to its schema
    #[must_use]
    pub fn schema(name: impl Into<String>, schema: Arc<dyn Schema<S>>) -> Self {
        Self::Schema(name.into(), schema)
    }

    /// Field the entry applies to
    #[must_use]
    pub fn field_name(&self) -> &str {
        match self {
            Self::Field(name) | Self::Nested(name, _) | Self::Schema(name, _) => name,
        }
    }
}

impl<S> Clone for RedactionEntry<S> {
    fn clone(&self) -> Self {
        match self {
            Self::Field(name) => Self::Field(name.clone()),
            Self::Nested(name, spec) => Self::Nested(name.clone(), spec.clone()),
            Self::Schema(name, schema) => Self::Schema(name.clone(), Arc::clone(schema)),
        }
    }
}

impl<S> std::fmt::Debug for RedactionEntry<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Field(name) => f.debug_tuple("Field").field(name).finish(),
            Self::Nested(name, spec) => f.debug_tuple("Nested").field(name).field(spec).finish(),
            Self::Schema(name, schema) => {
                f.debug_tuple("Schema").field(name).field(&schema.name()).finish()
            }
        }
    }
}

/// Ordered list of redaction entries
pub type RedactionSpec<S> = Vec<RedactionEntry<S>>;

/// Redaction capability of one concrete type
pub trait Schema<S>: Send + Sync {
    /// Type name, for logs
    fn name(&self) -> &str;

    /// Fields of `object` to hide from `subject`
    fn redacted_fields(&self, object: &Value, subject: &S, opts: &Options) -> RedactionSpec<S>;
}

/// Redactor configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedactorConfig {
    /// Value written over redacted fields
    pub redact_value: Value,
    /// Value marking a sub-object that was never loaded
    pub not_loaded: Value,
}

impl Default for RedactorConfig {
    fn default() -> Self {
        Self {
            redact_value: Value::String(REDACTED.to_string()),
            not_loaded: Value::String(NOT_LOADED.to_string()),
        }
    }
}

/// Applies schemas to objects
#[derive(Debug, Clone, Default)]
pub struct Redactor {
    config: RedactorConfig,
}

impl Redactor {
    /// Create a redactor with default markers
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a redactor with the given configuration
    #[must_use]
    pub fn with_config(config: RedactorConfig) -> Self {
        Self { config }
    }

    /// Use a custom redaction value
    #[must_use]
    pub fn with_redact_value(mut self, value: impl Into<Value>) -> Self {
        self.config.redact_value = value.into();
        self
    }

    /// Redactor configuration
    #[must_use]
    pub fn config(&self) -> &RedactorConfig {
        &self.config
    }

    /// Redact an object, or every element of a list of objects.
    ///
    /// Returns a new value; `object` is not modified. Null passes through.
    #[must_use]
    pub fn redact<S, C>(&self, schema: &C, object: &Value, subject: &S, opts: &Options) -> Value
    where
        C: Schema<S> + ?Sized,
    {
        match object {
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.redact(schema, item, subject, opts))
                    .collect(),
            ),
            Value::Object(_) => {
                let spec = schema.redacted_fields(object, subject, opts);
                tracing::trace!(schema = schema.name(), entries = spec.len(), "redacting object");
                self.apply(&spec, object, subject, opts)
            }
            other => other.clone(),
        }
    }

    /// Redact each object of a list
    #[must_use]
    pub fn redact_many<S, C>(
        &self,
        schema: &C,
        objects: &[Value],
        subject: &S,
        opts: &Options,
    ) -> Vec<Value>
    where
        C: Schema<S> + ?Sized,
    {
        objects
            .iter()
            .map(|object| self.redact(schema, object, subject, opts))
            .collect()
    }

    /// Redact an optional object; `None` passes through
    #[must_use]
    pub fn redact_opt<S, C>(
        &self,
        schema: &C,
        object: Option<&Value>,
        subject: &S,
        opts: &Options,
    ) -> Option<Value>
    where
        C: Schema<S> + ?Sized,
    {
        object.map(|object| self.redact(schema, object, subject, opts))
    }

    /// Serialize a typed value and redact it
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidEncoding` if the value cannot be serialized
    pub fn redact_typed<S, C, T>(
        &self,
        schema: &C,
        object: &T,
        subject: &S,
        opts: &Options,
    ) -> CoreResult<Value>
    where
        C: Schema<S> + ?Sized,
        T: Serialize,
    {
        let value = serde_json::to_value(object)?;
        Ok(self.redact(schema, &value, subject, opts))
    }

    /// Candidate fields that the schema does not redact outright.
    ///
    /// Only plain field entries are subtracted; nested and delegated entries
    /// stay visible because they are only partially redacted.
    #[must_use]
    pub fn unredacted_fields<S, C>(
        &self,
        candidates: &[&str],
        schema: &C,
        object: &Value,
        subject: &S,
        opts: &Options,
    ) -> Vec<String>
    where
        C: Schema<S> + ?Sized,
    {
        let spec = schema.redacted_fields(object, subject, opts);
        candidates
            .iter()
            .filter(|candidate| {
                !spec
                    .iter()
                    .any(|entry| matches!(entry, RedactionEntry::Field(name) if name == *candidate))
            })
            .map(|candidate| (*candidate).to_string())
            .collect()
    }

    fn apply<S>(&self, spec: &[RedactionEntry<S>], object: &Value, subject: &S, opts: &Options) -> Value {
        let Value::Object(fields) = object else {
            return object.clone();
        };

        // Entries apply in sequence; a repeated field starts from the earlier result.
        let mut redacted: Map<String, Value> = fields.clone();
        for entry in spec {
            let name = entry.field_name();
            let Some(current) = redacted.get(name) else {
                continue;
            };
            if current.is_null() || *current == self.config.not_loaded {
                continue;
            }

            let replacement = match entry {
                RedactionEntry::Field(_) => self.config.redact_value.clone(),
                RedactionEntry::Nested(_, nested) => self.apply_nested(nested, current, subject, opts),
                RedactionEntry::Schema(_, schema) => self.redact(schema.as_ref(), current, subject, opts),
            };
            redacted.insert(name.to_string(), replacement);
        }

        Value::Object(redacted)
    }

    fn apply_nested<S>(&self, spec: &[RedactionEntry<S>], value: &Value, subject: &S, opts: &Options) -> Value {
        match value {
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.apply_nested(spec, item, subject, opts))
                    .collect(),
            ),
            other => self.apply(spec, other, subject, opts),
        }
    }
}
