//! Identifiers for objects, actions, checks, and hooks.

use crate::error::{CoreError, CoreResult};

/// Canonical rule name for an object/action pair: `{object}_{action}`.
#[must_use]
pub fn rule_name(object: &str, action: &str) -> String {
    format!("{}_{}", object, action)
}

/// Validate an identifier.
///
/// Identifiers must be non-empty and made of ASCII alphanumerics, `_`, `.`
/// or `?`. The `kind` is only used in the error.
///
/// # Errors
///
/// Returns `CoreError::InvalidIdentifier` if the value is not a valid identifier
pub fn validate_ident(kind: &str, value: &str) -> CoreResult<()> {
    let valid = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '?'));

    if valid {
        Ok(())
    } else {
        Err(CoreError::InvalidIdentifier {
            kind: kind.to_string(),
            value: value.to_string(),
        })
    }
}
