//! Hydration hooks.
//!
//! Hooks run before any check and fold over the subject/object pair: each hook
//! receives the output of the previous one. The first failing hook aborts the
//! pipeline and its error reaches the caller unchanged.

use crate::module::{HookArgsFn, HookFn};
use sanction_core::Options;
use std::borrow::Cow;

/// Boxed error source for hook failures
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A hook failed
#[derive(Debug, thiserror::Error)]
#[error("hook {hook} failed: {source}")]
pub struct HookError {
    hook: String,
    #[source]
    source: BoxError,
}

impl HookError {
    /// Wrap a hook failure
    #[must_use]
    pub fn new(hook: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            hook: hook.into(),
            source: source.into(),
        }
    }

    /// Name of the failed hook
    #[must_use]
    pub fn hook(&self) -> &str {
        &self.hook
    }
}

/// A hook resolved to its function
pub enum BoundHook<S, O> {
    /// 2-arity hook
    Call {
        /// Hook name
        name: String,
        /// Hook function
        f: HookFn<S, O>,
    },
    /// 3-arity hook with static arguments
    CallWithArgs {
        /// Hook name
        name: String,
        /// Static arguments, overridden by call options
        args: Options,
        /// Hook function
        f: HookArgsFn<S, O>,
        /// 2-arity form, used when the merged arguments are empty
        fallback: Option<HookFn<S, O>>,
    },
}

impl<S, O> BoundHook<S, O> {
    /// Hook name
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Call { name, .. } | Self::CallWithArgs { name, .. } => name,
        }
    }

    /// Run the hook
    ///
    /// # Errors
    ///
    /// Returns the hook's own error
    pub fn run(&self, subject: S, object: O, opts: &Options) -> Result<(S, O), HookError> {
        match self {
            Self::Call { f, .. } => f(subject, object),
            Self::CallWithArgs {
                args, f, fallback, ..
            } => {
                let merged = args.merged(opts);
                match fallback {
                    Some(plain) if merged.is_empty() => plain(subject, object),
                    _ => f(subject, object, &merged),
                }
            }
        }
    }
}

/// Run hooks in order, threading each output into the next hook.
///
/// With no hooks the borrowed inputs are returned as they are and nothing is
/// cloned.
///
/// # Errors
///
/// Returns the error of the first failing hook
pub fn hydrate<'a, S: Clone, O: Clone>(
    hooks: &[BoundHook<S, O>],
    subject: &'a S,
    object: &'a O,
    opts: &Options,
) -> Result<(Cow<'a, S>, Cow<'a, O>), HookError> {
    if hooks.is_empty() {
        return Ok((Cow::Borrowed(subject), Cow::Borrowed(object)));
    }

    let mut pair = (subject.clone(), object.clone());
    for hook in hooks {
        tracing::debug!(hook = hook.name(), "running pre-hook");
        pair = hook.run(pair.0, pair.1, opts)?;
    }

    Ok((Cow::Owned(pair.0), Cow::Owned(pair.1)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::sync::Arc;
    use std::sync::Mutex;

    type Pair = Result<(u32, u32), HookError>;

    fn push(tag: &'static str) -> BoundHook<Vec<&'static str>, u32> {
        BoundHook::Call {
            name: tag.to_string(),
            f: Arc::new(move |mut s: Vec<&'static str>, o: u32| -> Result<(Vec<&'static str>, u32), HookError> {
                s.push(tag);
                Ok((s, o + 1))
            }),
        }
    }

    #[test]
    fn test_hydrate_empty_borrows() {
        let hooks: Vec<BoundHook<u32, u32>> = Vec::new();
        let (s, o) = hydrate(&hooks, &1, &2, &Options::new()).unwrap();
        assert!(matches!(s, Cow::Borrowed(_)));
        assert!(matches!(o, Cow::Borrowed(_)));
    }

    #[test]
    fn test_hydrate_folds_in_order() {
        let hooks = vec![push("a"), push("b"), push("c")];
        let subject = Vec::new();
        let (s, o) = hydrate(&hooks, &subject, &0, &Options::new()).unwrap();

        assert_eq!(*s, vec!["a", "b", "c"]);
        assert_eq!(*o, 3);
        assert!(subject.is_empty());
    }

    #[test]
    fn test_hydrate_stops_on_failure() {
        let hooks = vec![
            push("a"),
            BoundHook::Call {
                name: "boom".to_string(),
                f: Arc::new(|_: Vec<&'static str>, _: u32| -> Result<(Vec<&'static str>, u32), HookError> {
                    Err(HookError::new("boom", "missing key"))
                }),
            },
            push("c"),
        ];

        let err = hydrate(&hooks, &Vec::new(), &0, &Options::new()).unwrap_err();
        assert_eq!(err.hook(), "boom");
        assert!(err.to_string().contains("missing key"));
    }

    #[test]
    fn test_call_options_override_static_args() {
        let seen = Arc::new(Mutex::new(Options::new()));
        let captured = Arc::clone(&seen);
        let hook: BoundHook<u32, u32> = BoundHook::CallWithArgs {
            name: "load".to_string(),
            args: Options::new().with("preload", false).with("depth", 1),
            f: Arc::new(move |s: u32, o: u32, args: &Options| -> Pair {
                if let Ok(mut slot) = captured.lock() {
                    *slot = args.clone();
                }
                Ok((s, o))
            }),
            fallback: None,
        };

        hook.run(0, 0, &Options::new().with("preload", true)).unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.get("preload"), Some(&Value::Bool(true)));
        assert_eq!(seen.get("depth"), Some(&Value::from(1)));
    }

    #[test]
    fn test_empty_args_use_plain_form() {
        let hook: BoundHook<u32, u32> = BoundHook::CallWithArgs {
            name: "load".to_string(),
            args: Options::new(),
            f: Arc::new(|s: u32, o: u32, _: &Options| -> Pair { Ok((s + 100, o)) }),
            fallback: Some(Arc::new(|s: u32, o: u32| -> Pair { Ok((s + 1, o)) })),
        };

        assert_eq!(hook.run(0, 0, &Options::new()).unwrap(), (1, 0));
        assert_eq!(hook.run(0, 0, &Options::new().with("x", 1)).unwrap(), (100, 0));
    }
}
