//! Check evaluation.
//!
//! Groups are OR-combined and the checks inside a group are AND-combined.
//! Evaluation is strictly left to right and stops at the first passing group
//! or the first failing check in a group.

use crate::module::{CheckArgFn, CheckFn};
use serde_json::Value;

/// A check resolved to its function
pub enum BoundCheck<S, O> {
    /// Constant result
    Literal(bool),
    /// 2-arity check
    Call {
        /// Check name
        name: String,
        /// Check function
        f: CheckFn<S, O>,
    },
    /// 3-arity check
    CallWithArg {
        /// Check name
        name: String,
        /// Static argument
        arg: Value,
        /// Check function
        f: CheckArgFn<S, O>,
    },
}

impl<S, O> BoundCheck<S, O> {
    /// Run the check
    #[must_use]
    pub fn run(&self, subject: &S, object: &O) -> bool {
        match self {
            Self::Literal(value) => *value,
            Self::Call { f, .. } => f(subject, object),
            Self::CallWithArg { arg, f, .. } => f(subject, object, arg),
        }
    }

    /// Label for logs
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Literal(value) => value.to_string(),
            Self::Call { name, .. } => name.clone(),
            Self::CallWithArg { name, arg, .. } => format!("{}({})", name, arg),
        }
    }
}

/// AND-combined checks
pub type BoundGroup<S, O> = Vec<BoundCheck<S, O>>;

/// Evaluate OR-combined groups of AND-combined checks.
///
/// An empty group list is false, and so is an empty group.
#[must_use]
pub fn evaluate<S, O>(groups: &[BoundGroup<S, O>], subject: &S, object: &O) -> bool {
    groups
        .iter()
        .enumerate()
        .any(|(index, group)| {
            let passed = evaluate_group(group, subject, object);
            tracing::trace!(group = index, passed, "evaluated condition group");
            passed
        })
}

/// Evaluate one AND-combined group
#[must_use]
pub fn evaluate_group<S, O>(group: &[BoundCheck<S, O>], subject: &S, object: &O) -> bool {
    if group.is_empty() {
        return false;
    }
    group.iter().all(|check| check.run(subject, object))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counted(result: bool, counter: &Arc<AtomicUsize>) -> BoundCheck<(), ()> {
        let counter = Arc::clone(counter);
        BoundCheck::Call {
            name: "counted".to_string(),
            f: Arc::new(move |_: &(), _: &()| {
                counter.fetch_add(1, Ordering::SeqCst);
                result
            }),
        }
    }

    #[test]
    fn test_empty_groups_false() {
        let groups: Vec<BoundGroup<(), ()>> = Vec::new();
        assert!(!evaluate(&groups, &(), &()));
    }

    #[test]
    fn test_empty_group_false() {
        let groups: Vec<BoundGroup<(), ()>> = vec![Vec::new()];
        assert!(!evaluate(&groups, &(), &()));
    }

    #[test]
    fn test_literals() {
        let groups: Vec<BoundGroup<(), ()>> = vec![vec![BoundCheck::Literal(true)]];
        assert!(evaluate(&groups, &(), &()));

        let groups: Vec<BoundGroup<(), ()>> =
            vec![vec![BoundCheck::Literal(true), BoundCheck::Literal(false)]];
        assert!(!evaluate(&groups, &(), &()));
    }

    #[test]
    fn test_and_short_circuits() {
        let calls = Arc::new(AtomicUsize::new(0));
        let groups = vec![vec![counted(false, &calls), counted(true, &calls)]];

        assert!(!evaluate(&groups, &(), &()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_and_runs_all_when_passing() {
        let calls = Arc::new(AtomicUsize::new(0));
        let groups = vec![vec![counted(true, &calls), counted(true, &calls)]];

        assert!(evaluate(&groups, &(), &()));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_or_short_circuits() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let groups = vec![vec![counted(true, &first)], vec![counted(true, &second)]];

        assert!(evaluate(&groups, &(), &()));
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_or_falls_through() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let groups = vec![vec![counted(false, &first)], vec![counted(true, &second)]];

        assert!(evaluate(&groups, &(), &()));
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_call_with_arg() {
        let check: BoundCheck<String, ()> = BoundCheck::CallWithArg {
            name: "role".to_string(),
            arg: json!("editor"),
            f: Arc::new(|role: &String, _: &(), arg: &Value| arg.as_str() == Some(role.as_str())),
        };

        assert!(check.run(&"editor".to_string(), &()));
        assert!(!check.run(&"writer".to_string(), &()));
        assert_eq!(check.label(), "role(\"editor\")");
    }

    proptest::proptest! {
        #[test]
        fn prop_or_of_literals(values in proptest::collection::vec(proptest::collection::vec(proptest::bool::ANY, 0..4), 0..4)) {
            let groups: Vec<BoundGroup<(), ()>> = values
                .iter()
                .map(|group| group.iter().map(|v| BoundCheck::Literal(*v)).collect())
                .collect();
            let expected = values.iter().any(|group| !group.is_empty() && group.iter().all(|v| *v));
            proptest::prop_assert_eq!(evaluate(&groups, &(), &()), expected);
        }
    }
}
