//! Generators for patterns, identifiers and constraint sets.

use proptest::prelude::*;

use powerforge::policy::{CapabilityPattern, ConstraintSet};

/// Small alphabet so generated patterns overlap often.
pub fn token() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["fs", "net", "db", "read", "write", "internal", "exec"])
        .prop_map(str::to_string)
}

pub fn identifier() -> impl Strategy<Value = String> {
    prop::collection::vec(token(), 1..4).prop_map(|tokens| tokens.join("."))
}

pub fn pattern() -> impl Strategy<Value = CapabilityPattern> {
    (prop::collection::vec(token(), 0..3), any::<bool>()).prop_filter_map(
        "bare pattern needs a token",
        |(tokens, wildcard)| {
            if tokens.is_empty() && !wildcard {
                return None;
            }
            let mut raw = tokens.join(".");
            if wildcard {
                if !raw.is_empty() {
                    raw.push('.');
                }
                raw.push('*');
            }
            CapabilityPattern::parse(&raw).ok()
        },
    )
}

/// Patterns that never cover the whole namespace.
pub fn scoped_pattern() -> impl Strategy<Value = CapabilityPattern> {
    pattern().prop_filter("not universal", |p| !p.is_universal())
}

pub fn constraint_set() -> impl Strategy<Value = ConstraintSet> {
    (
        prop::collection::vec(pattern(), 0..5),
        prop::collection::vec(scoped_pattern(), 0..3),
    )
        .prop_map(|(allowed, denied)| ConstraintSet::new(allowed, denied))
}
