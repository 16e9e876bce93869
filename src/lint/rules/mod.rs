//! Built-in validation rules for constraint documents.
//!
//! - **Structural rules** (`structural`): pattern grammar, allow/deny overlap
//! - **Security rules** (`security`): broad or path-like patterns, opt-out
//!   justification, credentials in justification text

pub mod security;
pub mod structural;

use crate::lint::rule::BoxedRule;

pub use security::{
    NoOverlyBroadPatternRule, NoSecretsInJustificationRule, NoSuspiciousPatternRule,
    OptOutJustifiedRule,
};
pub use structural::{NoAllowDenyOverlapRule, ValidPatternSyntaxRule};

pub fn structural_rules() -> Vec<BoxedRule> {
    structural::structural_rules()
}

pub fn security_rules() -> Vec<BoxedRule> {
    security::security_rules()
}

/// Returns all built-in validation rules.
pub fn all_rules() -> Vec<BoxedRule> {
    let mut rules = structural_rules();
    rules.extend(security_rules());
    rules
}
