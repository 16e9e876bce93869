//! Validation rule trait.

use super::config::ValidationContext;
use super::diagnostic::{Diagnostic, RuleCategory, Severity};

/// A validation rule that checks constraint documents for issues.
///
/// Rules should be stateless and reusable. All state needed for validation
/// should be passed through the `ValidationContext`.
pub trait ValidationRule: Send + Sync {
    /// Unique identifier for this rule (e.g., "valid-pattern-syntax")
    fn id(&self) -> &str;

    /// Human-readable name
    fn name(&self) -> &str;

    /// Detailed description of what this rule checks
    fn description(&self) -> &str;

    fn category(&self) -> RuleCategory;

    fn default_severity(&self) -> Severity;

    /// Run the validation check
    fn validate(&self, ctx: &ValidationContext<'_>) -> Vec<Diagnostic>;
}

/// A boxed validation rule for dynamic dispatch
pub type BoxedRule = Box<dyn ValidationRule>;

/// Helper macro to simplify rule implementation
#[macro_export]
macro_rules! impl_rule {
    (
        $struct_name:ident,
        id: $id:expr,
        name: $name:expr,
        description: $desc:expr,
        category: $cat:expr,
        severity: $sev:expr,
        validate: |$self_:ident, $ctx:ident| $validate_body:expr
    ) => {
        pub struct $struct_name;

        impl $crate::lint::rule::ValidationRule for $struct_name {
            fn id(&self) -> &str {
                $id
            }

            fn name(&self) -> &str {
                $name
            }

            fn description(&self) -> &str {
                $desc
            }

            fn category(&self) -> $crate::lint::diagnostic::RuleCategory {
                $cat
            }

            fn default_severity(&self) -> $crate::lint::diagnostic::Severity {
                $sev
            }

            fn validate(
                &self,
                $ctx: &$crate::lint::config::ValidationContext<'_>,
            ) -> Vec<$crate::lint::diagnostic::Diagnostic> {
                let $self_ = self;
                $validate_body
            }
        }
    };
}

pub use impl_rule;
