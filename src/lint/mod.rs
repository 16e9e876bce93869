//! Policy linting over raw constraint documents.
//!
//! - `ValidationRule` trait for implementing custom validation rules
//! - `ValidationEngine` for running rules against a `ConstraintDocument`
//! - `Diagnostic` types for reporting issues with spans and suggestions
//! - `ValidationConfig` for disabling rules, overriding severity, strict mode
//!
//! Resolution findings that do not block a report (collection conflicts
//! under the `warn` policy, shadowed elevations, last-wins guidance merges)
//! are carried as `Diagnostic`s too.
//!
//! # Example
//!
//! ```
//! use powerforge::document::ConstraintDocument;
//! use powerforge::lint::{ValidationConfig, ValidationEngine};
//!
//! let document = ConstraintDocument {
//!     name: "reviewer".into(),
//!     allowed_tools: vec!["*".into()],
//!     ..Default::default()
//! };
//!
//! let engine = ValidationEngine::builtin(ValidationConfig::new());
//! let result = engine.validate(&document);
//!
//! assert!(result.passed);
//! assert_eq!(result.warning_count(), 1);
//! ```

pub mod config;
pub mod diagnostic;
pub mod engine;
pub mod rule;
pub mod rules;

pub use config::{ValidationConfig, ValidationContext};
pub use diagnostic::{Diagnostic, RuleCategory, Severity, SourceSpan};
pub use engine::{RuleInfo, ValidationEngine, ValidationResult};
pub use rule::{BoxedRule, ValidationRule};

pub use rules::{all_rules, security_rules, structural_rules};
