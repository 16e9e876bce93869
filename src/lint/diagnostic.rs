//! Diagnostic types for policy linting and non-fatal resolution findings.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Category of validation rule
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleCategory {
    /// Pattern syntax and document shape
    Structure,
    /// How allow/deny lists interact
    Policy,
    /// Overly broad grants, secrets, traversal-looking patterns
    Security,
    /// Justifications and audit trail
    Audit,
    /// Merging referenced modules
    Composition,
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structure => write!(f, "structure"),
            Self::Policy => write!(f, "policy"),
            Self::Security => write!(f, "security"),
            Self::Audit => write!(f, "audit"),
            Self::Composition => write!(f, "composition"),
        }
    }
}

/// Severity level for diagnostics
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational suggestion
    Info,
    /// Should fix, but not blocking
    Warning,
    /// Must fix, blocks resolution
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A location span in source text
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct SourceSpan {
    /// Starting line (1-indexed)
    pub start_line: usize,
    /// Starting column (1-indexed)
    pub start_col: usize,
    /// Ending line (1-indexed)
    pub end_line: usize,
    /// Ending column (1-indexed)
    pub end_col: usize,
}

impl SourceSpan {
    #[must_use]
    pub const fn new(start_line: usize, start_col: usize, end_line: usize, end_col: usize) -> Self {
        Self {
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    /// Span of the first line in `source` containing `needle`.
    #[must_use]
    pub fn locate(source: &str, needle: &str) -> Option<Self> {
        source.lines().enumerate().find_map(|(idx, line)| {
            line.find(needle).map(|col| {
                let start_col = line[..col].chars().count() + 1;
                Self::new(idx + 1, start_col, idx + 1, start_col + needle.chars().count())
            })
        })
    }
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start_line == self.end_line {
            write!(f, "{}:{}-{}", self.start_line, self.start_col, self.end_col)
        } else {
            write!(
                f,
                "{}:{}-{}:{}",
                self.start_line, self.start_col, self.end_line, self.end_col
            )
        }
    }
}

/// A diagnostic message from validation or resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The rule ID that generated this diagnostic
    pub rule_id: String,
    /// Severity level
    pub severity: Severity,
    /// The diagnostic message
    pub message: String,
    /// Optional location in source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<SourceSpan>,
    /// Optional suggestion for fixing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Category of the rule
    pub category: RuleCategory,
}

impl Diagnostic {
    pub fn new(rule_id: impl Into<String>, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.into(),
            severity,
            message: message.into(),
            span: None,
            suggestion: None,
            category: RuleCategory::Structure,
        }
    }

    pub fn error(rule_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(rule_id, Severity::Error, message)
    }

    pub fn warning(rule_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(rule_id, Severity::Warning, message)
    }

    pub fn info(rule_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(rule_id, Severity::Info, message)
    }

    #[must_use]
    pub fn with_span(mut self, span: SourceSpan) -> Self {
        self.span = Some(span);
        self
    }

    /// Attach a span when one is known.
    #[must_use]
    pub fn with_span_opt(mut self, span: Option<SourceSpan>) -> Self {
        self.span = span;
        self
    }

    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    #[must_use]
    pub const fn with_category(mut self, category: RuleCategory) -> Self {
        self.category = category;
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.rule_id, self.message)?;
        if let Some(span) = &self.span {
            write!(f, " at {span}")?;
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, " (hint: {suggestion})")?;
        }
        Ok(())
    }
}
