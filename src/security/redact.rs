//! Secret redaction for free-text fields that end up in audit trails.
//!
//! Justifications are written by people and copied verbatim into reports, so
//! they occasionally carry pasted credentials or contact details. Known
//! secret and identifier shapes are replaced with a `*_REDACTED` marker
//! naming what was removed.

use std::sync::LazyLock;

use regex::Regex;

struct SecretRule {
    pattern: Regex,
    replacement: &'static str,
}

fn rule(pattern: &str, replacement: &'static str) -> SecretRule {
    SecretRule {
        pattern: Regex::new(pattern).expect("valid regex"),
        replacement,
    }
}

// Multi-line and URL-shaped secrets first, then prefixed tokens, then
// generic key/value assignments, then personal identifiers.
static SECRET_RULES: LazyLock<Vec<SecretRule>> = LazyLock::new(|| {
    vec![
        rule(
            r"-----BEGIN [A-Z ]*PRIVATE KEY-----[\s\S]+?-----END [A-Z ]*PRIVATE KEY-----",
            "PRIVATE_KEY_REDACTED",
        ),
        rule(
            r"(?i)\b(?:postgres(?:ql)?|mysql|mongodb(?:\+srv)?|redis)://[^:\s/]+:[^@\s]+@[^\s]+",
            "DATABASE_URL_REDACTED",
        ),
        rule(r"ssh-(?:rsa|ed25519) [A-Za-z0-9+/=]+", "SSH_KEY_REDACTED"),
        rule(
            r"eyJ[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+",
            "JWT_REDACTED",
        ),
        rule(r"\b(?:sk|pk|rk)_(?:live|test)_[A-Za-z0-9]+", "STRIPE_KEY_REDACTED"),
        rule(r"\b(?:AKIA|ASIA)[0-9A-Z]{16}\b", "AWS_KEY_REDACTED"),
        rule(r"\bgh[pousr]_[A-Za-z0-9]{36}\b", "GITHUB_TOKEN_REDACTED"),
        rule(r"\bxox[baprs]-[0-9A-Za-z-]+", "SLACK_TOKEN_REDACTED"),
        rule(r"\bAIza[0-9A-Za-z_-]{35}\b", "GOOGLE_API_KEY_REDACTED"),
        rule(
            r"\b[MN][A-Za-z0-9]{23}\.[A-Za-z0-9_-]{6}\.[A-Za-z0-9_-]{27}\b",
            "DISCORD_TOKEN_REDACTED",
        ),
        rule(r"\bEAA[0-9A-Za-z]{20,}", "FACEBOOK_TOKEN_REDACTED"),
        rule(r"\b[1-9][0-9]+-[0-9A-Za-z]{40}\b", "TWITTER_TOKEN_REDACTED"),
        rule(r"(?i)\bbearer\s+[A-Za-z0-9._-]{20,}", "Bearer TOKEN_REDACTED"),
        rule(
            r#"(?i)\bapi[_-]?key\s*[:=]\s*['"]?[A-Za-z0-9_-]{20,}['"]?"#,
            "API_KEY_REDACTED",
        ),
        rule(
            r#"(?i)\baccess[_-]?token\s*[:=]\s*['"]?[A-Za-z0-9_-]{20,}['"]?"#,
            "ACCESS_TOKEN_REDACTED",
        ),
        rule(
            r#"\b[A-Z][A-Z0-9_]*_SECRET\s*[:=]\s*['"]?[A-Za-z0-9_-]{8,}['"]?"#,
            "SECRET_REDACTED",
        ),
        rule(
            r#"\b[A-Z][A-Z0-9_]*_PASSWORD\s*[:=]\s*['"]?[^\s'"]{8,}['"]?"#,
            "PASSWORD_REDACTED",
        ),
        rule(
            r"\b[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}\b",
            "UUID_REDACTED",
        ),
        rule(r"\b(?:\d{4}[-\s]?){3}\d{4}\b", "CREDIT_CARD_REDACTED"),
        rule(
            r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b",
            "EMAIL_REDACTED",
        ),
        rule(r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b", "PHONE_REDACTED"),
        rule(r"\b(?:\d{1,3}\.){3}\d{1,3}\b", "IP_REDACTED"),
    ]
});

/// Replace every recognised secret in `text`.
#[must_use]
pub fn redact_secrets(text: &str) -> String {
    SECRET_RULES
        .iter()
        .fold(text.to_string(), |acc, rule| {
            rule.pattern.replace_all(&acc, rule.replacement).into_owned()
        })
}

/// Whether `text` contains anything [`redact_secrets`] would replace.
#[must_use]
pub fn contains_secret(text: &str) -> bool {
    SECRET_RULES.iter().any(|rule| rule.pattern.is_match(text))
}
