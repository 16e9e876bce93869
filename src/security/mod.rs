//! Security helpers shared by resolution and linting.

pub mod redact;

pub use redact::{contains_secret, redact_secrets};
