//! powerforge - policy and composition resolution engine
//!
//! Composes tool-permission constraints from capability bundles, agents and
//! collections without silently widening what an agent or a delegated
//! subagent may do.
//!
//! - [`policy`]: pattern matching, constraint algebra, collection and
//!   delegation resolution
//! - [`compose`]: resource collision resolution across referenced modules
//! - [`registry`]: specialist lookup and layout discovery
//! - [`engine`]: the per-agent pipeline and parallel batches
//! - [`lint`]: rule-based validation of raw constraint documents

pub mod app;
pub mod cli;
pub mod compose;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod lint;
pub mod policy;
pub mod registry;
pub mod report;
pub mod security;
pub mod test_utils;

pub use error::{ForgeError, PolicyError, PolicyErrors, Result};
